//! The values that can go into a tree: a closed set of capabilities,
//! so that insertion and rendering dispatch with a `match` instead of
//! probing types.

use std::{any::Any,
          fmt::Debug,
          rc::Rc};

use kstring::KString;
use serde_json::{Number, Value as JsonValue};

use crate::{allocator::AId,
            attribute::AttributeContainer,
            lazy::LazyValue,
            myfrom::MyFrom,
            node::Node,
            repeater::Repeater};

/// A value from outside of this crate. Rendered through a handler
/// registered with `Renderer::register`, or via `to_text` if there is
/// none; otherwise rendering fails.
pub trait ForeignValue: Debug {
    fn as_any(&self) -> &dyn Any;

    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Generic string conversion fallback (will be escaped).
    fn to_text(&self) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    /// Text, escaped when rendered.
    Text(KString),
    /// Markup, emitted verbatim.
    Raw(KString),
    Lazy(LazyValue),
    Element(AId<Node>),
    Repeater(AId<Repeater>),
    Attribute(AttributeContainer),
    List(Vec<Value>),
    Map(Vec<(KString, Value)>),
    Foreign(Rc<dyn ForeignValue>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Scalar,
    Raw,
    Lazy,
    Element,
    Repeater,
    Attribute,
    List,
    Map,
    Foreign,
}

impl Capability {
    pub fn name(self) -> &'static str {
        match self {
            Capability::Scalar => "scalar",
            Capability::Raw => "raw",
            Capability::Lazy => "lazy",
            Capability::Element => "element",
            Capability::Repeater => "repeater",
            Capability::Attribute => "attribute",
            Capability::List => "list",
            Capability::Map => "map",
            Capability::Foreign => "foreign",
        }
    }
}

impl Value {
    pub fn capability(&self) -> Capability {
        match self {
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::Text(_) =>
                Capability::Scalar,
            Value::Raw(_) => Capability::Raw,
            Value::Lazy(_) => Capability::Lazy,
            Value::Element(_) => Capability::Element,
            Value::Repeater(_) => Capability::Repeater,
            Value::Attribute(_) => Capability::Attribute,
            Value::List(_) => Capability::List,
            Value::Map(_) => Capability::Map,
            Value::Foreign(_) => Capability::Foreign,
        }
    }

    pub fn text<T>(s: T) -> Value
    where KString: MyFrom<T>
    {
        Value::Text(KString::myfrom(s))
    }

    pub fn raw<T>(s: T) -> Value
    where KString: MyFrom<T>
    {
        Value::Raw(KString::myfrom(s))
    }

    pub fn map<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Value
    where KString: MyFrom<K>,
          Value: From<V>
    {
        Value::Map(pairs.into_iter()
                   .map(|(k, v)| (KString::myfrom(k), Value::from(v)))
                   .collect())
    }

    pub fn foreign(v: impl ForeignValue + 'static) -> Value {
        Value::Foreign(Rc::new(v))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Scalars and raw markup as plain (unescaped) text.
    pub fn as_scalar_text(&self) -> Option<KString> {
        match self {
            Value::Null => Some(KString::from_static("")),
            Value::Bool(b) => Some(KString::from_static(if *b { "true" } else { "false" })),
            Value::Number(n) => Some(KString::from_string(n.to_string())),
            Value::Text(s) | Value::Raw(s) => Some(s.clone()),
            _ => None
        }
    }

    /// Truthiness as used by `LazyValue::iff`: null, false, 0, the
    /// empty string and empty lists/maps are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().map(|f| f != 0.).unwrap_or(true),
            Value::Text(s) | Value::Raw(s) => ! s.is_empty(),
            Value::List(l) => ! l.is_empty(),
            Value::Map(m) => ! m.is_empty(),
            Value::Attribute(a) => ! a.is_empty(),
            Value::Lazy(_) | Value::Element(_) | Value::Repeater(_) | Value::Foreign(_) =>
                true,
        }
    }
}

impl From<JsonValue> for Value {
    fn from(v: JsonValue) -> Self {
        match v {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => Value::Number(n),
            JsonValue::String(s) => Value::Text(KString::from_string(s)),
            JsonValue::Array(a) => Value::List(a.into_iter().map(Value::from).collect()),
            JsonValue::Object(o) => Value::Map(
                o.into_iter().map(|(k, v)| (KString::from_string(k), Value::from(v)))
                    .collect()),
        }
    }
}

impl From<&JsonValue> for Value {
    fn from(v: &JsonValue) -> Self {
        Value::from(v.clone())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(KString::from_ref(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(KString::from_string(s))
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Text(KString::from_ref(s))
    }
}

impl From<KString> for Value {
    fn from(s: KString) -> Self {
        Value::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! def_from_integer {
    ($($t:ty)*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Number(Number::from(n))
                }
            }
        )*
    }
}
def_from_integer!(i32 i64 u32 u64 usize);

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        match Number::from_f64(f) {
            Some(n) => Value::Number(n),
            None => Value::Null,
        }
    }
}

impl From<AId<Node>> for Value {
    fn from(id: AId<Node>) -> Self {
        Value::Element(id)
    }
}

impl From<AId<Repeater>> for Value {
    fn from(id: AId<Repeater>) -> Self {
        Value::Repeater(id)
    }
}

impl From<LazyValue> for Value {
    fn from(l: LazyValue) -> Self {
        Value::Lazy(l)
    }
}

impl From<AttributeContainer> for Value {
    fn from(a: AttributeContainer) -> Self {
        Value::Attribute(a)
    }
}

impl<T> From<Option<T>> for Value where Value: From<T> {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => Value::from(v),
            None => Value::Null,
        }
    }
}

impl<T> From<Vec<T>> for Value where Value: From<T> {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Value::from).collect())
    }
}

impl<T, const N: usize> From<[T; N]> for Value where Value: From<T> {
    fn from(v: [T; N]) -> Self {
        Value::List(v.into_iter().map(Value::from).collect())
    }
}


/// One argument of a mixed argument list as taken by
/// `HtmlAllocator::element`: positional values are content (unless
/// special), named ones go to setters or attributes.
#[derive(Debug, Clone)]
pub enum Arg {
    Positional(Value),
    Named(KString, Value),
}

macro_rules! def_positional_arg {
    ($($t:ty)*) => {
        $(
            impl From<$t> for Arg {
                fn from(v: $t) -> Self {
                    Arg::Positional(Value::from(v))
                }
            }
        )*
    }
}
def_positional_arg!(Value JsonValue &str String KString bool i32 i64 u32 u64 usize f64
                    AId<Node> AId<Repeater> LazyValue AttributeContainer);

impl From<&JsonValue> for Arg {
    fn from(v: &JsonValue) -> Self {
        Arg::Positional(Value::from(v))
    }
}

impl From<&String> for Arg {
    fn from(v: &String) -> Self {
        Arg::Positional(Value::from(v))
    }
}

impl<T> From<Option<T>> for Arg where Value: From<T> {
    fn from(v: Option<T>) -> Self {
        Arg::Positional(<Value as From<Option<T>>>::from(v))
    }
}

impl<T> From<Vec<T>> for Arg where Value: From<T> {
    fn from(v: Vec<T>) -> Self {
        Arg::Positional(<Value as From<Vec<T>>>::from(v))
    }
}

impl<T, const N: usize> From<[T; N]> for Arg where Value: From<T> {
    fn from(v: [T; N]) -> Self {
        Arg::Positional(<Value as From<[T; N]>>::from(v))
    }
}

/// A named argument (an attribute, or a setter if the node kind has
/// one of that name).
pub fn att<K, V>(key: K, val: V) -> Arg
where KString: MyFrom<K>,
      Value: From<V>
{
    Arg::Named(KString::myfrom(key), Value::from(val))
}

/// Like `att`; a `None` value stores null, which is not rendered.
pub fn opt_att<K, V>(key: K, val: Option<V>) -> Arg
where KString: MyFrom<K>,
      Value: From<V>
{
    Arg::Named(KString::myfrom(key), <Value as From<Option<V>>>::from(val))
}

pub trait ToArgs {
    fn to_args(self) -> Vec<Arg>;
}

impl ToArgs for () {
    fn to_args(self) -> Vec<Arg> {
        Vec::new()
    }
}

impl<T: Into<Arg>, const N: usize> ToArgs for [T; N] {
    fn to_args(self) -> Vec<Arg> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<T: Into<Arg>> ToArgs for Vec<T> {
    fn to_args(self) -> Vec<Arg> {
        self.into_iter().map(Into::into).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_from_json() {
        let v = Value::from(serde_json::json!({"a": [1, "x", null], "b": true}));
        match v {
            Value::Map(m) => {
                assert_eq!(m.len(), 2);
                assert!(matches!(&m[0].1, Value::List(l) if l.len() == 3));
                assert!(matches!(m[1].1, Value::Bool(true)));
            }
            _ => panic!("expected map")
        }
    }

    #[test]
    fn t_truthy() {
        assert!(! Value::Null.is_truthy());
        assert!(! Value::from(0).is_truthy());
        assert!(! Value::from("").is_truthy());
        assert!(! Value::from(Vec::<i32>::new()).is_truthy());
        assert!(Value::from("0").is_truthy());
        assert!(Value::from(0.5).is_truthy());
    }

    #[test]
    fn t_args() {
        let args = [att("class", "x"), "text".into(), opt_att("title", None::<&str>)]
            .to_args();
        assert_eq!(args.len(), 3);
        assert!(matches!(&args[0], Arg::Named(k, _) if k.as_str() == "class"));
        assert!(matches!(&args[1], Arg::Positional(Value::Text(s)) if s.as_str() == "text"));
        assert!(matches!(&args[2], Arg::Named(_, Value::Null)));
        assert_eq!(["a", "b"].to_args().len(), 2);
    }

    #[test]
    fn t_container_args() {
        assert!(matches!(Arg::from(Some(3)), Arg::Positional(Value::Number(_))));
        assert!(matches!(Arg::from(None::<i32>), Arg::Positional(Value::Null)));
        assert!(matches!(Arg::from(vec!["a", "b"]), Arg::Positional(Value::List(l)) if l.len() == 2));
        assert!(matches!(Arg::from([1, 2, 3]), Arg::Positional(Value::List(l)) if l.len() == 3));
        assert!(matches!(opt_att("title", Some("t")),
                         Arg::Named(_, Value::Text(s)) if s.as_str() == "t"));
    }
}
