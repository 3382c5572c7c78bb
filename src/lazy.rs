//! Deferred values, resolved at render time against a `Context` and
//! the current state of repeaters.

use std::{fmt, rc::Rc};

use anyhow::Result;
use kstring::KString;

use crate::{allocator::{AId, HtmlAllocator},
            context::Context,
            error::{tree_error, TreeErrorKind},
            myfrom::MyFrom,
            repeater::Repeater,
            value::Value};

// Conditions are unwound eagerly, independent of the render config.
const COND_MAX_UNWIND: usize = 64;

pub type LazyFn = Rc<dyn Fn(&Context, &HtmlAllocator) -> Result<Value>>;

#[derive(Clone)]
pub enum LazyValue {
    /// A variable (dotted path) from the resolution context.
    Var(KString),
    /// A field (dotted path) of the current record of a repeater; the
    /// empty path is the whole record.
    Field { repeater: AId<Repeater>, path: KString },
    /// The 0-based position of a repeater.
    Position(AId<Repeater>),
    Call(LazyFn),
    /// Picks from `values` by the position of `repeater`, e.g. for
    /// odd/even classes.
    Cycle { repeater: AId<Repeater>, values: Rc<[Value]> },
    Iff { cond: Box<Value>, then: Box<Value>, otherwise: Box<Value> },
}

impl fmt::Debug for LazyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl LazyValue {
    pub fn var<T>(path: T) -> LazyValue
    where KString: MyFrom<T>
    {
        LazyValue::Var(KString::myfrom(path))
    }

    pub fn call(f: impl Fn(&Context, &HtmlAllocator) -> Result<Value> + 'static) -> LazyValue {
        LazyValue::Call(Rc::new(f))
    }

    pub fn cycle<V: Into<Value>>(repeater: AId<Repeater>,
                                 values: impl IntoIterator<Item = V>) -> LazyValue {
        LazyValue::Cycle {
            repeater,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn iff(cond: impl Into<Value>, then: impl Into<Value>, otherwise: impl Into<Value>)
               -> LazyValue {
        LazyValue::Iff {
            cond: Box::new(cond.into()),
            then: Box::new(then.into()),
            otherwise: Box::new(otherwise.into()),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            LazyValue::Var(p) => format!("var({p})"),
            LazyValue::Field { repeater, path } => format!("field({repeater:?}, {path:?})"),
            LazyValue::Position(r) => format!("position({r:?})"),
            LazyValue::Call(_) => "call".into(),
            LazyValue::Cycle { values, .. } => format!("cycle of {}", values.len()),
            LazyValue::Iff { .. } => "iff".into(),
        }
    }

    /// One resolution step; the result may itself be lazy (see
    /// `unwind`).
    pub fn resolve(&self, html: &HtmlAllocator, ctx: Option<&Context>) -> Result<Value> {
        let ctx = match ctx {
            Some(ctx) => ctx,
            None => return Err(tree_error(TreeErrorKind::NoContext(self.describe())))
        };
        Ok(match self {
            LazyValue::Var(path) => ctx.get(path).map(Value::from).unwrap_or(Value::Null),
            LazyValue::Field { repeater, path } =>
                html.repeater_field(*repeater, path).map(Value::from).unwrap_or(Value::Null),
            LazyValue::Position(r) =>
                html.repeater_position(*r).map(Value::from).unwrap_or(Value::Null),
            LazyValue::Call(f) => f(ctx, html)?,
            LazyValue::Cycle { repeater, values } => {
                if values.is_empty() {
                    Value::Null
                } else {
                    let pos = html.repeater_position(*repeater).unwrap_or(0);
                    values[pos % values.len()].clone()
                }
            }
            LazyValue::Iff { cond, then, otherwise } => {
                let c = unwind((**cond).clone(), html, Some(ctx), COND_MAX_UNWIND)?;
                if c.is_truthy() {
                    (**then).clone()
                } else {
                    (**otherwise).clone()
                }
            }
        })
    }
}

/// Resolve `v` until it is not lazy anymore, at most `max_steps`
/// times.
pub fn unwind(v: Value, html: &HtmlAllocator, ctx: Option<&Context>, max_steps: usize)
              -> Result<Value> {
    let mut v = v;
    let mut steps = 0;
    while let Value::Lazy(l) = &v {
        if steps >= max_steps {
            return Err(tree_error(TreeErrorKind::UnwindLimit(steps)));
        }
        v = l.resolve(html, ctx)?;
        steps += 1;
    }
    Ok(v)
}
