use std::{any::{Any, TypeId},
          cell::RefCell,
          collections::HashMap,
          fmt,
          hash::{Hash, Hasher},
          marker::PhantomData,
          rc::Rc,
          sync::Mutex};

use anyhow::{Result, bail};
use chj_util::warn;
use html_meta::MetaDb;
use kstring::KString;
use lazy_static::lazy_static;

use crate::{attribute::{AttrKind, AttributeContainer},
            context::Context,
            error::{tree_error, TreeErrorKind},
            myfrom::MyFrom,
            node::Node,
            render::Renderer,
            repeater::Repeater,
            value::{Arg, ToArgs, Value}};


/// Custom insertion handling for a foreign value type, see
/// `HtmlAllocator::register_special`.
pub type SpecialHandler = Rc<dyn Fn(&HtmlAllocator, AId<Node>, &dyn Any) -> Result<()>>;

/// Storage for the nodes and repeaters of one or more trees. Not
/// `Sync`; all mutation goes through `&self`.
pub struct HtmlAllocator {
    // For dynamic verification of AId:s
    regionid: RegionId,
    max_allocations: usize,
    // If present, new nodes take their defaults from it
    metadb: Option<&'static MetaDb>,
    nodes: RefCell<Vec<Node>>,
    repeaters: RefCell<Vec<Repeater>>,
    specials: RefCell<HashMap<TypeId, SpecialHandler>>,
}

lazy_static!{
    static ref NEXT_ALLOCATOR_ID: Mutex<u32> = Mutex::new(0);
}
fn next_allocator_id() -> u32 {
    // replace with atomic inc?
    let mut guard = NEXT_ALLOCATOR_ID.lock().unwrap_or_else(|e| e.into_inner());
    let id = *guard;
    *guard = id.wrapping_add(1);
    id
}

impl HtmlAllocator {
    /// An allocator using the element meta db; if the overrides named
    /// by `HTML_META_JSON` can't be read, this warns and uses the
    /// builtin db (`try_new` fails instead).
    pub fn new(max_allocations: u32) -> Self {
        match Self::try_new(max_allocations) {
            Ok(html) => html,
            Err(e) => {
                warn!("{:#}, using the builtin element meta db", e);
                Self::new_with_metadb(max_allocations, Some(&*html_meta::BUILTIN))
            }
        }
    }

    pub fn try_new(max_allocations: u32) -> Result<Self> {
        Ok(Self::new_with_metadb(max_allocations, Some(html_meta::metadb()?)))
    }

    pub fn new_with_metadb(max_allocations: u32, metadb: Option<&'static MetaDb>) -> Self {
        HtmlAllocator {
            regionid: RegionId {
                allocator_id: next_allocator_id(),
                generation: 0,
            },
            max_allocations: max_allocations as usize,
            metadb,
            nodes: RefCell::new(Vec::new()),
            repeaters: RefCell::new(Vec::new()),
            specials: RefCell::new(HashMap::new()),
        }
    }

    /// Drop all nodes and repeaters; ids handed out before are
    /// invalid afterwards (using them panics).
    pub fn clear(&mut self) {
        self.nodes.get_mut().clear();
        self.repeaters.get_mut().clear();
        self.regionid.generation = self.regionid.generation.wrapping_add(1);
    }

    pub fn regionid(&self) -> RegionId {
        self.regionid
    }

    pub fn metadb(&self) -> Option<&'static MetaDb> {
        self.metadb
    }

    pub fn len(&self) -> usize {
        self.nodes.borrow().len() + self.repeaters.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn node_count(&self) -> usize {
        self.nodes.borrow().len()
    }

    /// Drop the nodes allocated after `len`; only for nodes nothing
    /// refers to any more.
    pub(crate) fn truncate_nodes(&self, len: usize) {
        self.nodes.borrow_mut().truncate(len)
    }

    fn id_to_index<T>(&self, id: AId<T>) -> usize {
        if self.regionid == id.regionid {
            id.id as usize
        } else {
            panic!("AId with incompatible RegionId used: expected {:?}, got {:?}",
                   self.regionid, id.regionid);
        }
    }

    fn check_capacity(&self) -> Result<()> {
        if self.len() >= self.max_allocations {
            Err(tree_error(TreeErrorKind::OutOfMemory))
        } else {
            Ok(())
        }
    }

    pub(crate) fn push_node(&self, node: Node) -> Result<AId<Node>> {
        self.check_capacity()?;
        let mut nodes = self.nodes.borrow_mut();
        let id = nodes.len();
        nodes.push(node);
        Ok(AId::new(self.regionid, id as u32))
    }

    pub(crate) fn push_repeater(&self, r: Repeater) -> Result<AId<Repeater>> {
        self.check_capacity()?;
        let mut repeaters = self.repeaters.borrow_mut();
        let id = repeaters.len();
        repeaters.push(r);
        Ok(AId::new(self.regionid, id as u32))
    }

    /// Don't call back into the allocator from `f`.
    pub(crate) fn with_node<R>(&self, id: AId<Node>, f: impl FnOnce(&Node) -> R) -> R {
        let i = self.id_to_index(id);
        f(&self.nodes.borrow()[i])
    }

    pub(crate) fn with_node_mut<R>(&self, id: AId<Node>, f: impl FnOnce(&mut Node) -> R) -> R {
        let i = self.id_to_index(id);
        f(&mut self.nodes.borrow_mut()[i])
    }

    pub(crate) fn with_repeater<R>(&self, id: AId<Repeater>, f: impl FnOnce(&Repeater) -> R) -> R {
        let i = self.id_to_index(id);
        f(&self.repeaters.borrow()[i])
    }

    pub(crate) fn with_repeater_mut<R>(&self, id: AId<Repeater>,
                                       f: impl FnOnce(&mut Repeater) -> R) -> R {
        let i = self.id_to_index(id);
        f(&mut self.repeaters.borrow_mut()[i])
    }

    /// A snapshot of the node.
    pub fn get_node(&self, id: AId<Node>) -> Node {
        self.with_node(id, |n| n.clone())
    }

    /// Like `get_node`, but an id from another allocator is an error
    /// instead of a panic.
    pub fn try_get_node(&self, id: AId<Node>) -> Result<Node> {
        if id.regionid != self.regionid {
            return Err(tree_error(TreeErrorKind::InvalidId(format!("{id:?}"))));
        }
        Ok(self.get_node(id))
    }

    /// `<tag>` for diagnostics.
    pub fn describe(&self, id: AId<Node>) -> String {
        self.with_node(id, |n| match n.tag_name() {
            Some(t) => format!("<{t}> {id:?}"),
            None => format!("<{:?}> {id:?}", n.tag),
        })
    }

    pub fn tag_name(&self, id: AId<Node>) -> Option<KString> {
        self.with_node(id, |n| n.tag_name().map(KString::from_ref))
    }

    /// A bare node, with defaults from the meta db.
    pub fn new_node(&self, tag: impl Into<Value>) -> Result<AId<Node>> {
        let node = Node::new(tag.into(), self.metadb);
        let is_table = node.kind == crate::node::NodeKind::Table;
        let id = self.push_node(node)?;
        if is_table {
            self.init_table(id)?;
        }
        Ok(id)
    }

    /// A shallow copy of the node in a new slot; content elements are
    /// shared, not copied.
    pub fn clone_node(&self, id: AId<Node>) -> Result<AId<Node>> {
        let n = self.get_node(id);
        self.push_node(n)
    }

    /// Build a node from a mixed argument list. Named arguments go to
    /// the node kind's setters if one has that name, positional ones
    /// are inserted as per `append`, the rest are attributes.
    pub fn element(&self, tag: &str, args: impl ToArgs) -> Result<AId<Node>> {
        self.element_with_tag(Value::Text(KString::from_ref(tag)), args)
    }

    /// Like `element` but the tag may be lazy.
    pub fn element_with_tag(&self, tag: impl Into<Value>, args: impl ToArgs)
                            -> Result<AId<Node>> {
        let id = self.new_node(tag)?;
        for arg in args.to_args() {
            match arg {
                Arg::Positional(v) => self.append(id, v)?,
                Arg::Named(name, v) => self.set_named(id, name, v)?,
            }
        }
        Ok(id)
    }

    /// Register custom insertion for values `Value::Foreign` of type
    /// `T`: instead of becoming content, they are passed to `handler`.
    pub fn register_special<T: 'static>(
        &self,
        handler: impl Fn(&HtmlAllocator, AId<Node>, &T) -> Result<()> + 'static
    ) {
        let h: SpecialHandler = Rc::new(move |html: &HtmlAllocator, id: AId<Node>, v: &dyn Any| {
            match v.downcast_ref::<T>() {
                Some(v) => handler(html, id, v),
                None => bail!("special handler called with wrong type")
            }
        });
        self.specials.borrow_mut().insert(TypeId::of::<T>(), h);
    }

    fn special_handler(&self, t: TypeId) -> Option<SpecialHandler> {
        self.specials.borrow().get(&t).cloned()
    }

    pub fn append(&self, id: AId<Node>, val: impl Into<Value>) -> Result<()> {
        self.insert(id, None, val.into())
    }

    /// Set content slot `index`; beyond the end, the gap is filled
    /// with nulls and the new slot becomes the last child.
    pub fn set_content_at(&self, id: AId<Node>, index: usize, val: impl Into<Value>)
                          -> Result<()> {
        self.insert(id, Some(index), val.into())
    }

    /// Special values are dispatched here, everything else goes
    /// through the node kind's content handler or `insert_content`.
    fn insert(&self, id: AId<Node>, slot: Option<usize>, val: Value) -> Result<()> {
        match val {
            Value::List(items) if slot.is_none() => {
                for item in items {
                    self.insert(id, None, item)?;
                }
                Ok(())
            }
            Value::Repeater(r) => self.set_repeater(id, r),
            Value::Attribute(c) => {
                let name = c.name().clone();
                self.set_attribute(id, name, Value::Attribute(c))
            }
            Value::Map(pairs) => {
                for (k, v) in pairs {
                    self.set_attribute(id, k, v)?;
                }
                Ok(())
            }
            Value::Foreign(f) => {
                if let Some(h) = self.special_handler(f.as_any().type_id()) {
                    return h(self, id, f.as_any());
                }
                self.insert_content(id, slot, Value::Foreign(f))
            }
            val => {
                let kind = self.with_node(id, |n| n.kind);
                match kind.content_handler() {
                    Some(h) => h(self, id, slot, val),
                    None => self.insert_content(id, slot, val),
                }
            }
        }
    }

    /// Whether `val` may be a direct child of a node restricted to
    /// `allowed`. Lazy, foreign and raw values are trusted, nulls are
    /// harmless.
    fn conforms(&self, allowed: &[KString], val: &Value) -> bool {
        match val {
            Value::Element(e) => match self.tag_name(*e) {
                Some(t) => allowed.contains(&t),
                None => true,
            },
            Value::Lazy(_) | Value::Foreign(_) | Value::Raw(_) | Value::Null => true,
            _ => false,
        }
    }

    /// Store `val` as content, wrapping it into the default child
    /// element (or routing it into the last child) if it doesn't
    /// conform to the allowed child tags.
    pub(crate) fn insert_content(&self, id: AId<Node>, slot: Option<usize>, val: Value)
                                 -> Result<()> {
        let (allowed, default, add_to_last, last) = self.with_node(id, |n| {
            (n.allowed_child_tags.clone(),
             n.default_child_tag.clone(),
             n.add_to_last_child,
             n.last_child_element())
        });
        let val =
            if allowed.is_empty() || self.conforms(&allowed, &val) {
                val
            } else {
                if add_to_last {
                    if let Some(child) = last {
                        return self.append(child, val);
                    }
                }
                let tag = match default.or_else(|| allowed.first().cloned()) {
                    Some(tag) => tag,
                    None => bail!("{}: no child tag to wrap content into", self.describe(id))
                };
                let wrapper = self.element(&tag, ())?;
                self.append(wrapper, val)?;
                Value::Element(wrapper)
            };
        self.with_node_mut(id, |n| n.store_content(slot, val));
        Ok(())
    }

    /// Reading a missing slot is not an error: it yields `None` and
    /// warns.
    pub fn content_at(&self, id: AId<Node>, index: usize) -> Option<Value> {
        let v = self.with_node(id, |n| n.content.get(index).cloned());
        if v.is_none() {
            warn!("content slot {} of {} does not exist", index, self.describe(id));
        }
        v
    }

    pub fn content_len(&self, id: AId<Node>) -> usize {
        self.with_node(id, |n| n.content.len())
    }

    /// The content slot most recently created, if it holds an element.
    pub fn last_child(&self, id: AId<Node>) -> Option<AId<Node>> {
        self.with_node(id, |n| n.last_child_element())
    }

    /// Lists and maps become (or are added to) an `AttributeContainer`
    /// for `name`; scalars, lazy and foreign values are stored as is.
    pub fn set_attribute<N>(&self, id: AId<Node>, name: N, val: impl Into<Value>)
                            -> Result<()>
    where KString: MyFrom<N>
    {
        let name = KString::myfrom(name);
        match val.into() {
            v @ (Value::Element(_) | Value::Repeater(_)) => {
                Err(tree_error(TreeErrorKind::UnsupportedAttributeValue {
                    name,
                    capability: v.capability().name()
                }))
            }
            v @ (Value::List(_) | Value::Map(_)) => self.add_to_attribute::<KString>(id, name, v),
            Value::Attribute(mut c) => {
                c.rename(name.clone());
                self.with_node_mut(id, |n| n.set_attr(name, Value::Attribute(c)));
                Ok(())
            }
            v => {
                self.with_node_mut(id, |n| n.set_attr(name, v));
                Ok(())
            }
        }
    }

    /// Add `val` to the composite attribute `name`, creating it (from
    /// any scalar value already there) as needed.
    pub fn add_to_attribute<N>(&self, id: AId<Node>, name: N, val: impl Into<Value>)
                               -> Result<()>
    where KString: MyFrom<N>
    {
        let name = KString::myfrom(name);
        let val = val.into();
        if matches!(val, Value::Element(_) | Value::Repeater(_)) {
            return Err(tree_error(TreeErrorKind::UnsupportedAttributeValue {
                name,
                capability: val.capability().name()
            }));
        }
        let kind = AttrKind::for_name_in(&name, self.metadb);
        self.with_node_mut(id, |n| {
            let c = match n.attr(&name) {
                Some(Value::Attribute(c)) => {
                    let mut c = c.clone();
                    c.add(val);
                    c
                }
                old => {
                    let mut c = AttributeContainer::with_kind::<KString>(name.clone(), kind);
                    if let Some(old) = old {
                        c.add(old.clone());
                    }
                    c.add(val);
                    c
                }
            };
            n.set_attr(name, Value::Attribute(c));
        });
        Ok(())
    }

    /// Reading an undeclared attribute is not an error.
    pub fn get_attribute(&self, id: AId<Node>, name: &str) -> Option<Value> {
        self.with_node(id, |n| n.attr(name).cloned())
    }

    pub fn remove_attribute(&self, id: AId<Node>, name: &str) -> Option<Value> {
        self.with_node_mut(id, |n| {
            let i = n.attrs.iter().position(|(k, _)| k.as_str() == name)?;
            Some(n.attrs.remove(i).1)
        })
    }

    /// Bind `r` to the node. If one is bound already, the binding is
    /// promoted to a parallel repeater (or extended, if it is one);
    /// a named `r` replaces a bound repeater (or member) of the same
    /// name instead.
    pub fn set_repeater(&self, id: AId<Node>, r: AId<Repeater>) -> Result<()> {
        let existing = self.with_node(id, |n| n.repeater);
        let new = match existing {
            None => r,
            Some(e) if e == r => return Ok(()),
            Some(e) => {
                let name = self.repeater_name(r);
                if let Some(mut members) = self.parallel_members(e) {
                    let same = name.as_ref().and_then(|name| {
                        members.iter().position(|m| self.repeater_name(*m).as_ref() == Some(name))
                    });
                    match same {
                        Some(i) => members[i] = r,
                        None => members.push(r),
                    }
                    self.set_parallel_members(e, members);
                    e
                } else if name.is_some() && name == self.repeater_name(e) {
                    r
                } else {
                    self.parallel([e, r])?
                }
            }
        };
        self.with_node_mut(id, |n| n.repeater = Some(new));
        Ok(())
    }

    pub fn clear_repeater(&self, id: AId<Node>) {
        self.with_node_mut(id, |n| n.repeater = None)
    }

    /// Bind `r`, with fallback content for when it yields no records,
    /// repeating the whole element (`repeat_tags`) or only its
    /// content.
    pub fn bind_repeater(&self, id: AId<Node>, r: AId<Repeater>,
                         on_empty: impl Into<Value>, repeat_tags: bool) -> Result<()> {
        self.set_repeater(id, r)?;
        self.set_on_empty(id, on_empty);
        self.set_repeat_tags(id, repeat_tags);
        Ok(())
    }

    /// Render with the default configuration.
    pub fn to_html_string(&self, id: AId<Node>, ctx: Option<&mut Context>) -> Result<String> {
        let mut r = Renderer::new(self);
        if let Some(ctx) = ctx {
            r = r.with_context(ctx);
        }
        r.render(id)
    }
}


#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct RegionId {
    allocator_id: u32, // constant
    generation: u32, // mutated
}

pub struct AId<T> {
    t: PhantomData<fn() -> T>,
    regionid: RegionId,
    id: u32,
}

impl<T> AId<T> {
    fn new(regionid: RegionId, id: u32) -> AId<T> {
        AId { t: PhantomData, regionid, id }
    }

    pub fn index(&self) -> u32 {
        self.id
    }
}

// derive is broken when using PhantomData, so do it manually:
impl<T> Clone for AId<T> {
    fn clone(&self) -> Self {
        Self { t: PhantomData, regionid: self.regionid, id: self.id }
    }
}
impl<T> Copy for AId<T> {}

impl<T> PartialEq for AId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.regionid == other.regionid && self.id == other.id
    }
}
impl<T> Eq for AId<T> {}

impl<T> Hash for AId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.regionid.hash(state);
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for AId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.id)
    }
}


#[cfg(test)]
mod tests {
    use chj_util::warn::capture_warnings;

    use crate::{error::tree_error_kind, value::att};
    use super::*;

    #[test]
    fn t_out_of_memory() {
        let html = HtmlAllocator::new(2);
        html.new_node("p").unwrap();
        html.new_node("p").unwrap();
        let e = html.new_node("p").unwrap_err();
        assert!(matches!(tree_error_kind(&e), Some(TreeErrorKind::OutOfMemory)));
    }

    #[test]
    #[should_panic(expected = "incompatible RegionId")]
    fn t_foreign_id_panics() {
        let a = HtmlAllocator::new(10);
        let b = HtmlAllocator::new(10);
        let id = a.new_node("p").unwrap();
        b.get_node(id);
    }

    #[test]
    fn t_try_get_node() {
        let a = HtmlAllocator::new(10);
        let b = HtmlAllocator::new(10);
        let id = a.new_node("p").unwrap();
        assert_eq!(a.try_get_node(id).unwrap().tag_name(), Some("p"));
        let e = b.try_get_node(id).unwrap_err();
        assert!(matches!(tree_error_kind(&e), Some(TreeErrorKind::InvalidId(_))));
    }

    #[test]
    fn t_wraps_into_default_child() {
        let html = HtmlAllocator::new(100);
        let ul = html.element("ul", [att("class", "x"), "one".into()]).unwrap();
        let li = html.element("li", ["two"]).unwrap();
        html.append(ul, li).unwrap();
        html.append(ul, html.element("p", ["three"]).unwrap()).unwrap();
        assert_eq!(html.content_len(ul), 3);
        for i in 0..3 {
            match html.content_at(ul, i) {
                Some(Value::Element(e)) =>
                    assert_eq!(html.tag_name(e).as_deref(), Some("li")),
                v => panic!("expected element, got {v:?}")
            }
        }
        assert!(matches!(html.content_at(ul, 1), Some(Value::Element(e)) if e == li));
    }

    #[test]
    fn t_add_to_last_child() {
        let html = HtmlAllocator::new(100);
        let tbody = html.element("tbody", ()).unwrap();
        html.append(tbody, "a").unwrap();
        html.append(tbody, "b").unwrap();
        assert_eq!(html.content_len(tbody), 1);
        let tr = html.last_child(tbody).unwrap();
        assert_eq!(html.content_len(tr), 2);
        assert_eq!(html.tag_name(tr).as_deref(), Some("tr"));
    }

    #[test]
    fn t_last_child_only_for_new_slots() {
        let html = HtmlAllocator::new(100);
        let div = html.element("div", ()).unwrap();
        let a = html.element("p", ()).unwrap();
        let b = html.element("p", ()).unwrap();
        html.append(div, a).unwrap();
        html.append(div, "text").unwrap();
        html.set_content_at(div, 0, b).unwrap();
        // slot 1 (the text) is still the last created one
        assert_eq!(html.get_node(div).last_child(), Some(1));
        assert_eq!(html.last_child(div), None);
        html.set_content_at(div, 4, a).unwrap();
        assert_eq!(html.last_child(div), Some(a));
    }

    #[test]
    fn t_missing_slot_warns() {
        let html = HtmlAllocator::new(100);
        let div = html.element("div", ["x"]).unwrap();
        let (v, lines) = capture_warnings(|| html.content_at(div, 7));
        assert!(v.is_none());
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("content slot 7 of <div>"));
    }

    #[test]
    fn t_attributes() {
        let html = HtmlAllocator::new(100);
        let p = html.element("p", [att("title", "t")]).unwrap();
        assert!(html.get_attribute(p, "lang").is_none());
        html.set_attribute(p, "class", ["a", "b"]).unwrap();
        html.add_to_attribute(p, "class", "c").unwrap();
        assert!(matches!(html.get_attribute(p, "class"),
                         Some(Value::Attribute(c)) if c.len() == 3));
        html.add_to_attribute(p, "title", "u").unwrap();
        assert!(matches!(html.get_attribute(p, "title"),
                         Some(Value::Attribute(c)) if c.len() == 2));
        let e = html.set_attribute(p, "title", p).unwrap_err();
        assert!(matches!(tree_error_kind(&e),
                         Some(TreeErrorKind::UnsupportedAttributeValue { .. })));
        assert!(html.remove_attribute(p, "title").is_some());
        assert!(html.get_attribute(p, "title").is_none());
    }

    #[test]
    fn t_reclassify_maps_as_attributes() {
        let html = HtmlAllocator::new(100);
        let div = html.element("div", [Arg::from(Value::map([("id", "main")])), "x".into()])
            .unwrap();
        assert_eq!(html.content_len(div), 1);
        assert!(matches!(html.get_attribute(div, "id"), Some(Value::Text(s)) if s.as_str() == "main"));
        let c = crate::attribute::AttributeContainer::from_value("class", Value::from("k"));
        html.append(div, c).unwrap();
        assert!(html.get_attribute(div, "class").is_some());
        assert_eq!(html.content_len(div), 1);
    }

    #[derive(Debug)]
    struct Marker(&'static str);

    impl crate::value::ForeignValue for Marker {
        fn as_any(&self) -> &dyn Any { self }
    }

    #[test]
    fn t_special_handler() {
        let html = HtmlAllocator::new(100);
        html.register_special::<Marker>(|html, id, m| {
            html.set_attribute(id, "data-marker", m.0)
        });
        let div = html.element("div", [Value::foreign(Marker("m1"))]).unwrap();
        assert_eq!(html.content_len(div), 0);
        assert!(matches!(html.get_attribute(div, "data-marker"),
                         Some(Value::Text(s)) if s.as_str() == "m1"));
    }

    #[test]
    fn t_repeater_promotion() {
        let html = HtmlAllocator::new(100);
        let div = html.element("div", ()).unwrap();
        let a = html.records([]).unwrap();
        let b = html.records([]).unwrap();
        html.append(div, a).unwrap();
        html.append(div, b).unwrap();
        let p = html.get_node(div).repeater().unwrap();
        assert_eq!(html.parallel_members(p), Some(vec![a, b]));

        let n1 = html.named_repeater("x", crate::repeater::RecordList::new([])).unwrap();
        let n2 = html.named_repeater("x", crate::repeater::RecordList::new([])).unwrap();
        html.append(div, n1).unwrap();
        html.append(div, n2).unwrap();
        assert_eq!(html.parallel_members(p), Some(vec![a, b, n2]));

        let d2 = html.element("div", [att("repeater", n1)]).unwrap();
        html.set_repeater(d2, n2).unwrap();
        assert_eq!(html.get_node(d2).repeater(), Some(n2));
    }
}
