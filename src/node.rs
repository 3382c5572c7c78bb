//! The element record stored in the arena, and the tables routing
//! named construction arguments to setters.

use anyhow::{Result, Context};
use kstring::KString;

use html_meta::MetaDb;

use crate::{allocator::{AId, HtmlAllocator},
            error::{tree_error, TreeErrorKind},
            repeater::Repeater,
            table::{self, TableSlots},
            value::Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Plain,
    Table,
    /// thead, tbody, tfoot
    TableSection,
    TableRow,
    /// td, th
    TableCell,
}

impl NodeKind {
    pub fn for_tag(tag: &str) -> NodeKind {
        match tag {
            "table" => NodeKind::Table,
            "thead" | "tbody" | "tfoot" => NodeKind::TableSection,
            "tr" => NodeKind::TableRow,
            "td" | "th" => NodeKind::TableCell,
            _ => NodeKind::Plain,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Plain => "plain",
            NodeKind::Table => "table",
            NodeKind::TableSection => "table section",
            NodeKind::TableRow => "table row",
            NodeKind::TableCell => "table cell",
        }
    }

    pub fn is_tabular(self) -> bool {
        self != NodeKind::Plain
    }

    /// The setters specific to this kind, consulted before
    /// `BASE_SETTERS`.
    fn setters(self) -> &'static [(&'static str, Setter)] {
        match self {
            NodeKind::Table => table::TABLE_SETTERS,
            NodeKind::TableSection => table::SECTION_SETTERS,
            _ => &[],
        }
    }

    /// Kinds that place content themselves instead of the generic
    /// insertion.
    pub(crate) fn content_handler(self) -> Option<ContentHandler> {
        match self {
            NodeKind::Table => Some(table::insert_into_table),
            _ => None,
        }
    }
}

/// Handles a named construction argument.
pub type Setter = fn(&HtmlAllocator, AId<Node>, Value) -> Result<()>;

pub(crate) type ContentHandler = fn(&HtmlAllocator, AId<Node>, Option<usize>, Value) -> Result<()>;

pub fn find_setter(kind: NodeKind, name: &str) -> Option<Setter> {
    kind.setters().iter()
        .chain(BASE_SETTERS.iter())
        .find(|(n, _)| *n == name)
        .map(|(_, s)| *s)
}

const BASE_SETTERS: &[(&str, Setter)] = &[
    ("repeater", set_repeater_arg),
    ("on_empty", set_on_empty_arg),
    ("repeat_tags", set_repeat_tags_arg),
    ("render_without_content", set_render_without_content_arg),
    ("render_closing_tag", set_render_closing_tag_arg),
    ("allowed_child_tags", set_allowed_child_tags_arg),
    ("default_child_tag", set_default_child_tag_arg),
    ("add_to_last_child", set_add_to_last_child_arg),
    ("prepend", set_prepend_arg),
    ("append", set_append_arg),
];

fn bad_arg(setter: &'static str, message: String) -> anyhow::Error {
    tree_error(TreeErrorKind::BadSetterValue { setter, message })
}

pub(crate) fn bool_arg(setter: &'static str, v: &Value) -> Result<bool> {
    match v {
        Value::Bool(b) => Ok(*b),
        Value::Null => Ok(false),
        _ => Err(bad_arg(setter, format!("expecting a bool, got {:?}", v.capability())))
    }
}

pub(crate) fn usize_arg(setter: &'static str, v: &Value) -> Result<usize> {
    match v {
        Value::Number(n) => n.as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| bad_arg(setter, format!("expecting a natural number, got {n}"))),
        Value::Text(s) => s.parse()
            .map_err(|e| bad_arg(setter, format!("expecting a natural number, got {s:?}: {e}"))),
        _ => Err(bad_arg(setter, format!("expecting a number, got {:?}", v.capability())))
    }
}

pub(crate) fn text_arg(setter: &'static str, v: &Value) -> Result<KString> {
    match v {
        Value::Null => Ok(KString::from_static("")),
        Value::Text(s) | Value::Raw(s) => Ok(s.clone()),
        Value::Number(n) => Ok(KString::from_string(n.to_string())),
        _ => Err(bad_arg(setter, format!("expecting text, got {:?}", v.capability())))
    }
}

/// A list of names, or a single string of names separated by
/// whitespace or commas.
pub(crate) fn names_arg(setter: &'static str, v: &Value) -> Result<Vec<KString>> {
    match v {
        Value::Null => Ok(Vec::new()),
        Value::Text(s) => Ok(s.split(|c: char| c.is_whitespace() || c == ',')
                             .filter(|s| ! s.is_empty())
                             .map(KString::from_ref)
                             .collect()),
        Value::List(items) => items.iter().map(|v| text_arg(setter, v)).collect(),
        _ => Err(bad_arg(setter, format!("expecting a list of names, got {:?}",
                                         v.capability())))
    }
}

fn set_repeater_arg(html: &HtmlAllocator, id: AId<Node>, v: Value) -> Result<()> {
    match v {
        Value::Repeater(r) => html.set_repeater(id, r),
        Value::Null => {
            html.clear_repeater(id);
            Ok(())
        }
        _ => Err(bad_arg("repeater", format!("expecting a repeater, got {:?}",
                                             v.capability())))
    }
}

fn set_on_empty_arg(html: &HtmlAllocator, id: AId<Node>, v: Value) -> Result<()> {
    html.set_on_empty(id, v);
    Ok(())
}

fn set_repeat_tags_arg(html: &HtmlAllocator, id: AId<Node>, v: Value) -> Result<()> {
    html.set_repeat_tags(id, bool_arg("repeat_tags", &v)?);
    Ok(())
}

fn set_render_without_content_arg(html: &HtmlAllocator, id: AId<Node>, v: Value) -> Result<()> {
    html.set_render_without_content(id, bool_arg("render_without_content", &v)?);
    Ok(())
}

fn set_render_closing_tag_arg(html: &HtmlAllocator, id: AId<Node>, v: Value) -> Result<()> {
    html.set_render_closing_tag(id, bool_arg("render_closing_tag", &v)?);
    Ok(())
}

fn set_allowed_child_tags_arg(html: &HtmlAllocator, id: AId<Node>, v: Value) -> Result<()> {
    html.set_allowed_child_tags(id, names_arg("allowed_child_tags", &v)?);
    Ok(())
}

fn set_default_child_tag_arg(html: &HtmlAllocator, id: AId<Node>, v: Value) -> Result<()> {
    let tag = text_arg("default_child_tag", &v)?;
    html.set_default_child_tag(id, if tag.is_empty() { None } else { Some(tag) });
    Ok(())
}

fn set_add_to_last_child_arg(html: &HtmlAllocator, id: AId<Node>, v: Value) -> Result<()> {
    html.set_add_to_last_child(id, bool_arg("add_to_last_child", &v)?);
    Ok(())
}

fn set_prepend_arg(html: &HtmlAllocator, id: AId<Node>, v: Value) -> Result<()> {
    let s = text_arg("prepend", &v)?;
    html.with_node_mut(id, |n| n.prepend = s);
    Ok(())
}

fn set_append_arg(html: &HtmlAllocator, id: AId<Node>, v: Value) -> Result<()> {
    let s = text_arg("append", &v)?;
    html.with_node_mut(id, |n| n.append = s);
    Ok(())
}


#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) kind: NodeKind,
    /// Text, or a lazy value resolving to the tag name. The empty
    /// name makes a fragment: content without a tag.
    pub(crate) tag: Value,
    pub(crate) content: Vec<Value>,
    pub(crate) attrs: Vec<(KString, Value)>,
    pub(crate) render_without_content: bool,
    pub(crate) render_closing_tag: bool,
    pub(crate) allowed_child_tags: Vec<KString>,
    pub(crate) default_child_tag: Option<KString>,
    pub(crate) add_to_last_child: bool,
    pub(crate) last_child: Option<usize>,
    pub(crate) repeater: Option<AId<Repeater>>,
    pub(crate) repeat_tags: bool,
    pub(crate) on_empty: Option<Value>,
    pub(crate) prepend: KString,
    pub(crate) append: KString,
    /// Classes cycled over the rows of a table section at render
    /// time.
    pub(crate) row_classes: Vec<KString>,
    pub(crate) table: Option<TableSlots>,
}

impl Node {
    pub(crate) fn new(tag: Value, metadb: Option<&MetaDb>) -> Node {
        let tag_text = match &tag {
            Value::Text(s) => Some(s.clone()),
            _ => None,
        };
        let kind = tag_text.as_deref().map(NodeKind::for_tag).unwrap_or(NodeKind::Plain);
        let meta = match (metadb, &tag_text) {
            (Some(db), Some(t)) => db.get(t),
            _ => None,
        };
        let mut node = Node {
            kind,
            tag,
            content: Vec::new(),
            attrs: Vec::new(),
            render_without_content: false,
            render_closing_tag: false,
            allowed_child_tags: Vec::new(),
            default_child_tag: None,
            add_to_last_child: false,
            last_child: None,
            repeater: None,
            repeat_tags: false,
            on_empty: None,
            prepend: KString::from_static(""),
            append: KString::from_static(""),
            row_classes: Vec::new(),
            table: None,
        };
        if let Some(meta) = meta {
            node.render_without_content = meta.is_void;
            node.render_closing_tag = meta.render_closing_tag;
            node.allowed_child_tags = meta.child_elements.clone();
            node.default_child_tag = meta.default_child.clone();
            node.add_to_last_child = meta.add_to_last_child;
            node.fix_default_child();
        }
        node
    }

    /// Keep the default child among the allowed ones.
    pub(crate) fn fix_default_child(&mut self) {
        if self.allowed_child_tags.is_empty() {
            return;
        }
        match &self.default_child_tag {
            Some(d) => {
                if ! self.allowed_child_tags.contains(d) {
                    self.allowed_child_tags.push(d.clone());
                }
            }
            None => self.default_child_tag = self.allowed_child_tags.first().cloned(),
        }
    }

    pub(crate) fn store_content(&mut self, slot: Option<usize>, val: Value) {
        let len = self.content.len();
        match slot {
            Some(i) if i < len => self.content[i] = val,
            Some(i) => {
                self.content.resize(i, Value::Null);
                self.content.push(val);
                self.last_child = Some(i);
            }
            None => {
                self.content.push(val);
                self.last_child = Some(len);
            }
        }
    }

    pub(crate) fn last_child_element(&self) -> Option<AId<Node>> {
        match self.content.get(self.last_child?) {
            Some(Value::Element(e)) => Some(*e),
            _ => None
        }
    }

    pub(crate) fn set_attr(&mut self, name: KString, val: Value) {
        match self.attrs.iter_mut().find(|(k, _)| *k == name) {
            Some((_, v)) => *v = val,
            None => self.attrs.push((name, val)),
        }
    }

    pub(crate) fn attr(&self, name: &str) -> Option<&Value> {
        self.attrs.iter().find(|(k, _)| k.as_str() == name).map(|(_, v)| v)
    }

    pub fn kind(&self) -> NodeKind { self.kind }
    pub fn tag(&self) -> &Value { &self.tag }
    pub fn content(&self) -> &[Value] { &self.content }
    pub fn attributes(&self) -> &[(KString, Value)] { &self.attrs }
    pub fn render_without_content(&self) -> bool { self.render_without_content }
    pub fn render_closing_tag(&self) -> bool { self.render_closing_tag }
    pub fn allowed_child_tags(&self) -> &[KString] { &self.allowed_child_tags }
    pub fn default_child_tag(&self) -> Option<&KString> { self.default_child_tag.as_ref() }
    pub fn add_to_last_child(&self) -> bool { self.add_to_last_child }
    pub fn last_child(&self) -> Option<usize> { self.last_child }
    pub fn repeater(&self) -> Option<AId<Repeater>> { self.repeater }
    pub fn repeat_tags(&self) -> bool { self.repeat_tags }
    pub fn on_empty(&self) -> Option<&Value> { self.on_empty.as_ref() }

    /// The tag name if it is not lazy.
    pub fn tag_name(&self) -> Option<&str> {
        match &self.tag {
            Value::Text(s) => Some(s.as_str()),
            _ => None
        }
    }
}

impl HtmlAllocator {
    pub fn set_on_empty(&self, id: AId<Node>, v: impl Into<Value>) {
        let v = v.into();
        self.with_node_mut(id, |n| n.on_empty = if v.is_null() { None } else { Some(v) })
    }

    pub fn set_repeat_tags(&self, id: AId<Node>, on: bool) {
        self.with_node_mut(id, |n| n.repeat_tags = on)
    }

    pub fn set_render_without_content(&self, id: AId<Node>, on: bool) {
        self.with_node_mut(id, |n| n.render_without_content = on)
    }

    pub fn set_render_closing_tag(&self, id: AId<Node>, on: bool) {
        self.with_node_mut(id, |n| n.render_closing_tag = on)
    }

    pub fn set_add_to_last_child(&self, id: AId<Node>, on: bool) {
        self.with_node_mut(id, |n| n.add_to_last_child = on)
    }

    /// An empty list lifts the constraint. The default child tag is
    /// added to the list if missing, or set to its first entry if
    /// unset.
    pub fn set_allowed_child_tags(&self, id: AId<Node>, tags: Vec<KString>) {
        self.with_node_mut(id, |n| {
            n.allowed_child_tags = tags;
            n.fix_default_child();
        })
    }

    pub fn set_default_child_tag(&self, id: AId<Node>, tag: Option<KString>) {
        self.with_node_mut(id, |n| {
            n.default_child_tag = tag;
            n.fix_default_child();
        })
    }

    pub fn set_tag(&self, id: AId<Node>, tag: impl Into<Value>) {
        let tag = tag.into();
        self.with_node_mut(id, |n| n.tag = tag)
    }

    /// Route a named argument: to a setter of the node's kind if one
    /// has that name, then by capability, else to an attribute.
    pub(crate) fn set_named(&self, id: AId<Node>, name: KString, v: Value) -> Result<()> {
        let kind = self.with_node(id, |n| n.kind);
        if let Some(setter) = find_setter(kind, &name) {
            return setter(self, id, v).with_context(|| {
                format!("setting {name:?} on {}", self.describe(id))
            });
        }
        match v {
            Value::Repeater(r) => self.set_repeater(id, r),
            Value::Foreign(_) | Value::Element(_) => self.append(id, v),
            Value::Attribute(c) => {
                let name = c.name().clone();
                self.set_attribute(id, name, Value::Attribute(c))
            }
            v => self.set_attribute(id, name, v)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::value::att;
    use super::*;

    #[test]
    fn t_setter_lookup() {
        assert!(find_setter(NodeKind::Plain, "repeat_tags").is_some());
        assert!(find_setter(NodeKind::Plain, "pivot").is_none());
        assert!(find_setter(NodeKind::Table, "pivot").is_some());
        assert!(find_setter(NodeKind::Table, "on_empty").is_some());
        assert!(find_setter(NodeKind::Plain, "class").is_none());
    }

    #[test]
    fn t_named_routing() {
        let html = HtmlAllocator::new(100);
        let ul = html.element("ul", [att("render_closing_tag", true),
                                     att("class", "menu")]).unwrap();
        let n = html.get_node(ul);
        assert!(n.render_closing_tag());
        assert!(n.attr("render_closing_tag").is_none());
        assert!(matches!(n.attr("class"), Some(Value::Text(s)) if s.as_str() == "menu"));

        let e = html.element("ul", [att("repeat_tags", "yes")]).unwrap_err();
        assert!(format!("{e:#}").contains("expecting a bool"));
    }

    #[test]
    fn t_default_child_kept_allowed() {
        let html = HtmlAllocator::new(100);
        let d = html.element("div", [att("allowed_child_tags", "p, pre"),
                                     att("default_child_tag", "section")]).unwrap();
        let n = html.get_node(d);
        assert_eq!(n.default_child_tag().map(|s| s.as_str()), Some("section"));
        assert!(n.allowed_child_tags().iter().any(|t| t.as_str() == "section"));

        let d = html.element("div", [att("allowed_child_tags", ["p", "pre"])]).unwrap();
        assert_eq!(html.get_node(d).default_child_tag().map(|s| s.as_str()), Some("p"));
    }

    #[test]
    fn t_set_tag() {
        let html = HtmlAllocator::new(100);
        let d = html.element("div", ["x"]).unwrap();
        html.set_tag(d, "section");
        assert_eq!(html.tag_name(d).as_deref(), Some("section"));
        assert_eq!(html.to_html_string(d, None).unwrap(), "<section>x</section>");
        html.set_tag(d, "");
        assert_eq!(html.to_html_string(d, None).unwrap(), "x");
    }

    #[test]
    fn t_store_content() {
        let mut n = Node::new(Value::from("div"), None);
        n.store_content(None, Value::from("a"));
        assert_eq!(n.last_child, Some(0));
        n.store_content(Some(0), Value::from("b"));
        assert_eq!(n.last_child, Some(0));
        n.store_content(Some(3), Value::from("c"));
        assert_eq!(n.last_child, Some(3));
        assert_eq!(n.content.len(), 4);
        assert!(n.content[1].is_null());
    }
}
