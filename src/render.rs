//! Turning trees into HTML text: resolves lazy values against the
//! resolution context, drives repeaters, escapes text and serializes
//! attributes.

use std::{any::{Any, TypeId},
          collections::HashMap,
          rc::Rc,
          time::Instant};

use anyhow::{Result, Context as _};
use chj_util::{time_guard::{self, TimeGuard}, warn};
use kstring::KString;
use serde_json::Value as JsonValue;

use crate::{allocator::{AId, HtmlAllocator},
            attribute::{is_event_handler, AttrKind, AttributeContainer},
            config::RenderConfig,
            context::Context,
            error::{tree_error, TreeErrorKind},
            lazy::unwind,
            node::{Node, NodeKind},
            repeater::Repeater,
            table::SlotSwap,
            value::{ForeignValue, Value}};

/// Emitted in place of a node that is already being rendered further
/// up.
pub const CIRCULAR: &str = "[CIRCULAR]";

/// Turns a foreign value into something the renderer knows.
pub type RenderHandler = Rc<dyn Fn(&dyn Any) -> Result<Value>>;

pub fn html_escape_into(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c)
        }
    }
}

pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    html_escape_into(&mut out, s);
    out
}

/// `name[x][y]` -> `name-x-y`, with a trailing `[]` dropped.
pub fn normalize_id(s: &str) -> String {
    let s = s.strip_suffix("[]").unwrap_or(s);
    s.replace("][", "-").replace('[', "-").replace(']', "")
}

#[derive(Debug)]
struct Striping {
    classes: Vec<KString>,
    index: usize,
}

pub struct Renderer<'a> {
    html: &'a HtmlAllocator,
    ctx: Option<&'a mut Context>,
    handlers: HashMap<TypeId, RenderHandler>,
    config: RenderConfig,
    // Nodes currently being rendered
    path: Vec<AId<Node>>,
    // One entry per table section being rendered
    striping: Vec<Option<Striping>>,
}

impl<'a> Renderer<'a> {
    pub fn new(html: &'a HtmlAllocator) -> Self {
        Renderer {
            html,
            ctx: None,
            handlers: HashMap::new(),
            config: RenderConfig::default(),
            path: Vec::new(),
            striping: Vec::new(),
        }
    }

    pub fn with_context(self, ctx: &'a mut Context) -> Self {
        Renderer { ctx: Some(ctx), ..self }
    }

    pub fn with_config(self, config: RenderConfig) -> Self {
        Renderer { config, ..self }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render foreign values of type `T` via `handler`.
    pub fn register<T: 'static>(mut self, handler: impl Fn(&T) -> Result<Value> + 'static)
                                -> Self {
        let h: RenderHandler = Rc::new(move |v: &dyn Any| {
            match v.downcast_ref::<T>() {
                Some(v) => handler(v),
                None => anyhow::bail!("render handler called with wrong type")
            }
        });
        self.handlers.insert(TypeId::of::<T>(), h);
        self
    }

    pub fn render(&mut self, id: AId<Node>) -> Result<String> {
        let _guard =
            if self.config.trace || time_guard::enabled() {
                TimeGuard::Enabled { name: self.html.describe(id), start: Instant::now() }
            } else {
                TimeGuard::Disabled
            };
        let mut out = String::new();
        self.render_node(id, &mut out)?;
        Ok(out)
    }

    pub fn render_any(&mut self, v: &Value) -> Result<String> {
        let mut out = String::new();
        self.render_value(v, &mut out)?;
        Ok(out)
    }

    pub fn render_array(&mut self, vs: &[Value], glue: &str) -> Result<String> {
        let mut out = String::new();
        for (i, v) in vs.iter().enumerate() {
            if i > 0 {
                out.push_str(glue);
            }
            self.render_value(v, &mut out)?;
        }
        Ok(out)
    }

    fn unwind(&self, v: Value) -> Result<Value> {
        unwind(v, self.html, self.ctx.as_deref(), self.config.max_unwind)
    }

    /// Run `f` with the current records of `r` published in a fresh
    /// context frame.
    fn in_frame<R>(&mut self, r: AId<Repeater>, f: impl FnOnce(&mut Self) -> Result<R>)
                   -> Result<R> {
        let bindings = self.html.repeater_bindings(r);
        if bindings.is_empty() || self.ctx.is_none() {
            return f(self);
        }
        if let Some(ctx) = self.ctx.as_deref_mut() {
            ctx.push_frame();
            for (name, rec) in bindings {
                ctx.set(name, rec);
            }
        }
        let res = f(self);
        if let Some(ctx) = self.ctx.as_deref_mut() {
            ctx.pop_frame();
        }
        res
    }

    /// Call `body` once per record of `r`; false if there were none.
    fn repeat(&mut self, r: AId<Repeater>, out: &mut String,
              mut body: impl FnMut(&mut Self, &mut String) -> Result<()>) -> Result<bool> {
        let mut any = false;
        if self.html.repeater_start(r)? {
            while self.html.repeater_next(r)? {
                any = true;
                self.in_frame(r, |this| body(this, out))?;
            }
        }
        Ok(any)
    }

    fn render_node(&mut self, id: AId<Node>, out: &mut String) -> Result<()> {
        if self.path.contains(&id) {
            out.push_str(CIRCULAR);
            return Ok(());
        }
        self.path.push(id);
        let res = self.render_node_unguarded(id, out);
        self.path.pop();
        res
    }

    fn render_node_unguarded(&mut self, id: AId<Node>, out: &mut String) -> Result<()> {
        let pivot = self.html.with_node(id, |n| n.table.as_ref().map_or(false, |t| t.pivot));
        if pivot {
            let _swap = SlotSwap::pivot(self.html, id)?;
            let node = self.html.get_node(id);
            return self.render_bound(id, &node, out);
        }
        let node = self.html.get_node(id);
        self.render_bound(id, &node, out)
    }

    fn render_bound(&mut self, id: AId<Node>, node: &Node, out: &mut String) -> Result<()> {
        match node.repeater {
            Some(r) if node.repeat_tags => {
                let any = self.repeat(r, out, |this, out| this.render_tag(id, node, out))?;
                if ! any {
                    if let Some(v) = &node.on_empty {
                        self.render_value(v, out)?;
                    }
                }
                Ok(())
            }
            _ => self.render_tag(id, node, out)
        }
    }

    fn tag_text(&self, node: &Node) -> Result<KString> {
        let tag = self.unwind(node.tag.clone())?;
        match tag.as_scalar_text() {
            Some(t) => Ok(t),
            None => Err(tree_error(TreeErrorKind::Unrenderable(tag.capability().name())))
                .context("tag name"),
        }
    }

    fn next_stripe(&mut self) -> Option<KString> {
        match self.striping.last_mut() {
            Some(Some(s)) if ! s.classes.is_empty() => {
                let c = s.classes[s.index % s.classes.len()].clone();
                s.index += 1;
                Some(c)
            }
            _ => None
        }
    }

    fn render_tag(&mut self, id: AId<Node>, node: &Node, out: &mut String) -> Result<()> {
        let tag = self.tag_text(node)
            .with_context(|| format!("rendering {}", self.html.describe(id)))?;
        let stripe = match node.kind {
            NodeKind::TableRow => self.next_stripe(),
            _ => None,
        };

        let mut content = String::new();
        if node.kind == NodeKind::TableSection {
            self.striping.push(if node.row_classes.is_empty() {
                None
            } else {
                Some(Striping { classes: node.row_classes.clone(), index: 0 })
            });
            let res = self.render_content(node, &mut content);
            self.striping.pop();
            res?;
        } else {
            self.render_content(node, &mut content)?;
        }
        if content.is_empty() && ! node.repeat_tags {
            if let Some(v) = &node.on_empty {
                self.render_value(v, &mut content)?;
            }
        }

        if tag.is_empty() {
            out.push_str(&node.prepend);
            out.push_str(&content);
            out.push_str(&node.append);
            return Ok(());
        }
        let has_content = ! content.is_empty();
        if ! (has_content || node.render_without_content || node.render_closing_tag) {
            return Ok(());
        }
        out.push_str(&node.prepend);
        out.push('<');
        out.push_str(&tag);
        self.render_attributes(node, stripe, out)?;
        if has_content || node.render_closing_tag {
            out.push('>');
            out.push_str(&content);
            out.push_str("</");
            out.push_str(&tag);
            out.push('>');
        } else {
            out.push_str(" />");
        }
        if self.config.readable
            && self.html.metadb()
                .and_then(|db| db.get(&tag))
                .map_or(false, |m| m.block_newline)
        {
            out.push('\n');
        }
        out.push_str(&node.append);
        Ok(())
    }

    fn render_content(&mut self, node: &Node, out: &mut String) -> Result<()> {
        match node.repeater {
            Some(r) if ! node.repeat_tags => {
                self.repeat(r, out, |this, out| this.render_items(node, out))?;
                Ok(())
            }
            _ => self.render_items(node, out)
        }
    }

    fn render_items(&mut self, node: &Node, out: &mut String) -> Result<()> {
        for item in &node.content {
            if self.config.verify
                && matches!(item, Value::Lazy(_))
                && ! node.allowed_child_tags.is_empty()
            {
                let v = self.unwind(item.clone())?;
                self.verify_child(node, &v);
                self.render_value(&v, out)?;
            } else {
                self.render_value(item, out)?;
            }
        }
        Ok(())
    }

    fn verify_child(&self, parent: &Node, v: &Value) {
        if let Value::Element(e) = v {
            if let Some(t) = self.html.tag_name(*e) {
                if ! parent.allowed_child_tags.contains(&t) {
                    warn!("<{}> is not an allowed child of <{}>",
                          t, parent.tag_name().unwrap_or("?"));
                }
            }
        }
    }

    fn render_value(&mut self, v: &Value, out: &mut String) -> Result<()> {
        match v {
            Value::Null => (),
            Value::Bool(_) | Value::Number(_) | Value::Text(_) => {
                if let Some(s) = v.as_scalar_text() {
                    html_escape_into(out, &s);
                }
            }
            Value::Raw(s) => out.push_str(s),
            Value::Lazy(_) => {
                let v = self.unwind(v.clone())?;
                self.render_value(&v, out)?;
            }
            Value::Element(e) => self.render_node(*e, out)?,
            Value::Attribute(c) => {
                let s = self.container_text(c)?;
                html_escape_into(out, &s);
            }
            Value::List(items) => {
                for item in items {
                    self.render_value(item, out)?;
                }
            }
            Value::Foreign(f) => {
                let v = self.foreign_value(&**f)?;
                self.render_value(&v, out)?;
            }
            Value::Repeater(_) | Value::Map(_) => {
                return Err(tree_error(TreeErrorKind::Unrenderable(v.capability().name())))
            }
        }
        Ok(())
    }

    /// Through a registered handler, or the value's own text
    /// conversion.
    fn foreign_value(&self, f: &dyn ForeignValue) -> Result<Value> {
        if let Some(h) = self.handlers.get(&f.as_any().type_id()).cloned() {
            return h(f.as_any())
                .with_context(|| format!("render handler for {}", f.type_name()));
        }
        match f.to_text() {
            Some(s) => Ok(Value::from(s)),
            None => Err(tree_error(TreeErrorKind::UnhandledForeign(f.type_name())))
        }
    }

    /// Unescaped text of an attribute value item.
    fn attr_item_text(&mut self, v: &Value) -> Result<String> {
        let v = self.unwind(v.clone())?;
        match &v {
            Value::Foreign(f) => {
                let v = self.foreign_value(&**f)?;
                self.attr_item_text(&v)
            }
            Value::Attribute(c) => self.container_text(c),
            Value::List(items) => {
                let mut parts = Vec::with_capacity(items.len());
                for item in items {
                    parts.push(self.attr_item_text(item)?);
                }
                Ok(parts.join(" "))
            }
            _ => match v.as_scalar_text() {
                Some(s) => Ok(s.to_string()),
                None => Err(tree_error(TreeErrorKind::Unrenderable(v.capability().name())))
                    .context("attribute value")
            }
        }
    }

    fn container_text(&mut self, c: &AttributeContainer) -> Result<String> {
        c.render_with(&mut |v| self.attr_item_text(v))
    }

    fn to_json(&mut self, v: &Value) -> Result<JsonValue> {
        let v = self.unwind(v.clone())?;
        Ok(match v {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(b),
            Value::Number(n) => JsonValue::Number(n),
            Value::Text(s) | Value::Raw(s) => JsonValue::String(s.to_string()),
            Value::List(items) => JsonValue::Array(
                items.iter().map(|v| self.to_json(v)).collect::<Result<_>>()?),
            Value::Map(pairs) => {
                let mut m = serde_json::Map::new();
                for (k, v) in &pairs {
                    m.insert(k.to_string(), self.to_json(v)?);
                }
                JsonValue::Object(m)
            }
            v => JsonValue::String(self.attr_item_text(&v)?),
        })
    }

    fn render_attributes(&mut self, node: &Node, stripe: Option<KString>, out: &mut String)
                         -> Result<()> {
        let mut stripe = stripe;
        for (name, v) in &node.attrs {
            let mut v = self.unwind(v.clone())
                .with_context(|| format!("attribute {name:?}"))?;
            if name.as_str() == "class" {
                if let Some(s) = stripe.take() {
                    v = with_class(v, s);
                }
            }
            self.render_attribute(name, v, out)
                .with_context(|| format!("attribute {name:?}"))?;
        }
        if let Some(s) = stripe {
            self.render_attribute("class", Value::Text(s), out)?;
        }
        Ok(())
    }

    fn render_attribute(&mut self, name: &str, v: Value, out: &mut String) -> Result<()> {
        let script = is_event_handler(name, self.html.metadb());
        let text = match &v {
            Value::Null | Value::Bool(false) => return Ok(()),
            Value::Bool(true) => name.to_string(),
            Value::Element(_) | Value::Repeater(_) | Value::Lazy(_) => {
                return Err(tree_error(TreeErrorKind::UnsupportedAttributeValue {
                    name: KString::from_ref(name),
                    capability: v.capability().name()
                }))
            }
            Value::List(_) | Value::Map(_) if script => self.to_json(&v)?.to_string(),
            Value::List(_) | Value::Map(_) => {
                let mut c = AttributeContainer::with_kind(
                    name, AttrKind::for_name_in(name, self.html.metadb()));
                c.add(v.clone());
                self.container_text(&c)?
            }
            Value::Attribute(c) => {
                let s = self.container_text(c)?;
                if s.is_empty() {
                    return Ok(());
                }
                s
            }
            _ => self.attr_item_text(&v)?,
        };
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        if script {
            out.push_str(&text.replace('"', "&quot;"));
        } else if name == "id" {
            html_escape_into(out, &normalize_id(&text));
        } else {
            html_escape_into(out, &text);
        }
        out.push('"');
        Ok(())
    }
}

/// `v` as a class list with `class` added.
fn with_class(v: Value, class: KString) -> Value {
    let mut c = match v {
        Value::Attribute(c) => c,
        Value::Null | Value::Bool(false) => AttributeContainer::new("class"),
        v => AttributeContainer::from_value("class", v),
    };
    c.add(Value::Text(class));
    Value::Attribute(c)
}


#[cfg(test)]
mod tests {
    use chj_util::warn::capture_warnings;
    use serde_json::json;

    use crate::{error::tree_error_kind,
                lazy::LazyValue,
                value::{att, Arg}};
    use super::*;

    fn t(html: &HtmlAllocator, id: AId<Node>) -> String {
        let mut ctx = Context::new();
        html.to_html_string(id, Some(&mut ctx)).unwrap()
    }

    #[test]
    fn t_escape_and_id() {
        assert_eq!(html_escape("<a href='x'>&\"</a>"),
                   "&lt;a href=&#39;x&#39;&gt;&amp;&quot;&lt;/a&gt;");
        assert_eq!(normalize_id("a[b][c]"), "a-b-c");
        assert_eq!(normalize_id("f[x][]"), "f-x");
        assert_eq!(normalize_id("plain"), "plain");
    }

    #[test]
    fn t_emission_rules() {
        let html = HtmlAllocator::new(100);
        assert_eq!(t(&html, html.element("br", ()).unwrap()), "<br />");
        assert_eq!(t(&html, html.element("iframe", ()).unwrap()), "<iframe></iframe>");
        assert_eq!(t(&html, html.element("div", ()).unwrap()), "");
        let both = html.element("x-box", [att("render_without_content", true),
                                          att("render_closing_tag", true)]).unwrap();
        assert_eq!(t(&html, both), "<x-box></x-box>");
        let frag = html.element("", ["a", "b"]).unwrap();
        assert_eq!(t(&html, frag), "ab");
        let wrapped = html.element("p", [Arg::from("x"), att("prepend", "["), att("append", "]")])
            .unwrap();
        assert_eq!(t(&html, wrapped), "[<p>x</p>]");
    }

    #[test]
    fn t_escaping() {
        let html = HtmlAllocator::new(100);
        let p = html.element("p", [Value::from("a<b & \"c\""), Value::raw("<i>x</i>")]).unwrap();
        assert_eq!(t(&html, p), "<p>a&lt;b &amp; &quot;c&quot;<i>x</i></p>");
    }

    #[test]
    fn t_class_and_style() {
        let html = HtmlAllocator::new(100);
        let div = html.element("div", [att("class", ["a", "b"]), "x".into()]).unwrap();
        html.add_to_attribute(div, "class", "c").unwrap();
        assert_eq!(t(&html, div), "<div class=\"a b c\">x</div>");
        // idempotent
        assert_eq!(t(&html, div), "<div class=\"a b c\">x</div>");

        let span = html.element("span", [att("style", Value::map([("color", "red")])),
                                         "y".into()]).unwrap();
        assert_eq!(t(&html, span), "<span style=\"color: red;\">y</span>");
    }

    #[test]
    fn t_attribute_rules() {
        let html = HtmlAllocator::new(100);
        let input = html.element("input", [att("id", "f[x][]"),
                                           att("disabled", true),
                                           att("checked", false),
                                           att("title", Value::Null)]).unwrap();
        assert_eq!(t(&html, input), "<input id=\"f-x\" disabled=\"disabled\" />");

        let b = html.element("button", [att("onclick", "go(\"a<b\")"), "ok".into()]).unwrap();
        assert_eq!(t(&html, b), "<button onclick=\"go(&quot;a<b&quot;)\">ok</button>");

        let b = html.element("button", [att("onclick", LazyValue::var("cfg")),
                                        "ok".into()]).unwrap();
        let mut ctx = Context::new();
        ctx.set("cfg", json!({"a": [1, 2]}));
        assert_eq!(html.to_html_string(b, Some(&mut ctx)).unwrap(),
                   "<button onclick=\"{&quot;a&quot;:[1,2]}\">ok</button>");
    }

    #[test]
    fn t_repeat_tags() {
        let html = HtmlAllocator::new(100);
        let r = html.records([json!({"n": 1}), json!({"n": 2}), json!({"n": 3})]).unwrap();
        let li = html.element("li", [Arg::from(html.field(r, "n")),
                                     att("repeater", r),
                                     att("repeat_tags", true)]).unwrap();
        let ul = html.element("ul", [li]).unwrap();
        let expected = "<ul><li>1</li><li>2</li><li>3</li></ul>";
        assert_eq!(t(&html, ul), expected);
        assert_eq!(t(&html, ul), expected);
    }

    #[test]
    fn t_repeat_content() {
        let html = HtmlAllocator::new(100);
        let r = html.records([json!("a"), json!("b")]).unwrap();
        let li = html.element("li", [html.field(r, "")]).unwrap();
        let ul = html.element("ul", [Arg::from(li), att("repeater", r)]).unwrap();
        assert_eq!(t(&html, ul), "<ul><li>a</li><li>b</li></ul>");
    }

    #[test]
    fn t_on_empty() {
        let html = HtmlAllocator::new(100);
        let r = html.records([]).unwrap();
        let li = html.element("li", ["x"]).unwrap();
        html.bind_repeater(li, r, "none", true).unwrap();
        assert_eq!(t(&html, li), "none");

        let div = html.element("div", ["x"]).unwrap();
        html.bind_repeater(div, r, "none", false).unwrap();
        assert_eq!(t(&html, div), "<div>none</div>");
    }

    #[test]
    fn t_named_repeater_context() {
        let html = HtmlAllocator::new(100);
        let r = html.named_repeater("row", crate::repeater::RecordList::new(
            [json!({"n": 1}), json!({"n": 2})])).unwrap();
        let li = html.element("li", [Arg::from(LazyValue::var("row.n")),
                                     att("class", LazyValue::cycle(r, ["odd", "even"])),
                                     att("repeater", r),
                                     att("repeat_tags", true)]).unwrap();
        let mut ctx = Context::new();
        assert_eq!(html.to_html_string(li, Some(&mut ctx)).unwrap(),
                   "<li class=\"odd\">1</li><li class=\"even\">2</li>");
        assert_eq!(ctx.depth(), 1);
        assert!(ctx.get("row").is_none());
    }

    #[test]
    fn t_repeat_error_restores_context() {
        let html = HtmlAllocator::new(100);
        let r = html.named_repeater("row", crate::repeater::RecordList::new(
            [json!({"n": 1}), json!({"n": 2}), json!({"n": 3})])).unwrap();
        let n = LazyValue::call(|ctx, _| {
            let n = ctx.get("row.n").and_then(|n| n.as_i64()).unwrap_or(0);
            if n == 2 && ctx.get("strict") == Some(&json!(true)) {
                anyhow::bail!("record {n} rejected")
            }
            Ok(Value::from(n))
        });
        let li = html.element("li", [Arg::from(n),
                                     att("repeater", r),
                                     att("repeat_tags", true)]).unwrap();
        let mut ctx = Context::new();
        ctx.set("strict", true);
        let e = html.to_html_string(li, Some(&mut ctx)).unwrap_err();
        assert!(format!("{e:#}").contains("record 2 rejected"));
        assert_eq!(ctx.depth(), 1);
        assert!(ctx.get("row").is_none());

        ctx.set("strict", false);
        assert_eq!(html.to_html_string(li, Some(&mut ctx)).unwrap(),
                   "<li>1</li><li>2</li><li>3</li>");
        assert_eq!(ctx.depth(), 1);
    }

    #[test]
    fn t_parallel_render() {
        let html = HtmlAllocator::new(100);
        let a = html.named_repeater("a", crate::repeater::RecordList::new(
            [json!(1), json!(2), json!(3)])).unwrap();
        let b = html.named_repeater("b", crate::repeater::RecordList::new(
            [json!("x"), json!("y")])).unwrap();
        let li = html.element("li", [Arg::from(html.field(a, "")), "-".into(),
                                     html.field(b, "").into(),
                                     att("repeat_tags", true)]).unwrap();
        html.set_repeater(li, a).unwrap();
        html.set_repeater(li, b).unwrap();
        assert_eq!(t(&html, li), "<li>1-x</li><li>2-y</li>");
    }

    #[test]
    fn t_lazy_context() {
        let html = HtmlAllocator::new(100);
        let div = html.element("div", [LazyValue::var("x")]).unwrap();
        let e = html.to_html_string(div, None).unwrap_err();
        assert!(matches!(tree_error_kind(&e), Some(TreeErrorKind::NoContext(_))));

        let mut ctx = Context::new();
        ctx.set("x", 1);
        assert_eq!(html.to_html_string(div, Some(&mut ctx)).unwrap(), "<div>1</div>");
        ctx.set("x", "two");
        assert_eq!(html.to_html_string(div, Some(&mut ctx)).unwrap(), "<div>two</div>");
    }

    #[test]
    fn t_lazy_tag() {
        let html = HtmlAllocator::new(100);
        let e = html.element_with_tag(LazyValue::var("t"), ["x"]).unwrap();
        let mut ctx = Context::new();
        ctx.set("t", "em");
        assert_eq!(html.to_html_string(e, Some(&mut ctx)).unwrap(), "<em>x</em>");
    }

    #[test]
    fn t_cycle_guard() {
        let html = HtmlAllocator::new(100);
        let a = html.element("div", ()).unwrap();
        let b = html.element("div", [a]).unwrap();
        html.append(a, b).unwrap();
        assert_eq!(t(&html, a), format!("<div><div>{CIRCULAR}</div></div>"));
    }

    #[derive(Debug)]
    struct Money(i64);

    impl ForeignValue for Money {
        fn as_any(&self) -> &dyn Any { self }
    }

    #[derive(Debug)]
    struct Label;

    impl ForeignValue for Label {
        fn as_any(&self) -> &dyn Any { self }
        fn to_text(&self) -> Option<String> { Some("<label>".into()) }
    }

    #[test]
    fn t_foreign() {
        let html = HtmlAllocator::new(100);
        let div = html.element("div", [Value::foreign(Money(5))]).unwrap();
        let e = Renderer::new(&html).render(div).unwrap_err();
        assert!(matches!(tree_error_kind(&e), Some(TreeErrorKind::UnhandledForeign(_))));

        let s = Renderer::new(&html)
            .register::<Money>(|m| Ok(Value::from(format!("{} EUR", m.0))))
            .render(div).unwrap();
        assert_eq!(s, "<div>5 EUR</div>");

        let div = html.element("div", [Value::foreign(Label)]).unwrap();
        assert_eq!(Renderer::new(&html).render(div).unwrap(), "<div>&lt;label&gt;</div>");
    }

    #[test]
    fn t_render_any_and_array() {
        let html = HtmlAllocator::new(100);
        let mut r = Renderer::new(&html);
        assert_eq!(r.render_any(&Value::Null).unwrap(), "");
        assert_eq!(r.render_array(&[Value::from("a"), Value::from(1)], ", ").unwrap(), "a, 1");
        assert!(r.render_any(&Value::map([("a", 1)])).is_err());
    }

    #[test]
    fn t_readable() {
        let html = HtmlAllocator::new(100);
        let ul = html.element("ul", ["a"]).unwrap();
        let s = Renderer::new(&html)
            .with_config(RenderConfig::default().readable())
            .render(ul).unwrap();
        assert_eq!(s, "<ul><li>a</li>\n</ul>\n");
    }

    #[test]
    fn t_verify_warns() {
        let html = HtmlAllocator::new(100);
        let p = html.element("p", ["x"]).unwrap();
        let ul = html.element("ul", [LazyValue::call(move |_, _| Ok(Value::Element(p)))])
            .unwrap();
        let mut ctx = Context::new();
        let (s, lines) = capture_warnings(|| {
            Renderer::new(&html)
                .with_context(&mut ctx)
                .with_config(RenderConfig { verify: true, ..RenderConfig::default() })
                .render(ul)
        });
        assert_eq!(s.unwrap(), "<ul><p>x</p></ul>");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("<p> is not an allowed child of <ul>"));
    }

    #[test]
    fn t_pivot_render() {
        let html = HtmlAllocator::new(200);
        let table = html.element("table", ()).unwrap();
        html.add_row(table, [1, 2]).unwrap();
        html.add_row(table, [3, 4]).unwrap();
        let body = html.table_body(table).unwrap();
        html.set_pivot(table, true, 0, 0).unwrap();
        assert_eq!(t(&html, table),
                   "<table><tbody><tr><td>1</td><td>3</td></tr>\
                    <tr><td>2</td><td>4</td></tr></tbody></table>");
        assert_eq!(html.table_body(table).unwrap(), body);
        html.set_pivot(table, false, 0, 0).unwrap();
        assert_eq!(t(&html, table),
                   "<table><tbody><tr><td>1</td><td>2</td></tr>\
                    <tr><td>3</td><td>4</td></tr></tbody></table>");
    }

    #[test]
    fn t_pivot_renders_repeatedly() {
        let html = HtmlAllocator::new(20);
        let table = html.element("table", [att("pivot", true)]).unwrap();
        html.add_row(table, [1, 2]).unwrap();
        html.add_row(table, [3, 4]).unwrap();
        let nodes = html.node_count();
        for _ in 0..10 {
            assert_eq!(t(&html, table),
                       "<table><tbody><tr><td>1</td><td>3</td></tr>\
                        <tr><td>2</td><td>4</td></tr></tbody></table>");
            assert_eq!(html.node_count(), nodes);
        }
    }

    #[test]
    fn t_pivot_colspan() {
        let html = HtmlAllocator::new(100);
        let table = html.element("table", [att("pivot", true)]).unwrap();
        let ab = html.td([att("colspan", 2), "AB".into()]).unwrap();
        html.add_row(table, [Arg::from(ab), "C".into()]).unwrap();
        html.add_row(table, ["a", "b", "c"]).unwrap();
        assert_eq!(t(&html, table),
                   "<table><tbody><tr><td rowspan=\"2\">AB</td><td>a</td></tr>\
                    <tr><td>b</td></tr>\
                    <tr><td>C</td><td>c</td></tr></tbody></table>");
    }

    #[test]
    fn t_pivot_restores_on_error() {
        let html = HtmlAllocator::new(200);
        let table = html.element("table", ()).unwrap();
        html.add_row(table, [LazyValue::var("x")]).unwrap();
        html.set_pivot(table, true, 0, 0).unwrap();
        let body = html.table_body(table).unwrap();
        assert!(html.to_html_string(table, None).is_err());
        assert_eq!(html.table_body(table).unwrap(), body);
        assert!(html.table_slots(table).unwrap().pivot);
    }

    #[test]
    fn t_pivot_header_rows_and_row_attrs() {
        let html = HtmlAllocator::new(200);
        let table = html.element("table", [att("pivot", true), att("pivot_header_rows", 1)])
            .unwrap();
        let head = html.add_header_row(table, ["k", "v"]).unwrap();
        html.set_attribute(head, "class", "h").unwrap();
        let row = html.add_row(table, [1, 2]).unwrap();
        html.set_attribute(row, "lang", "en").unwrap();
        assert_eq!(t(&html, table),
                   "<table><thead><tr><th>k</th><td lang=\"en\">1</td></tr></thead>\
                    <tbody><tr><th>v</th><td lang=\"en\">2</td></tr></tbody></table>");
    }

    #[test]
    fn t_pivot_repeated_row() {
        let html = HtmlAllocator::new(200);
        let r = html.records([json!({"n": 1}), json!({"n": 2})]).unwrap();
        let table = html.element("table", [att("pivot", true)]).unwrap();
        html.add_header_row(table, ["n", "double"]).unwrap();
        let row = html.add_row(table, [Arg::from(html.field(r, "n")),
                                       LazyValue::call(move |_, html| {
                                           let n = html.repeater_field(r, "n")
                                               .and_then(|n| n.as_i64())
                                               .unwrap_or(0);
                                           Ok(Value::from(n * 2))
                                       }).into()]).unwrap();
        html.bind_repeater(row, r, Value::Null, true).unwrap();
        assert_eq!(t(&html, table),
                   "<table><tbody><tr><th>n</th><td>1</td><td>2</td></tr>\
                    <tr><th>double</th><td>2</td><td>4</td></tr></tbody></table>");
    }

    #[test]
    fn t_striping() {
        let html = HtmlAllocator::new(200);
        let table = html.element("table", [att("row_classes", "odd even")]).unwrap();
        html.add_row(table, ["a"]).unwrap();
        let second = html.add_row(table, ["b"]).unwrap();
        html.set_attribute(second, "class", "x").unwrap();
        html.add_row(table, ["c"]).unwrap();
        assert_eq!(t(&html, table),
                   "<table><tbody><tr class=\"odd\"><td>a</td></tr>\
                    <tr class=\"x even\"><td>b</td></tr>\
                    <tr class=\"odd\"><td>c</td></tr></tbody></table>");
        // rows are not mutated
        assert!(html.get_attribute(html.rows(html.table_body(table).unwrap())[0], "class")
                .is_none());
    }
}
