//! Composite attribute values: class word lists, style maps, URL
//! query maps and inline script snippets.

use anyhow::Result;
use itertools::Itertools;
use kstring::KString;

use html_meta::{looks_like_event_handler, MetaDb};

use crate::{allocator::HtmlAllocator,
            myfrom::MyFrom,
            url_encoding::{parse_query, url_encode, UrlDecodingError},
            value::{Arg, ToArgs, Value}};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    /// Space separated, duplicates dropped (`class`, `rel`, ...).
    Words,
    /// `key: value;` pairs (`style`).
    Style,
    /// A path followed by `?` and `key=value` pairs joined by `&`,
    /// percent-encoded (`href`, `src`, `action`, `formaction`).
    Query,
    /// Statements joined by `; ` (event handler attributes).
    Script,
}

impl AttrKind {
    /// The kind for attribute `name`, by the default element meta db.
    pub fn for_name(name: &str) -> AttrKind {
        Self::for_name_in(name, html_meta::metadb().ok())
    }

    pub fn for_name_in(name: &str, metadb: Option<&MetaDb>) -> AttrKind {
        match name {
            "style" => AttrKind::Style,
            "href" | "src" | "action" | "formaction" => AttrKind::Query,
            _ if is_event_handler(name, metadb) => AttrKind::Script,
            _ => AttrKind::Words,
        }
    }

    fn separator(self) -> &'static str {
        match self {
            AttrKind::Words => " ",
            AttrKind::Style => " ",
            AttrKind::Query => "&",
            AttrKind::Script => "; ",
        }
    }

    fn format_pair(self, key: &str, val: &str) -> String {
        match self {
            AttrKind::Words => format!("{key}={val}"),
            AttrKind::Style => format!("{key}: {val};"),
            AttrKind::Query => format!("{}={}", url_encode(key), url_encode(val)),
            AttrKind::Script => format!("{key} = {val}"),
        }
    }

    fn format_plain(self, val: &str) -> String {
        match self {
            AttrKind::Style if ! val.ends_with(';') => format!("{val};"),
            _ => val.to_string(),
        }
    }
}

/// Without a meta db, only the `on...` naming rule applies.
pub(crate) fn is_event_handler(name: &str, metadb: Option<&MetaDb>) -> bool {
    match metadb {
        Some(db) => db.is_event_handler_attribute(name),
        None => looks_like_event_handler(name),
    }
}

/// How the rendered text of a nested container of kind `.1` is
/// included into a container of kind `.0`. Unlisted combinations
/// include the text as is.
type NestingHandler = fn(&str) -> String;

fn json_string_literal(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

const NESTING_HANDLERS: &[(AttrKind, AttrKind, NestingHandler)] = &[
    (AttrKind::Script, AttrKind::Query, json_string_literal),
    (AttrKind::Script, AttrKind::Style, json_string_literal),
    (AttrKind::Script, AttrKind::Words, json_string_literal),
];

fn nesting_handler(outer: AttrKind, inner: AttrKind) -> Option<NestingHandler> {
    NESTING_HANDLERS.iter()
        .find(|(o, i, _)| *o == outer && *i == inner)
        .map(|(_, _, h)| *h)
}

#[derive(Debug, Clone)]
enum Item {
    Plain(Value),
    Pair(KString, Value),
    Nested(AttributeContainer),
}

#[derive(Debug, Clone)]
pub struct AttributeContainer {
    name: KString,
    kind: AttrKind,
    items: Vec<Item>,
}

impl AttributeContainer {
    pub fn new<N>(name: N) -> Self
    where KString: MyFrom<N>
    {
        let name = KString::myfrom(name);
        let kind = AttrKind::for_name(&name);
        AttributeContainer { name, kind, items: Vec::new() }
    }

    pub fn with_kind<N>(name: N, kind: AttrKind) -> Self
    where KString: MyFrom<N>
    {
        AttributeContainer { name: KString::myfrom(name), kind, items: Vec::new() }
    }

    /// A container for `name` holding `val` (lists are added item by
    /// item, maps pair by pair).
    pub fn from_value<N>(name: N, val: Value) -> Self
    where KString: MyFrom<N>
    {
        let mut c = Self::new(name);
        c.add(val);
        c
    }

    /// Construct from a mixed argument list: positional arguments are
    /// added, named ones set.
    pub fn from_args<N>(name: N, args: impl ToArgs) -> Self
    where KString: MyFrom<N>
    {
        Self::new(name).with_args(args)
    }

    fn with_args(mut self, args: impl ToArgs) -> Self {
        for arg in args.to_args() {
            match arg {
                Arg::Positional(v) => self.add(v),
                Arg::Named(k, v) => self.set::<KString>(k, v),
            }
        }
        self
    }

    /// A `Query` container holding the path and the pairs of an
    /// existing URL, so that later `set` calls replace keys in it.
    pub fn from_query<N>(name: N, query: &str) -> Result<Self, UrlDecodingError>
    where KString: MyFrom<N>
    {
        let mut c = Self::with_kind(name, AttrKind::Query);
        let (base, query) = query.split_once('?').unwrap_or(("", query));
        if ! base.is_empty() {
            c.add(base);
        }
        for (k, v) in parse_query(query)? {
            c.set::<String>(k, v);
        }
        Ok(c)
    }

    pub fn name(&self) -> &KString {
        &self.name
    }

    pub fn kind(&self) -> AttrKind {
        self.kind
    }

    pub(crate) fn rename(&mut self, name: KString) {
        self.name = name;
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Add a value: lists item by item, maps as pairs, containers of
    /// the same kind are merged, other containers nested.
    pub fn add(&mut self, val: impl Into<Value>) {
        match val.into() {
            Value::List(items) => {
                for item in items {
                    self.add(item);
                }
            }
            Value::Map(pairs) => {
                for (k, v) in pairs {
                    self.set(k, v);
                }
            }
            Value::Attribute(c) => {
                if c.kind == self.kind {
                    for item in c.items {
                        match item {
                            Item::Plain(v) => self.add(v),
                            Item::Pair(k, v) => self.set(k, v),
                            Item::Nested(n) => self.items.push(Item::Nested(n)),
                        }
                    }
                } else {
                    self.items.push(Item::Nested(c));
                }
            }
            Value::Null => (),
            v => {
                if self.kind == AttrKind::Words {
                    if let Value::Text(s) = &v {
                        if self.contains_word(s) {
                            return;
                        }
                    }
                }
                self.items.push(Item::Plain(v))
            }
        }
    }

    fn contains_word(&self, w: &str) -> bool {
        self.items.iter().any(|item| matches!(item, Item::Plain(Value::Text(s)) if s.as_str() == w))
    }

    /// Set the value of `key`, replacing a previous one.
    pub fn set<K>(&mut self, key: K, val: impl Into<Value>)
    where KString: MyFrom<K>
    {
        let key = KString::myfrom(key);
        let val = val.into();
        for item in self.items.iter_mut() {
            if let Item::Pair(k, v) = item {
                if *k == key {
                    *v = val;
                    return;
                }
            }
        }
        self.items.push(Item::Pair(key, val))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.items.iter().find_map(|item| match item {
            Item::Pair(k, v) if k.as_str() == key => Some(v),
            _ => None
        })
    }

    /// Remove the pair `key`, or plain text items equal to `key`
    /// (e.g. a class name). True if anything was removed.
    pub fn remove(&mut self, key: &str) -> bool {
        let len = self.items.len();
        self.items.retain(|item| match item {
            Item::Pair(k, _) => k.as_str() != key,
            Item::Plain(Value::Text(s)) => s.as_str() != key,
            _ => true
        });
        self.items.len() != len
    }

    /// The serialized (not yet HTML-escaped) attribute value;
    /// `text_of` turns each item value into plain text (resolving lazy
    /// values). Items with empty text are skipped.
    pub fn render_with(&self, text_of: &mut dyn FnMut(&Value) -> Result<String>)
                       -> Result<String> {
        let mut parts = Vec::with_capacity(self.items.len());
        let mut pairs = Vec::new();
        for item in &self.items {
            let part = match item {
                Item::Plain(v) => {
                    let t = text_of(v)?;
                    if t.is_empty() {
                        continue;
                    }
                    self.kind.format_plain(&t)
                }
                Item::Pair(k, v) => {
                    let t = text_of(v)?;
                    let pair = self.kind.format_pair(k, &t);
                    if self.kind == AttrKind::Query {
                        pairs.push(pair);
                        continue;
                    }
                    pair
                }
                Item::Nested(c) => {
                    let t = c.render_with(text_of)?;
                    if t.is_empty() {
                        continue;
                    }
                    match nesting_handler(self.kind, c.kind) {
                        Some(h) => h(&t),
                        None => t,
                    }
                }
            };
            parts.push(part);
        }
        if self.kind != AttrKind::Query {
            return Ok(parts.iter().join(self.kind.separator()));
        }
        // Plain items form the path, pairs the query string after it
        let base = parts.concat();
        let query = pairs.iter().join("&");
        Ok(if base.is_empty() || query.is_empty() {
            base + &query
        } else if base.ends_with('?') || base.ends_with('&') {
            format!("{base}{query}")
        } else if base.contains('?') {
            format!("{base}&{query}")
        } else {
            format!("{base}?{query}")
        })
    }
}

impl HtmlAllocator {
    /// An attribute container for `name`, to be inserted into nodes
    /// (it is stored under its own name, wherever it is passed).
    pub fn attribute_container<N>(&self, name: N, args: impl ToArgs) -> AttributeContainer
    where KString: MyFrom<N>
    {
        let name = KString::myfrom(name);
        let kind = AttrKind::for_name_in(&name, self.metadb());
        AttributeContainer::with_kind::<KString>(name, kind).with_args(args)
    }
}
