//! Indexed element metadata, used to give new nodes their default
//! structural flags and to classify attribute names.

use std::{collections::{HashMap, HashSet},
          path::Path, env, str::FromStr, fmt::Display};
use anyhow::{anyhow, Result, Context, bail};
use kstring::KString;
use serde::Deserialize;

// =============================================================================
// Attribute names

// https://developer.mozilla.org/en-US/docs/Web/HTML/Global_attributes
const GLOBAL_ATTRIBUTE_NAMES: &[&str] = &[
    "accesskey",
    "autocapitalize",
    "autofocus",
    "class",
    "contenteditable",
    "dir",
    "draggable",
    "enterkeyhint",
    "exportparts",
    "hidden",
    "id",
    "inert",
    "inputmode",
    "is",
    "itemid",
    "itemprop",
    "itemref",
    "itemscope",
    "itemtype",
    "lang",
    "nonce",
    "part",
    "popover",
    "role",
    "slot",
    "spellcheck",
    "style",
    "tabindex",
    "title",
    "translate",
    "virtualkeyboardpolicy",
];

const EVENT_HANDLER_ATTRIBUTE_NAMES: &[&str] = &[
    "onabort", "onautocomplete", "onautocompleteerror", "onblur", "oncancel", "oncanplay", "oncanplaythrough", "onchange", "onclick", "onclose", "oncontextmenu", "oncuechange", "ondblclick", "ondrag", "ondragend", "ondragenter", "ondragleave", "ondragover", "ondragstart", "ondrop", "ondurationchange", "onemptied", "onended", "onerror", "onfocus", "oninput", "oninvalid", "onkeydown", "onkeypress", "onkeyup", "onload", "onloadeddata", "onloadedmetadata", "onloadstart", "onmousedown", "onmouseenter", "onmouseleave", "onmousemove", "onmouseout", "onmouseover", "onmouseup", "onmousewheel", "onpause", "onplay", "onplaying", "onprogress", "onratechange", "onreset", "onresize", "onscroll", "onseeked", "onseeking", "onselect", "onshow", "onsort", "onstalled", "onsubmit", "onsuspend", "ontimeupdate", "ontoggle", "onvolumechange", "onwaiting"
];

// =============================================================================
// Element database

#[derive(Debug, Clone)]
pub struct ElementMeta {
    pub tag_name: KString,
    /// Void element: never has content, rendered self-closed.
    pub is_void: bool,
    /// Always write an explicit closing tag, even when empty
    /// (consumers mis-parse `<iframe />` and friends).
    pub render_closing_tag: bool,
    /// Permitted child element tags; empty means unconstrained.
    pub child_elements: Vec<KString>,
    /// Tag used to wrap content that isn't a permitted child.
    pub default_child: Option<KString>,
    /// Route non-conforming content into the most recent child
    /// instead of wrapping it.
    pub add_to_last_child: bool,
    /// Put a newline after the element in readable output.
    pub block_newline: bool,
}

impl PartialEq for ElementMeta {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other) || self.tag_name == other.tag_name
    }
}

impl Eq for ElementMeta {}

struct StaticElementMeta {
    tag_name: &'static str,
    is_void: bool,
    render_closing_tag: bool,
    child_elements: &'static [&'static str],
    default_child: Option<&'static str>,
    add_to_last_child: bool,
    block_newline: bool,
}

impl From<&StaticElementMeta> for ElementMeta {
    fn from(s: &StaticElementMeta) -> Self {
        ElementMeta {
            tag_name: KString::from_static(s.tag_name),
            is_void: s.is_void,
            render_closing_tag: s.render_closing_tag,
            child_elements: s.child_elements.iter().map(
                |t| KString::from_static(*t)).collect(),
            default_child: s.default_child.map(KString::from_static),
            add_to_last_child: s.add_to_last_child,
            block_newline: s.block_newline,
        }
    }
}

const fn void(tag_name: &'static str) -> StaticElementMeta {
    StaticElementMeta {
        tag_name,
        is_void: true,
        render_closing_tag: false,
        child_elements: &[],
        default_child: None,
        add_to_last_child: false,
        block_newline: false,
    }
}

const fn closing(tag_name: &'static str) -> StaticElementMeta {
    StaticElementMeta {
        tag_name,
        is_void: false,
        render_closing_tag: true,
        child_elements: &[],
        default_child: None,
        add_to_last_child: false,
        block_newline: false,
    }
}

const fn container(
    tag_name: &'static str,
    child_elements: &'static [&'static str],
    default_child: &'static str,
    add_to_last_child: bool,
) -> StaticElementMeta {
    StaticElementMeta {
        tag_name,
        is_void: false,
        render_closing_tag: false,
        child_elements,
        default_child: Some(default_child),
        add_to_last_child,
        block_newline: true,
    }
}

const fn block(tag_name: &'static str) -> StaticElementMeta {
    StaticElementMeta {
        tag_name,
        is_void: false,
        render_closing_tag: false,
        child_elements: &[],
        default_child: None,
        add_to_last_child: false,
        block_newline: true,
    }
}

const STATIC_ELEMENTS: &[StaticElementMeta] = &[
    void("area"),
    void("base"),
    void("br"),
    void("col"),
    void("embed"),
    void("hr"),
    void("img"),
    void("input"),
    void("link"),
    void("meta"),
    void("source"),
    void("track"),
    void("wbr"),

    closing("iframe"),
    closing("script"),
    closing("textarea"),
    closing("title"),
    closing("td"),
    closing("th"),
    closing("option"),
    closing("canvas"),
    closing("video"),
    closing("audio"),
    closing("object"),

    container("ul", &["li"], "li", false),
    container("ol", &["li"], "li", false),
    container("dl", &["dt", "dd"], "dd", false),
    container("select", &["option", "optgroup"], "option", false),
    container("optgroup", &["option"], "option", false),
    container("datalist", &["option"], "option", false),
    container("colgroup", &["col"], "col", false),
    container("thead", &["tr"], "tr", true),
    container("tbody", &["tr"], "tr", true),
    container("tfoot", &["tr"], "tr", true),
    container("tr", &["td", "th"], "td", false),

    block("table"),
    block("li"),
    block("p"),
    block("div"),
    block("caption"),
];

#[derive(Debug)]
pub struct MetaDb {
    pub global_attribute_names: HashSet<KString>,
    pub event_handler_names: HashSet<KString>,
    pub elementmeta: HashMap<KString, ElementMeta>,
}

/// `on` followed by lowercase letters, as for `onclick`.
pub fn looks_like_event_handler(name: &str) -> bool {
    name.len() > 4
        && name.starts_with("on")
        && name[2..].chars().all(|c| c.is_ascii_lowercase())
}

impl MetaDb {
    pub fn get(&self, tag_name: &str) -> Option<&ElementMeta> {
        self.elementmeta.get(tag_name)
    }

    /// Whether `name` holds script code (its value must not be
    /// HTML-escaped beyond the quote character).
    pub fn is_event_handler_attribute(&self, name: &str) -> bool {
        self.event_handler_names.contains(name) || looks_like_event_handler(name)
    }

    pub fn is_global_attribute(&self, name: &str) -> bool {
        self.global_attribute_names.contains(name)
            || name.starts_with("data-")
            || name.starts_with("aria-")
            || self.is_event_handler_attribute(name)
    }

    pub fn builtin() -> MetaDb {
        MetaDb {
            global_attribute_names: GLOBAL_ATTRIBUTE_NAMES.iter().map(
                |n| KString::from_static(*n)).collect(),
            event_handler_names: EVENT_HANDLER_ATTRIBUTE_NAMES.iter().map(
                |n| KString::from_static(*n)).collect(),
            elementmeta: STATIC_ELEMENTS.iter().map(
                |s| (KString::from_static(s.tag_name), ElementMeta::from(s))).collect(),
        }
    }

    /// Apply overrides, creating entries for unknown tags.
    pub fn apply_overrides(&mut self, overrides: Vec<ElementOverride>) -> Result<()> {
        for o in overrides {
            if o.tag_name.is_empty() {
                bail!("element override without tag_name")
            }
            let tag_name = KString::from(o.tag_name);
            let meta = self.elementmeta.entry(tag_name.clone()).or_insert_with(
                || ElementMeta {
                    tag_name,
                    is_void: false,
                    render_closing_tag: false,
                    child_elements: Vec::new(),
                    default_child: None,
                    add_to_last_child: false,
                    block_newline: false,
                });
            if let Some(v) = o.is_void { meta.is_void = v }
            if let Some(v) = o.render_closing_tag { meta.render_closing_tag = v }
            if let Some(v) = o.child_elements {
                meta.child_elements = v.into_iter().map(KString::from).collect();
            }
            if let Some(v) = o.default_child { meta.default_child = Some(KString::from(v)) }
            if let Some(v) = o.add_to_last_child { meta.add_to_last_child = v }
            if let Some(v) = o.block_newline { meta.block_newline = v }
        }
        Ok(())
    }
}

/// An entry in a metadata override file (a JSON array of these).
#[derive(Debug, Clone, Deserialize)]
pub struct ElementOverride {
    pub tag_name: String,
    pub is_void: Option<bool>,
    pub render_closing_tag: Option<bool>,
    pub child_elements: Option<Vec<String>>,
    pub default_child: Option<String>,
    pub add_to_last_child: Option<bool>,
    pub block_newline: Option<bool>,
}

pub fn read_overrides(path: &Path) -> Result<Vec<ElementOverride>> {
    let file = std::fs::File::open(path)
        .with_context(|| anyhow!("opening element override file {path:?}"))?;
    serde_json::from_reader(std::io::BufReader::new(file))
        .with_context(|| anyhow!("parsing element override file {path:?}"))
}


pub fn opt_get_env<T: FromStr>(varname: &str) -> Result<Option<T>>
    where T::Err: Display
{
    match env::var(varname) {
        Ok(s) => {
            Ok(Some(s.parse().map_err(
                |e| anyhow!("could not parse {varname:?} env var with contents {s:?}: {e}"))?))
        },
        Err(e) => match e {
            env::VarError::NotPresent => Ok(None),
            env::VarError::NotUnicode(_) => bail!("could not decode {varname:?} env var: {e}")
        }
    }
}

pub fn get_env_bool(varname: &str) -> Result<bool> {
    Ok(opt_get_env(varname)?.unwrap_or(false))
}

/// The builtin database, extended from the JSON file named by the
/// `HTML_META_JSON` env var if set.
pub fn read_meta_db() -> Result<MetaDb> {
    let debug = get_env_bool("HTML_META_DEBUG")?;
    let mut metadb = MetaDb::builtin();
    if let Some(path) = opt_get_env::<String>("HTML_META_JSON")? {
        if debug { eprintln!("reading element overrides from {path:?}") };
        metadb.apply_overrides(read_overrides(path.as_ref())?)?;
    }
    Ok(metadb)
}
