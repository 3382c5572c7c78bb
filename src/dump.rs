//! Debugging aid: show any value as nested tables.

use std::collections::HashSet;

use anyhow::Result;

use crate::{allocator::{AId, HtmlAllocator},
            node::Node,
            render::CIRCULAR,
            value::{att, Value}};

/// A `table.dump` element showing `v`: maps as key/value rows, lists
/// as indexed rows, elements with their attributes and content. An
/// element already shown is replaced by the `CIRCULAR` marker.
pub fn dump(html: &HtmlAllocator, v: &Value) -> Result<AId<Node>> {
    let mut visited = HashSet::new();
    match dump_value(html, v, &mut visited)? {
        Value::Element(e) => Ok(e),
        v => dump_table(html, None, vec![(Value::from(0), v)]),
    }
}

fn dump_table(html: &HtmlAllocator, caption: Option<String>, rows: Vec<(Value, Value)>)
              -> Result<AId<Node>> {
    let table = html.element("table", [att("caption", caption), att("class", "dump")])?;
    for (k, v) in rows {
        let th = html.element("th", [k])?;
        html.add_row(table, [Value::Element(th), v])?;
    }
    Ok(table)
}

fn dump_value(html: &HtmlAllocator, v: &Value, visited: &mut HashSet<AId<Node>>)
              -> Result<Value> {
    Ok(match v {
        Value::Null => Value::from("null"),
        Value::Bool(_) | Value::Number(_) | Value::Text(_) | Value::Raw(_) => v.clone(),
        Value::Lazy(l) => Value::from(l.describe()),
        Value::Repeater(r) => Value::from(format!("repeater {r:?}")),
        Value::Foreign(f) => Value::from(f.type_name()),
        Value::Attribute(c) => Value::from(format!("{} ({} items)", c.name(), c.len())),
        Value::List(items) => {
            let mut rows = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                rows.push((Value::from(i), dump_value(html, item, visited)?));
            }
            Value::Element(dump_table(html, None, rows)?)
        }
        Value::Map(pairs) => {
            let mut rows = Vec::with_capacity(pairs.len());
            for (k, item) in pairs {
                rows.push((Value::from(k.clone()), dump_value(html, item, visited)?));
            }
            Value::Element(dump_table(html, None, rows)?)
        }
        Value::Element(e) => {
            if ! visited.insert(*e) {
                return Ok(Value::from(CIRCULAR));
            }
            let node = html.get_node(*e);
            let mut rows = Vec::new();
            for (name, item) in node.attributes() {
                rows.push((Value::from(name.clone()), dump_value(html, item, visited)?));
            }
            for (i, item) in node.content().iter().enumerate() {
                rows.push((Value::from(i), dump_value(html, item, visited)?));
            }
            let caption = match node.tag_name() {
                Some(t) => format!("<{t}>"),
                None => format!("<{:?}>", node.tag()),
            };
            Value::Element(dump_table(html, Some(caption), rows)?)
        }
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn t_dump_json() {
        let html = HtmlAllocator::new(200);
        let v = Value::from(json!({"a": 1, "b": ["x"]}));
        let t = dump(&html, &v).unwrap();
        assert_eq!(html.to_html_string(t, None).unwrap(),
                   "<table class=\"dump\"><tbody><tr><th>a</th><td>1</td></tr>\
                    <tr><th>b</th><td><table class=\"dump\"><tbody>\
                    <tr><th>0</th><td>x</td></tr></tbody></table></td></tr></tbody></table>");
    }

    #[test]
    fn t_dump_circular() {
        let html = HtmlAllocator::new(200);
        let div = html.element("div", [att("id", "d")]).unwrap();
        html.append(div, div).unwrap();
        let t = dump(&html, &Value::Element(div)).unwrap();
        let s = html.to_html_string(t, None).unwrap();
        assert!(s.starts_with("<table class=\"dump\"><caption>&lt;div&gt;</caption>"));
        assert!(s.contains("<th>id</th><td>d</td>"));
        assert!(s.contains(&format!("<th>0</th><td>{CIRCULAR}</td>")));
    }
}
