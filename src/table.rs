//! Tables: fixed section slots, colspan-aware column counting, row
//! striping, and the row/column pivot applied at render time.

use anyhow::Result;
use kstring::KString;

use crate::{allocator::{AId, HtmlAllocator},
            error::{tree_error, TreeErrorKind},
            node::{Node, NodeKind, Setter, bool_arg, names_arg, usize_arg},
            value::{Arg, ToArgs, Value}};

#[derive(Debug, Clone)]
pub struct TableSlots {
    pub caption: Option<AId<Node>>,
    pub colgroups: Vec<AId<Node>>,
    pub head: AId<Node>,
    pub foot: AId<Node>,
    pub body: AId<Node>,
    pub pivot: bool,
    pub pivot_header_rows: usize,
    pub pivot_footer_rows: usize,
}

impl TableSlots {
    /// The table's content, in rendering order.
    fn content(&self) -> Vec<Value> {
        self.caption.iter().copied()
            .chain(self.colgroups.iter().copied())
            .chain([self.head, self.foot, self.body])
            .map(Value::Element)
            .collect()
    }
}

pub(crate) const TABLE_SETTERS: &[(&str, Setter)] = &[
    ("caption", set_caption_arg),
    ("pivot", set_pivot_arg),
    ("pivot_header_rows", set_pivot_header_rows_arg),
    ("pivot_footer_rows", set_pivot_footer_rows_arg),
    ("row_classes", set_table_row_classes_arg),
    ("header", set_header_arg),
];

pub(crate) const SECTION_SETTERS: &[(&str, Setter)] = &[
    ("row_classes", set_section_row_classes_arg),
];

fn set_caption_arg(html: &HtmlAllocator, id: AId<Node>, v: Value) -> Result<()> {
    html.set_caption(id, v)
}

fn set_pivot_arg(html: &HtmlAllocator, id: AId<Node>, v: Value) -> Result<()> {
    let on = bool_arg("pivot", &v)?;
    html.update_slots(id, |s| s.pivot = on)
}

fn set_pivot_header_rows_arg(html: &HtmlAllocator, id: AId<Node>, v: Value) -> Result<()> {
    let n = usize_arg("pivot_header_rows", &v)?;
    html.update_slots(id, |s| s.pivot_header_rows = n)
}

fn set_pivot_footer_rows_arg(html: &HtmlAllocator, id: AId<Node>, v: Value) -> Result<()> {
    let n = usize_arg("pivot_footer_rows", &v)?;
    html.update_slots(id, |s| s.pivot_footer_rows = n)
}

fn set_table_row_classes_arg(html: &HtmlAllocator, id: AId<Node>, v: Value) -> Result<()> {
    let classes = names_arg("row_classes", &v)?;
    let body = html.table_body(id)?;
    html.set_row_classes(body, classes);
    Ok(())
}

fn set_section_row_classes_arg(html: &HtmlAllocator, id: AId<Node>, v: Value) -> Result<()> {
    let classes = names_arg("row_classes", &v)?;
    html.set_row_classes(id, classes);
    Ok(())
}

fn set_header_arg(html: &HtmlAllocator, id: AId<Node>, v: Value) -> Result<()> {
    let cells = match v {
        Value::List(cells) => cells,
        v => vec![v],
    };
    html.add_header_row(id, cells)?;
    Ok(())
}

/// Content handler for tables: caption, colgroup and section
/// elements go to their slots, anything else into the body section.
/// Indexed insertion is not meaningful on the table itself and
/// appends to the body as well.
pub(crate) fn insert_into_table(html: &HtmlAllocator, id: AId<Node>, _slot: Option<usize>,
                                val: Value) -> Result<()> {
    if let Value::Element(e) = &val {
        let e = *e;
        match html.tag_name(e).as_deref() {
            Some("caption") => return html.update_slots(id, |s| s.caption = Some(e)),
            Some("colgroup") => return html.update_slots(id, |s| s.colgroups.push(e)),
            Some("thead") => return html.update_slots(id, |s| s.head = e),
            Some("tfoot") => return html.update_slots(id, |s| s.foot = e),
            Some("tbody") => return html.update_slots(id, |s| s.body = e),
            _ => ()
        }
    }
    let body = html.table_body(id)?;
    html.append(body, val)
}

impl HtmlAllocator {
    pub(crate) fn init_table(&self, id: AId<Node>) -> Result<()> {
        let slots = TableSlots {
            caption: None,
            colgroups: Vec::new(),
            head: self.new_node("thead")?,
            foot: self.new_node("tfoot")?,
            body: self.new_node("tbody")?,
            pivot: false,
            pivot_header_rows: 0,
            pivot_footer_rows: 0,
        };
        self.with_node_mut(id, |n| {
            n.content = slots.content();
            n.table = Some(slots);
        });
        Ok(())
    }

    pub fn table_slots(&self, id: AId<Node>) -> Result<TableSlots> {
        match self.with_node(id, |n| n.table.clone()) {
            Some(s) => Ok(s),
            None => Err(tree_error(TreeErrorKind::NotANode(self.describe(id), "table")))
        }
    }

    /// Modify the slots and keep the content in sync.
    fn update_slots(&self, id: AId<Node>, f: impl FnOnce(&mut TableSlots)) -> Result<()> {
        let mut slots = self.table_slots(id)?;
        f(&mut slots);
        self.with_node_mut(id, |n| {
            n.content = slots.content();
            n.table = Some(slots);
        });
        Ok(())
    }

    pub fn table_head(&self, id: AId<Node>) -> Result<AId<Node>> {
        Ok(self.table_slots(id)?.head)
    }

    pub fn table_body(&self, id: AId<Node>) -> Result<AId<Node>> {
        Ok(self.table_slots(id)?.body)
    }

    pub fn table_foot(&self, id: AId<Node>) -> Result<AId<Node>> {
        Ok(self.table_slots(id)?.foot)
    }

    /// Set (or with null, remove) the caption; non-elements are
    /// wrapped in a `caption` element.
    pub fn set_caption(&self, table: AId<Node>, v: impl Into<Value>) -> Result<()> {
        let caption = match v.into() {
            Value::Null => None,
            Value::Element(e) if self.tag_name(e).as_deref() == Some("caption") => Some(e),
            v => Some(self.element("caption", [v])?),
        };
        self.update_slots(table, |s| s.caption = caption)
    }

    pub fn set_pivot(&self, table: AId<Node>, on: bool, header_rows: usize, footer_rows: usize)
                     -> Result<()> {
        self.update_slots(table, |s| {
            s.pivot = on;
            s.pivot_header_rows = header_rows;
            s.pivot_footer_rows = footer_rows;
        })
    }

    /// Classes cycled over the rows of `section` when rendered; for a
    /// table, its body.
    pub fn set_row_classes(&self, section: AId<Node>, classes: Vec<KString>) {
        let section = match self.table_body(section) {
            Ok(body) => body,
            Err(_) => section,
        };
        self.with_node_mut(section, |n| n.row_classes = classes)
    }

    fn add_row_to(&self, section: AId<Node>, cell_tag: &str, cells: impl ToArgs)
                  -> Result<AId<Node>> {
        let tr = self.new_node("tr")?;
        self.set_default_child_tag(tr, Some(KString::from_ref(cell_tag)));
        for arg in cells.to_args() {
            match arg {
                Arg::Positional(v) => self.append(tr, v)?,
                Arg::Named(name, v) => self.set_named(tr, name, v)?,
            }
        }
        self.append(section, tr)?;
        Ok(tr)
    }

    /// Append a row to the body; plain values become `td` cells.
    pub fn add_row(&self, table: AId<Node>, cells: impl ToArgs) -> Result<AId<Node>> {
        self.add_row_to(self.table_body(table)?, "td", cells)
    }

    /// Append a row to the head; plain values become `th` cells.
    pub fn add_header_row(&self, table: AId<Node>, cells: impl ToArgs) -> Result<AId<Node>> {
        self.add_row_to(self.table_head(table)?, "th", cells)
    }

    pub fn add_footer_row(&self, table: AId<Node>, cells: impl ToArgs) -> Result<AId<Node>> {
        self.add_row_to(self.table_foot(table)?, "td", cells)
    }

    /// The row elements of a section.
    pub fn rows(&self, section: AId<Node>) -> Vec<AId<Node>> {
        let content = self.with_node(section, |n| n.content.clone());
        content.into_iter()
            .filter_map(|v| match v {
                Value::Element(e) if self.with_node(e, |n| n.kind) == NodeKind::TableRow =>
                    Some(e),
                _ => None
            })
            .collect()
    }

    /// The `colspan` of a cell, at least 1.
    pub fn colspan(&self, cell: AId<Node>) -> usize {
        let n = match self.get_attribute(cell, "colspan") {
            Some(Value::Number(n)) => n.as_u64().unwrap_or(1) as usize,
            Some(Value::Text(s)) => s.trim().parse().unwrap_or(1),
            _ => 1
        };
        n.max(1)
    }

    fn item_width(&self, v: &Value) -> usize {
        match v {
            Value::Null => 0,
            Value::Element(e) => self.colspan(*e),
            _ => 1
        }
    }

    /// Tables: the max over their sections, at least 1. Sections: the
    /// max over their rows. Rows: the sum of the colspans of their
    /// cells. 0 for anything else.
    pub fn column_count(&self, id: AId<Node>) -> usize {
        let kind = self.with_node(id, |n| n.kind);
        match kind {
            NodeKind::Table => {
                let sections = match self.table_slots(id) {
                    Ok(s) => [s.head, s.body, s.foot],
                    Err(_) => return 1,
                };
                sections.iter().map(|s| self.column_count(*s)).max().unwrap_or(0).max(1)
            }
            NodeKind::TableSection =>
                self.rows(id).into_iter().map(|r| self.column_count(r)).max().unwrap_or(0),
            NodeKind::TableRow => {
                let content = self.with_node(id, |n| n.content.clone());
                content.iter().map(|v| self.item_width(v)).sum()
            }
            NodeKind::Plain | NodeKind::TableCell => 0,
        }
    }

    /// The cell of `row` covering column position `i` (0-based,
    /// colspan-aware); `None` beyond the row or for non-rows.
    pub fn column(&self, row: AId<Node>, i: usize) -> Option<AId<Node>> {
        if self.with_node(row, |n| n.kind) != NodeKind::TableRow {
            return None;
        }
        match self.column_item(row, i) {
            Some((Value::Element(e), _)) => Some(e),
            _ => None
        }
    }

    /// The content item of `row` covering column position `i`, and
    /// whether `i` is the first position it covers.
    fn column_item(&self, row: AId<Node>, i: usize) -> Option<(Value, bool)> {
        let content = self.with_node(row, |n| n.content.clone());
        let mut pos = 0;
        for v in content {
            let w = self.item_width(&v);
            if i < pos + w {
                return Some((v, i == pos));
            }
            pos += w;
        }
        None
    }

    /// A copy of `cell` carrying the attributes (except `class`) and
    /// the repeater binding of its source `row`. Its colspan and
    /// rowspan trade places.
    fn pivot_cell(&self, row: AId<Node>, cell: AId<Node>) -> Result<AId<Node>> {
        let clone = self.clone_node(cell)?;
        let (attrs, repeater, repeat_tags) =
            self.with_node(row, |n| (n.attrs.clone(), n.repeater, n.repeat_tags));
        self.with_node_mut(clone, |c| {
            for (k, v) in attrs {
                if k.as_str() != "class" && c.attr(&k).is_none() {
                    c.set_attr(k, v);
                }
            }
            if let Some(r) = repeater {
                if c.repeater.is_none() {
                    c.repeater = Some(r);
                    c.repeat_tags = repeat_tags;
                }
            }
        });
        let colspan = self.remove_attribute(clone, "colspan");
        let rowspan = self.remove_attribute(clone, "rowspan");
        self.with_node_mut(clone, |c| {
            if let Some(v) = colspan {
                c.set_attr(KString::from_static("rowspan"), v);
            }
            if let Some(v) = rowspan {
                c.set_attr(KString::from_static("colspan"), v);
            }
        });
        Ok(clone)
    }

    fn section_with(&self, tag: &str, rows: &[AId<Node>]) -> Result<AId<Node>> {
        let s = self.new_node(tag)?;
        self.with_node_mut(s, |n| {
            for r in rows {
                n.store_content(None, Value::Element(*r));
            }
        });
        Ok(s)
    }

    /// Build transposed sections for `table`: column position j of all
    /// rows (head, body, foot in that order) becomes row j. A cell
    /// spanning several columns appears once, spanning rows instead.
    /// Returns the slots to render in place of the original ones, with
    /// pivoting turned off.
    pub(crate) fn pivot_slots(&self, table: AId<Node>) -> Result<TableSlots> {
        let slots = self.table_slots(table)?;
        let rows: Vec<AId<Node>> = [slots.head, slots.body, slots.foot].iter()
            .flat_map(|s| self.rows(*s))
            .collect();
        let ncols = rows.iter().map(|r| self.column_count(*r)).max().unwrap_or(0);

        let mut new_rows = Vec::with_capacity(ncols);
        for j in 0..ncols {
            let tr = self.new_node("tr")?;
            for row in &rows {
                let cell = match self.column_item(*row, j) {
                    Some((_, false)) => continue,
                    Some((Value::Element(c), true)) => self.pivot_cell(*row, c)?,
                    Some((v, true)) => {
                        let td = self.element("td", [v])?;
                        self.pivot_cell(*row, td)?
                    }
                    None => self.new_node("td")?,
                };
                self.with_node_mut(tr, |n| n.store_content(None, Value::Element(cell)));
            }
            new_rows.push(tr);
        }

        let len = new_rows.len();
        let n = slots.pivot_header_rows.min(len);
        let m = slots.pivot_footer_rows.min(len - n);
        let head = self.section_with("thead", &new_rows[..n])?;
        let body = self.section_with("tbody", &new_rows[n..len - m])?;
        let foot = self.section_with("tfoot", &new_rows[len - m..])?;
        let row_classes = self.with_node(slots.body, |n| n.row_classes.clone());
        self.with_node_mut(body, |n| n.row_classes = row_classes);
        Ok(TableSlots {
            caption: slots.caption,
            colgroups: Vec::new(),
            head,
            foot,
            body,
            pivot: false,
            pivot_header_rows: 0,
            pivot_footer_rows: 0,
        })
    }
}

/// Swaps a table's slots and content for the duration of a render,
/// restoring the originals when dropped (also on error paths). Nodes
/// allocated while the guard is alive are released on drop.
pub(crate) struct SlotSwap<'h> {
    html: &'h HtmlAllocator,
    id: AId<Node>,
    mark: usize,
    saved: Option<(Vec<Value>, Option<TableSlots>)>,
}

impl<'h> SlotSwap<'h> {
    /// Render `id` pivoted until the guard is dropped.
    pub(crate) fn pivot(html: &'h HtmlAllocator, id: AId<Node>) -> Result<Self> {
        let mark = html.node_count();
        match html.pivot_slots(id) {
            Ok(slots) => Ok(Self::new(html, id, slots, mark)),
            Err(e) => {
                html.truncate_nodes(mark);
                Err(e)
            }
        }
    }

    fn new(html: &'h HtmlAllocator, id: AId<Node>, slots: TableSlots, mark: usize) -> Self {
        let saved = html.with_node_mut(id, |n| {
            let content = std::mem::replace(&mut n.content, slots.content());
            let table = std::mem::replace(&mut n.table, Some(slots));
            (content, table)
        });
        SlotSwap { html, id, mark, saved: Some(saved) }
    }
}

impl<'h> Drop for SlotSwap<'h> {
    fn drop(&mut self) {
        if let Some((content, table)) = self.saved.take() {
            self.html.with_node_mut(self.id, |n| {
                n.content = content;
                n.table = table;
            });
            self.html.truncate_nodes(self.mark);
        }
    }
}
