//! Iteration cursors over external record sequences, driving
//! repeated rendering. Repeaters live in the `HtmlAllocator` next to
//! the nodes and are addressed by `AId<Repeater>`.

use std::rc::Rc;

use anyhow::{Result, bail};
use kstring::KString;
use serde_json::Value as JsonValue;

use crate::{allocator::{AId, HtmlAllocator},
            context::json_path,
            lazy::LazyValue,
            myfrom::MyFrom};

pub type Records = Box<dyn Iterator<Item = JsonValue>>;

/// Something that can be iterated over, again and again.
pub trait DataSource {
    fn open(&self) -> Result<Records>;
}

/// A shared, fixed list of records.
#[derive(Debug, Clone)]
pub struct RecordList(Rc<Vec<JsonValue>>);

impl RecordList {
    pub fn new(records: impl IntoIterator<Item = JsonValue>) -> Self {
        RecordList(Rc::new(records.into_iter().collect()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl DataSource for RecordList {
    fn open(&self) -> Result<Records> {
        let records = self.0.clone();
        Ok(Box::new((0..records.len()).map(move |i| records[i].clone())))
    }
}

/// A source computing its records anew on every `open`.
pub struct FnSource<F>(pub F);

impl<F, I> DataSource for FnSource<F>
where F: Fn() -> Result<I>,
      I: IntoIterator<Item = JsonValue>,
      I::IntoIter: 'static
{
    fn open(&self) -> Result<Records> {
        Ok(Box::new((self.0)()?.into_iter()))
    }
}

pub(crate) struct Cursor {
    source: Rc<dyn DataSource>,
    records: Option<Records>,
    peeked: Option<JsonValue>,
    current: Option<JsonValue>,
    position: Option<usize>,
}

pub(crate) enum RepeaterKind {
    Cursor(Cursor),
    Parallel(Vec<AId<Repeater>>),
}

pub struct Repeater {
    pub(crate) name: Option<KString>,
    pub(crate) kind: RepeaterKind,
}

impl Repeater {
    fn cursor(name: Option<KString>, source: Rc<dyn DataSource>) -> Repeater {
        Repeater {
            name,
            kind: RepeaterKind::Cursor(Cursor {
                source,
                records: None,
                peeked: None,
                current: None,
                position: None,
            })
        }
    }
}

impl HtmlAllocator {
    pub fn repeater(&self, source: impl DataSource + 'static) -> Result<AId<Repeater>> {
        self.push_repeater(Repeater::cursor(None, Rc::new(source)))
    }

    pub fn named_repeater<N>(&self, name: N, source: impl DataSource + 'static)
                             -> Result<AId<Repeater>>
    where KString: MyFrom<N>
    {
        self.push_repeater(Repeater::cursor(Some(KString::myfrom(name)), Rc::new(source)))
    }

    /// A repeater over a fixed list of records.
    pub fn records(&self, records: impl IntoIterator<Item = JsonValue>)
                   -> Result<AId<Repeater>> {
        self.repeater(RecordList::new(records))
    }

    /// A new, independent cursor over the same source as `other`
    /// (for parallel repeaters: over copies of all members).
    pub fn repeater_from(&self, other: AId<Repeater>) -> Result<AId<Repeater>> {
        enum Shape {
            Cursor(Rc<dyn DataSource>),
            Parallel(Vec<AId<Repeater>>),
        }
        let (name, shape) = self.with_repeater(other, |r| {
            (r.name.clone(),
             match &r.kind {
                 RepeaterKind::Cursor(c) => Shape::Cursor(c.source.clone()),
                 RepeaterKind::Parallel(members) => Shape::Parallel(members.clone()),
             })
        });
        match shape {
            Shape::Cursor(source) => self.push_repeater(Repeater::cursor(name, source)),
            Shape::Parallel(members) => {
                let copies = members.into_iter()
                    .map(|m| self.repeater_from(m))
                    .collect::<Result<Vec<_>>>()?;
                self.push_repeater(Repeater { name, kind: RepeaterKind::Parallel(copies) })
            }
        }
    }

    /// Groups repeaters to advance in lockstep.
    pub fn parallel(&self, members: impl IntoIterator<Item = AId<Repeater>>)
                    -> Result<AId<Repeater>> {
        let members: Vec<_> = members.into_iter().collect();
        if members.is_empty() {
            bail!("a parallel repeater needs at least one member")
        }
        self.push_repeater(Repeater { name: None, kind: RepeaterKind::Parallel(members) })
    }

    pub fn repeater_name(&self, r: AId<Repeater>) -> Option<KString> {
        self.with_repeater(r, |r| r.name.clone())
    }

    pub fn set_repeater_name<N>(&self, r: AId<Repeater>, name: N)
    where KString: MyFrom<N>
    {
        self.with_repeater_mut(r, |r| r.name = Some(KString::myfrom(name)))
    }

    /// The members if `r` is a parallel repeater.
    pub fn parallel_members(&self, r: AId<Repeater>) -> Option<Vec<AId<Repeater>>> {
        self.with_repeater(r, |r| match &r.kind {
            RepeaterKind::Cursor(_) => None,
            RepeaterKind::Parallel(m) => Some(m.clone()),
        })
    }

    pub(crate) fn set_parallel_members(&self, r: AId<Repeater>, members: Vec<AId<Repeater>>) {
        self.with_repeater_mut(r, |r| r.kind = RepeaterKind::Parallel(members))
    }

    /// Reset `r`; true if there is any data. For parallel repeaters,
    /// all members are reset, and true only if all of them have data.
    pub fn repeater_start(&self, r: AId<Repeater>) -> Result<bool> {
        if let Some(members) = self.parallel_members(r) {
            let mut all = true;
            for m in members {
                all &= self.repeater_start(m)?;
            }
            return Ok(all);
        }
        let source = self.with_repeater(r, |r| match &r.kind {
            RepeaterKind::Cursor(c) => Some(c.source.clone()),
            RepeaterKind::Parallel(_) => None,
        });
        let source = match source {
            Some(s) => s,
            None => return Ok(false),
        };
        // Call out with no arena borrows held.
        let mut records = source.open()?;
        let peeked = records.next();
        let any = peeked.is_some();
        self.with_repeater_mut(r, |r| {
            if let RepeaterKind::Cursor(c) = &mut r.kind {
                c.records = Some(records);
                c.peeked = peeked;
                c.current = None;
                c.position = None;
            }
        });
        Ok(any)
    }

    /// Advance `r`; true if there is a current record now. Parallel
    /// repeaters advance all members and stop at the first exhausted
    /// one.
    pub fn repeater_next(&self, r: AId<Repeater>) -> Result<bool> {
        if let Some(members) = self.parallel_members(r) {
            for m in members {
                if ! self.repeater_next(m)? {
                    return Ok(false);
                }
            }
            return Ok(true);
        }
        let mut c = match self.take_cursor_state(r) {
            Some(c) => c,
            None => return Ok(false),
        };
        let item = c.peeked.take().or_else(|| c.records.as_mut().and_then(|i| i.next()));
        let found = item.is_some();
        if found {
            c.position = Some(c.position.map_or(0, |p| p + 1));
        } else {
            c.records = None;
        }
        c.current = item;
        self.put_cursor_state(r, c);
        Ok(found)
    }

    /// Take the iteration state out of the arena, so that advancing
    /// the (possibly user supplied) iterator happens unborrowed.
    fn take_cursor_state(&self, r: AId<Repeater>) -> Option<CursorState> {
        self.with_repeater_mut(r, |r| match &mut r.kind {
            RepeaterKind::Cursor(c) => Some(CursorState {
                records: c.records.take(),
                peeked: c.peeked.take(),
                current: c.current.take(),
                position: c.position,
            }),
            RepeaterKind::Parallel(_) => None,
        })
    }

    fn put_cursor_state(&self, r: AId<Repeater>, s: CursorState) {
        self.with_repeater_mut(r, |r| {
            if let RepeaterKind::Cursor(c) = &mut r.kind {
                c.records = s.records;
                c.peeked = s.peeked;
                c.current = s.current;
                c.position = s.position;
            }
        })
    }

    /// The current record; for parallel repeaters an array of the
    /// members' records.
    pub fn repeater_current(&self, r: AId<Repeater>) -> Option<JsonValue> {
        if let Some(members) = self.parallel_members(r) {
            return members.into_iter()
                .map(|m| self.repeater_current(m))
                .collect::<Option<Vec<_>>>()
                .map(JsonValue::Array);
        }
        self.with_repeater(r, |r| match &r.kind {
            RepeaterKind::Cursor(c) => c.current.clone(),
            RepeaterKind::Parallel(_) => None,
        })
    }

    pub fn repeater_position(&self, r: AId<Repeater>) -> Option<usize> {
        if let Some(members) = self.parallel_members(r) {
            return members.first().and_then(|m| self.repeater_position(*m));
        }
        self.with_repeater(r, |r| match &r.kind {
            RepeaterKind::Cursor(c) => c.current.as_ref().and(c.position),
            RepeaterKind::Parallel(_) => None,
        })
    }

    /// The value at `path` in the current record. For parallel
    /// repeaters, a path starting with a member's name addresses that
    /// member, otherwise the first member having the path answers.
    pub fn repeater_field(&self, r: AId<Repeater>, path: &str) -> Option<JsonValue> {
        if let Some(members) = self.parallel_members(r) {
            let (first, rest) = path.split_once('.').unwrap_or((path, ""));
            for m in &members {
                if self.repeater_name(*m).as_deref() == Some(first) {
                    return self.repeater_field(*m, rest);
                }
            }
            return members.into_iter().find_map(|m| self.repeater_field(m, path));
        }
        self.with_repeater(r, |r| match &r.kind {
            RepeaterKind::Cursor(c) => c.current.as_ref()
                .and_then(|rec| json_path(rec, path))
                .cloned(),
            RepeaterKind::Parallel(_) => None,
        })
    }

    /// A lazy accessor for `path` in the current record of `r`.
    pub fn field<P>(&self, r: AId<Repeater>, path: P) -> LazyValue
    where KString: MyFrom<P>
    {
        LazyValue::Field { repeater: r, path: KString::myfrom(path) }
    }

    /// The (name, current record) pairs to publish in the resolution
    /// context while `r` is being iterated.
    pub(crate) fn repeater_bindings(&self, r: AId<Repeater>) -> Vec<(KString, JsonValue)> {
        let mut out = Vec::new();
        if let Some(members) = self.parallel_members(r) {
            for m in members {
                out.extend(self.repeater_bindings(m));
            }
        }
        if let (Some(name), Some(rec)) = (self.repeater_name(r), self.repeater_current(r)) {
            out.push((name, rec));
        }
        out
    }
}

struct CursorState {
    records: Option<Records>,
    peeked: Option<JsonValue>,
    current: Option<JsonValue>,
    position: Option<usize>,
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use serde_json::json;

    use super::*;

    fn t_drain(html: &HtmlAllocator, r: AId<Repeater>, path: &str) -> Vec<JsonValue> {
        let mut out = Vec::new();
        if html.repeater_start(r).unwrap() {
            while html.repeater_next(r).unwrap() {
                out.push(html.repeater_field(r, path).unwrap_or(JsonValue::Null));
            }
        }
        out
    }

    #[test]
    fn t_protocol() {
        let html = HtmlAllocator::new(100);
        let r = html.records([json!({"n": 1}), json!({"n": 2})]).unwrap();
        assert!(! html.repeater_next(r).unwrap());
        assert_eq!(t_drain(&html, r, "n"), vec![json!(1), json!(2)]);
        assert_eq!(html.repeater_position(r), None);
        // restartable
        assert_eq!(t_drain(&html, r, "n"), vec![json!(1), json!(2)]);

        let empty = html.records([]).unwrap();
        assert!(! html.repeater_start(empty).unwrap());
        assert!(! html.repeater_next(empty).unwrap());
    }

    #[test]
    fn t_set_name() {
        let html = HtmlAllocator::new(100);
        let r = html.records([json!({"n": 1})]).unwrap();
        assert_eq!(html.repeater_name(r), None);
        html.set_repeater_name(r, "row");
        assert_eq!(html.repeater_name(r).as_deref(), Some("row"));
        assert!(html.repeater_start(r).unwrap());
        assert!(html.repeater_next(r).unwrap());
        assert_eq!(html.repeater_bindings(r),
                   vec![(KString::from_static("row"), json!({"n": 1}))]);
    }

    #[test]
    fn t_position_and_whole_record() {
        let html = HtmlAllocator::new(100);
        let r = html.records([json!("a"), json!("b")]).unwrap();
        assert!(html.repeater_start(r).unwrap());
        assert!(html.repeater_next(r).unwrap());
        assert!(html.repeater_next(r).unwrap());
        assert_eq!(html.repeater_position(r), Some(1));
        assert_eq!(html.repeater_field(r, ""), Some(json!("b")));
        assert_eq!(html.repeater_current(r), Some(json!("b")));
    }

    #[test]
    fn t_fn_source_reopens() {
        let html = HtmlAllocator::new(100);
        let opened = Rc::new(Cell::new(0));
        let opened2 = opened.clone();
        let r = html.repeater(FnSource(move || -> Result<Vec<JsonValue>> {
            opened2.set(opened2.get() + 1);
            Ok(vec![json!(opened2.get())])
        })).unwrap();
        assert_eq!(t_drain(&html, r, ""), vec![json!(1)]);
        assert_eq!(t_drain(&html, r, ""), vec![json!(2)]);
        assert_eq!(opened.get(), 2);
    }

    #[test]
    fn t_parallel_lockstep() {
        let html = HtmlAllocator::new(100);
        let a = html.named_repeater("a", RecordList::new([json!(1), json!(2), json!(3)])).unwrap();
        let b = html.named_repeater("b", RecordList::new([json!("x"), json!("y")])).unwrap();
        let p = html.parallel([a, b]).unwrap();
        let mut seen = Vec::new();
        assert!(html.repeater_start(p).unwrap());
        while html.repeater_next(p).unwrap() {
            seen.push((html.repeater_field(p, "a").unwrap(),
                       html.repeater_field(p, "b").unwrap()));
        }
        assert_eq!(seen, vec![(json!(1), json!("x")), (json!(2), json!("y"))]);

        let none = html.records([]).unwrap();
        let p2 = html.parallel([a, none]).unwrap();
        assert!(! html.repeater_start(p2).unwrap());
    }

    #[test]
    fn t_copy_shares_source() {
        let html = HtmlAllocator::new(100);
        let a = html.records([json!(1), json!(2)]).unwrap();
        let b = html.repeater_from(a).unwrap();
        assert!(html.repeater_start(a).unwrap());
        assert!(html.repeater_next(a).unwrap());
        // b has its own position
        assert_eq!(t_drain(&html, b, ""), vec![json!(1), json!(2)]);
        assert_eq!(html.repeater_field(a, ""), Some(json!(1)));
    }
}
