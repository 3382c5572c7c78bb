//! The resolution context lazy values are resolved against: a stack
//! of frames of named JSON variables. Passed explicitly to each
//! render call.

use std::collections::HashMap;

use anyhow::Result;
use kstring::KString;
use serde_json::Value as JsonValue;

use crate::myfrom::MyFrom;

#[derive(Debug, Clone)]
pub struct Context {
    frames: Vec<HashMap<KString, JsonValue>>,
}

impl Default for Context {
    fn default() -> Self {
        Context { frames: vec![HashMap::new()] }
    }
}

/// Descend into `v` following the `.`-separated `path` (object keys
/// or array indices). The empty path is `v` itself.
pub fn json_path<'v>(v: &'v JsonValue, path: &str) -> Option<&'v JsonValue> {
    if path.is_empty() {
        return Some(v);
    }
    path.split('.').try_fold(v, |v, key| {
        match v {
            JsonValue::Object(m) => m.get(key),
            JsonValue::Array(a) => a.get(key.parse::<usize>().ok()?),
            _ => None
        }
    })
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` in the innermost frame.
    pub fn set<K>(&mut self, name: K, val: impl Into<JsonValue>)
    where KString: MyFrom<K>
    {
        let (name, val) = (KString::myfrom(name), val.into());
        match self.frames.last_mut() {
            Some(frame) => { frame.insert(name, val); }
            None => self.frames.push(HashMap::from([(name, val)])),
        }
    }

    /// Look up a variable, searching frames from the innermost out;
    /// `path` may continue into the variable's value, as in
    /// `"row.address.city"`.
    pub fn get(&self, path: &str) -> Option<&JsonValue> {
        let (name, rest) = match path.split_once('.') {
            Some((name, rest)) => (name, rest),
            None => (path, ""),
        };
        let v = self.frames.iter().rev().find_map(|frame| frame.get(name))?;
        json_path(v, rest)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub(crate) fn push_frame(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub(crate) fn pop_frame(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Run `f` with a fresh innermost frame, which is dropped again
    /// afterwards, also when `f` fails.
    pub fn with_frame<R>(&mut self, f: impl FnOnce(&mut Context) -> Result<R>) -> Result<R> {
        self.push_frame();
        let r = f(self);
        self.pop_frame();
        r
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn t_path() {
        let v = json!({"a": {"b": [10, {"c": "x"}]}});
        assert_eq!(json_path(&v, "a.b.0"), Some(&json!(10)));
        assert_eq!(json_path(&v, "a.b.1.c"), Some(&json!("x")));
        assert_eq!(json_path(&v, "a.x"), None);
        assert_eq!(json_path(&v, "a.b.z"), None);
        assert_eq!(json_path(&v, ""), Some(&v));
    }

    #[test]
    fn t_frames() {
        let mut ctx = Context::new();
        ctx.set("user", json!({"name": "Eve"}));
        ctx.set("n", 1);
        let r: Result<()> = ctx.with_frame(|ctx| {
            ctx.set("n", 2);
            assert_eq!(ctx.get("n"), Some(&json!(2)));
            assert_eq!(ctx.get("user.name"), Some(&json!("Eve")));
            anyhow::bail!("fails")
        });
        assert!(r.is_err());
        assert_eq!(ctx.depth(), 1);
        assert_eq!(ctx.get("n"), Some(&json!(1)));
        assert_eq!(ctx.get("missing"), None);
    }
}
