//! A metainfo database for HTML element trees.

pub mod meta;

use anyhow::{anyhow, Result};
use lazy_static::lazy_static;

pub use meta::{ElementMeta, MetaDb, ElementOverride, read_meta_db, looks_like_event_handler};

lazy_static!{
    static ref LOADED: Result<MetaDb, String> = read_meta_db().map_err(|e| format!("{e:#}"));

    /// The builtin database, without overrides.
    pub static ref BUILTIN: MetaDb = MetaDb::builtin();
}

/// The builtin database extended from `HTML_META_JSON`, read on first
/// use; an unreadable override file is reported on every call.
pub fn metadb() -> Result<&'static MetaDb> {
    LOADED.as_ref().map_err(|e| anyhow!("could not read element meta db: {e}"))
}
