//! Render settings, with overrides from the environment.

use anyhow::Result;
use html_meta::meta::{opt_get_env, get_env_bool};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    /// Append a newline after block-like elements (see
    /// `ElementMeta::block_newline`).
    pub readable: bool,
    /// Report render timings via `chj_util::time_guard`.
    pub trace: bool,
    /// How many times a lazy value may resolve to another lazy value
    /// before giving up.
    pub max_unwind: usize,
    /// Check lazy content items against the allowed child tags of
    /// their parent once they are resolved, warning on mismatches.
    pub verify: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            readable: false,
            trace: false,
            max_unwind: 32,
            verify: false,
        }
    }
}

impl RenderConfig {
    /// The defaults, overridden by `LAZYHTML_READABLE`,
    /// `LAZYHTML_TRACE`, `LAZYHTML_MAX_UNWIND` and `LAZYHTML_VERIFY`
    /// if set.
    pub fn from_env() -> Result<Self> {
        let d = Self::default();
        Ok(RenderConfig {
            readable: get_env_bool("LAZYHTML_READABLE")?,
            trace: get_env_bool("LAZYHTML_TRACE")?,
            max_unwind: opt_get_env("LAZYHTML_MAX_UNWIND")?.unwrap_or(d.max_unwind),
            verify: get_env_bool("LAZYHTML_VERIFY")?,
        })
    }

    pub fn readable(self) -> Self {
        RenderConfig { readable: true, ..self }
    }
}
