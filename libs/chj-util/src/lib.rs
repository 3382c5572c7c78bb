//! Small utilities shared between the lazyhtml crates: diagnostics
//! (`warn!`) and timing (`time_guard!`).

pub mod warn;
pub mod time_guard;
