//! # Timing of render passes.

//! `time_guard!` is only enabled if the `LAZYHTML_TRACE` env var is
//! set to a truthy value or `enabled_set(true)` was called in the
//! thread. It can be statically compiled out by using
//! `notime_guard!` instead.

use std::{time::Instant, fmt::Debug, cell::Cell};

fn is_truthy(v: &str) -> bool {
    ! matches!(v, "0" | "" | "off" | "false" | "no")
}

fn time_guard_env_get() -> bool {
    match std::env::var("LAZYHTML_TRACE") {
        Ok(v) => is_truthy(&v),
        Err(_) => false
    }
}

thread_local!{
    static ENABLED: Cell<bool> = Cell::new(time_guard_env_get());
}

/// Enable or disable `time_guard!` for the current thread.
pub fn enabled_set(on: bool) {
    ENABLED.with(|cell| cell.set(on))
}

pub fn enabled() -> bool {
    ENABLED.with(|old| old.get())
}


pub enum TimeGuard<S: Debug> {
    Disabled,
    Enabled {
        name: S,
        start: Instant
    },
}

impl<S: Debug> Drop for TimeGuard<S> {
    fn drop(&mut self) {
        match self {
            TimeGuard::Disabled => (),
            TimeGuard::Enabled { name, start } => {
                let elapsed = start.elapsed();
                crate::warn::emit("T: ", format_args!("{:?}: {:?}", name, elapsed),
                                  file!(), line!());
            },
        }
    }
}

#[macro_export]
macro_rules! time_guard {
    ($namestr:expr) => {
        let _guard = if $crate::time_guard::enabled() {
            $crate::time_guard::TimeGuard::Enabled {
                name: $namestr,
                start: std::time::Instant::now()
            }
        } else {
            $crate::time_guard::TimeGuard::Disabled
        };
    }
}

#[macro_export]
macro_rules! notime_guard {
    ($namestr:expr) => {}
}
