//! Printing diagnostics to stderr.

//! `warn!` lines look like `W: <message> at "file.rs" line N`. Tests
//! can collect them instead via `capture_warnings`.

use std::{cell::RefCell, fmt::Arguments, io::Write};

thread_local!{
    static CAPTURE: RefCell<Option<Vec<String>>> = RefCell::new(None);
}

/// Used by `warn!`, don't call directly.
pub fn emit(prefix: &str, args: Arguments, file: &str, line: u32) {
    let captured = CAPTURE.with(|c| {
        if let Some(lines) = &mut *c.borrow_mut() {
            lines.push(format!("{args}"));
            true
        } else {
            false
        }
    });
    if ! captured {
        let mut outp = std::io::BufWriter::new(std::io::stderr().lock());
        let _ = write!(&mut outp, "{prefix}");
        let _ = outp.write_fmt(args);
        let _ = writeln!(&mut outp, " at {:?} line {}", file, line);
        let _ = outp.flush();
    }
}

/// Run `f`, collecting the messages of all `warn!` calls made on
/// this thread meanwhile instead of printing them. Nested calls
/// collect into the innermost.
pub fn capture_warnings<R>(f: impl FnOnce() -> R) -> (R, Vec<String>) {
    let outer = CAPTURE.with(|c| c.replace(Some(Vec::new())));
    let r = f();
    let lines = CAPTURE.with(|c| c.replace(outer)).unwrap_or_default();
    (r, lines)
}

#[macro_export]
macro_rules! warn {
    ($formatstr:expr $(,$arg:expr)*) => {
        $crate::warn::emit("W: ", format_args!($formatstr $(,$arg)*), file!(), line!())
    }
}

#[macro_export]
macro_rules! nowarn {
    ($formatstr:expr $(,$arg:expr)*) => {
    }
}
