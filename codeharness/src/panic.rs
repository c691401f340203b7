//! Panic policy for the coordinator loops.
//!
//! A panic in the executor thread or the reconciler task means a broken
//! coordinator invariant; continuing would leave the process accepting work
//! it can never complete. The hook logs the panic location and message and
//! then aborts the whole process instead of letting a single thread die
//! quietly.

use std::io::Write;
use std::panic::{self, PanicHookInfo};
use std::process;

/// Install the abort-on-panic hook.
///
/// Should be called once early in server startup, after logging is up.
/// The original hook runs first so the standard backtrace output is kept.
pub fn init() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info: &PanicHookInfo<'_>| {
        report(info);
        original_hook(info);
        process::abort();
    }));
}

fn report(info: &PanicHookInfo<'_>) {
    // Write to stderr directly; the logging worker may be the panicking
    // thread.
    let mut stderr = std::io::stderr().lock();

    let _ = writeln!(stderr, "coordinator panic, aborting process");
    if let Some(location) = info.location() {
        let _ = writeln!(
            stderr,
            "  at {}:{}:{}",
            location.file(),
            location.line(),
            location.column()
        );
    }
    if let Some(message) = info.payload().downcast_ref::<&str>() {
        let _ = writeln!(stderr, "  message: {}", message);
    } else if let Some(message) = info.payload().downcast_ref::<String>() {
        let _ = writeln!(stderr, "  message: {}", message);
    }
    let _ = stderr.flush();
}
