#![deny(missing_docs)]
//! Shared logging utilities for the pilot workspace.
//!
//! This crate provides the `pilot_*` logging macros used across the codebase,
//! a per-thread "active task" context stamped onto every line, and a minimal
//! test initializer for the global logger.

use std::cell::RefCell;

thread_local! {
    /// Identifier of the task the current thread is driving, if any.
    static TASK_CONTEXT: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Sets (or clears) the active task identifier for the current thread.
/// The controller loop calls this whenever the session id changes.
pub fn set_task_context(task_id: Option<&str>) {
    TASK_CONTEXT.with(|ctx| *ctx.borrow_mut() = task_id.map(ToOwned::to_owned));
}

/// Returns the active task identifier for the current thread.
pub fn task_context() -> Option<String> {
    TASK_CONTEXT.with(|ctx| ctx.borrow().clone())
}

/// Prefix inserted before every macro-emitted message, e.g. `[task=ab12] `.
/// Empty when no task is active.
#[doc(hidden)]
pub fn context_prefix() -> String {
    TASK_CONTEXT.with(|ctx| match ctx.borrow().as_deref() {
        Some(id) => format!("[task={id}] "),
        None => String::new(),
    })
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! pilot_trace {
    ($($arg:tt)*) => {{
        log::trace!("{}{}", $crate::context_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! pilot_debug {
    ($($arg:tt)*) => {{
        log::debug!("{}{}", $crate::context_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! pilot_info {
    ($($arg:tt)*) => {{
        log::info!("{}{}", $crate::context_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! pilot_warn {
    ($($arg:tt)*) => {{
        log::warn!("{}{}", $crate::context_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! pilot_error {
    ($($arg:tt)*) => {{
        log::error!("{}{}", $crate::context_prefix(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
