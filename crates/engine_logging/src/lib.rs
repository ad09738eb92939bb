#![deny(missing_docs)]
//! Shared logging utilities for the scraper workspace.
//!
//! This crate provides the `engine_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger. Every line emitted
//! through the macros is tagged with the name of the thread that produced it,
//! so interleaved output from crawl workers stays attributable.

#[doc(hidden)]
pub use log as __log;

/// Label used for threads that were spawned without a name.
pub const UNNAMED_THREAD: &str = "unnamed";

/// Returns the name of the current thread, used as the log line tag.
///
/// Crawl workers are named `crawl-worker-{i}`; the process entry thread is
/// reported as `main`.
pub fn thread_label() -> String {
    std::thread::current()
        .name()
        .unwrap_or(UNNAMED_THREAD)
        .to_string()
}

/// Logs a trace-level message tagged with the current thread name.
#[macro_export]
macro_rules! engine_trace {
    ($($arg:tt)*) => {{
        $crate::__log::trace!("{}>> {}", $crate::thread_label(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message tagged with the current thread name.
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => {{
        $crate::__log::info!("{}>> {}", $crate::thread_label(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message tagged with the current thread name.
#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)*) => {{
        $crate::__log::debug!("{}>> {}", $crate::thread_label(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message tagged with the current thread name.
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => {{
        $crate::__log::warn!("{}>> {}", $crate::thread_label(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message tagged with the current thread name.
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)*) => {{
        $crate::__log::error!("{}>> {}", $crate::thread_label(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Several test binaries race to install the logger; losing is fine.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
