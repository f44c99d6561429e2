#![deny(missing_docs)]
//! Shared logging utilities for the podcast tracker workspace.
//!
//! This crate provides the `podcast_*` logging macros used across the codebase,
//! a per-thread "tracked task" context that prefixes every record, and the
//! `simplelog` initializers for the application and for tests.

use std::cell::RefCell;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

use log::{Level, LevelFilter, Log, Metadata, Record};
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

thread_local! {
    /// Identifier of the task currently tracked on this thread, if any.
    static TRACKED_TASK: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Sets (or clears) the task id that prefixes log records on the current thread.
///
/// The controller calls this whenever the tracked task changes.
pub fn set_tracked_task(task_id: Option<&str>) {
    TRACKED_TASK.with(|slot| *slot.borrow_mut() = task_id.map(str::to_owned));
}

/// Returns the task id currently attached to log records on this thread.
pub fn tracked_task() -> Option<String> {
    TRACKED_TASK.with(|slot| slot.borrow().clone())
}

/// Emits a record through the `log` facade, prefixed with the tracked task.
///
/// `target` is the calling module, so filtering by module keeps working.
/// Used by the macros below; call the macros instead.
#[doc(hidden)]
pub fn log_with_context(target: &str, level: Level, args: fmt::Arguments<'_>) {
    if level <= log::max_level() {
        emit(log::logger(), target, level, args);
    }
}

fn emit(logger: &dyn Log, target: &str, level: Level, args: fmt::Arguments<'_>) {
    let metadata = Metadata::builder().level(level).target(target).build();
    if !logger.enabled(&metadata) {
        return;
    }
    TRACKED_TASK.with(|slot| match slot.borrow().as_deref() {
        Some(task_id) => logger.log(
            &Record::builder()
                .metadata(metadata)
                .module_path(Some(target))
                .args(format_args!("[task {}] {}", task_id, args))
                .build(),
        ),
        None => logger.log(
            &Record::builder()
                .metadata(metadata)
                .module_path(Some(target))
                .args(args)
                .build(),
        ),
    });
}

/// Logs a trace-level message with the tracked task as context.
#[macro_export]
macro_rules! podcast_trace {
    ($($arg:tt)*) => {{
        $crate::log_with_context(
            module_path!(),
            $crate::log::Level::Trace,
            format_args!($($arg)*),
        );
    }};
}

/// Logs a debug-level message with the tracked task as context.
#[macro_export]
macro_rules! podcast_debug {
    ($($arg:tt)*) => {{
        $crate::log_with_context(
            module_path!(),
            $crate::log::Level::Debug,
            format_args!($($arg)*),
        );
    }};
}

/// Logs an info-level message with the tracked task as context.
#[macro_export]
macro_rules! podcast_info {
    ($($arg:tt)*) => {{
        $crate::log_with_context(
            module_path!(),
            $crate::log::Level::Info,
            format_args!($($arg)*),
        );
    }};
}

/// Logs a warn-level message with the tracked task as context.
#[macro_export]
macro_rules! podcast_warn {
    ($($arg:tt)*) => {{
        $crate::log_with_context(
            module_path!(),
            $crate::log::Level::Warn,
            format_args!($($arg)*),
        );
    }};
}

/// Logs an error-level message with the tracked task as context.
#[macro_export]
macro_rules! podcast_error {
    ($($arg:tt)*) => {{
        $crate::log_with_context(
            module_path!(),
            $crate::log::Level::Error,
            format_args!($($arg)*),
        );
    }};
}

/// Re-exported for the macros above.
#[doc(hidden)]
pub use log;

/// Destination for log output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDestination {
    /// Write to the given file only.
    File(PathBuf),
    /// Write to the terminal (stderr for warnings and errors).
    Terminal,
    /// Write to both the file and the terminal.
    Both(PathBuf),
}

impl LogDestination {
    /// Default log file used by the command-line front end.
    pub fn default_file() -> PathBuf {
        PathBuf::from("./podcast.log")
    }
}

/// Initialize the global logger with the specified destination and level.
///
/// A file that cannot be created is reported on stderr and skipped; the
/// terminal logger (if requested) is still installed.
pub fn initialize(destination: LogDestination, level: LevelFilter) {
    let config = build_config();

    let loggers: Vec<Box<dyn SharedLogger>> = match destination {
        LogDestination::File(path) => match create_file_logger(&path, level, config) {
            Some(file_logger) => vec![file_logger],
            None => return,
        },
        LogDestination::Terminal => vec![TermLogger::new(
            level,
            config,
            TerminalMode::Mixed,
            ColorChoice::Auto,
        )],
        LogDestination::Both(path) => {
            let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
                level,
                config.clone(),
                TerminalMode::Mixed,
                ColorChoice::Auto,
            )];
            if let Some(file_logger) = create_file_logger(&path, level, config) {
                loggers.push(file_logger);
            }
            loggers
        }
    };

    let _ = CombinedLogger::init(loggers);
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn create_file_logger(
    path: &Path,
    level: LevelFilter,
    config: Config,
) -> Option<Box<WriteLogger<File>>> {
    match File::create(path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("Warning: Could not create log file at {:?}: {}", path, err);
            None
        }
    }
}
