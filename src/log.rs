//! Leveled log file for kiln runs.
//!
//! Each invocation truncates `~/.kiln/kiln.log` (or the file named by
//! `KILN_LOG`) and appends timestamped lines to it. `--debug` or
//! `KILN_DEBUG=1` lowers the threshold from INFO to DEBUG.
//!
//! What goes where:
//! - ERROR: a task failed and the run is aborting
//! - WARN: a file could not be read or a similar recoverable surprise
//! - INFO: run start, the task plan, per-task outcome, file counts
//! - DEBUG: matched files, resolved passes, files written
//! - TRACE: per-pass detail inside a single file
//!
//! The lint report is user output and goes to the terminal, not here.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;

/// Overrides the log file location.
pub const LOG_ENV: &str = "KILN_LOG";
/// Enables debug logging when set to `1` or `true`.
pub const DEBUG_ENV: &str = "KILN_DEBUG";

static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();
static THRESHOLD: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    const ALL: [LogLevel; 5] = [
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Trace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }

    fn from_u8(v: u8) -> Self {
        Self::ALL
            .get(usize::from(v))
            .copied()
            .unwrap_or(LogLevel::Trace)
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn default_log_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(LOG_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(".kiln").join("kiln.log"))
}

/// Pick the log file and threshold for this run.
///
/// Failing to create the log file leaves logging disabled; a run never
/// fails because of it.
pub fn init_with_debug(debug: bool) {
    let level = if debug || env_flag(DEBUG_ENV) {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    THRESHOLD.store(level as u8, Ordering::SeqCst);

    let Some(path) = default_log_path() else {
        return;
    };
    if let Some(dir) = path.parent() {
        let _ = std::fs::create_dir_all(dir);
    }
    if File::create(&path).is_ok() {
        LOG_PATH.set(path).ok();
    }
}

pub fn is_debug() -> bool {
    get_level() >= LogLevel::Debug
}

pub fn get_level() -> LogLevel {
    LogLevel::from_u8(THRESHOLD.load(Ordering::Relaxed))
}

/// Path of the active log file, once [`init_with_debug`] has run.
pub fn log_path() -> Option<&'static PathBuf> {
    LOG_PATH.get()
}

/// Append `msg` at `level`; dropped when below the threshold or before init.
pub fn log_at(level: LogLevel, msg: &str) {
    if level > get_level() {
        return;
    }
    let Some(path) = LOG_PATH.get() else {
        return;
    };
    if let Ok(mut file) = OpenOptions::new().append(true).open(path) {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let _ = writeln!(file, "{} {:<5} {}", timestamp, level.as_str(), msg);
    }
}

pub fn error(msg: &str) {
    log_at(LogLevel::Error, msg);
}

pub fn warn(msg: &str) {
    log_at(LogLevel::Warn, msg);
}

pub fn info(msg: &str) {
    log_at(LogLevel::Info, msg);
}

pub fn debug(msg: &str) {
    log_at(LogLevel::Debug, msg);
}

pub fn trace(msg: &str) {
    log_at(LogLevel::Trace, msg);
}

/// Log at INFO.
#[macro_export]
macro_rules! klog {
    ($($arg:tt)*) => {
        $crate::log::info(&format!($($arg)*))
    };
}

#[macro_export]
macro_rules! klog_error {
    ($($arg:tt)*) => {
        $crate::log::error(&format!($($arg)*))
    };
}

#[macro_export]
macro_rules! klog_warn {
    ($($arg:tt)*) => {
        $crate::log::warn(&format!($($arg)*))
    };
}

/// Log at DEBUG; only written with `--debug` or `KILN_DEBUG=1`.
#[macro_export]
macro_rules! klog_debug {
    ($($arg:tt)*) => {
        $crate::log::debug(&format!($($arg)*))
    };
}

#[macro_export]
macro_rules! klog_trace {
    ($($arg:tt)*) => {
        $crate::log::trace(&format!($($arg)*))
    };
}
