//! Flagpole Logging
//!
//! Structured logging shared by every Flagpole crate. Output is controlled by
//! environment variables and every macro accepts trailing key/value fields.
//!
//! # Usage
//!
//! ```rust
//! use flagpole_log::{debug, info, warn};
//!
//! let name = "NEW_FLAG";
//! info!("flag created"; flag = name);
//! debug!("evaluated {} conditions", 3; flag = name, enabled = true);
//! warn!(target: "flagpole::store", "store unavailable");
//! ```
//!
//! # Environment Variables
//!
//! - `FLAGPOLE_DEBUG=1` - Enable debug logging
//! - `FLAGPOLE_LOG_LEVEL=trace|debug|info|warn|error|off` - Set log level
//! - `FLAGPOLE_LOG_FORMAT=pretty|compact|json` - Set output format
//! - `FLAGPOLE_LOG_TIMESTAMPS=1|0` - Include timestamps in text formats

use once_cell::sync::Lazy;
use std::env;
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

// ============================================================================
// Log Levels
// ============================================================================

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Off = 5,
}

impl Level {
    /// Parse a level name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(Level::Trace),
            "debug" => Some(Level::Debug),
            "info" => Some(Level::Info),
            "warn" | "warning" => Some(Level::Warn),
            "error" => Some(Level::Error),
            "off" | "none" => Some(Level::Off),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Off => "OFF",
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Level::Trace,
            1 => Level::Debug,
            2 => Level::Info,
            3 => Level::Warn,
            4 => Level::Error,
            _ => Level::Off,
        }
    }
}

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Trace => Level::Trace,
            log::Level::Debug => Level::Debug,
            log::Level::Info => Level::Info,
            log::Level::Warn => Level::Warn,
            log::Level::Error => Level::Error,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Log Format
// ============================================================================

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Human readable, one field per `key=value`
    Pretty,
    /// Short single-letter level, no date
    Compact,
    /// One JSON object per line
    Json,
}

impl Format {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Some(Format::Pretty),
            "compact" => Some(Format::Compact),
            "json" => Some(Format::Json),
            _ => None,
        }
    }
}

// ============================================================================
// Global Configuration
// ============================================================================

static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

static LOG_LEVEL: AtomicU8 = AtomicU8::new(Level::Info as u8);

static CONFIG: Lazy<LogConfig> = Lazy::new(LogConfig::from_env);

/// Logging configuration.
#[derive(Debug)]
pub struct LogConfig {
    pub debug: bool,
    pub level: Level,
    pub format: Format,
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            debug: false,
            level: Level::Info,
            format: Format::Json,
            timestamps: true,
        }
    }
}

fn env_flag(key: &str) -> Option<bool> {
    env::var(key)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

impl LogConfig {
    /// Read configuration from `FLAGPOLE_*` environment variables and
    /// publish the level to the global atomics.
    pub fn from_env() -> Self {
        let debug = env_flag("FLAGPOLE_DEBUG").unwrap_or(false);

        let level = env::var("FLAGPOLE_LOG_LEVEL")
            .ok()
            .and_then(|s| Level::parse(&s))
            .unwrap_or(if debug { Level::Debug } else { Level::Info });

        let format = env::var("FLAGPOLE_LOG_FORMAT")
            .ok()
            .and_then(|s| Format::parse(&s))
            .unwrap_or(Format::Json);

        let timestamps = env_flag("FLAGPOLE_LOG_TIMESTAMPS").unwrap_or(true);

        DEBUG_ENABLED.store(debug, Ordering::SeqCst);
        LOG_LEVEL.store(level as u8, Ordering::SeqCst);

        Self {
            debug,
            level,
            format,
            timestamps,
        }
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Initialize the logging system eagerly.
pub fn init() {
    Lazy::force(&CONFIG);
}

#[inline]
pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED.load(Ordering::Relaxed)
}

/// Check if a log level is enabled.
#[inline]
pub fn is_level_enabled(level: Level) -> bool {
    Lazy::force(&CONFIG);
    level != Level::Off && level as u8 >= LOG_LEVEL.load(Ordering::Relaxed)
}

pub fn current_level() -> Level {
    Level::from_u8(LOG_LEVEL.load(Ordering::Relaxed))
}

/// Set log level at runtime.
pub fn set_level(level: Level) {
    Lazy::force(&CONFIG);
    LOG_LEVEL.store(level as u8, Ordering::SeqCst);
}

/// Enable or disable debug mode at runtime.
pub fn set_debug(enabled: bool) {
    Lazy::force(&CONFIG);
    DEBUG_ENABLED.store(enabled, Ordering::SeqCst);
    if enabled && current_level() > Level::Debug {
        set_level(Level::Debug);
    }
}

pub fn config() -> &'static LogConfig {
    &CONFIG
}

// ============================================================================
// Log Output
// ============================================================================

/// A structured field attached to a log line.
pub type Field<'a> = (&'a str, String);

/// Write a log line. Used by the macros; call them instead.
#[doc(hidden)]
pub fn log(level: Level, target: &str, message: &str, fields: &[Field<'_>]) {
    if !is_level_enabled(level) {
        return;
    }

    let line = format_line(config(), level, target, message, fields);
    let mut stderr = std::io::stderr().lock();
    let _ = writeln!(stderr, "{}", line);
}

/// Render one log line in the configured format.
pub fn format_line(
    config: &LogConfig,
    level: Level,
    target: &str,
    message: &str,
    fields: &[Field<'_>],
) -> String {
    match config.format {
        Format::Pretty => {
            let mut line = String::new();
            if config.timestamps {
                line.push_str(&chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f ").to_string());
            }
            line.push_str(&format!("{:5} [{}] {}", level.as_str(), target, message));
            push_text_fields(&mut line, fields);
            line
        }
        Format::Compact => {
            let mut line = String::new();
            if config.timestamps {
                line.push_str(&chrono::Local::now().format("%H:%M:%S ").to_string());
            }
            let letter = level.as_str().chars().next().unwrap_or('?');
            line.push_str(&format!("{} {}: {}", letter, target, message));
            push_text_fields(&mut line, fields);
            line
        }
        Format::Json => format_json(level, target, message, fields),
    }
}

fn push_text_fields(line: &mut String, fields: &[Field<'_>]) {
    for (key, value) in fields {
        line.push(' ');
        line.push_str(key);
        line.push('=');
        if value.contains(' ') {
            line.push_str(&format!("{:?}", value));
        } else {
            line.push_str(value);
        }
    }
}

fn format_json(level: Level, target: &str, message: &str, fields: &[Field<'_>]) -> String {
    use serde::Serialize;

    #[derive(Serialize)]
    struct LogEntry<'a> {
        timestamp: String,
        level: &'a str,
        target: &'a str,
        message: &'a str,
        #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
        fields: serde_json::Map<String, serde_json::Value>,
    }

    let fields = fields
        .iter()
        .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.clone())))
        .collect();

    let entry = LogEntry {
        timestamp: chrono::Utc::now().to_rfc3339(),
        level: level.as_str(),
        target,
        message,
        fields,
    };

    serde_json::to_string(&entry).unwrap_or_else(|_| message.to_string())
}

// ============================================================================
// `log` crate bridge
// ============================================================================

struct Bridge;

impl log::Log for Bridge {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        is_level_enabled(metadata.level().into())
    }

    fn log(&self, record: &log::Record<'_>) {
        if self.enabled(record.metadata()) {
            log(
                record.level().into(),
                record.target(),
                &record.args().to_string(),
                &[],
            );
        }
    }

    fn flush(&self) {}
}

static BRIDGE: Bridge = Bridge;

/// Route records from the `log` facade (used by dependencies) through
/// Flagpole's output. Fails if another logger is already installed.
pub fn install_log_bridge() -> Result<(), log::SetLoggerError> {
    log::set_logger(&BRIDGE)?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}

// ============================================================================
// Macros
// ============================================================================

#[doc(hidden)]
#[macro_export]
macro_rules! __log {
    ($level:expr, $target:expr, $fmt:literal $(, $arg:expr)* $(; $($key:ident = $val:expr),+)?) => {
        if $crate::is_level_enabled($level) {
            $crate::log(
                $level,
                $target,
                &format!($fmt $(, $arg)*),
                &[$($((stringify!($key), format!("{}", $val))),+)?],
            );
        }
    };
}

/// Log a trace message.
#[macro_export]
macro_rules! trace {
    (target: $target:expr, $($rest:tt)+) => {
        $crate::__log!($crate::Level::Trace, $target, $($rest)+)
    };
    ($($rest:tt)+) => {
        $crate::__log!($crate::Level::Trace, module_path!(), $($rest)+)
    };
}

/// Log a debug message.
///
/// Enabled by `FLAGPOLE_DEBUG=1` or `FLAGPOLE_LOG_LEVEL=debug`.
///
/// ```rust
/// use flagpole_log::debug;
///
/// let flag = "BETA";
/// debug!("checking conditions"; flag = flag);
/// ```
#[macro_export]
macro_rules! debug {
    (target: $target:expr, $($rest:tt)+) => {
        $crate::__log!($crate::Level::Debug, $target, $($rest)+)
    };
    ($($rest:tt)+) => {
        $crate::__log!($crate::Level::Debug, module_path!(), $($rest)+)
    };
}

/// Log an info message.
#[macro_export]
macro_rules! info {
    (target: $target:expr, $($rest:tt)+) => {
        $crate::__log!($crate::Level::Info, $target, $($rest)+)
    };
    ($($rest:tt)+) => {
        $crate::__log!($crate::Level::Info, module_path!(), $($rest)+)
    };
}

/// Log a warning message.
#[macro_export]
macro_rules! warn {
    (target: $target:expr, $($rest:tt)+) => {
        $crate::__log!($crate::Level::Warn, $target, $($rest)+)
    };
    ($($rest:tt)+) => {
        $crate::__log!($crate::Level::Warn, module_path!(), $($rest)+)
    };
}

/// Log an error message.
#[macro_export]
macro_rules! error {
    (target: $target:expr, $($rest:tt)+) => {
        $crate::__log!($crate::Level::Error, $target, $($rest)+)
    };
    ($($rest:tt)+) => {
        $crate::__log!($crate::Level::Error, module_path!(), $($rest)+)
    };
}

// ============================================================================
// Tests
// ============================================================================
