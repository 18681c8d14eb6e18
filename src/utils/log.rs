//! Simple logging module.

use std::fmt::Display;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

/// Log level for filtering messages.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Info => write!(f, "INFO"),
            Level::Warn => write!(f, "WARN"),
            Level::Error => write!(f, "ERROR"),
        }
    }
}

static LOG_LEVEL: AtomicU8 = AtomicU8::new(Level::Warn as u8);
static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Initialize the logger with the given level.
pub fn init(level: Level) {
    EPOCH.get_or_init(Instant::now);
    LOG_LEVEL.store(level as u8, Ordering::Relaxed);
}

/// Returns true if the given level should be logged.
#[inline]
fn enabled(level: Level) -> bool {
    level as u8 >= LOG_LEVEL.load(Ordering::Relaxed)
}

/// Internal logging function with optional identifier prefix.
///
/// Timestamps are seconds elapsed since `init`, which is what matters when
/// reading a battle trace.
fn log_with_id(level: Level, id: Option<&str>, message: &str) {
    if enabled(level) {
        let elapsed = EPOCH.get_or_init(Instant::now).elapsed();
        let stamp = elapsed.as_secs_f64();
        match id {
            Some(id) => eprintln!("{stamp:10.3}s [{level:5}] [{id}] {message}"),
            None => eprintln!("{stamp:10.3}s [{level:5}] {message}"),
        }
    }
}

/// Logger instance with an identifier prefix.
///
/// Each logger carries an ID that is prepended to all of its messages,
/// allowing differentiation between components (e.g., concurrent battles).
#[derive(Clone)]
pub struct Logger {
    pub id: Arc<str>,
}

impl Logger {
    /// Creates a new logger with the given identifier.
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self { id: id.into() }
    }

    /// Logs an info-level message.
    pub fn info(&self, message: &str) {
        log_with_id(Level::Info, Some(&self.id), message);
    }

    /// Logs a warning-level message.
    pub fn warn(&self, message: &str) {
        log_with_id(Level::Warn, Some(&self.id), message);
    }

    /// Logs an error-level message.
    pub fn error(&self, message: &str) {
        log_with_id(Level::Error, Some(&self.id), message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_ordering() {
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
    }

    #[test]
    fn level_display() {
        assert_eq!(format!("{}", Level::Info), "INFO");
        assert_eq!(format!("{}", Level::Warn), "WARN");
        assert_eq!(format!("{}", Level::Error), "ERROR");
    }

    #[test]
    fn logger_clone() {
        let logger1 = Logger::new("battle-1");
        let logger2 = logger1.clone();

        // Both loggers should work independently.
        logger1.info("from logger1");
        logger2.info("from logger2");
    }

    #[test]
    fn logger_new_with_arc_str() {
        let id: Arc<str> = "arc-id".into();
        let logger = Logger::new(id);
        logger.info("test message");
    }
}
