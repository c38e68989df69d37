//! Console logging macros shared by the controller, the sensor adapters and the simulation.
//!
//! Every line is prefixed with a colored level tag and the current UTC wall clock time.
//! Per-cycle command tracing goes through [`event!`](crate::event) and is only printed
//! when `LOG_TAKEOFF_EVENTS` is set in the environment.

use chrono::{DateTime, Utc};
use std::fmt::Arguments;
use strum_macros::Display;

/// Environment variable enabling [`event!`](crate::event) output.
pub const EVENT_LOG_ENV: &str = "LOG_TAKEOFF_EVENTS";

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Level {
    Info,
    Log,
    Warn,
    Error,
    Fatal,
    Event,
}

impl Level {
    fn color(self) -> &'static str {
        match self {
            Level::Info => "32",
            Level::Log => "33",
            Level::Warn => "35",
            Level::Error => "31",
            Level::Fatal => "1;31",
            Level::Event => "36",
        }
    }
}

/// Renders one log line for `level` stamped with `now`.
pub fn format_line(level: Level, now: DateTime<Utc>, args: Arguments<'_>) -> String {
    let tag = format!("[{level}]");
    format!("\x1b[{}m{tag:<7}[{}]\x1b[0m {args}", level.color(), now.format("%H:%M:%S"))
}

pub fn emit(level: Level, args: Arguments<'_>) { println!("{}", format_line(level, Utc::now(), args)); }

pub fn fatal_line(args: Arguments<'_>) -> String { format_line(Level::Fatal, Utc::now(), args) }

pub fn events_enabled() -> bool { std::env::var(EVENT_LOG_ENV).is_ok() }

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => { $crate::logger::emit($crate::logger::Level::Info, format_args!($($arg)*)) };
}

#[macro_export]
macro_rules! log {
    ($($arg:tt)*) => { $crate::logger::emit($crate::logger::Level::Log, format_args!($($arg)*)) };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => { $crate::logger::emit($crate::logger::Level::Warn, format_args!($($arg)*)) };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => { $crate::logger::emit($crate::logger::Level::Error, format_args!($($arg)*)) };
}

/// Panics with a formatted fatal line. Only for startup failures the binary cannot recover from.
#[macro_export]
macro_rules! fatal {
    ($($arg:tt)*) => {
        panic!("{}", $crate::logger::fatal_line(format_args!($($arg)*)))
    };
}

#[macro_export]
macro_rules! event {
    ($($arg:tt)*) => {
        if $crate::logger::events_enabled() {
            $crate::logger::emit($crate::logger::Level::Event, format_args!($($arg)*))
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_carries_level_time_and_message() {
        let now = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let line = format_line(Level::Warn, now, format_args!("ramp at {:.2}", 0.5));
        assert!(line.starts_with("\x1b[35m[WARN] "));
        assert!(line.contains("[22:13:20]"));
        assert!(line.ends_with("ramp at 0.50"));
    }
}
