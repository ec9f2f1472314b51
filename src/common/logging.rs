//! Terminal logging helpers.
//!
//! Lines are coloured by level and prefixed with a local timestamp. Every line
//! is also forwarded to the `log` facade so an embedding application can route
//! it elsewhere. Set `DEPOSIT_DAPP_SILENT` to mute terminal output.

use chrono::Local;
use colored::Colorize;

/// Environment variable that silences terminal output when set.
pub const SILENT_ENV: &str = "DEPOSIT_DAPP_SILENT";

/// Severity of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    fn tag(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Success => "OK",
            Self::Warning => "WARN",
            Self::Error => "ERROR",
        }
    }

    fn as_log_level(self) -> log::Level {
        match self {
            Self::Debug => log::Level::Debug,
            Self::Info | Self::Success => log::Level::Info,
            Self::Warning => log::Level::Warn,
            Self::Error => log::Level::Error,
        }
    }
}

fn is_silent() -> bool {
    std::env::var_os(SILENT_ENV).is_some()
}

fn format_line(level: LogLevel, message: &str) -> String {
    let timestamp = Local::now().format("%H:%M:%S%.3f").to_string();
    let tag = match level {
        LogLevel::Debug => level.tag().dimmed(),
        LogLevel::Info => level.tag().cyan(),
        LogLevel::Success => level.tag().green().bold(),
        LogLevel::Warning => level.tag().yellow().bold(),
        LogLevel::Error => level.tag().red().bold(),
    };
    format!("{} [{tag:>5}] {message}", timestamp.dimmed())
}

/// Writes a log line at the given level.
pub fn log(level: LogLevel, message: &str) {
    log::log!(target: "deposit_dapp", level.as_log_level(), "{message}");

    if is_silent() {
        return;
    }
    eprintln!("{}", format_line(level, message));
}

/// Prints a section banner.
pub fn log_section(title: &str) {
    log::info!(target: "deposit_dapp", "== {title} ==");

    if is_silent() {
        return;
    }
    let bar = "=".repeat(title.len() + 8);
    eprintln!("\n{}", bar.blue());
    eprintln!("{}", format!("    {title}").bold());
    eprintln!("{}", bar.blue());
}
