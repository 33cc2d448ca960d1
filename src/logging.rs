//! stderr backend for the `log` facade

use colored::Colorize;
use log::{Level, LevelFilter, Log, Metadata, Record};

pub const LOG_ENV: &str = "LCOV_REPORTER_LOG";

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let level = match record.level() {
            Level::Error => "ERROR".red().bold(),
            Level::Warn => "WARN".yellow().bold(),
            Level::Info => "INFO".green(),
            Level::Debug => "DEBUG".cyan(),
            Level::Trace => "TRACE".dimmed(),
        };

        eprintln!(
            "[{} {}] {}",
            chrono::Local::now().format("%H:%M:%S").to_string().dimmed(),
            level,
            record.args()
        );
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

/// Parse a level name, falling back to `info`
pub fn parse_level(name: &str) -> LevelFilter {
    name.trim().parse().unwrap_or(LevelFilter::Info)
}

/// Install the logger. An explicit level wins over the environment.
pub fn init(level: Option<&str>) {
    let filter = match level {
        Some(name) => parse_level(name),
        None => std::env::var(LOG_ENV)
            .map(|v| parse_level(&v))
            .unwrap_or(LevelFilter::Info),
    };

    // a logger may already be installed when embedded
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(filter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug"), LevelFilter::Debug);
        assert_eq!(parse_level("WARN"), LevelFilter::Warn);
        assert_eq!(parse_level("off"), LevelFilter::Off);
        assert_eq!(parse_level("loud"), LevelFilter::Info);
    }
}
