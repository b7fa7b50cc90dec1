use log::{LevelFilter, Log, Metadata, Record};
use std::sync::OnceLock;

struct StderrLogger {
    level: LevelFilter,
    quiet: bool,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        !self.quiet && metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        eprintln!("[{}] {}", record.level(), record.args());
    }

    fn flush(&self) {}
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Install the stderr logger. Level comes from `RUST_LOG`, default info.
/// `WAVESKETCH_LOG_QUIET=1` silences all output.
pub fn init() {
    let level = match std::env::var("RUST_LOG") {
        Ok(level) => parse_level(&level),
        Err(_) => LevelFilter::Info,
    };

    let quiet = std::env::var("WAVESKETCH_LOG_QUIET")
        .map(|value| value != "0")
        .unwrap_or(false);

    let logger_ref = LOGGER.get_or_init(|| StderrLogger { level, quiet });
    if log::set_logger(logger_ref).is_ok() {
        log::set_max_level(level);
    }
}

fn parse_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}
