//! Dual-stream logger.
//!
//! Informational output (debug/info) goes to stdout; warnings and errors go
//! to stderr. Schedulers capture the two streams separately, so routine
//! "user added" lines never mix into the error channel.

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

struct DualStream;

impl Log for DualStream {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Debug
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match record.level() {
            Level::Error | Level::Warn => {
                eprintln!("{}: {}", level_label(record.level()), record.args())
            }
            _ => println!("{}", record.args()),
        }
    }

    fn flush(&self) {
        use std::io::Write;
        let _ = std::io::stdout().flush();
        let _ = std::io::stderr().flush();
    }
}

fn level_label(level: Level) -> &'static str {
    match level {
        Level::Error => "error",
        Level::Warn => "warning",
        _ => "info",
    }
}

static LOGGER: DualStream = DualStream;

/// Install the dual-stream logger as the process logger.
pub fn init() -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(LevelFilter::Debug);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_standard_levels_enabled() {
        for level in [Level::Error, Level::Warn, Level::Info, Level::Debug] {
            let metadata = Metadata::builder().level(level).build();
            assert!(DualStream.enabled(&metadata));
        }
        let trace = Metadata::builder().level(Level::Trace).build();
        assert!(!DualStream.enabled(&trace));
    }

    #[test]
    fn labels_match_stream_convention() {
        assert_eq!(level_label(Level::Error), "error");
        assert_eq!(level_label(Level::Warn), "warning");
    }
}
