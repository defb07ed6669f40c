use anstream::eprintln;
use log::{LevelFilter, Metadata, Record};

use crate::debug;

/// A [log::Log] that records messages into the current [debug::DebugLog]
/// and echoes the ones at or above `echo` to stderr.
pub struct MessageLogger {
    echo: LevelFilter,
}

impl MessageLogger {
    pub const fn new(echo: LevelFilter) -> Self {
        MessageLogger { echo }
    }
}

impl log::Log for MessageLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        // while a debug log is being collected, it gets every message level
        metadata.level() <= self.echo || super::log_is_enabled()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        super::log_entry(|| {
            debug::DebugEntryKind::Message(debug::Message {
                level: record.level().to_string(),
                file: record.file().map(|x| x.to_string()),
                line: record.line(),
                module_path: record.module_path().map(|x| x.to_string()),
                text: format!("{}", record.args()),
            })
        });

        if record.level() <= self.echo {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}
