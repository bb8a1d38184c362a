//! Capture of application logs for display inside the GUI.
//!
//! A [`CapturedLog`] is a bounded, thread-safe buffer of recent log
//! records; [`LogCollector`] is the `log::Log` sink that feeds it. The GUI
//! log panel reads the buffer every frame, so entries carry everything the
//! panel needs pre-formatted: timestamp, level, origin target, message,
//! and a display color.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Local};
use eframe::egui::Color32;
use log::{Level, Log, Metadata, Record};

/// Maximum number of retained records; older ones are dropped.
const CAPACITY: usize = 1000;

/// A single captured log record.
#[derive(Clone)]
pub struct LogRecord {
    /// Local wall-clock time the record was emitted.
    pub timestamp: DateTime<Local>,
    /// Severity.
    pub level: Level,
    /// Module path the record originated from.
    pub target: String,
    /// Rendered message text.
    pub message: String,
}

impl LogRecord {
    /// Display color for the record's level.
    pub fn color(&self) -> Color32 {
        match self.level {
            Level::Error => Color32::from_rgb(255, 100, 100),
            Level::Warn => Color32::from_rgb(255, 220, 100),
            Level::Info => Color32::from_rgb(110, 200, 255),
            Level::Debug => Color32::from_rgb(150, 150, 150),
            Level::Trace => Color32::from_rgb(190, 150, 255),
        }
    }
}

/// Shared, bounded buffer of recent log records.
#[derive(Clone, Default)]
pub struct CapturedLog(Arc<Mutex<VecDeque<LogRecord>>>);

impl CapturedLog {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(VecDeque::with_capacity(CAPACITY))))
    }

    /// Lock the buffer for reading.
    #[allow(clippy::unwrap_used)] // pushers never panic while holding the lock
    pub fn read(&self) -> MutexGuard<'_, VecDeque<LogRecord>> {
        self.0.lock().unwrap()
    }

    /// Drop all retained records.
    pub fn clear(&self) {
        self.read().clear();
    }

    fn push(&self, record: LogRecord) {
        let mut buffer = self.read();
        if buffer.len() >= CAPACITY {
            buffer.pop_front();
        }
        buffer.push_back(record);
    }
}

/// `log::Log` sink that copies every record into a [`CapturedLog`].
///
/// Level filtering is left to the panel so the user can change it after
/// the fact; the collector captures everything it is offered.
pub struct LogCollector {
    buffer: CapturedLog,
}

impl LogCollector {
    /// Create a collector feeding `buffer`.
    pub fn new(buffer: CapturedLog) -> Self {
        Self { buffer }
    }
}

impl Log for LogCollector {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        self.buffer.push(LogRecord {
            timestamp: Local::now(),
            level: record.level(),
            target: record.target().to_string(),
            message: record.args().to_string(),
        });
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collector_feeds_the_shared_buffer() {
        let buffer = CapturedLog::new();
        let collector = LogCollector::new(buffer.clone());

        collector.log(
            &Record::builder()
                .level(Level::Warn)
                .target("rust_scope::test")
                .args(format_args!("shutter stuck"))
                .build(),
        );

        let records = buffer.read();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, Level::Warn);
        assert_eq!(records[0].message, "shutter stuck");
    }

    #[test]
    fn buffer_is_bounded() {
        let buffer = CapturedLog::new();
        let collector = LogCollector::new(buffer.clone());
        for i in 0..(CAPACITY + 10) {
            collector.log(
                &Record::builder()
                    .level(Level::Info)
                    .args(format_args!("{i}"))
                    .build(),
            );
        }
        let records = buffer.read();
        assert_eq!(records.len(), CAPACITY);
        // The oldest entries were the ones dropped.
        assert_eq!(records.front().map(|r| r.message.clone()), Some("10".into()));
    }
}
