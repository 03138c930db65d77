//! Log sink (C10): `tracing` to stderr, mirrored into a bounded ring buffer
//! the admin control surface reads from.
//!
//! New module — grounded in the pack's pervasive `tracing`/`tracing-subscriber`
//! usage rather than in the teacher, which reports statuses to its caller
//! instead of logging. The ring buffer is a plain `Mutex<VecDeque<_>>`, the
//! same "one guarded struct owns the state a subsystem needs" discipline the
//! teacher applies to `ConnLimits`/`ServerLimits`.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn from_tracing(level: &Level) -> Self {
        match *level {
            Level::ERROR => LogLevel::Error,
            Level::WARN => LogLevel::Warn,
            _ => LogLevel::Info,
        }
    }

    fn tag(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct LogRecord {
    pub(crate) level: LogLevel,
    pub(crate) target: String,
    pub(crate) message: String,
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.level.tag(), self.target, self.message)
    }
}

/// The bounded ring buffer backing `.log`/`.clear`/`.end --save` (§4.10).
pub(crate) struct LogBuffer {
    records: Mutex<VecDeque<LogRecord>>,
    capacity: usize,
}

impl LogBuffer {
    pub(crate) fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            records: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        })
    }

    fn push(&self, record: LogRecord) {
        let mut records = self.records.lock().expect("log buffer mutex poisoned");
        if records.len() >= self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    /// Returns a snapshot, optionally filtered to one level (§4.11 `.log`).
    pub(crate) fn snapshot(&self, level: Option<LogLevel>) -> Vec<LogRecord> {
        let records = self.records.lock().expect("log buffer mutex poisoned");
        records
            .iter()
            .filter(|r| match level {
                Some(l) => r.level == l,
                None => true,
            })
            .cloned()
            .collect()
    }

    pub(crate) fn clear(&self) {
        self.records.lock().expect("log buffer mutex poisoned").clear();
    }
}

/// A `tracing_subscriber::Layer` that mirrors every event into a [`LogBuffer`].
struct BufferLayer {
    buffer: Arc<LogBuffer>,
}

struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

impl<S: Subscriber> Layer<S> for BufferLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.buffer.push(LogRecord {
            level: LogLevel::from_tracing(event.metadata().level()),
            target: event.metadata().target().to_string(),
            message: visitor.0,
        });
    }
}

/// Installs the global `tracing` subscriber: an `EnvFilter`-gated `fmt` layer
/// to stderr plus the ring-buffer mirror. Returns the buffer the admin
/// surface reads from.
pub(crate) fn init() -> Arc<LogBuffer> {
    let buffer = LogBuffer::new(1024);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .with(BufferLayer { buffer: buffer.clone() })
        .init();

    buffer
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(level: LogLevel, msg: &str) -> LogRecord {
        LogRecord {
            level,
            target: "test".to_string(),
            message: msg.to_string(),
        }
    }

    #[test]
    fn ring_buffer_evicts_oldest_past_capacity() {
        let buffer = LogBuffer::new(2);
        buffer.push(rec(LogLevel::Info, "a"));
        buffer.push(rec(LogLevel::Info, "b"));
        buffer.push(rec(LogLevel::Info, "c"));
        let all = buffer.snapshot(None);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].message, "b");
        assert_eq!(all[1].message, "c");
    }

    #[test]
    fn snapshot_filters_by_level() {
        let buffer = LogBuffer::new(10);
        buffer.push(rec(LogLevel::Info, "a"));
        buffer.push(rec(LogLevel::Error, "b"));
        let errors = buffer.snapshot(Some(LogLevel::Error));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "b");
    }

    #[test]
    fn clear_empties_the_buffer() {
        let buffer = LogBuffer::new(10);
        buffer.push(rec(LogLevel::Info, "a"));
        buffer.clear();
        assert!(buffer.snapshot(None).is_empty());
    }
}
