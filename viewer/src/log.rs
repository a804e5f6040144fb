use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::observer::{Observers, Subscription};

pub const DEFAULT_CAPACITY: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARNING"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    pub details: Option<Value>,
}

/// In-app activity log shown to the user.
///
/// Entries are kept newest-first and bounded by `capacity`. Listeners get
/// the full snapshot after every change. Each entry is also emitted as a
/// `tracing` event.
#[derive(Debug)]
pub struct LogService {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    listeners: Observers<[LogEntry]>,
}

impl LogService {
    pub fn new(capacity: usize) -> Self {
        LogService {
            entries: VecDeque::new(),
            capacity,
            listeners: Observers::new(),
        }
    }

    pub fn info(&mut self, message: impl Into<String>, details: Option<Value>) {
        self.push(LogLevel::Info, message.into(), details);
    }

    pub fn warning(&mut self, message: impl Into<String>, details: Option<Value>) {
        self.push(LogLevel::Warning, message.into(), details);
    }

    pub fn error(&mut self, message: impl Into<String>, details: Option<Value>) {
        self.push(LogLevel::Error, message.into(), details);
    }

    fn push(&mut self, level: LogLevel, message: String, details: Option<Value>) {
        match level {
            LogLevel::Info => tracing::info!(details = ?details, "{}", message),
            LogLevel::Warning => tracing::warn!(details = ?details, "{}", message),
            LogLevel::Error => tracing::error!(details = ?details, "{}", message),
        }

        self.entries.push_front(LogEntry {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            level,
            message,
            details,
        });
        self.entries.truncate(self.capacity);
        self.notify();
    }

    /// Newest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.notify();
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&[LogEntry]) + 'static) -> Subscription {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        self.listeners.unsubscribe(subscription)
    }

    fn notify(&mut self) {
        let snapshot = self.entries.make_contiguous();
        self.listeners.notify(snapshot);
    }
}

impl Default for LogService {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// `14:05:09` in local time.
pub fn format_log_time(timestamp: &DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M:%S").to_string()
}

/// `Mar 5` in local time.
pub fn format_log_date(timestamp: &DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%b %-d").to_string()
}
