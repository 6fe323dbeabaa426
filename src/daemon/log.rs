//! Append-only activity log for rebuild events
//!
//! Readers take an `Arc` snapshot; appends copy-on-write only when a reader
//! still holds the previous snapshot.

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Started,
    Stopped,
    PeriodUpdated,
    Built,
    Skipped,
    EmptyLeafSet,
    FileUnreadable,
    Failed,
}

impl LogKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LogKind::Started => "started",
            LogKind::Stopped => "stopped",
            LogKind::PeriodUpdated => "period_updated",
            LogKind::Built => "built",
            LogKind::Skipped => "skipped",
            LogKind::EmptyLeafSet => "empty_leaf_set",
            LogKind::FileUnreadable => "file_unreadable",
            LogKind::Failed => "failed",
        }
    }

    /// Whether this entry closes out a rebuild attempt
    pub fn is_build_outcome(self) -> bool {
        matches!(self, LogKind::Built | LogKind::EmptyLeafSet | LogKind::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub kind: LogKind,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.kind.as_str(),
            self.message
        )
    }
}

#[derive(Debug)]
pub struct DaemonLog {
    entries: RwLock<Arc<Vec<LogEntry>>>,
    next_sequence: AtomicU64,
    max_entries: usize,
}

impl DaemonLog {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(Arc::new(Vec::new())),
            next_sequence: AtomicU64::new(0),
            max_entries: max_entries.max(1),
        }
    }

    /// Append an entry, trimming the oldest past `max_entries`
    pub fn append(&self, kind: LogKind, message: impl Into<String>) -> LogEntry {
        let mut entries = self.entries.write();
        let entry = LogEntry {
            sequence: self.next_sequence.fetch_add(1, Ordering::Relaxed),
            timestamp: Utc::now(),
            kind,
            message: message.into(),
        };
        let list = Arc::make_mut(&mut *entries);
        list.push(entry.clone());
        if list.len() > self.max_entries {
            let excess = list.len() - self.max_entries;
            list.drain(..excess);
        }
        entry
    }

    pub fn snapshot(&self) -> Arc<Vec<LogEntry>> {
        Arc::clone(&self.entries.read())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        *self.entries.write() = Arc::new(Vec::new());
    }

    /// One line per entry
    pub fn render(&self) -> String {
        render_entries(&self.snapshot())
    }
}

pub fn render_entries(entries: &[LogEntry]) -> String {
    entries
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
