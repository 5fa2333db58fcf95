//! Append-only audit log sink.
//!
//! Every decision point in the coordination loop produces one durable line:
//!
//! ```text
//! [2024-01-01 00:00:00 UTC] ACTION FLOOD HIGH score=120.0 Deploy sandbags; evacuate low-lying zones
//! ```
//!
//! Writers only ever append whole lines; prior lines are never read back,
//! rewritten, or truncated. A fresh run appends a session-start marker
//! instead of clearing history.

#![deny(unsafe_code)]

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use beacon_types::wire::WIRE_TIMESTAMP_FORMAT;

/// The LEVEL token of an audit line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditKind {
    /// Session-start marker appended when a sink is opened.
    Session,
    /// Sensor detected and reported a hazard event.
    Event,
    /// Sensor tick with nothing above threshold.
    NoEvent,
    /// Responder received a sensor report.
    Report,
    /// Responder classified a received report.
    Classified,
    /// Recoverable anomaly: malformed report, foreign traffic, failed send.
    Warn,
    /// Response action selected and executed.
    Action,
    /// Response completed.
    Done,
    /// Status message traffic (field-unit replies).
    Status,
}

impl AuditKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditKind::Session => "SESSION",
            AuditKind::Event => "EVENT",
            AuditKind::NoEvent => "NO_EVENT",
            AuditKind::Report => "REPORT",
            AuditKind::Classified => "CLASSIFIED",
            AuditKind::Warn => "WARN",
            AuditKind::Action => "ACTION",
            AuditKind::Done => "DONE",
            AuditKind::Status => "STATUS",
        }
    }
}

impl fmt::Display for AuditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit sink failures.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("audit sink lock poisoned")]
    Lock,
}

/// An append-only, multiple-writer line sink.
///
/// Implementors must emit each `append` as one whole line; concurrent
/// appends never interleave partial lines.
pub trait AuditSink: Send + Sync {
    fn append(&self, kind: AuditKind, rest: &str) -> Result<(), AuditError>;
}

/// Render one audit line (with trailing newline).
fn format_line(kind: AuditKind, rest: &str) -> String {
    let timestamp = chrono::Utc::now().format(WIRE_TIMESTAMP_FORMAT);
    format!("[{timestamp}] {kind} {rest}\n")
}

// ── File-backed sink ─────────────────────────────────────────────────────

/// Durable file sink. The file is opened in append mode and shared behind
/// a mutex so concurrent writers serialize per line.
#[derive(Debug)]
pub struct FileAuditSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileAuditSink {
    /// Open (or create) the log file and append the session-start marker.
    ///
    /// Failure here is the fatal startup fault: an agent must not enter its
    /// loop without a working sink.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let sink = Self {
            path,
            file: Mutex::new(file),
        };
        sink.append(AuditKind::Session, "audit session opened")?;
        Ok(sink)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for FileAuditSink {
    fn append(&self, kind: AuditKind, rest: &str) -> Result<(), AuditError> {
        let line = format_line(kind, rest);
        let mut file = self.file.lock().map_err(|_| AuditError::Lock)?;
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

// ── In-memory sink (for tests) ───────────────────────────────────────────

/// Captures rendered lines in memory.
#[derive(Default)]
pub struct MemoryAuditSink {
    entries: Mutex<Vec<(AuditKind, String)>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All rendered lines, in append order.
    pub fn lines(&self) -> Vec<String> {
        self.entries
            .lock()
            .map(|entries| entries.iter().map(|(_, line)| line.clone()).collect())
            .unwrap_or_default()
    }

    /// Lines of one kind, in append order.
    pub fn lines_of(&self, kind: AuditKind) -> Vec<String> {
        self.entries
            .lock()
            .map(|entries| {
                entries
                    .iter()
                    .filter(|(k, _)| *k == kind)
                    .map(|(_, line)| line.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn count_of(&self, kind: AuditKind) -> usize {
        self.lines_of(kind).len()
    }
}

impl AuditSink for MemoryAuditSink {
    fn append(&self, kind: AuditKind, rest: &str) -> Result<(), AuditError> {
        let line = format_line(kind, rest);
        self.entries
            .lock()
            .map_err(|_| AuditError::Lock)?
            .push((kind, line));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn lines_carry_timestamp_kind_and_rest() {
        let sink = MemoryAuditSink::new();
        sink.append(AuditKind::NoEvent, "water=15.0,temp=29.0,smoke=3.0,tremor=0.50")
            .unwrap();

        let lines = sink.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].contains("] NO_EVENT water=15.0"));
        assert!(lines[0].ends_with('\n'));
    }

    #[test]
    fn file_sink_appends_session_marker_and_preserves_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.log");

        {
            let sink = FileAuditSink::open(&path).unwrap();
            sink.append(AuditKind::Event, "first run").unwrap();
        }
        {
            let sink = FileAuditSink::open(&path).unwrap();
            sink.append(AuditKind::Event, "second run").unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("SESSION audit session opened"));
        assert!(lines[1].contains("EVENT first run"));
        assert!(lines[2].contains("SESSION audit session opened"));
        assert!(lines[3].contains("EVENT second run"));
    }

    #[test]
    fn concurrent_appends_never_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(FileAuditSink::open(dir.path().join("audit.log")).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|writer| {
                let sink = Arc::clone(&sink);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        sink.append(AuditKind::Status, &format!("writer={writer} line={i}"))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let contents = std::fs::read_to_string(sink.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 1 + 8 * 50);
        for line in &lines[1..] {
            assert!(line.contains("STATUS writer="), "interleaved line: {line}");
        }
    }

    #[test]
    fn open_failure_is_surfaced() {
        let err = FileAuditSink::open("/definitely/not/a/dir/audit.log").unwrap_err();
        assert!(matches!(err, AuditError::Io(_)));
    }
}
