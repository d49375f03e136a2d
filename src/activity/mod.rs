//! Activity log — one JSONL line per poll cycle and per send.
//!
//! Log file: `~/.mailboard/activity.jsonl` (configurable via
//! `logging.path`). Writes are best-effort: a full disk or unwritable home
//! directory never interrupts polling or sending.

pub mod report;

use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::expand_home;
use crate::config::schema::LoggingConfig;

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

/// What an activity entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Poll,
    Send,
}

/// A single line of the activity log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub timestamp: String,
    pub kind: ActivityKind,
    /// `"ok"`, `"error"`, `"discarded"` or `"invalid"`.
    pub outcome: String,
    pub duration_ms: u64,
    /// Number of email records received (polls only).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub emails: Option<usize>,
    /// Recipient address (sends only).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub recipient: Option<String>,
    /// Error description when the outcome is not `ok`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub detail: Option<String>,
}

impl ActivityEntry {
    /// New entry stamped with the current time.
    pub fn now(kind: ActivityKind, outcome: &str, duration_ms: u64) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            kind,
            outcome: outcome.to_string(),
            duration_ms,
            emails: None,
            recipient: None,
            detail: None,
        }
    }

    pub fn with_emails(mut self, count: usize) -> Self {
        self.emails = Some(count);
        self
    }

    pub fn with_recipient(mut self, recipient: &str) -> Self {
        self.recipient = Some(recipient.to_string());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Log handle
// ---------------------------------------------------------------------------

/// Where activity entries go. A disabled log swallows everything.
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    path: Option<PathBuf>,
}

impl ActivityLog {
    /// Resolve the log location from config; disabled when logging is off.
    pub fn from_config(config: &LoggingConfig) -> Self {
        if !config.enabled {
            return Self::disabled();
        }
        Self {
            path: expand_home(&config.path),
        }
    }

    /// A log that records nothing.
    pub fn disabled() -> Self {
        Self { path: None }
    }

    /// A log writing to an explicit file.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append an entry. Failures are logged at debug level and dropped.
    pub fn record(&self, entry: &ActivityEntry) {
        let Some(path) = self.path.as_deref() else {
            return;
        };
        if let Err(e) = append_entry(path, entry) {
            log::debug!("activity log write to {} failed: {e}", path.display());
        }
    }

    /// Read every entry, skipping malformed lines. Empty when the file is
    /// missing or the log is disabled.
    pub fn read_all(&self) -> Vec<ActivityEntry> {
        let Some(path) = self.path.as_deref() else {
            return Vec::new();
        };
        let Ok(file) = fs::File::open(path) else {
            return Vec::new();
        };

        BufReader::new(file)
            .lines()
            .map_while(Result::ok)
            .filter_map(|line| serde_json::from_str::<ActivityEntry>(&line).ok())
            .collect()
    }

    /// The last `limit` entries, oldest first.
    pub fn read_recent(&self, limit: usize) -> Vec<ActivityEntry> {
        let mut entries = self.read_all();
        let skip = entries.len().saturating_sub(limit);
        entries.drain(..skip);
        entries
    }
}

fn append_entry(path: &Path, entry: &ActivityEntry) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(entry)?;
    writeln!(file, "{json}")?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_log(name: &str) -> ActivityLog {
        let path = std::env::temp_dir()
            .join(format!("mailboard-activity-{name}-{}", std::process::id()))
            .join("activity.jsonl");
        let _ = fs::remove_file(&path);
        ActivityLog::at(path)
    }

    #[test]
    fn record_then_read_back() {
        let log = temp_log("roundtrip");
        log.record(&ActivityEntry::now(ActivityKind::Poll, "ok", 120).with_emails(4));
        log.record(
            &ActivityEntry::now(ActivityKind::Send, "error", 80)
                .with_recipient("ada@example.com")
                .with_detail("gateway returned HTTP 500"),
        );

        let entries = log.read_all();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, ActivityKind::Poll);
        assert_eq!(entries[0].emails, Some(4));
        assert_eq!(entries[1].recipient.as_deref(), Some("ada@example.com"));
        assert_eq!(entries[1].outcome, "error");
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let log = temp_log("malformed");
        log.record(&ActivityEntry::now(ActivityKind::Poll, "ok", 5));
        let path = log.path().unwrap().to_path_buf();
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "not json").unwrap();
        log.record(&ActivityEntry::now(ActivityKind::Poll, "error", 7));

        assert_eq!(log.read_all().len(), 2);
    }

    #[test]
    fn read_recent_keeps_the_tail() {
        let log = temp_log("recent");
        for ms in 0..5 {
            log.record(&ActivityEntry::now(ActivityKind::Poll, "ok", ms));
        }
        let recent = log.read_recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].duration_ms, 3);
        assert_eq!(recent[1].duration_ms, 4);
    }

    #[test]
    fn disabled_log_records_nothing() {
        let log = ActivityLog::disabled();
        log.record(&ActivityEntry::now(ActivityKind::Send, "ok", 1));
        assert!(log.read_all().is_empty());
        assert!(log.path().is_none());
    }

    #[test]
    fn from_config_respects_enabled_flag() {
        let config = LoggingConfig {
            enabled: false,
            ..LoggingConfig::default()
        };
        assert!(ActivityLog::from_config(&config).path().is_none());

        let config = LoggingConfig {
            path: "/tmp/mailboard-test.jsonl".to_string(),
            ..LoggingConfig::default()
        };
        assert_eq!(
            ActivityLog::from_config(&config).path(),
            Some(Path::new("/tmp/mailboard-test.jsonl"))
        );
    }
}
