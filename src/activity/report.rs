//! Activity summary for `mailboard history`.
//!
//! Aggregates the JSONL activity log into poll and send counters plus
//! average latencies.

use crate::activity::{ActivityEntry, ActivityKind};

/// Counters for one activity kind.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct KindSummary {
    pub total: usize,
    pub ok: usize,
    pub failed: usize,
    pub avg_duration_ms: f64,
}

impl KindSummary {
    /// Share of successful entries, 0.0 when there are none.
    pub fn ok_pct(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.ok as f64 / self.total as f64) * 100.0
        }
    }
}

/// Summary across the whole log.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ActivitySummary {
    pub polls: KindSummary,
    pub sends: KindSummary,
    /// Timestamp of the most recent successful poll.
    pub last_ok_poll: Option<String>,
}

/// Build the summary from log entries (in file order).
pub fn summarize(entries: &[ActivityEntry]) -> ActivitySummary {
    let polls = summarize_kind(entries, ActivityKind::Poll);
    let sends = summarize_kind(entries, ActivityKind::Send);
    let last_ok_poll = entries
        .iter()
        .rev()
        .find(|e| e.kind == ActivityKind::Poll && e.outcome == "ok")
        .map(|e| e.timestamp.clone());

    ActivitySummary {
        polls,
        sends,
        last_ok_poll,
    }
}

fn summarize_kind(entries: &[ActivityEntry], kind: ActivityKind) -> KindSummary {
    let matching: Vec<&ActivityEntry> = entries.iter().filter(|e| e.kind == kind).collect();
    if matching.is_empty() {
        return KindSummary::default();
    }

    let ok = matching.iter().filter(|e| e.outcome == "ok").count();
    // Discarded polls were superseded, not failed.
    let failed = matching
        .iter()
        .filter(|e| e.outcome == "error" || e.outcome == "invalid")
        .count();
    let total_ms: u64 = matching.iter().map(|e| e.duration_ms).sum();

    KindSummary {
        total: matching.len(),
        ok,
        failed,
        avg_duration_ms: total_ms as f64 / matching.len() as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(kind: ActivityKind, outcome: &str, ms: u64, ts: &str) -> ActivityEntry {
        let mut e = ActivityEntry::now(kind, outcome, ms);
        e.timestamp = ts.to_string();
        e
    }

    #[test]
    fn empty_log_summarizes_to_zero() {
        let summary = summarize(&[]);
        assert_eq!(summary, ActivitySummary::default());
        assert_eq!(summary.polls.ok_pct(), 0.0);
    }

    #[test]
    fn counts_split_by_kind_and_outcome() {
        let entries = vec![
            entry(ActivityKind::Poll, "ok", 100, "2026-10-18T10:00:00Z"),
            entry(ActivityKind::Poll, "error", 300, "2026-10-18T10:00:30Z"),
            entry(ActivityKind::Poll, "discarded", 200, "2026-10-18T10:01:00Z"),
            entry(ActivityKind::Poll, "ok", 200, "2026-10-18T10:01:30Z"),
            entry(ActivityKind::Send, "ok", 50, "2026-10-18T10:02:00Z"),
        ];
        let summary = summarize(&entries);

        assert_eq!(summary.polls.total, 4);
        assert_eq!(summary.polls.ok, 2);
        assert_eq!(summary.polls.failed, 1);
        assert_eq!(summary.polls.avg_duration_ms, 200.0);
        assert_eq!(summary.polls.ok_pct(), 50.0);
        assert_eq!(summary.sends.total, 1);
        assert_eq!(summary.sends.ok, 1);
        assert_eq!(summary.last_ok_poll.as_deref(), Some("2026-10-18T10:01:30Z"));
    }
}
