/// Client-side view state.
///
/// One owned object holding everything the dashboard shows: the last fetched
/// stats and emails, the open detail record, the compose form, connection
/// status and toasts. It is created at startup, updated by the poller and
/// composer, and dropped with the process; nothing is persisted.
///
/// Fetched data is only ever replaced wholesale. The open record is tracked
/// by position and re-located by value whenever the list is replaced, so it
/// is always a member of the current list.
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::composer::Draft;
use crate::model::{EmailRecord, StatsSummary};
use crate::notify::{Toast, ToastQueue};
use crate::status::{StatusReport, StatusReporter};

/// Sequence numbers of the newest poll applied to each slice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppliedSeq {
    pub stats: u64,
    pub emails: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ViewState {
    emails: Vec<EmailRecord>,
    /// At least one email list has been applied.
    emails_loaded: bool,
    stats: Option<StatsSummary>,
    open: Option<usize>,
    compose: Option<Draft>,
    pub status: StatusReporter,
    pub toasts: ToastQueue,
    pub applied: AppliedSeq,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emails(&self) -> &[EmailRecord] {
        &self.emails
    }

    /// `None` until the first successful stats fetch.
    pub fn stats(&self) -> Option<&StatsSummary> {
        self.stats.as_ref()
    }

    /// Replace the email list, keeping the open record if it is still there.
    pub fn replace_emails(&mut self, emails: Vec<EmailRecord>) {
        let reopened = self
            .open_record()
            .and_then(|current| emails.iter().position(|e| e == current));
        self.emails = emails;
        self.emails_loaded = true;
        self.open = reopened;
    }

    pub fn emails_loaded(&self) -> bool {
        self.emails_loaded
    }

    pub fn replace_stats(&mut self, stats: StatsSummary) {
        self.stats = Some(stats);
    }

    // -- Detail view --

    /// Open the record at `index`. Out-of-range indexes leave the view closed.
    pub fn open_detail(&mut self, index: usize) -> Option<&EmailRecord> {
        self.open = (index < self.emails.len()).then_some(index);
        self.open_record()
    }

    pub fn close_detail(&mut self) {
        self.open = None;
    }

    pub fn open_index(&self) -> Option<usize> {
        self.open
    }

    pub fn open_record(&self) -> Option<&EmailRecord> {
        self.open.and_then(|i| self.emails.get(i))
    }

    // -- Compose form --

    pub fn compose(&self) -> Option<&Draft> {
        self.compose.as_ref()
    }

    /// Open the compose form with `draft`.
    pub fn start_compose(&mut self, draft: Draft) {
        self.compose = Some(draft);
    }

    /// Close the compose form, discarding its content.
    pub fn close_compose(&mut self) {
        self.compose = None;
    }

    /// Serializable copy for the JSON state endpoint.
    pub fn snapshot(&self, now: DateTime<Utc>) -> ViewSnapshot {
        let mut toasts = self.toasts.clone();
        toasts.prune(now);
        ViewSnapshot {
            status: self.status.report(),
            last_updated: self.status.last_updated().map(|at| at.to_rfc3339()),
            stats: self.stats.clone(),
            emails: self.emails.clone(),
            open: self.open,
            compose: self.compose.clone(),
            toasts: toasts.iter().cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ViewSnapshot {
    pub status: StatusReport,
    pub last_updated: Option<String>,
    pub stats: Option<StatsSummary>,
    pub emails: Vec<EmailRecord>,
    pub open: Option<usize>,
    pub compose: Option<Draft>,
    pub toasts: Vec<Toast>,
}
