/// The poll cycle: fetch stats and emails, apply them to the view state,
/// render.
///
/// Each cycle issues both reads concurrently (scoped threads) and waits for
/// both. How results are applied depends on [`FetchMode`]:
///
/// - **joint** — both reads must succeed; otherwise nothing is replaced and
///   the status goes to `error`, leaving the previous (stale but valid) data
///   on screen.
/// - **independent** — each slice is replaced on its own success.
///
/// View state and the rendering surface sit behind one mutex, so an apply
/// and its render happen in one critical section and no caller can observe
/// a half-applied cycle.
///
/// Overlapping cycles (timer tick + manual refresh) are not serialized. With
/// [`RefreshGuard::LastWriteWins`] the last response to arrive is what stays
/// on screen. With [`RefreshGuard::Sequenced`] each cycle carries a
/// monotonically increasing number and a response older than the newest
/// applied one is discarded untouched.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use chrono::Local;
use log::{debug, info, warn};

use crate::activity::{ActivityEntry, ActivityKind, ActivityLog};
use crate::config::MailboardConfig;
use crate::config::schema::{FetchMode, RefreshGuard};
use crate::gateway::{Gateway, GatewayError};
use crate::model::{EmailRecord, StatsSummary};
use crate::notify::ToastKind;
use crate::render::Renderer;
use crate::view::ViewState;

type StatsResult = Result<StatsSummary, GatewayError>;
type EmailsResult = Result<Vec<EmailRecord>, GatewayError>;

/// How a poll cycle is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerOptions {
    pub fetch: FetchMode,
    pub guard: RefreshGuard,
}

impl PollerOptions {
    pub fn from_config(config: &MailboardConfig) -> Self {
        Self {
            fetch: config.fetch_mode(),
            guard: config.refresh.guard,
        }
    }
}

impl Default for PollerOptions {
    fn default() -> Self {
        Self {
            fetch: FetchMode::Joint,
            guard: RefreshGuard::LastWriteWins,
        }
    }
}

/// Result of one poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Fresh data applied and rendered.
    Updated,
    /// At least one read failed; status is `error`.
    Failed,
    /// Superseded by a newer cycle; nothing changed.
    Discarded,
}

impl PollOutcome {
    fn as_str(self) -> &'static str {
        match self {
            Self::Updated => "ok",
            Self::Failed => "error",
            Self::Discarded => "discarded",
        }
    }
}

struct Shared<R> {
    view: ViewState,
    surface: R,
}

/// Owns the view state and drives the rendering surface.
pub struct Poller<G, R> {
    gateway: G,
    options: PollerOptions,
    next_seq: AtomicU64,
    shared: Mutex<Shared<R>>,
    activity: ActivityLog,
}

impl<G: Gateway, R: Renderer> Poller<G, R> {
    pub fn new(gateway: G, surface: R, options: PollerOptions) -> Self {
        Self {
            gateway,
            options,
            next_seq: AtomicU64::new(0),
            shared: Mutex::new(Shared {
                view: ViewState::new(),
                surface,
            }),
            activity: ActivityLog::disabled(),
        }
    }

    /// Record every cycle to `log`.
    pub fn with_activity_log(mut self, log: ActivityLog) -> Self {
        self.activity = log;
        self
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    pub fn options(&self) -> PollerOptions {
        self.options
    }

    fn lock(&self) -> MutexGuard<'_, Shared<R>> {
        // A panic in a render call leaves the state itself consistent.
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read the view state.
    pub fn view<T>(&self, f: impl FnOnce(&ViewState) -> T) -> T {
        f(&self.lock().view)
    }

    /// Mutate the view state and/or render, atomically.
    pub fn update<T>(&self, f: impl FnOnce(&mut ViewState, &mut R) -> T) -> T {
        let mut guard = self.lock();
        let Shared { view, surface } = &mut *guard;
        f(view, surface)
    }

    // -- Poll cycle --

    /// Run one poll cycle.
    pub fn refresh(&self) -> PollOutcome {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("poll #{seq} starting");

        self.update(|view, surface| {
            view.status.begin();
            surface.render_status(&view.status.report());
        });

        let started = Instant::now();
        let (stats, emails) = self.fetch_both();
        let duration_ms = started.elapsed().as_millis() as u64;

        let email_count = emails.as_ref().ok().map(Vec::len);
        let error = stats
            .as_ref()
            .err()
            .or(emails.as_ref().err())
            .map(ToString::to_string);

        let outcome = self.update(|view, surface| match self.options.fetch {
            FetchMode::Joint => self.apply_joint(view, surface, seq, stats, emails),
            FetchMode::Independent => self.apply_independent(view, surface, seq, stats, emails),
        });

        info!(
            "poll #{seq} {} in {duration_ms}ms ({} emails)",
            outcome.as_str(),
            email_count.map_or_else(|| "?".to_string(), |n| n.to_string())
        );

        let mut entry = ActivityEntry::now(ActivityKind::Poll, outcome.as_str(), duration_ms);
        if let Some(count) = email_count {
            entry = entry.with_emails(count);
        }
        if let Some(error) = error {
            entry = entry.with_detail(error);
        }
        self.activity.record(&entry);

        outcome
    }

    /// Issue both reads concurrently and wait for both.
    fn fetch_both(&self) -> (StatsResult, EmailsResult) {
        let gateway = &self.gateway;
        std::thread::scope(|scope| {
            let stats = scope.spawn(|| gateway.get_stats());
            let emails = gateway.get_emails();
            let stats = stats.join().unwrap_or_else(|_| {
                Err(GatewayError::Transport("stats request panicked".to_string()))
            });
            (stats, emails)
        })
    }

    fn is_stale(&self, seq: u64, applied: u64) -> bool {
        self.options.guard == RefreshGuard::Sequenced && seq <= applied
    }

    fn apply_joint(
        &self,
        view: &mut ViewState,
        surface: &mut R,
        seq: u64,
        stats: StatsResult,
        emails: EmailsResult,
    ) -> PollOutcome {
        if self.is_stale(seq, view.applied.stats.max(view.applied.emails)) {
            debug!("poll #{seq} superseded, discarding");
            return PollOutcome::Discarded;
        }
        view.applied.stats = seq;
        view.applied.emails = seq;

        match (stats, emails) {
            (Ok(stats), Ok(emails)) => {
                view.replace_stats(stats);
                view.replace_emails(emails);
                view.status.succeed(Local::now());

                if let Some(stats) = view.stats() {
                    surface.render_stats(stats);
                }
                surface.render_email_list(view.emails());
                surface.render_detail(view.open_record());
                surface.render_status(&view.status.report());
                PollOutcome::Updated
            }
            (stats, emails) => {
                if let Err(e) = stats {
                    warn!("error fetching stats: {e}");
                }
                if let Err(e) = emails {
                    warn!("error fetching emails: {e}");
                }
                view.status.fail();
                surface.render_status(&view.status.report());
                PollOutcome::Failed
            }
        }
    }

    fn apply_independent(
        &self,
        view: &mut ViewState,
        surface: &mut R,
        seq: u64,
        stats: StatsResult,
        emails: EmailsResult,
    ) -> PollOutcome {
        let mut applied_any = false;
        let mut failed = false;

        if !self.is_stale(seq, view.applied.stats) {
            view.applied.stats = seq;
            applied_any = true;
            match stats {
                Ok(stats) => {
                    view.replace_stats(stats);
                    if let Some(stats) = view.stats() {
                        surface.render_stats(stats);
                    }
                }
                Err(e) => {
                    warn!("error fetching stats: {e}");
                    failed = true;
                }
            }
        }

        if !self.is_stale(seq, view.applied.emails) {
            view.applied.emails = seq;
            applied_any = true;
            match emails {
                Ok(emails) => {
                    view.replace_emails(emails);
                    surface.render_email_list(view.emails());
                    surface.render_detail(view.open_record());
                }
                Err(e) => {
                    warn!("error fetching emails: {e}");
                    failed = true;
                }
            }
        }

        if !applied_any {
            debug!("poll #{seq} superseded, discarding");
            return PollOutcome::Discarded;
        }

        if failed {
            view.status.fail();
        } else {
            view.status.succeed(Local::now());
        }
        surface.render_status(&view.status.report());

        if failed {
            PollOutcome::Failed
        } else {
            PollOutcome::Updated
        }
    }

    // -- View interactions --

    /// Open the detail view for the record at `index`.
    pub fn open_detail(&self, index: usize) -> Option<EmailRecord> {
        self.update(|view, surface| {
            let record = view.open_detail(index).cloned();
            surface.render_detail(view.open_record());
            record
        })
    }

    /// Close the detail view.
    pub fn close_detail(&self) {
        self.update(|view, surface| {
            view.close_detail();
            surface.render_detail(None);
        });
    }

    /// Hide the error banner without fetching.
    pub fn dismiss_banner(&self) {
        self.update(|view, surface| {
            view.status.dismiss_banner();
            surface.render_status(&view.status.report());
        });
    }

    /// Queue a toast notification.
    pub fn push_toast(&self, kind: ToastKind, message: impl Into<String>) -> u64 {
        self.update(|view, _| view.toasts.push(kind, message))
    }

    /// Re-render everything from the current view state, e.g. so relative
    /// ages stay current between polls.
    pub fn rerender(&self) {
        self.update(|view, surface| {
            if let Some(stats) = view.stats() {
                surface.render_stats(stats);
            }
            if view.emails_loaded() {
                surface.render_email_list(view.emails());
            }
            surface.render_detail(view.open_record());
            surface.render_status(&view.status.report());
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{OutgoingEmail, SendReceipt};
    use crate::render::NullSurface;
    use crate::status::ConnectionStatus;

    struct FixedGateway {
        stats_ok: bool,
        emails_ok: bool,
    }

    impl Gateway for FixedGateway {
        fn get_stats(&self) -> Result<StatsSummary, GatewayError> {
            if self.stats_ok {
                Ok(StatsSummary {
                    total_emails: Some(2),
                    ..StatsSummary::default()
                })
            } else {
                Err(GatewayError::Status {
                    code: 500,
                    detail: None,
                })
            }
        }

        fn get_emails(&self) -> Result<Vec<EmailRecord>, GatewayError> {
            if self.emails_ok {
                Ok(vec![EmailRecord::default(), EmailRecord::default()])
            } else {
                Err(GatewayError::Malformed("no emails".to_string()))
            }
        }

        fn send_email(&self, _email: &OutgoingEmail) -> Result<SendReceipt, GatewayError> {
            Ok(SendReceipt::default())
        }
    }

    fn poller(stats_ok: bool, emails_ok: bool, fetch: FetchMode) -> Poller<FixedGateway, NullSurface> {
        Poller::new(
            FixedGateway { stats_ok, emails_ok },
            NullSurface,
            PollerOptions {
                fetch,
                guard: RefreshGuard::LastWriteWins,
            },
        )
    }

    #[test]
    fn joint_success_replaces_both() {
        let p = poller(true, true, FetchMode::Joint);
        assert_eq!(p.refresh(), PollOutcome::Updated);
        p.view(|v| {
            assert_eq!(v.emails().len(), 2);
            assert_eq!(v.stats().unwrap().total_emails, Some(2));
            assert_eq!(v.status.status(), ConnectionStatus::Connected);
            assert!(v.status.last_updated().is_some());
        });
    }

    #[test]
    fn joint_partial_failure_replaces_nothing() {
        let p = poller(true, false, FetchMode::Joint);
        assert_eq!(p.refresh(), PollOutcome::Failed);
        p.view(|v| {
            assert!(v.stats().is_none());
            assert!(!v.emails_loaded());
            assert_eq!(v.status.status(), ConnectionStatus::Error);
            assert!(v.status.banner().is_some());
        });
    }

    #[test]
    fn independent_partial_failure_keeps_good_slice() {
        let p = poller(true, false, FetchMode::Independent);
        assert_eq!(p.refresh(), PollOutcome::Failed);
        p.view(|v| {
            assert_eq!(v.stats().unwrap().total_emails, Some(2));
            assert!(!v.emails_loaded());
            assert_eq!(v.status.status(), ConnectionStatus::Error);
        });
    }

    #[test]
    fn sequenced_guard_discards_older_cycles() {
        let p = Poller::new(
            FixedGateway {
                stats_ok: true,
                emails_ok: true,
            },
            NullSurface,
            PollerOptions {
                fetch: FetchMode::Joint,
                guard: RefreshGuard::Sequenced,
            },
        );
        let mut view = ViewState::new();
        let mut surface = NullSurface;
        view.applied.stats = 5;
        view.applied.emails = 5;

        let outcome = p.apply_joint(
            &mut view,
            &mut surface,
            4,
            Ok(StatsSummary::default()),
            Ok(vec![EmailRecord::default()]),
        );
        assert_eq!(outcome, PollOutcome::Discarded);
        assert!(view.stats().is_none());

        let outcome = p.apply_joint(
            &mut view,
            &mut surface,
            6,
            Ok(StatsSummary::default()),
            Ok(vec![EmailRecord::default()]),
        );
        assert_eq!(outcome, PollOutcome::Updated);
        assert_eq!(view.applied.emails, 6);
    }

    #[test]
    fn open_and_close_detail() {
        let p = poller(true, true, FetchMode::Joint);
        p.refresh();
        assert!(p.open_detail(1).is_some());
        assert_eq!(p.view(|v| v.open_index()), Some(1));
        assert!(p.open_detail(9).is_none());
        assert_eq!(p.view(|v| v.open_index()), None);
        p.open_detail(0);
        p.close_detail();
        assert_eq!(p.view(|v| v.open_index()), None);
    }
}
