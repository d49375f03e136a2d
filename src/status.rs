/// Connection status reporting.
///
/// Three states driven solely by poll outcomes:
///
/// ```text
/// loading ──ok──▶ connected
///    │              │
///    └──fail──▶ error
///
/// connected | error ──next fetch──▶ loading
/// ```
///
/// The error banner is separate from the status: it is shown on a failed
/// fetch and hidden as soon as the next attempt begins.
use chrono::{DateTime, Local};
use serde::Serialize;

/// Banner text shown when a poll cycle fails.
pub const FETCH_FAILED_MESSAGE: &str =
    "Unable to fetch data from the server. Please check your connection and try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Loading,
    Connected,
    Error,
}

impl ConnectionStatus {
    /// Indicator style class.
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Connected => "connected",
            Self::Error => "error",
        }
    }

    /// Short user-facing label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Loading => "Loading...",
            Self::Connected => "Connected",
            Self::Error => "Disconnected",
        }
    }
}

/// Snapshot handed to renderers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub status: ConnectionStatus,
    pub label: &'static str,
    pub banner: Option<&'static str>,
    #[serde(skip)]
    pub last_updated: Option<DateTime<Local>>,
}

impl StatusReport {
    /// `Last updated: 02:15:09 PM`, or `None` before the first success.
    pub fn last_updated_label(&self) -> Option<String> {
        self.last_updated
            .map(|at| format!("Last updated: {}", at.format("%I:%M:%S %p")))
    }
}

/// Tracks status, banner and last successful update.
#[derive(Debug, Clone)]
pub struct StatusReporter {
    status: ConnectionStatus,
    banner: Option<&'static str>,
    last_updated: Option<DateTime<Local>>,
    /// No fetch has settled yet.
    connecting: bool,
}

impl Default for StatusReporter {
    fn default() -> Self {
        Self {
            status: ConnectionStatus::Loading,
            banner: None,
            last_updated: None,
            connecting: true,
        }
    }
}

impl StatusReporter {
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn banner(&self) -> Option<&'static str> {
        self.banner
    }

    pub fn last_updated(&self) -> Option<DateTime<Local>> {
        self.last_updated
    }

    /// A fetch is starting: go to `loading` and hide the banner.
    pub fn begin(&mut self) {
        self.status = ConnectionStatus::Loading;
        self.banner = None;
    }

    /// A fetch succeeded at `at`.
    pub fn succeed(&mut self, at: DateTime<Local>) {
        self.status = ConnectionStatus::Connected;
        self.last_updated = Some(at);
        self.connecting = false;
    }

    /// A fetch failed. Data already on screen stays; only the status changes.
    pub fn fail(&mut self) {
        self.status = ConnectionStatus::Error;
        self.banner = Some(FETCH_FAILED_MESSAGE);
        self.connecting = false;
    }

    /// Hide the banner without retrying.
    pub fn dismiss_banner(&mut self) {
        self.banner = None;
    }

    /// Label for the current state; the very first load reads "Connecting...".
    pub fn label(&self) -> &'static str {
        if self.connecting && self.status == ConnectionStatus::Loading {
            "Connecting..."
        } else {
            self.status.label()
        }
    }

    pub fn report(&self) -> StatusReport {
        StatusReport {
            status: self.status,
            label: self.label(),
            banner: self.banner,
            last_updated: self.last_updated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn starts_connecting() {
        let reporter = StatusReporter::default();
        assert_eq!(reporter.status(), ConnectionStatus::Loading);
        assert_eq!(reporter.label(), "Connecting...");
        assert!(reporter.banner().is_none());
    }

    #[test]
    fn success_then_reload_reads_loading() {
        let mut reporter = StatusReporter::default();
        reporter.begin();
        reporter.succeed(Local::now());
        assert_eq!(reporter.label(), "Connected");
        assert_eq!(reporter.report().status.css_class(), "connected");

        reporter.begin();
        assert_eq!(reporter.label(), "Loading...");
    }

    #[test]
    fn failure_shows_banner_until_next_attempt() {
        let mut reporter = StatusReporter::default();
        reporter.begin();
        reporter.fail();
        assert_eq!(reporter.status(), ConnectionStatus::Error);
        assert_eq!(reporter.label(), "Disconnected");
        assert_eq!(reporter.banner(), Some(FETCH_FAILED_MESSAGE));

        reporter.begin();
        assert!(reporter.banner().is_none());
        assert_eq!(reporter.status(), ConnectionStatus::Loading);
    }

    #[test]
    fn failure_keeps_last_updated() {
        let mut reporter = StatusReporter::default();
        let at = Local.with_ymd_and_hms(2026, 10, 18, 14, 5, 9).unwrap();
        reporter.succeed(at);
        reporter.begin();
        reporter.fail();
        assert_eq!(reporter.last_updated(), Some(at));
        assert_eq!(
            reporter.report().last_updated_label().as_deref(),
            Some("Last updated: 02:05:09 PM")
        );
    }

    #[test]
    fn dismiss_banner_keeps_status() {
        let mut reporter = StatusReporter::default();
        reporter.fail();
        reporter.dismiss_banner();
        assert!(reporter.banner().is_none());
        assert_eq!(reporter.status(), ConnectionStatus::Error);
    }
}
