/// Rendering of view state onto a surface.
///
/// The poller never touches markup or terminals directly; it drives a
/// [`Renderer`] through four capabilities. Two surfaces ship:
///
/// - [`html::HtmlSurface`] — fragments for the local web dashboard.
/// - [`terminal::TerminalSurface`] — colored text for `mailboard watch`.
///
/// Every render call is a pure function of its arguments; surfaces only
/// remember the last output so it can be served or diffed.
pub mod format;
pub mod html;
pub mod terminal;

use crate::model::{EmailRecord, StatsSummary};
use crate::status::StatusReport;

/// Placeholder shown for values the gateway has not provided.
pub const PLACEHOLDER: &str = "--";

/// The rendering capability set.
pub trait Renderer {
    fn render_stats(&mut self, stats: &StatsSummary);
    fn render_email_list(&mut self, emails: &[EmailRecord]);
    /// `None` closes the detail view.
    fn render_detail(&mut self, email: Option<&EmailRecord>);
    fn render_status(&mut self, status: &StatusReport);
}

/// Surface that renders nothing, for headless callers.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSurface;

impl Renderer for NullSurface {
    fn render_stats(&mut self, _stats: &StatsSummary) {}
    fn render_email_list(&mut self, _emails: &[EmailRecord]) {}
    fn render_detail(&mut self, _email: Option<&EmailRecord>) {}
    fn render_status(&mut self, _status: &StatusReport) {}
}

// ---------------------------------------------------------------------------
// Stats display values
// ---------------------------------------------------------------------------

/// Display strings for the statistics panel, with fallbacks applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsDisplay {
    pub total: String,
    pub auto_responded: String,
    pub manual: String,
    pub avg_response_time: String,
    pub success_rate: String,
}

impl StatsDisplay {
    pub fn from_stats(stats: &StatsSummary) -> Self {
        Self {
            total: stats.total_emails.unwrap_or(0).to_string(),
            auto_responded: stats.auto_responded.unwrap_or(0).to_string(),
            manual: stats.manual.unwrap_or(0).to_string(),
            avg_response_time: stats
                .avg_response_time
                .clone()
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            success_rate: success_rate(stats),
        }
    }

    /// Values shown before the first successful fetch.
    pub fn placeholder() -> Self {
        Self {
            total: PLACEHOLDER.to_string(),
            auto_responded: PLACEHOLDER.to_string(),
            manual: PLACEHOLDER.to_string(),
            avg_response_time: PLACEHOLDER.to_string(),
            success_rate: PLACEHOLDER.to_string(),
        }
    }
}

/// Success rate with the fallback chain:
///
/// 1. gateway-provided `successRate`, as an integer percentage;
/// 2. `round(autoResponded / totalEmails * 100)` when `totalEmails > 0`;
/// 3. `0%` when `totalEmails` is exactly zero;
/// 4. the placeholder otherwise.
pub fn success_rate(stats: &StatsSummary) -> String {
    if let Some(rate) = stats.success_rate {
        return format!("{}%", rate.round() as i64);
    }
    match stats.total_emails {
        Some(total) if total > 0 => {
            let auto = stats.auto_responded.unwrap_or(0) as f64;
            format!("{}%", (auto / total as f64 * 100.0).round() as i64)
        }
        Some(_) => "0%".to_string(),
        None => PLACEHOLDER.to_string(),
    }
}
