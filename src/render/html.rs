//! HTML fragments for the web dashboard.
//!
//! Every gateway-supplied string goes through [`escape_html`] before it is
//! placed in markup. Style keys derived from data are restricted to
//! `[a-z0-9-]` by [`EmailRecord::inquiry_key`].

use std::fmt::Write as _;

use chrono::{DateTime, Local};

use super::format::{count_label, format_datetime, preview, time_ago};
use super::{Renderer, StatsDisplay};
use crate::config::schema::Variant;
use crate::model::{EmailRecord, StatsSummary};
use crate::status::StatusReport;

const EMPTY_STATE: &str = r#"<div class="empty-state">
  <div class="empty-state-icon">📭</div>
  <h3>No emails yet</h3>
  <p>Emails will appear here when they are received</p>
</div>"#;

const LOADING_FEED: &str = r#"<div class="loading-spinner"><div class="spinner"></div><p>Loading emails...</p></div>"#;

const AUTO_BADGE: &str = r#"<span class="status-badge">✓ Auto-Responded</span>"#;

/// Escape text for use in element content and quoted attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

fn stat_card(id: &str, label: &str, value: &str) -> String {
    format!(
        r#"<div class="stat-card"><div class="stat-label">{label}</div><div class="stat-value" id="{id}">{value}</div></div>"#,
        value = escape_html(value),
    )
}

/// Statistics panel for the given layout.
pub fn stats_panel(variant: Variant, display: &StatsDisplay) -> String {
    let cards = match variant {
        Variant::Cards => [
            stat_card("totalEmails", "Total Emails", &display.total),
            stat_card("autoResponded", "Auto-Responded", &display.auto_responded),
            stat_card("avgResponseTime", "Avg Response Time", &display.avg_response_time),
            stat_card("successRate", "Success Rate", &display.success_rate),
        ],
        Variant::Table => [
            stat_card("totalEmails", "Total Emails", &display.total),
            stat_card("autoResponded", "Auto-Responded", &display.auto_responded),
            stat_card("manual", "Manual", &display.manual),
            stat_card("successRate", "Success Rate", &display.success_rate),
        ],
    };
    format!(r#"<div class="stats-grid">{}</div>"#, cards.concat())
}

// ---------------------------------------------------------------------------
// Email list
// ---------------------------------------------------------------------------

fn inquiry_badge(email: &EmailRecord) -> String {
    format!(
        r#"<span class="badge {}">{}</span>"#,
        email.inquiry_key(),
        escape_html(email.inquiry_label())
    )
}

/// One summary card linking to its detail view.
pub fn email_card(index: usize, email: &EmailRecord, now: DateTime<Local>) -> String {
    let mut footer = inquiry_badge(email);
    if email.is_auto_responded() {
        footer.push_str(AUTO_BADGE);
    }
    if let Some(rt) = &email.response_time {
        let _ = write!(footer, r#"<span class="response-time">⏱ {}</span>"#, escape_html(rt));
    }

    format!(
        r#"<a class="email-card" href="/?open={index}">
  <div class="email-card-header">
    <div class="email-from">{from}</div>
    <div class="email-time">{age}</div>
  </div>
  <div class="email-subject">{subject}</div>
  <div class="email-preview">{preview}</div>
  <div class="email-card-footer">{footer}</div>
</a>"#,
        from = escape_html(&email.from),
        age = escape_html(&time_ago(&email.timestamp, now)),
        subject = escape_html(&email.subject),
        preview = escape_html(&preview(&email.body)),
    )
}

/// Card feed, or the empty-state message.
pub fn email_feed(emails: &[EmailRecord], now: DateTime<Local>) -> String {
    if emails.is_empty() {
        return EMPTY_STATE.to_string();
    }
    emails
        .iter()
        .enumerate()
        .map(|(i, email)| email_card(i, email, now))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Admin table, or the empty-state message.
pub fn email_table(emails: &[EmailRecord], now: DateTime<Local>) -> String {
    if emails.is_empty() {
        return EMPTY_STATE.to_string();
    }

    let mut rows = String::new();
    for (i, email) in emails.iter().enumerate() {
        let status = if email.is_auto_responded() {
            AUTO_BADGE.to_string()
        } else {
            escape_html(email.status.as_deref().unwrap_or("Pending"))
        };
        let _ = write!(
            rows,
            r#"<tr><td>{age}</td><td>{from}</td><td>{to}</td><td><a href="/?open={i}">{subject}</a></td><td>{status}</td></tr>"#,
            age = escape_html(&time_ago(&email.timestamp, now)),
            from = escape_html(&email.from),
            to = escape_html(email.to.as_deref().unwrap_or("")),
            subject = escape_html(&email.subject),
        );
    }

    format!(
        r#"<table class="email-table"><thead><tr><th>Time</th><th>From</th><th>To</th><th>Subject</th><th>Status</th></tr></thead><tbody>{rows}</tbody></table>"#
    )
}

// ---------------------------------------------------------------------------
// Detail
// ---------------------------------------------------------------------------

fn detail_section(label: &str, value_html: &str, body: bool) -> String {
    let class = if body {
        "email-detail-value email-detail-body"
    } else {
        "email-detail-value"
    };
    format!(
        r#"<div class="email-detail-section"><div class="email-detail-label">{label}</div><div class="{class}">{value_html}</div></div>"#
    )
}

/// Detail view body for one record.
pub fn email_detail(email: &EmailRecord) -> String {
    let mut status = if email.is_auto_responded() {
        AUTO_BADGE.to_string()
    } else {
        "<span>Pending</span>".to_string()
    };
    if let Some(rt) = &email.response_time {
        let _ = write!(status, " in {}", escape_html(rt));
    }

    let body = if email.body.is_empty() {
        "No message content"
    } else {
        email.body.as_str()
    };

    let mut html = String::new();
    html.push_str(&detail_section("From", &escape_html(&email.from), false));
    if let Some(to) = &email.to {
        html.push_str(&detail_section("To", &escape_html(to), false));
    }
    html.push_str(&detail_section("Subject", &escape_html(&email.subject), false));
    html.push_str(&detail_section(
        "Received",
        &escape_html(&format_datetime(&email.timestamp)),
        false,
    ));
    html.push_str(&detail_section("Inquiry Type", &inquiry_badge(email), false));
    html.push_str(&detail_section("Status", &status, false));
    html.push_str(&detail_section("Message", &escape_html(body), true));
    if let Some(reply) = &email.reply {
        html.push_str(&detail_section("Auto-Response Sent", &escape_html(reply), true));
    }
    html
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Connection indicator: colored dot plus label.
pub fn status_indicator(report: &StatusReport) -> String {
    format!(
        r#"<span class="status-dot {}"></span><span class="status-text">{}</span>"#,
        report.status.css_class(),
        report.label
    )
}

// ---------------------------------------------------------------------------
// Surface
// ---------------------------------------------------------------------------

/// Holds the latest rendered fragments for the dashboard page.
#[derive(Debug, Clone)]
pub struct HtmlSurface {
    variant: Variant,
    stats: String,
    feed: String,
    count: String,
    detail: Option<String>,
    status: String,
    banner: Option<String>,
    last_updated: Option<String>,
}

impl HtmlSurface {
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            stats: stats_panel(variant, &StatsDisplay::placeholder()),
            feed: LOADING_FEED.to_string(),
            count: String::new(),
            detail: None,
            status: String::new(),
            banner: None,
            last_updated: None,
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn stats(&self) -> &str {
        &self.stats
    }

    pub fn feed(&self) -> &str {
        &self.feed
    }

    pub fn count(&self) -> &str {
        &self.count
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn last_updated(&self) -> Option<&str> {
        self.last_updated.as_deref()
    }
}

impl Renderer for HtmlSurface {
    fn render_stats(&mut self, stats: &StatsSummary) {
        self.stats = stats_panel(self.variant, &StatsDisplay::from_stats(stats));
    }

    fn render_email_list(&mut self, emails: &[EmailRecord]) {
        let now = Local::now();
        self.count = count_label(emails.len());
        self.feed = match self.variant {
            Variant::Cards => email_feed(emails, now),
            Variant::Table => email_table(emails, now),
        };
    }

    fn render_detail(&mut self, email: Option<&EmailRecord>) {
        self.detail = email.map(email_detail);
    }

    fn render_status(&mut self, status: &StatusReport) {
        self.status = status_indicator(status);
        self.banner = status.banner.map(escape_html);
        if let Some(label) = status.last_updated_label() {
            self.last_updated = Some(label);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_covers_markup_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn card_shows_optional_indicators_only_when_present() {
        let now = Local::now();
        let mut email = EmailRecord {
            from: "ada@example.com".to_string(),
            subject: "Hi".to_string(),
            body: "Hello".to_string(),
            ..EmailRecord::default()
        };
        let html = email_card(0, &email, now);
        assert!(!html.contains("status-badge"));
        assert!(!html.contains("response-time"));
        assert!(html.contains(r#"<span class="badge general">General</span>"#));
        assert!(html.contains(r#"href="/?open=0""#));

        email.status = Some("Auto-Responded".to_string());
        email.response_time = Some("2s".to_string());
        email.inquiry_type = Some("Support".to_string());
        let html = email_card(3, &email, now);
        assert!(html.contains("✓ Auto-Responded"));
        assert!(html.contains("⏱ 2s"));
        assert!(html.contains(r#"<span class="badge support">Support</span>"#));
        assert!(html.contains(r#"href="/?open=3""#));
    }

    #[test]
    fn detail_shows_pending_and_reply() {
        let email = EmailRecord {
            from: "a@x".to_string(),
            reply: Some("Thanks <3".to_string()),
            ..EmailRecord::default()
        };
        let html = email_detail(&email);
        assert!(html.contains("<span>Pending</span>"));
        assert!(html.contains("No message content"));
        assert!(html.contains("Auto-Response Sent"));
        assert!(html.contains("Thanks &lt;3"));
        assert!(html.contains("Unknown"));
    }

    #[test]
    fn detail_status_includes_response_time() {
        let email = EmailRecord {
            status: Some("Auto-Responded".to_string()),
            response_time: Some("1.5s".to_string()),
            ..EmailRecord::default()
        };
        let html = email_detail(&email);
        assert!(html.contains("✓ Auto-Responded</span> in 1.5s"));
        assert!(!html.contains("Auto-Response Sent"));
    }

    #[test]
    fn table_variant_stats_show_manual() {
        let display = StatsDisplay::from_stats(&StatsSummary {
            manual: Some(7),
            ..StatsSummary::default()
        });
        let html = stats_panel(Variant::Table, &display);
        assert!(html.contains(r#"id="manual">7<"#));
        assert!(!html.contains("avgResponseTime"));
    }

    #[test]
    fn surface_starts_with_placeholders() {
        let surface = HtmlSurface::new(Variant::Cards);
        assert!(surface.stats().contains(r#"id="successRate">--<"#));
        assert!(surface.feed().contains("Loading emails"));
        assert!(surface.detail().is_none());
    }
}
