//! Server-rendered dashboard page.
//!
//! The page is assembled from the fragments the [`HtmlSurface`] keeps plus
//! the toasts and compose form held in the view state. Interactions are
//! plain links and form posts, so the page works without scripts.

use std::fmt::Write as _;

use crate::composer::{Draft, DraftKind};
use crate::config::schema::Variant;
use crate::notify::{Toast, ToastKind};
use crate::render::html::{HtmlSurface, escape_html};

/// Everything needed to render one page.
pub struct Page<'a> {
    pub surface: &'a HtmlSurface,
    pub toasts: &'a [Toast],
    pub compose: Option<&'a Draft>,
    /// A send is in flight.
    pub busy: bool,
    /// Reload interval for the periodic variant.
    pub reload_secs: Option<u64>,
}

const STYLE: &str = r#"
:root {
  --bg: #0d1117;
  --surface: #161b22;
  --border: #30363d;
  --text: #e6edf3;
  --text-muted: #8b949e;
  --accent: #58a6ff;
  --green: #3fb950;
  --yellow: #d29922;
  --red: #f85149;
  --purple: #bc8cff;
  --cyan: #39d2c0;
  --radius: 8px;
  --font: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
}

* { margin: 0; padding: 0; box-sizing: border-box; }
body { background: var(--bg); color: var(--text); font-family: var(--font); font-size: 14px; line-height: 1.5; }
a { color: inherit; text-decoration: none; }

.app { max-width: 1200px; margin: 0 auto; padding: 24px; }
header { display: flex; align-items: center; justify-content: space-between; margin-bottom: 24px; padding-bottom: 16px; border-bottom: 1px solid var(--border); }
header h1 { font-size: 24px; font-weight: 600; }
.header-actions { display: flex; align-items: center; gap: 12px; }
.connection { display: flex; align-items: center; gap: 6px; color: var(--text-muted); }
.status-dot { width: 10px; height: 10px; border-radius: 50%; background: var(--yellow); }
.status-dot.connected { background: var(--green); }
.status-dot.error { background: var(--red); }
.last-updated { color: var(--text-muted); font-size: 12px; }

.btn { background: var(--surface); color: var(--text); border: 1px solid var(--border); border-radius: var(--radius); padding: 6px 14px; cursor: pointer; font: inherit; }
.btn:hover { border-color: var(--accent); }
.btn-primary { background: var(--accent); color: #0d1117; border-color: var(--accent); }
.btn[disabled] { opacity: 0.5; cursor: default; }

.error-banner { display: flex; justify-content: space-between; align-items: center; background: rgba(248, 81, 73, 0.1); border: 1px solid var(--red); color: var(--red); border-radius: var(--radius); padding: 12px 16px; margin-bottom: 24px; }

.stats-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 16px; margin-bottom: 24px; }
.stat-card { background: var(--surface); border: 1px solid var(--border); border-radius: var(--radius); padding: 16px; }
.stat-label { color: var(--text-muted); font-size: 12px; text-transform: uppercase; letter-spacing: 0.5px; }
.stat-value { font-size: 28px; font-weight: 600; }

.feed-header { display: flex; justify-content: space-between; align-items: baseline; margin-bottom: 12px; }
.feed-header h2 { font-size: 18px; }
.email-count { color: var(--text-muted); }
.email-card { display: block; background: var(--surface); border: 1px solid var(--border); border-radius: var(--radius); padding: 16px; margin-bottom: 12px; }
.email-card:hover { border-color: var(--accent); }
.email-card-header { display: flex; justify-content: space-between; }
.email-from { font-weight: 600; }
.email-time, .email-preview { color: var(--text-muted); }
.email-subject { margin: 4px 0; }
.email-card-footer { display: flex; gap: 8px; margin-top: 8px; font-size: 12px; }
.badge { border: 1px solid var(--border); border-radius: 12px; padding: 0 8px; color: var(--purple); }
.status-badge { color: var(--green); }
.response-time { color: var(--cyan); }

.email-table { width: 100%; border-collapse: collapse; background: var(--surface); }
.email-table th, .email-table td { text-align: left; padding: 8px 12px; border-bottom: 1px solid var(--border); }
.email-table th { color: var(--text-muted); font-weight: 500; }
.email-table a { color: var(--accent); }

.empty-state, .loading-spinner { text-align: center; color: var(--text-muted); padding: 48px 0; }
.empty-state-icon { font-size: 40px; }

.modal-overlay { position: fixed; inset: 0; background: rgba(0, 0, 0, 0.6); display: flex; align-items: center; justify-content: center; }
.modal { background: var(--surface); border: 1px solid var(--border); border-radius: var(--radius); width: min(640px, 92vw); max-height: 88vh; overflow-y: auto; }
.modal-header, .modal-footer { display: flex; justify-content: space-between; align-items: center; padding: 16px; border-bottom: 1px solid var(--border); }
.modal-footer { border-bottom: none; border-top: 1px solid var(--border); justify-content: flex-end; gap: 8px; }
.modal-body { padding: 16px; }
.email-detail-section { margin-bottom: 12px; }
.email-detail-label { color: var(--text-muted); font-size: 12px; text-transform: uppercase; }
.email-detail-body { white-space: pre-wrap; background: var(--bg); border-radius: var(--radius); padding: 12px; }
.form-group { margin-bottom: 12px; display: flex; flex-direction: column; gap: 4px; }
.form-group input, .form-group textarea { background: var(--bg); color: var(--text); border: 1px solid var(--border); border-radius: var(--radius); padding: 8px; font: inherit; }
.form-group textarea { min-height: 160px; }

.toast-container { position: fixed; bottom: 24px; right: 24px; display: flex; flex-direction: column; gap: 8px; }
.toast { display: flex; align-items: center; gap: 8px; background: var(--surface); border: 1px solid var(--border); border-radius: var(--radius); padding: 10px 14px; }
.toast-success { border-color: var(--green); }
.toast-error { border-color: var(--red); }
.toast-close { background: none; border: none; color: var(--text-muted); cursor: pointer; font-size: 16px; }
"#;

fn toast_html(toast: &Toast) -> String {
    let kind = match toast.kind {
        ToastKind::Success => "success",
        ToastKind::Error => "error",
    };
    format!(
        r#"<div class="toast toast-{kind}"><span class="toast-icon">{icon}</span><span class="toast-message">{message}</span><form method="post" action="/toasts/dismiss"><input type="hidden" name="id" value="{id}"><button class="toast-close" type="submit">×</button></form></div>"#,
        icon = toast.kind.icon(),
        message = escape_html(&toast.message),
        id = toast.id,
    )
}

fn detail_modal(detail: &str) -> String {
    format!(
        r#"<div class="modal-overlay"><div class="modal">
  <div class="modal-header"><h3>Email Details</h3><form method="post" action="/close"><button class="btn" type="submit">×</button></form></div>
  <div class="modal-body">{detail}</div>
  <div class="modal-footer">
    <form method="post" action="/close"><button class="btn" type="submit">Close</button></form>
    <a class="btn btn-primary" href="/compose?follow_up=1">Send Follow-up</a>
  </div>
</div></div>"#
    )
}

fn compose_modal(draft: &Draft, busy: bool) -> String {
    let (title, kind) = match draft.kind {
        DraftKind::FollowUp => ("Send Follow-up Email", "follow-up"),
        DraftKind::Manual => ("Compose Email", "manual"),
    };
    let submit = if busy {
        r#"<button class="btn btn-primary" type="submit" disabled>Sending...</button>"#
    } else {
        r#"<button class="btn btn-primary" type="submit">Send Email</button>"#
    };
    format!(
        r#"<div class="modal-overlay"><div class="modal">
  <div class="modal-header"><h3>{title}</h3><form method="post" action="/close"><button class="btn" type="submit">×</button></form></div>
  <form method="post" action="/send">
    <div class="modal-body">
      <input type="hidden" name="kind" value="{kind}">
      <div class="form-group"><label for="recipient">To</label><input id="recipient" name="recipient" type="email" required value="{recipient}"></div>
      <div class="form-group"><label for="subject">Subject</label><input id="subject" name="subject" required value="{subject}"></div>
      <div class="form-group"><label for="message">Message</label><textarea id="message" name="message" required>{message}</textarea></div>
    </div>
    <div class="modal-footer">{submit}</div>
  </form>
</div></div>"#,
        recipient = escape_html(&draft.recipient),
        subject = escape_html(&draft.subject),
        message = escape_html(&draft.message),
    )
}

/// Render the full dashboard page.
pub fn render_page(page: &Page<'_>) -> String {
    let surface = page.surface;
    let (title, feed_title) = match surface.variant() {
        Variant::Cards => ("Email Dashboard", "Recent Emails"),
        Variant::Table => ("Email Admin", "All Emails"),
    };

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    if let Some(secs) = page.reload_secs {
        let _ = writeln!(html, "<meta http-equiv=\"refresh\" content=\"{secs}\">");
    }
    let _ = writeln!(html, "<title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<div class=\"app\">");

    let _ = write!(
        html,
        r#"<header>
  <h1>{title}</h1>
  <div class="header-actions">
    <div class="connection">{status}</div>
    <span class="last-updated">{updated}</span>
    <form method="post" action="/refresh"><button class="btn" type="submit">↻ Refresh</button></form>
    <a class="btn btn-primary" href="/compose">Compose</a>
  </div>
</header>
"#,
        status = surface.status(),
        updated = surface.last_updated().map(escape_html).unwrap_or_default(),
    );

    if let Some(banner) = surface.banner() {
        let _ = write!(
            html,
            r#"<div class="error-banner"><span>{banner}</span><form method="post" action="/refresh"><button class="btn" type="submit">Retry</button></form></div>
"#
        );
    }

    html.push_str(surface.stats());
    let _ = write!(
        html,
        r#"
<section>
  <div class="feed-header"><h2>{feed_title}</h2><span class="email-count">{count}</span></div>
  <div class="email-feed">{feed}</div>
</section>
</div>
"#,
        count = surface.count(),
        feed = surface.feed(),
    );

    if let Some(detail) = surface.detail() {
        html.push_str(&detail_modal(detail));
    }
    if let Some(draft) = page.compose {
        html.push_str(&compose_modal(draft, page.busy));
    }

    if !page.toasts.is_empty() {
        html.push_str(r#"<div class="toast-container">"#);
        for toast in page.toasts {
            html.push_str(&toast_html(toast));
        }
        html.push_str("</div>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}
