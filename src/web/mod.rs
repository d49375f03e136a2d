//! Local web dashboard for mailboard.
//!
//! A lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - the server-rendered dashboard page, in the configured variant
//! - form endpoints for refresh, detail, compose and toasts
//! - a JSON snapshot of the view state
//!
//! Launched via `mailboard serve` (default: `http://127.0.0.1:9747`).

mod frontend;
mod handlers;

use std::io::{Cursor, Read};
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{info, warn};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

use crate::activity::ActivityLog;
use crate::composer::SharedBusy;
use crate::config::MailboardConfig;
use crate::config::schema::{RefreshMode, Variant};
use crate::gateway::Gateway;
use crate::poller::{Poller, PollerOptions};
use crate::render::html::HtmlSurface;
use crate::timer::RefreshTimer;

/// What a handler wants sent back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Html(String),
    Json { status: u16, body: String },
    /// `303 See Other` to the given location.
    Redirect(String),
}

/// Shared state behind every request.
pub struct Dashboard<G> {
    poller: Arc<Poller<G, HtmlSurface>>,
    variant: Variant,
    busy: SharedBusy,
    reload_secs: Option<u64>,
}

impl<G: Gateway> Dashboard<G> {
    pub fn new(poller: Arc<Poller<G, HtmlSurface>>, variant: Variant, reload_secs: Option<u64>) -> Self {
        Self {
            poller,
            variant,
            busy: SharedBusy::new(),
            reload_secs,
        }
    }

    pub fn poller(&self) -> &Poller<G, HtmlSurface> {
        &self.poller
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn reload_secs(&self) -> Option<u64> {
        self.reload_secs
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    fn busy_handle(&self) -> SharedBusy {
        self.busy.clone()
    }

    /// Route one request.
    pub fn dispatch(&self, method: &Method, url: &str, body: Option<&str>) -> Result<Reply> {
        let path = url.split('?').next().unwrap_or(url);
        let body = body.unwrap_or("");

        match (method, path) {
            (&Method::Get, "/") | (&Method::Get, "/index.html") => handlers::index(self, url),
            (&Method::Post, "/refresh") => handlers::refresh(self),
            (&Method::Post, "/close") => handlers::close(self),
            (&Method::Get, "/compose") => handlers::compose(self, url),
            (&Method::Post, "/send") => handlers::send(self, body),
            (&Method::Post, "/toasts/dismiss") => handlers::dismiss_toast(self, body),
            (&Method::Get, "/api/state") => handlers::state(self),
            _ => Ok(not_found()),
        }
    }
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the dashboard server and block until Ctrl+C.
///
/// Each request runs on its own thread so a slow send does not hold up the
/// page. Handler errors become JSON 500 responses.
pub fn serve<G: Gateway + 'static>(config: &MailboardConfig, gateway: G, activity: ActivityLog) -> Result<()> {
    let addr = config.dashboard.addr.as_str();
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;
    let server = Arc::new(server);

    let variant = config.dashboard.variant;
    let periodic = config.refresh_mode() == RefreshMode::Periodic;
    let interval = config.refresh_interval();

    let poller = Arc::new(
        Poller::new(gateway, HtmlSurface::new(variant), PollerOptions::from_config(config))
            .with_activity_log(activity),
    );
    let dashboard = Dashboard::new(
        Arc::clone(&poller),
        variant,
        periodic.then(|| interval.as_secs()),
    );

    {
        let server = Arc::clone(&server);
        if let Err(e) = ctrlc::set_handler(move || server.unblock()) {
            warn!("could not install Ctrl+C handler: {e}");
        }
    }

    // First load runs in the background so the page shows "Connecting...".
    {
        let poller = Arc::clone(&poller);
        std::thread::spawn(move || {
            poller.refresh();
        });
    }

    let mut timer = RefreshTimer::new();
    if periodic {
        let poller = Arc::clone(&poller);
        timer.start(interval, move || {
            poller.refresh();
        });
    }

    println!("mailboard dashboard running at http://{addr} ({variant} view)");
    println!("Press Ctrl+C to stop.\n");

    if config.dashboard.open_browser {
        let url = format!("http://{addr}");
        if let Err(e) = open_browser(&url) {
            warn!("{e:#}");
        }
    }

    let dashboard = Arc::new(dashboard);
    for request in server.incoming_requests() {
        // A send blocks on the gateway; the page keeps rendering meanwhile.
        let dashboard = Arc::clone(&dashboard);
        std::thread::spawn(move || handle(&dashboard, request));
    }

    timer.cancel();
    println!("mailboard dashboard stopped");
    Ok(())
}

fn handle<G: Gateway>(dashboard: &Dashboard<G>, mut request: Request) {
    let method = request.method().clone();
    let url = request.url().to_string();

    let reply = match read_body(&method, request.as_reader()) {
        Ok(body) => dispatch_or_error(dashboard, &method, &url, body.as_deref()),
        Err(e) => {
            warn!("{method} {url}: unreadable request body: {e}");
            bad_request("request body must be UTF-8 form data")
        }
    };
    let status = reply_status(&reply);
    let _ = request.respond(into_response(reply));

    info!("{method} {url} {status}");
}

/// Body for methods that carry one, `None` otherwise.
fn read_body(method: &Method, reader: &mut dyn Read) -> std::io::Result<Option<String>> {
    if !matches!(method, Method::Put | Method::Post | Method::Patch) {
        return Ok(None);
    }
    let mut buf = String::new();
    reader.read_to_string(&mut buf)?;
    Ok(Some(buf))
}

/// Dispatch, turning handler errors into a JSON 500.
pub fn dispatch_or_error<G: Gateway>(
    dashboard: &Dashboard<G>,
    method: &Method,
    url: &str,
    body: Option<&str>,
) -> Reply {
    dashboard.dispatch(method, url, body).unwrap_or_else(|e| {
        warn!("{method} {url} failed: {e:#}");
        Reply::Json {
            status: 500,
            body: serde_json::json!({ "error": e.to_string() }).to_string(),
        }
    })
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn bad_request(message: &str) -> Reply {
    Reply::Json {
        status: 400,
        body: serde_json::json!({ "error": message }).to_string(),
    }
}

fn not_found() -> Reply {
    Reply::Json {
        status: 404,
        body: r#"{"error": "not found"}"#.to_string(),
    }
}

fn reply_status(reply: &Reply) -> u16 {
    match reply {
        Reply::Html(_) => 200,
        Reply::Json { status, .. } => *status,
        Reply::Redirect(_) => 303,
    }
}

fn with_header(
    response: Response<Cursor<Vec<u8>>>,
    name: &str,
    value: &str,
) -> Response<Cursor<Vec<u8>>> {
    match Header::from_bytes(name.as_bytes(), value.as_bytes()) {
        Ok(header) => response.with_header(header),
        Err(()) => response,
    }
}

fn into_response(reply: Reply) -> Response<Cursor<Vec<u8>>> {
    let status = reply_status(&reply);
    let response = match reply {
        Reply::Html(html) => with_header(
            Response::from_data(html.into_bytes()),
            "Content-Type",
            "text/html; charset=utf-8",
        ),
        Reply::Json { body, .. } => with_header(
            Response::from_data(body.into_bytes()),
            "Content-Type",
            "application/json; charset=utf-8",
        ),
        Reply::Redirect(location) => with_header(Response::from_data(Vec::new()), "Location", &location),
    };
    response.with_status_code(StatusCode(status))
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::gateway::{GatewayError, OutgoingEmail, SendReceipt};
    use crate::model::{EmailRecord, StatsSummary};

    struct StubGateway;

    impl Gateway for StubGateway {
        fn get_stats(&self) -> Result<StatsSummary, GatewayError> {
            Ok(StatsSummary {
                total_emails: Some(1),
                auto_responded: Some(1),
                ..StatsSummary::default()
            })
        }

        fn get_emails(&self) -> Result<Vec<EmailRecord>, GatewayError> {
            Ok(vec![EmailRecord {
                from: "ada@example.com".to_string(),
                subject: "<script>alert(1)</script>".to_string(),
                ..EmailRecord::default()
            }])
        }

        fn send_email(&self, _email: &OutgoingEmail) -> Result<SendReceipt, GatewayError> {
            Err(GatewayError::Application {
                detail: Some("quota exceeded".to_string()),
            })
        }
    }

    fn dashboard() -> Dashboard<StubGateway> {
        let poller = Poller::new(StubGateway, HtmlSurface::new(Variant::Cards), PollerOptions::default());
        Dashboard::new(Arc::new(poller), Variant::Cards, Some(30))
    }

    fn html(reply: Reply) -> String {
        match reply {
            Reply::Html(html) => html,
            other => panic!("expected html, got {other:?}"),
        }
    }

    #[test]
    fn unknown_route_is_404() {
        let d = dashboard();
        let reply = d.dispatch(&Method::Get, "/nope", None).unwrap();
        assert_eq!(reply_status(&reply), 404);
    }

    #[test]
    fn page_before_first_load_shows_placeholders() {
        let d = dashboard();
        let page = html(d.dispatch(&Method::Get, "/", None).unwrap());
        assert!(page.contains("Connecting..."));
        assert!(page.contains("Loading emails..."));
        assert!(page.contains(r#"http-equiv="refresh" content="30""#));
    }

    #[test]
    fn page_after_refresh_is_escaped() {
        let d = dashboard();
        let reply = d.dispatch(&Method::Post, "/refresh", Some("")).unwrap();
        assert_eq!(reply, Reply::Redirect("/".to_string()));
        let page = html(d.dispatch(&Method::Get, "/", None).unwrap());
        assert!(page.contains("1 email"));
        assert!(page.contains("&lt;script&gt;"));
        assert!(!page.contains("<script>alert"));
    }

    #[test]
    fn open_then_follow_up_prefills_compose() {
        let d = dashboard();
        d.poller().refresh();
        d.dispatch(&Method::Get, "/?open=0", None).unwrap();
        d.dispatch(&Method::Get, "/compose?follow_up=1", None).unwrap();
        let draft = d.poller().view(|v| v.compose().cloned()).unwrap();
        assert_eq!(draft.recipient, "ada@example.com");
        assert!(draft.subject.starts_with("Re: "));
    }

    #[test]
    fn failed_send_keeps_form_and_shows_detail() {
        let d = dashboard();
        d.dispatch(
            &Method::Post,
            "/send",
            Some("recipient=a%40b.c&subject=Hi&message=Hello"),
        )
        .unwrap();
        assert!(!d.is_busy());
        let page = html(d.dispatch(&Method::Get, "/", None).unwrap());
        assert!(page.contains("quota exceeded"));
        assert!(page.contains("Compose Email"));
    }

    #[test]
    fn state_endpoint_serializes_snapshot() {
        let d = dashboard();
        d.poller().refresh();
        match d.dispatch(&Method::Get, "/api/state", None).unwrap() {
            Reply::Json { status, body } => {
                assert_eq!(status, 200);
                let value: serde_json::Value = serde_json::from_str(&body).unwrap();
                assert_eq!(value["variant"], "cards");
                assert_eq!(value["emails"].as_array().unwrap().len(), 1);
                assert_eq!(value["busy"], false);
            }
            other => panic!("expected json, got {other:?}"),
        }
    }

    /// Accepts every send after a delay, counting calls.
    #[derive(Default)]
    struct SlowOutbox {
        sends: AtomicUsize,
    }

    impl Gateway for SlowOutbox {
        fn get_stats(&self) -> Result<StatsSummary, GatewayError> {
            Ok(StatsSummary::default())
        }

        fn get_emails(&self) -> Result<Vec<EmailRecord>, GatewayError> {
            Ok(Vec::new())
        }

        fn send_email(&self, _email: &OutgoingEmail) -> Result<SendReceipt, GatewayError> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(300));
            Ok(SendReceipt::default())
        }
    }

    const FORM: &str = "recipient=a%40b.c&subject=Hi&message=Hello";

    #[test]
    fn second_send_is_refused_while_first_is_in_flight() {
        let poller = Poller::new(SlowOutbox::default(), HtmlSurface::new(Variant::Cards), PollerOptions::default());
        let d = Arc::new(Dashboard::new(Arc::new(poller), Variant::Cards, None));

        let first = {
            let d = Arc::clone(&d);
            std::thread::spawn(move || d.dispatch(&Method::Post, "/send", Some(FORM)).unwrap())
        };
        std::thread::sleep(Duration::from_millis(50));
        assert!(d.is_busy());
        d.poller().update(|view, _| view.start_compose(crate::composer::Draft::blank()));
        let page = html(d.dispatch(&Method::Get, "/", None).unwrap());
        assert!(page.contains("Sending..."));

        let second = d.dispatch(&Method::Post, "/send", Some(FORM)).unwrap();
        assert_eq!(second, Reply::Redirect("/".to_string()));
        first.join().unwrap();

        assert_eq!(d.poller().gateway().sends.load(Ordering::SeqCst), 1);
        assert!(!d.is_busy());
        let messages: Vec<String> = d
            .poller()
            .view(|v| v.toasts.iter().map(|t| t.message.clone()).collect());
        assert!(messages.iter().any(|m| m.contains("already being sent")));
        assert!(messages.iter().any(|m| m == "Email sent successfully!"));
    }

    #[test]
    fn non_utf8_body_is_rejected() {
        let mut bytes: &[u8] = &[b'a', 0xff, 0xfe];
        assert!(read_body(&Method::Post, &mut bytes).is_err());

        let mut form: &[u8] = FORM.as_bytes();
        assert_eq!(read_body(&Method::Post, &mut form).unwrap().as_deref(), Some(FORM));
        let mut ignored: &[u8] = &[0xff];
        assert_eq!(read_body(&Method::Get, &mut ignored).unwrap(), None);
        assert_eq!(reply_status(&bad_request("x")), 400);
    }
}
