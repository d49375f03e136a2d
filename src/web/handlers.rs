//! Route handlers for the dashboard.
//!
//! Handlers act on the shared poller and return a [`Reply`]; the server
//! loop turns that into a `tiny_http` response. Mutating routes answer with
//! a `303 See Other` back to the page.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::composer::{self, Draft, DraftKind, SendOutcome};
use crate::config::schema::Variant;
use crate::gateway::Gateway;
use crate::view::ViewSnapshot;

use super::frontend::{Page, render_page};
use super::{Dashboard, Reply};

// ---------------------------------------------------------------------------
// JSON response types
// ---------------------------------------------------------------------------

/// `GET /api/state` body.
#[derive(Serialize)]
struct StateResponse {
    variant: Variant,
    busy: bool,
    #[serde(flatten)]
    view: ViewSnapshot,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn json_response<T: Serialize>(data: &T) -> Result<Reply> {
    let body = serde_json::to_string(data).context("failed to serialize JSON response")?;
    Ok(Reply::Json { status: 200, body })
}

fn back_to_page() -> Reply {
    Reply::Redirect("/".to_string())
}

/// Value of `key` in a query string or form body.
fn form_value(encoded: &str, key: &str) -> Option<String> {
    url::form_urlencoded::parse(encoded.as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// Value of `key` in the URL's query string.
fn query_value(url: &str, key: &str) -> Option<String> {
    form_value(url.split_once('?')?.1, key)
}

/// Draft from a submitted compose form.
fn draft_from_form(body: &str) -> Draft {
    let field = |key| form_value(body, key).unwrap_or_default();
    let kind = match form_value(body, "kind").as_deref() {
        Some("follow-up") => DraftKind::FollowUp,
        _ => DraftKind::Manual,
    };
    Draft {
        kind,
        recipient: field("recipient"),
        subject: field("subject"),
        message: field("message"),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /` — the dashboard page; `?open=N` opens detail N first.
pub fn index<G: Gateway>(dashboard: &Dashboard<G>, url: &str) -> Result<Reply> {
    if let Some(open) = query_value(url, "open") {
        match open.parse::<usize>() {
            Ok(index) => {
                dashboard.poller().open_detail(index);
            }
            Err(_) => dashboard.poller().close_detail(),
        }
        return Ok(back_to_page());
    }

    dashboard.poller().rerender();
    let busy = dashboard.is_busy();
    let reload_secs = dashboard.reload_secs();
    let html = dashboard.poller().update(|view, surface| {
        view.toasts.prune(Utc::now());
        let toasts: Vec<_> = view.toasts.iter().cloned().collect();
        render_page(&Page {
            surface: &*surface,
            toasts: &toasts,
            compose: view.compose(),
            busy,
            reload_secs,
        })
    });
    Ok(Reply::Html(html))
}

/// `POST /refresh` — manual refresh, also used by the banner's retry.
pub fn refresh<G: Gateway>(dashboard: &Dashboard<G>) -> Result<Reply> {
    dashboard.poller().dismiss_banner();
    dashboard.poller().refresh();
    Ok(back_to_page())
}

/// `POST /close` — close the compose form if open, otherwise the detail view.
pub fn close<G: Gateway>(dashboard: &Dashboard<G>) -> Result<Reply> {
    let closed_compose = dashboard.poller().update(|view, _| {
        let open = view.compose().is_some();
        view.close_compose();
        open
    });
    if !closed_compose {
        dashboard.poller().close_detail();
    }
    Ok(back_to_page())
}

/// `GET /compose` — open the compose form; `?follow_up=1` replies to the
/// open record.
pub fn compose<G: Gateway>(dashboard: &Dashboard<G>, url: &str) -> Result<Reply> {
    let follow_up = query_value(url, "follow_up").is_some_and(|v| v == "1");
    dashboard.poller().update(|view, _| {
        let draft = view
            .open_record()
            .filter(|_| follow_up)
            .map(Draft::follow_up)
            .unwrap_or_else(Draft::blank);
        view.start_compose(draft);
    });
    Ok(back_to_page())
}

/// `POST /send` — submit the compose form.
pub fn send<G: Gateway>(dashboard: &Dashboard<G>, body: &str) -> Result<Reply> {
    let draft = draft_from_form(body);
    let mut busy = dashboard.busy_handle();
    match composer::submit(dashboard.poller(), draft, &mut busy) {
        SendOutcome::Sent { .. } => {}
        SendOutcome::Invalid { missing } => log::debug!("send rejected, missing {missing:?}"),
        SendOutcome::Busy => log::debug!("send rejected, another send in flight"),
        SendOutcome::Failed { message } => log::debug!("send failed: {message}"),
    }
    Ok(back_to_page())
}

/// `POST /toasts/dismiss` — dismiss toast `id`.
pub fn dismiss_toast<G: Gateway>(dashboard: &Dashboard<G>, body: &str) -> Result<Reply> {
    if let Some(id) = form_value(body, "id").and_then(|v| v.parse::<u64>().ok()) {
        dashboard.poller().update(|view, _| view.toasts.dismiss(id));
    }
    Ok(back_to_page())
}

/// `GET /api/state` — JSON snapshot of the view state.
pub fn state<G: Gateway>(dashboard: &Dashboard<G>) -> Result<Reply> {
    let view = dashboard.poller().view(|view| view.snapshot(Utc::now()));
    json_response(&StateResponse {
        variant: dashboard.variant(),
        busy: dashboard.is_busy(),
        view,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
