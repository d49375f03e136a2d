//! Drafting and sending follow-up or manual emails.
//!
//! A submit validates the draft locally, marks the submit control busy for
//! the duration of the network call, reports the outcome as a toast and, on
//! success, closes the form and triggers a fresh poll.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::activity::{ActivityEntry, ActivityKind};
use crate::gateway::{Gateway, OutgoingEmail};
use crate::model::EmailRecord;
use crate::notify::ToastKind;
use crate::poller::Poller;
use crate::render::Renderer;

const REPLY_PREFIX: &str = "Re: ";
const ALREADY_SENDING: &str = "An email is already being sent. Please wait.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DraftKind {
    /// Reply to a received email.
    FollowUp,
    #[default]
    Manual,
}

/// Content of the compose form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    pub kind: DraftKind,
    pub recipient: String,
    pub subject: String,
    pub message: String,
}

impl Draft {
    /// Pre-filled reply to `email`.
    pub fn follow_up(email: &EmailRecord) -> Self {
        Self {
            kind: DraftKind::FollowUp,
            recipient: email.from.clone(),
            subject: format!("{REPLY_PREFIX}{}", email.subject),
            message: String::new(),
        }
    }

    pub fn blank() -> Self {
        Self::default()
    }

    /// Names of required fields that are empty or whitespace.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("recipient", &self.recipient),
            ("subject", &self.subject),
            ("message", &self.message),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn to_outgoing(&self) -> OutgoingEmail {
        OutgoingEmail {
            recipient: self.recipient.trim().to_string(),
            subject: self.subject.clone(),
            message: self.message.clone(),
        }
    }

    fn success_message(&self) -> &'static str {
        match self.kind {
            DraftKind::FollowUp => "Follow-up email sent successfully!",
            DraftKind::Manual => "Email sent successfully!",
        }
    }

    fn fallback_failure(&self) -> &'static str {
        match self.kind {
            DraftKind::FollowUp => "Failed to send follow-up email. Please try again.",
            DraftKind::Manual => "Failed to send email. Please try again.",
        }
    }
}

// ---------------------------------------------------------------------------
// Busy state
// ---------------------------------------------------------------------------

/// The submit control of whatever surface is sending.
pub trait SubmitControls {
    fn set_busy(&mut self, busy: bool);

    /// Enter the busy state, or return `false` if a send already holds it.
    fn try_begin(&mut self) -> bool {
        self.set_busy(true);
        true
    }
}

/// Ends the busy state when dropped, whichever way the send went.
struct BusyGuard<'a, C: SubmitControls + ?Sized> {
    controls: &'a mut C,
}

impl<'a, C: SubmitControls + ?Sized> BusyGuard<'a, C> {
    fn begin(controls: &'a mut C) -> Option<Self> {
        controls.try_begin().then_some(Self { controls })
    }
}

impl<C: SubmitControls + ?Sized> Drop for BusyGuard<'_, C> {
    fn drop(&mut self) {
        self.controls.set_busy(false);
    }
}

/// Busy flag shared with a surface that renders it from another thread.
#[derive(Debug, Clone, Default)]
pub struct SharedBusy(Arc<AtomicBool>);

impl SharedBusy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl SubmitControls for SharedBusy {
    fn set_busy(&mut self, busy: bool) {
        self.0.store(busy, Ordering::SeqCst);
    }

    fn try_begin(&mut self) -> bool {
        self.0
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Sent { message: String },
    /// Rejected locally; nothing was sent.
    Invalid { missing: Vec<&'static str> },
    /// Another send was still in flight; nothing was sent.
    Busy,
    Failed { message: String },
}

impl SendOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }
}

/// Validate and send `draft`, then report through toasts and refresh.
pub fn submit<G, R, C>(poller: &Poller<G, R>, draft: Draft, controls: &mut C) -> SendOutcome
where
    G: Gateway,
    R: Renderer,
    C: SubmitControls + ?Sized,
{
    let missing = draft.missing_fields();
    if !missing.is_empty() {
        let message = format!("Please fill in: {}", missing.join(", "));
        poller.update(|view, _| {
            view.start_compose(draft.clone());
            view.toasts.push(ToastKind::Error, message.clone());
        });
        poller
            .activity()
            .record(&ActivityEntry::now(ActivityKind::Send, "invalid", 0).with_detail(message));
        return SendOutcome::Invalid { missing };
    }

    let outgoing = draft.to_outgoing();
    let started = Instant::now();
    let result = {
        let Some(_busy) = BusyGuard::begin(controls) else {
            poller.update(|view, _| view.toasts.push(ToastKind::Error, ALREADY_SENDING.to_string()));
            poller.activity().record(
                &ActivityEntry::now(ActivityKind::Send, "busy", 0).with_recipient(&outgoing.recipient),
            );
            return SendOutcome::Busy;
        };
        poller.gateway().send_email(&outgoing)
    };
    let duration_ms = started.elapsed().as_millis() as u64;
    let entry = |outcome: &str| {
        ActivityEntry::now(ActivityKind::Send, outcome, duration_ms).with_recipient(&outgoing.recipient)
    };

    match result {
        Ok(receipt) => {
            info!("sent email to {} in {duration_ms}ms", outgoing.recipient);
            let message = draft.success_message().to_string();
            poller.update(|view, _| {
                view.close_compose();
                view.toasts.push(ToastKind::Success, message.clone());
            });
            let mut logged = entry("ok");
            if let Some(note) = receipt.message {
                logged = logged.with_detail(note);
            }
            poller.activity().record(&logged);
            poller.refresh();
            SendOutcome::Sent { message }
        }
        Err(e) => {
            warn!("error sending email to {}: {e}", outgoing.recipient);
            let message = e
                .detail()
                .map(str::to_string)
                .unwrap_or_else(|| draft.fallback_failure().to_string());
            poller.update(|view, _| {
                view.start_compose(draft.clone());
                view.toasts.push(ToastKind::Error, message.clone());
            });
            poller.activity().record(&entry("error").with_detail(e.to_string()));
            SendOutcome::Failed { message }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follow_up_prefills_from_record() {
        let email = EmailRecord {
            from: "ada@example.com".to_string(),
            subject: "Invoice".to_string(),
            ..EmailRecord::default()
        };
        let draft = Draft::follow_up(&email);
        assert_eq!(draft.kind, DraftKind::FollowUp);
        assert_eq!(draft.recipient, "ada@example.com");
        assert_eq!(draft.subject, "Re: Invoice");
        assert!(draft.message.is_empty());
    }

    #[test]
    fn missing_fields_treats_blank_as_missing() {
        let draft = Draft {
            recipient: "  ".to_string(),
            subject: "Hi".to_string(),
            ..Draft::blank()
        };
        assert_eq!(draft.missing_fields(), vec!["recipient", "message"]);
    }

    #[test]
    fn busy_guard_ends_on_drop() {
        let mut busy = SharedBusy::new();
        let observer = busy.clone();
        {
            let _guard = BusyGuard::begin(&mut busy);
            assert!(observer.is_busy());
        }
        assert!(!observer.is_busy());
    }

    #[test]
    fn shared_busy_admits_one_holder() {
        let mut first = SharedBusy::new();
        let mut second = first.clone();
        let guard = BusyGuard::begin(&mut first);
        assert!(guard.is_some());
        assert!(BusyGuard::begin(&mut second).is_none());
        drop(guard);
        assert!(BusyGuard::begin(&mut second).is_some());
    }
}
