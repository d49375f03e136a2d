//! Client side of the remote email gateway.
//!
//! The gateway is a single HTTP endpoint exposing three actions:
//!
//! | Action      | Method | Payload                                      |
//! |-------------|--------|----------------------------------------------|
//! | `getStats`  | GET    | `?action=getStats`                           |
//! | `getEmails` | GET    | `?action=getEmails`                          |
//! | `sendEmail` | POST   | form `action=sendEmail&recipient&subject&message` |
//!
//! [`Gateway`] is the seam the poller and composer talk to; [`HttpGateway`]
//! is the real `ureq`-backed implementation. Tests substitute in-memory fakes.

pub mod error;
pub mod http;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::model::{EmailRecord, StatsSummary};

pub use error::GatewayError;
pub use http::HttpGateway;

/// An email to hand to the gateway's `sendEmail` action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingEmail {
    pub recipient: String,
    pub subject: String,
    pub message: String,
}

/// Acknowledgement returned by a successful send.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendReceipt {
    /// Optional confirmation text from the gateway.
    pub message: Option<String>,
}

/// The three gateway operations.
///
/// Implementations must be shareable across threads: the poller issues both
/// reads concurrently and the refresh timer calls in from its own thread.
pub trait Gateway: Send + Sync {
    fn get_stats(&self) -> Result<StatsSummary, GatewayError>;
    fn get_emails(&self) -> Result<Vec<EmailRecord>, GatewayError>;
    fn send_email(&self, email: &OutgoingEmail) -> Result<SendReceipt, GatewayError>;
}

impl<G: Gateway + ?Sized> Gateway for Arc<G> {
    fn get_stats(&self) -> Result<StatsSummary, GatewayError> {
        (**self).get_stats()
    }

    fn get_emails(&self) -> Result<Vec<EmailRecord>, GatewayError> {
        (**self).get_emails()
    }

    fn send_email(&self, email: &OutgoingEmail) -> Result<SendReceipt, GatewayError> {
        (**self).send_email(email)
    }
}
