/// `ureq`-backed gateway client.
///
/// One blocking agent per client, reused across calls. Redirects are
/// followed, which the spreadsheet-script host relies on: every call answers
/// with a redirect to the actual content URL.
use std::time::Duration;

use log::{debug, warn};
use serde::Deserialize;

use super::{Gateway, GatewayError, OutgoingEmail, SendReceipt};
use crate::config::schema::GatewayConfig;
use crate::model::{EmailRecord, StatsSummary};

/// Maximum number of redirects to follow per request.
const MAX_REDIRECTS: u32 = 8;

// ---------------------------------------------------------------------------
// Response envelope
// ---------------------------------------------------------------------------

/// Common shape of every gateway response body.
///
/// Only one payload field is meaningful per action; the rest stay `None`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Envelope {
    success: bool,
    stats: Option<StatsSummary>,
    emails: Option<Vec<EmailRecord>>,
    message: Option<String>,
    error: Option<String>,
}

impl Envelope {
    /// Failure explanation, preferring `error` over `message`.
    fn failure_detail(self) -> Option<String> {
        self.error
            .or(self.message)
            .filter(|s| !s.trim().is_empty())
    }
}

impl From<ureq::Error> for GatewayError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, resp) => {
                let detail = resp
                    .into_json::<Envelope>()
                    .ok()
                    .and_then(Envelope::failure_detail);
                GatewayError::Status { code, detail }
            }
            ureq::Error::Transport(transport) => GatewayError::Transport(transport.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Synchronous HTTP client for the gateway endpoint.
#[derive(Debug)]
pub struct HttpGateway {
    base_url: String,
    timeout: Duration,
    agent: ureq::Agent,
}

impl HttpGateway {
    /// Build a client from the resolved gateway config.
    pub fn from_config(config: &GatewayConfig) -> Self {
        let timeout = Duration::from_millis(config.timeout_ms);
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .redirects(MAX_REDIRECTS)
            .build();
        Self {
            base_url: config.url.trim().to_string(),
            timeout,
            agent,
        }
    }

    /// The endpoint URL, for diagnostics.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Issue a read action and return its envelope once `success` is confirmed.
    fn read(&self, action: &str) -> Result<Envelope, GatewayError> {
        debug!("GET {}?action={action}", self.base_url);

        let resp = self
            .agent
            .get(&self.base_url)
            .query("action", action)
            .call()?;

        debug!("{action} response status: {}", resp.status());
        let envelope = parse_envelope(resp)?;

        if !envelope.success {
            let detail = envelope.failure_detail();
            warn!("{action} reported failure: {detail:?}");
            return Err(GatewayError::Application { detail });
        }

        Ok(envelope)
    }
}

/// Reject non-2xx responses that slipped through redirect handling, then parse.
fn parse_envelope(resp: ureq::Response) -> Result<Envelope, GatewayError> {
    let code = resp.status();
    if !(200..300).contains(&code) {
        return Err(GatewayError::Status { code, detail: None });
    }

    resp.into_json::<Envelope>()
        .map_err(|e| GatewayError::Malformed(e.to_string()))
}

impl Gateway for HttpGateway {
    fn get_stats(&self) -> Result<StatsSummary, GatewayError> {
        let envelope = self.read("getStats")?;
        envelope
            .stats
            .ok_or_else(|| GatewayError::Malformed("response has no `stats` field".to_string()))
    }

    fn get_emails(&self) -> Result<Vec<EmailRecord>, GatewayError> {
        let envelope = self.read("getEmails")?;
        let emails = envelope
            .emails
            .ok_or_else(|| GatewayError::Malformed("response has no `emails` field".to_string()))?;
        debug!("getEmails returned {} records", emails.len());
        Ok(emails)
    }

    fn send_email(&self, email: &OutgoingEmail) -> Result<SendReceipt, GatewayError> {
        debug!(
            "POST {} action=sendEmail recipient={}",
            self.base_url, email.recipient
        );

        let resp = self.agent.post(&self.base_url).send_form(&[
            ("action", "sendEmail"),
            ("recipient", email.recipient.as_str()),
            ("subject", email.subject.as_str()),
            ("message", email.message.as_str()),
        ])?;

        debug!("sendEmail response status: {}", resp.status());
        let envelope = parse_envelope(resp)?;

        if envelope.success {
            Ok(SendReceipt {
                message: envelope.message,
            })
        } else {
            Err(GatewayError::Application {
                detail: envelope.failure_detail(),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
