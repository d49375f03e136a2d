/// Gateway data model: logged email records and aggregate statistics.
///
/// Both types are read-only snapshots owned by the gateway. The client never
/// mutates them; each successful fetch replaces them wholesale.
///
/// The gateway is spreadsheet-backed, so cell values are loosely typed: a
/// count may arrive as `3` or `"3"`, a response time as `"2.4s"` or `2.4`.
/// Deserialization accepts both shapes and normalizes empty strings to
/// "absent".
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Status value the gateway writes for emails that received an auto-reply.
pub const AUTO_RESPONDED: &str = "Auto-Responded";

/// Display text for records without an inquiry type.
const DEFAULT_INQUIRY: &str = "General";

// ---------------------------------------------------------------------------
// EmailRecord
// ---------------------------------------------------------------------------

/// One logged email (inbound or sent) as returned by `getEmails`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawEmailRecord")]
pub struct EmailRecord {
    pub from: String,
    /// Recipient column, only present in the admin log sheet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    pub subject: String,
    pub body: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inquiry_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<String>,
    /// Text of the auto-response, if one was sent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
}

/// Wire shape of a record. Sheets name the content column `body` or
/// `message`, and some carry both.
#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawEmailRecord {
    #[serde(deserialize_with = "lenient_string")]
    from: String,
    #[serde(deserialize_with = "lenient_opt_string")]
    to: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    subject: String,
    #[serde(deserialize_with = "lenient_opt_string")]
    body: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    message: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    timestamp: String,
    #[serde(deserialize_with = "lenient_opt_string")]
    inquiry_type: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    status: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    response_time: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    reply: Option<String>,
}

impl From<RawEmailRecord> for EmailRecord {
    fn from(raw: RawEmailRecord) -> Self {
        Self {
            from: raw.from,
            to: raw.to,
            subject: raw.subject,
            body: raw.body.or(raw.message).unwrap_or_default(),
            timestamp: raw.timestamp,
            inquiry_type: raw.inquiry_type,
            status: raw.status,
            response_time: raw.response_time,
            reply: raw.reply,
        }
    }
}

impl EmailRecord {
    /// Whether the gateway marked this record as auto-responded.
    pub fn is_auto_responded(&self) -> bool {
        self.status.as_deref() == Some(AUTO_RESPONDED)
    }

    /// Inquiry type as shown to the user (`"General"` when absent).
    pub fn inquiry_label(&self) -> &str {
        self.inquiry_type.as_deref().unwrap_or(DEFAULT_INQUIRY)
    }

    /// Lower-cased inquiry type usable as a style-selector key.
    ///
    /// Anything outside `[a-z0-9-]` is replaced with `-` so the key can be
    /// dropped into a class attribute as-is.
    pub fn inquiry_key(&self) -> String {
        self.inquiry_label()
            .to_lowercase()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' {
                    c
                } else {
                    '-'
                }
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// StatsSummary
// ---------------------------------------------------------------------------

/// Aggregate counters returned by `getStats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsSummary {
    #[serde(
        deserialize_with = "lenient_opt_u64",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_emails: Option<u64>,
    #[serde(
        deserialize_with = "lenient_opt_u64",
        skip_serializing_if = "Option::is_none"
    )]
    pub auto_responded: Option<u64>,
    #[serde(
        deserialize_with = "lenient_opt_u64",
        skip_serializing_if = "Option::is_none"
    )]
    pub manual: Option<u64>,
    #[serde(
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub avg_response_time: Option<String>,
    /// Percentage 0–100. Derived client-side when the gateway omits it.
    #[serde(
        deserialize_with = "lenient_opt_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub success_rate: Option<f64>,
}

// ---------------------------------------------------------------------------
// Lenient field deserializers
// ---------------------------------------------------------------------------

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(value_to_string(Value::deserialize(d)?).unwrap_or_default())
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(value_to_string(Value::deserialize(d)?))
}

fn lenient_opt_u64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(value_to_f64(&value)
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map(|n| n.round() as u64))
}

fn lenient_opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(value_to_f64(&value).filter(|n| n.is_finite()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
