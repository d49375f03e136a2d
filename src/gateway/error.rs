/// Gateway failure taxonomy.
///
/// Every variant is treated the same way by the callers: reads collapse into
/// "data unavailable", sends into "action failed". The distinction exists for
/// logs and for surfacing the gateway's own explanation when it gave one.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Unreachable host, DNS failure, timeout, TLS error.
    #[error("gateway unreachable: {0}")]
    Transport(String),

    /// Non-2xx HTTP status.
    #[error("gateway returned HTTP {code}")]
    Status { code: u16, detail: Option<String> },

    /// Body parsed but reported `success: false`.
    #[error("gateway reported failure{}", .detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default())]
    Application { detail: Option<String> },

    /// Body missing, not JSON, or missing the expected payload field.
    #[error("malformed gateway response: {0}")]
    Malformed(String),
}

impl GatewayError {
    /// Human-readable explanation provided by the gateway itself, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Status { detail, .. } | Self::Application { detail } => detail.as_deref(),
            Self::Transport(_) | Self::Malformed(_) => None,
        }
    }

    /// Short machine-friendly kind for the activity log.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Status { .. } => "status",
            Self::Application { .. } => "application",
            Self::Malformed(_) => "malformed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_only_comes_from_gateway_bodies() {
        let err = GatewayError::Application {
            detail: Some("quota exceeded".to_string()),
        };
        assert_eq!(err.detail(), Some("quota exceeded"));
        assert_eq!(err.to_string(), "gateway reported failure: quota exceeded");

        let err = GatewayError::Application { detail: None };
        assert_eq!(err.to_string(), "gateway reported failure");

        let err = GatewayError::Transport("connection refused".to_string());
        assert_eq!(err.detail(), None);
        assert_eq!(err.kind(), "transport");
    }

    #[test]
    fn status_error_keeps_code() {
        let err = GatewayError::Status {
            code: 502,
            detail: None,
        };
        assert_eq!(err.to_string(), "gateway returned HTTP 502");
        assert_eq!(err.kind(), "status");
    }
}
