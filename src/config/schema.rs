/// Configuration schema and defaults for mailboard.
///
/// Defines the TOML-serializable configuration structure with all sections:
/// `[gateway]`, `[refresh]`, `[dashboard]`, and `[logging]`.
///
/// Every field has a sensible built-in default except the gateway URL, which
/// has to be supplied by the user.
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level mailboard configuration.
///
/// Maps directly to the `~/.mailboard/config.toml` and `.mailboard.toml`
/// file schemas. All sections and fields are optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MailboardConfig {
    pub gateway: GatewayConfig,
    pub refresh: RefreshConfig,
    pub dashboard: DashboardConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [gateway]
// ---------------------------------------------------------------------------

/// Remote gateway endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Base URL of the gateway script endpoint. No default.
    pub url: String,
    /// Per-request timeout (milliseconds).
    pub timeout_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_ms: 15_000,
        }
    }
}

// ---------------------------------------------------------------------------
// [refresh]
// ---------------------------------------------------------------------------

/// When the poller runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefreshMode {
    /// At startup and on every interval tick.
    Periodic,
    /// At startup, on manual refresh, and after a successful send.
    AfterSend,
}

impl std::fmt::Display for RefreshMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Periodic => write!(f, "periodic"),
            Self::AfterSend => write!(f, "after-send"),
        }
    }
}

/// How the two reads of a poll cycle are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchMode {
    /// Both reads must succeed before either is applied.
    Joint,
    /// Stats and emails are applied separately; one failing does not block
    /// the other.
    Independent,
}

impl std::fmt::Display for FetchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Joint => write!(f, "joint"),
            Self::Independent => write!(f, "independent"),
        }
    }
}

/// What happens when overlapping refreshes return out of order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefreshGuard {
    /// Whichever response arrives last is applied.
    #[default]
    LastWriteWins,
    /// Responses older than the newest applied one are discarded.
    Sequenced,
}

impl std::fmt::Display for RefreshGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LastWriteWins => write!(f, "last-write-wins"),
            Self::Sequenced => write!(f, "sequenced"),
        }
    }
}

/// Poll scheduling settings.
///
/// `mode` and `fetch` are optional; when unset they follow the dashboard
/// variant (see [`MailboardConfig::refresh_mode`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<RefreshMode>,
    /// Seconds between periodic polls.
    pub interval_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch: Option<FetchMode>,
    pub guard: RefreshGuard,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            mode: None,
            interval_secs: 30,
            fetch: None,
            guard: RefreshGuard::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// [dashboard]
// ---------------------------------------------------------------------------

/// Dashboard layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// Card feed with detail modal, follow-ups, auto-refresh and toasts.
    #[default]
    Cards,
    /// Admin table with manual compose, refreshed after sends.
    Table,
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cards => write!(f, "cards"),
            Self::Table => write!(f, "table"),
        }
    }
}

/// Local web dashboard settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub variant: Variant,
    /// Listen address for `mailboard serve`.
    pub addr: String,
    /// Open the dashboard in the default browser on start.
    pub open_browser: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            variant: Variant::default(),
            addr: "127.0.0.1:9747".to_string(),
            open_browser: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether the JSONL activity log is written.
    pub enabled: bool,
    /// Path to the activity log. `~` is expanded to the home directory.
    pub path: String,
    /// Diagnostic log level: `"error"`, `"warn"`, `"info"`, `"debug"`.
    /// `RUST_LOG` takes precedence when set.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "~/.mailboard/activity.jsonl".to_string(),
            level: "warn".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution helpers
// ---------------------------------------------------------------------------

impl MailboardConfig {
    /// Effective refresh mode: explicit setting, else the variant's preset.
    pub fn refresh_mode(&self) -> RefreshMode {
        self.refresh.mode.unwrap_or(match self.dashboard.variant {
            Variant::Cards => RefreshMode::Periodic,
            Variant::Table => RefreshMode::AfterSend,
        })
    }

    /// Effective fetch mode: explicit setting, else the variant's preset.
    pub fn fetch_mode(&self) -> FetchMode {
        self.refresh.fetch.unwrap_or(match self.dashboard.variant {
            Variant::Cards => FetchMode::Joint,
            Variant::Table => FetchMode::Independent,
        })
    }

    /// Poll interval, clamped to at least one second.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh.interval_secs.max(1))
    }
}

// ---------------------------------------------------------------------------
// Default TOML content
// ---------------------------------------------------------------------------

impl MailboardConfig {
    /// Generate the annotated default TOML config file content.
    pub fn default_toml() -> String {
        r#"# mailboard configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (MAILBOARD_*)
#   2. Project config (.mailboard.toml in current directory)
#   3. User global config (~/.mailboard/config.toml)
#   4. Built-in defaults

[gateway]
url = ""              # Gateway script endpoint, e.g. https://script.google.com/macros/s/<id>/exec
timeout_ms = 15000

[refresh]
# mode = "periodic"   # periodic | after-send (default follows dashboard.variant)
# fetch = "joint"     # joint | independent (default follows dashboard.variant)
interval_secs = 30
guard = "last-write-wins"  # last-write-wins | sequenced

[dashboard]
variant = "cards"     # cards | table
addr = "127.0.0.1:9747"
open_browser = true

[logging]
enabled = true
path = "~/.mailboard/activity.jsonl"
level = "warn"        # error | warn | info | debug
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = MailboardConfig::default();
        assert!(config.gateway.url.is_empty());
        assert_eq!(config.gateway.timeout_ms, 15_000);
        assert_eq!(config.refresh.interval_secs, 30);
        assert_eq!(config.refresh.guard, RefreshGuard::LastWriteWins);
        assert_eq!(config.dashboard.variant, Variant::Cards);
        assert_eq!(config.dashboard.addr, "127.0.0.1:9747");
        assert!(config.logging.enabled);
    }

    #[test]
    fn cards_variant_polls_periodically_and_jointly() {
        let config = MailboardConfig::default();
        assert_eq!(config.refresh_mode(), RefreshMode::Periodic);
        assert_eq!(config.fetch_mode(), FetchMode::Joint);
        assert_eq!(config.refresh_interval(), Duration::from_secs(30));
    }

    #[test]
    fn table_variant_refreshes_after_send_independently() {
        let toml_str = r#"
[dashboard]
variant = "table"
"#;
        let config: MailboardConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.refresh_mode(), RefreshMode::AfterSend);
        assert_eq!(config.fetch_mode(), FetchMode::Independent);
    }

    #[test]
    fn explicit_refresh_settings_beat_variant_preset() {
        let toml_str = r#"
[dashboard]
variant = "table"

[refresh]
mode = "periodic"
fetch = "joint"
interval_secs = 0
guard = "sequenced"
"#;
        let config: MailboardConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.refresh_mode(), RefreshMode::Periodic);
        assert_eq!(config.fetch_mode(), FetchMode::Joint);
        assert_eq!(config.refresh.guard, RefreshGuard::Sequenced);
        assert_eq!(config.refresh_interval(), Duration::from_secs(1));
    }

    #[test]
    fn deserialize_minimal_toml() {
        let toml_str = r#"
[gateway]
url = "https://script.example.com/exec"
"#;
        let config: MailboardConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.gateway.url, "https://script.example.com/exec");
        assert_eq!(config.gateway.timeout_ms, 15_000);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn default_toml_parses_back() {
        let toml_str = MailboardConfig::default_toml();
        let config: MailboardConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.dashboard.variant, Variant::Cards);
        assert!(config.refresh.mode.is_none());
        assert_eq!(config.refresh.interval_secs, 30);
    }

    #[test]
    fn enum_display_matches_serde_names() {
        assert_eq!(RefreshMode::AfterSend.to_string(), "after-send");
        assert_eq!(FetchMode::Independent.to_string(), "independent");
        assert_eq!(RefreshGuard::LastWriteWins.to_string(), "last-write-wins");
        assert_eq!(Variant::Table.to_string(), "table");
    }
}
