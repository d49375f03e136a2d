/// Configuration system for mailboard.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults** — hardcoded in [`schema::MailboardConfig::default()`]
/// 2. **User global config** — `~/.mailboard/config.toml`
/// 3. **Project local config** — `.mailboard.toml` in the current working directory
/// 4. **Environment variables** — `MAILBOARD_*` overrides (highest precedence)
///
/// File layers are merged key by key: a project file that only sets
/// `dashboard.variant` keeps the gateway URL from the global file.
///
/// # Usage
///
/// ```rust,ignore
/// let cfg = mailboard::config::load();
/// let gateway = HttpGateway::from_config(&cfg.gateway);
/// ```
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use schema::MailboardConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved mailboard configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars.
pub fn load() -> MailboardConfig {
    let layers = [global_config_path(), project_config_path()];
    let mut config = load_layers(layers.iter().flatten().map(PathBuf::as_path));
    apply_env_overrides(&mut config);
    config
}

/// Merge the given TOML files (in order) on top of the defaults.
///
/// Missing or malformed files are skipped so a broken project file never
/// takes the dashboard down; the merged result falls back to defaults if it
/// no longer fits the schema.
pub fn load_layers<'a>(paths: impl IntoIterator<Item = &'a Path>) -> MailboardConfig {
    let mut merged = toml::Value::Table(toml::map::Map::new());

    for path in paths {
        if let Some(layer) = load_toml_value(path) {
            merge_values(&mut merged, layer);
        }
    }

    merged.try_into().unwrap_or_else(|e| {
        log::warn!("ignoring config files that do not match the schema: {e}");
        MailboardConfig::default()
    })
}

/// Parse a TOML file into a raw value tree.
fn load_toml_value(path: &Path) -> Option<toml::Value> {
    let content = fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("skipping malformed config {}: {e}", path.display());
            None
        }
    }
}

/// Recursively merge `overlay` into `base`; tables merge, leaves replace.
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.mailboard/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".mailboard").join("config.toml"))
}

/// Path to the project local config: `.mailboard.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".mailboard.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> Option<PathBuf> {
    match path.strip_prefix("~") {
        Some(rest) => {
            let rest = rest.trim_start_matches(['/', '\\']);
            dirs::home_dir().map(|home| home.join(rest))
        }
        None => Some(PathBuf::from(path)),
    }
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `MAILBOARD_GATEWAY_URL` — gateway endpoint
/// - `MAILBOARD_TIMEOUT_MS` — per-request timeout
/// - `MAILBOARD_VARIANT` — `cards` or `table`
/// - `MAILBOARD_REFRESH_MODE` — `periodic` or `after-send`
/// - `MAILBOARD_REFRESH_SECS` — poll interval
/// - `MAILBOARD_GUARD` — `last-write-wins` or `sequenced`
/// - `MAILBOARD_ADDR` — dashboard listen address
/// - `MAILBOARD_LOG` — activity log on/off (`1`/`true`/`yes`/`on`)
/// - `MAILBOARD_LOG_LEVEL` — diagnostic log level
fn apply_env_overrides(config: &mut MailboardConfig) {
    if let Ok(val) = std::env::var("MAILBOARD_GATEWAY_URL")
        && !val.is_empty()
    {
        config.gateway.url = val;
    }
    if let Ok(val) = std::env::var("MAILBOARD_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.gateway.timeout_ms = ms;
    }
    if let Ok(val) = std::env::var("MAILBOARD_VARIANT")
        && let Some(variant) = parse_variant(&val)
    {
        config.dashboard.variant = variant;
    }
    if let Ok(val) = std::env::var("MAILBOARD_REFRESH_MODE")
        && let Some(mode) = parse_refresh_mode(&val)
    {
        config.refresh.mode = Some(mode);
    }
    if let Ok(val) = std::env::var("MAILBOARD_REFRESH_SECS")
        && let Ok(secs) = val.parse::<u64>()
    {
        config.refresh.interval_secs = secs;
    }
    if let Ok(val) = std::env::var("MAILBOARD_GUARD")
        && let Some(guard) = parse_guard(&val)
    {
        config.refresh.guard = guard;
    }
    if let Ok(val) = std::env::var("MAILBOARD_ADDR")
        && !val.is_empty()
    {
        config.dashboard.addr = val;
    }
    if let Ok(val) = std::env::var("MAILBOARD_LOG") {
        config.logging.enabled = is_truthy(&val);
    }
    if let Ok(val) = std::env::var("MAILBOARD_LOG_LEVEL")
        && !val.is_empty()
    {
        config.logging.level = val;
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Parse a variant string.
fn parse_variant(val: &str) -> Option<schema::Variant> {
    match val.to_ascii_lowercase().as_str() {
        "cards" | "dashboard" => Some(schema::Variant::Cards),
        "table" | "admin" => Some(schema::Variant::Table),
        _ => None,
    }
}

/// Parse a refresh mode string.
fn parse_refresh_mode(val: &str) -> Option<schema::RefreshMode> {
    match val.to_ascii_lowercase().as_str() {
        "periodic" => Some(schema::RefreshMode::Periodic),
        "after-send" | "after_send" | "aftersend" => Some(schema::RefreshMode::AfterSend),
        _ => None,
    }
}

/// Parse a refresh guard string.
fn parse_guard(val: &str) -> Option<schema::RefreshGuard> {
    match val.to_ascii_lowercase().as_str() {
        "last-write-wins" | "last_write_wins" | "lww" => {
            Some(schema::RefreshGuard::LastWriteWins)
        }
        "sequenced" | "seq" => Some(schema::RefreshGuard::Sequenced),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.mailboard/config.toml`.
///
/// Creates the `~/.mailboard/` directory if it doesn't exist. Returns an
/// error if the file already exists (use `force = true` to overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.mailboard/ directory")?;
    }

    fs::write(&path, MailboardConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single config key to a value in the global config file.
///
/// Supports dotted keys like `gateway.url` or `refresh.interval_secs`.
/// Starts from the serialized defaults when no file exists yet.
pub fn set_config_value(key: &str, value: &str) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;
    set_config_value_at(&path, key, value)?;
    Ok(path)
}

/// [`set_config_value`] against an explicit file path.
pub fn set_config_value_at(path: &Path, key: &str, value: &str) -> Result<()> {
    let content = if path.exists() {
        fs::read_to_string(path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&MailboardConfig::default())
            .context("failed to serialize default config")?
    };

    let mut root: toml::Value =
        toml::from_str(&content).context("failed to parse config as TOML value")?;
    set_toml_value(&mut root, key, value)?;

    // Refuse to write a file that would no longer load.
    let _: MailboardConfig = root
        .clone()
        .try_into()
        .with_context(|| format!("invalid value '{value}' for '{key}'"))?;

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(path, output).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
///
/// The type of an existing value is preserved. New keys are typed from the
/// raw text: booleans, then integers, then strings.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').filter(|p| !p.is_empty()).collect();
    let Some((leaf, sections)) = parts.split_last() else {
        anyhow::bail!("empty config key");
    };

    let mut current = root;
    for &part in sections {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let table = current.as_table_mut().with_context(|| {
        format!(
            "expected table at '{}'",
            key.rsplit_once('.').map(|(s, _)| s).unwrap_or("")
        )
    })?;

    let new_value = match table.get(*leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(_) => toml::Value::String(raw_value.to_string()),
        None => infer_toml_value(raw_value),
    };

    table.insert((*leaf).to_string(), new_value);
    Ok(())
}

fn infer_toml_value(raw: &str) -> toml::Value {
    match raw {
        "true" => toml::Value::Boolean(true),
        "false" => toml::Value::Boolean(false),
        _ => raw
            .parse::<i64>()
            .map(toml::Value::Integer)
            .unwrap_or_else(|_| toml::Value::String(raw.to_string())),
    }
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use schema::{RefreshGuard, RefreshMode, Variant};

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "mailboard-config-{name}-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn layers_merge_key_by_key() {
        let dir = temp_dir("layers");
        let global = dir.join("global.toml");
        let project = dir.join("project.toml");
        fs::write(
            &global,
            "[gateway]\nurl = \"https://gw.example.com/exec\"\ntimeout_ms = 900\n",
        )
        .unwrap();
        fs::write(&project, "[dashboard]\nvariant = \"table\"\n").unwrap();

        let config = load_layers([global.as_path(), project.as_path()]);
        assert_eq!(config.gateway.url, "https://gw.example.com/exec");
        assert_eq!(config.gateway.timeout_ms, 900);
        assert_eq!(config.dashboard.variant, Variant::Table);
        assert_eq!(config.refresh.interval_secs, 30);
    }

    #[test]
    fn malformed_layer_is_skipped() {
        let dir = temp_dir("malformed");
        let good = dir.join("good.toml");
        let bad = dir.join("bad.toml");
        fs::write(&good, "[refresh]\ninterval_secs = 10\n").unwrap();
        fs::write(&bad, "[refresh\ninterval_secs = ").unwrap();

        let config = load_layers([good.as_path(), bad.as_path()]);
        assert_eq!(config.refresh.interval_secs, 10);
    }

    #[test]
    fn missing_layers_yield_defaults() {
        let config = load_layers([Path::new("/nonexistent/mailboard.toml")]);
        assert_eq!(config.dashboard.addr, "127.0.0.1:9747");
    }

    #[test]
    fn is_truthy_accepts_variants() {
        assert!(is_truthy("1"));
        assert!(is_truthy("TRUE"));
        assert!(is_truthy("yes"));
        assert!(is_truthy("On"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("off"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn parsers_handle_aliases() {
        assert_eq!(parse_variant("admin"), Some(Variant::Table));
        assert_eq!(parse_variant("Cards"), Some(Variant::Cards));
        assert_eq!(parse_variant("grid"), None);
        assert_eq!(parse_refresh_mode("after_send"), Some(RefreshMode::AfterSend));
        assert_eq!(parse_refresh_mode("never"), None);
        assert_eq!(parse_guard("seq"), Some(RefreshGuard::Sequenced));
        assert_eq!(parse_guard("lww"), Some(RefreshGuard::LastWriteWins));
    }

    #[test]
    fn set_toml_value_preserves_types() {
        let mut root: toml::Value = toml::from_str(
            "[refresh]\ninterval_secs = 30\n[dashboard]\nopen_browser = true\nvariant = \"cards\"\n",
        )
        .unwrap();
        set_toml_value(&mut root, "refresh.interval_secs", "45").unwrap();
        set_toml_value(&mut root, "dashboard.open_browser", "off").unwrap();
        set_toml_value(&mut root, "dashboard.variant", "table").unwrap();

        assert_eq!(root["refresh"]["interval_secs"].as_integer(), Some(45));
        assert_eq!(root["dashboard"]["open_browser"].as_bool(), Some(false));
        assert_eq!(root["dashboard"]["variant"].as_str(), Some("table"));
    }

    #[test]
    fn set_toml_value_rejects_bad_integer_and_unknown_section() {
        let mut root: toml::Value = toml::from_str("[refresh]\ninterval_secs = 30\n").unwrap();
        assert!(set_toml_value(&mut root, "refresh.interval_secs", "soon").is_err());
        assert!(set_toml_value(&mut root, "nonexistent.key", "value").is_err());
        assert!(set_toml_value(&mut root, "", "value").is_err());
    }

    #[test]
    fn set_config_value_at_creates_file_from_defaults() {
        let dir = temp_dir("set");
        let path = dir.join("config.toml");

        set_config_value_at(&path, "gateway.url", "https://gw.example.com/exec").unwrap();
        set_config_value_at(&path, "refresh.mode", "after-send").unwrap();

        let config = load_layers([path.as_path()]);
        assert_eq!(config.gateway.url, "https://gw.example.com/exec");
        assert_eq!(config.refresh.mode, Some(RefreshMode::AfterSend));
    }

    #[test]
    fn set_config_value_at_refuses_invalid_enum() {
        let dir = temp_dir("invalid");
        let path = dir.join("config.toml");

        let result = set_config_value_at(&path, "dashboard.variant", "grid");
        assert!(result.is_err());
        assert!(!path.exists());
    }

    #[test]
    fn expand_home_handles_plain_paths() {
        assert_eq!(
            expand_home("/var/log/mailboard.jsonl"),
            Some(PathBuf::from("/var/log/mailboard.jsonl"))
        );
        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                expand_home("~/.mailboard/activity.jsonl"),
                Some(home.join(".mailboard/activity.jsonl"))
            );
        }
    }
}
