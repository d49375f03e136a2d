//! CLI command implementations for mailboard.
//!
//! Provides subcommand handlers for:
//! - `mailboard serve` — local web dashboard
//! - `mailboard watch` — terminal dashboard that polls on a timer
//! - `mailboard stats | emails | show` — one-shot reads
//! - `mailboard send | follow-up` — send through the gateway
//! - `mailboard health` — check config, gateway reachability and the activity log
//! - `mailboard history` — poll and send activity from the local log
//! - `mailboard config show|init|set|reset` — configuration management

use std::io;
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Local;
use colored::Colorize;

use crate::activity::{ActivityKind, ActivityLog};
use crate::activity::report::{self, KindSummary};
use crate::composer::{self, Draft, SendOutcome, SubmitControls};
use crate::config::{self, MailboardConfig};
use crate::gateway::{Gateway, HttpGateway};
use crate::poller::{Poller, PollerOptions};
use crate::render::NullSurface;
use crate::render::terminal::{TerminalSurface, detail_lines, email_lines, stats_lines};
use crate::timer::RefreshTimer;
use crate::web;

/// Output format for read commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            _ => Self::Table,
        }
    }
}

/// Build the gateway client, failing early when no endpoint is configured.
fn gateway_from(config: &MailboardConfig) -> Result<HttpGateway> {
    if config.gateway.url.trim().is_empty() {
        anyhow::bail!(
            "no gateway URL configured. Set MAILBOARD_GATEWAY_URL or run `mailboard config set gateway.url <url>`"
        );
    }
    Ok(HttpGateway::from_config(&config.gateway))
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

// ---------------------------------------------------------------------------
// mailboard serve | watch
// ---------------------------------------------------------------------------

/// Run the local web dashboard until Ctrl+C.
pub fn run_serve(config: &MailboardConfig) -> Result<()> {
    let gateway = gateway_from(config)?;
    web::serve(config, gateway, ActivityLog::from_config(&config.logging))
}

/// Poll on a timer and print each cycle to the terminal until Ctrl+C.
///
/// Ticks regardless of `refresh.mode`; `after-send` only applies to `serve`.
pub fn run_watch(config: &MailboardConfig, interval_secs: Option<u64>) -> Result<()> {
    let gateway = gateway_from(config)?;
    let interval = interval_secs
        .map(|s| Duration::from_secs(s.max(1)))
        .unwrap_or_else(|| config.refresh_interval());

    let surface = TerminalSurface::new(io::stdout(), config.dashboard.variant);
    let poller = Arc::new(
        Poller::new(gateway, surface, PollerOptions::from_config(config))
            .with_activity_log(ActivityLog::from_config(&config.logging)),
    );

    let (stop, stopped) = mpsc::channel::<()>();
    ctrlc::set_handler(move || {
        let _ = stop.send(());
    })
    .context("failed to install Ctrl+C handler")?;

    println!(
        "{} every {}s. Press Ctrl+C to stop.\n",
        "Watching gateway".bold().cyan(),
        interval.as_secs()
    );

    poller.refresh();
    let mut timer = RefreshTimer::new();
    {
        let poller = Arc::clone(&poller);
        timer.start(interval, move || {
            println!("{}", "-".repeat(60).dimmed());
            poller.refresh();
        });
    }

    let _ = stopped.recv();
    timer.cancel();
    println!("\n{}", "Stopped.".dimmed());
    Ok(())
}

// ---------------------------------------------------------------------------
// mailboard stats | emails | show
// ---------------------------------------------------------------------------

/// Print the gateway's aggregate statistics.
pub fn run_stats(config: &MailboardConfig, format: OutputFormat) -> Result<()> {
    let stats = gateway_from(config)?
        .get_stats()
        .context("failed to fetch stats")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Table => print_lines(&stats_lines(&stats)),
    }
    Ok(())
}

/// Print the email log, newest first as the gateway returns it.
pub fn run_emails(config: &MailboardConfig, format: OutputFormat, limit: Option<usize>) -> Result<()> {
    let mut emails = gateway_from(config)?
        .get_emails()
        .context("failed to fetch emails")?;
    if let Some(limit) = limit {
        emails.truncate(limit);
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&emails)?),
        OutputFormat::Table => print_lines(&email_lines(&emails, config.dashboard.variant, Local::now())),
    }
    Ok(())
}

/// Print the full record at `index`.
pub fn run_show(config: &MailboardConfig, index: usize) -> Result<()> {
    let emails = gateway_from(config)?
        .get_emails()
        .context("failed to fetch emails")?;
    let email = emails
        .get(index)
        .with_context(|| format!("no email at index {index} ({} emails)", emails.len()))?;

    println!("{}", format!("Email #{index}").bold().cyan());
    println!("{}", "=".repeat(50));
    print_lines(&detail_lines(email));
    Ok(())
}

// ---------------------------------------------------------------------------
// mailboard send | follow-up
// ---------------------------------------------------------------------------

/// Busy indicator on stderr while a send is in flight.
struct ConsoleControls {
    started: Option<Instant>,
}

impl SubmitControls for ConsoleControls {
    fn set_busy(&mut self, busy: bool) {
        if busy {
            eprint!("{}", "Sending...".dimmed());
            self.started = Some(Instant::now());
        } else if let Some(started) = self.started.take() {
            eprintln!(" {}", format!("{}ms", started.elapsed().as_millis()).dimmed());
        }
    }
}

fn submit_and_report<G: Gateway>(poller: &Poller<G, NullSurface>, draft: Draft) -> Result<()> {
    let mut controls = ConsoleControls { started: None };
    match composer::submit(poller, draft, &mut controls) {
        SendOutcome::Sent { message } => {
            println!("{} {}", "✓".green().bold(), message);
            Ok(())
        }
        SendOutcome::Invalid { missing } => {
            anyhow::bail!("missing required field(s): {}", missing.join(", "))
        }
        SendOutcome::Busy => anyhow::bail!("another send is still in progress"),
        SendOutcome::Failed { message } => anyhow::bail!("{message}"),
    }
}

fn send_poller(config: &MailboardConfig) -> Result<Poller<HttpGateway, NullSurface>> {
    Ok(
        Poller::new(gateway_from(config)?, NullSurface, PollerOptions::from_config(config))
            .with_activity_log(ActivityLog::from_config(&config.logging)),
    )
}

/// Send a manual email.
pub fn run_send(config: &MailboardConfig, to: &str, subject: &str, message: &str) -> Result<()> {
    let poller = send_poller(config)?;
    let draft = Draft {
        recipient: to.to_string(),
        subject: subject.to_string(),
        message: message.to_string(),
        ..Draft::blank()
    };
    submit_and_report(&poller, draft)
}

/// Reply to the record at `index`.
pub fn run_follow_up(config: &MailboardConfig, index: usize, message: &str) -> Result<()> {
    let poller = send_poller(config)?;
    poller.refresh();

    let Some(email) = poller.open_detail(index) else {
        let count = poller.view(|v| v.emails().len());
        anyhow::bail!("no email at index {index} ({count} emails loaded)");
    };
    let draft = Draft {
        message: message.to_string(),
        ..Draft::follow_up(&email)
    };
    println!(
        "  {} {}\n  {} {}",
        "To:     ".bold(),
        draft.recipient,
        "Subject:".bold(),
        draft.subject
    );
    submit_and_report(&poller, draft)
}

// ---------------------------------------------------------------------------
// mailboard health
// ---------------------------------------------------------------------------

/// Check config files, gateway reachability and the activity log.
pub fn run_health(config: &MailboardConfig) -> Result<()> {
    println!("{}", "mailboard Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.mailboard/config.toml found"
        } else {
            "not found (run `mailboard config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".mailboard.toml found"
        } else {
            "none (optional)"
        },
    );
    print_health_item(
        "Variant / refresh",
        true,
        &format!(
            "{} / {} every {}s, {} fetch, {} guard",
            config.dashboard.variant,
            config.refresh_mode(),
            config.refresh_interval().as_secs(),
            config.fetch_mode(),
            config.refresh.guard
        ),
    );

    match gateway_from(config) {
        Ok(gateway) => {
            print_health_item("Gateway URL", true, gateway.base_url());
            let started = Instant::now();
            match gateway.get_stats() {
                Ok(_) => print_health_item(
                    "Gateway",
                    true,
                    &format!("reachable ({}ms)", started.elapsed().as_millis()),
                ),
                Err(e) => print_health_item("Gateway", false, &e.to_string()),
            }
        }
        Err(_) => print_health_item("Gateway URL", false, "not configured (set gateway.url)"),
    }

    let log = ActivityLog::from_config(&config.logging);
    match log.path() {
        Some(path) if path.exists() => print_health_item(
            "Activity log",
            true,
            &format!("{} entries", log.read_all().len()),
        ),
        Some(_) => print_health_item("Activity log", true, "no log file yet"),
        None => print_health_item("Activity log", false, "disabled"),
    }

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<25} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// mailboard history
// ---------------------------------------------------------------------------

/// Summarize and list recent poll and send activity.
pub fn run_history(config: &MailboardConfig, limit: usize, format: OutputFormat) -> Result<()> {
    let log = ActivityLog::from_config(&config.logging);
    let all = log.read_all();
    if all.is_empty() {
        println!(
            "{}",
            "No activity yet. Run `mailboard serve` or `mailboard watch` to record some.".yellow()
        );
        return Ok(());
    }

    let recent = &all[all.len().saturating_sub(limit)..];
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(recent)?);
        return Ok(());
    }

    let summary = report::summarize(&all);
    println!("{}", "mailboard Activity".bold().cyan());
    println!("{}", "=".repeat(60));
    print_kind_summary("Polls:", &summary.polls);
    print_kind_summary("Sends:", &summary.sends);
    if let Some(at) = &summary.last_ok_poll {
        println!("  {} {}", "Last good poll:".bold(), at);
    }
    println!();

    println!(
        "  {:<26} {:<5} {:<10} {:>7}  Detail",
        "Time", "Kind", "Outcome", "ms"
    );
    println!("  {}", "-".repeat(58));
    for (i, entry) in recent.iter().enumerate() {
        let kind = match entry.kind {
            ActivityKind::Poll => "poll",
            ActivityKind::Send => "send",
        };
        let detail = entry
            .recipient
            .clone()
            .or_else(|| entry.emails.map(|n| format!("{n} emails")))
            .unwrap_or_default();
        let detail = match &entry.detail {
            Some(d) if entry.outcome != "ok" => truncate(d, 40),
            _ => detail,
        };
        let line = format!(
            "  {:<26} {:<5} {:<10} {:>7}  {}",
            truncate(&entry.timestamp, 26),
            kind,
            colorize_outcome(&entry.outcome),
            entry.duration_ms,
            detail,
        );
        if i % 2 == 0 {
            println!("{line}");
        } else {
            println!("{}", line.dimmed());
        }
    }
    Ok(())
}

fn print_kind_summary(label: &str, summary: &KindSummary) {
    println!(
        "  {} {} total, {} ok ({:.0}%), {} failed, avg {:.0}ms",
        format!("{label:<15}").bold(),
        summary.total,
        summary.ok,
        summary.ok_pct(),
        summary.failed,
        summary.avg_duration_ms,
    );
}

// ---------------------------------------------------------------------------
// mailboard config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective mailboard Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    if global_exists {
        println!("  {} {}", "✓".green(), "~/.mailboard/config.toml".dimmed());
    } else {
        println!(
            "  {} {}",
            "·".dimmed(),
            "~/.mailboard/config.toml (not found)".dimmed()
        );
    }
    if project_exists {
        println!("  {} {}", "✓".green(), ".mailboard.toml".dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), ".mailboard.toml (not found)".dimmed());
    }
    println!(
        "  {} {}",
        "·".dimmed(),
        "MAILBOARD_* environment variables".dimmed()
    );

    Ok(())
}

/// Initialize a default config file at `~/.mailboard/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!(
        "  {}",
        "Set gateway.url to your gateway endpoint before running the dashboard.".dimmed()
    );
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    let path = config::set_config_value(key, value)?;
    println!(
        "{} Set {} = {} in {}",
        "✓".green().bold(),
        key.bold(),
        value,
        path.display()
    );
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Truncate a string to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{head}…")
    }
}

/// Colorize an activity outcome.
fn colorize_outcome(outcome: &str) -> colored::ColoredString {
    match outcome {
        "ok" => outcome.green(),
        "error" => outcome.red(),
        "discarded" | "invalid" => outcome.yellow(),
        _ => outcome.normal(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 5), "hell…");
        assert_eq!(truncate("ab", 2), "ab");
        assert_eq!(truncate("héllo wörld", 6), "héllo…");
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!(OutputFormat::from_str_opt(None), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str_opt(Some("json")), OutputFormat::Json);
        assert_eq!(
            OutputFormat::from_str_opt(Some("unknown")),
            OutputFormat::Table
        );
    }

    #[test]
    fn missing_gateway_url_is_an_error() {
        let config = MailboardConfig::default();
        let err = gateway_from(&config).unwrap_err();
        assert!(err.to_string().contains("MAILBOARD_GATEWAY_URL"));
    }

    #[test]
    fn console_controls_track_busy_span() {
        let mut controls = ConsoleControls { started: None };
        controls.set_busy(true);
        assert!(controls.started.is_some());
        controls.set_busy(false);
        assert!(controls.started.is_none());
    }
}
