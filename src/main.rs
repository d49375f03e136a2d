use anyhow::Result;
use clap::{Parser, Subcommand};

use mailboard::cli;
use mailboard::config;

#[derive(Debug, Parser)]
#[command(name = "mailboard")]
#[command(about = "Dashboard for an email auto-responder gateway")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start the local web dashboard
    Serve,
    /// Poll the gateway on a timer and print each refresh to the terminal
    ///
    /// Always polls at the interval, whatever refresh.mode is set to.
    Watch {
        /// Seconds between polls (default: refresh.interval_secs)
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Show the gateway's email statistics
    Stats {
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// List logged emails
    Emails {
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
        /// Only show the first N emails
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show one email in full
    Show {
        /// Position in the email list (0 = newest)
        index: usize,
    },
    /// Send a manual email through the gateway
    Send {
        #[arg(long)]
        to: String,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        message: String,
    },
    /// Reply to a logged email
    FollowUp {
        /// Position in the email list (0 = newest)
        index: usize,
        #[arg(long)]
        message: String,
    },
    /// Check config, gateway reachability and the activity log
    Health,
    /// Show recent poll and send activity
    History {
        /// Number of entries to list
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write the default config to ~/.mailboard/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a dotted key, e.g. `gateway.url`
    Set { key: String, value: String },
    /// Reset the global config to defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();
    let config = config::load();

    // RUST_LOG wins over the configured level.
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    match app.command {
        Commands::Serve => cli::run_serve(&config),
        Commands::Watch { interval } => cli::run_watch(&config, interval),
        Commands::Stats { format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_stats(&config, fmt)
        }
        Commands::Emails { format, limit } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_emails(&config, fmt, limit)
        }
        Commands::Show { index } => cli::run_show(&config, index),
        Commands::Send {
            to,
            subject,
            message,
        } => cli::run_send(&config, &to, &subject, &message),
        Commands::FollowUp { index, message } => cli::run_follow_up(&config, index, &message),
        Commands::Health => cli::run_health(&config),
        Commands::History { limit, format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_history(&config, limit, fmt)
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn watch_help_says_it_always_polls() {
        let mut app = App::command();
        let watch = app.find_subcommand_mut("watch").unwrap();
        let help = watch.render_long_help().to_string();
        assert!(help.contains("whatever refresh.mode is set to"));
    }

    #[test]
    fn watch_accepts_interval() {
        let app = App::try_parse_from(["mailboard", "watch", "--interval", "5"]).unwrap();
        assert!(matches!(app.command, Commands::Watch { interval: Some(5) }));
    }
}
