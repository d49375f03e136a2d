//! Terminal rendering for `mailboard watch` and the one-shot commands.

use std::io::Write;

use chrono::{DateTime, Local};
use colored::Colorize;

use super::format::{count_label, format_datetime, preview, time_ago};
use super::{Renderer, StatsDisplay};
use crate::config::schema::Variant;
use crate::model::EmailRecord;
use crate::model::StatsSummary;
use crate::status::{ConnectionStatus, StatusReport};

/// Truncate to `max` characters, marking the cut with `…`.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{head}…")
    }
}

/// Statistics block.
pub fn stats_lines(stats: &StatsSummary) -> Vec<String> {
    let d = StatsDisplay::from_stats(stats);
    vec![
        format!("{}", "Email Statistics".bold().cyan()),
        format!("  {} {}", "Total emails:     ".bold(), d.total),
        format!("  {} {}", "Auto-responded:   ".bold(), d.auto_responded),
        format!("  {} {}", "Manual:           ".bold(), d.manual),
        format!("  {} {}", "Avg response time:".bold(), d.avg_response_time),
        format!("  {} {}", "Success rate:     ".bold(), d.success_rate),
    ]
}

/// One list line per record: index, age, sender, subject, markers.
pub fn email_line(index: usize, email: &EmailRecord, variant: Variant, now: DateTime<Local>) -> String {
    let mut line = format!(
        "  {:>3}  {:<14} {:<28} {}",
        index,
        truncate(&time_ago(&email.timestamp, now), 14),
        truncate(&email.from, 28),
        truncate(&email.subject, 40),
    );
    if variant == Variant::Table
        && let Some(to) = &email.to
    {
        line.push_str(&format!(" → {}", truncate(to, 28)));
    }
    line.push_str(&format!(" [{}]", email.inquiry_label()));
    if email.is_auto_responded() {
        line.push_str(&format!(" {}", "✓ auto".green()));
    }
    if let Some(rt) = &email.response_time {
        line.push_str(&format!(" ⏱ {rt}"));
    }
    line
}

/// Email list block with count header or empty-state message.
pub fn email_lines(emails: &[EmailRecord], variant: Variant, now: DateTime<Local>) -> Vec<String> {
    let mut lines = vec![format!(
        "{} ({})",
        "Recent Emails".bold().cyan(),
        count_label(emails.len())
    )];
    if emails.is_empty() {
        lines.push(format!("  {}", "No emails yet".yellow()));
        return lines;
    }
    for (i, email) in emails.iter().enumerate() {
        let line = email_line(i, email, variant, now);
        lines.push(if i % 2 == 0 {
            line
        } else {
            line.dimmed().to_string()
        });
        lines.push(format!("       {}", preview(&email.body).dimmed()));
    }
    lines
}

/// Full detail block for one record.
pub fn detail_lines(email: &EmailRecord) -> Vec<String> {
    let mut lines = vec![
        format!("{} {}", "From:    ".bold(), email.from),
    ];
    if let Some(to) = &email.to {
        lines.push(format!("{} {}", "To:      ".bold(), to));
    }
    lines.push(format!("{} {}", "Subject: ".bold(), email.subject));
    lines.push(format!("{} {}", "Received:".bold(), format_datetime(&email.timestamp)));
    lines.push(format!("{} {}", "Type:    ".bold(), email.inquiry_label()));

    let mut status = if email.is_auto_responded() {
        "✓ Auto-Responded".green().to_string()
    } else {
        "Pending".yellow().to_string()
    };
    if let Some(rt) = &email.response_time {
        status.push_str(&format!(" in {rt}"));
    }
    lines.push(format!("{} {}", "Status:  ".bold(), status));

    lines.push(String::new());
    lines.push(if email.body.is_empty() {
        "No message content".to_string()
    } else {
        email.body.clone()
    });

    if let Some(reply) = &email.reply {
        lines.push(String::new());
        lines.push(format!("{}", "Auto-Response Sent".bold().cyan()));
        lines.push(reply.clone());
    }
    lines
}

/// Status line with optional banner and last-updated time.
pub fn status_lines(report: &StatusReport) -> Vec<String> {
    let label = match report.status {
        ConnectionStatus::Loading => format!("● {}", report.label).yellow(),
        ConnectionStatus::Connected => format!("● {}", report.label).green(),
        ConnectionStatus::Error => format!("● {}", report.label).red(),
    };
    let mut line = label.to_string();
    if let Some(updated) = report.last_updated_label() {
        line.push_str(&format!("  {}", updated.dimmed()));
    }

    let mut lines = vec![line];
    if let Some(banner) = report.banner {
        lines.push(banner.red().to_string());
    }
    lines
}

/// Writes each render call straight to an output stream.
pub struct TerminalSurface<W: Write> {
    out: W,
    variant: Variant,
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W, variant: Variant) -> Self {
        Self { out, variant }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_lines(&mut self, lines: &[String]) {
        for line in lines {
            let _ = writeln!(self.out, "{line}");
        }
        let _ = self.out.flush();
    }
}

impl<W: Write> Renderer for TerminalSurface<W> {
    fn render_stats(&mut self, stats: &StatsSummary) {
        self.write_lines(&stats_lines(stats));
        let _ = writeln!(self.out);
    }

    fn render_email_list(&mut self, emails: &[EmailRecord]) {
        let lines = email_lines(emails, self.variant, Local::now());
        self.write_lines(&lines);
        let _ = writeln!(self.out);
    }

    fn render_detail(&mut self, email: Option<&EmailRecord>) {
        if let Some(email) = email {
            self.write_lines(&detail_lines(email));
        }
    }

    fn render_status(&mut self, status: &StatusReport) {
        self.write_lines(&status_lines(status));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EmailRecord {
        EmailRecord {
            from: "ada@example.com".to_string(),
            to: Some("support@example.com".to_string()),
            subject: "Invoice question".to_string(),
            body: "Where is my invoice?".to_string(),
            status: Some("Auto-Responded".to_string()),
            response_time: Some("3s".to_string()),
            reply: Some("We are on it.".to_string()),
            ..EmailRecord::default()
        }
    }

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate("abcdef", 10), "abcdef");
        assert_eq!(truncate("abcdef", 4), "abc…");
    }

    #[test]
    fn empty_list_shows_message_and_zero_count() {
        let lines = email_lines(&[], Variant::Cards, Local::now());
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("0 emails"));
        assert!(lines[1].contains("No emails yet"));
    }

    #[test]
    fn table_variant_adds_recipient() {
        let now = Local::now();
        let cards = email_line(0, &sample(), Variant::Cards, now);
        let table = email_line(0, &sample(), Variant::Table, now);
        assert!(!cards.contains("support@example.com"));
        assert!(table.contains("support@example.com"));
        assert!(table.contains("ada@example.com"));
    }

    #[test]
    fn detail_includes_reply() {
        let lines = detail_lines(&sample());
        assert!(lines.iter().any(|l| l.contains("We are on it.")));
        assert!(lines.iter().any(|l| l.contains("in 3s")));
    }

    #[test]
    fn surface_writes_stats() {
        let mut surface = TerminalSurface::new(Vec::new(), Variant::Cards);
        surface.render_stats(&StatsSummary {
            total_emails: Some(4),
            auto_responded: Some(3),
            ..StatsSummary::default()
        });
        let out = String::from_utf8(surface.into_inner()).unwrap();
        assert!(out.contains("75%"));
    }
}
