//! Notification formatting.
//!
//! Renders alert candidates as Telegram Markdown. Formatting is pure: the
//! same candidate always renders to the same bytes.

use serde::Serialize;
use std::fmt::Write;
use vault_core::{
    AlertCandidate, HighFrequencyAlert, InfoAlert, LargeTransactionAlert, PnlBreakdown, Severity,
    SignificantPnlAlert,
};

/// Message handed to a dispatch sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationPayload {
    pub text: String,
    /// Text uses Markdown emphasis and must be sent with a parse mode.
    pub emphasis_markup: bool,
    /// Deliver without a notification sound.
    pub silent: bool,
}

/// Render an alert candidate.
pub fn format_alert(candidate: &AlertCandidate) -> NotificationPayload {
    let text = if !candidate.kind().is_recognized() {
        unknown_event(candidate)
    } else {
        match candidate {
            AlertCandidate::Info(alert) => info(alert),
            AlertCandidate::LargeTransaction(alert) => large_transaction(alert),
            AlertCandidate::SignificantPnl(alert) => significant_pnl(alert),
            AlertCandidate::HighFrequency(alert) => high_frequency(alert),
        }
    };

    NotificationPayload {
        text,
        emphasis_markup: true,
        silent: candidate.severity() == Severity::Info,
    }
}

fn info(alert: &InfoAlert) -> String {
    let mut text = String::new();
    let participant_label = if alert.kind.is_vault_flow() {
        "User"
    } else {
        "Strategy"
    };

    let _ = writeln!(text, "ℹ️ *{}*", escape(alert.kind.display_name()));
    let _ = writeln!(text, "Vault: {}", code(&alert.vault));
    let _ = writeln!(text, "{participant_label}: {}", code(&alert.participant));
    let _ = writeln!(text, "Amount: {}", amount(alert.amount));
    let _ = writeln!(
        text,
        "Total value: {} → {} ({})",
        amount(alert.total_value_before),
        amount(alert.total_value_after),
        signed_percent(alert.percentage_change)
    );
    let _ = writeln!(
        text,
        "Size: {} of total value",
        percent(alert.transaction_percent)
    );
    if let Some(pnl) = &alert.pnl {
        let _ = writeln!(text, "{}", pnl_line(pnl));
    }
    let _ = write!(text, "Time: {}", escape(&alert.timestamp));
    text
}

fn large_transaction(alert: &LargeTransactionAlert) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "🚨 *Large Transaction*");
    let _ = writeln!(text, "Event: {}", escape(alert.kind.display_name()));
    let _ = writeln!(text, "Vault: {}", code(&alert.vault));
    let _ = writeln!(text, "From: {}", code(&alert.participant));
    let _ = writeln!(text, "Amount: {}", amount(alert.amount));
    let _ = writeln!(
        text,
        "Size: {} of total value (threshold {})",
        percent(alert.transaction_percent),
        percent(alert.threshold_percent)
    );
    let _ = write!(text, "Time: {}", escape(&alert.timestamp));
    text
}

fn significant_pnl(alert: &SignificantPnlAlert) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "🚨 *Significant Strategy PnL*");
    let _ = writeln!(text, "Event: {}", escape(alert.kind.display_name()));
    let _ = writeln!(text, "Vault: {}", code(&alert.vault));
    let _ = writeln!(text, "Strategy: {}", code(&alert.strategy));
    let _ = writeln!(text, "Amount: {}", amount(alert.amount));
    let _ = writeln!(text, "{}", pnl_line(&alert.pnl));
    let _ = writeln!(text, "Threshold ratio: {}", ratio(alert.threshold));
    let _ = write!(text, "Time: {}", escape(&alert.timestamp));
    text
}

fn high_frequency(alert: &HighFrequencyAlert) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "🚨 *High Event Frequency*");
    let _ = writeln!(text, "Event: {}", escape(alert.kind.display_name()));
    let _ = writeln!(text, "Vault: {}", code(&alert.vault));
    let _ = writeln!(
        text,
        "Count: {} in {} (threshold {})",
        alert.observed_count,
        escape(&alert.window_label),
        alert.threshold
    );
    let _ = write!(text, "Time: {}", escape(&alert.timestamp));
    text
}

fn unknown_event(candidate: &AlertCandidate) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "❓ *Unknown Event*");
    let _ = writeln!(text, "Event: {}", escape(candidate.kind().as_str()));
    let _ = writeln!(text, "Vault: {}", code(candidate.vault()));
    let _ = write!(text, "Time: {}", escape(candidate.timestamp()));
    text
}

fn pnl_line(pnl: &PnlBreakdown) -> String {
    format!(
        "PnL: {} ({}), ratio {}",
        signed_amount(pnl.pnl),
        signed_percent(pnl.pnl_percent),
        ratio(pnl.pnl_to_amount_ratio)
    )
}

fn amount(value: f64) -> String {
    format!("{value:.2}")
}

fn signed_amount(value: f64) -> String {
    format!("{value:+.2}")
}

fn percent(value: f64) -> String {
    format!("{value:.2}%")
}

fn signed_percent(value: f64) -> String {
    format!("{value:+.2}%")
}

fn ratio(value: f64) -> String {
    if value.is_infinite() {
        "∞".to_string()
    } else {
        format!("{value:.4}")
    }
}

/// Escape Telegram Markdown control characters in free text.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Inline code span. Backticks cannot be escaped inside a span, so they
/// are dropped.
fn code(text: &str) -> String {
    format!("`{}`", text.replace('`', ""))
}
