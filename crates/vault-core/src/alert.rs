//! Alert candidates produced by classification.
//!
//! Candidates are built fresh for every classified event and are never
//! persisted. Each variant carries everything the formatter needs.

use crate::event::EventKind;
use serde::{Deserialize, Serialize};

/// Alert severity. Each severity has its own cooldown class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Routine notification, always produced for a recognized event.
    Info,
    /// Threshold breach that needs operator attention.
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Profit/loss figures derived from a strategy event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PnlBreakdown {
    /// `totalValueAfter - totalValueBefore`.
    pub pnl: f64,
    /// PnL relative to the value before, in percent.
    pub pnl_percent: f64,
    /// `|pnl| / amount`. Infinite when the amount is zero.
    pub pnl_to_amount_ratio: f64,
}

/// Routine notification for a recognized event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoAlert {
    pub kind: EventKind,
    pub vault: String,
    /// User (vault flows) or strategy (strategy flows) behind the event.
    pub participant: String,
    pub amount: f64,
    pub total_value_before: f64,
    pub total_value_after: f64,
    /// Change of total value, in percent.
    pub percentage_change: f64,
    /// Amount relative to the value before, in percent.
    pub transaction_percent: f64,
    /// Present for strategy flows only.
    pub pnl: Option<PnlBreakdown>,
    pub timestamp: String,
}

/// A single flow that moves a large share of the vault or strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LargeTransactionAlert {
    pub kind: EventKind,
    pub vault: String,
    pub participant: String,
    pub amount: f64,
    pub transaction_percent: f64,
    /// Threshold that was exceeded, in percent.
    pub threshold_percent: f64,
    pub timestamp: String,
}

/// Strategy PnL out of proportion with the flow that revealed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignificantPnlAlert {
    pub kind: EventKind,
    pub vault: String,
    pub strategy: String,
    pub amount: f64,
    pub pnl: PnlBreakdown,
    /// Ratio threshold that was exceeded.
    pub threshold: f64,
    pub timestamp: String,
}

/// Too many events of one kind for one vault within the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighFrequencyAlert {
    pub kind: EventKind,
    pub vault: String,
    /// Occurrences inside the window, including the current event.
    pub observed_count: usize,
    pub threshold: usize,
    /// Window length in human form (e.g. "60s").
    pub window_label: String,
    pub timestamp: String,
}

/// Tagged union of everything the classifier can emit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AlertCandidate {
    Info(InfoAlert),
    LargeTransaction(LargeTransactionAlert),
    SignificantPnl(SignificantPnlAlert),
    HighFrequency(HighFrequencyAlert),
}

impl AlertCandidate {
    /// Severity (and therefore cooldown class) of the candidate.
    pub fn severity(&self) -> Severity {
        match self {
            Self::Info(_) => Severity::Info,
            Self::LargeTransaction(_) | Self::SignificantPnl(_) | Self::HighFrequency(_) => {
                Severity::Critical
            }
        }
    }

    /// Alert type label used to build cooldown keys.
    ///
    /// Info alerts are told apart by event kind; high frequency alerts by
    /// the kind that was bursting.
    pub fn alert_type(&self) -> String {
        match self {
            Self::Info(a) => a.kind.as_str().to_string(),
            Self::LargeTransaction(_) => "large_transaction".to_string(),
            Self::SignificantPnl(_) => "significant_pnl".to_string(),
            Self::HighFrequency(a) => format!("high_frequency:{}", a.kind),
        }
    }

    pub fn vault(&self) -> &str {
        match self {
            Self::Info(a) => &a.vault,
            Self::LargeTransaction(a) => &a.vault,
            Self::SignificantPnl(a) => &a.vault,
            Self::HighFrequency(a) => &a.vault,
        }
    }

    pub fn kind(&self) -> &EventKind {
        match self {
            Self::Info(a) => &a.kind,
            Self::LargeTransaction(a) => &a.kind,
            Self::SignificantPnl(a) => &a.kind,
            Self::HighFrequency(a) => &a.kind,
        }
    }

    pub fn timestamp(&self) -> &str {
        match self {
            Self::Info(a) => &a.timestamp,
            Self::LargeTransaction(a) => &a.timestamp,
            Self::SignificantPnl(a) => &a.timestamp,
            Self::HighFrequency(a) => &a.timestamp,
        }
    }
}
