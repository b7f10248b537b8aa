//! Derived metrics for vault and strategy flows.
//!
//! Pure functions over payload figures. Zero or absent denominators fall back
//! to `1`, which yields a large but finite percentage instead of NaN or
//! infinity. Alert thresholds are tuned against this fallback.

use vault_core::{DomainEvent, PnlBreakdown};

/// Payload field names read by the classifier.
pub mod fields {
    pub const AMOUNT: &str = "amount";
    pub const TOTAL_VALUE_BEFORE: &str = "totalValueBefore";
    pub const TOTAL_VALUE_AFTER: &str = "totalValueAfter";
    pub const STRATEGY: &str = "strategy";
    /// Candidate fields naming the user behind a vault flow, in priority order.
    pub const PARTICIPANT: &[&str] = &["user", "sender", "owner", "receiver"];
}

/// Denominator with the zero fallback applied.
fn denominator(before: f64) -> f64 {
    if before == 0.0 {
        1.0
    } else {
        before
    }
}

/// `(after - before) / before * 100`, with `before` falling back to 1 as divisor.
pub fn percentage_change(before: f64, after: f64) -> f64 {
    (after - before) / denominator(before) * 100.0
}

/// `amount / total_before * 100`, with the same fallback.
pub fn transaction_percent(amount: f64, total_before: f64) -> f64 {
    amount / denominator(total_before) * 100.0
}

/// Profit/loss of a strategy between two valuations.
///
/// The ratio is `+inf` when `amount` is zero, so it exceeds every finite
/// threshold.
pub fn pnl_breakdown(amount: f64, before: f64, after: f64) -> PnlBreakdown {
    let pnl = after - before;
    let pnl_to_amount_ratio = if amount == 0.0 {
        f64::INFINITY
    } else {
        pnl.abs() / amount
    };

    PnlBreakdown {
        pnl,
        pnl_percent: pnl / denominator(before) * 100.0,
        pnl_to_amount_ratio,
    }
}

/// Numeric figures of a flow event, with absent fields read as zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowFigures {
    pub amount: f64,
    pub total_value_before: f64,
    pub total_value_after: f64,
}

impl FlowFigures {
    pub fn from_event(event: &DomainEvent) -> Self {
        Self {
            amount: event.number_or_zero(fields::AMOUNT),
            total_value_before: event.number_or_zero(fields::TOTAL_VALUE_BEFORE),
            total_value_after: event.number_or_zero(fields::TOTAL_VALUE_AFTER),
        }
    }

    pub fn percentage_change(&self) -> f64 {
        percentage_change(self.total_value_before, self.total_value_after)
    }

    pub fn transaction_percent(&self) -> f64 {
        transaction_percent(self.amount, self.total_value_before)
    }

    pub fn pnl(&self) -> PnlBreakdown {
        pnl_breakdown(self.amount, self.total_value_before, self.total_value_after)
    }
}
