//! Event classifier.
//!
//! Maps a decoded event onto alert candidates:
//! 1. High frequency check for every recognized event
//! 2. One Info candidate per recognized event
//! 3. Critical candidates when a threshold is strictly exceeded
//!
//! Unrecognized event kinds produce nothing; upstream may add kinds before
//! this service learns about them.

use crate::calc::{fields, FlowFigures};
use crate::config::DetectorConfig;
use crate::frequency::FrequencyTracker;
use tracing::{debug, info};
use vault_core::{
    AlertCandidate, DomainEvent, EventKind, HighFrequencyAlert, InfoAlert, LargeTransactionAlert,
    PnlBreakdown, SignificantPnlAlert,
};

/// Participant label when the payload does not name one.
const UNKNOWN_PARTICIPANT: &str = "unknown";

/// Stateless classifier. Frequency state is owned by the caller.
pub struct Classifier {
    config: DetectorConfig,
}

impl Classifier {
    /// Create a new classifier with configuration.
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Build a frequency tracker sized to this classifier's window.
    pub fn new_tracker(&self) -> FrequencyTracker {
        FrequencyTracker::new(self.config.frequency_window_ms as i64)
    }

    /// Classify an event observed at `now_ms`.
    pub fn classify(
        &self,
        event: &DomainEvent,
        tracker: &mut FrequencyTracker,
        now_ms: i64,
    ) -> Vec<AlertCandidate> {
        if !event.kind().is_recognized() {
            debug!(kind = %event.kind(), vault = %event.vault(), "Ignoring unrecognized event kind");
            return Vec::new();
        }

        let mut candidates = Vec::new();

        let count = tracker.record(event.kind(), event.vault(), now_ms);
        if count >= self.config.frequency_threshold {
            info!(
                kind = %event.kind(),
                vault = %event.vault(),
                count,
                threshold = self.config.frequency_threshold,
                "High event frequency detected"
            );
            candidates.push(AlertCandidate::HighFrequency(HighFrequencyAlert {
                kind: event.kind().clone(),
                vault: event.vault().to_string(),
                observed_count: count,
                threshold: self.config.frequency_threshold,
                window_label: self.config.window_label(),
                timestamp: event.timestamp().to_string(),
            }));
        }

        match event.kind() {
            EventKind::VaultDeposit | EventKind::VaultWithdrawal => {
                self.vault_flow(event, &mut candidates)
            }
            EventKind::StrategyDeposit | EventKind::StrategyWithdrawal => {
                self.strategy_flow(event, &mut candidates)
            }
            EventKind::DirectStrategyWithdrawal => {
                self.direct_strategy_withdrawal(event, &mut candidates)
            }
            EventKind::Unrecognized(_) => {}
        }

        debug!(
            kind = %event.kind(),
            vault = %event.vault(),
            candidates = candidates.len(),
            "Event classified"
        );

        candidates
    }

    /// Vault deposit or withdrawal.
    fn vault_flow(&self, event: &DomainEvent, out: &mut Vec<AlertCandidate>) {
        let figures = FlowFigures::from_event(event);
        let participant = event
            .first_text(fields::PARTICIPANT)
            .unwrap_or(UNKNOWN_PARTICIPANT);

        out.push(self.info(event, &figures, participant, None));

        self.check_large_transaction(
            event,
            &figures,
            participant,
            self.config.large_vault_threshold_percent(),
            out,
        );
    }

    /// Strategy deposit or withdrawal: PnL and size are checked independently.
    fn strategy_flow(&self, event: &DomainEvent, out: &mut Vec<AlertCandidate>) {
        let figures = FlowFigures::from_event(event);
        let strategy = Self::strategy_of(event);
        let pnl = figures.pnl();

        out.push(self.info(event, &figures, strategy, Some(pnl)));

        self.check_pnl(event, &figures, strategy, pnl, out);
        self.check_large_transaction(
            event,
            &figures,
            strategy,
            self.config.large_strategy_threshold_percent(),
            out,
        );
    }

    /// Withdrawal served directly from a strategy: PnL only.
    fn direct_strategy_withdrawal(&self, event: &DomainEvent, out: &mut Vec<AlertCandidate>) {
        let figures = FlowFigures::from_event(event);
        let strategy = Self::strategy_of(event);
        let pnl = figures.pnl();

        out.push(self.info(event, &figures, strategy, Some(pnl)));

        self.check_pnl(event, &figures, strategy, pnl, out);
    }

    fn strategy_of(event: &DomainEvent) -> &str {
        event
            .first_text(&[fields::STRATEGY])
            .unwrap_or(UNKNOWN_PARTICIPANT)
    }

    fn info(
        &self,
        event: &DomainEvent,
        figures: &FlowFigures,
        participant: &str,
        pnl: Option<PnlBreakdown>,
    ) -> AlertCandidate {
        AlertCandidate::Info(InfoAlert {
            kind: event.kind().clone(),
            vault: event.vault().to_string(),
            participant: participant.to_string(),
            amount: figures.amount,
            total_value_before: figures.total_value_before,
            total_value_after: figures.total_value_after,
            percentage_change: figures.percentage_change(),
            transaction_percent: figures.transaction_percent(),
            pnl,
            timestamp: event.timestamp().to_string(),
        })
    }

    fn check_large_transaction(
        &self,
        event: &DomainEvent,
        figures: &FlowFigures,
        participant: &str,
        threshold_percent: f64,
        out: &mut Vec<AlertCandidate>,
    ) {
        let transaction_percent = figures.transaction_percent();
        if transaction_percent <= threshold_percent {
            return;
        }

        info!(
            kind = %event.kind(),
            vault = %event.vault(),
            amount = figures.amount,
            transaction_percent,
            threshold_percent,
            "Large transaction detected"
        );

        out.push(AlertCandidate::LargeTransaction(LargeTransactionAlert {
            kind: event.kind().clone(),
            vault: event.vault().to_string(),
            participant: participant.to_string(),
            amount: figures.amount,
            transaction_percent,
            threshold_percent,
            timestamp: event.timestamp().to_string(),
        }));
    }

    fn check_pnl(
        &self,
        event: &DomainEvent,
        figures: &FlowFigures,
        strategy: &str,
        pnl: PnlBreakdown,
        out: &mut Vec<AlertCandidate>,
    ) {
        // An infinite ratio (zero amount) exceeds any finite threshold
        if pnl.pnl_to_amount_ratio <= self.config.pnl_threshold {
            return;
        }

        info!(
            kind = %event.kind(),
            vault = %event.vault(),
            strategy,
            pnl = pnl.pnl,
            pnl_percent = pnl.pnl_percent,
            ratio = pnl.pnl_to_amount_ratio,
            threshold = self.config.pnl_threshold,
            "Significant strategy PnL detected"
        );

        out.push(AlertCandidate::SignificantPnl(SignificantPnlAlert {
            kind: event.kind().clone(),
            vault: event.vault().to_string(),
            strategy: strategy.to_string(),
            amount: figures.amount,
            pnl,
            threshold: self.config.pnl_threshold,
            timestamp: event.timestamp().to_string(),
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use vault_core::{PayloadValue, Severity};

    fn event(kind: EventKind, amount: f64, before: f64, after: f64) -> DomainEvent {
        let mut payload = BTreeMap::new();
        payload.insert("amount".to_string(), PayloadValue::Number(amount));
        payload.insert("totalValueBefore".to_string(), PayloadValue::Number(before));
        payload.insert("totalValueAfter".to_string(), PayloadValue::Number(after));
        payload.insert("user".to_string(), PayloadValue::Text("0xuser".to_string()));
        payload.insert(
            "strategy".to_string(),
            PayloadValue::Text("0xstrategy".to_string()),
        );
        DomainEvent::new(kind, "0xvault", payload, "2024-05-01T12:00:00Z").unwrap()
    }

    fn classify_once(event: &DomainEvent) -> Vec<AlertCandidate> {
        let classifier = Classifier::new(DetectorConfig::default());
        let mut tracker = classifier.new_tracker();
        classifier.classify(event, &mut tracker, 0)
    }

    fn types(candidates: &[AlertCandidate]) -> Vec<String> {
        candidates.iter().map(AlertCandidate::alert_type).collect()
    }

    #[test]
    fn test_vault_deposit_zero_amount_no_change() {
        let candidates = classify_once(&event(EventKind::VaultDeposit, 0.0, 500.0, 500.0));

        assert_eq!(candidates.len(), 1);
        let AlertCandidate::Info(info) = &candidates[0] else {
            panic!("expected info candidate");
        };
        assert_eq!(info.percentage_change, 0.0);
        assert_eq!(info.participant, "0xuser");
        assert!(info.pnl.is_none());
    }

    #[test]
    fn test_vault_large_transaction() {
        let candidates = classify_once(&event(EventKind::VaultWithdrawal, 150.0, 1000.0, 850.0));
        assert_eq!(types(&candidates), vec!["VaultWithdrawal", "large_transaction"]);

        let AlertCandidate::LargeTransaction(large) = &candidates[1] else {
            panic!("expected large transaction");
        };
        assert_eq!(large.transaction_percent, 15.0);
        assert_eq!(large.threshold_percent, 10.0);
    }

    #[test]
    fn test_threshold_is_strict() {
        // Exactly 10% is not above the 10% threshold
        let candidates = classify_once(&event(EventKind::VaultDeposit, 100.0, 1000.0, 1100.0));
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].severity(), Severity::Info);
    }

    #[test]
    fn test_strategy_deposit_pnl_only() {
        let candidates = classify_once(&event(EventKind::StrategyDeposit, 100.0, 1000.0, 1200.0));
        assert_eq!(types(&candidates), vec!["StrategyDeposit", "significant_pnl"]);

        let AlertCandidate::SignificantPnl(pnl) = &candidates[1] else {
            panic!("expected pnl candidate");
        };
        assert_eq!(pnl.pnl.pnl, 200.0);
        assert_eq!(pnl.pnl.pnl_percent, 20.0);
        assert_eq!(pnl.pnl.pnl_to_amount_ratio, 2.0);
        assert_eq!(pnl.strategy, "0xstrategy");
    }

    #[test]
    fn test_strategy_deposit_three_candidates() {
        let candidates = classify_once(&event(EventKind::StrategyDeposit, 150.0, 1000.0, 1200.0));
        assert_eq!(
            types(&candidates),
            vec!["StrategyDeposit", "significant_pnl", "large_transaction"]
        );
    }

    #[test]
    fn test_strategy_pnl_below_threshold() {
        // |pnl| / amount = 0.5 / 100 = 0.005 <= 0.01
        let candidates = classify_once(&event(EventKind::StrategyWithdrawal, 100.0, 1000.0, 1000.5));
        assert_eq!(types(&candidates), vec!["StrategyWithdrawal"]);
    }

    #[test]
    fn test_zero_amount_strategy_trips_pnl() {
        let candidates = classify_once(&event(EventKind::StrategyWithdrawal, 0.0, 1000.0, 1000.0));
        assert_eq!(types(&candidates), vec!["StrategyWithdrawal", "significant_pnl"]);
    }

    #[test]
    fn test_direct_withdrawal_never_large_transaction() {
        let candidates = classify_once(&event(
            EventKind::DirectStrategyWithdrawal,
            900.0,
            1000.0,
            50.0,
        ));
        assert_eq!(
            types(&candidates),
            vec!["DirectStrategyWithdrawal", "significant_pnl"]
        );
    }

    #[test]
    fn test_unknown_kind_produces_nothing() {
        let classifier = Classifier::new(DetectorConfig::default());
        let mut tracker = classifier.new_tracker();
        let unknown = event(EventKind::from_name("VaultPaused"), 1.0, 1.0, 1.0);

        for i in 0..20 {
            assert!(classifier.classify(&unknown, &mut tracker, i).is_empty());
        }
        assert_eq!(tracker.tracked_keys(), 0);
    }

    #[test]
    fn test_high_frequency_on_tenth_event() {
        let classifier = Classifier::new(DetectorConfig::default());
        let mut tracker = classifier.new_tracker();
        let deposit = event(EventKind::VaultDeposit, 1.0, 1000.0, 1001.0);

        for i in 0..9 {
            let candidates = classifier.classify(&deposit, &mut tracker, i * 1_000);
            assert_eq!(types(&candidates), vec!["VaultDeposit"]);
        }

        let candidates = classifier.classify(&deposit, &mut tracker, 9_000);
        assert_eq!(
            types(&candidates),
            vec!["high_frequency:VaultDeposit", "VaultDeposit"]
        );
        let AlertCandidate::HighFrequency(hf) = &candidates[0] else {
            panic!("expected high frequency first");
        };
        assert_eq!(hf.observed_count, 10);
        assert_eq!(hf.window_label, "60s");
    }

    #[test]
    fn test_missing_participant_reads_unknown() {
        let mut payload = BTreeMap::new();
        payload.insert("amount".to_string(), PayloadValue::Number(1.0));
        let event = DomainEvent::new(EventKind::VaultDeposit, "0xvault", payload, "t").unwrap();

        let candidates = classify_once(&event);
        let AlertCandidate::Info(info) = &candidates[0] else {
            panic!("expected info");
        };
        assert_eq!(info.participant, "unknown");
        // amount 1 against a zero (fallback 1) denominator
        assert_eq!(info.transaction_percent, 100.0);
    }
}
