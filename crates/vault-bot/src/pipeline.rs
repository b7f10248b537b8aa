//! Alert pipeline.
//!
//! Owns all mutable alerting state: the frequency tracker and the cooldown
//! limiter. Events go through classify, admit, format in arrival order, so
//! the cooldown timestamp is recorded when the decision is made, before any
//! delivery starts.

use tracing::debug;
use vault_core::DomainEvent;
use vault_detector::{Classifier, DetectorConfig, FrequencyTracker};
use vault_limiter::{CooldownConfig, RateLimiter};
use vault_notify::{format_alert, NotificationPayload};
use vault_telemetry::Metrics;

pub struct AlertPipeline {
    classifier: Classifier,
    tracker: FrequencyTracker,
    limiter: RateLimiter,
}

impl AlertPipeline {
    pub fn new(detector: DetectorConfig, cooldown: CooldownConfig) -> Self {
        let classifier = Classifier::new(detector);
        let tracker = classifier.new_tracker();
        Self {
            classifier,
            tracker,
            limiter: RateLimiter::new(cooldown),
        }
    }

    /// Classify an event observed at `now_ms` and return the notifications
    /// that passed their cooldown, in candidate order.
    pub fn process(&mut self, event: &DomainEvent, now_ms: i64) -> Vec<NotificationPayload> {
        let candidates = self.classifier.classify(event, &mut self.tracker, now_ms);

        let mut payloads = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            let severity = candidate.severity();
            let alert_type = candidate.alert_type();
            Metrics::candidate(severity, &alert_type);

            if self.limiter.admit_candidate(candidate, now_ms) {
                payloads.push(format_alert(candidate));
            } else {
                Metrics::suppressed(severity, &alert_type);
            }
        }

        debug!(
            kind = %event.kind(),
            vault = %event.vault(),
            candidates = candidates.len(),
            admitted = payloads.len(),
            "Event processed"
        );
        self.publish_sizes();

        payloads
    }

    /// Drop expired frequency windows. Returns keys removed.
    pub fn prune_frequency(&mut self, now_ms: i64) -> usize {
        let removed = self.tracker.prune_expired(now_ms);
        self.publish_sizes();
        removed
    }

    /// Drop cooldown entries past retention. Returns entries removed.
    pub fn prune_cooldowns(&mut self, now_ms: i64) -> usize {
        let removed = self.limiter.prune(now_ms);
        self.publish_sizes();
        removed
    }

    pub fn tracked_keys(&self) -> usize {
        self.tracker.tracked_keys()
    }

    pub fn cooldown_entries(&self) -> usize {
        self.limiter.entries()
    }

    pub fn publish_sizes(&self) {
        Metrics::state_sizes(self.tracked_keys(), self.cooldown_entries());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use vault_core::{EventKind, PayloadValue};

    fn strategy_event(amount: f64, before: f64, after: f64) -> DomainEvent {
        let mut payload = BTreeMap::new();
        payload.insert("amount".to_string(), PayloadValue::Number(amount));
        payload.insert("totalValueBefore".to_string(), PayloadValue::Number(before));
        payload.insert("totalValueAfter".to_string(), PayloadValue::Number(after));
        payload.insert("strategy".to_string(), PayloadValue::Text("0xs".to_string()));
        DomainEvent::new(EventKind::StrategyDeposit, "0xvault", payload, "t").unwrap()
    }

    fn pipeline() -> AlertPipeline {
        AlertPipeline::new(DetectorConfig::default(), CooldownConfig::default())
    }

    #[test]
    fn test_all_candidates_admitted_first_time() {
        let mut pipeline = pipeline();
        let payloads = pipeline.process(&strategy_event(150.0, 1000.0, 1200.0), 0);

        assert_eq!(payloads.len(), 3);
        assert!(payloads[0].silent);
        assert!(!payloads[1].silent);
        assert!(!payloads[2].silent);
        assert_eq!(pipeline.cooldown_entries(), 3);
    }

    #[test]
    fn test_cooldowns_by_severity() {
        let mut pipeline = pipeline();
        let event = strategy_event(150.0, 1000.0, 1200.0);
        assert_eq!(pipeline.process(&event, 0).len(), 3);

        // Inside every cooldown
        assert!(pipeline.process(&event, 10_000).is_empty());

        // Info cooldown passed, critical still active
        let payloads = pipeline.process(&event, 40_001);
        assert_eq!(payloads.len(), 1);
        assert!(payloads[0].silent);

        // Critical cooldown is anchored to the first emission at 0
        assert_eq!(pipeline.process(&event, 300_001).len(), 3);
    }

    #[test]
    fn test_unknown_kind_processes_to_nothing() {
        let mut pipeline = pipeline();
        let event =
            DomainEvent::new(EventKind::from_name("Rebalanced"), "0xv", BTreeMap::new(), "t")
                .unwrap();
        assert!(pipeline.process(&event, 0).is_empty());
        assert_eq!(pipeline.tracked_keys(), 0);
        assert_eq!(pipeline.cooldown_entries(), 0);
    }

    #[test]
    fn test_maintenance_prunes_state() {
        let mut pipeline = pipeline();
        pipeline.process(&strategy_event(1.0, 1000.0, 1000.0), 0);
        assert_eq!(pipeline.tracked_keys(), 1);

        assert_eq!(pipeline.prune_frequency(30_000), 0);
        assert_eq!(pipeline.prune_frequency(60_000), 1);
        assert_eq!(pipeline.tracked_keys(), 0);

        assert_eq!(pipeline.prune_cooldowns(1_000), 0);
        assert!(pipeline.prune_cooldowns(86_400_001) > 0);
        assert_eq!(pipeline.cooldown_entries(), 0);
    }
}
