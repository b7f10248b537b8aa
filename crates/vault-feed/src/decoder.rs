//! Event decoding for listener log lines.
//!
//! Each line is a JSON log record. Decoding happens in two stages:
//! 1. Envelope: `{"service": "...", "message": ..., "timestamp": ...}`
//! 2. Event: `message` holds the event, either inline or as a JSON-encoded string
//!
//! The log legitimately interleaves unrelated records (startup banners, RPC
//! retries, other services), so a line that does not decode is expected noise
//! and is dropped without surfacing an error.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;
use vault_core::{DomainEvent, EventKind, PayloadValue};

/// Origin tag emitted by the upstream listener service.
pub const DEFAULT_ORIGIN: &str = "vault-listener";

/// Decode counters.
#[derive(Debug, Default)]
pub struct DecodeStats {
    accepted: AtomicU64,
    malformed: AtomicU64,
    foreign: AtomicU64,
}

impl DecodeStats {
    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    pub fn malformed(&self) -> u64 {
        self.malformed.load(Ordering::Relaxed)
    }

    pub fn foreign(&self) -> u64 {
        self.foreign.load(Ordering::Relaxed)
    }
}

/// Why a line was not turned into an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Not JSON, or a required field is missing or mistyped.
    Malformed(String),
    /// Well formed, but logged by another service.
    ForeignOrigin(String),
}

impl Rejection {
    /// Short label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "malformed",
            Self::ForeignOrigin(_) => "foreign_origin",
        }
    }
}

/// Outer log record.
#[derive(Debug, Deserialize)]
struct Envelope {
    service: String,
    message: Value,
    #[serde(default)]
    timestamp: Option<Value>,
}

/// Inner event record.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvent {
    event_name: String,
    #[serde(alias = "vaultAddress")]
    vault: String,
    #[serde(default, alias = "args", alias = "data")]
    payload: BTreeMap<String, PayloadValue>,
    #[serde(default)]
    timestamp: Option<Value>,
}

/// Stringify a timestamp field. Listeners emit ISO strings or epoch numbers.
fn timestamp_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Decoder for listener log lines.
pub struct EventDecoder {
    expected_origin: String,
    stats: DecodeStats,
}

impl EventDecoder {
    /// Create a decoder accepting events from `expected_origin` only.
    pub fn new(expected_origin: impl Into<String>) -> Self {
        Self {
            expected_origin: expected_origin.into(),
            stats: DecodeStats::default(),
        }
    }

    pub fn expected_origin(&self) -> &str {
        &self.expected_origin
    }

    pub fn stats(&self) -> &DecodeStats {
        &self.stats
    }

    /// Decode a line into an event, or `None` if it is not one.
    pub fn decode(&self, line: &str) -> Option<DomainEvent> {
        self.try_decode(line).ok()
    }

    /// Decode a line, reporting why it was dropped.
    pub fn try_decode(&self, line: &str) -> Result<DomainEvent, Rejection> {
        let result = self.decode_inner(line);

        match &result {
            Ok(event) => {
                self.stats.accepted.fetch_add(1, Ordering::Relaxed);
                trace!(kind = %event.kind(), vault = %event.vault(), "Decoded event");
            }
            Err(rejection @ Rejection::Malformed(_)) => {
                self.stats.malformed.fetch_add(1, Ordering::Relaxed);
                trace!(?rejection, "Skipping non-event line");
            }
            Err(rejection @ Rejection::ForeignOrigin(_)) => {
                self.stats.foreign.fetch_add(1, Ordering::Relaxed);
                trace!(?rejection, "Skipping line from foreign origin");
            }
        }

        result
    }

    fn decode_inner(&self, line: &str) -> Result<DomainEvent, Rejection> {
        let line = line.trim();
        if line.is_empty() {
            return Err(Rejection::Malformed("empty line".to_string()));
        }

        // Stage 1: envelope
        let envelope: Envelope = serde_json::from_str(line)
            .map_err(|e| Rejection::Malformed(format!("envelope: {e}")))?;

        // Stage 2: event (inline object or JSON-encoded string)
        let raw: RawEvent = match envelope.message {
            Value::String(s) => serde_json::from_str(&s),
            other => serde_json::from_value(other),
        }
        .map_err(|e| Rejection::Malformed(format!("event: {e}")))?;

        let timestamp = timestamp_text(raw.timestamp.as_ref())
            .or_else(|| timestamp_text(envelope.timestamp.as_ref()))
            .ok_or_else(|| Rejection::Malformed("missing timestamp".to_string()))?;

        let event = DomainEvent::new(
            EventKind::from_name(&raw.event_name),
            raw.vault,
            raw.payload,
            timestamp,
        )
        .map_err(|e| Rejection::Malformed(e.to_string()))?;

        if envelope.service != self.expected_origin {
            return Err(Rejection::ForeignOrigin(envelope.service));
        }

        Ok(event)
    }
}

impl Default for EventDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_ORIGIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event_line(service: &str, inner: Value) -> String {
        json!({
            "level": "info",
            "service": service,
            "timestamp": "2024-05-01T12:00:00.000Z",
            "message": inner.to_string(),
        })
        .to_string()
    }

    fn deposit() -> Value {
        json!({
            "eventName": "VaultDeposit",
            "vault": "0xvault",
            "payload": {
                "amount": "100",
                "totalValueBefore": 1000,
                "totalValueAfter": 1100,
                "user": "0xuser"
            },
            "timestamp": "2024-05-01T12:00:01.000Z"
        })
    }

    #[test]
    fn test_decode_string_encoded_message() {
        let decoder = EventDecoder::default();
        let event = decoder
            .decode(&event_line(DEFAULT_ORIGIN, deposit()))
            .expect("should decode");

        assert_eq!(event.kind(), &EventKind::VaultDeposit);
        assert_eq!(event.vault(), "0xvault");
        assert_eq!(event.number("amount"), Some(100.0));
        assert_eq!(event.text("user"), Some("0xuser"));
        // Inner timestamp wins over the envelope's
        assert_eq!(event.timestamp(), "2024-05-01T12:00:01.000Z");
        assert_eq!(decoder.stats().accepted(), 1);
    }

    #[test]
    fn test_decode_inline_message_and_aliases() {
        let decoder = EventDecoder::default();
        let line = json!({
            "service": DEFAULT_ORIGIN,
            "timestamp": 1714564800000_i64,
            "message": {
                "eventName": "StrategyDeposit",
                "vaultAddress": "0xvault",
                "args": { "amount": 5, "strategy": "0xstrat" }
            }
        })
        .to_string();

        let event = decoder.decode(&line).expect("should decode");
        assert_eq!(event.kind(), &EventKind::StrategyDeposit);
        assert_eq!(event.text("strategy"), Some("0xstrat"));
        assert_eq!(event.timestamp(), "1714564800000");
    }

    #[test]
    fn test_non_scalar_payload_fields_kept() {
        let decoder = EventDecoder::default();
        let inner = json!({
            "eventName": "VaultWithdrawal",
            "vault": "0xvault",
            "payload": {
                "amount": 7,
                "isEmergency": false,
                "route": ["0xa", "0xb"],
                "memo": null
            },
            "timestamp": "t"
        });

        let event = decoder
            .decode(&event_line(DEFAULT_ORIGIN, inner))
            .expect("should decode");
        assert_eq!(event.number("amount"), Some(7.0));
        assert_eq!(event.number("isEmergency"), None);
        assert_eq!(event.payload().len(), 4);
    }

    #[test]
    fn test_foreign_origin_dropped() {
        let decoder = EventDecoder::default();
        let result = decoder.try_decode(&event_line("price-oracle", deposit()));

        assert_eq!(
            result.unwrap_err(),
            Rejection::ForeignOrigin("price-oracle".to_string())
        );
        assert_eq!(decoder.stats().foreign(), 1);
        assert_eq!(decoder.stats().accepted(), 0);
    }

    #[test]
    fn test_non_json_lines_dropped() {
        let decoder = EventDecoder::default();

        for line in [
            "",
            "Listener started on block 19000000",
            "{\"service\": \"vault-listener\"}",
            "{\"service\": \"vault-listener\", \"message\": \"RPC timeout, retrying\"}",
        ] {
            let result = decoder.try_decode(line);
            assert!(
                matches!(result, Err(Rejection::Malformed(_))),
                "line should be malformed: {line:?}"
            );
        }
        assert_eq!(decoder.stats().malformed(), 4);
    }

    #[test]
    fn test_missing_vault_dropped() {
        let decoder = EventDecoder::default();
        let inner = json!({
            "eventName": "VaultDeposit",
            "vault": "",
            "payload": {},
            "timestamp": "t"
        });
        assert!(decoder.decode(&event_line(DEFAULT_ORIGIN, inner)).is_none());
    }

    #[test]
    fn test_missing_timestamp_dropped() {
        let decoder = EventDecoder::default();
        let line = json!({
            "service": DEFAULT_ORIGIN,
            "message": { "eventName": "VaultDeposit", "vault": "0xvault" }
        })
        .to_string();
        assert!(decoder.decode(&line).is_none());
    }

    #[test]
    fn test_unknown_event_name_still_decodes() {
        let decoder = EventDecoder::default();
        let inner = json!({
            "eventName": "StrategyRebalanced",
            "vault": "0xvault",
            "timestamp": "t"
        });
        let event = decoder
            .decode(&event_line(DEFAULT_ORIGIN, inner))
            .expect("unknown kinds are decoded for the classifier to ignore");
        assert!(!event.kind().is_recognized());
    }

    #[test]
    fn test_rejection_reason_labels() {
        assert_eq!(Rejection::Malformed(String::new()).reason(), "malformed");
        assert_eq!(
            Rejection::ForeignOrigin(String::new()).reason(),
            "foreign_origin"
        );
    }
}
