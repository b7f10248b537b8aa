//! Listener log line builders.

use serde_json::{json, Value};

/// A listener record carrying `event` as a JSON-encoded message.
pub fn listener_line(event: Value) -> String {
    json!({
        "level": "info",
        "service": "vault-listener",
        "timestamp": "2024-05-01T12:00:00Z",
        "message": event.to_string()
    })
    .to_string()
}

/// A flow event with the given figures.
pub fn flow_event(name: &str, vault: &str, amount: f64, before: f64, after: f64) -> Value {
    json!({
        "eventName": name,
        "vault": vault,
        "payload": {
            "amount": amount.to_string(),
            "totalValueBefore": before,
            "totalValueAfter": after,
            "user": "0xuser",
            "strategy": "0xstrategy"
        }
    })
}

/// A record from another service.
pub fn foreign_line() -> String {
    json!({
        "service": "rpc-proxy",
        "timestamp": "2024-05-01T12:00:00Z",
        "message": flow_event("VaultDeposit", "0xvault", 1.0, 1.0, 2.0).to_string()
    })
    .to_string()
}
