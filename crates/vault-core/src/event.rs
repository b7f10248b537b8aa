//! Decoded domain events.
//!
//! A `DomainEvent` is one vault state transition reported by the upstream
//! listener. It is immutable once built and carries no derived data.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Upstream event discriminator.
///
/// Names the listener does not (yet) emit to this build are kept verbatim in
/// `Unrecognized` so later stages can ignore or render them without failing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    /// Assets deposited into the vault.
    VaultDeposit,
    /// Assets withdrawn from the vault.
    VaultWithdrawal,
    /// Vault assets allocated to a strategy.
    StrategyDeposit,
    /// Vault assets pulled back from a strategy.
    StrategyWithdrawal,
    /// A user withdrawal served directly out of a strategy.
    DirectStrategyWithdrawal,
    /// Any other event name.
    Unrecognized(String),
}

impl EventKind {
    /// Parse the wire name of an event.
    pub fn from_name(name: &str) -> Self {
        match name {
            "VaultDeposit" => Self::VaultDeposit,
            "VaultWithdrawal" => Self::VaultWithdrawal,
            "StrategyDeposit" => Self::StrategyDeposit,
            "StrategyWithdrawal" => Self::StrategyWithdrawal,
            "DirectStrategyWithdrawal" => Self::DirectStrategyWithdrawal,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    /// Wire name of this event.
    pub fn as_str(&self) -> &str {
        match self {
            Self::VaultDeposit => "VaultDeposit",
            Self::VaultWithdrawal => "VaultWithdrawal",
            Self::StrategyDeposit => "StrategyDeposit",
            Self::StrategyWithdrawal => "StrategyWithdrawal",
            Self::DirectStrategyWithdrawal => "DirectStrategyWithdrawal",
            Self::Unrecognized(name) => name,
        }
    }

    /// Human readable label used in notifications.
    pub fn display_name(&self) -> &str {
        match self {
            Self::VaultDeposit => "Vault Deposit",
            Self::VaultWithdrawal => "Vault Withdrawal",
            Self::StrategyDeposit => "Strategy Deposit",
            Self::StrategyWithdrawal => "Strategy Withdrawal",
            Self::DirectStrategyWithdrawal => "Direct Strategy Withdrawal",
            Self::Unrecognized(name) => name,
        }
    }

    /// Whether this build knows how to classify the event.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }

    /// Whether the event moves assets in or out of a vault (not a strategy).
    pub fn is_vault_flow(&self) -> bool {
        matches!(self, Self::VaultDeposit | Self::VaultWithdrawal)
    }
}

impl From<String> for EventKind {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single payload field.
///
/// The listener sends token amounts either as JSON numbers or as decimal
/// strings (large integers do not survive JSON number encoding).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadValue {
    Number(f64),
    Text(String),
    /// Booleans, nulls and nested values, kept but never read as figures.
    Other(serde_json::Value),
}

impl PayloadValue {
    /// Numeric view of the value.
    ///
    /// Numeric strings are parsed. Non-finite results are rejected so that
    /// every amount reaching the classifier is a finite number.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
            Self::Other(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    /// String view of the value (text fields only).
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            Self::Number(_) | Self::Other(_) => None,
        }
    }
}

impl std::fmt::Display for PayloadValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::Other(v) => write!(f, "{v}"),
        }
    }
}

/// A decoded vault event.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainEvent {
    kind: EventKind,
    vault: String,
    payload: BTreeMap<String, PayloadValue>,
    timestamp: String,
}

impl DomainEvent {
    /// Build an event.
    ///
    /// The vault identifier is trimmed and must be non-empty.
    pub fn new(
        kind: EventKind,
        vault: impl Into<String>,
        payload: BTreeMap<String, PayloadValue>,
        timestamp: impl Into<String>,
    ) -> Result<Self> {
        let vault = vault.into().trim().to_string();
        if vault.is_empty() {
            return Err(CoreError::EmptyVault);
        }

        Ok(Self {
            kind,
            vault,
            payload,
            timestamp: timestamp.into(),
        })
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    /// Vault identifier (the entity key of the event).
    pub fn vault(&self) -> &str {
        &self.vault
    }

    pub fn payload(&self) -> &BTreeMap<String, PayloadValue> {
        &self.payload
    }

    /// Upstream timestamp, kept verbatim.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Numeric payload field, if present and finite.
    pub fn number(&self, field: &str) -> Option<f64> {
        self.payload.get(field).and_then(PayloadValue::as_f64)
    }

    /// Numeric payload field, reading absent or non-numeric values as zero.
    pub fn number_or_zero(&self, field: &str) -> f64 {
        self.number(field).unwrap_or(0.0)
    }

    /// Text payload field, if present.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.payload.get(field).and_then(PayloadValue::as_text)
    }

    /// First non-empty text field among `fields`.
    pub fn first_text(&self, fields: &[&str]) -> Option<&str> {
        fields
            .iter()
            .filter_map(|f| self.text(f))
            .find(|s| !s.trim().is_empty())
    }
}
