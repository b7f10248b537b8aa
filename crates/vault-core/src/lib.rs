//! Core domain types for vault event alerting.
//!
//! This crate provides the types shared by every stage of the alert pipeline:
//! - `DomainEvent`: A decoded vault state transition
//! - `EventKind`: The upstream event discriminator
//! - `PayloadValue`: Loosely typed payload fields (number or string)
//! - `AlertCandidate`: Tagged union of alerts produced by classification

pub mod alert;
pub mod error;
pub mod event;

pub use alert::{
    AlertCandidate, HighFrequencyAlert, InfoAlert, LargeTransactionAlert, PnlBreakdown, Severity,
    SignificantPnlAlert,
};
pub use error::{CoreError, Result};
pub use event::{DomainEvent, EventKind, PayloadValue};
