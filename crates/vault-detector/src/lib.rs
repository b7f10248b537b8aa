//! Event classification for vault alerting.
//!
//! Turns a decoded `DomainEvent` into zero or more `AlertCandidate`s:
//! - `calc`: percentage and profit/loss figures derived from the payload
//! - `FrequencyTracker`: exact sliding-window occurrence counts per (kind, vault)
//! - `Classifier`: per-kind handlers and threshold checks

pub mod calc;
pub mod classifier;
pub mod config;
pub mod error;
pub mod frequency;

pub use calc::FlowFigures;
pub use classifier::Classifier;
pub use config::DetectorConfig;
pub use error::{DetectorError, DetectorResult};
pub use frequency::{FrequencyKey, FrequencyTracker};
