//! Listener log ingestion and event decoding.
//!
//! Turns the upstream listener's log stream into typed `DomainEvent`s:
//! - `LogTailer` follows an append-only log file
//! - `EventDecoder` performs the two-stage envelope/event decode and
//!   drops lines that are not events from the expected origin

pub mod decoder;
pub mod error;
pub mod tailer;

pub use decoder::{DecodeStats, EventDecoder, Rejection, DEFAULT_ORIGIN};
pub use error::{FeedError, FeedResult};
pub use tailer::{spawn_tail_task, LogTailer};
