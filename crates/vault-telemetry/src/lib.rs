//! Prometheus metrics and structured logging for vault alerting.
//!
//! - Structured logging with tracing (JSON in production)
//! - Prometheus counters for decoding, classification and delivery
//! - Periodic liveness report

pub mod error;
pub mod heartbeat;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use heartbeat::{LivenessReporter, LivenessSnapshot};
pub use logging::{init_logging, DEFAULT_FILTER};
pub use metrics::Metrics;
