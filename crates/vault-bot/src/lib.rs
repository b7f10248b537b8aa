//! Vault event alerting service.
//!
//! Follows the vault listener's log and turns vault and strategy flows into
//! Telegram alerts:
//! - `AlertPipeline`: classification and cooldowns, single writer of state
//! - `MaintenanceTimers`: periodic pruning and heartbeat
//! - `Application`: event loop, delivery and shutdown

pub mod app;
pub mod config;
pub mod error;
pub mod maintenance;
pub mod pipeline;

pub use app::Application;
pub use config::{AppConfig, DeliveryMode};
pub use error::{AppError, AppResult};
pub use maintenance::{MaintenanceJob, MaintenanceTimers};
pub use pipeline::AlertPipeline;
