//! Alert cooldowns.
//!
//! Suppresses repeats of the same alert on the same vault:
//! - `CooldownConfig`: cooldown per severity class and retention for pruning
//! - `RateLimiter`: last successful emission per `CooldownKey`

pub mod config;
pub mod error;
pub mod limiter;

pub use config::CooldownConfig;
pub use error::{LimiterError, LimiterResult};
pub use limiter::{CooldownKey, RateLimiter};
