//! Maintenance scheduling.
//!
//! Three independent periodic jobs run from the application loop:
//! frequency pruning, cooldown pruning and the liveness heartbeat. The loop
//! is the single writer of alerting state, so jobs never overlap with event
//! processing.

use crate::config::MaintenanceConfig;
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Maintenance job due on a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenanceJob {
    PruneFrequency,
    PruneCooldowns,
    Heartbeat,
}

/// Timers for the maintenance jobs. The first tick of each fires one full
/// period after creation.
pub struct MaintenanceTimers {
    frequency: Interval,
    cooldown: Interval,
    heartbeat: Interval,
}

impl MaintenanceTimers {
    pub fn new(config: &MaintenanceConfig) -> Self {
        Self {
            frequency: timer(config.frequency_prune_interval_ms),
            cooldown: timer(config.cooldown_prune_interval_ms),
            heartbeat: timer(config.heartbeat_interval_ms),
        }
    }

    /// Wait for the next due job.
    pub async fn next(&mut self) -> MaintenanceJob {
        tokio::select! {
            _ = self.frequency.tick() => MaintenanceJob::PruneFrequency,
            _ = self.cooldown.tick() => MaintenanceJob::PruneCooldowns,
            _ = self.heartbeat.tick() => MaintenanceJob::Heartbeat,
        }
    }
}

fn timer(period_ms: u64) -> Interval {
    // `interval_at` panics on a zero period
    let period = Duration::from_millis(period_ms.max(1));
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}
