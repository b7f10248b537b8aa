//! Dispatch sinks.

use crate::error::{NotifyError, NotifyResult};
use crate::formatter::NotificationPayload;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// Delivery seam for formatted notifications.
#[async_trait]
pub trait DispatchSink: Send + Sync {
    /// Sink name used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Deliver one notification.
    async fn deliver(&self, payload: &NotificationPayload) -> NotifyResult<()>;
}

/// Dry-run sink: logs every notification and always succeeds.
#[derive(Debug, Default)]
pub struct LoggingSink;

#[async_trait]
impl DispatchSink for LoggingSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn deliver(&self, payload: &NotificationPayload) -> NotifyResult<()> {
        info!(
            silent = payload.silent,
            text = %payload.text,
            "[DRY-RUN] Notification"
        );
        Ok(())
    }
}

/// Sink that keeps delivered payloads in memory.
///
/// Can be switched to fail every delivery.
#[derive(Debug, Default)]
pub struct MemorySink {
    delivered: Mutex<Vec<NotificationPayload>>,
    fail: AtomicBool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that rejects every delivery.
    pub fn failing() -> Self {
        let sink = Self::default();
        sink.set_failing(true);
        sink
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::Relaxed);
    }

    /// Payloads delivered so far, in order.
    pub fn delivered(&self) -> Vec<NotificationPayload> {
        self.delivered.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.delivered.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.delivered.lock().is_empty()
    }
}

#[async_trait]
impl DispatchSink for MemorySink {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn deliver(&self, payload: &NotificationPayload) -> NotifyResult<()> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(NotifyError::Other("memory sink set to fail".to_string()));
        }
        self.delivered.lock().push(payload.clone());
        Ok(())
    }
}
