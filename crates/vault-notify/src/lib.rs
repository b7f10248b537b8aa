//! Alert formatting and delivery.
//!
//! - `format_alert`: pure `AlertCandidate` to `NotificationPayload` rendering
//! - `DispatchSink`: delivery seam, with Telegram, logging and in-memory sinks

pub mod error;
pub mod formatter;
pub mod sink;
pub mod telegram;

pub use error::{NotifyError, NotifyResult};
pub use formatter::{format_alert, NotificationPayload};
pub use sink::{DispatchSink, LoggingSink, MemorySink};
pub use telegram::{TelegramConfig, TelegramSink};
