//! Main application orchestration.
//!
//! Coordinates all components:
//! - Log tailing and event decoding
//! - Classification and cooldowns (`AlertPipeline`)
//! - Fire-and-forget delivery to the dispatch sink
//! - Maintenance jobs and the liveness heartbeat

use crate::config::{AppConfig, DeliveryMode};
use crate::error::AppResult;
use crate::maintenance::{MaintenanceJob, MaintenanceTimers};
use crate::pipeline::AlertPipeline;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vault_feed::{spawn_tail_task, EventDecoder, LogTailer};
use vault_notify::{DispatchSink, LoggingSink, NotificationPayload, TelegramSink};
use vault_telemetry::{LivenessReporter, Metrics};

/// Capacity of the tailer to loop line channel.
const LINE_CHANNEL_CAPACITY: usize = 1024;

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Main application.
pub struct Application {
    config: AppConfig,
    decoder: EventDecoder,
    pipeline: AlertPipeline,
    sink: Arc<dyn DispatchSink>,
    reporter: LivenessReporter,
}

impl Application {
    /// Create an application with the sink selected by the delivery mode.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let sink: Arc<dyn DispatchSink> = match config.effective_mode() {
            DeliveryMode::Live => Arc::new(TelegramSink::new(&config.telegram)?),
            DeliveryMode::DryRun => {
                if config.mode == DeliveryMode::Live {
                    warn!("No Telegram bot token configured, falling back to dry-run delivery");
                }
                Arc::new(LoggingSink)
            }
        };

        Ok(Self::with_sink(config, sink))
    }

    /// Create an application delivering to `sink`.
    pub fn with_sink(config: AppConfig, sink: Arc<dyn DispatchSink>) -> Self {
        let decoder = EventDecoder::new(config.source.expected_origin.clone());
        let pipeline = AlertPipeline::new(config.detector.clone(), config.cooldown.clone());

        Self {
            config,
            decoder,
            pipeline,
            sink,
            reporter: LivenessReporter::new(),
        }
    }

    pub fn pipeline(&self) -> &AlertPipeline {
        &self.pipeline
    }

    pub fn decoder(&self) -> &EventDecoder {
        &self.decoder
    }

    /// Process one input line observed at `now_ms`.
    ///
    /// Returns the delivery tasks started for it. Undecodable lines start none.
    pub fn handle_line(&mut self, line: &str, now_ms: i64) -> Vec<JoinHandle<()>> {
        let event = match self.decoder.try_decode(line) {
            Ok(event) => {
                Metrics::line_accepted();
                event
            }
            Err(rejection) => {
                Metrics::line_discarded(rejection.reason());
                return Vec::new();
            }
        };

        self.pipeline
            .process(&event, now_ms)
            .into_iter()
            .map(|payload| self.dispatch(payload))
            .collect()
    }

    /// Deliver in the background. The outcome is only logged and counted.
    fn dispatch(&self, payload: NotificationPayload) -> JoinHandle<()> {
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            let started = Instant::now();
            let result = sink.deliver(&payload).await;
            let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

            match result {
                Ok(()) => {
                    Metrics::delivery(sink.name(), true, latency_ms);
                    debug!(sink = sink.name(), latency_ms, "Notification delivered");
                }
                Err(e) => {
                    Metrics::delivery(sink.name(), false, latency_ms);
                    warn!(sink = sink.name(), error = %e, "Notification delivery failed");
                }
            }
        })
    }

    fn run_job(&mut self, job: MaintenanceJob) {
        let now = now_ms();
        match job {
            MaintenanceJob::PruneFrequency => {
                self.pipeline.prune_frequency(now);
            }
            MaintenanceJob::PruneCooldowns => {
                self.pipeline.prune_cooldowns(now);
            }
            MaintenanceJob::Heartbeat => {
                self.reporter
                    .report(self.pipeline.tracked_keys(), self.pipeline.cooldown_entries());
                match Metrics::render() {
                    Ok(text) => debug!(metrics = %text, "Metrics snapshot"),
                    Err(e) => warn!(error = %e, "Failed to render metrics"),
                }
            }
        }
    }

    /// Run until Ctrl-C or SIGTERM.
    pub async fn run(self) -> AppResult<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Run until `shutdown` completes.
    ///
    /// Failing to open the log is the only error returned.
    pub async fn run_until(mut self, shutdown: impl Future<Output = ()>) -> AppResult<()> {
        let source = self.config.source.clone();
        let tailer = LogTailer::open(&source.log_path, source.read_from_start)?;

        info!(
            mode = ?self.config.effective_mode(),
            sink = self.sink.name(),
            log_path = %source.log_path.display(),
            expected_origin = %self.decoder.expected_origin(),
            "Starting application"
        );

        let (line_tx, mut line_rx) = mpsc::channel::<String>(LINE_CHANNEL_CAPACITY);
        let token = CancellationToken::new();
        let tail_handle = spawn_tail_task(tailer, source.poll_interval(), line_tx, token.clone());

        let mut timers = MaintenanceTimers::new(&self.config.maintenance);
        tokio::pin!(shutdown);

        info!("Entering main event loop");
        loop {
            tokio::select! {
                line = line_rx.recv() => match line {
                    Some(line) => {
                        self.handle_line(&line, now_ms());
                    }
                    None => {
                        warn!("Log tailer stopped unexpectedly");
                        break;
                    }
                },

                job = timers.next() => self.run_job(job),

                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        // Release the log file; dropping the receiver unblocks a pending send
        token.cancel();
        drop(line_rx);
        if let Err(e) = tail_handle.await {
            warn!(error = %e, "Log tailer task failed");
        }

        let stats = self.decoder.stats();
        info!(
            accepted = stats.accepted(),
            malformed = stats.malformed(),
            foreign = stats.foreign(),
            "Shutting down"
        );
        self.reporter
            .report(self.pipeline.tracked_keys(), self.pipeline.cooldown_entries());

        Ok(())
    }
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
