//! Background tuning loop.
//!
//! The tuner runs as one cooperatively scheduled task: sleep for the
//! configured interval, run a round, report, repeat. Shutdown wakes the
//! sleep immediately; an in-flight round finishes its current operation
//! first (the driver checks the same token between operations).

use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{info, warn};

use strata_common::cancel::CancelToken;
use strata_common::error::{StrataError, StrataResult};

use crate::operation::TuningOperation;
use crate::tuner::{RoundReport, RoundStatus, Tuner};

/// Handle to the background tuning thread.
pub struct TuningDaemon {
    handle: Option<JoinHandle<()>>,
    cancel: CancelToken,
}

impl TuningDaemon {
    /// Start the daemon. When tuning is disabled by configuration, no
    /// thread is spawned and the handle is inert.
    pub fn spawn(tuner: Tuner) -> StrataResult<Self> {
        let cancel = tuner.cancel_token();
        if !tuner.config().enabled {
            info!("index tuning disabled by configuration");
            return Ok(Self {
                handle: None,
                cancel,
            });
        }
        let interval = Duration::from_secs(tuner.config().evaluation_interval_secs.max(1));
        let loop_cancel = cancel.clone();
        let mut tuner = tuner;
        let handle = thread::Builder::new()
            .name("strata-index-tuner".into())
            .spawn(move || {
                info!(interval_secs = interval.as_secs(), "index tuning daemon started");
                loop {
                    if loop_cancel.wait_timeout(interval) {
                        break;
                    }
                    match tuner.execute_round() {
                        Ok(report) => record_round(&report),
                        Err(e) => {
                            // Round-local problems retry on the next tick;
                            // anything else is still not worth killing the
                            // host over.
                            warn!(error = %e, "tuning round aborted");
                        }
                    }
                    if loop_cancel.is_cancelled() {
                        break;
                    }
                }
                info!("index tuning daemon stopped");
            })
            .map_err(|e| StrataError::Internal(format!("cannot spawn tuning thread: {e}")))?;
        Ok(Self {
            handle: Some(handle),
            cancel,
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Token shared with the round driver; cancelling it stops both the
    /// sleep loop and any in-flight round at its next operation boundary.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Request shutdown and wait for the thread to exit.
    pub fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for TuningDaemon {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn record_round(report: &RoundReport) {
    let status = match report.status {
        RoundStatus::Completed => "completed",
        RoundStatus::Timeout { .. } => "timeout",
        RoundStatus::Cancelled => "cancelled",
    };
    strata_observability::record_tuning_round(
        report.metrics.choices_considered,
        report.metrics.choices_accepted,
        report.metrics.choices_evicted,
        report.metrics.bytes_delta,
        report.metrics.duration_ms,
        report.metrics.operations_failed,
        status,
    );
    for (operation, outcome) in &report.outcomes {
        let kind = match operation {
            TuningOperation::CreateIndex { .. } => "create",
            TuningOperation::DropIndex { .. } => "drop",
            TuningOperation::NoOp => continue,
        };
        strata_observability::record_tuning_operation(kind, &outcome.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    use strata_common::config::TuningConfig;
    use strata_plan::cache::GdfsCache;
    use strata_storage::catalog::MemoryStorage;

    fn tuner(config: TuningConfig) -> Tuner {
        Tuner::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(GdfsCache::new(16)),
            config,
        )
    }

    #[test]
    fn test_disabled_daemon_spawns_no_thread() {
        let config = TuningConfig {
            enabled: false,
            ..TuningConfig::default()
        };
        let daemon = TuningDaemon::spawn(tuner(config)).unwrap();
        assert!(!daemon.is_running());
        daemon.shutdown();
    }

    #[test]
    fn test_shutdown_wakes_sleeping_daemon() {
        let config = TuningConfig {
            evaluation_interval_secs: 3600,
            ..TuningConfig::default()
        };
        let daemon = TuningDaemon::spawn(tuner(config)).unwrap();
        assert!(daemon.is_running());
        let start = Instant::now();
        daemon.shutdown();
        assert!(
            start.elapsed() < Duration::from_secs(2),
            "shutdown should not wait out the interval"
        );
    }
}
