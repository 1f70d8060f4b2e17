//! Dispatch loop: claim a batch, handle each job, sleep, repeat.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::watch;
use tokio::time;

use taskminder_core::config::DispatcherConfig;
use taskminder_core::result::AppResult;

use crate::claimer::JobClaimer;
use crate::handler::{AttemptOutcome, DeliveryAttemptHandler};

/// `last_error` recorded on a job whose attempt panicked.
pub const PANIC_REASON: &str = "unexpected: panic";

/// Per-iteration counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Jobs claimed this iteration.
    pub claimed: usize,
    /// Jobs delivered.
    pub sent: usize,
    /// Jobs put back behind a retry gate.
    pub rescheduled: usize,
    /// Jobs that reached `failed`.
    pub failed: usize,
    /// Jobs released without a transition (infrastructure errors and
    /// jobs left unhandled at shutdown).
    pub released: usize,
}

impl BatchReport {
    fn record(&mut self, outcome: &AttemptOutcome) {
        match outcome {
            AttemptOutcome::Sent { .. } => self.sent += 1,
            AttemptOutcome::Rescheduled { .. } => self.rescheduled += 1,
            AttemptOutcome::Failed { .. } => self.failed += 1,
            AttemptOutcome::Released { .. } => self.released += 1,
        }
    }
}

/// Long-running reminder dispatcher.
#[derive(Debug)]
pub struct DispatchLoop {
    claimer: JobClaimer,
    handler: DeliveryAttemptHandler,
    poll_interval: Duration,
    batch_pause: Duration,
    worker_id: String,
}

impl DispatchLoop {
    /// Create a dispatch loop using the intervals in `config`.
    pub fn new(
        claimer: JobClaimer,
        handler: DeliveryAttemptHandler,
        config: &DispatcherConfig,
    ) -> Self {
        Self {
            claimer,
            handler,
            poll_interval: Duration::from_secs(config.poll_interval_seconds),
            batch_pause: Duration::from_millis(config.batch_pause_millis),
            worker_id: config.resolved_worker_id(),
        }
    }

    /// Identifier used in logs.
    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    /// Run until `shutdown` flips to `true` or its sender is dropped.
    ///
    /// The job being handled when shutdown arrives is finished; the rest
    /// of its batch is released for the next dispatcher.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            worker_id = %self.worker_id,
            poll_interval_seconds = self.poll_interval.as_secs(),
            claim_mode = ?self.claimer.mode(),
            "Dispatcher started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let pause = match AssertUnwindSafe(self.run_once(&shutdown))
                .catch_unwind()
                .await
            {
                Ok(Ok(report)) if report.claimed == 0 => {
                    tracing::debug!(worker_id = %self.worker_id, "No due notifications");
                    self.poll_interval
                }
                Ok(Ok(report)) => {
                    tracing::info!(
                        worker_id = %self.worker_id,
                        claimed = report.claimed,
                        sent = report.sent,
                        rescheduled = report.rescheduled,
                        failed = report.failed,
                        released = report.released,
                        "Batch processed"
                    );
                    self.batch_pause
                }
                Ok(Err(e)) => {
                    tracing::error!(worker_id = %self.worker_id, error = %e, "Failed to claim notifications");
                    self.poll_interval
                }
                Err(_) => {
                    tracing::error!(worker_id = %self.worker_id, "Dispatch iteration panicked");
                    self.poll_interval
                }
            };

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = time::sleep(pause) => {}
            }
        }

        tracing::info!(worker_id = %self.worker_id, "Dispatcher stopped");
    }

    /// One iteration: claim a batch and handle its jobs in claim order.
    ///
    /// Only a claim failure is returned as an error; per-job failures,
    /// panics included, are recorded on the job.
    pub async fn run_once(&self, shutdown: &watch::Receiver<bool>) -> AppResult<BatchReport> {
        let jobs = self.claimer.claim().await?;
        let mut report = BatchReport {
            claimed: jobs.len(),
            ..Default::default()
        };

        for (index, job) in jobs.iter().enumerate() {
            if *shutdown.borrow() {
                for pending in &jobs[index..] {
                    match self.claimer.release(pending.id, None).await {
                        Ok(_) => report.released += 1,
                        Err(e) => tracing::error!(
                            job_id = %pending.id,
                            error = %e,
                            "Failed to release job at shutdown"
                        ),
                    }
                }
                tracing::info!(
                    worker_id = %self.worker_id,
                    released = jobs.len() - index,
                    "Shutdown requested, released unhandled jobs"
                );
                break;
            }

            match AssertUnwindSafe(self.handler.handle(job))
                .catch_unwind()
                .await
            {
                Ok(outcome) => report.record(&outcome),
                Err(_) => {
                    tracing::error!(job_id = %job.id, "Delivery attempt panicked, releasing job");
                    if let Err(e) = self.claimer.release(job.id, Some(PANIC_REASON)).await {
                        tracing::error!(
                            job_id = %job.id,
                            error = %e,
                            "Failed to release job; it stays claimed"
                        );
                    }
                    report.released += 1;
                }
            }
        }

        Ok(report)
    }
}
