//! Worker loop — paced polling of the queue with per-task error
//! containment.
//!
//! Each iteration runs claim → execute → report; every terminal
//! branch returns to pacing. A task that fails at any stage is
//! abandoned after a best-effort failure report, never retried by the
//! worker itself. The only resilience state is the single-level
//! backoff: a transport or unexpected-status error on the claim path
//! stretches the next sleep, and any claim that completes without one
//! (including "no work available") resets it.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::codec::{self, DecodeOptions};
use crate::config::CLAIM_ERROR_BACKOFF;
use crate::engine::SimulationRunner;
use crate::error::{QueueError, TaskError};
use crate::queue::{ReportBody, ReportOutcome, TaskQueue};
use crate::timeseries::{ClaimedTask, SimulationResult, Task};

/// What one loop iteration did. Only observed by tests and logs;
/// every variant continues the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// 204 — nothing to do this round.
    QueueEmpty,
    /// The claim itself failed; no task was acquired.
    ClaimFailed,
    /// Result submitted and recorded by the queue.
    Completed,
    /// Result submitted but the claim had expired (404). Treated as
    /// success for loop purposes, distinguishable for observability.
    CompletedExpired,
    /// Simulation or decoding failed; a failure report was attempted
    /// and the task abandoned.
    TaskFailed,
    /// The result could not be submitted.
    ReportFailed,
}

/// The orchestrating state machine. One task in flight at a time.
pub struct Worker {
    queue: Arc<dyn TaskQueue>,
    engine: Arc<dyn SimulationRunner>,
    wait_time: Duration,
    claim_errored: bool,
}

impl Worker {
    pub fn new(
        queue: Arc<dyn TaskQueue>,
        engine: Arc<dyn SimulationRunner>,
        wait_time: Duration,
    ) -> Self {
        Self {
            queue,
            engine,
            wait_time,
            claim_errored: false,
        }
    }

    /// Pacing delay before the next iteration.
    pub fn next_delay(&self) -> Duration {
        if self.claim_errored {
            CLAIM_ERROR_BACKOFF
        } else {
            self.wait_time
        }
    }

    /// Run indefinitely. Stops only with the process.
    pub async fn run(&mut self) {
        info!(code = "OPERATION_STARTED", "service starts normal operation");
        loop {
            tokio::time::sleep(self.next_delay()).await;
            self.tick().await;
        }
    }

    /// One full iteration, with all task-scoped errors contained.
    pub async fn tick(&mut self) -> CycleOutcome {
        let claimed = match self.queue.claim().await {
            Ok(None) => {
                self.claim_errored = false;
                return CycleOutcome::QueueEmpty;
            }
            Ok(Some(claimed)) => {
                self.claim_errored = false;
                info!(code = "TASK_PULLED", task_id = %claimed.id, "task pulled");
                claimed
            }
            Err(error) => {
                self.claim_errored = error.triggers_backoff();
                warn!(
                    code = claim_error_code(&error),
                    error = %error,
                    "pulling a task failed"
                );
                return CycleOutcome::ClaimFailed;
            }
        };

        self.process(claimed).await
    }

    /// VALIDATE happens inside the claim (the client rejects bodies
    /// with a non-string id or invalid task); from here the task is
    /// trusted and runs EXECUTE → REPORT.
    async fn process(&self, claimed: ClaimedTask) -> CycleOutcome {
        let ClaimedTask { id, task } = claimed;

        let result = match self.execute(&task).await {
            Ok(result) => result,
            Err(error) => {
                warn!(code = "SIMULATION_FAILED", task_id = %id, error = %error, "simulation failed");
                // Report the failure explicitly so the queue can tell
                // "attempted and failed" from "never attempted".
                if let Err(report_error) = self
                    .queue
                    .report(&id, &ReportBody::failure(error.to_string()))
                    .await
                {
                    warn!(
                        code = "SET_RESULT_FAILED",
                        task_id = %id,
                        error = %report_error,
                        "reporting the failure failed"
                    );
                }
                return CycleOutcome::TaskFailed;
            }
        };

        match self
            .queue
            .report(&id, &ReportBody::success(result.output_series))
            .await
        {
            Ok(ReportOutcome::Accepted) => {
                info!(code = "TASK_HANDLED_SUCCESSFULLY", task_id = %id, "successful run");
                CycleOutcome::Completed
            }
            Ok(ReportOutcome::Expired) => {
                warn!(code = "TASK_NOT_AVAILABLE_ANYMORE", task_id = %id, "task not available anymore");
                CycleOutcome::CompletedExpired
            }
            Err(error) => {
                warn!(code = "SET_RESULT_FAILED", task_id = %id, error = %error, "set result failed");
                CycleOutcome::ReportFailed
            }
        }
    }

    /// Drive the engine and decode its output table back into series
    /// rebased onto the task's absolute start time.
    async fn execute(&self, task: &Task) -> Result<SimulationResult, TaskError> {
        let raw_output_table = self.engine.simulate(task).await?;
        let decode_opts = DecodeOptions {
            start_time_ms: Some(task.simulation_parameters.start_time),
            units: None,
        };
        let output_series = codec::decode(&raw_output_table, &decode_opts)?;
        Ok(SimulationResult {
            raw_output_table,
            output_series,
        })
    }
}

fn claim_error_code(error: &QueueError) -> &'static str {
    match error {
        QueueError::Transport(_) => "PULLING_TASK_FAILED",
        QueueError::UnexpectedStatus(_) => "UNEXPECTED_STATUS_CODE",
        QueueError::MalformedResponse(_) => "TASK_INVALID",
        QueueError::InvalidTaskId => "TASK_ID_INVALID",
        QueueError::InvalidTask(_) => "TASK_INVALID",
    }
}
