use crate::error::WorkerFault;
use crate::parallel::result::{IterationResult, PartitionReport, WorkerState};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use tokio_util::sync::CancellationToken;

/// One partition's slice of a run
pub(crate) struct Worker<'a> {
    pub partition: usize,
    pub assigned: usize,
    pub cancellation: &'a CancellationToken,
    /// Record each returned value (functions) or only count iterations (actions)
    pub keep_results: bool,
}

impl Worker<'_> {
    /// Run the partition to a terminal state.
    ///
    /// Cancellation is polled before every iteration, never during one. A panic or an
    /// `Err` from `invoke` faults this worker only.
    pub fn run<R, F>(self, invoke: &F) -> PartitionReport<R>
    where
        F: Fn() -> Result<R, String> + ?Sized,
    {
        let mut report = PartitionReport {
            partition: self.partition,
            assigned: self.assigned,
            state: WorkerState::Created,
            iterations_run: 0,
            results: Vec::with_capacity(if self.keep_results { self.assigned } else { 0 }),
            fault: None,
        };
        self.transition(&mut report, WorkerState::Running);

        for iteration in 0..self.assigned {
            if self.cancellation.is_cancelled() {
                // partial results of a cancelled worker are not accounted
                report.results.clear();
                self.transition(&mut report, WorkerState::Cancelled);
                return report;
            }

            let outcome = catch_unwind(AssertUnwindSafe(invoke))
                .unwrap_or_else(|payload| Err(panic_message(payload)));
            match outcome {
                Ok(value) => {
                    report.iterations_run += 1;
                    if self.keep_results {
                        report.results.push(IterationResult {
                            partition: self.partition,
                            iteration,
                            value,
                        });
                    }
                }
                Err(message) => {
                    tracing::warn!(partition = self.partition, iteration, "worker faulted: {message}");
                    report.fault = Some(WorkerFault {
                        partition: self.partition,
                        iteration,
                        message,
                    });
                    self.transition(&mut report, WorkerState::Faulted);
                    return report;
                }
            }
        }

        self.transition(&mut report, WorkerState::Completed);
        report
    }

    fn transition<R>(&self, report: &mut PartitionReport<R>, state: WorkerState) {
        tracing::trace!(
            partition = self.partition,
            iterations_run = report.iterations_run,
            from = ?report.state,
            to = ?state,
            "worker state"
        );
        report.state = state;
    }
}

pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}
