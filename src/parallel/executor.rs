use crate::error::{WorkError, WorkOutcome};
use crate::parallel::balancer::{PartitionMap, WorkBalancer};
use crate::parallel::result::{PartitionReport, WorkResult, WorkerState};
use crate::parallel::worker::Worker;
use crate::work::{Work, WorkContract};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// Runs a delegate `iterations_requested` times, one OS thread per balanced partition.
///
/// Parameters are shared by reference between every worker and every iteration; the
/// executor never clones them. Use atomics or locks inside the parameter when the
/// delegate mutates it.
///
/// Validation errors are returned before any worker starts. Worker faults and
/// cancellation are reported on the `WorkResult`, see `WorkResult::check`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkExecutor {
    balancer: WorkBalancer,
}

impl WorkExecutor {
    pub fn new(balancer: WorkBalancer) -> Self {
        Self { balancer }
    }

    /// Run `action` with no parameters
    pub fn execute<F>(&self, contract: &WorkContract, action: F) -> WorkOutcome<WorkResult<()>>
    where
        F: Fn() + Sync,
    {
        self.execute_partitions(contract, false, &|| {
            action();
            Ok(())
        })
    }

    /// Run `action` with one parameter shared by every iteration
    pub fn execute_with<P, F>(&self, contract: &WorkContract, action: F, param: &P) -> WorkOutcome<WorkResult<()>>
    where
        P: Sync + ?Sized,
        F: Fn(&P) + Sync,
    {
        self.execute_partitions(contract, false, &|| {
            action(param);
            Ok(())
        })
    }

    pub fn execute_with2<P1, P2, F>(
        &self,
        contract: &WorkContract,
        action: F,
        first: &P1,
        second: &P2,
    ) -> WorkOutcome<WorkResult<()>>
    where
        P1: Sync + ?Sized,
        P2: Sync + ?Sized,
        F: Fn(&P1, &P2) + Sync,
    {
        self.execute_partitions(contract, false, &|| {
            action(first, second);
            Ok(())
        })
    }

    /// Run `function` and keep every returned value
    pub fn compute<R, F>(&self, contract: &WorkContract, function: F) -> WorkOutcome<WorkResult<R>>
    where
        R: Send,
        F: Fn() -> R + Sync,
    {
        self.execute_partitions(contract, true, &|| Ok(function()))
    }

    pub fn compute_with<P, R, F>(&self, contract: &WorkContract, function: F, param: &P) -> WorkOutcome<WorkResult<R>>
    where
        P: Sync + ?Sized,
        R: Send,
        F: Fn(&P) -> R + Sync,
    {
        self.execute_partitions(contract, true, &|| Ok(function(param)))
    }

    pub fn compute_with2<P1, P2, R, F>(
        &self,
        contract: &WorkContract,
        function: F,
        first: &P1,
        second: &P2,
    ) -> WorkOutcome<WorkResult<R>>
    where
        P1: Sync + ?Sized,
        P2: Sync + ?Sized,
        R: Send,
        F: Fn(&P1, &P2) -> R + Sync,
    {
        self.execute_partitions(contract, true, &|| Ok(function(first, second)))
    }

    /// Like `compute_with`, but an `Err` from `function` faults the worker that produced it
    pub fn try_compute_with<P, R, E, F>(
        &self,
        contract: &WorkContract,
        function: F,
        param: &P,
    ) -> WorkOutcome<WorkResult<R>>
    where
        P: Sync + ?Sized,
        R: Send,
        E: Display,
        F: Fn(&P) -> Result<R, E> + Sync,
    {
        self.execute_partitions(contract, true, &|| {
            function(param).map_err(|err| err.to_string())
        })
    }

    /// Run a `Work`, applying its mutator around every invocation
    pub fn run<P, R>(&self, contract: &WorkContract, work: &Work<P, R>, param: &P) -> WorkOutcome<WorkResult<R>>
    where
        P: Sync,
        R: Send,
    {
        self.execute_partitions(contract, true, &|| Ok(work.invoke(param)))
    }

    pub async fn execute_async<F>(&self, contract: &WorkContract, action: F) -> WorkOutcome<WorkResult<()>>
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.execute_partitions_async(contract, false, move || {
            action();
            Ok(())
        })
        .await
    }

    pub async fn execute_with_async<P, F>(
        &self,
        contract: &WorkContract,
        action: F,
        param: Arc<P>,
    ) -> WorkOutcome<WorkResult<()>>
    where
        P: Send + Sync + ?Sized + 'static,
        F: Fn(&P) + Send + Sync + 'static,
    {
        self.execute_partitions_async(contract, false, move || {
            action(&param);
            Ok(())
        })
        .await
    }

    pub async fn compute_async<R, F>(&self, contract: &WorkContract, function: F) -> WorkOutcome<WorkResult<R>>
    where
        R: Send + 'static,
        F: Fn() -> R + Send + Sync + 'static,
    {
        self.execute_partitions_async(contract, true, move || Ok(function()))
            .await
    }

    pub async fn compute_with_async<P, R, F>(
        &self,
        contract: &WorkContract,
        function: F,
        param: Arc<P>,
    ) -> WorkOutcome<WorkResult<R>>
    where
        P: Send + Sync + ?Sized + 'static,
        R: Send + 'static,
        F: Fn(&P) -> R + Send + Sync + 'static,
    {
        self.execute_partitions_async(contract, true, move || Ok(function(&param)))
            .await
    }

    pub async fn execute_with2_async<P1, P2, F>(
        &self,
        contract: &WorkContract,
        action: F,
        first: Arc<P1>,
        second: Arc<P2>,
    ) -> WorkOutcome<WorkResult<()>>
    where
        P1: Send + Sync + ?Sized + 'static,
        P2: Send + Sync + ?Sized + 'static,
        F: Fn(&P1, &P2) + Send + Sync + 'static,
    {
        self.execute_partitions_async(contract, false, move || {
            action(&first, &second);
            Ok(())
        })
        .await
    }

    pub async fn compute_with2_async<P1, P2, R, F>(
        &self,
        contract: &WorkContract,
        function: F,
        first: Arc<P1>,
        second: Arc<P2>,
    ) -> WorkOutcome<WorkResult<R>>
    where
        P1: Send + Sync + ?Sized + 'static,
        P2: Send + Sync + ?Sized + 'static,
        R: Send + 'static,
        F: Fn(&P1, &P2) -> R + Send + Sync + 'static,
    {
        self.execute_partitions_async(contract, true, move || Ok(function(&first, &second)))
            .await
    }

    /// Async `try_compute_with`
    pub async fn try_compute_with_async<P, R, E, F>(
        &self,
        contract: &WorkContract,
        function: F,
        param: Arc<P>,
    ) -> WorkOutcome<WorkResult<R>>
    where
        P: Send + Sync + ?Sized + 'static,
        R: Send + 'static,
        E: Display,
        F: Fn(&P) -> Result<R, E> + Send + Sync + 'static,
    {
        self.execute_partitions_async(contract, true, move || {
            function(&param).map_err(|err| err.to_string())
        })
        .await
    }

    /// Validate and balance; nothing has been spawned when this fails
    fn prepare(&self, contract: &WorkContract) -> WorkOutcome<PartitionMap> {
        contract.validate()?;
        self.balancer.balance(contract)
    }

    fn execute_partitions<R, F>(
        &self,
        contract: &WorkContract,
        keep_results: bool,
        invoke: &F,
    ) -> WorkOutcome<WorkResult<R>>
    where
        R: Send,
        F: Fn() -> Result<R, String> + Sync + ?Sized,
    {
        let run_id = Uuid::new_v4();
        let span = work_span(run_id, contract);
        let _entered = span.enter();

        let started = Instant::now();
        let partitions = self.prepare(contract)?;
        let cancellation = contract.cancellation();

        let reports = crossbeam::thread::scope(|s| {
            let handles: Vec<_> = partitions
                .iter()
                .map(|(&partition, &assigned)| {
                    let span = span.clone();
                    let worker = Worker {
                        partition,
                        assigned,
                        cancellation,
                        keep_results,
                    };
                    s.spawn(move |_| {
                        let _entered = span.enter();
                        worker.run(invoke)
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| {
                    // Worker::run catches delegate panics, so a failed join is a bug in the engine
                    handle
                        .join()
                        .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_else(|payload| std::panic::resume_unwind(payload));

        Ok(finish(contract, run_id, started, reports))
    }

    async fn execute_partitions_async<R, F>(
        &self,
        contract: &WorkContract,
        keep_results: bool,
        invoke: F,
    ) -> WorkOutcome<WorkResult<R>>
    where
        R: Send + 'static,
        F: Fn() -> Result<R, String> + Send + Sync + 'static,
    {
        let run_id = Uuid::new_v4();
        let span = work_span(run_id, contract);

        async move {
            let started = Instant::now();
            let partitions = self.prepare(contract)?;
            let invoke = Arc::new(invoke);

            // blocking tasks outlive a dropped future; the guard stops them without touching the caller's token
            let cancellation = contract.cancellation().child_token();
            let guard = cancellation.clone().drop_guard();

            let handles: Vec<_> = partitions
                .iter()
                .map(|(&partition, &assigned)| {
                    let invoke = Arc::clone(&invoke);
                    let cancellation = cancellation.clone();
                    let span = tracing::Span::current();
                    let handle = tokio::task::spawn_blocking(move || {
                        let _entered = span.enter();
                        Worker {
                            partition,
                            assigned,
                            cancellation: &cancellation,
                            keep_results,
                        }
                        .run(&*invoke)
                    });
                    (partition, assigned, handle)
                })
                .collect();

            let mut reports = Vec::with_capacity(handles.len());
            for (partition, assigned, handle) in handles {
                let report = match handle.await {
                    Ok(report) => report,
                    Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                    // the runtime dropped the task before it ran
                    Err(_) => PartitionReport {
                        partition,
                        assigned,
                        state: WorkerState::Cancelled,
                        iterations_run: 0,
                        results: Vec::new(),
                        fault: None,
                    },
                };
                reports.push(report);
            }
            guard.disarm();

            Ok::<_, WorkError>(finish(contract, run_id, started, reports))
        }
        .instrument(span)
        .await
    }
}

fn work_span(run_id: Uuid, contract: &WorkContract) -> tracing::Span {
    tracing::info_span!(
        "work",
        %run_id,
        strategy = %contract.balancer_strategy(),
        iterations = contract.iterations_requested(),
        description = contract.description().unwrap_or_default(),
    )
}

fn finish<R>(
    contract: &WorkContract,
    run_id: Uuid,
    started: Instant,
    reports: Vec<PartitionReport<R>>,
) -> WorkResult<R> {
    let result = WorkResult::new(contract.clone(), run_id, started.elapsed(), reports);

    let faults = result.faults().count();
    if faults > 0 {
        tracing::warn!(faults, "{} of {} workers faulted", faults, result.partitions_used());
    }
    if result.was_cancelled() {
        tracing::warn!(
            completed = result.total_completed(),
            requested = contract.iterations_requested(),
            "work cancelled"
        );
    }
    tracing::debug!(
        partitions = result.partitions_used(),
        completed = result.total_completed(),
        elapsed_ms = result.duration().as_millis() as u64,
        "work finished"
    );

    result
}
