//! End-to-end tests for the execution engine

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;
use taskripper::parallel::{WorkBalancer, WorkerState};
use taskripper::work::MutationOrder;
use taskripper::{
    BalancerStrategy, ExecutionEnvironment, ExecutionSettings, Range, Work, WorkContract, WorkError, WorkExecutor,
};
use tokio_util::sync::CancellationToken;

fn settings(max_threads: usize, max_iterations: usize) -> ExecutionSettings {
    ExecutionSettings::new(
        ExecutionEnvironment::new(max_threads, "test"),
        Range::new(1, max_threads).unwrap(),
        Range::new(1, max_iterations).unwrap(),
        BalancerStrategy::Optimize,
    )
}

fn contract(iterations: usize, max_threads: usize) -> WorkContract {
    WorkContract::with_settings(settings(max_threads, iterations + 1), iterations).unwrap()
}

#[test]
fn test_counter_round_trip() {
    for iterations in [1, 7, 1000, 4321] {
        let counter = AtomicUsize::new(0);
        let result = WorkExecutor::default()
            .execute_with(
                &contract(iterations, 8),
                |c: &AtomicUsize| {
                    c.fetch_add(1, Ordering::SeqCst);
                },
                &counter,
            )
            .unwrap();

        assert!(result.is_completed());
        assert!(result.contract_honored());
        assert_eq!(result.total_completed(), iterations);
        assert_eq!(counter.load(Ordering::SeqCst), iterations);
        // actions keep no values
        assert_eq!(result.values().count(), 0);
    }
}

#[test]
fn test_result_shape_matches_balancer() {
    let contract = contract(1010, 8);
    let index = AtomicUsize::new(0);
    let result = WorkExecutor::default()
        .compute_with(
            &contract,
            |i: &AtomicUsize| {
                let i = i.fetch_add(1, Ordering::SeqCst);
                i * i
            },
            &index,
        )
        .unwrap();

    let partitions = WorkBalancer::new().balance(&contract).unwrap();
    assert_eq!(result.partitions_used(), partitions.len());
    assert_eq!(result.results_by_partition().count(), partitions.len());
    assert_eq!(result.values().count(), 1010);

    for (partition, count) in &partitions {
        let results = result.from_partition(*partition);
        assert_eq!(results.len(), *count);
        // iteration order within a partition
        assert!(results.iter().enumerate().all(|(i, r)| r.iteration == i && r.partition == *partition));
    }

    // every square of 0..1010 produced exactly once
    let mut values: Vec<usize> = result.values().copied().collect();
    values.sort_unstable();
    assert_eq!(values, (0..1010).map(|i| i * i).collect::<Vec<_>>());
}

#[test]
fn test_cancellation_after_10ms() {
    let token = CancellationToken::new();
    let contract = WorkContract::builder()
        .settings(settings(8, 100_001))
        .iterations(100_000)
        .cancellation(token.clone())
        .build()
        .unwrap();

    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(10));
        token.cancel();
    });

    let result = WorkExecutor::default()
        .execute(&contract, || thread::sleep(Duration::from_micros(50)))
        .expect("cancellation is reported on the result, not as an error");
    canceller.join().unwrap();

    assert!(!result.is_completed());
    assert!(!result.contract_honored());
    assert!(result.was_cancelled());
    assert!(result.total_completed() < 100_000);
    assert!(matches!(result.check(), Err(WorkError::Cancelled { requested: 100_000, .. })));
}

#[test]
fn test_cancel_after_completion_is_noop() {
    let contract = contract(100, 4);
    let result = WorkExecutor::default().compute(&contract, || 1u8).unwrap();
    contract.cancel();

    assert!(contract.is_cancelled());
    assert!(result.is_completed());
    assert!(result.check().is_ok());
}

#[test]
fn test_cancelled_contract_runs_nothing() {
    let contract = contract(100, 4);
    contract.cancel();
    let calls = AtomicUsize::new(0);
    let result = WorkExecutor::default()
        .execute(&contract, || {
            calls.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(result.total_completed(), 0);
    assert!(result.partitions().iter().all(|p| p.state == WorkerState::Cancelled));
}

#[test]
fn test_panicking_worker_is_isolated() {
    let contract = contract(400, 4);
    let calls = AtomicUsize::new(0);
    let result = WorkExecutor::default()
        .compute(&contract, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n == 10 {
                panic!("iteration {n} exploded");
            }
            n
        })
        .unwrap();

    let faults: Vec<_> = result.faults().collect();
    assert_eq!(faults.len(), 1);
    assert_eq!(faults[0].message, "iteration 10 exploded");

    let faulted = result.partitions().iter().filter(|p| p.state == WorkerState::Faulted).count();
    let completed = result.partitions().iter().filter(|p| p.state == WorkerState::Completed).count();
    assert_eq!(faulted, 1);
    assert_eq!(completed, result.partitions_used() - 1);
    assert!(!result.is_completed());
    assert!(result.total_completed() < 400);
    assert!(matches!(result.check(), Err(WorkError::WorkerFaults(_))));
}

#[test]
fn test_try_compute_error_faults_worker() {
    let contract = contract(50, 1);
    let result = WorkExecutor::default()
        .try_compute_with(
            &contract,
            |limit: &AtomicUsize| {
                let n = limit.fetch_add(1, Ordering::SeqCst);
                if n < 20 { Ok(n) } else { Err(format!("{n} is too large")) }
            },
            &AtomicUsize::new(0),
        )
        .unwrap();

    // one partition: partial results through the last success are kept
    assert_eq!(result.partitions_used(), 1);
    assert_eq!(result.from_partition(0).len(), 20);
    assert_eq!(result.total_completed(), 20);
    let fault = result.faults().next().unwrap();
    assert_eq!((fault.partition, fault.iteration), (0, 20));
    assert_eq!(fault.message, "20 is too large");
}

#[test]
fn test_two_parameter_shapes() {
    let contract = contract(300, 3);
    let total = AtomicUsize::new(0);
    let result = WorkExecutor::default()
        .execute_with2(
            &contract,
            |step: &usize, sum: &AtomicUsize| {
                sum.fetch_add(*step, Ordering::SeqCst);
            },
            &2,
            &total,
        )
        .unwrap();
    assert!(result.contract_honored());
    assert_eq!(total.load(Ordering::SeqCst), 600);

    let result = WorkExecutor::default()
        .compute_with2(&contract, |a: &str, b: &str| a.len() + b.len(), "ab", "cde")
        .unwrap();
    assert!(result.values().all(|len| *len == 5));
}

#[test]
fn test_invalid_contracts_are_rejected() {
    let strict = WorkContract::builder()
        .settings(ExecutionSettings::new(
            ExecutionEnvironment::new(2, "small"),
            Range::new(1, 8).unwrap(),
            Range::new(1, 1000).unwrap(),
            BalancerStrategy::MaximizeThreads,
        ))
        .iterations(10)
        .strict_threads(true)
        .build();

    assert!(matches!(
        strict,
        Err(WorkError::ThreadOutOfRange {
            thread_count: 2,
            start: 1,
            end: 8
        })
    ));
    assert!(matches!(
        WorkContract::with_settings(settings(4, 10), 10),
        Err(WorkError::IterationsOutOfRange { requested: 10, .. })
    ));
}

#[test]
fn test_strategy_override_on_contract() {
    let contract = WorkContract::builder()
        .settings(settings(8, 1000))
        .iterations(500)
        .strategy(BalancerStrategy::None)
        .build()
        .unwrap();

    let result = WorkExecutor::default().compute(&contract, || ()).unwrap();
    assert_eq!(result.partitions_used(), 1);
    assert_eq!(result.from_partition(0).len(), 500);
}

#[test]
fn test_work_with_mutator() {
    let contract = contract(100, 4);
    let work = Work::new(|value: &AtomicI64| value.load(Ordering::SeqCst))
        .mutate_after(|value: &AtomicI64| {
            value.fetch_add(1, Ordering::SeqCst);
        });
    assert_eq!(work.mutation_order(), Some(MutationOrder::After));

    let value = AtomicI64::new(0);
    let result = WorkExecutor::default().run(&contract, &work, &value).unwrap();

    assert!(result.contract_honored());
    assert_eq!(value.load(Ordering::SeqCst), 100);
    assert!(result.values().all(|seen| (0..100).contains(seen)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_async_execution() {
    let contract = contract(800, 4);
    let counter = Arc::new(AtomicUsize::new(0));

    let result = WorkExecutor::default()
        .execute_with_async(
            &contract,
            |c: &AtomicUsize| {
                c.fetch_add(1, Ordering::SeqCst);
            },
            Arc::clone(&counter),
        )
        .await
        .unwrap();
    assert!(result.contract_honored());
    assert_eq!(counter.load(Ordering::SeqCst), 800);

    let result = WorkExecutor::default()
        .compute_with_async(&contract, |base: &usize| base * 3, Arc::new(7))
        .await
        .unwrap();
    assert_eq!(result.values().count(), 800);
    assert!(result.values().all(|v| *v == 21));
}

#[tokio::test]
async fn test_async_panic_is_isolated() {
    let contract = contract(40, 2);
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let result = WorkExecutor::default()
        .compute_async(&contract, move || {
            if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("first call fails");
            }
        })
        .await
        .unwrap();

    assert_eq!(result.faults().count(), 1);
    assert!(!result.is_completed());
}

#[tokio::test]
async fn test_async_cancelled_contract() {
    let contract = contract(64, 4);
    contract.cancel();

    let result = WorkExecutor::default().execute_async(&contract, || {}).await.unwrap();
    assert_eq!(result.partitions_used(), 4);
    assert_eq!(result.total_completed(), 0);
    assert!(result.was_cancelled());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_async_two_parameter_and_fallible_shapes() {
    let single = contract(50, 1);
    let contract = contract(300, 3);
    let total = Arc::new(AtomicUsize::new(0));

    let result = WorkExecutor::default()
        .execute_with2_async(
            &contract,
            |step: &usize, sum: &AtomicUsize| {
                sum.fetch_add(*step, Ordering::SeqCst);
            },
            Arc::new(2),
            Arc::clone(&total),
        )
        .await
        .unwrap();
    assert!(result.contract_honored());
    assert_eq!(total.load(Ordering::SeqCst), 600);

    let result = WorkExecutor::default()
        .compute_with2_async(
            &contract,
            |a: &str, b: &str| a.len() + b.len(),
            Arc::<str>::from("ab"),
            Arc::<str>::from("cde"),
        )
        .await
        .unwrap();
    assert_eq!(result.values().count(), 300);
    assert!(result.values().all(|len| *len == 5));

    let result = WorkExecutor::default()
        .try_compute_with_async(
            &single,
            |limit: &AtomicUsize| {
                let n = limit.fetch_add(1, Ordering::SeqCst);
                if n < 20 { Ok(n) } else { Err(format!("{n} is too large")) }
            },
            Arc::new(AtomicUsize::new(0)),
        )
        .await
        .unwrap();
    assert_eq!(result.total_completed(), 20);
    assert_eq!(result.from_partition(0).len(), 20);
    let fault = result.faults().next().unwrap();
    assert_eq!((fault.partition, fault.iteration), (0, 20));
    assert_eq!(fault.message, "20 is too large");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_dropped_async_run_stops_workers() {
    let contract = contract(400, 3);
    let calls = Arc::new(AtomicUsize::new(0));

    let executor = WorkExecutor::default();
    let run = executor.execute_with_async(
        &contract,
        |calls: &AtomicUsize| {
            thread::sleep(Duration::from_millis(5));
            calls.fetch_add(1, Ordering::SeqCst);
        },
        Arc::clone(&calls),
    );
    assert!(tokio::time::timeout(Duration::from_millis(20), run).await.is_err());

    let at_drop = calls.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(200)).await;
    let settled = calls.load(Ordering::SeqCst);

    // at most the iteration each worker was already inside
    assert!(settled <= at_drop + 3, "{settled} calls after drop at {at_drop}");
    assert!(settled < 400);
    // the caller's token is left alone
    assert!(!contract.is_cancelled());
}
