//! Bounded fan-out execution with per-task timeout and failure capture.
//!
//! Every pipeline in this crate funnels its external-service calls through
//! [`Dispatcher::dispatch`]: N independent units of work run under a fixed
//! worker pool, each unit settles to exactly one [`Outcome`], and no unit's
//! failure can prevent its siblings from completing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::Semaphore;
use tracing::warn;

/// One independent task: an identifying key, a blocking closure and the
/// longest the dispatcher will wait for it once it starts running.
pub struct UnitOfWork<T> {
    pub key: String,
    pub timeout: Duration,
    pub run: Box<dyn FnOnce() -> Result<T, String> + Send + 'static>,
}

impl<T> UnitOfWork<T> {
    pub fn new(
        key: impl Into<String>,
        timeout: Duration,
        run: impl FnOnce() -> Result<T, String> + Send + 'static,
    ) -> Self {
        Self {
            key: key.into(),
            timeout,
            run: Box::new(run),
        }
    }
}

/// Terminal state of one unit of work. Exactly one per submitted unit.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    Failure(String),
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}

/// Fan-out executor over a bounded pool of `workers` concurrent units.
///
/// Units run on the blocking thread pool; a unit past its timeout is
/// abandoned (the remote call may still land out-of-band) and recorded as a
/// failure. The dispatch call itself joins every unit before returning.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    workers: usize,
}

impl Dispatcher {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Run all units and return one outcome per submitted key. The timeout
    /// clock starts when a unit acquires a worker slot, not when it is
    /// queued behind a full pool.
    pub async fn dispatch<T: Send + 'static>(
        &self,
        units: Vec<UnitOfWork<T>>,
    ) -> HashMap<String, Outcome<T>> {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let keys: Vec<String> = units.iter().map(|u| u.key.clone()).collect();

        let handles: Vec<_> = units
            .into_iter()
            .map(|unit| {
                let semaphore = semaphore.clone();
                tokio::spawn(async move {
                    let _permit = match semaphore.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => return Outcome::Failure("worker pool closed".into()),
                    };
                    run_unit(unit).await
                })
            })
            .collect();

        let mut outcomes = HashMap::with_capacity(keys.len());
        for (key, joined) in keys.into_iter().zip(join_all(handles).await) {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => Outcome::Failure(format!("worker panicked: {e}")),
            };
            if let Outcome::Failure(reason) = &outcome {
                warn!(key = %key, reason = %reason, "unit of work failed");
            }
            outcomes.insert(key, outcome);
        }
        outcomes
    }
}

async fn run_unit<T: Send + 'static>(unit: UnitOfWork<T>) -> Outcome<T> {
    let timeout = unit.timeout;
    let work = tokio::task::spawn_blocking(unit.run);
    match tokio::time::timeout(timeout, work).await {
        Ok(Ok(Ok(value))) => Outcome::Success(value),
        Ok(Ok(Err(reason))) => Outcome::Failure(reason),
        Ok(Err(join_err)) => Outcome::Failure(format!("worker panicked: {join_err}")),
        Err(_) => Outcome::Failure(format!("timed out after {}s", timeout.as_secs_f32())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    fn quick(key: &str, result: Result<u32, String>) -> UnitOfWork<u32> {
        UnitOfWork::new(key, Duration::from_secs(5), move || result)
    }

    #[tokio::test]
    async fn every_unit_yields_exactly_one_outcome() {
        let dispatcher = Dispatcher::new(4);
        let units = vec![
            quick("a", Ok(1)),
            quick("b", Err("boom".into())),
            quick("c", Ok(3)),
            quick("d", Err("bust".into())),
            quick("e", Ok(5)),
        ];
        let outcomes = dispatcher.dispatch(units).await;
        assert_eq!(outcomes.len(), 5);
        assert_eq!(outcomes["a"], Outcome::Success(1));
        assert_eq!(outcomes["b"], Outcome::Failure("boom".into()));
        assert_eq!(outcomes["e"], Outcome::Success(5));
    }

    #[tokio::test]
    async fn dispatch_returns_even_when_all_units_fail() {
        let dispatcher = Dispatcher::new(2);
        let units = vec![
            quick("a", Err("one".into())),
            quick("b", Err("two".into())),
            quick("c", Err("three".into())),
        ];
        let outcomes = dispatcher.dispatch(units).await;
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.values().all(|o| !o.is_success()));
    }

    #[tokio::test]
    async fn one_failure_does_not_block_siblings() {
        let dispatcher = Dispatcher::new(3);
        let units = vec![
            quick("ok-1", Ok(10)),
            UnitOfWork::new("panics", Duration::from_secs(5), || {
                panic!("worker blew up")
            }),
            quick("ok-2", Ok(20)),
        ];
        let outcomes = dispatcher.dispatch(units).await;
        assert_eq!(outcomes["ok-1"], Outcome::Success(10));
        assert_eq!(outcomes["ok-2"], Outcome::Success(20));
        match &outcomes["panics"] {
            Outcome::Failure(reason) => assert!(reason.contains("panicked")),
            Outcome::Success(_) => panic!("panicking unit must fail"),
        }
    }

    #[tokio::test]
    async fn slow_unit_times_out_without_stalling_dispatch() {
        let dispatcher = Dispatcher::new(2);
        let units = vec![
            UnitOfWork::new("slow", Duration::from_millis(100), || {
                std::thread::sleep(Duration::from_secs(2));
                Ok(0)
            }),
            quick("fast", Ok(1)),
        ];

        let start = Instant::now();
        let outcomes = dispatcher.dispatch(units).await;
        assert!(start.elapsed() < Duration::from_secs(1));

        assert_eq!(outcomes["fast"], Outcome::Success(1));
        match &outcomes["slow"] {
            Outcome::Failure(reason) => assert!(reason.contains("timed out")),
            Outcome::Success(_) => panic!("slow unit must time out"),
        }
    }

    #[tokio::test]
    async fn pool_bound_caps_concurrency() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let units = (0..6)
            .map(|i| {
                let running = running.clone();
                let peak = peak.clone();
                UnitOfWork::new(format!("unit-{i}"), Duration::from_secs(5), move || {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(50));
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok(i)
                })
            })
            .collect();

        let outcomes = Dispatcher::new(2).dispatch(units).await;
        assert_eq!(outcomes.len(), 6);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn zero_workers_is_clamped_to_one() {
        let outcomes = Dispatcher::new(0).dispatch(vec![quick("a", Ok(7))]).await;
        assert_eq!(outcomes["a"], Outcome::Success(7));
    }

    #[tokio::test]
    async fn empty_dispatch_is_an_empty_report() {
        let outcomes: HashMap<String, Outcome<u32>> =
            Dispatcher::new(4).dispatch(Vec::new()).await;
        assert!(outcomes.is_empty());
    }
}
