use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};

use tokio::runtime::{Handle, RuntimeFlavor};

/// A zero-argument unit of work run after the scheduling caller yields.
pub type DeferredTask = Box<dyn FnOnce() + Send + 'static>;

pub type SharedScheduler = Arc<dyn DeferredScheduler>;

/// Runs deferred units of work, such as index rebuilds, at a later point.
///
/// A scheduled unit must eventually run; there is no cancellation.
pub trait DeferredScheduler: Send + Sync + fmt::Debug {
    fn schedule(&self, task: DeferredTask);

    /// Drives queued units on the caller's thread. Self-driving schedulers
    /// have nothing to do and report zero.
    fn run_pending(&self) -> usize {
        0
    }
}

/// Spawns units onto a current-thread tokio runtime.
///
/// The runtime thread is the caller's thread, so a spawned unit cannot start
/// until the caller's task yields. Multi-threaded runtimes are refused: an
/// idle worker would pick the unit up while the caller is still running.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    runtime: Handle,
}

impl TokioScheduler {
    /// Returns `None` unless `runtime` is a current-thread runtime.
    pub fn new(runtime: Handle) -> Option<Self> {
        match runtime.runtime_flavor() {
            RuntimeFlavor::CurrentThread => Some(Self { runtime }),
            _ => None,
        }
    }

    /// Captures the current-thread runtime the caller is running on, if any.
    pub fn current() -> Option<Self> {
        Handle::try_current().ok().and_then(Self::new)
    }
}

impl DeferredScheduler for TokioScheduler {
    fn schedule(&self, task: DeferredTask) {
        let _ = self.runtime.spawn(async move {
            tokio::task::yield_now().await;
            if let Err(error) = tokio::task::spawn_blocking(task).await {
                tracing::warn!(%error, "deferred task panicked");
            }
        });
    }
}

/// FIFO queue drained explicitly through [`DeferredScheduler::run_pending`].
#[derive(Default)]
pub struct ManualScheduler {
    queue: Mutex<VecDeque<DeferredTask>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().map(|queue| queue.len()).unwrap_or(0)
    }

    fn pop_front(&self) -> Option<DeferredTask> {
        match self.queue.lock() {
            Ok(mut queue) => queue.pop_front(),
            Err(poisoned) => poisoned.into_inner().pop_front(),
        }
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("pending", &self.pending())
            .finish()
    }
}

impl DeferredScheduler for ManualScheduler {
    fn schedule(&self, task: DeferredTask) {
        match self.queue.lock() {
            Ok(mut queue) => queue.push_back(task),
            Err(poisoned) => poisoned.into_inner().push_back(task),
        }
    }

    /// Runs queued units in order, including units they schedule themselves.
    fn run_pending(&self) -> usize {
        let mut ran = 0;
        // The queue lock is released before each unit runs so units can schedule more work.
        while let Some(task) = self.pop_front() {
            task();
            ran += 1;
        }
        ran
    }
}

/// Picks the current-thread tokio runtime the caller is on, or a manual queue
/// everywhere else.
pub(crate) fn default_scheduler() -> SharedScheduler {
    match TokioScheduler::current() {
        Some(scheduler) => Arc::new(scheduler),
        None => Arc::new(ManualScheduler::new()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn manual_scheduler_defers_until_run_pending() {
        let scheduler = ManualScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let counter = Arc::clone(&counter);
            scheduler.schedule(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.pending(), 3);

        assert_eq!(scheduler.run_pending(), 3);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn manual_scheduler_runs_in_fifo_order_including_nested_units() {
        let scheduler = Arc::new(ManualScheduler::new());
        let order = Arc::new(Mutex::new(Vec::new()));

        let first_order = Arc::clone(&order);
        let nested_scheduler = Arc::clone(&scheduler);
        scheduler.schedule(Box::new(move || {
            first_order.lock().expect("order lock").push("first");
            let nested_order = Arc::clone(&first_order);
            nested_scheduler.schedule(Box::new(move || {
                nested_order.lock().expect("order lock").push("nested");
            }));
        }));
        let second_order = Arc::clone(&order);
        scheduler.schedule(Box::new(move || {
            second_order.lock().expect("order lock").push("second");
        }));

        assert_eq!(scheduler.run_pending(), 3);
        assert_eq!(
            *order.lock().expect("order lock"),
            vec!["first", "second", "nested"]
        );
    }

    #[test]
    fn default_scheduler_outside_a_runtime_is_manual() {
        let scheduler = default_scheduler();
        assert!(format!("{scheduler:?}").contains("ManualScheduler"));
    }

    #[tokio::test]
    async fn tokio_scheduler_runs_after_the_caller_yields() {
        let scheduler = TokioScheduler::current().expect("inside a current-thread runtime");
        let ran = Arc::new(AtomicUsize::new(0));
        let (sender, receiver) = tokio::sync::oneshot::channel();

        let unit_ran = Arc::clone(&ran);
        scheduler.schedule(Box::new(move || {
            unit_ran.fetch_add(1, Ordering::SeqCst);
            let _ = sender.send(42);
        }));
        std::thread::sleep(std::time::Duration::from_millis(50));
        assert_eq!(ran.load(Ordering::SeqCst), 0);

        assert_eq!(receiver.await.expect("unit must run"), 42);
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn tokio_scheduler_refuses_multi_thread_runtimes() {
        assert!(TokioScheduler::current().is_none());
        assert!(TokioScheduler::new(Handle::current()).is_none());

        let scheduler = default_scheduler();
        assert!(format!("{scheduler:?}").contains("ManualScheduler"));
    }
}
