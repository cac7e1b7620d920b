//! Background task runner
//!
//! Fire-and-forget execution with a fault boundary: every task runs on its
//! own tokio task, a panic inside it is caught and logged instead of reaching
//! the caller, and the owner can wait for all outstanding work at shutdown.

pub mod global;

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::Notify;
use tracing::{debug, error};

pub use global::{get_background_runner, set_global_runner};

#[derive(Default)]
struct RunnerState {
    outstanding: AtomicUsize,
    faults: AtomicU64,
    idle: Notify,
}

/// 未完成任务计数守卫，任务以任何方式结束（完成、panic、被取消）都会释放
struct OutstandingGuard {
    state: Arc<RunnerState>,
}

impl OutstandingGuard {
    fn register(state: &Arc<RunnerState>) -> Self {
        state.outstanding.fetch_add(1, Ordering::SeqCst);
        Self {
            state: Arc::clone(state),
        }
    }
}

impl Drop for OutstandingGuard {
    fn drop(&mut self) {
        if self.state.outstanding.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.state.idle.notify_waiters();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Runs background work and tracks it until completion.
///
/// Cloning is cheap; clones share the same counters.
#[derive(Clone, Default)]
pub struct BackgroundRunner {
    state: Arc<RunnerState>,
}

impl BackgroundRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `task` on the tokio runtime.
    ///
    /// Must be called from within a runtime.
    pub fn run<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let guard = OutstandingGuard::register(&self.state);

        tokio::spawn(async move {
            let result = AssertUnwindSafe(task).catch_unwind().await;
            if let Err(payload) = result {
                record_fault(&guard.state, payload.as_ref());
            }
            drop(guard);
        });
    }

    /// Runs synchronous `task` on the blocking thread pool.
    pub fn run_blocking<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let guard = OutstandingGuard::register(&self.state);

        tokio::task::spawn_blocking(move || {
            let result = std::panic::catch_unwind(AssertUnwindSafe(task));
            if let Err(payload) = result {
                record_fault(&guard.state, payload.as_ref());
            }
            drop(guard);
        });
    }

    /// Resolves once every task issued so far has finished.
    pub async fn wait(&self) {
        loop {
            let notified = self.state.idle.notified();
            tokio::pin!(notified);
            // 先登记再检查计数，避免错过通知
            notified.as_mut().enable();

            if self.outstanding() == 0 {
                return;
            }
            debug!("Waiting for {} background tasks", self.outstanding());
            notified.await;
        }
    }

    /// Like [`wait`](Self::wait) but gives up after `limit`.
    ///
    /// Returns `true` if all tasks finished in time.
    pub async fn wait_timeout(&self, limit: Duration) -> bool {
        tokio::time::timeout(limit, self.wait()).await.is_ok()
    }

    pub fn outstanding(&self) -> usize {
        self.state.outstanding.load(Ordering::SeqCst)
    }

    /// Number of tasks that ended in a panic.
    pub fn faults(&self) -> u64 {
        self.state.faults.load(Ordering::SeqCst)
    }
}

fn record_fault(state: &RunnerState, payload: &(dyn Any + Send)) {
    state.faults.fetch_add(1, Ordering::SeqCst);
    error!("Background task panicked: {}", panic_message(payload));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wait_with_no_tasks_returns() {
        let runner = BackgroundRunner::new();
        runner.wait().await;
        assert_eq!(runner.outstanding(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_wait_blocks_until_tasks_finish() {
        let runner = BackgroundRunner::new();
        let done = Arc::new(AtomicUsize::new(0));

        for i in 0..10 {
            let done = Arc::clone(&done);
            runner.run(async move {
                tokio::time::sleep(Duration::from_millis(5 * i)).await;
                done.fetch_add(1, Ordering::SeqCst);
            });
        }

        runner.wait().await;
        assert_eq!(done.load(Ordering::SeqCst), 10);
        assert_eq!(runner.outstanding(), 0);
        assert_eq!(runner.faults(), 0);
    }

    async fn boom() {
        panic!("boom");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_panic_is_contained() {
        let runner = BackgroundRunner::new();
        runner.run(boom());
        runner.run_blocking(|| panic!("blocking boom"));

        runner.wait().await;
        assert_eq!(runner.faults(), 2);
        assert_eq!(runner.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_wait_timeout_expires() {
        let runner = BackgroundRunner::new();
        runner.run(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        });

        assert!(!runner.wait_timeout(Duration::from_millis(20)).await);
        assert_eq!(runner.outstanding(), 1);
    }

    #[test]
    fn test_panic_message_downcasts() {
        let owned: Box<dyn Any + Send> = Box::new("owned".to_string());
        let borrowed: Box<dyn Any + Send> = Box::new("borrowed");
        let other: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(borrowed.as_ref()), "borrowed");
        assert_eq!(panic_message(other.as_ref()), "Unknown panic");
    }
}
