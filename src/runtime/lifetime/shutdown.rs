use std::time::{Duration, Instant};

use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

use crate::system::background::BackgroundRunner;

/// 等待后台任务完成，超时后放弃剩余任务
///
/// Returns `true` if every task finished within `limit`.
pub async fn drain_background_tasks(runner: &BackgroundRunner, limit: Duration) -> bool {
    let pending = runner.outstanding();
    if pending > 0 {
        info!("Waiting for {} background tasks to finish...", pending);
    }

    if runner.wait_timeout(limit).await {
        info!("All background tasks completed");
        if runner.faults() > 0 {
            warn!("{} background tasks panicked during this run", runner.faults());
        }
        true
    } else {
        warn!(
            "Shutdown timed out after {} seconds, abandoning {} background tasks",
            limit.as_secs(),
            runner.outstanding()
        );
        false
    }
}

/// 关闭运行时：先等待后台任务，再在剩余时间内关闭运行时
///
/// Blocking tasks still running when `limit` expires are abandoned; the
/// runtime does not wait for them. Returns `true` if every task finished.
pub fn shutdown_runtime(runtime: Runtime, runner: &BackgroundRunner, limit: Duration) -> bool {
    let started = Instant::now();
    let drained = runtime.block_on(drain_background_tasks(runner, limit));

    runtime.shutdown_timeout(limit.saturating_sub(started.elapsed()));
    debug!("Runtime shut down in {} ms", started.elapsed().as_millis());

    drained
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_drain_idle_runner() {
        let runner = BackgroundRunner::new();
        assert!(drain_background_tasks(&runner, Duration::from_millis(10)).await);
    }

    #[tokio::test]
    async fn test_drain_times_out_on_stuck_task() {
        let runner = BackgroundRunner::new();
        runner.run(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        });

        assert!(!drain_background_tasks(&runner, Duration::from_millis(20)).await);
        assert_eq!(runner.outstanding(), 1);
    }

    fn test_runtime() -> Runtime {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap()
    }

    #[test]
    fn test_shutdown_runtime_after_clean_drain() {
        let runtime = test_runtime();
        let runner = BackgroundRunner::new();
        {
            let _enter = runtime.enter();
            runner.run_blocking(|| {});
        }

        assert!(shutdown_runtime(runtime, &runner, Duration::from_secs(5)));
        assert_eq!(runner.outstanding(), 0);
    }

    #[test]
    fn test_stuck_blocking_task_does_not_extend_shutdown() {
        let runtime = test_runtime();
        let runner = BackgroundRunner::new();
        {
            let _enter = runtime.enter();
            runner.run_blocking(|| std::thread::sleep(Duration::from_secs(3)));
        }

        let started = Instant::now();
        assert!(!shutdown_runtime(runtime, &runner, Duration::from_millis(50)));
        // 阻塞任务仍在运行，但关闭不再等待它
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
