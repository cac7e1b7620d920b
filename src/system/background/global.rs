use std::sync::OnceLock;

use super::BackgroundRunner;

pub static GLOBAL_BACKGROUND_RUNNER: OnceLock<BackgroundRunner> = OnceLock::new();

/// 初始化全局后台任务执行器（只允许初始化一次）
///
/// Returns `false` if a runner was already installed; the existing one is
/// kept.
pub fn set_global_runner(runner: BackgroundRunner) -> bool {
    GLOBAL_BACKGROUND_RUNNER.set(runner).is_ok()
}

/// 获取全局后台任务执行器
pub fn get_background_runner() -> Option<BackgroundRunner> {
    GLOBAL_BACKGROUND_RUNNER.get().cloned()
}
