use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;

use super::StaticConfig;
use crate::errors::Result;

static CONFIG: OnceLock<ArcSwap<StaticConfig>> = OnceLock::new();

/// Get the global configuration instance
///
/// Returns an Arc pointer to the configuration, which is cheap to clone
/// and doesn't hold any locks.
pub fn get_config() -> Arc<StaticConfig> {
    CONFIG
        .get()
        .expect("Config not initialized. Call init_config() first.")
        .load_full()
}

/// Same as [`get_config`] but returns `None` before initialization.
pub fn try_get_config() -> Option<Arc<StaticConfig>> {
    CONFIG.get().map(|config| config.load_full())
}

/// Initialize the global configuration
///
/// Loads `path` (or "config.toml" in the current directory) overlaid by
/// `LS__*` environment variables. A missing file means in-memory defaults.
/// Calling it again replaces the stored configuration.
pub fn init_config(path: Option<&str>) -> Result<Arc<StaticConfig>> {
    let loaded = Arc::new(StaticConfig::load(path)?);

    CONFIG
        .get_or_init(|| ArcSwap::new(Arc::clone(&loaded)))
        .store(Arc::clone(&loaded));

    Ok(loaded)
}
