pub mod shutdown;
pub mod startup;

pub use shutdown::{drain_background_tasks, shutdown_runtime};
pub use startup::{StartupContext, build_links, prepare_startup};
