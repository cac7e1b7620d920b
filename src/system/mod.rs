//! System-level modules
//!
//! - Background task execution with panic containment
//! - Logging initialization

pub mod background;
pub mod logging;
