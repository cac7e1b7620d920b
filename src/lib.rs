//! link-shorter - sequential short keys for long URLs
//!
//! This library provides the core of a link-shortening service: compact,
//! gap-free key assignment under concurrency, a read-through cache with
//! least-frequently-used eviction, and panic-safe background persistence.
//!
//! # Features
//! - **cli**: the `link-shorter` binary (default)
//!
//! # Architecture
//! - `keys`: key generation and key-space coordination
//! - `cache`: LFU and Redis key → URL caches
//! - `services`: the `LinkCollection` trait and the cached resolver
//! - `storage`: memory and CSV append-log link stores
//! - `config`: configuration management
//! - `runtime`: startup wiring and shutdown draining
//! - `system`: background task runner and logging

pub mod cache;
pub mod config;
pub mod errors;
pub mod keys;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
