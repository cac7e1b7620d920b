//! Short-key generation and key-space coordination

pub mod coordinator;
pub mod generator;

pub use coordinator::KeySpaceCoordinator;
pub use generator::{ALPHABET, KeyGenerator, key_ordinal, next_key};
