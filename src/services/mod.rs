//! Service layer for link generation and resolution
//!
//! Both the key-space coordinator and the cached resolver implement
//! [`LinkCollection`], so callers can be wired with or without a cache.

mod cached_resolver;
mod traits;

pub use cached_resolver::CachedLinkResolver;
pub use traits::LinkCollection;
