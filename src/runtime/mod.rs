//! Application lifecycle: wiring collaborators at startup and draining
//! background work at shutdown.

pub mod lifetime;
