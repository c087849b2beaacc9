//! Location aggregation engine.
//!
//! Concurrent callers ask for location updates with different accuracy,
//! cadence, and lifecycle requirements; the platform offers exactly one
//! subscription. This crate folds the live request set into that single
//! subscription and recomputes it on every change, alongside one-shot
//! reads, the permission state machine, and a JSON method/event bridge
//! for hosts embedding the engine behind a message channel.
//!
//! The platform itself sits behind the [`platform::LocationSource`] and
//! [`platform::PermissionGate`] traits; a simulated implementation ships
//! with the crate for tests and the demo CLI.

pub mod bridge;
pub mod client;
pub mod data;
pub mod logging;
pub mod platform;

pub use bridge::{BridgeError, EventStream, LocationBridge};
pub use client::LocationClient;

/// Crate version, for the CLI banner.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
