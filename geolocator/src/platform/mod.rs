//! Platform collaborator seams.
//!
//! The aggregation engine never talks to a native SDK directly; it goes
//! through two trait objects:
//!
//! - [`LocationSource`] - the raw platform location primitive
//!   (availability, last known fix, start/stop of the single merged
//!   subscription, the enable-services flow).
//! - [`PermissionGate`] - the authorization primitive (declaration and
//!   grant checks, the interactive prompt, the settings round-trip).
//!
//! Both traits are dyn-compatible: async operations return a boxed
//! future so the engine can hold `Arc<dyn LocationSource>` without
//! generics leaking into every caller.

mod simulated;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use thiserror::Error;

use crate::data::{Location, MergedSubscription, Permission, ServicesStatus};

pub use simulated::{PromptBehavior, SimulatedLocationSource, SimulatedPermissionGate};

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// An unexpected error raised by a platform call.
///
/// The engine converts these into `runtime` failures at the bridge
/// boundary; they are never thrown across it.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PlatformError {
    pub message: String,
}

impl PlatformError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// One delivery from the platform subscription: a batch of fixes or a
/// failure. Failures do not terminate the subscription.
pub type SourceEvent = Result<Vec<Location>, PlatformError>;

/// Callback invoked once per platform location batch or failure.
///
/// The sink resolves the currently registered observer at delivery
/// time, so late deliveries reach whatever observer is registered then.
pub type UpdateSink = Arc<dyn Fn(SourceEvent) + Send + Sync>;

/// The native one-shot/continuous location primitive.
pub trait LocationSource: Send + Sync {
    /// Whether the host platform services backing the provider are
    /// usable, with a sub-code when they are not.
    fn services_available(&self) -> Result<(), ServicesStatus>;

    /// Whether the device-wide location service is switched on.
    fn is_location_enabled(&self) -> bool;

    /// Whether the provider currently believes a fix can be produced.
    fn availability(&self) -> BoxFuture<'_, Result<bool, PlatformError>>;

    /// The platform's cached last-known fix, if any.
    fn last_location(&self) -> BoxFuture<'_, Result<Option<Location>, PlatformError>>;

    /// Start the single platform subscription with the merged
    /// configuration. Any previously running subscription is replaced.
    fn start_updates(&self, config: MergedSubscription, sink: UpdateSink);

    /// Stop the platform subscription. Idempotent.
    fn stop_updates(&self);

    /// Drive the platform's enable-location-services flow; resolves to
    /// whether the service ended up enabled.
    fn request_enable_services(&self) -> BoxFuture<'_, bool>;
}

/// The authorization primitive.
pub trait PermissionGate: Send + Sync {
    /// Whether the application declares the permission at all
    /// (manifest/plist). A missing declaration is a fatal
    /// configuration defect.
    fn is_declared(&self, permission: Permission) -> bool;

    /// Whether location access is currently granted.
    fn is_granted(&self) -> bool;

    /// Whether the user has permanently declined the permission, so a
    /// prompt can no longer be shown.
    fn is_permanently_declined(&self, permission: Permission) -> bool;

    /// Drive the interactive authorization prompt; resolves to whether
    /// the permission ended up granted. Concurrent calls coalesce onto
    /// a single platform decision.
    fn request_permission(&self, permission: Permission) -> BoxFuture<'_, bool>;

    /// Open system settings and resolve when the user returns; `false`
    /// when no settings flow is available.
    fn open_settings(&self) -> BoxFuture<'_, bool>;
}
