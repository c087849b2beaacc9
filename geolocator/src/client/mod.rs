//! The multi-request aggregation engine.
//!
//! Any number of callers can hold live update requests with different
//! accuracy, cadence, and lifecycle needs; the client folds them into
//! the single subscription the platform supports and recomputes it on
//! every change. One-shot reads, the permission flows, and the
//! lifecycle pause/resume transitions all live here too.
//!
//! All mutation goes through `&mut self`, so request-set changes are
//! serialized by construction and the derived subscription can never
//! interleave with a concurrent recompute.

pub mod merge;
pub mod status;

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::data::{
    Failure, FailureKind, MergedSubscription, Outcome, PermissionRequest, Strategy, UpdateRequest,
};
use crate::platform::{LocationSource, PermissionGate, SourceEvent, UpdateSink};

pub use status::ServiceStatus;

type Observer = Arc<RwLock<Option<UnboundedSender<Outcome>>>>;

/// Aggregates concurrent location requests onto one platform
/// subscription.
pub struct LocationClient {
    source: Arc<dyn LocationSource>,
    permissions: Arc<dyn PermissionGate>,
    requests: Vec<UpdateRequest>,
    current: Option<MergedSubscription>,
    is_paused: bool,
    observer: Observer,
}

impl LocationClient {
    pub fn new(source: Arc<dyn LocationSource>, permissions: Arc<dyn PermissionGate>) -> Self {
        Self {
            source,
            permissions,
            requests: Vec::new(),
            current: None,
            is_paused: false,
            observer: Arc::new(RwLock::new(None)),
        }
    }

    /// Register the single consumer of the update stream.
    ///
    /// # Panics
    ///
    /// Panics when an observer is already registered; the stream has
    /// exactly one consumer and a silent replacement would lose events.
    pub fn register_updates_observer(&mut self, sender: UnboundedSender<Outcome>) {
        let mut slot = self.observer.write();
        assert!(
            slot.is_none(),
            "trying to register a second location updates observer"
        );
        *slot = Some(sender);
    }

    /// Deregister the update stream consumer.
    ///
    /// # Panics
    ///
    /// Panics when no observer is registered.
    pub fn deregister_updates_observer(&mut self) {
        let mut slot = self.observer.write();
        assert!(
            slot.is_some(),
            "trying to deregister a location updates observer that was never registered"
        );
        *slot = None;
    }

    /// Classify the platform posture for the given permission without
    /// side effects.
    pub fn is_location_operational(&self, permission: crate::data::Permission) -> Outcome {
        match status::current(self.source.as_ref(), self.permissions.as_ref(), permission) {
            ServiceStatus::Ready => Outcome::success_flag(true),
            ServiceStatus::NeedsAuthorization => {
                Outcome::failure(FailureKind::PermissionNotGranted)
            }
            ServiceStatus::Blocked(failure) => Outcome::failure_with(failure),
        }
    }

    /// Drive the interactive permission flow to a settled answer.
    pub async fn request_location_permission(&self, request: &PermissionRequest) -> Outcome {
        match status::validate(self.source.as_ref(), self.permissions.as_ref(), request).await {
            Ok(()) => Outcome::success_flag(true),
            Err(failure) => Outcome::failure_with(failure),
        }
    }

    /// Ensure the device-wide location service is on, driving the
    /// platform's enable flow when it is not.
    pub async fn enable_location_services(&self) -> Outcome {
        if self.source.is_location_enabled() {
            return Outcome::success_flag(true);
        }
        Outcome::bare(self.source.request_enable_services().await)
    }

    /// Read the platform's cached last-known fix.
    pub async fn last_known_location(&self, request: &PermissionRequest) -> Outcome {
        if let Err(failure) =
            status::validate(self.source.as_ref(), self.permissions.as_ref(), request).await
        {
            return Outcome::failure_with(failure);
        }
        match self.source.last_location().await {
            Err(error) => Outcome::failure_with(Failure::runtime(error.message)),
            Ok(None) => Outcome::failure(FailureKind::LocationNotFound),
            Ok(Some(location)) => Outcome::success_locations(vec![location]),
        }
    }

    /// Add a caller's update request to the live set and reconfigure
    /// the platform subscription.
    ///
    /// A validation failure is emitted on the update stream instead of
    /// changing the live set, so the caller that asked still hears the
    /// answer through the channel it listens on.
    pub async fn add_location_updates_request(&mut self, request: UpdateRequest) {
        let permission = PermissionRequest::new(request.permission);
        if let Err(failure) = status::validate(
            self.source.as_ref(),
            self.permissions.as_ref(),
            &permission,
        )
        .await
        {
            warn!(id = request.id, kind = ?failure.kind, "update request rejected");
            self.emit(Outcome::failure_with(failure));
            return;
        }

        debug!(id = request.id, strategy = ?request.strategy, "update request added");
        self.requests.retain(|r| r.id != request.id);
        self.requests.push(request);
        self.update_subscription().await;
    }

    /// Remove the request with the given id; unknown ids are a no-op.
    pub async fn remove_location_updates_request(&mut self, id: i32) {
        let before = self.requests.len();
        self.requests.retain(|r| r.id != id);
        if self.requests.len() == before {
            return;
        }
        debug!(id, remaining = self.requests.len(), "update request removed");
        self.update_subscription().await;
    }

    /// Lifecycle transition into the background.
    ///
    /// A no-op while any live request opted into background delivery;
    /// otherwise the platform subscription stops until [`resume`].
    ///
    /// [`resume`]: LocationClient::resume
    pub async fn pause(&mut self) {
        if self.current.is_none() || self.is_paused {
            return;
        }
        if self.requests.iter().any(|r| r.in_background) {
            debug!("pause skipped, a live request runs in background");
            return;
        }
        info!("pausing location updates");
        self.is_paused = true;
        self.update_subscription().await;
    }

    /// Lifecycle transition back into the foreground; restarts the
    /// subscription the paused request set calls for.
    pub async fn resume(&mut self) {
        if self.current.is_none() || !self.is_paused {
            return;
        }
        info!("resuming location updates");
        self.is_paused = false;
        self.update_subscription().await;
    }

    /// The merged configuration currently applied, if any.
    pub fn merged_subscription(&self) -> Option<&MergedSubscription> {
        self.current.as_ref()
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    /// Recompute the platform subscription from the live request set.
    async fn update_subscription(&mut self) {
        if self.requests.is_empty() {
            self.is_paused = false;
            if self.current.take().is_some() {
                self.source.stop_updates();
                info!("last request removed, subscription stopped");
            }
            return;
        }

        if self.current.is_some() {
            self.source.stop_updates();
        }

        if self.is_paused {
            self.current = Some(merge::merge(&self.requests));
            return;
        }

        // Current-strategy callers prefer a cached fix; serve it
        // immediately and skip the platform subscription entirely when
        // nobody needs anything fresher. A failed cached read still
        // counts as the delivered answer for those callers. Nothing is
        // recorded as an active subscription on the short-circuit.
        let any_current = self.requests.iter().any(|r| r.strategy == Strategy::Current);
        if any_current {
            if let Some(outcome) = self.cached_location_outcome().await {
                self.emit(outcome);
                let all_current = self.requests.iter().all(|r| r.strategy == Strategy::Current);
                if all_current {
                    return;
                }
            }
        }

        let merged = merge::merge(&self.requests);
        debug!(?merged, requests = self.requests.len(), "subscription reconfigured");
        self.current = Some(merged.clone());
        self.source.start_updates(merged, self.make_sink());
    }

    /// The cached-fix fast path as a stream outcome.
    ///
    /// `None` only when the platform has nothing cached or reports the
    /// provider unavailable; platform errors come back as runtime
    /// failure outcomes so the observer hears about them.
    async fn cached_location_outcome(&self) -> Option<Outcome> {
        match self.source.availability().await {
            Ok(true) => {}
            Ok(false) => return None,
            Err(error) => {
                warn!(%error, "availability check failed");
                return Some(Outcome::failure_with(Failure::runtime(error.message)));
            }
        }
        match self.source.last_location().await {
            Ok(Some(location)) => Some(Outcome::success_locations(vec![location])),
            Ok(None) => None,
            Err(error) => {
                warn!(%error, "cached location read failed");
                Some(Outcome::failure_with(Failure::runtime(error.message)))
            }
        }
    }

    fn emit(&self, outcome: Outcome) {
        if let Some(sender) = self.observer.read().as_ref() {
            let _ = sender.send(outcome);
        }
    }

    /// Sink handed to the platform; resolves the observer registered at
    /// delivery time, so a consumer swap between deliveries is safe.
    fn make_sink(&self) -> UpdateSink {
        let observer = Arc::clone(&self.observer);
        Arc::new(move |event: SourceEvent| {
            let outcome = match event {
                Ok(locations) => Outcome::success_locations(locations),
                Err(error) => Outcome::failure_with(Failure::runtime(error.message)),
            };
            if let Some(sender) = observer.read().as_ref() {
                let _ = sender.send(outcome);
            }
        })
    }
}
