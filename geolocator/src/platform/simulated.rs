//! In-process stand-in for the native location stack.
//!
//! The simulated source replays a scripted route on a timer, honoring
//! the merged configuration the same way a fused provider would:
//! interval, displacement filter, and update count all apply. The
//! simulated gate models the full permission posture, including the
//! pending-callback list that coalesces concurrent prompts onto a
//! single platform decision.
//!
//! Both types are cheap clones over shared state, so tests and the CLI
//! can keep a handle for steering while the engine holds its own.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::data::{Location, MergedSubscription, Permission, ServicesStatus};

use super::{BoxFuture, LocationSource, PermissionGate, PlatformError, SourceEvent, UpdateSink};

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Approximate ground distance between two fixes in meters.
///
/// Equirectangular approximation; plenty for displacement filtering at
/// the scales a route script covers.
pub fn displacement_meters(a: Location, b: Location) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let x = (b.longitude - a.longitude).to_radians() * ((lat1 + lat2) / 2.0).cos();
    let y = lat2 - lat1;
    (x * x + y * y).sqrt() * EARTH_RADIUS_M
}

struct ActiveUpdates {
    config: MergedSubscription,
    cancel: CancellationToken,
}

struct SourceState {
    services: Result<(), ServicesStatus>,
    location_enabled: bool,
    available: bool,
    last_known: Option<Location>,
    route: Vec<Location>,
    route_index: usize,
    tick: Duration,
    last_location_error: Option<String>,
    pending_update_error: Option<String>,
    enable_services_outcome: Option<bool>,
    active: Option<ActiveUpdates>,
    starts: u64,
    stops: u64,
}

impl Default for SourceState {
    fn default() -> Self {
        Self {
            services: Ok(()),
            location_enabled: true,
            available: true,
            last_known: None,
            route: Vec::new(),
            route_index: 0,
            tick: Duration::from_millis(100),
            last_location_error: None,
            pending_update_error: None,
            enable_services_outcome: None,
            active: None,
            starts: 0,
            stops: 0,
        }
    }
}

/// Simulated platform location provider.
#[derive(Clone, Default)]
pub struct SimulatedLocationSource {
    state: Arc<Mutex<SourceState>>,
}

impl SimulatedLocationSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the fixes the subscription emitter replays, in order,
    /// cycling when exhausted.
    pub fn set_route(&self, route: Vec<Location>) {
        self.state.lock().route = route;
    }

    /// Emitter period used when no live request constrains `interval`.
    pub fn set_tick(&self, tick: Duration) {
        self.state.lock().tick = tick;
    }

    pub fn set_services(&self, services: Result<(), ServicesStatus>) {
        self.state.lock().services = services;
    }

    pub fn set_location_enabled(&self, enabled: bool) {
        self.state.lock().location_enabled = enabled;
    }

    pub fn set_available(&self, available: bool) {
        self.state.lock().available = available;
    }

    pub fn set_last_known(&self, location: Option<Location>) {
        self.state.lock().last_known = location;
    }

    /// Make the next `last_location` call fail with this message.
    pub fn inject_last_location_error(&self, message: impl Into<String>) {
        self.state.lock().last_location_error = Some(message.into());
    }

    /// Make the next subscription delivery a failure instead of a fix.
    pub fn inject_update_error(&self, message: impl Into<String>) {
        self.state.lock().pending_update_error = Some(message.into());
    }

    /// Outcome of the enable-services dialog: `Some(accepted)` runs the
    /// flow, `None` means the flow is unavailable.
    pub fn set_enable_services_outcome(&self, outcome: Option<bool>) {
        self.state.lock().enable_services_outcome = outcome;
    }

    /// Configuration of the running subscription, if any.
    pub fn active_config(&self) -> Option<MergedSubscription> {
        self.state.lock().active.as_ref().map(|a| a.config.clone())
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().active.is_some()
    }

    /// Number of `start_updates` calls so far.
    pub fn start_count(&self) -> u64 {
        self.state.lock().starts
    }

    /// Number of `stop_updates` calls that actually tore something down.
    pub fn stop_count(&self) -> u64 {
        self.state.lock().stops
    }
}

impl LocationSource for SimulatedLocationSource {
    fn services_available(&self) -> Result<(), ServicesStatus> {
        self.state.lock().services
    }

    fn is_location_enabled(&self) -> bool {
        self.state.lock().location_enabled
    }

    fn availability(&self) -> BoxFuture<'_, Result<bool, PlatformError>> {
        let state = Arc::clone(&self.state);
        Box::pin(async move { Ok(state.lock().available) })
    }

    fn last_location(&self) -> BoxFuture<'_, Result<Option<Location>, PlatformError>> {
        let state = Arc::clone(&self.state);
        Box::pin(async move {
            let mut s = state.lock();
            match s.last_location_error.take() {
                Some(message) => Err(PlatformError::new(message)),
                None => Ok(s.last_known),
            }
        })
    }

    fn start_updates(&self, config: MergedSubscription, sink: UpdateSink) {
        let cancel = CancellationToken::new();
        {
            let mut s = self.state.lock();
            if let Some(previous) = s.active.take() {
                previous.cancel.cancel();
            }
            s.active = Some(ActiveUpdates {
                config: config.clone(),
                cancel: cancel.clone(),
            });
            s.starts += 1;
        }
        debug!(?config, "simulated subscription started");
        let state = Arc::clone(&self.state);
        tokio::spawn(run_emitter(state, config, sink, cancel));
    }

    fn stop_updates(&self) {
        let mut s = self.state.lock();
        if let Some(active) = s.active.take() {
            active.cancel.cancel();
            s.stops += 1;
            debug!("simulated subscription stopped");
        }
    }

    fn request_enable_services(&self) -> BoxFuture<'_, bool> {
        let state = Arc::clone(&self.state);
        Box::pin(async move {
            let mut s = state.lock();
            match s.enable_services_outcome {
                Some(accepted) => {
                    s.location_enabled = accepted;
                    accepted
                }
                None => false,
            }
        })
    }
}

/// Replay the scripted route through the sink until cancelled or the
/// update budget is spent.
async fn run_emitter(
    state: Arc<Mutex<SourceState>>,
    config: MergedSubscription,
    sink: UpdateSink,
    cancel: CancellationToken,
) {
    let interval = config
        .interval
        .map(Duration::from_millis)
        .unwrap_or_else(|| state.lock().tick);
    let mut emitted: u32 = 0;
    let mut reference: Option<Location> = None;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }

        let event: Option<SourceEvent> = {
            let mut s = state.lock();
            if let Some(message) = s.pending_update_error.take() {
                Some(Err(PlatformError::new(message)))
            } else if s.route.is_empty() {
                None
            } else {
                let fix = s.route[s.route_index % s.route.len()];
                s.route_index += 1;
                s.last_known = Some(fix);
                Some(Ok(vec![fix]))
            }
        };

        match event {
            None => continue,
            Some(Err(error)) => sink(Err(error)),
            Some(Ok(batch)) => {
                let fix = batch[0];
                if let Some(min) = config.smallest_displacement {
                    if let Some(previous) = reference {
                        if displacement_meters(previous, fix) < f64::from(min) {
                            continue;
                        }
                    }
                }
                reference = Some(fix);
                sink(Ok(batch));
                emitted += 1;
                if let Some(max) = config.num_updates {
                    if emitted >= max {
                        break;
                    }
                }
            }
        }
    }
}

/// How the simulated gate answers the interactive prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptBehavior {
    /// The user grants immediately.
    Grant,
    /// The user denies immediately.
    Deny,
    /// The prompt stays pending until `resolve_prompt` is called.
    Manual,
}

struct GateState {
    declared: bool,
    granted: bool,
    permanently_declined: bool,
    prompt: PromptBehavior,
    pending: Vec<oneshot::Sender<bool>>,
    prompts_shown: u64,
    settings_outcome: Option<bool>,
}

impl Default for GateState {
    fn default() -> Self {
        Self {
            declared: true,
            granted: true,
            permanently_declined: false,
            prompt: PromptBehavior::Grant,
            pending: Vec::new(),
            prompts_shown: 0,
            settings_outcome: None,
        }
    }
}

/// Simulated authorization gate.
#[derive(Clone, Default)]
pub struct SimulatedPermissionGate {
    state: Arc<Mutex<GateState>>,
}

enum PromptPath {
    Immediate(bool),
    Wait(oneshot::Receiver<bool>),
}

impl SimulatedPermissionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_declared(&self, declared: bool) {
        self.state.lock().declared = declared;
    }

    pub fn set_granted(&self, granted: bool) {
        self.state.lock().granted = granted;
    }

    pub fn set_permanently_declined(&self, declined: bool) {
        self.state.lock().permanently_declined = declined;
    }

    pub fn set_prompt(&self, behavior: PromptBehavior) {
        self.state.lock().prompt = behavior;
    }

    /// What happens when settings are opened after a denial:
    /// `Some(granted)` runs the round-trip and leaves the permission in
    /// that state, `None` means no settings flow is available.
    pub fn set_settings_outcome(&self, outcome: Option<bool>) {
        self.state.lock().settings_outcome = outcome;
    }

    /// Deliver the platform's single authorization decision to every
    /// pending prompt.
    pub fn resolve_prompt(&self, granted: bool) {
        let waiters = {
            let mut s = self.state.lock();
            s.granted = granted;
            std::mem::take(&mut s.pending)
        };
        debug!(granted, waiters = waiters.len(), "permission prompt resolved");
        for waiter in waiters {
            let _ = waiter.send(granted);
        }
    }

    /// Number of times the interactive prompt was launched.
    pub fn prompts_shown(&self) -> u64 {
        self.state.lock().prompts_shown
    }
}

impl PermissionGate for SimulatedPermissionGate {
    fn is_declared(&self, _permission: Permission) -> bool {
        self.state.lock().declared
    }

    fn is_granted(&self) -> bool {
        self.state.lock().granted
    }

    fn is_permanently_declined(&self, _permission: Permission) -> bool {
        self.state.lock().permanently_declined
    }

    fn request_permission(&self, _permission: Permission) -> BoxFuture<'_, bool> {
        let state = Arc::clone(&self.state);
        Box::pin(async move {
            let path = {
                let mut s = state.lock();
                s.prompts_shown += 1;
                match s.prompt {
                    PromptBehavior::Grant => {
                        s.granted = true;
                        PromptPath::Immediate(true)
                    }
                    PromptBehavior::Deny => PromptPath::Immediate(false),
                    PromptBehavior::Manual => {
                        let (tx, rx) = oneshot::channel();
                        s.pending.push(tx);
                        PromptPath::Wait(rx)
                    }
                }
            };
            match path {
                PromptPath::Immediate(granted) => granted,
                PromptPath::Wait(rx) => rx.await.unwrap_or(false),
            }
        })
    }

    fn open_settings(&self) -> BoxFuture<'_, bool> {
        let state = Arc::clone(&self.state);
        Box::pin(async move {
            let mut s = state.lock();
            match s.settings_outcome {
                Some(granted) => {
                    s.granted = granted;
                    if granted {
                        s.permanently_declined = false;
                    }
                    true
                }
                None => false,
            }
        })
    }
}
