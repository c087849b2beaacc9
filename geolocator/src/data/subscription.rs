//! The single platform-level configuration derived from all live
//! requests.

use super::permission::Priority;

/// Configuration of the one underlying platform subscription.
///
/// Recomputed from scratch every time the request set changes or a
/// pause/resume transition occurs; never persisted. See
/// [`crate::client::merge`] for the derivation rules.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedSubscription {
    /// Highest accuracy tier among live requests.
    pub priority: Priority,
    /// Minimum strictly-positive displacement filter, meters. `None`
    /// when every live request has a zero filter.
    pub smallest_displacement: Option<f32>,
    /// Tightest (minimum) interval constraint, milliseconds.
    pub interval: Option<u64>,
    pub fastest_interval: Option<u64>,
    pub expiration_time: Option<u64>,
    pub expiration_duration: Option<u64>,
    pub max_wait_time: Option<u64>,
    /// `Some(1)` when no live request streams continuously; otherwise
    /// the maximum requested count, or `None` for unbounded.
    pub num_updates: Option<u32>,
}
