//! Caller-facing request shapes.

use serde::{Deserialize, Serialize};

use super::permission::{Permission, Priority};

/// What kind of delivery a caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Strategy {
    /// Single best-effort read, preferring a cached fix.
    Current,
    /// One fresh reading.
    Single,
    /// Ongoing stream until removed.
    Continuous,
}

/// Optional numeric tunables on an update request.
///
/// Every field is nullable; absence means the request puts no
/// constraint on that knob. Durations and timestamps are milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateOptions {
    pub interval: Option<u64>,
    pub fastest_interval: Option<u64>,
    pub expiration_time: Option<u64>,
    pub expiration_duration: Option<u64>,
    pub max_wait_time: Option<u64>,
    pub num_updates: Option<u32>,
}

/// A caller's subscription intent.
///
/// The `id` is caller-assigned and must be unique among live requests;
/// removing an id that is not present is a no-op.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    pub id: i32,
    pub strategy: Strategy,
    pub permission: Permission,
    pub accuracy: Priority,
    #[serde(default)]
    pub in_background: bool,
    /// Minimum movement in meters before a new fix is emitted; 0 means
    /// no filter.
    #[serde(default)]
    pub displacement_filter: f32,
    #[serde(default)]
    pub options: UpdateOptions,
}

/// Arguments of an interactive permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRequest {
    pub value: Permission,
    #[serde(default)]
    pub open_settings_if_denied: bool,
}

impl PermissionRequest {
    /// A plain request that never opens system settings.
    pub fn new(value: Permission) -> Self {
        Self {
            value,
            open_settings_if_denied: false,
        }
    }
}
