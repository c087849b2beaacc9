//! Tagged call outcomes marshalled back to the host application.
//!
//! Failures never cross the bridge as panics or error returns; every
//! operation resolves to an [`Outcome`] value, successful or not. The
//! `fatal` flag marks configuration defects (a missing permission
//! declaration, for example) that retrying cannot fix.

use serde::{Deserialize, Serialize};

use super::location::Location;

/// Flat failure taxonomy shared by every operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    /// Unexpected platform error; carries a message.
    Runtime,
    LocationNotFound,
    PermissionNotGranted,
    PermissionDenied,
    ServiceDisabled,
    PlayServicesUnavailable,
}

/// Sub-code detailing why platform services are unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ServicesStatus {
    Missing,
    Updating,
    VersionUpdateRequired,
    Disabled,
    Invalid,
}

/// Error payload of a failed [`Outcome`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Failure {
    #[serde(rename = "type")]
    pub kind: FailureKind,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub play_services: Option<ServicesStatus>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
    #[serde(default)]
    pub fatal: bool,
}

impl Failure {
    /// A bare failure of the given kind.
    pub fn of(kind: FailureKind) -> Self {
        Self {
            kind,
            play_services: None,
            message: None,
            fatal: false,
        }
    }

    /// An unexpected platform error with its message.
    pub fn runtime(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Runtime,
            play_services: None,
            message: Some(message.into()),
            fatal: false,
        }
    }

    /// A configuration defect the caller cannot fix by retrying.
    pub fn fatal_config(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Runtime,
            play_services: None,
            message: Some(message.into()),
            fatal: true,
        }
    }

    /// Platform services are unavailable, with the sub-code.
    pub fn play_services(status: ServicesStatus) -> Self {
        Self {
            kind: FailureKind::PlayServicesUnavailable,
            play_services: Some(status),
            message: None,
            fatal: false,
        }
    }
}

/// Successful payload: a boolean or a batch of location fixes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Flag(bool),
    Locations(Vec<Location>),
}

/// The tagged result returned to callers and emitted on the update
/// stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    pub is_successful: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<Payload>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<Failure>,
}

impl Outcome {
    /// Success carrying a boolean payload.
    pub fn success_flag(value: bool) -> Self {
        Self {
            is_successful: true,
            data: Some(Payload::Flag(value)),
            error: None,
        }
    }

    /// Success carrying a batch of location fixes.
    pub fn success_locations(locations: Vec<Location>) -> Self {
        Self {
            is_successful: true,
            data: Some(Payload::Locations(locations)),
            error: None,
        }
    }

    /// A success/failure flag with no payload, as reported by the
    /// enable-services flow.
    pub fn bare(is_successful: bool) -> Self {
        Self {
            is_successful,
            data: None,
            error: None,
        }
    }

    /// A bare failure of the given kind.
    pub fn failure(kind: FailureKind) -> Self {
        Self::failure_with(Failure::of(kind))
    }

    /// A failure with a fully populated error payload.
    pub fn failure_with(failure: Failure) -> Self {
        Self {
            is_successful: false,
            data: None,
            error: Some(failure),
        }
    }

    /// The failure kind, if this outcome is a failure.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.error.as_ref().map(|e| e.kind)
    }

    /// The location batch, if this outcome carries one.
    pub fn locations(&self) -> Option<&[Location]> {
        match &self.data {
            Some(Payload::Locations(locations)) => Some(locations),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_flag_json() {
        let json = serde_json::to_string(&Outcome::success_flag(true)).unwrap();
        assert_eq!(json, r#"{"isSuccessful":true,"data":true}"#);
    }

    #[test]
    fn test_success_locations_json() {
        let outcome = Outcome::success_locations(vec![Location::new(1.0, 2.0)]);
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains(r#""isSuccessful":true"#));
        assert!(json.contains(r#""latitude":1.0"#));
        assert!(!json.contains("error"));
    }

    #[test]
    fn test_failure_json() {
        let outcome = Outcome::failure_with(Failure::play_services(ServicesStatus::Updating));
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains(r#""type":"playServicesUnavailable""#));
        assert!(json.contains(r#""playServices":"updating""#));
        assert!(json.contains(r#""fatal":false"#));
        assert!(!json.contains("data"));
    }

    #[test]
    fn test_fatal_config_failure() {
        let failure = Failure::fatal_config("missing declaration");
        assert_eq!(failure.kind, FailureKind::Runtime);
        assert!(failure.fatal);
    }

    #[test]
    fn test_round_trip() {
        let outcome = Outcome::failure_with(Failure::runtime("boom"));
        let json = serde_json::to_string(&outcome).unwrap();
        let decoded: Outcome = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, outcome);
    }
}
