//! Permission and service readiness checks.
//!
//! Every location operation funnels through the same two entry points:
//! [`current`] classifies the platform posture without side effects,
//! and [`validate`] drives the interactive flows (prompt, optional
//! settings round-trip) until the posture is settled one way or the
//! other.

use tracing::{debug, warn};

use crate::data::{Failure, FailureKind, PermissionRequest};
use crate::platform::{LocationSource, PermissionGate};

/// Classified readiness of the platform for location work.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceStatus {
    /// Everything in place; operations can proceed.
    Ready,
    /// The permission exists but has not been granted yet; an
    /// interactive prompt can still fix this.
    NeedsAuthorization,
    /// Location work cannot proceed and no prompt will help.
    Blocked(Failure),
}

/// Classify the current posture, checking conditions in severity order.
///
/// The order is fixed: platform services, then the device-wide location
/// switch, then the permission declaration, then permanent denial, then
/// the grant itself. The first failing condition wins so callers always
/// see the most fundamental problem first.
pub fn current(
    source: &dyn LocationSource,
    gate: &dyn PermissionGate,
    permission: crate::data::Permission,
) -> ServiceStatus {
    if let Err(status) = source.services_available() {
        return ServiceStatus::Blocked(Failure::play_services(status));
    }
    if !source.is_location_enabled() {
        return ServiceStatus::Blocked(Failure::of(FailureKind::ServiceDisabled));
    }
    if !gate.is_declared(permission) {
        warn!(?permission, "permission is not declared by the application");
        return ServiceStatus::Blocked(Failure::fatal_config(format!(
            "permission {permission:?} is not declared in the application configuration"
        )));
    }
    if gate.is_permanently_declined(permission) {
        return ServiceStatus::Blocked(Failure::of(FailureKind::PermissionDenied));
    }
    if !gate.is_granted() {
        return ServiceStatus::NeedsAuthorization;
    }
    ServiceStatus::Ready
}

/// Settle the posture, prompting interactively when that can help.
///
/// Resolves `Ok(())` once location work may proceed, otherwise the
/// failure to report. At most one prompt is shown per call; when the
/// request allows it, a permanent denial is followed by one settings
/// round-trip and a single re-check.
pub async fn validate(
    source: &dyn LocationSource,
    gate: &dyn PermissionGate,
    request: &PermissionRequest,
) -> Result<(), Failure> {
    match current(source, gate, request.value) {
        ServiceStatus::Ready => Ok(()),
        ServiceStatus::NeedsAuthorization => {
            debug!(permission = ?request.value, "requesting authorization");
            if gate.request_permission(request.value).await {
                Ok(())
            } else {
                // The user saw the prompt and said no.
                Err(Failure::of(FailureKind::PermissionDenied))
            }
        }
        ServiceStatus::Blocked(failure) => {
            if failure.kind == FailureKind::PermissionDenied && request.open_settings_if_denied {
                return settle_via_settings(source, gate, request).await;
            }
            Err(failure)
        }
    }
}

/// One settings round-trip after a permanent denial, then a single
/// re-check. No second prompt and no second round-trip.
async fn settle_via_settings(
    source: &dyn LocationSource,
    gate: &dyn PermissionGate,
    request: &PermissionRequest,
) -> Result<(), Failure> {
    debug!(permission = ?request.value, "opening settings after permanent denial");
    if !gate.open_settings().await {
        return Err(Failure::of(FailureKind::PermissionDenied));
    }
    match current(source, gate, request.value) {
        ServiceStatus::Ready => Ok(()),
        ServiceStatus::NeedsAuthorization => Err(Failure::of(FailureKind::PermissionNotGranted)),
        ServiceStatus::Blocked(failure) => Err(failure),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Permission, ServicesStatus};
    use crate::platform::{SimulatedLocationSource, SimulatedPermissionGate};

    fn collaborators() -> (SimulatedLocationSource, SimulatedPermissionGate) {
        (SimulatedLocationSource::new(), SimulatedPermissionGate::new())
    }

    #[test]
    fn test_ready_when_everything_in_place() {
        let (source, gate) = collaborators();
        assert_eq!(
            current(&source, &gate, Permission::WhenInUse),
            ServiceStatus::Ready
        );
    }

    #[test]
    fn test_services_outrank_everything() {
        let (source, gate) = collaborators();
        source.set_services(Err(ServicesStatus::Updating));
        source.set_location_enabled(false);
        gate.set_declared(false);

        let status = current(&source, &gate, Permission::Fine);
        let ServiceStatus::Blocked(failure) = status else {
            panic!("expected blocked");
        };
        assert_eq!(failure.kind, FailureKind::PlayServicesUnavailable);
        assert_eq!(failure.play_services, Some(ServicesStatus::Updating));
    }

    #[test]
    fn test_disabled_service_outranks_permission_problems() {
        let (source, gate) = collaborators();
        source.set_location_enabled(false);
        gate.set_declared(false);

        let ServiceStatus::Blocked(failure) = current(&source, &gate, Permission::Fine) else {
            panic!("expected blocked");
        };
        assert_eq!(failure.kind, FailureKind::ServiceDisabled);
    }

    #[test]
    fn test_missing_declaration_is_fatal() {
        let (source, gate) = collaborators();
        gate.set_declared(false);
        gate.set_permanently_declined(true);

        let ServiceStatus::Blocked(failure) = current(&source, &gate, Permission::Always) else {
            panic!("expected blocked");
        };
        assert_eq!(failure.kind, FailureKind::Runtime);
        assert!(failure.fatal);
    }

    #[test]
    fn test_permanent_denial_outranks_ungranted() {
        let (source, gate) = collaborators();
        gate.set_granted(false);
        gate.set_permanently_declined(true);

        let ServiceStatus::Blocked(failure) = current(&source, &gate, Permission::Fine) else {
            panic!("expected blocked");
        };
        assert_eq!(failure.kind, FailureKind::PermissionDenied);
    }

    #[test]
    fn test_ungranted_needs_authorization() {
        let (source, gate) = collaborators();
        gate.set_granted(false);
        assert_eq!(
            current(&source, &gate, Permission::Fine),
            ServiceStatus::NeedsAuthorization
        );
    }

    #[tokio::test]
    async fn test_validate_prompts_and_succeeds() {
        let (source, gate) = collaborators();
        gate.set_granted(false);

        let result = validate(&source, &gate, &PermissionRequest::new(Permission::Fine)).await;
        assert!(result.is_ok());
        assert_eq!(gate.prompts_shown(), 1);
    }

    #[tokio::test]
    async fn test_declined_prompt_reports_permission_denied() {
        let (source, gate) = collaborators();
        gate.set_granted(false);
        gate.set_prompt(crate::platform::PromptBehavior::Deny);

        let result = validate(&source, &gate, &PermissionRequest::new(Permission::Fine)).await;
        assert_eq!(result.unwrap_err().kind, FailureKind::PermissionDenied);
        assert_eq!(gate.prompts_shown(), 1);
    }

    #[tokio::test]
    async fn test_validate_skips_prompt_when_ready() {
        let (source, gate) = collaborators();

        let result = validate(&source, &gate, &PermissionRequest::new(Permission::Fine)).await;
        assert!(result.is_ok());
        assert_eq!(gate.prompts_shown(), 0);
    }

    #[tokio::test]
    async fn test_denied_without_settings_flag_stays_denied() {
        let (source, gate) = collaborators();
        gate.set_granted(false);
        gate.set_permanently_declined(true);

        let result = validate(&source, &gate, &PermissionRequest::new(Permission::Fine)).await;
        assert_eq!(result.unwrap_err().kind, FailureKind::PermissionDenied);
        assert_eq!(gate.prompts_shown(), 0);
    }

    #[tokio::test]
    async fn test_settings_round_trip_recovers_grant() {
        let (source, gate) = collaborators();
        gate.set_granted(false);
        gate.set_permanently_declined(true);
        gate.set_settings_outcome(Some(true));

        let request = PermissionRequest {
            value: Permission::Fine,
            open_settings_if_denied: true,
        };
        let result = validate(&source, &gate, &request).await;
        assert!(result.is_ok());
        assert_eq!(gate.prompts_shown(), 0, "settings flow never prompts");
    }

    #[tokio::test]
    async fn test_settings_round_trip_without_grant_reports_ungranted() {
        let (source, gate) = collaborators();
        gate.set_granted(false);
        gate.set_permanently_declined(true);
        gate.set_settings_outcome(Some(false));

        let request = PermissionRequest {
            value: Permission::Fine,
            open_settings_if_denied: true,
        };
        let result = validate(&source, &gate, &request).await;
        // Still permanently declined after the round-trip.
        assert_eq!(result.unwrap_err().kind, FailureKind::PermissionDenied);
    }

    #[tokio::test]
    async fn test_settings_unavailable_reports_denied() {
        let (source, gate) = collaborators();
        gate.set_granted(false);
        gate.set_permanently_declined(true);

        let request = PermissionRequest {
            value: Permission::Fine,
            open_settings_if_denied: true,
        };
        let result = validate(&source, &gate, &request).await;
        assert_eq!(result.unwrap_err().kind, FailureKind::PermissionDenied);
    }
}
