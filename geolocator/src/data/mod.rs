//! Wire-level data model for the location bridge.
//!
//! Everything in this module crosses the method/event boundary as JSON,
//! so the types carry serde derives with the camelCase naming the host
//! application expects. The one exception is [`MergedSubscription`],
//! which never leaves the process: it is the configuration handed to the
//! platform location source after merging all live update requests.

mod location;
mod outcome;
mod permission;
mod request;
mod subscription;

pub use location::Location;
pub use outcome::{Failure, FailureKind, Outcome, Payload, ServicesStatus};
pub use permission::{Permission, Priority};
pub use request::{PermissionRequest, Strategy, UpdateOptions, UpdateRequest};
pub use subscription::MergedSubscription;
