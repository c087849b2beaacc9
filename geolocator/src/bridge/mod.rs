//! String-keyed method bridge over the aggregation engine.
//!
//! Hosts embedding the engine through a message channel speak JSON in
//! both directions: method calls carry a name and a JSON payload, and
//! update-stream events arrive as encoded [`Outcome`] values. The
//! bridge owns the method table, the payload codec, and the single
//! event stream.

pub mod codec;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

use crate::client::LocationClient;
use crate::data::{Outcome, Permission, PermissionRequest, UpdateRequest};

/// Method names accepted by [`LocationBridge::handle_call`].
pub const METHOD_IS_OPERATIONAL: &str = "isLocationOperational";
pub const METHOD_REQUEST_PERMISSION: &str = "requestLocationPermission";
pub const METHOD_ENABLE_SERVICES: &str = "enableLocationServices";
pub const METHOD_LAST_KNOWN: &str = "lastKnownLocation";
pub const METHOD_ADD_REQUEST: &str = "addLocationUpdatesRequest";
pub const METHOD_REMOVE_REQUEST: &str = "removeLocationUpdatesRequest";

/// A malformed call at the bridge boundary.
///
/// These are programming errors on the host side, not location
/// failures; they surface as errors instead of [`Outcome`] values.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("unknown bridge method: {0}")]
    UnknownMethod(String),
    #[error("malformed payload for {method}")]
    Decode {
        method: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode outcome")]
    Encode(#[source] serde_json::Error),
}

/// Consumer half of the update stream.
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<Outcome>,
}

impl EventStream {
    /// Next stream event; `None` once the bridge is dropped.
    pub async fn next(&mut self) -> Option<Outcome> {
        self.rx.recv().await
    }

    /// Next stream event, already encoded for the host.
    pub async fn next_json(&mut self) -> Option<Result<String, BridgeError>> {
        let outcome = self.rx.recv().await?;
        Some(codec::encode_outcome(&outcome))
    }
}

/// JSON method dispatcher wrapping a [`LocationClient`].
pub struct LocationBridge {
    client: LocationClient,
}

impl LocationBridge {
    pub fn new(client: LocationClient) -> Self {
        Self { client }
    }

    /// Dispatch one method call.
    ///
    /// Returns the encoded [`Outcome`] for request/response methods,
    /// and `None` for the update-request methods whose results flow
    /// through the event stream instead.
    pub async fn handle_call(
        &mut self,
        method: &str,
        payload: &str,
    ) -> Result<Option<String>, BridgeError> {
        debug!(method, "bridge call");
        match method {
            METHOD_IS_OPERATIONAL => {
                let permission: Permission = codec::decode(method, payload)?;
                let outcome = self.client.is_location_operational(permission);
                codec::encode_outcome(&outcome).map(Some)
            }
            METHOD_REQUEST_PERMISSION => {
                let request: PermissionRequest = codec::decode(method, payload)?;
                let outcome = self.client.request_location_permission(&request).await;
                codec::encode_outcome(&outcome).map(Some)
            }
            METHOD_ENABLE_SERVICES => {
                let outcome = self.client.enable_location_services().await;
                codec::encode_outcome(&outcome).map(Some)
            }
            METHOD_LAST_KNOWN => {
                let request: PermissionRequest = codec::decode(method, payload)?;
                let outcome = self.client.last_known_location(&request).await;
                codec::encode_outcome(&outcome).map(Some)
            }
            METHOD_ADD_REQUEST => {
                let request: UpdateRequest = codec::decode(method, payload)?;
                self.client.add_location_updates_request(request).await;
                Ok(None)
            }
            METHOD_REMOVE_REQUEST => {
                let id: i32 = codec::decode(method, payload)?;
                self.client.remove_location_updates_request(id).await;
                Ok(None)
            }
            other => Err(BridgeError::UnknownMethod(other.to_owned())),
        }
    }

    /// Open the single update stream.
    ///
    /// # Panics
    ///
    /// Panics when a stream is already open; see
    /// [`LocationClient::register_updates_observer`].
    pub fn open_event_stream(&mut self) -> EventStream {
        let (tx, rx) = mpsc::unbounded_channel();
        self.client.register_updates_observer(tx);
        EventStream { rx }
    }

    /// Close the update stream opened by [`open_event_stream`].
    ///
    /// # Panics
    ///
    /// Panics when no stream is open.
    ///
    /// [`open_event_stream`]: LocationBridge::open_event_stream
    pub fn close_event_stream(&mut self) {
        self.client.deregister_updates_observer();
    }

    /// Host went to the background.
    pub async fn on_pause(&mut self) {
        self.client.pause().await;
    }

    /// Host came back to the foreground.
    pub async fn on_resume(&mut self) {
        self.client.resume().await;
    }

    pub fn client(&self) -> &LocationClient {
        &self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{
        LocationSource, PermissionGate, SimulatedLocationSource, SimulatedPermissionGate,
    };
    use std::sync::Arc;

    fn bridge() -> (LocationBridge, SimulatedLocationSource, SimulatedPermissionGate) {
        let source = SimulatedLocationSource::new();
        let gate = SimulatedPermissionGate::new();
        let client = LocationClient::new(
            Arc::new(source.clone()) as Arc<dyn LocationSource>,
            Arc::new(gate.clone()) as Arc<dyn PermissionGate>,
        );
        (LocationBridge::new(client), source, gate)
    }

    #[tokio::test]
    async fn test_unknown_method_is_an_error() {
        let (mut bridge, _source, _gate) = bridge();
        let error = bridge.handle_call("teleport", "{}").await.unwrap_err();
        assert!(matches!(error, BridgeError::UnknownMethod(_)));
    }

    #[tokio::test]
    async fn test_malformed_payload_is_an_error() {
        let (mut bridge, _source, _gate) = bridge();
        let error = bridge
            .handle_call(METHOD_REQUEST_PERMISSION, "not json")
            .await
            .unwrap_err();
        assert!(matches!(error, BridgeError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_is_operational_round_trip() {
        let (mut bridge, _source, _gate) = bridge();
        let json = bridge
            .handle_call(METHOD_IS_OPERATIONAL, r#""whenInUse""#)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(json, r#"{"isSuccessful":true,"data":true}"#);
    }

    #[tokio::test]
    async fn test_add_request_flows_through_event_stream() {
        let (mut bridge, source, _gate) = bridge();
        source.set_route(vec![crate::data::Location::new(3.0, 4.0)]);
        let mut events = bridge.open_event_stream();

        let payload = r#"{
            "id": 1,
            "strategy": "continuous",
            "permission": "whenInUse",
            "accuracy": "balanced",
            "options": {"interval": 5}
        }"#;
        let response = bridge.handle_call(METHOD_ADD_REQUEST, payload).await.unwrap();
        assert!(response.is_none(), "update results flow through the stream");

        let event = events.next().await.unwrap();
        assert_eq!(
            event.locations().unwrap()[0],
            crate::data::Location::new(3.0, 4.0)
        );

        bridge
            .handle_call(METHOD_REMOVE_REQUEST, "1")
            .await
            .unwrap();
        assert!(!source.is_active());
        bridge.close_event_stream();
    }

    #[tokio::test]
    async fn test_event_stream_encodes_outcomes() {
        let (mut bridge, source, _gate) = bridge();
        source.set_last_known(Some(crate::data::Location::new(1.5, 2.5)));
        let mut events = bridge.open_event_stream();

        let payload = r#"{"id": 7, "strategy": "current", "permission": "coarse", "accuracy": "low"}"#;
        bridge.handle_call(METHOD_ADD_REQUEST, payload).await.unwrap();

        let json = events.next_json().await.unwrap().unwrap();
        assert!(json.contains(r#""latitude":1.5"#));
    }

    #[tokio::test]
    async fn test_lifecycle_through_bridge() {
        let (mut bridge, source, _gate) = bridge();
        let payload = r#"{"id": 1, "strategy": "continuous", "permission": "fine", "accuracy": "high"}"#;
        bridge.handle_call(METHOD_ADD_REQUEST, payload).await.unwrap();

        bridge.on_pause().await;
        assert!(!source.is_active());
        bridge.on_resume().await;
        assert!(source.is_active());
    }
}
