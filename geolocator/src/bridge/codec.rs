//! JSON codec for the bridge boundary.

use serde::de::DeserializeOwned;

use crate::data::Outcome;

use super::BridgeError;

/// Decode a method payload, tagging failures with the method name so
/// the host sees which call was malformed.
pub fn decode<T: DeserializeOwned>(method: &str, payload: &str) -> Result<T, BridgeError> {
    serde_json::from_str(payload).map_err(|source| BridgeError::Decode {
        method: method.to_owned(),
        source,
    })
}

/// Encode an outcome for the host side of the bridge.
pub fn encode_outcome(outcome: &Outcome) -> Result<String, BridgeError> {
    serde_json::to_string(outcome).map_err(BridgeError::Encode)
}
