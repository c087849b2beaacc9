//! Command implementations against the simulated platform.
//!
//! Every command builds the same harness: a simulated location source
//! walking a scripted route, a simulated permission gate that grants on
//! prompt, and the JSON bridge over the aggregation engine. The CLI
//! deliberately talks JSON through the bridge rather than calling the
//! client directly, so a session exercises the same surface a host
//! application would.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use geolocator::bridge::{
    LocationBridge, METHOD_ADD_REQUEST, METHOD_ENABLE_SERVICES, METHOD_IS_OPERATIONAL,
    METHOD_LAST_KNOWN,
};
use geolocator::client::LocationClient;
use geolocator::data::{
    Location, Permission, Priority, Strategy, UpdateOptions, UpdateRequest,
};
use geolocator::platform::{
    LocationSource, PermissionGate, SimulatedLocationSource, SimulatedPermissionGate,
};

use crate::config::CliConfig;
use crate::error::CliError;

/// Watch command tunables, already resolved from the command line.
pub struct WatchArgs {
    pub accuracy: Priority,
    pub permission: Permission,
    pub interval_ms: Option<u64>,
    pub displacement: f32,
    pub count: Option<u32>,
}

struct Harness {
    bridge: LocationBridge,
    source: SimulatedLocationSource,
}

fn build(config: &CliConfig) -> Harness {
    let source = SimulatedLocationSource::new();
    source.set_route(scripted_route(config));
    source.set_tick(std::time::Duration::from_millis(config.tick_ms));

    let gate = SimulatedPermissionGate::new();
    let client = LocationClient::new(
        Arc::new(source.clone()) as Arc<dyn LocationSource>,
        Arc::new(gate.clone()) as Arc<dyn PermissionGate>,
    );
    Harness {
        bridge: LocationBridge::new(client),
        source,
    }
}

/// A straight northbound walk from the configured starting point.
fn scripted_route(config: &CliConfig) -> Vec<Location> {
    (0..config.route_length)
        .map(|i| {
            Location::new(
                config.start_latitude + config.step_degrees * i as f64,
                config.start_longitude,
            )
        })
        .collect()
}

/// Subscribe to the simulated walk and print fixes until interrupted
/// or the requested count is reached.
pub async fn watch(
    config: &CliConfig,
    args: WatchArgs,
    cancel: CancellationToken,
) -> Result<(), CliError> {
    let mut harness = build(config);
    let mut events = harness.bridge.open_event_stream();

    let request = UpdateRequest {
        id: 1,
        strategy: Strategy::Continuous,
        permission: args.permission,
        accuracy: args.accuracy,
        in_background: false,
        displacement_filter: args.displacement,
        options: UpdateOptions {
            interval: args.interval_ms,
            num_updates: args.count,
            ..UpdateOptions::default()
        },
    };
    let payload = serde_json::to_string(&request)
        .map_err(|e| CliError::Config(format!("cannot encode update request: {e}")))?;

    info!(accuracy = ?args.accuracy, interval_ms = ?args.interval_ms, "starting watch");
    harness.bridge.handle_call(METHOD_ADD_REQUEST, &payload).await?;

    let mut received: u32 = 0;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("watch interrupted");
                break;
            }
            event = events.next() => {
                let Some(outcome) = event else { break };
                // One JSON line per event, the same shape a host
                // application would receive.
                match serde_json::to_string(&outcome) {
                    Ok(line) => println!("{line}"),
                    Err(e) => debug!(%e, "event not encodable"),
                }
                if outcome.is_successful {
                    received += 1;
                    if args.count.is_some_and(|count| received >= count) {
                        break;
                    }
                }
            }
        }
    }

    harness.source.stop_updates();
    info!(received, "watch finished");
    Ok(())
}

/// Print the platform's last-known fix.
pub async fn locate(config: &CliConfig, permission: Permission) -> Result<(), CliError> {
    let mut harness = build(config);
    // The simulated platform remembers the start of the scripted walk.
    harness
        .source
        .set_last_known(scripted_route(config).first().copied());

    let payload = format!(r#"{{"value": "{}"}}"#, permission_name(permission));
    let response = harness.bridge.handle_call(METHOD_LAST_KNOWN, &payload).await?;
    print_response(response);
    Ok(())
}

/// Print whether location work could proceed right now.
pub async fn status(config: &CliConfig, permission: Permission) -> Result<(), CliError> {
    let mut harness = build(config);
    let payload = format!(r#""{}""#, permission_name(permission));
    let response = harness
        .bridge
        .handle_call(METHOD_IS_OPERATIONAL, &payload)
        .await?;
    print_response(response);
    Ok(())
}

/// Drive the enable-services flow.
pub async fn enable(config: &CliConfig) -> Result<(), CliError> {
    let mut harness = build(config);
    let response = harness.bridge.handle_call(METHOD_ENABLE_SERVICES, "").await?;
    print_response(response);
    Ok(())
}

fn permission_name(permission: Permission) -> &'static str {
    match permission {
        Permission::Coarse => "coarse",
        Permission::Fine => "fine",
        Permission::WhenInUse => "whenInUse",
        Permission::Always => "always",
    }
}

fn print_response(response: Option<String>) {
    match response {
        Some(json) => println!("{json}"),
        None => println!("(no response)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_walks_north() {
        let config = CliConfig::default();
        let route = scripted_route(&config);
        assert_eq!(route.len(), config.route_length);
        assert!(route[1].latitude > route[0].latitude);
        assert_eq!(route[0].longitude, route[1].longitude);
    }

    #[tokio::test]
    async fn test_watch_with_count_terminates() {
        let mut config = CliConfig::default();
        config.tick_ms = 5;
        let args = WatchArgs {
            accuracy: Priority::Balanced,
            permission: Permission::WhenInUse,
            interval_ms: Some(5),
            displacement: 0.0,
            count: Some(3),
        };
        watch(&config, args, CancellationToken::new()).await.unwrap();
    }

    #[tokio::test]
    async fn test_status_reports_ready() {
        let config = CliConfig::default();
        status(&config, Permission::Fine).await.unwrap();
    }
}
