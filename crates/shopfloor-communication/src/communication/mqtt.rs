//! MQTT broker link and report ingestion
//!
//! One long-lived task owns the rumqttc event loop. Every `ConnAck`
//! (re-)issues the fleet-wide wildcard subscription so no machine is missed
//! after a reconnect; every `Publish` is classified by topic and applied to
//! the shared [`StateStore`]. Poll errors flip the connectivity signal and
//! back off before the next poll — rumqttc re-dials on its own.
//!
//! Malformed traffic (foreign topics, bad ids, broken payloads) is dropped
//! without surfacing an error: the bus is shared and transient garbage on it
//! is expected, not exceptional.

use crate::communication::{topics, ConnectionStatus};
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use serde::{Deserialize, Serialize};
use shopfloor_core::StateStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Broker connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// Broker hostname or IP
    pub broker_host: String,
    /// Broker port
    pub broker_port: u16,
    /// Client identifier presented to the broker
    pub client_id: String,
    /// Username, carried to the transport as-is
    pub username: Option<String>,
    /// Password, carried to the transport as-is
    pub password: Option<String>,
    /// MQTT keep-alive interval in seconds
    pub keep_alive_secs: u64,
    /// Topic domain root shared by the whole fleet
    pub topic_root: String,
    /// Back-off before re-polling the event loop after a transport error
    pub reconnect_delay_ms: u64,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            client_id: "shopfloor-gateway".to_string(),
            username: None,
            password: None,
            keep_alive_secs: 20,
            topic_root: "cnc".to_string(),
            reconnect_delay_ms: 2000,
        }
    }
}

/// Handle to the broker link
///
/// Cheap to clone; the publish side (the dispatcher) and connectivity
/// observers share it. The ingestion task runs independently until the
/// process ends.
#[derive(Clone)]
pub struct MqttLink {
    pub(crate) client: AsyncClient,
    pub(crate) status: ConnectionStatus,
    pub(crate) root: String,
}

impl MqttLink {
    /// Connect to the broker and spawn the ingestion task
    ///
    /// Returns immediately; connection establishment, subscription and all
    /// retries happen inside the spawned task.
    pub fn start(config: MqttConfig, store: Arc<StateStore>) -> (Self, JoinHandle<()>) {
        let mut options =
            MqttOptions::new(&config.client_id, &config.broker_host, config.broker_port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));
        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            options.set_credentials(user, pass);
        }

        let (client, eventloop) = AsyncClient::new(options, 64);
        let status = ConnectionStatus::new();

        let link = Self {
            client: client.clone(),
            status: status.clone(),
            root: config.topic_root.clone(),
        };

        let handle = tokio::spawn(run_event_loop(
            eventloop,
            client,
            status,
            config.topic_root,
            store,
            Duration::from_millis(config.reconnect_delay_ms),
        ));

        (link, handle)
    }

    /// Connectivity signal observers can poll
    pub fn status(&self) -> ConnectionStatus {
        self.status.clone()
    }

    /// The topic domain root this link operates under
    pub fn topic_root(&self) -> &str {
        &self.root
    }
}

async fn run_event_loop(
    mut eventloop: EventLoop,
    client: AsyncClient,
    status: ConnectionStatus,
    root: String,
    store: Arc<StateStore>,
    reconnect_delay: Duration,
) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                let wildcard = topics::report_wildcard(&root);
                tracing::info!(topic = %wildcard, "broker connected, subscribing");
                status.set_connected(true);
                if let Err(e) = client.subscribe(&wildcard, QoS::AtLeastOnce).await {
                    tracing::warn!("subscribe request failed: {e}");
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                ingest_message(&store, &root, &publish.topic, &publish.payload);
            }
            Ok(_) => {}
            Err(e) => {
                if status.is_connected() {
                    tracing::warn!("broker connection lost: {e}");
                }
                status.set_connected(false);
                tokio::time::sleep(reconnect_delay).await;
            }
        }
    }
}

/// Classify one inbound message by topic and apply it to the store
///
/// Everything that fails to classify or parse is dropped here, with no state
/// mutation and no partial position updates.
pub(crate) fn ingest_message(store: &StateStore, root: &str, topic: &str, payload: &[u8]) {
    let Some(inbound) = topics::parse_report_topic(root, topic) else {
        tracing::trace!(topic, "dropping message with unrecognized topic");
        return;
    };

    let id = inbound.machine_id;
    if id == 0 || id > store.slot_count() {
        tracing::debug!(machine = id, topic, "dropping message for out-of-range id");
        return;
    }

    let Ok(text) = std::str::from_utf8(payload) else {
        tracing::debug!(machine = id, topic, "dropping non-UTF-8 payload");
        return;
    };

    match inbound.kind {
        topics::ReportKind::Status => {
            let label = text.trim();
            tracing::debug!(machine = id, state = label, "status report");
            store.apply_status(id, label);
        }
        topics::ReportKind::Position => match parse_position_payload(text) {
            Some((x, y, z)) => store.apply_position(id, x, y, z),
            None => {
                tracing::debug!(machine = id, payload = text, "dropping malformed position");
            }
        },
        topics::ReportKind::Address => {
            store.apply_address(id, text.trim());
        }
    }
}

/// Parse the `POS:<x>:<y>:<z>` position payload
///
/// Requires exactly three numeric fields; anything else is a malformed
/// payload and the previous position stands.
pub(crate) fn parse_position_payload(payload: &str) -> Option<(f64, f64, f64)> {
    let rest = payload.trim().strip_prefix("POS:")?;
    let mut parts = rest.split(':');

    let x = parts.next()?.parse::<f64>().ok()?;
    let y = parts.next()?.parse::<f64>().ok()?;
    let z = parts.next()?.parse::<f64>().ok()?;
    if parts.next().is_some() {
        return None;
    }

    Some((x, y, z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopfloor_core::Position;

    #[test]
    fn test_position_payload_parse() {
        assert_eq!(
            parse_position_payload("POS:1.500:-2.250:3.000"),
            Some((1.5, -2.25, 3.0))
        );
        assert_eq!(parse_position_payload("POS:0:0:0"), Some((0.0, 0.0, 0.0)));
        assert_eq!(parse_position_payload("  POS:1:2:3  "), Some((1.0, 2.0, 3.0)));
    }

    #[test]
    fn test_position_payload_rejects_wrong_arity() {
        assert_eq!(parse_position_payload("POS:1.5:2.5"), None);
        assert_eq!(parse_position_payload("POS:1:2:3:4"), None);
        assert_eq!(parse_position_payload("POS:a:b:c"), None);
        assert_eq!(parse_position_payload("1:2:3"), None);
        assert_eq!(parse_position_payload(""), None);
    }

    #[test]
    fn test_ingest_status_message() {
        let store = StateStore::new();
        ingest_message(&store, "cnc", "cnc/machine_2/status", b"WORKING");

        let rec = store.snapshot(2).unwrap();
        assert_eq!(rec.state_label, "WORKING");
        assert!(rec.active);
    }

    #[test]
    fn test_ingest_trims_status_payload() {
        let store = StateStore::new();
        ingest_message(&store, "cnc", "cnc/machine_1/status", b"  IDLE\n");
        assert_eq!(store.snapshot(1).unwrap().state_label, "IDLE");
    }

    #[test]
    fn test_ingest_out_of_range_id_is_dropped() {
        let store = StateStore::new();
        ingest_message(&store, "cnc", "cnc/machine_0/status", b"WORKING");
        ingest_message(&store, "cnc", "cnc/machine_11/status", b"WORKING");
        assert!(store.consume_update().is_none());
    }

    #[test]
    fn test_ingest_malformed_position_keeps_previous() {
        let store = StateStore::new();
        ingest_message(&store, "cnc", "cnc/machine_3/position", b"POS:1.0:2.0:3.0");
        ingest_message(&store, "cnc", "cnc/machine_3/position", b"POS:9.9:9.9");

        assert_eq!(
            store.snapshot(3).unwrap().position,
            Position::new(1.0, 2.0, 3.0)
        );
    }

    #[test]
    fn test_ingest_unknown_type_is_dropped() {
        let store = StateStore::new();
        ingest_message(&store, "cnc", "cnc/machine_2/spindle", b"500");
        assert!(store.consume_update().is_none());
    }

    #[test]
    fn test_ingest_address_message() {
        let store = StateStore::new();
        ingest_message(&store, "cnc", "cnc/machine_5/address", b"10.0.0.15:23\n");
        assert_eq!(
            store.snapshot(5).unwrap().network_address.as_deref(),
            Some("10.0.0.15:23")
        );
    }

    #[test]
    fn test_end_to_end_status_then_position_single_drain() {
        let store = StateStore::new();
        ingest_message(&store, "cnc", "cnc/machine_2/status", b"ERROR");
        ingest_message(&store, "cnc", "cnc/machine_2/position", b"POS:0:0:0");

        let ticket = store.consume_update().unwrap();
        assert_eq!(ticket.last_updated_id, 2);
        assert!(store.consume_update().is_none());

        let rec = store.snapshot(2).unwrap();
        assert_eq!(rec.state_label, "ERROR");
        assert_eq!(rec.position, Position::new(0.0, 0.0, 0.0));
        assert!(rec.active);
    }
}
