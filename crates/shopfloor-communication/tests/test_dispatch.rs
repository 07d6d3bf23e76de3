//! Dispatcher intent mapping and disconnected-transport behavior.

use shopfloor_communication::{CommandDispatcher, CommandIntent, MqttConfig, MqttLink};
use shopfloor_core::{Axis, StateStore};
use std::sync::Arc;

fn offline_dispatcher() -> (CommandDispatcher, tokio::task::JoinHandle<()>) {
    // Points at a broker that does not exist; the link stays disconnected.
    let config = MqttConfig {
        broker_host: "127.0.0.1".to_string(),
        broker_port: 1,
        ..Default::default()
    };
    let (link, handle) = MqttLink::start(config, Arc::new(StateStore::new()));
    (CommandDispatcher::new(link, 500), handle)
}

#[tokio::test]
async fn test_dispatch_refuses_while_disconnected() {
    let (dispatcher, ingest) = offline_dispatcher();

    let err = dispatcher
        .dispatch(1, CommandIntent::Home)
        .await
        .unwrap_err();
    assert!(err.is_connection_error(), "got: {err}");
    ingest.abort();
}

#[tokio::test]
async fn test_intent_wire_forms() {
    let (dispatcher, ingest) = offline_dispatcher();

    assert_eq!(
        dispatcher.format_intent(&CommandIntent::Jog {
            axis: Axis::X,
            distance_mm: 10.0
        }),
        "$J=G91 G21 X+10.000 F500"
    );
    assert_eq!(dispatcher.format_intent(&CommandIntent::Home), "$H");
    assert_eq!(dispatcher.format_intent(&CommandIntent::FeedHold), "!");
    assert_eq!(
        dispatcher.format_intent(&CommandIntent::EmergencyStopAll),
        "\u{18}"
    );
    assert_eq!(
        dispatcher.format_intent(&CommandIntent::SelectFile("part.gcode".to_string())),
        "DOWNLOAD:part.gcode"
    );
    ingest.abort();
}
