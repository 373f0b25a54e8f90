//! Command dispatch unit tests

use std::sync::Arc;

use serde_json::json;
use tokio_test::{assert_err, assert_ok};

use fleethub::dispatch::CommandDispatcher;
use fleethub::errors::{BusError, FleetError};
use fleethub::models::CommandType;
use fleethub::mqtt::client::QoS;
use fleethub::mqtt::topics::Topics;
use fleethub::registry::{DeviceRegistry, FleetEvent};

use crate::mocks::{drain, new_registry, register, MockBus};

fn new_dispatcher(registry: Arc<DeviceRegistry>, bus: Arc<MockBus>) -> CommandDispatcher {
    CommandDispatcher::new(registry, bus, Topics::default(), QoS::AtLeastOnce)
}

#[tokio::test]
async fn test_send_to_device() {
    let registry = new_registry();
    let bus = Arc::new(MockBus::new());
    let dispatcher = new_dispatcher(registry.clone(), bus.clone());
    register(&registry, "sensor-01", &[]);
    let mut rx = registry.notifier().subscribe();

    let outcome = assert_ok!(
        dispatcher
            .send_to_device("sensor-01", CommandType::Sleep, Some(json!({"duration": 600})))
            .await
    );

    assert_eq!(outcome.topic, "device/sensor-01/command");
    let published = bus.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].topic, "device/sensor-01/command");
    assert_eq!(published[0].qos, QoS::AtLeastOnce);
    assert_eq!(published[0].payload["type"], "sleep");
    assert_eq!(published[0].payload["payload"]["duration"], 600);
    assert_eq!(published[0].payload["requestId"], outcome.command.request_id.as_str());
    assert!(published[0].payload["timestamp"].as_i64().unwrap() > 0);

    assert_eq!(
        drain(&mut rx),
        vec![FleetEvent::CommandSent {
            device_id: "sensor-01".to_string(),
            command: outcome.command,
        }]
    );
}

#[tokio::test]
async fn test_request_ids_are_unique() {
    let registry = new_registry();
    let bus = Arc::new(MockBus::new());
    let dispatcher = new_dispatcher(registry.clone(), bus.clone());
    register(&registry, "sensor-01", &[]);

    let first = dispatcher
        .send_to_device("sensor-01", CommandType::GetStatus, None)
        .await
        .unwrap();
    let second = dispatcher
        .send_to_device("sensor-01", CommandType::GetStatus, None)
        .await
        .unwrap();
    assert_ne!(first.command.request_id, second.command.request_id);
}

#[tokio::test]
async fn test_send_to_device_errors() {
    let registry = new_registry();
    let bus = Arc::new(MockBus::new());
    let dispatcher = new_dispatcher(registry.clone(), bus.clone());
    register(&registry, "sensor-01", &[]);

    let missing = dispatcher
        .send_to_device("ghost-01", CommandType::Wake, None)
        .await;
    assert!(matches!(missing, Err(FleetError::NotFound(_))));

    let invalid = dispatcher
        .send_to_device("sensor-01", CommandType::SetReportingInterval, Some(json!(0)))
        .await;
    assert!(matches!(invalid, Err(FleetError::InvalidCommand(_))));

    let no_payload = dispatcher
        .send_to_device("sensor-01", CommandType::SetReportingInterval, None)
        .await;
    assert!(matches!(no_payload, Err(FleetError::InvalidCommand(_))));

    bus.set_connected(false);
    let disconnected = dispatcher
        .send_to_device("sensor-01", CommandType::Wake, None)
        .await;
    assert!(matches!(disconnected, Err(FleetError::NotConnected)));

    assert!(bus.published().is_empty());
}

#[tokio::test]
async fn test_send_to_device_delivery_failure() {
    let registry = new_registry();
    let bus = Arc::new(MockBus::new());
    let dispatcher = new_dispatcher(registry.clone(), bus.clone());
    register(&registry, "sensor-01", &[]);
    bus.fail_topic("device/sensor-01/command");
    let mut rx = registry.notifier().subscribe();

    let result = dispatcher
        .send_to_device("sensor-01", CommandType::Restart, None)
        .await;

    match result {
        Err(FleetError::DeliveryFailed { device_id, source }) => {
            assert_eq!(device_id, "sensor-01");
            assert!(matches!(source, BusError::Publish { .. }));
        }
        other => panic!("expected DeliveryFailed, got {other:?}"),
    }
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn test_send_to_group() {
    let registry = new_registry();
    let bus = Arc::new(MockBus::new());
    let dispatcher = new_dispatcher(registry.clone(), bus.clone());
    register(&registry, "sensor-01", &["floor-1"]);
    register(&registry, "sensor-02", &["floor-1"]);
    register(&registry, "sensor-03", &["floor-2"]);

    assert_ok!(
        dispatcher
            .send_to_group("floor-1", CommandType::SetReportingInterval, Some(json!({"interval": 120})))
            .await
    );

    let mut topics: Vec<String> = bus.published().into_iter().map(|p| p.topic).collect();
    topics.sort();
    assert_eq!(
        topics,
        vec!["device/sensor-01/command", "device/sensor-02/command"]
    );

    let request_ids: std::collections::HashSet<String> = bus
        .published()
        .iter()
        .map(|p| p.payload["requestId"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(request_ids.len(), 2);
}

#[tokio::test]
async fn test_send_to_empty_group() {
    let registry = new_registry();
    let bus = Arc::new(MockBus::new());
    let dispatcher = new_dispatcher(registry.clone(), bus.clone());
    registry.create_group("empty-group").unwrap();

    assert_ok!(
        dispatcher
            .send_to_group("empty-group", CommandType::Wake, None)
            .await
    );
    assert!(bus.published().is_empty());

    let missing = dispatcher.send_to_group("missing", CommandType::Wake, None).await;
    assert!(matches!(missing, Err(FleetError::GroupNotFound(_))));
}

#[tokio::test]
async fn test_send_to_group_partial_failure() {
    let registry = new_registry();
    let bus = Arc::new(MockBus::new());
    let dispatcher = new_dispatcher(registry.clone(), bus.clone());
    register(&registry, "sensor-01", &["floor-1"]);
    register(&registry, "sensor-02", &["floor-1"]);
    register(&registry, "sensor-03", &["floor-1"]);
    bus.fail_topic("device/sensor-02/command");
    let mut rx = registry.notifier().subscribe();

    let result = dispatcher
        .send_to_group("floor-1", CommandType::Update, None)
        .await;
    let err = assert_err!(result);

    match err {
        FleetError::GroupCommandFailed { group, source } => {
            assert_eq!(group, "floor-1");
            assert!(matches!(
                *source,
                FleetError::DeliveryFailed { ref device_id, .. } if device_id == "sensor-02"
            ));
        }
        other => panic!("expected GroupCommandFailed, got {other:?}"),
    }

    // The healthy members still got the command
    let mut topics: Vec<String> = bus.published().into_iter().map(|p| p.topic).collect();
    topics.sort();
    assert_eq!(
        topics,
        vec!["device/sensor-01/command", "device/sensor-03/command"]
    );
    let sent = drain(&mut rx)
        .into_iter()
        .filter(|e| matches!(e, FleetEvent::CommandSent { .. }))
        .count();
    assert_eq!(sent, 2);
}
