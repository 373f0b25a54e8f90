//! Group statistics unit tests

use fleethub::errors::FleetError;
use fleethub::models::{PowerMode, StatusReport};
use fleethub::stats::{summarize, StatisticsAggregator};
use fleethub::utils::now_millis;

use crate::mocks::{new_registry, register, report, set_status};

#[test]
fn test_group_statistics() {
    let registry = new_registry();
    let statistics = StatisticsAggregator::new(registry.clone());
    register(&registry, "sensor-01", &["floor-1"]);
    register(&registry, "sensor-02", &["floor-1"]);

    let now = now_millis();
    set_status(&registry, "sensor-01", report(80.0, PowerMode::Normal), now);
    set_status(&registry, "sensor-02", report(60.0, PowerMode::LowPower), now);

    let stats = statistics.compute_group_statistics("floor-1").unwrap();
    assert_eq!(stats.average_battery_level, 70.0);
    assert_eq!(stats.online_count, 2);
    assert_eq!(stats.offline_count, 0);
    assert_eq!(stats.total_devices, 2);
    assert_eq!(stats.power_mode_distribution.count(PowerMode::Normal), 1);
    assert_eq!(stats.power_mode_distribution.count(PowerMode::LowPower), 1);
    assert_eq!(stats.power_mode_distribution.count(PowerMode::Sleep), 0);
}

#[test]
fn test_devices_without_status_count_offline() {
    let registry = new_registry();
    let statistics = StatisticsAggregator::new(registry.clone());
    register(&registry, "sensor-01", &["floor-1"]);
    register(&registry, "sensor-02", &["floor-1"]);
    register(&registry, "sensor-03", &["floor-1"]);

    set_status(
        &registry,
        "sensor-01",
        StatusReport {
            power_mode: Some(PowerMode::Critical),
            ..Default::default()
        },
        now_millis(),
    );

    let stats = statistics.compute_group_statistics("floor-1").unwrap();
    // No battery readings at all
    assert_eq!(stats.average_battery_level, 0.0);
    assert_eq!(stats.online_count, 1);
    assert_eq!(stats.offline_count, 2);
    assert_eq!(stats.total_devices, 3);
    assert_eq!(stats.power_mode_distribution.count(PowerMode::Critical), 1);
    assert_eq!(stats.power_mode_distribution.count(PowerMode::Normal), 0);
}

#[test]
fn test_group_statistics_unknown_group() {
    let statistics = StatisticsAggregator::new(new_registry());
    assert!(matches!(
        statistics.compute_group_statistics("missing"),
        Err(FleetError::GroupNotFound(_))
    ));
}

#[test]
fn test_summarize_empty() {
    let stats = summarize(&[]);
    assert_eq!(stats.total_devices, 0);
    assert_eq!(stats.average_battery_level, 0.0);
    assert_eq!(stats.online_count + stats.offline_count, 0);
}

#[test]
fn test_statistics_serialize_camel_case() {
    let stats = summarize(&[]);
    let value = serde_json::to_value(&stats).unwrap();
    assert!(value.get("averageBatteryLevel").is_some());
    assert!(value.get("powerModeDistribution").is_some());
    assert!(value.get("onlineCount").is_some());
}
