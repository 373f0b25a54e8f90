//! Registry unit tests

use std::collections::HashSet;
use std::thread;

use fleethub::errors::FleetError;
use fleethub::models::{DeviceConfig, DeviceType, DeviceUpdate};
use fleethub::registry::FleetEvent;

use crate::mocks::{drain, new_registry, register};

/// Both directions of the membership index agree
fn assert_index_consistent(registry: &fleethub::registry::DeviceRegistry) {
    for group in registry.all_groups() {
        for id in &group.device_ids {
            let device = registry.get(id).unwrap();
            assert!(device.groups.contains(&group.name), "{id} missing {}", group.name);
        }
    }
    for device in registry.all_devices() {
        for group in &device.groups {
            let members: HashSet<String> =
                registry.device_ids_in_group(group).unwrap().into_iter().collect();
            assert!(members.contains(&device.id), "{} missing {}", group, device.id);
        }
    }
}

#[test]
fn test_register_device() {
    let registry = new_registry();
    let mut rx = registry.notifier().subscribe();

    let device = register(&registry, "sensor-01", &["floor-1", "critical"]);

    assert_eq!(device.id, "sensor-01");
    assert_eq!(device.device_type, DeviceType::Sensor);
    assert!(device.status.is_none());
    assert_eq!(device.created_at, device.updated_at);
    assert_eq!(device.groups.len(), 2);
    assert!(registry.has_group("floor-1"));
    assert!(registry.has_group("critical"));
    assert_index_consistent(&registry);

    let events = drain(&mut rx);
    assert_eq!(events, vec![FleetEvent::DeviceRegistered(device)]);
}

#[test]
fn test_register_duplicate_leaves_registry_untouched() {
    let registry = new_registry();
    let original = register(&registry, "sensor-01", &["floor-1"]);
    let mut rx = registry.notifier().subscribe();

    let result = registry.register(
        "sensor-01",
        "Impostor",
        DeviceType::Camera,
        None,
        &["floor-2".to_string()],
    );

    assert!(matches!(result, Err(FleetError::AlreadyExists(id)) if id == "sensor-01"));
    assert_eq!(registry.get("sensor-01").unwrap(), original);
    assert!(!registry.has_group("floor-2"));
    assert!(drain(&mut rx).is_empty());
}

#[test]
fn test_register_rejects_invalid_input() {
    let registry = new_registry();

    let bad_id = registry.register("s1", "Too short", DeviceType::Sensor, None, &[]);
    assert!(matches!(bad_id, Err(FleetError::InvalidId(_))));

    let bad_chars = registry.register("sensor/01", "Slash", DeviceType::Sensor, None, &[]);
    assert!(matches!(bad_chars, Err(FleetError::InvalidId(_))));

    let bad_group = registry.register(
        "sensor-01",
        "Bad group",
        DeviceType::Sensor,
        None,
        &["x".to_string()],
    );
    assert!(matches!(bad_group, Err(FleetError::InvalidGroupName(_))));

    let bad_config = registry.register(
        "sensor-01",
        "Bad config",
        DeviceType::Sensor,
        Some(DeviceConfig {
            security_level: Some(9),
            ..Default::default()
        }),
        &[],
    );
    assert!(matches!(bad_config, Err(FleetError::InvalidConfig(_))));

    assert!(registry.is_empty());
    assert!(registry.all_groups().is_empty());
}

#[test]
fn test_update_merges_config() {
    let registry = new_registry();
    registry
        .register(
            "sensor-01",
            "Sensor",
            DeviceType::Sensor,
            Some(DeviceConfig {
                reporting_interval: Some(60),
                auto_wake: Some(true),
                ..Default::default()
            }),
            &[],
        )
        .unwrap();
    let mut rx = registry.notifier().subscribe();

    let updated = registry
        .update(
            "sensor-01",
            DeviceUpdate {
                name: Some("Renamed".to_string()),
                config: Some(DeviceConfig {
                    reporting_interval: Some(300),
                    ..Default::default()
                }),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(updated.name, "Renamed");
    assert_eq!(updated.config.reporting_interval, Some(300));
    assert_eq!(updated.config.auto_wake, Some(true));
    assert!(updated.updated_at >= updated.created_at);
    assert_eq!(drain(&mut rx), vec![FleetEvent::DeviceUpdated(updated)]);
}

#[test]
fn test_update_rejects_invalid_merged_config() {
    let registry = new_registry();
    let original = register(&registry, "sensor-01", &[]);

    let result = registry.update(
        "sensor-01",
        DeviceUpdate {
            name: Some("Renamed".to_string()),
            config: Some(DeviceConfig {
                reporting_interval: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        },
    );

    assert!(matches!(result, Err(FleetError::InvalidConfig(_))));
    assert_eq!(registry.get("sensor-01").unwrap(), original);
}

#[test]
fn test_unknown_device_not_found() {
    let registry = new_registry();

    assert!(matches!(registry.get("ghost-01"), Err(FleetError::NotFound(_))));
    assert!(matches!(
        registry.update("ghost-01", DeviceUpdate::default()),
        Err(FleetError::NotFound(_))
    ));
    assert!(matches!(
        registry.add_to_group("ghost-01", "floor-1"),
        Err(FleetError::NotFound(_))
    ));
    assert!(!registry.remove("ghost-01"));
}

#[test]
fn test_remove_purges_group_membership() {
    let registry = new_registry();
    register(&registry, "sensor-01", &["floor-1", "critical"]);
    register(&registry, "sensor-02", &["floor-1"]);
    let mut rx = registry.notifier().subscribe();

    assert!(registry.remove("sensor-01"));

    assert!(!registry.has("sensor-01"));
    assert_eq!(registry.device_ids_in_group("floor-1").unwrap(), vec!["sensor-02"]);
    // Emptied groups stay around
    assert!(registry.has_group("critical"));
    assert!(registry.device_ids_in_group("critical").unwrap().is_empty());
    assert_index_consistent(&registry);
    assert_eq!(
        drain(&mut rx),
        vec![FleetEvent::DeviceRemoved("sensor-01".to_string())]
    );
}

#[test]
fn test_group_membership() {
    let registry = new_registry();
    let device = register(&registry, "sensor-01", &[]);
    let mut rx = registry.notifier().subscribe();

    assert!(registry.add_to_group("sensor-01", "floor-1").unwrap());
    // Idempotent
    assert!(registry.add_to_group("sensor-01", "floor-1").unwrap());
    assert_eq!(registry.device_ids_in_group("floor-1").unwrap(), vec!["sensor-01"]);
    assert_index_consistent(&registry);

    let member = registry.get("sensor-01").unwrap();
    assert!(member.updated_at >= device.updated_at);

    assert!(registry.remove_from_group("sensor-01", "floor-1").unwrap());
    assert!(!registry.remove_from_group("sensor-01", "floor-1").unwrap());
    assert!(registry.get("sensor-01").unwrap().groups.is_empty());
    assert_index_consistent(&registry);

    // Membership changes are silent
    assert!(drain(&mut rx).is_empty());
}

#[test]
fn test_group_errors() {
    let registry = new_registry();
    register(&registry, "sensor-01", &[]);

    assert!(matches!(
        registry.add_to_group("sensor-01", "!"),
        Err(FleetError::InvalidGroupName(_))
    ));
    assert!(matches!(
        registry.remove_from_group("sensor-01", "missing"),
        Err(FleetError::GroupNotFound(_))
    ));
    assert!(matches!(
        registry.devices_in_group("missing"),
        Err(FleetError::GroupNotFound(_))
    ));
    assert!(matches!(registry.create_group("x"), Err(FleetError::InvalidGroupName(_))));
}

#[test]
fn test_create_and_remove_group() {
    let registry = new_registry();
    register(&registry, "sensor-01", &["floor-1"]);

    assert!(registry.create_group("Building A").unwrap());
    assert!(!registry.create_group("Building A").unwrap());
    assert!(registry.devices_in_group("Building A").unwrap().is_empty());

    assert!(registry.remove_group("floor-1"));
    assert!(!registry.remove_group("floor-1"));
    assert!(registry.get("sensor-01").unwrap().groups.is_empty());
    assert_index_consistent(&registry);
}

#[test]
fn test_devices_in_group_returns_snapshots() {
    let registry = new_registry();
    register(&registry, "sensor-01", &["floor-1"]);
    register(&registry, "sensor-02", &["floor-1"]);
    register(&registry, "camera-01", &["floor-2"]);

    let mut ids: Vec<String> = registry
        .devices_in_group("floor-1")
        .unwrap()
        .into_iter()
        .map(|d| d.id)
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["sensor-01", "sensor-02"]);
    assert_eq!(registry.len(), 3);
}

#[test]
fn test_index_consistent_under_concurrent_mutation() {
    let registry = new_registry();

    let workers: Vec<_> = (0..8)
        .map(|worker| {
            let registry = registry.clone();
            thread::spawn(move || {
                for i in 0..50 {
                    let id = format!("dev-{worker}-{i}");
                    let own = format!("own-{worker}");
                    register(&registry, &id, &["shared-a", own.as_str()]);
                    registry.add_to_group(&id, "shared-b").unwrap();
                    if i % 7 == 0 {
                        registry.remove_group("shared-b");
                    }
                    if i % 3 == 0 {
                        registry.remove_from_group(&id, "shared-a").unwrap();
                    }
                    if i % 2 == 0 {
                        assert!(registry.remove(&id));
                    }
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(registry.len(), 8 * 25);
    assert_index_consistent(&registry);
    for device in registry.all_devices() {
        assert!(device.groups.iter().any(|g| g.starts_with("own-")));
    }
}
