//! Per-group statistics

use std::sync::Arc;

use crate::errors::FleetError;
use crate::models::{Device, GroupStatistics, PowerModeDistribution};
use crate::registry::DeviceRegistry;

/// Read-only projection of the registry into group summaries
pub struct StatisticsAggregator {
    registry: Arc<DeviceRegistry>,
}

impl StatisticsAggregator {
    pub fn new(registry: Arc<DeviceRegistry>) -> Self {
        Self { registry }
    }

    /// Summarise the current members of a group
    pub fn compute_group_statistics(&self, group: &str) -> Result<GroupStatistics, FleetError> {
        let devices = self.registry.devices_in_group(group)?;
        Ok(summarize(&devices))
    }
}

/// Summarise a set of devices
///
/// Only devices reporting a battery level count towards the average; with
/// none the average is 0. A device without status is offline and has no
/// power mode.
pub fn summarize(devices: &[Device]) -> GroupStatistics {
    let mut distribution = PowerModeDistribution::default();
    let mut battery_sum = 0.0;
    let mut battery_count = 0usize;
    let mut online_count = 0usize;

    for device in devices {
        let Some(status) = device.status.as_ref() else {
            continue;
        };
        if let Some(level) = status.battery_level {
            battery_sum += level;
            battery_count += 1;
        }
        if status.is_online() {
            online_count += 1;
        }
        distribution.record(status.power_mode);
    }

    let average_battery_level = if battery_count == 0 {
        0.0
    } else {
        battery_sum / battery_count as f64
    };

    GroupStatistics {
        average_battery_level,
        power_mode_distribution: distribution,
        online_count,
        offline_count: devices.len() - online_count,
        total_devices: devices.len(),
    }
}
