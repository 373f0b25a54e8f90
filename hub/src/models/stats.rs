//! Group statistics models

use serde::{Deserialize, Serialize};

use crate::models::status::PowerMode;

/// Number of group members per power mode
///
/// A member whose report omitted `powerMode` is counted as `normal`, the
/// default applied at ingestion. Members that never reported count nowhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerModeDistribution {
    pub normal: usize,
    pub low_power: usize,
    pub sleep: usize,
    pub critical: usize,
}

impl PowerModeDistribution {
    pub fn record(&mut self, mode: PowerMode) {
        match mode {
            PowerMode::Normal => self.normal += 1,
            PowerMode::LowPower => self.low_power += 1,
            PowerMode::Sleep => self.sleep += 1,
            PowerMode::Critical => self.critical += 1,
        }
    }

    pub fn count(&self, mode: PowerMode) -> usize {
        match mode {
            PowerMode::Normal => self.normal,
            PowerMode::LowPower => self.low_power,
            PowerMode::Sleep => self.sleep,
            PowerMode::Critical => self.critical,
        }
    }
}

/// Summary of a group, computed on demand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupStatistics {
    pub average_battery_level: f64,
    pub power_mode_distribution: PowerModeDistribution,
    pub online_count: usize,
    pub offline_count: usize,
    pub total_devices: usize,
}
