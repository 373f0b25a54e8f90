//! Device models

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::status::DeviceStatus;

/// Kind of hardware a device represents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Sensor,
    Camera,
    Actuator,
    Gateway,
    #[default]
    Generic,
}

/// Device configuration
///
/// Every field is optional. Values are kept as wide integers so that an
/// out-of-range value reaches the validator instead of failing to decode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceConfig {
    /// Reporting interval in seconds, 1..=86400
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporting_interval: Option<i64>,

    /// Battery percentage below which the device may sleep, 0..=100
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_threshold: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_wake: Option<bool>,

    /// Security level, 1..=5
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_level: Option<i64>,
}

impl DeviceConfig {
    /// Shallow merge: fields set in `patch` replace the current ones
    pub fn merged_with(&self, patch: &DeviceConfig) -> DeviceConfig {
        DeviceConfig {
            reporting_interval: patch.reporting_interval.or(self.reporting_interval),
            sleep_threshold: patch.sleep_threshold.or(self.sleep_threshold),
            auto_wake: patch.auto_wake.or(self.auto_wake),
            security_level: patch.security_level.or(self.security_level),
        }
    }
}

/// A registered device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Unique, immutable device ID
    pub id: String,

    /// Display name
    pub name: String,

    #[serde(rename = "type")]
    pub device_type: DeviceType,

    #[serde(default)]
    pub config: DeviceConfig,

    /// Names of the groups this device belongs to
    #[serde(default)]
    pub groups: HashSet<String>,

    /// Last known status, absent until the first report
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DeviceStatus>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Device {
    /// Create a device with no groups and no status
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        device_type: DeviceType,
        config: DeviceConfig,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            device_type,
            config,
            groups: HashSet::new(),
            status: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Advance `updated_at`, never moving it backwards
    pub fn touch(&mut self) {
        let now = Utc::now();
        if now > self.updated_at {
            self.updated_at = now;
        }
    }

    /// Whether the last known status says the device is online
    pub fn is_online(&self) -> bool {
        self.status.as_ref().is_some_and(|status| status.is_online())
    }
}

/// Partial update of a device, only supplied fields are applied
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceUpdate {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default, rename = "type")]
    pub device_type: Option<DeviceType>,

    #[serde(default)]
    pub config: Option<DeviceConfig>,
}
