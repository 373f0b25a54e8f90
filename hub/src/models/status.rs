//! Device status models

use serde::{Deserialize, Serialize};

/// Power mode reported by a device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerMode {
    #[default]
    Normal,
    LowPower,
    Sleep,
    Critical,
}

/// Connectivity classification of a device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Online,
    Offline,
    Intermittent,
}

/// Last known status of a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatus {
    pub device_id: String,

    /// Battery percentage; devices without it are left out of battery averages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<f64>,

    pub power_mode: PowerMode,

    pub connection_status: ConnectionStatus,

    /// Epoch milliseconds of the report that produced this status
    pub last_seen: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firmware_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_strength: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<serde_json::Map<String, serde_json::Value>>,
}

impl DeviceStatus {
    pub fn is_online(&self) -> bool {
        self.connection_status == ConnectionStatus::Online
    }

    /// Copy of this status classified offline, `last_seen` untouched
    pub fn demoted(&self) -> DeviceStatus {
        DeviceStatus {
            connection_status: ConnectionStatus::Offline,
            ..self.clone()
        }
    }
}

/// Status payload as published by devices on their status topic
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    #[serde(default)]
    pub battery_level: Option<f64>,

    #[serde(default)]
    pub power_mode: Option<PowerMode>,

    #[serde(default)]
    pub connection_status: Option<ConnectionStatus>,

    #[serde(default)]
    pub firmware_version: Option<String>,

    #[serde(default)]
    pub signal_strength: Option<f64>,

    #[serde(default)]
    pub errors: Option<Vec<String>>,

    #[serde(default)]
    pub additional_info: Option<serde_json::Map<String, serde_json::Value>>,
}

impl StatusReport {
    /// Turn a wire report into a full status observed at `seen_at`
    ///
    /// A report that omits its power mode or connectivity is taken as a
    /// normal, online device: the report arriving is itself proof of life.
    pub fn into_status(self, device_id: &str, seen_at: i64) -> DeviceStatus {
        DeviceStatus {
            device_id: device_id.to_string(),
            battery_level: self.battery_level,
            power_mode: self.power_mode.unwrap_or_default(),
            connection_status: self.connection_status.unwrap_or_default(),
            last_seen: seen_at,
            firmware_version: self.firmware_version,
            signal_strength: self.signal_strength,
            errors: self.errors,
            additional_info: self.additional_info,
        }
    }
}
