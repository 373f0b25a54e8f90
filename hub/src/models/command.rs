//! Command models

use serde::{Deserialize, Serialize};

use crate::utils::{generate_uuid, now_millis};

/// Command kinds a device understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    Sleep,
    Wake,
    Restart,
    Update,
    SetReportingInterval,
    GetStatus,
}

/// Command as published on a device command topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    #[serde(rename = "type")]
    pub command_type: CommandType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,

    /// Epoch milliseconds at creation
    pub timestamp: i64,

    /// Correlates a later response from the device
    pub request_id: String,
}

impl Command {
    /// Build a command stamped now, with a fresh request ID
    pub fn new(command_type: CommandType, payload: Option<serde_json::Value>) -> Self {
        Self {
            command_type,
            payload,
            timestamp: now_millis(),
            request_id: generate_uuid(),
        }
    }
}

/// Result of a successful single-device send
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutcome {
    pub device_id: String,
    pub topic: String,
    pub command: Command,
}
