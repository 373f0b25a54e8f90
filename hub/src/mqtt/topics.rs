//! MQTT topic layout
//!
//! Every device owns two topics under a shared prefix:
//! `{prefix}{device_id}/status` (device -> hub) and
//! `{prefix}{device_id}/command` (hub -> device).

pub const DEFAULT_TOPIC_PREFIX: &str = "device/";

const STATUS_SUFFIX: &str = "/status";
const COMMAND_SUFFIX: &str = "/command";

/// Topic builder for a configurable prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    prefix: String,
}

impl Topics {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Device status topic
    pub fn device_status(&self, device_id: &str) -> String {
        format!("{}{}{}", self.prefix, device_id, STATUS_SUFFIX)
    }

    /// Device command topic
    pub fn device_command(&self, device_id: &str) -> String {
        format!("{}{}{}", self.prefix, device_id, COMMAND_SUFFIX)
    }

    /// Filter matching the status topic of every device
    pub fn status_filter(&self) -> String {
        format!("{}+{}", self.prefix, STATUS_SUFFIX)
    }

    /// Extract the device ID from a status topic
    pub fn parse_status_device_id<'a>(&self, topic: &'a str) -> Option<&'a str> {
        let device_id = topic
            .strip_prefix(self.prefix.as_str())?
            .strip_suffix(STATUS_SUFFIX)?;
        if device_id.is_empty() || device_id.contains('/') {
            None
        } else {
            Some(device_id)
        }
    }

    /// Check if topic is a status topic under this prefix
    pub fn is_status_topic(&self, topic: &str) -> bool {
        self.parse_status_device_id(topic).is_some()
    }
}

impl Default for Topics {
    fn default() -> Self {
        Self::new(DEFAULT_TOPIC_PREFIX)
    }
}
