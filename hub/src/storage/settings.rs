//! Settings file management

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::FleetError;
use crate::logs::LogLevel;
use crate::mqtt::topics::DEFAULT_TOPIC_PREFIX;

/// Hub settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub log_json: bool,

    /// Directory for a daily-rolling log file, stdout only when absent
    #[serde(default)]
    pub log_dir: Option<String>,

    /// MQTT broker configuration
    #[serde(default)]
    pub mqtt_broker: MqttBrokerSettings,

    /// Device registry and lifecycle configuration
    #[serde(default)]
    pub fleet: FleetSettings,

    /// Enable local HTTP server
    #[serde(default = "default_true")]
    pub enable_socket_server: bool,

    /// Local HTTP server configuration
    #[serde(default)]
    pub server: ServerSettings,
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_json: false,
            log_dir: None,
            mqtt_broker: MqttBrokerSettings::default(),
            fleet: FleetSettings::default(),
            enable_socket_server: true,
            server: ServerSettings::default(),
        }
    }
}

impl Settings {
    /// Read settings from a JSON file, falling back to defaults when it is missing
    pub async fn load(path: &Path) -> Result<Self, FleetError> {
        if !tokio::fs::try_exists(path).await? {
            info!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// MQTT broker settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttBrokerSettings {
    /// Broker URL, `mqtt://host:port` or `mqtts://host:port`
    #[serde(default = "default_mqtt_url")]
    pub url: String,

    /// MQTT client identifier
    #[serde(default = "default_client_id")]
    pub client_id: String,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Optional path to a PEM-encoded CA certificate for broker TLS verification.
    /// When absent, the system certificate store is used.
    #[serde(default)]
    pub ca_cert_path: Option<String>,

    /// QoS level (0, 1 or 2) for commands and the status subscription
    #[serde(default = "default_qos")]
    pub qos: u8,

    /// Maximum delay between reconnect attempts
    #[serde(default = "default_max_reconnect_delay")]
    pub max_reconnect_delay_secs: u64,
}

fn default_mqtt_url() -> String {
    "mqtt://localhost:1883".to_string()
}

fn default_client_id() -> String {
    "fleethub".to_string()
}

fn default_qos() -> u8 {
    1
}

fn default_max_reconnect_delay() -> u64 {
    60
}

impl Default for MqttBrokerSettings {
    fn default() -> Self {
        Self {
            url: default_mqtt_url(),
            client_id: default_client_id(),
            username: None,
            password: None,
            ca_cert_path: None,
            qos: default_qos(),
            max_reconnect_delay_secs: default_max_reconnect_delay(),
        }
    }
}

/// Fleet behaviour settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetSettings {
    /// Prefix of device status and command topics
    #[serde(default = "default_topic_prefix")]
    pub topic_prefix: String,

    /// Offline sweep period in seconds; devices go offline after two periods
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

fn default_topic_prefix() -> String {
    DEFAULT_TOPIC_PREFIX.to_string()
}

fn default_sweep_interval() -> u64 {
    60
}

impl Default for FleetSettings {
    fn default() -> Self {
        Self {
            topic_prefix: default_topic_prefix(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

/// Local HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_server_host")]
    pub host: String,

    #[serde(default = "default_server_port")]
    pub port: u16,
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}
