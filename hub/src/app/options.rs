//! Application configuration options

use std::time::Duration;

use secrecy::SecretString;

use crate::errors::FleetError;
use crate::lifecycle::DEFAULT_SWEEP_INTERVAL;
use crate::mqtt::client::{MqttAddress, QoS};
use crate::mqtt::topics::DEFAULT_TOPIC_PREFIX;
use crate::storage::settings::Settings;
use crate::workers::bus;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Broker to connect to
    pub broker_address: MqttAddress,

    /// Fleet configuration
    pub fleet: FleetOptions,

    /// Enable local HTTP server
    pub enable_socket_server: bool,

    /// Server configuration
    pub server: ServerOptions,

    /// Bus worker options
    pub bus_worker: bus::Options,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            lifecycle: LifecycleOptions::default(),
            broker_address: MqttAddress::default(),
            fleet: FleetOptions::default(),
            enable_socket_server: true,
            server: ServerOptions::default(),
            bus_worker: bus::Options::default(),
        }
    }
}

impl AppOptions {
    /// Build options from a settings file
    pub fn from_settings(settings: &Settings) -> Result<Self, FleetError> {
        let broker = &settings.mqtt_broker;
        let qos = qos_from_level(broker.qos)?;

        let mut broker_address = MqttAddress::from_url(&broker.url)?;
        broker_address.client_id = broker.client_id.clone();
        broker_address.ca_cert_path = broker.ca_cert_path.clone();
        if let Some(ref username) = broker.username {
            broker_address.username = Some(username.clone());
        }
        if let Some(ref password) = broker.password {
            broker_address.password = Some(SecretString::from(password.clone()));
        }

        if settings.fleet.sweep_interval_secs == 0 {
            return Err(FleetError::ConfigError(
                "sweep_interval_secs must be at least 1".to_string(),
            ));
        }

        let mut bus_worker = bus::Options {
            status_qos: qos,
            ..Default::default()
        };
        bus_worker.reconnect_cooldown.max_delay = Duration::from_secs(broker.max_reconnect_delay_secs);

        Ok(Self {
            broker_address,
            fleet: FleetOptions {
                topic_prefix: settings.fleet.topic_prefix.clone(),
                sweep_interval: Duration::from_secs(settings.fleet.sweep_interval_secs),
                command_qos: qos,
            },
            enable_socket_server: settings.enable_socket_server,
            server: ServerOptions {
                host: settings.server.host.clone(),
                port: settings.server.port,
            },
            bus_worker,
            ..Default::default()
        })
    }
}

fn qos_from_level(level: u8) -> Result<QoS, FleetError> {
    match level {
        0 => Ok(QoS::AtMostOnce),
        1 => Ok(QoS::AtLeastOnce),
        2 => Ok(QoS::ExactlyOnce),
        other => Err(FleetError::ConfigError(format!("invalid MQTT QoS level: {other}"))),
    }
}

/// Lifecycle options for the hub process
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(30),
        }
    }
}

/// Fleet behaviour options
#[derive(Debug, Clone)]
pub struct FleetOptions {
    /// Prefix of device status and command topics
    pub topic_prefix: String,

    /// Offline sweep period
    pub sweep_interval: Duration,

    /// QoS used when publishing commands
    pub command_qos: QoS,
}

impl Default for FleetOptions {
    fn default() -> Self {
        Self {
            topic_prefix: DEFAULT_TOPIC_PREFIX.to_string(),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            command_qos: QoS::AtLeastOnce,
        }
    }
}

/// Local HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}
