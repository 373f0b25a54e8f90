//! Error types for the fleet hub

use thiserror::Error;

/// Failure reported by the message bus transport
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    #[error("bus is not connected")]
    Disconnected,

    #[error("publish to {topic} failed: {reason}")]
    Publish { topic: String, reason: String },

    #[error("subscription to {topic} failed: {reason}")]
    Subscribe { topic: String, reason: String },

    #[error("client error: {0}")]
    Client(String),
}

/// Main error type for the fleet hub
#[derive(Error, Debug)]
pub enum FleetError {
    #[error("Invalid device id: {0}")]
    InvalidId(String),

    #[error("Invalid group name: {0}")]
    InvalidGroupName(String),

    #[error("Invalid device configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Device already exists: {0}")]
    AlreadyExists(String),

    #[error("Device not found: {0}")]
    NotFound(String),

    #[error("Group not found: {0}")]
    GroupNotFound(String),

    #[error("Message bus is not connected")]
    NotConnected,

    #[error("Command delivery to {device_id} failed: {source}")]
    DeliveryFailed {
        device_id: String,
        #[source]
        source: BusError,
    },

    #[error("Command to group {group} failed: {source}")]
    GroupCommandFailed {
        group: String,
        #[source]
        source: Box<FleetError>,
    },

    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Shutdown error: {0}")]
    ShutdownError(String),
}
