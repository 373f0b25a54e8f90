//! Fleet notifications

use tokio::sync::broadcast;
use tracing::trace;

use crate::models::{Command, Device, DeviceStatus};

// Slow subscribers lag and skip events past this many.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Observable side effects of registry, lifecycle and dispatcher operations
#[derive(Debug, Clone, PartialEq)]
pub enum FleetEvent {
    DeviceRegistered(Device),
    DeviceUpdated(Device),
    DeviceRemoved(String),
    StatusUpdate {
        device_id: String,
        status: DeviceStatus,
    },
    DeviceOffline(String),
    CommandSent {
        device_id: String,
        command: Command,
    },
}

impl FleetEvent {
    pub fn name(&self) -> &'static str {
        match self {
            FleetEvent::DeviceRegistered(_) => "deviceRegistered",
            FleetEvent::DeviceUpdated(_) => "deviceUpdated",
            FleetEvent::DeviceRemoved(_) => "deviceRemoved",
            FleetEvent::StatusUpdate { .. } => "statusUpdate",
            FleetEvent::DeviceOffline(_) => "deviceOffline",
            FleetEvent::CommandSent { .. } => "commandSent",
        }
    }
}

/// Fan-out point for [`FleetEvent`]s
///
/// Cloning shares the same channel. Emitting with nobody subscribed is fine.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<FleetEvent>,
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FleetEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: FleetEvent) {
        trace!("Emitting {}", event.name());
        let _ = self.tx.send(event);
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}
