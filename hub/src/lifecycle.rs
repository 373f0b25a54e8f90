//! Device status lifecycle
//!
//! Connectivity per device moves `Unknown -> Online` on the first report,
//! `Online -> Offline` when the sweep finds no report for two sweep periods,
//! and back to `Online` only when a new report arrives. Devices that never
//! reported are not swept.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::errors::FleetError;
use crate::models::{DeviceStatus, StatusReport};
use crate::mqtt::client::InboundMessage;
use crate::mqtt::topics::Topics;
use crate::registry::{DeviceRegistry, FleetEvent};
use crate::utils::now_millis;

pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Merges inbound status reports and demotes silent devices
pub struct StatusLifecycle {
    registry: Arc<DeviceRegistry>,
    topics: Topics,
    sweep_interval: Duration,
}

impl StatusLifecycle {
    pub fn new(registry: Arc<DeviceRegistry>, topics: Topics, sweep_interval: Duration) -> Self {
        Self {
            registry,
            topics,
            sweep_interval,
        }
    }

    pub fn registry(&self) -> &Arc<DeviceRegistry> {
        &self.registry
    }

    pub fn topics(&self) -> &Topics {
        &self.topics
    }

    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    /// A device is stale once its last report is older than this
    pub fn offline_threshold(&self) -> Duration {
        self.sweep_interval * 2
    }

    // =============================== INGESTION ================================ //

    /// Handle a message from the bus
    ///
    /// Never fails: bad payloads and unknown devices are logged and dropped so
    /// one misbehaving device cannot disturb the others.
    pub fn handle_message(&self, msg: &InboundMessage) -> Option<DeviceStatus> {
        if !self.topics.is_status_topic(&msg.topic) {
            debug!("Ignoring message on non-status topic: {}", msg.topic);
            return None;
        }

        let (device_id, report) = match self.parse_status(msg) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Dropping status report: {}", e);
                return None;
            }
        };

        match self.ingest(&device_id, report) {
            Ok(status) => Some(status),
            Err(e) => {
                warn!("Dropping status report: {}", e);
                None
            }
        }
    }

    /// Decode a status message into a device ID and a report
    ///
    /// The payload must be a JSON object.
    pub fn parse_status(&self, msg: &InboundMessage) -> Result<(String, StatusReport), FleetError> {
        let device_id = self.topics.parse_status_device_id(&msg.topic).ok_or_else(|| {
            FleetError::MalformedMessage(format!("not a status topic: {}", msg.topic))
        })?;
        let report: StatusReport = msg.parse_json_object()?;
        Ok((device_id.to_string(), report))
    }

    /// Merge a decoded report for a device, stamping it with the current time
    ///
    /// Fails with `NotFound` for unregistered devices and `MalformedMessage`
    /// for a battery level outside 0..=100; the bus path logs and drops both.
    pub fn ingest(&self, device_id: &str, report: StatusReport) -> Result<DeviceStatus, FleetError> {
        if !self.registry.has(device_id) {
            return Err(FleetError::NotFound(device_id.to_string()));
        }
        if let Some(level) = report.battery_level {
            if !(0.0..=100.0).contains(&level) {
                return Err(FleetError::MalformedMessage(format!(
                    "battery level {level} from {device_id} out of range"
                )));
            }
        }

        let status = report.into_status(device_id, now_millis());
        self.registry.apply_status(device_id, status.clone())?;

        debug!(
            "Status from {}: {:?}, battery {:?}",
            device_id, status.connection_status, status.battery_level
        );
        self.registry.notifier().emit(FleetEvent::StatusUpdate {
            device_id: device_id.to_string(),
            status: status.clone(),
        });
        Ok(status)
    }

    // ================================= SWEEP ================================== //

    /// Demote every stale online device; returns the IDs that went offline
    pub fn sweep(&self) -> Vec<String> {
        self.sweep_at(now_millis())
    }

    /// Sweep as of `now` (epoch millis)
    ///
    /// Candidates are collected from a snapshot, then each one is re-checked
    /// under the write lock so a report that landed in between wins.
    pub fn sweep_at(&self, now: i64) -> Vec<String> {
        let threshold_ms = i64::try_from(self.offline_threshold().as_millis()).unwrap_or(i64::MAX);

        let mut demoted = Vec::new();
        for device_id in self.registry.offline_candidates(now, threshold_ms) {
            let Some(device) = self.registry.mark_offline_if_stale(&device_id, now, threshold_ms)
            else {
                continue;
            };
            let last_seen = device.status.as_ref().map(|s| s.last_seen).unwrap_or_default();
            info!("Device {} went offline (last seen {} ms ago)", device_id, now - last_seen);
            self.registry
                .notifier()
                .emit(FleetEvent::DeviceOffline(device_id.clone()));
            demoted.push(device_id);
        }
        demoted
    }
}
