//! Command dispatch to devices and groups

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::errors::FleetError;
use crate::models::{Command, CommandOutcome, CommandType};
use crate::mqtt::client::{MessageBus, QoS};
use crate::mqtt::topics::Topics;
use crate::registry::{DeviceRegistry, FleetEvent};
use crate::validation::Validator;

/// Resolves targets in the registry and publishes commands on the bus
pub struct CommandDispatcher {
    registry: Arc<DeviceRegistry>,
    bus: Arc<dyn MessageBus>,
    validator: Arc<dyn Validator>,
    topics: Topics,
    qos: QoS,
}

impl CommandDispatcher {
    pub fn new(
        registry: Arc<DeviceRegistry>,
        bus: Arc<dyn MessageBus>,
        topics: Topics,
        qos: QoS,
    ) -> Self {
        let validator = registry.validator();
        Self {
            registry,
            bus,
            validator,
            topics,
            qos,
        }
    }

    /// Send one command to one device
    ///
    /// Each call gets a fresh request ID. Nothing is retried.
    pub async fn send_to_device(
        &self,
        device_id: &str,
        command_type: CommandType,
        payload: Option<serde_json::Value>,
    ) -> Result<CommandOutcome, FleetError> {
        if !self.registry.has(device_id) {
            return Err(FleetError::NotFound(device_id.to_string()));
        }
        if !self.bus.is_connected() {
            return Err(FleetError::NotConnected);
        }

        let command = Command::new(command_type, payload);
        if !self.validator.is_valid_command(&command) {
            return Err(FleetError::InvalidCommand(format!(
                "{:?} with payload {:?}",
                command.command_type, command.payload
            )));
        }

        let topic = self.topics.device_command(device_id);
        let bytes = serde_json::to_vec(&command)?;
        self.bus
            .publish(&topic, bytes, self.qos)
            .await
            .map_err(|source| FleetError::DeliveryFailed {
                device_id: device_id.to_string(),
                source,
            })?;

        debug!(
            "Sent {:?} to {} (request {})",
            command.command_type, device_id, command.request_id
        );
        self.registry.notifier().emit(FleetEvent::CommandSent {
            device_id: device_id.to_string(),
            command: command.clone(),
        });

        Ok(CommandOutcome {
            device_id: device_id.to_string(),
            topic,
            command,
        })
    }

    /// Send the same command to every member of a group
    ///
    /// All member sends run concurrently and every one runs to completion.
    /// When any of them fails the whole call fails with the first failure in
    /// member order, but members that already received the command keep it.
    pub async fn send_to_group(
        &self,
        group: &str,
        command_type: CommandType,
        payload: Option<serde_json::Value>,
    ) -> Result<(), FleetError> {
        let members = self.registry.device_ids_in_group(group)?;
        if members.is_empty() {
            debug!("Group {} is empty, nothing to send", group);
            return Ok(());
        }

        let sends = members
            .iter()
            .map(|device_id| self.send_to_device(device_id, command_type, payload.clone()));
        let results = join_all(sends).await;

        let total = results.len();
        let mut failed = 0;
        let mut first_error = None;
        for result in results {
            if let Err(e) = result {
                failed += 1;
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }

        match first_error {
            None => {
                info!("Sent {:?} to all {} member(s) of {}", command_type, total, group);
                Ok(())
            }
            Some(source) => {
                warn!(
                    "{:?} to group {} failed for {} of {} member(s)",
                    command_type, group, failed, total
                );
                Err(FleetError::GroupCommandFailed {
                    group: group.to_string(),
                    source: Box::new(source),
                })
            }
        }
    }
}
