//! Device and group registry
//!
//! The registry is the system of record for devices, their configuration,
//! their group memberships and their last known status. The device table and
//! the group index live behind a single lock, so every mutation keeps both
//! directions of the membership index in step and readers never observe one
//! side updated without the other.

pub mod events;

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info};

use crate::errors::FleetError;
use crate::models::{Device, DeviceConfig, DeviceStatus, DeviceType, DeviceUpdate, Group};
use crate::validation::{DefaultValidator, Validator};

pub use events::{FleetEvent, Notifier};

#[derive(Debug, Default)]
struct Tables {
    devices: HashMap<String, Device>,
    groups: HashMap<String, HashSet<String>>,
}

impl Tables {
    /// Add `device_id` to `group`, creating the group if needed. Both sides
    /// of the index are written together. Returns false if already a member.
    fn link(&mut self, device_id: &str, group: &str) -> bool {
        let Some(device) = self.devices.get_mut(device_id) else {
            return false;
        };
        let members = self.groups.entry(group.to_string()).or_default();
        let added = members.insert(device_id.to_string());
        if device.groups.insert(group.to_string()) || added {
            device.touch();
        }
        added
    }

    /// Remove `device_id` from `group`. Returns whether it was a member.
    fn unlink(&mut self, device_id: &str, group: &str) -> bool {
        let was_member = self
            .groups
            .get_mut(group)
            .is_some_and(|members| members.remove(device_id));
        if let Some(device) = self.devices.get_mut(device_id) {
            if device.groups.remove(group) || was_member {
                device.touch();
            }
        }
        was_member
    }

    fn members(&self, group: &str) -> Result<&HashSet<String>, FleetError> {
        self.groups
            .get(group)
            .ok_or_else(|| FleetError::GroupNotFound(group.to_string()))
    }
}

/// In-memory device registry
pub struct DeviceRegistry {
    tables: RwLock<Tables>,
    validator: Arc<dyn Validator>,
    notifier: Notifier,
}

impl DeviceRegistry {
    /// Create an empty registry using the default validation rules
    pub fn new(notifier: Notifier) -> Self {
        Self::with_validator(notifier, Arc::new(DefaultValidator))
    }

    /// Create an empty registry with custom validation rules
    pub fn with_validator(notifier: Notifier, validator: Arc<dyn Validator>) -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            validator,
            notifier,
        }
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn validator(&self) -> Arc<dyn Validator> {
        self.validator.clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(|e| e.into_inner())
    }

    fn check_group_name(&self, name: &str) -> Result<(), FleetError> {
        if self.validator.is_valid_group_name(name) {
            Ok(())
        } else {
            Err(FleetError::InvalidGroupName(name.to_string()))
        }
    }

    fn check_config(&self, config: &DeviceConfig) -> Result<(), FleetError> {
        if self.validator.is_valid_config(config) {
            Ok(())
        } else {
            Err(FleetError::InvalidConfig(format!("{config:?}")))
        }
    }

    // ================================ DEVICES ================================= //

    /// Register a new device and join it to `groups`
    ///
    /// Nothing is written unless every input is valid and the ID is free.
    pub fn register(
        &self,
        id: &str,
        name: &str,
        device_type: DeviceType,
        config: Option<DeviceConfig>,
        groups: &[String],
    ) -> Result<Device, FleetError> {
        if !self.validator.is_valid_device_id(id) {
            return Err(FleetError::InvalidId(id.to_string()));
        }
        let config = config.unwrap_or_default();
        self.check_config(&config)?;
        for group in groups {
            self.check_group_name(group)?;
        }

        let mut tables = self.write();
        if tables.devices.contains_key(id) {
            return Err(FleetError::AlreadyExists(id.to_string()));
        }

        let mut device = Device::new(id, name, device_type, config);
        for group in groups {
            tables
                .groups
                .entry(group.clone())
                .or_default()
                .insert(id.to_string());
            device.groups.insert(group.clone());
        }
        tables.devices.insert(id.to_string(), device.clone());

        info!("Registered device {} in {} group(s)", id, device.groups.len());
        self.notifier.emit(FleetEvent::DeviceRegistered(device.clone()));
        Ok(device)
    }

    /// Apply the supplied fields of `update` to a device
    pub fn update(&self, id: &str, update: DeviceUpdate) -> Result<Device, FleetError> {
        let mut tables = self.write();
        let device = tables
            .devices
            .get_mut(id)
            .ok_or_else(|| FleetError::NotFound(id.to_string()))?;

        let config = match &update.config {
            Some(patch) => {
                let merged = device.config.merged_with(patch);
                self.check_config(&merged)?;
                Some(merged)
            }
            None => None,
        };

        if let Some(name) = update.name {
            device.name = name;
        }
        if let Some(device_type) = update.device_type {
            device.device_type = device_type;
        }
        if let Some(config) = config {
            device.config = config;
        }
        device.touch();

        let device = device.clone();
        debug!("Updated device {}", id);
        self.notifier.emit(FleetEvent::DeviceUpdated(device.clone()));
        Ok(device)
    }

    /// Remove a device and purge it from every group. False if absent.
    pub fn remove(&self, id: &str) -> bool {
        let mut tables = self.write();
        let Some(device) = tables.devices.remove(id) else {
            return false;
        };
        for group in &device.groups {
            if let Some(members) = tables.groups.get_mut(group) {
                members.remove(id);
            }
        }

        info!("Removed device {}", id);
        self.notifier.emit(FleetEvent::DeviceRemoved(id.to_string()));
        true
    }

    /// Replace the status of a device wholesale
    pub fn apply_status(&self, id: &str, status: DeviceStatus) -> Result<Device, FleetError> {
        let mut tables = self.write();
        let device = tables
            .devices
            .get_mut(id)
            .ok_or_else(|| FleetError::NotFound(id.to_string()))?;
        device.status = Some(status);
        device.touch();
        Ok(device.clone())
    }

    /// IDs of devices that look stale at `now`, for a later per-device recheck
    pub fn offline_candidates(&self, now: i64, threshold_ms: i64) -> Vec<String> {
        self.read()
            .devices
            .values()
            .filter(|device| is_stale(device, now, threshold_ms))
            .map(|device| device.id.clone())
            .collect()
    }

    /// Demote a device to offline if, under the write lock, it is still
    /// online and its last report is older than `threshold_ms`. The previous
    /// `last_seen` is kept.
    pub fn mark_offline_if_stale(&self, id: &str, now: i64, threshold_ms: i64) -> Option<Device> {
        let mut tables = self.write();
        let device = tables.devices.get_mut(id)?;
        if !is_stale(device, now, threshold_ms) {
            return None;
        }
        device.status = device.status.as_ref().map(DeviceStatus::demoted);
        device.touch();
        Some(device.clone())
    }

    pub fn has(&self, id: &str) -> bool {
        self.read().devices.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Result<Device, FleetError> {
        self.read()
            .devices
            .get(id)
            .cloned()
            .ok_or_else(|| FleetError::NotFound(id.to_string()))
    }

    pub fn all_devices(&self) -> Vec<Device> {
        self.read().devices.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ================================= GROUPS ================================= //

    /// Create an empty group. False if it already exists.
    pub fn create_group(&self, name: &str) -> Result<bool, FleetError> {
        self.check_group_name(name)?;
        let mut tables = self.write();
        if tables.groups.contains_key(name) {
            return Ok(false);
        }
        tables.groups.insert(name.to_string(), HashSet::new());
        info!("Created group {}", name);
        Ok(true)
    }

    /// Add a device to a group, creating the group if needed. Idempotent.
    pub fn add_to_group(&self, device_id: &str, group: &str) -> Result<bool, FleetError> {
        self.check_group_name(group)?;
        let mut tables = self.write();
        if !tables.devices.contains_key(device_id) {
            return Err(FleetError::NotFound(device_id.to_string()));
        }
        if tables.link(device_id, group) {
            debug!("Added device {} to group {}", device_id, group);
        }
        Ok(true)
    }

    /// Remove a device from a group. Returns whether it was a member.
    pub fn remove_from_group(&self, device_id: &str, group: &str) -> Result<bool, FleetError> {
        let mut tables = self.write();
        tables.members(group)?;
        let was_member = tables.unlink(device_id, group);
        if was_member {
            debug!("Removed device {} from group {}", device_id, group);
        }
        Ok(was_member)
    }

    /// Delete a group, stripping it from every member first. False if absent.
    pub fn remove_group(&self, name: &str) -> bool {
        let mut tables = self.write();
        let Some(members) = tables.groups.remove(name) else {
            return false;
        };
        for device_id in &members {
            if let Some(device) = tables.devices.get_mut(device_id) {
                device.groups.remove(name);
                device.touch();
            }
        }
        info!("Removed group {} ({} member(s))", name, members.len());
        true
    }

    /// Snapshot of the members of a group, in no particular order
    pub fn devices_in_group(&self, name: &str) -> Result<Vec<Device>, FleetError> {
        let tables = self.read();
        let members = tables.members(name)?;
        Ok(members
            .iter()
            .filter_map(|id| tables.devices.get(id).cloned())
            .collect())
    }

    /// Member IDs of a group, in no particular order
    pub fn device_ids_in_group(&self, name: &str) -> Result<Vec<String>, FleetError> {
        Ok(self.read().members(name)?.iter().cloned().collect())
    }

    pub fn has_group(&self, name: &str) -> bool {
        self.read().groups.contains_key(name)
    }

    pub fn all_groups(&self) -> Vec<Group> {
        self.read()
            .groups
            .iter()
            .map(|(name, members)| Group {
                name: name.clone(),
                device_ids: members.clone(),
            })
            .collect()
    }
}

fn is_stale(device: &Device, now: i64, threshold_ms: i64) -> bool {
    device
        .status
        .as_ref()
        .is_some_and(|status| status.is_online() && now - status.last_seen > threshold_ms)
}
