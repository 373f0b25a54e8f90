//! Input validation rules
//!
//! Validation is a pure predicate: the registry and the dispatcher ask a
//! [`Validator`] and turn a rejection into the matching error themselves.

use std::ops::RangeInclusive;

use crate::models::{Command, CommandType, DeviceConfig};

pub const DEVICE_ID_LEN: RangeInclusive<usize> = 3..=50;
pub const GROUP_NAME_LEN: RangeInclusive<usize> = 2..=50;
pub const REPORTING_INTERVAL_SECS: RangeInclusive<i64> = 1..=86_400;
pub const SLEEP_THRESHOLD_PERCENT: RangeInclusive<i64> = 0..=100;
pub const SECURITY_LEVEL: RangeInclusive<i64> = 1..=5;

/// Validation rules, a trait so tests and embedders can swap them
pub trait Validator: Send + Sync {
    fn is_valid_device_id(&self, id: &str) -> bool;

    fn is_valid_group_name(&self, name: &str) -> bool;

    fn is_valid_config(&self, config: &DeviceConfig) -> bool;

    fn is_valid_command(&self, command: &Command) -> bool;
}

/// Default validation rules
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValidator;

impl Validator for DefaultValidator {
    fn is_valid_device_id(&self, id: &str) -> bool {
        DEVICE_ID_LEN.contains(&id.chars().count())
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }

    fn is_valid_group_name(&self, name: &str) -> bool {
        GROUP_NAME_LEN.contains(&name.chars().count())
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '-')
    }

    fn is_valid_config(&self, config: &DeviceConfig) -> bool {
        in_range(config.reporting_interval, &REPORTING_INTERVAL_SECS)
            && in_range(config.sleep_threshold, &SLEEP_THRESHOLD_PERCENT)
            && in_range(config.security_level, &SECURITY_LEVEL)
    }

    fn is_valid_command(&self, command: &Command) -> bool {
        if command.request_id.trim().is_empty() || command.timestamp <= 0 {
            return false;
        }

        match command.command_type {
            CommandType::SetReportingInterval => command
                .payload
                .as_ref()
                .and_then(reporting_interval_of)
                .is_some_and(|secs| REPORTING_INTERVAL_SECS.contains(&secs)),
            _ => true,
        }
    }
}

fn in_range(value: Option<i64>, range: &RangeInclusive<i64>) -> bool {
    value.is_none_or(|v| range.contains(&v))
}

/// Interval carried by a `set_reporting_interval` payload, either a bare
/// number or `{"interval": n}`
fn reporting_interval_of(payload: &serde_json::Value) -> Option<i64> {
    payload
        .as_i64()
        .or_else(|| payload.get("interval").and_then(serde_json::Value::as_i64))
}
