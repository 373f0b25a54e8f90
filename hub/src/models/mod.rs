//! Data models shared across the hub

pub mod command;
pub mod device;
pub mod group;
pub mod stats;
pub mod status;

pub use command::{Command, CommandOutcome, CommandType};
pub use device::{Device, DeviceConfig, DeviceType, DeviceUpdate};
pub use group::Group;
pub use stats::{GroupStatistics, PowerModeDistribution};
pub use status::{ConnectionStatus, DeviceStatus, PowerMode, StatusReport};
