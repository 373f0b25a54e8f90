//! Fleet Hub Library
//!
//! Core modules for the IoT fleet hub: device registry, status lifecycle,
//! command fan-out and group statistics.

pub mod app;
pub mod dispatch;
pub mod errors;
pub mod lifecycle;
pub mod logs;
pub mod models;
pub mod mqtt;
pub mod registry;
pub mod server;
pub mod stats;
pub mod storage;
pub mod utils;
pub mod validation;
pub mod workers;
