//! Group models

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A named set of device IDs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub name: String,

    /// Member IDs; no ordering is implied
    pub device_ids: HashSet<String>,
}
