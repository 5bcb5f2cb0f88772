//! Path groups: priority-ordered sets of paths inside a map.

use serde::{Deserialize, Serialize};

use crate::{MarginalState, Path, PathGroupDeviceMapperState};

/// A priority group within a [`Map`](crate::Map).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathGroup {
    /// Path selector, e.g. `service-time 0`.
    pub selector: String,

    #[serde(rename = "pri")]
    pub priority: i64,

    #[serde(rename = "dm_st")]
    pub device_mapper_state: PathGroupDeviceMapperState,

    #[serde(rename = "marginal_st")]
    pub marginal_path_state: MarginalState,

    /// Group number, unique within its map.
    pub group: u64,

    pub paths: Vec<Path>,
}

impl PathGroup {
    /// Whether this is the group currently used for I/O.
    pub fn is_active(&self) -> bool {
        self.device_mapper_state == PathGroupDeviceMapperState::Active
    }
}
