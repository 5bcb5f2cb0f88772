//! Paths: one physical route to the storage device.

use serde::{Deserialize, Serialize};

use crate::deserializers::{optional_hex, optional_string, serialize_hex};
use crate::{CheckerState, DeviceState, MarginalState, PathChecker, PathDeviceMapperState};

/// One path of a [`PathGroup`](crate::PathGroup).
///
/// The fabric identifiers and the LUN are optional: multipathd prints
/// `[undef]` or leaves them out depending on the transport, and both end up
/// as `None` here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    /// Kernel device name, e.g. `sdag`.
    #[serde(rename = "dev")]
    pub device_name: String,

    /// `major:minor`
    #[serde(rename = "dev_t")]
    pub device_major_minor: String,

    #[serde(rename = "dm_st")]
    pub device_mapper_state: PathDeviceMapperState,

    #[serde(rename = "dev_st")]
    pub device_state: DeviceState,

    pub checker: PathChecker,

    #[serde(rename = "chk_st")]
    pub checker_state: CheckerState,

    #[serde(rename = "pri")]
    pub priority: i64,

    #[serde(
        rename = "host_wwnn",
        default,
        deserialize_with = "optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub host_world_wide_node_name: Option<String>,

    #[serde(
        rename = "target_wwnn",
        default,
        deserialize_with = "optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub target_world_wide_node_name: Option<String>,

    #[serde(
        rename = "host_wwpn",
        default,
        deserialize_with = "optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub host_world_wide_port_name: Option<String>,

    #[serde(
        rename = "target_wwpn",
        default,
        deserialize_with = "optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub target_world_wide_port_name: Option<String>,

    #[serde(
        default,
        deserialize_with = "optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub host_adapter: Option<String>,

    #[serde(
        rename = "lun_hex",
        default,
        deserialize_with = "optional_hex",
        serialize_with = "serialize_hex",
        skip_serializing_if = "Option::is_none"
    )]
    pub logical_unit_number: Option<u64>,

    #[serde(rename = "marginal_st")]
    pub marginal_path_state: MarginalState,
}

impl Path {
    /// Whether the path can carry I/O right now.
    pub fn is_usable(&self) -> bool {
        self.device_mapper_state == PathDeviceMapperState::Active
            && matches!(self.checker_state, CheckerState::Ready | CheckerState::Ghost)
    }
}
