//! Multipath maps and their policies.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::deserializers::optional_string;
use crate::{MapAction, PathDeviceMapperState, PathGroup, WriteProtection};

/// Failback policy of a map (`failback`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Failback {
    Immediate,
    FollowOver,
    Manual,
    /// `deferred:<seconds>`
    Deferred(u32),
    Undefined,
    /// Anything else, kept as printed.
    Other(String),
}

impl From<&str> for Failback {
    fn from(value: &str) -> Self {
        match value {
            "immediate" => Failback::Immediate,
            "followover" => Failback::FollowOver,
            "manual" => Failback::Manual,
            "undef" => Failback::Undefined,
            other => match other
                .strip_prefix("deferred:")
                .and_then(parse_canonical)
            {
                Some(secs) => Failback::Deferred(secs),
                None => Failback::Other(other.to_string()),
            },
        }
    }
}

impl fmt::Display for Failback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failback::Immediate => f.write_str("immediate"),
            Failback::FollowOver => f.write_str("followover"),
            Failback::Manual => f.write_str("manual"),
            Failback::Deferred(secs) => write!(f, "deferred:{}", secs),
            Failback::Undefined => f.write_str("undef"),
            Failback::Other(value) => f.write_str(value),
        }
    }
}

/// Queueing policy of a map (`queueing`) when all paths are down.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Queueing {
    Off,
    On,
    /// `<n> sec`: queue for a number of seconds.
    Seconds(u32),
    /// `<n> chk`: queue for a number of checker intervals.
    Checks(u32),
    /// Printed as `-`.
    Undefined,
    /// Anything else, kept as printed.
    Other(String),
}

impl From<&str> for Queueing {
    fn from(value: &str) -> Self {
        match value {
            "off" => Queueing::Off,
            "on" => Queueing::On,
            "-" => Queueing::Undefined,
            other => {
                if let Some(secs) = other.strip_suffix(" sec").and_then(parse_canonical) {
                    Queueing::Seconds(secs)
                } else if let Some(checks) = other.strip_suffix(" chk").and_then(parse_canonical) {
                    Queueing::Checks(checks)
                } else {
                    Queueing::Other(other.to_string())
                }
            }
        }
    }
}

impl fmt::Display for Queueing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Queueing::Off => f.write_str("off"),
            Queueing::On => f.write_str("on"),
            Queueing::Seconds(secs) => write!(f, "{} sec", secs),
            Queueing::Checks(checks) => write!(f, "{} chk", checks),
            Queueing::Undefined => f.write_str("-"),
            Queueing::Other(value) => f.write_str(value),
        }
    }
}

/// Parse a count printed by the daemon: plain decimal digits, no sign and
/// no leading zero. Anything else stays an `Other` so it prints back as is.
fn parse_canonical(digits: &str) -> Option<u32> {
    let canonical = !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && (digits == "0" || !digits.starts_with('0'));
    if canonical {
        digits.parse().ok()
    } else {
        None
    }
}

macro_rules! string_serde {
    ($name:ident) => {
        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Ok($name::from(raw.as_str()))
            }
        }
    };
}

string_serde!(Failback);
string_serde!(Queueing);

/// A multipath device.
///
/// `uuid` is unique within one [`Status`](crate::Status) and is what metrics
/// are labeled with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Map {
    pub name: String,
    pub uuid: String,

    /// Kernel name of the dm device (e.g. `dm-3`).
    #[serde(
        default,
        deserialize_with = "optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub sysfs: Option<String>,

    pub failback: Failback,
    pub queueing: Queueing,

    /// Number of paths, as counted by the daemon.
    pub paths: u64,

    #[serde(rename = "write_prot")]
    pub write_protection: WriteProtection,

    #[serde(rename = "dm_st")]
    pub device_mapper_state: PathDeviceMapperState,

    pub features: String,

    #[serde(rename = "hwhandler")]
    pub hardware_handler: String,

    pub action: MapAction,
    pub path_faults: u64,

    #[serde(rename = "vend")]
    pub vendor: String,

    #[serde(rename = "prod")]
    pub product: String,

    #[serde(rename = "rev")]
    pub revision: String,

    #[serde(rename = "switch_grp")]
    pub switch_group: u64,

    #[serde(rename = "map_loads")]
    pub loads: u64,

    #[serde(rename = "total_q_time")]
    pub total_queue_time: u64,

    #[serde(rename = "q_timeouts")]
    pub queue_timeouts: u64,

    pub path_groups: Vec<PathGroup>,
}

impl Map {
    /// Find a path group by its group number.
    pub fn path_group(&self, group: u64) -> Option<&PathGroup> {
        self.path_groups.iter().find(|pg| pg.group == group)
    }

    /// Number of paths the kernel considers active.
    pub fn active_paths(&self) -> usize {
        self.path_groups
            .iter()
            .flat_map(|pg| pg.paths.iter())
            .filter(|p| p.device_mapper_state == PathDeviceMapperState::Active)
            .count()
    }
}
