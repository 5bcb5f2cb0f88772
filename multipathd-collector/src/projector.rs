//! One-hot projection of a [`Status`] into gauge samples.
//!
//! Every enumerated state becomes one sample per known value: `1` for the
//! current value and `0` for the rest. A state outside the known set (a
//! newer daemon) produces all zeros rather than an error.
//!
//! Path samples are labeled by map UUID, group number, target WWNN and
//! device name. An absent target WWNN is labeled `""`, and the value may be
//! shared between sibling paths; the device name is what keeps path label
//! sets unique within a group.

use multipathd_types::{KnownStates, Status};

/// Label naming the one-hot state value.
pub const STATE_LABEL: &str = "state";

const PATH_GROUP_LABELS: &[&str] = &["map", "group", STATE_LABEL];
const PATH_LABELS: &[&str] = &["map", "group", "target_wwnn", "dev", STATE_LABEL];

/// A metric family produced by the projector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Family {
    PathGroupDeviceMapperState,
    PathDeviceMapperState,
    PathDeviceState,
    PathCheckerState,
}

impl Family {
    /// Every family, in exposition order.
    pub const ALL: &'static [Family] = &[
        Family::PathGroupDeviceMapperState,
        Family::PathDeviceMapperState,
        Family::PathDeviceState,
        Family::PathCheckerState,
    ];

    /// Entity the family describes.
    pub fn subsystem(self) -> &'static str {
        match self {
            Family::PathGroupDeviceMapperState => "path_group",
            _ => "path",
        }
    }

    /// Metric name within the subsystem.
    pub fn name(self) -> &'static str {
        match self {
            Family::PathGroupDeviceMapperState | Family::PathDeviceMapperState => {
                "device_mapper_state"
            }
            Family::PathDeviceState => "device_state",
            Family::PathCheckerState => "checker_state",
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            Family::PathGroupDeviceMapperState => {
                "Group device mapper state of the multipath path group"
            }
            Family::PathDeviceMapperState => "Device mapper state of the multipath path",
            Family::PathDeviceState => "Device state of the multipath path",
            Family::PathCheckerState => "Checker state of the multipath path",
        }
    }

    /// Label names, in the order samples carry them.
    pub fn label_names(self) -> &'static [&'static str] {
        match self {
            Family::PathGroupDeviceMapperState => PATH_GROUP_LABELS,
            _ => PATH_LABELS,
        }
    }

    /// Fully qualified name: `<namespace>_<subsystem>_<name>`.
    pub fn fq_name(self, namespace: &str) -> String {
        if namespace.is_empty() {
            format!("{}_{}", self.subsystem(), self.name())
        } else {
            format!("{}_{}_{}", namespace, self.subsystem(), self.name())
        }
    }
}

/// One gauge data point.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub family: Family,
    /// Label name/value pairs, ordered as [`Family::label_names`].
    pub labels: Vec<(&'static str, String)>,
    pub value: f64,
}

impl Sample {
    /// Value of a label, if present.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Project a status report into one-hot samples.
///
/// Maps, groups and paths are walked depth-first in report order. For each
/// group its own samples come before those of its paths; for each path the
/// order is device-mapper, device, checker state.
pub fn project(status: &Status) -> Vec<Sample> {
    let mut samples = Vec::new();

    for map in &status.maps {
        for path_group in &map.path_groups {
            let group = path_group.group.to_string();

            one_hot(
                &mut samples,
                Family::PathGroupDeviceMapperState,
                &[map.uuid.as_str(), group.as_str()],
                &path_group.device_mapper_state,
            );

            for path in &path_group.paths {
                let labels = [
                    map.uuid.as_str(),
                    group.as_str(),
                    path.target_world_wide_node_name.as_deref().unwrap_or(""),
                    path.device_name.as_str(),
                ];

                one_hot(
                    &mut samples,
                    Family::PathDeviceMapperState,
                    &labels,
                    &path.device_mapper_state,
                );
                one_hot(
                    &mut samples,
                    Family::PathDeviceState,
                    &labels,
                    &path.device_state,
                );
                one_hot(
                    &mut samples,
                    Family::PathCheckerState,
                    &labels,
                    &path.checker_state,
                );
            }
        }
    }

    samples
}

/// Emit one sample per known value of `S`, `1` for the one equal to `current`.
fn one_hot<S: KnownStates>(out: &mut Vec<Sample>, family: Family, values: &[&str], current: &S) {
    let names = family.label_names();
    debug_assert_eq!(names.len(), values.len() + 1);

    for state in S::ALL {
        let mut labels: Vec<(&'static str, String)> = names
            .iter()
            .zip(values)
            .map(|(name, value)| (*name, (*value).to_string()))
            .collect();
        labels.push((STATE_LABEL, state.as_str().to_string()));

        out.push(Sample {
            family,
            labels,
            value: if state == current { 1.0 } else { 0.0 },
        });
    }
}
