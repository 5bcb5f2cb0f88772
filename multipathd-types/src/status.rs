//! Status - the root of a `multipathd show maps json` report.

use serde::{Deserialize, Serialize};

use crate::Map;

/// A point-in-time report of every multipath map the daemon manages.
///
/// A `Status` is built fresh from one report and never updated; two reports
/// of the same map are unrelated values.
///
/// # Example
///
/// ```rust
/// use multipathd_types::Status;
///
/// let status: Status = serde_json::from_str(
///     r#"{ "major_version": 0, "minor_version": 1, "maps": [] }"#,
/// ).unwrap();
///
/// assert!(status.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    /// Major version of the JSON report format.
    pub major_version: u64,

    /// Minor version of the JSON report format.
    pub minor_version: u64,

    /// Maps in the order the daemon listed them.
    pub maps: Vec<Map>,
}

impl Status {
    /// Check if the report has no maps.
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Number of maps in the report.
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    /// Look up a map by UUID.
    pub fn get(&self, uuid: &str) -> Option<&Map> {
        self.maps.iter().find(|m| m.uuid == uuid)
    }

    /// Iterate over all maps.
    pub fn iter(&self) -> impl Iterator<Item = &Map> {
        self.maps.iter()
    }

    /// Total number of paths across all maps and groups.
    pub fn path_count(&self) -> usize {
        self.maps
            .iter()
            .flat_map(|m| m.path_groups.iter())
            .map(|pg| pg.paths.len())
            .sum()
    }
}
