//! # multipathd-types
//!
//! Typed model of the JSON report printed by `multipathd show maps json`.
//!
//! The report is a tree: a [`Status`] owns [`Map`]s, each map owns
//! [`PathGroup`]s, each group owns [`Path`]s. Deserialization is strict for
//! required fields and lenient for optional ones:
//!
//! - A required field that is missing or has the wrong JSON type fails the
//!   whole report.
//! - Optional fields (`sysfs`, the host/target WWNN/WWPN, `host_adapter`,
//!   `lun_hex`) treat a missing key, `null`, `""` and `[undef]` alike, and a
//!   value that cannot be understood is simply absent.
//! - State strings are open sets: unknown values are kept in an `Other`
//!   variant instead of being rejected.
//!
//! ## Example
//!
//! ```rust
//! use multipathd_types::{DeviceState, Path};
//!
//! let path: Path = serde_json::from_str(r#"{
//!     "dev": "sdag", "dev_t": "66:0", "dm_st": "active", "dev_st": "running",
//!     "chk_st": "ready", "checker": "tur", "pri": 50,
//!     "host_wwnn": "[undef]", "target_wwnn": "iqn.2010-06.com.purestorage:flasharray.1",
//!     "lun_hex": "0x000e000000000000", "marginal_st": "normal"
//! }"#).unwrap();
//!
//! assert_eq!(path.device_state, DeviceState::Running);
//! assert_eq!(path.host_world_wide_node_name, None);
//! assert_eq!(path.logical_unit_number, Some(0x000e_0000_0000_0000));
//! ```

// Nested `json!` fixtures in the tests need more than the default depth
#![recursion_limit = "256"]

pub mod deserializers;
mod map;
mod path;
mod path_group;
mod state;
mod status;

pub use deserializers::{normalize_sentinel, parse_optional_hex};
pub use map::*;
pub use path::*;
pub use path_group::*;
pub use state::*;
pub use status::*;
