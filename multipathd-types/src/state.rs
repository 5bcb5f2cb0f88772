//! State enumerations reported by multipathd.
//!
//! Every state is an open set: the values the daemon is known to print get a
//! variant, anything else is kept verbatim in `Other` so a newer daemon never
//! breaks decoding. Only the known values take part in metric projection.
//!
//! The value lists come from multipath-tools' `libmultipath/print.c` and
//! `libmultipath/checkers.h`.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A state type with a closed list of known values.
///
/// This is what the metric projector iterates over: one data point per
/// entry in [`KnownStates::ALL`].
pub trait KnownStates: PartialEq + Sized + 'static {
    /// Every known value, in projection order.
    const ALL: &'static [Self];

    /// The string multipathd prints for this value.
    fn as_str(&self) -> &str;
}

macro_rules! state_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $value:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
            /// A value this library does not know about, kept as printed.
            Other(String),
        }

        impl $name {
            /// Every known value, in projection order.
            pub const ALL: &'static [$name] = &[$( $name::$variant ),+];

            /// The string multipathd prints for this value.
            pub fn as_str(&self) -> &str {
                match self {
                    $( $name::$variant => $value, )+
                    $name::Other(value) => value.as_str(),
                }
            }

            /// Returns false for values outside the known set.
            pub fn is_known(&self) -> bool {
                !matches!(self, $name::Other(_))
            }
        }

        impl KnownStates for $name {
            const ALL: &'static [$name] = $name::ALL;

            fn as_str(&self) -> &str {
                $name::as_str(self)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                match value {
                    $( $value => $name::$variant, )+
                    other => $name::Other(other.to_string()),
                }
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                match $name::from(value.as_str()) {
                    $name::Other(_) => $name::Other(value),
                    known => known,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                String::deserialize(deserializer).map($name::from)
            }
        }
    };
}

state_enum! {
    /// Device-mapper state of a path group (`dm_st` on a path group).
    pub enum PathGroupDeviceMapperState {
        Enabled => "enabled",
        Disabled => "disabled",
        Active => "active",
        Undefined => "undef",
    }
}

state_enum! {
    /// Device-mapper state of a path or a whole map (`dm_st`).
    pub enum PathDeviceMapperState {
        Active => "active",
        Failed => "failed",
        Undefined => "undef",
    }
}

state_enum! {
    /// Kernel device state of a path (`dev_st`).
    pub enum DeviceState {
        Running => "running",
        Offline => "offline",
        Unknown => "unknown",
    }
}

state_enum! {
    /// Last verdict of the path checker (`chk_st`).
    pub enum CheckerState {
        Ready => "ready",
        Faulty => "faulty",
        Shaky => "shaky",
        Ghost => "ghost",
        Delayed => "delayed",
        IoPending => "i/o pending",
        IoTimeout => "i/o timeout",
        Undefined => "undef",
    }
}

state_enum! {
    /// Marginal path state (`marginal_st`) of a path or path group.
    pub enum MarginalState {
        Marginal => "marginal",
        Normal => "normal",
    }
}

state_enum! {
    /// Path checker plugin (`checker`).
    pub enum PathChecker {
        DirectIo => "directio",
        TestUnitReady => "tur",
        HpServiceGuard => "hp_sw",
        Rdac => "rdac",
        EmcClariion => "emc_clariion",
        ReadSector0 => "readsector0",
        CcissTestUnitReady => "cciss_tur",
        None => "none",
        Invalid => "invalid",
    }
}

state_enum! {
    /// Write protection of a map (`write_prot`).
    pub enum WriteProtection {
        ReadOnly => "ro",
        ReadWrite => "rw",
        Undefined => "undef",
    }
}

state_enum! {
    /// Pending action on a map (`action`). An empty string means none.
    pub enum MapAction {
        Reject => "reject",
        Rename => "rename",
        Reload => "reload",
        Create => "create",
        SwitchPathGroup => "switchpg",
        NoAction => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_values_parse() {
        assert_eq!(DeviceState::from("running"), DeviceState::Running);
        assert_eq!(CheckerState::from("i/o pending"), CheckerState::IoPending);
        assert_eq!(
            PathGroupDeviceMapperState::from("undef"),
            PathGroupDeviceMapperState::Undefined
        );
        assert_eq!(PathChecker::from("tur"), PathChecker::TestUnitReady);
        assert_eq!(PathChecker::from("invalid"), PathChecker::Invalid);
        assert!(PathChecker::Invalid.is_known());
        assert_eq!(MapAction::from(""), MapAction::NoAction);
    }

    #[test]
    fn test_unknown_value_is_retained() {
        let state = DeviceState::from("transport-offline");
        assert_eq!(state, DeviceState::Other("transport-offline".to_string()));
        assert_eq!(state.as_str(), "transport-offline");
        assert!(!state.is_known());
        assert!(!DeviceState::ALL.contains(&state));
    }

    #[test]
    fn test_from_string_reuses_allocation_for_unknown() {
        let state = CheckerState::from(String::from("marginal"));
        assert_eq!(state, CheckerState::Other("marginal".to_string()));
        assert_eq!(CheckerState::from(String::from("ghost")), CheckerState::Ghost);
    }

    #[test]
    fn test_all_lists_every_known_value_once() {
        assert_eq!(PathGroupDeviceMapperState::ALL.len(), 4);
        assert_eq!(PathDeviceMapperState::ALL.len(), 3);
        assert_eq!(DeviceState::ALL.len(), 3);
        assert_eq!(CheckerState::ALL.len(), 8);
        assert_eq!(MarginalState::ALL.len(), 2);
        assert_eq!(PathChecker::ALL.len(), 9);

        for (i, a) in CheckerState::ALL.iter().enumerate() {
            assert!(a.is_known());
            for b in &CheckerState::ALL[i + 1..] {
                assert_ne!(a.as_str(), b.as_str());
            }
        }
    }

    #[test]
    fn test_display_matches_wire_string() {
        assert_eq!(CheckerState::IoTimeout.to_string(), "i/o timeout");
        assert_eq!(WriteProtection::ReadWrite.to_string(), "rw");
    }

    #[test]
    fn test_serde_uses_wire_string() {
        let state: PathDeviceMapperState = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(state, PathDeviceMapperState::Failed);
        assert_eq!(serde_json::to_string(&state).unwrap(), "\"failed\"");

        let other: PathDeviceMapperState = serde_json::from_str("\"reinstated\"").unwrap();
        assert_eq!(serde_json::to_string(&other).unwrap(), "\"reinstated\"");
    }

    #[test]
    fn test_non_string_is_rejected() {
        assert!(serde_json::from_str::<DeviceState>("1").is_err());
        assert!(serde_json::from_str::<DeviceState>("null").is_err());
    }
}
