//! Field-level (de)serialization rules for the multipathd report.
//!
//! multipathd prints `[undef]` (or nothing at all) for values it does not
//! know. Optional fields go through [`optional_string`] / [`optional_hex`],
//! which fold every "no data" encoding into `None` and never fail.

use core::fmt;

use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserializer, Serializer};

/// Placeholder multipathd prints for an unknown value.
pub const UNDEFINED: &str = "[undef]";

/// Fold the daemon's "no data" strings into `None`.
///
/// Both the empty string and `[undef]` mean absent.
pub fn normalize_sentinel(raw: &str) -> Option<&str> {
    match raw {
        "" | UNDEFINED => None,
        value => Some(value),
    }
}

/// Parse an unsigned integer with C-style base detection.
///
/// `0x`/`0X` selects hex, a leading `0` followed by more digits selects
/// octal, anything else is decimal. Sentinels, signs, invalid digits and
/// values over `u64::MAX` all give `None`.
///
/// ```
/// use multipathd_types::parse_optional_hex;
///
/// assert_eq!(parse_optional_hex("0x000e000000000000"), Some(0x000e_0000_0000_0000));
/// assert_eq!(parse_optional_hex("0755"), Some(493));
/// assert_eq!(parse_optional_hex("[undef]"), None);
/// ```
pub fn parse_optional_hex(raw: &str) -> Option<u64> {
    let raw = normalize_sentinel(raw)?;

    let (digits, radix) = if let Some(hex) = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
    {
        (hex, 16)
    } else if raw.len() > 1 && raw.starts_with('0') {
        (&raw[1..], 8)
    } else {
        (raw, 10)
    };

    // from_str_radix tolerates a leading '+', the daemon never prints one
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }

    u64::from_str_radix(digits, radix).ok()
}

struct OptionalStringVisitor;

impl<'de> Visitor<'de> for OptionalStringVisitor {
    type Value = Option<String>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an optional string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(normalize_sentinel(v).map(String::from))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        match normalize_sentinel(&v) {
            Some(_) => Ok(Some(v)),
            None => Ok(None),
        }
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }

    // Anything that is not a string carries no usable value.

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(None)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(None)
    }
}

/// Deserialize an optional string field.
///
/// Use together with `#[serde(default)]` so a missing key is also `None`.
pub fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(OptionalStringVisitor)
}

/// Deserialize an optional integer printed as a string (`lun_hex`).
///
/// A value that does not parse is treated as absent.
pub fn optional_hex<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = optional_string(deserializer)?;
    Ok(raw.as_deref().and_then(parse_optional_hex))
}

/// Serialize an optional LUN the way multipathd prints `lun_hex`.
pub fn serialize_hex<S>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(lun) => serializer.collect_str(&format_args!("0x{:016x}", lun)),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct Optional {
        #[serde(default, deserialize_with = "optional_string")]
        field: Option<String>,
    }

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct Lun {
        #[serde(
            default,
            deserialize_with = "optional_hex",
            serialize_with = "serialize_hex",
            skip_serializing_if = "Option::is_none"
        )]
        lun_hex: Option<u64>,
    }

    #[test]
    fn test_parse_optional_hex_sentinels() {
        assert_eq!(parse_optional_hex(""), None);
        assert_eq!(parse_optional_hex("[undef]"), None);
    }

    #[test]
    fn test_parse_optional_hex_prefixed() {
        assert_eq!(parse_optional_hex("0x1234"), Some(0x1234));
        assert_eq!(parse_optional_hex("0X1234"), Some(0x1234));
        assert_eq!(parse_optional_hex("0xdeadbeef"), Some(0xdeadbeef));
        assert_eq!(parse_optional_hex("0xDEADBEEF"), Some(0xdeadbeef));
        assert_eq!(parse_optional_hex("0x0"), Some(0));
        assert_eq!(
            parse_optional_hex("0x000e000000000000"),
            Some(0x000e_0000_0000_0000)
        );
        assert_eq!(parse_optional_hex("0xffffffffffffffff"), Some(u64::MAX));
    }

    #[test]
    fn test_parse_optional_hex_decimal_and_octal() {
        assert_eq!(parse_optional_hex("1234"), Some(1234));
        assert_eq!(parse_optional_hex("0"), Some(0));
        assert_eq!(parse_optional_hex("0755"), Some(493));
        assert_eq!(parse_optional_hex("00"), Some(0));
    }

    #[test]
    fn test_parse_optional_hex_invalid() {
        assert_eq!(parse_optional_hex("0xZZZ"), None);
        assert_eq!(parse_optional_hex("deadbeef"), None);
        assert_eq!(parse_optional_hex("0x10000000000000000"), None);
        assert_eq!(parse_optional_hex("-1"), None);
        assert_eq!(parse_optional_hex("+1"), None);
        assert_eq!(parse_optional_hex("0x"), None);
        assert_eq!(parse_optional_hex("089"), None);
        assert_eq!(parse_optional_hex("not a number"), None);
    }

    #[test]
    fn test_optional_string_sentinels() {
        for input in [json!({}), json!({"field": null}), json!({"field": "[undef]"}), json!({"field": ""})] {
            let result: Optional = serde_json::from_value(input).unwrap();
            assert_eq!(result.field, None);
        }
    }

    #[test]
    fn test_optional_string_keeps_value() {
        let result: Optional = serde_json::from_value(json!({"field": "0x20000090fa678144"})).unwrap();
        assert_eq!(result.field.as_deref(), Some("0x20000090fa678144"));
    }

    #[test]
    fn test_optional_string_wrong_type_is_absent() {
        for input in [json!({"field": 7}), json!({"field": true}), json!({"field": [1, 2]}), json!({"field": {"a": 1}})] {
            let result: Optional = serde_json::from_value(input).unwrap();
            assert_eq!(result.field, None);
        }
    }

    #[test]
    fn test_optional_string_from_text() {
        // from_str drives the borrowed visit_str path
        let result: Optional = serde_json::from_str(r#"{"field": "[undef]"}"#).unwrap();
        assert_eq!(result.field, None);
        let result: Optional = serde_json::from_str(r#"{"field": "192.168.131.31"}"#).unwrap();
        assert_eq!(result.field.as_deref(), Some("192.168.131.31"));
    }

    #[test]
    fn test_optional_hex_missing_and_undef_agree() {
        let missing: Lun = serde_json::from_str("{}").unwrap();
        let undef: Lun = serde_json::from_str(r#"{"lun_hex": "[undef]"}"#).unwrap();
        assert_eq!(missing, undef);
        assert_eq!(missing.lun_hex, None);
    }

    #[test]
    fn test_optional_hex_bad_value_is_absent() {
        let lun: Lun = serde_json::from_str(r#"{"lun_hex": "0xnope"}"#).unwrap();
        assert_eq!(lun.lun_hex, None);
    }

    #[test]
    fn test_serialize_hex_matches_daemon_format() {
        let lun = Lun {
            lun_hex: Some(0x000e_0000_0000_0000),
        };
        assert_eq!(
            serde_json::to_string(&lun).unwrap(),
            r#"{"lun_hex":"0x000e000000000000"}"#
        );
        assert_eq!(serde_json::to_string(&Lun { lun_hex: None }).unwrap(), "{}");
    }
}
