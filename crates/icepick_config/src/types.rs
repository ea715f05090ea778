//! Configuration types deserialized from `icepick.toml`.

use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Default clock selector naming the internal 48 MHz oscillator.
pub const HFOSC_CLOCK: &str = "SB_HFOSC";

/// Default clock selector naming the internal 10 kHz oscillator.
pub const LFOSC_CLOCK: &str = "SB_LFOSC";

/// The top-level platform description.
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformConfig {
    /// Device, package, and default clock/reset selection.
    pub platform: PlatformMeta,
    /// Named pin resources.
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceDef>,
}

/// The `[platform]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformMeta {
    /// Device name, e.g. `iCE40UP5K`.
    pub device: String,
    /// Package name, e.g. `SG48`.
    pub package: String,
    /// `SB_HFOSC`, `SB_LFOSC`, or the name of a clock resource.
    #[serde(default)]
    pub default_clk: Option<String>,
    /// Divider exponent for `SB_HFOSC`.
    ///
    /// Kept as a raw value so that a float or string is reported by the
    /// reset synthesizer with the offending value rather than as a parse
    /// error.
    #[serde(default)]
    pub hfosc_div: Option<toml::Value>,
    /// Name of the resource driving the default reset, if any.
    #[serde(default)]
    pub default_rst: Option<String>,
}

impl PlatformMeta {
    /// Returns `true` if the default clock is one of the internal oscillators.
    pub fn uses_oscillator(&self) -> bool {
        matches!(
            self.default_clk.as_deref(),
            Some(HFOSC_CLOCK) | Some(LFOSC_CLOCK)
        )
    }
}

/// One `[resources.<name>]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDef {
    /// Single-ended pins, one per bit.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub pins: Vec<String>,
    /// Differential pin pairs.
    #[serde(default)]
    pub diff: Option<DiffPins>,
    /// Whether every bit of the resource is active-low.
    #[serde(default)]
    pub invert: bool,
    /// Nominal frequency for clock resources, e.g. `"12MHz"`.
    #[serde(default)]
    pub frequency: Option<String>,
    /// Pin attributes, applied to every pin of the resource.
    #[serde(default)]
    pub attrs: BTreeMap<String, toml::Value>,
}

/// Positive and negative pins of a differential resource.
#[derive(Debug, Clone, Deserialize)]
pub struct DiffPins {
    /// Positive legs, one per bit.
    #[serde(deserialize_with = "deserialize_string_or_vec")]
    pub p: Vec<String>,
    /// Negative legs, one per bit.
    #[serde(deserialize_with = "deserialize_string_or_vec")]
    pub n: Vec<String>,
}

/// Deserializes a field that can be either a single string or a list of strings,
/// so both `pins = "35"` and `pins = ["39", "40"]` are accepted.
fn deserialize_string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut vec = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                vec.push(val);
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pins_accept_string_or_list() {
        let one: ResourceDef = toml::from_str(r#"pins = "35""#).unwrap();
        assert_eq!(one.pins, vec!["35"]);
        let many: ResourceDef = toml::from_str(r#"pins = ["39", "40"]"#).unwrap();
        assert_eq!(many.pins, vec!["39", "40"]);
    }

    #[test]
    fn attrs_keep_raw_values() {
        let def: ResourceDef =
            toml::from_str(r#"pins = "35"
attrs = { GLOBAL = true, IO_STANDARD = "SB_LVCMOS" }"#)
                .unwrap();
        assert_eq!(def.attrs["GLOBAL"], toml::Value::Boolean(true));
        assert_eq!(
            def.attrs["IO_STANDARD"],
            toml::Value::String("SB_LVCMOS".into())
        );
    }

    #[test]
    fn oscillator_selectors() {
        let meta: PlatformMeta =
            toml::from_str("device = \"iCE40UP5K\"\npackage = \"SG48\"\ndefault_clk = \"SB_LFOSC\"")
                .unwrap();
        assert!(meta.uses_oscillator());
        let meta: PlatformMeta =
            toml::from_str("device = \"iCE40HX1K\"\npackage = \"TQ144\"\ndefault_clk = \"clk12\"")
                .unwrap();
        assert!(!meta.uses_oscillator());
    }
}
