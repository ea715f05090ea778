//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::{PlatformConfig, ResourceDef};
use icepick_common::Frequency;
use std::path::Path;

/// Name of the platform description file inside a project directory.
pub const CONFIG_FILE_NAME: &str = "icepick.toml";

/// Loads and validates `<project_dir>/icepick.toml`.
pub fn load_config(project_dir: &Path) -> Result<PlatformConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE_NAME);
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates a platform description from a string.
pub fn load_config_from_str(content: &str) -> Result<PlatformConfig, ConfigError> {
    let config: PlatformConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &PlatformConfig) -> Result<(), ConfigError> {
    if config.platform.device.trim().is_empty() {
        return Err(ConfigError::MissingField("platform.device".to_string()));
    }
    if config.platform.package.trim().is_empty() {
        return Err(ConfigError::MissingField("platform.package".to_string()));
    }

    for (name, def) in &config.resources {
        validate_resource(name, def)?;
    }

    if let Some(rst) = &config.platform.default_rst {
        if !config.resources.contains_key(rst) {
            return Err(ConfigError::UnknownResource(rst.clone()));
        }
    }

    if let Some(clk) = &config.platform.default_clk {
        if !config.platform.uses_oscillator() {
            let def = config
                .resources
                .get(clk)
                .ok_or_else(|| ConfigError::UnknownResource(clk.clone()))?;
            if def.frequency.is_none() {
                return Err(ConfigError::ValidationError(format!(
                    "default clock resource '{clk}' does not declare a frequency"
                )));
            }
        }
    }

    Ok(())
}

fn validate_resource(name: &str, def: &ResourceDef) -> Result<(), ConfigError> {
    match (&def.diff, def.pins.is_empty()) {
        (Some(_), false) => {
            return Err(ConfigError::ValidationError(format!(
                "resource '{name}' declares both pins and diff"
            )));
        }
        (None, true) => {
            return Err(ConfigError::ValidationError(format!(
                "resource '{name}' has no pins"
            )));
        }
        (Some(diff), true) => {
            if diff.p.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "resource '{name}' has no pins"
                )));
            }
            if diff.p.len() != diff.n.len() {
                return Err(ConfigError::ValidationError(format!(
                    "resource '{name}' has {} positive and {} negative pins",
                    diff.p.len(),
                    diff.n.len()
                )));
            }
        }
        (None, false) => {}
    }

    if let Some(freq) = &def.frequency {
        freq.parse::<Frequency>().map_err(|e| {
            ConfigError::ValidationError(format!("resource '{name}': {e}"))
        })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
[platform]
device = "iCE40UP5K"
package = "SG48"
default_clk = "SB_HFOSC"
hfosc_div = 1
default_rst = "button"

[resources.clk12]
pins = "35"
frequency = "12MHz"
attrs = { GLOBAL = true, IO_STANDARD = "SB_LVCMOS" }

[resources.button]
pins = "10"
invert = true

[resources.leds]
pins = ["39", "40", "41"]
invert = true

[resources.lvds]
diff = { p = ["A1"], n = ["A2"] }
"#;

    fn with_platform(extra: &str) -> String {
        format!("[platform]\ndevice = \"iCE40HX1K\"\npackage = \"TQ144\"\n{extra}")
    }

    #[test]
    fn parse_full_config() {
        let config = load_config_from_str(FULL).unwrap();
        assert_eq!(config.platform.device, "iCE40UP5K");
        assert_eq!(config.platform.hfosc_div, Some(toml::Value::Integer(1)));
        assert_eq!(config.platform.default_rst.as_deref(), Some("button"));
        assert_eq!(config.resources.len(), 4);
        assert_eq!(config.resources["leds"].pins.len(), 3);
        assert!(config.resources["lvds"].diff.is_some());
    }

    #[test]
    fn defaults() {
        let config = load_config_from_str(&with_platform("")).unwrap();
        assert!(config.platform.default_clk.is_none());
        assert!(config.platform.hfosc_div.is_none());
        assert!(config.resources.is_empty());
    }

    #[test]
    fn empty_device_errors() {
        let err = load_config_from_str("[platform]\ndevice = \"\"\npackage = \"SG48\"")
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(f) if f == "platform.device"));
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("[platform\ndevice =").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn resource_needs_exactly_one_pin_kind() {
        let both = with_platform("[resources.x]\npins = \"1\"\ndiff = { p = \"2\", n = \"3\" }");
        assert!(matches!(
            load_config_from_str(&both).unwrap_err(),
            ConfigError::ValidationError(_)
        ));
        let none = with_platform("[resources.x]\ninvert = true");
        assert!(matches!(
            load_config_from_str(&none).unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn differential_widths_must_match() {
        let src = with_platform("[resources.x]\ndiff = { p = [\"1\", \"2\"], n = [\"3\"] }");
        let err = load_config_from_str(&src).unwrap_err();
        assert!(err.to_string().contains("2 positive and 1 negative"));
    }

    #[test]
    fn bad_frequency_errors() {
        let src = with_platform("[resources.x]\npins = \"1\"\nfrequency = \"quick\"");
        assert!(matches!(
            load_config_from_str(&src).unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn default_selectors_must_name_resources() {
        let rst = with_platform("default_rst = \"missing\"");
        assert!(matches!(
            load_config_from_str(&rst).unwrap_err(),
            ConfigError::UnknownResource(r) if r == "missing"
        ));
        let clk = with_platform("default_clk = \"missing\"");
        assert!(matches!(
            load_config_from_str(&clk).unwrap_err(),
            ConfigError::UnknownResource(_)
        ));
    }

    #[test]
    fn clock_resource_needs_frequency() {
        let src = with_platform("default_clk = \"clk\"\n[resources.clk]\npins = \"21\"");
        assert!(matches!(
            load_config_from_str(&src).unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), FULL).unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.platform.package, "SG48");
    }

    #[test]
    fn io_error_from_nonexistent_dir() {
        let err = load_config(Path::new("/nonexistent/dir")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
