//! The iCE40 and iCE5 device table.

use crate::catalog::{PinTypeCodes, PrimitiveCatalog, ICE40_CATALOG, ICE40_PIN_TYPES};
use crate::error::ArchError;
use crate::{DifferentialLeg, FamilyProfile, Oscillator};
use icepick_common::Frequency;
use serde::{Deserialize, Serialize};

/// Device series. Differential pin naming and oscillator availability
/// follow the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Series {
    /// iCE40 LP, low power.
    Lp,
    /// iCE40 HX, high performance.
    Hx,
    /// iCE40 UltraPlus.
    Up,
    /// iCE5 (iCE40 Ultra).
    Ice5,
}

impl Series {
    fn family_name(self) -> &'static str {
        match self {
            Series::Lp | Series::Hx | Series::Up => "iCE40",
            Series::Ice5 => "iCE5",
        }
    }

    fn has_oscillators(self) -> bool {
        matches!(self, Series::Up | Series::Ice5)
    }
}

const DEVICES: &[(&str, Series)] = &[
    ("iCE40LP384", Series::Lp),
    ("iCE40LP1K", Series::Lp),
    ("iCE40LP4K", Series::Lp),
    ("iCE40LP8K", Series::Lp),
    ("iCE40HX1K", Series::Hx),
    ("iCE40HX4K", Series::Hx),
    ("iCE40HX8K", Series::Hx),
    ("iCE40UP5K", Series::Up),
    ("iCE40UP3K", Series::Up),
    ("iCE5LP4K", Series::Ice5),
    ("iCE5LP2K", Series::Ice5),
    ("iCE5LP1K", Series::Ice5),
];

const HFOSC_BASE_MHZ: f64 = 48.0;
const HFOSC_MAX_DIV_EXPONENT: u32 = 3;
const LFOSC_KHZ: f64 = 10.0;

/// Profile for one iCE40/iCE5 device and package.
#[derive(Debug, Clone)]
pub struct Ice40 {
    device: &'static str,
    series: Series,
    package: String,
}

impl Ice40 {
    /// Looks up a device, ignoring case.
    pub fn new(device: &str, package: &str) -> Result<Self, ArchError> {
        let (name, series) = DEVICES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(device.trim()))
            .ok_or_else(|| ArchError::UnknownDevice(device.to_string()))?;
        Ok(Self {
            device: *name,
            series: *series,
            package: package.to_string(),
        })
    }

    /// The device series.
    pub fn series(&self) -> Series {
        self.series
    }

    /// All device names in the table.
    pub fn device_names() -> impl Iterator<Item = &'static str> {
        DEVICES.iter().map(|(name, _)| *name)
    }
}

impl FamilyProfile for Ice40 {
    fn family_name(&self) -> &str {
        self.series.family_name()
    }

    fn device_name(&self) -> &str {
        self.device
    }

    fn package(&self) -> &str {
        &self.package
    }

    fn catalog(&self) -> &PrimitiveCatalog {
        &ICE40_CATALOG
    }

    fn pin_types(&self) -> &PinTypeCodes {
        &ICE40_PIN_TYPES
    }

    // The n pin of a pair is the package's complement pin, so the p pin
    // always carries the true signal.
    fn differential_input_leg(&self) -> DifferentialLeg {
        DifferentialLeg::Positive
    }

    fn non_inverting_pin_naming(&self) -> &str {
        match self.series {
            Series::Lp | Series::Hx => "DPxxB",
            Series::Up | Series::Ice5 => "IOB_xxA",
        }
    }

    fn high_frequency_oscillator(&self) -> Option<Oscillator> {
        self.series.has_oscillators().then(|| Oscillator {
            base: Frequency::from_mhz(HFOSC_BASE_MHZ),
            max_div_exponent: HFOSC_MAX_DIV_EXPONENT,
        })
    }

    fn low_frequency_oscillator(&self) -> Option<Frequency> {
        self.series
            .has_oscillators()
            .then(|| Frequency::from_khz(LFOSC_KHZ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_device_resolves() {
        for name in Ice40::device_names() {
            let dev = Ice40::new(name, "X").unwrap();
            assert_eq!(dev.device_name(), name);
        }
        assert_eq!(Ice40::device_names().count(), 12);
    }

    #[test]
    fn family_by_prefix() {
        assert_eq!(Ice40::new("iCE40LP1K", "CM36").unwrap().family_name(), "iCE40");
        assert_eq!(Ice40::new("iCE5LP4K", "SWG36").unwrap().family_name(), "iCE5");
    }

    #[test]
    fn oscillators_only_on_up_and_ice5() {
        let up = Ice40::new("iCE40UP5K", "SG48").unwrap();
        let osc = up.high_frequency_oscillator().unwrap();
        assert_eq!(osc.base.hz(), 48_000_000.0);
        assert_eq!(osc.max_div_exponent, 3);
        assert_eq!(up.low_frequency_oscillator().map(|f| f.hz()), Some(10_000.0));

        let ice5 = Ice40::new("iCE5LP2K", "SWG36").unwrap();
        assert!(ice5.high_frequency_oscillator().is_some());

        let hx = Ice40::new("iCE40HX1K", "VQ100").unwrap();
        assert!(hx.high_frequency_oscillator().is_none());
        assert!(hx.low_frequency_oscillator().is_none());
    }

    #[test]
    fn differential_naming_by_series() {
        assert_eq!(
            Ice40::new("iCE40HX8K", "CT256").unwrap().non_inverting_pin_naming(),
            "DPxxB"
        );
        assert_eq!(
            Ice40::new("iCE40UP5K", "SG48").unwrap().non_inverting_pin_naming(),
            "IOB_xxA"
        );
        assert_eq!(
            Ice40::new("iCE40LP8K", "CM81").unwrap().differential_input_leg(),
            DifferentialLeg::Positive
        );
    }

    #[test]
    fn series_serde_roundtrip() {
        let json = serde_json::to_string(&Series::Up).unwrap();
        let back: Series = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Series::Up);
    }
}
