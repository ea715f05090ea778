//! Family profiles for SiliconBlue/Lattice iCE40 and iCE5 devices.
//!
//! The lowering engine never branches on a device or family name. Everything
//! family-specific it needs (primitive and port names, `PIN_TYPE` field
//! values, which leg of a differential pair is the non-inverting one, which
//! on-chip oscillators exist) comes from a [`FamilyProfile`].
//!
//! ```
//! use icepick_arch::load_profile;
//!
//! let profile = load_profile("iCE40UP5K", "SG48").unwrap();
//! assert_eq!(profile.family_name(), "iCE40");
//! assert!(profile.high_frequency_oscillator().is_some());
//! ```

#![warn(missing_docs)]

pub mod catalog;
pub mod error;
pub mod ice40;

pub use catalog::{
    DffPrimitive, IoPrimitive, LutPrimitive, OscillatorPrimitive, PinTypeCodes, PrimitiveCatalog,
    ICE40_CATALOG, ICE40_PIN_TYPES,
};
pub use error::ArchError;
pub use ice40::{Ice40, Series};

use icepick_common::Frequency;
use serde::{Deserialize, Serialize};

/// Which sub-binding of a differential pair carries the true signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DifferentialLeg {
    /// The `p` pins.
    Positive,
    /// The `n` pins.
    Negative,
}

/// A divided on-chip oscillator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Oscillator {
    /// Undivided output frequency.
    pub base: Frequency,
    /// Largest accepted divider exponent; the output is `base / 2^e`.
    pub max_div_exponent: u32,
}

impl Oscillator {
    /// Output frequency for a divider exponent, or `None` if out of range.
    pub fn frequency(&self, div_exponent: u32) -> Option<Frequency> {
        (div_exponent <= self.max_div_exponent).then(|| self.base.div_pow2(div_exponent))
    }
}

/// Static description of a device family, injected into the lowering engine.
pub trait FamilyProfile: std::fmt::Debug + Send + Sync {
    /// Family name, e.g. `"iCE40"`.
    fn family_name(&self) -> &str;

    /// Canonical device name, e.g. `"iCE40UP5K"`.
    fn device_name(&self) -> &str;

    /// Package name as configured.
    fn package(&self) -> &str;

    /// Primitive, port, and parameter names.
    fn catalog(&self) -> &PrimitiveCatalog;

    /// Values of the `PIN_TYPE` input and output fields.
    fn pin_types(&self) -> &PinTypeCodes;

    /// Which leg of a differential input is instantiated.
    fn differential_input_leg(&self) -> DifferentialLeg;

    /// How the package names the non-inverting pin of a pair, for messages.
    fn non_inverting_pin_naming(&self) -> &str;

    /// The high-frequency oscillator, if the device has one.
    fn high_frequency_oscillator(&self) -> Option<Oscillator>;

    /// The low-frequency oscillator's fixed output, if the device has one.
    fn low_frequency_oscillator(&self) -> Option<Frequency>;
}

/// Creates the profile for a device. Device lookup ignores case.
pub fn load_profile(device: &str, package: &str) -> Result<Box<dyn FamilyProfile>, ArchError> {
    Ok(Box::new(Ice40::new(device, package)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_known_device() {
        let p = load_profile("ice40hx8k", "CT256").unwrap();
        assert_eq!(p.device_name(), "iCE40HX8K");
        assert_eq!(p.package(), "CT256");
        assert!(p.high_frequency_oscillator().is_none());
    }

    #[test]
    fn load_unknown_device() {
        let err = load_profile("XC7A35T", "CPG236").unwrap_err();
        assert_eq!(err, ArchError::UnknownDevice("XC7A35T".to_string()));
    }

    #[test]
    fn oscillator_divider_range() {
        let osc = Oscillator {
            base: Frequency::from_mhz(48.0),
            max_div_exponent: 3,
        };
        assert_eq!(osc.frequency(2).map(|f| f.hz()), Some(12_000_000.0));
        assert!(osc.frequency(4).is_none());
    }
}
