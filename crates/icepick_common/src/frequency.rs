//! Clock frequencies with unit parsing, display, and cycle arithmetic.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Relative tolerance under which a cycle count is snapped to the nearest
/// integer before rounding up.
const CYCLE_SNAP_EPSILON: f64 = 1e-9;

/// A frequency value stored in Hertz.
///
/// Parses strings like "48MHz", "10kHz", "12e6", and displays with the most
/// readable unit. Delay-to-cycle conversion goes through
/// [`Frequency::cycles_for_micros`].
#[derive(Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Frequency(f64);

impl Frequency {
    /// Creates a new frequency from a value in Hertz.
    pub fn new(hz: f64) -> Self {
        Self(hz)
    }

    /// Creates a frequency from a value in kilohertz.
    pub fn from_khz(khz: f64) -> Self {
        Self(khz * 1_000.0)
    }

    /// Creates a frequency from a value in megahertz.
    pub fn from_mhz(mhz: f64) -> Self {
        Self(mhz * 1_000_000.0)
    }

    /// Returns the frequency in Hertz.
    pub fn hz(&self) -> f64 {
        self.0
    }

    /// Returns the frequency in kilohertz.
    pub fn khz(&self) -> f64 {
        self.0 / 1_000.0
    }

    /// Returns the frequency in megahertz.
    pub fn mhz(&self) -> f64 {
        self.0 / 1_000_000.0
    }

    /// Returns this frequency divided by `2^exponent`.
    pub fn div_pow2(self, exponent: u32) -> Self {
        Self(self.0 / f64::from(1u32 << exponent.min(31)))
    }

    /// Returns `true` if the value is finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        self.0.is_finite() && self.0 > 0.0
    }

    /// Number of whole cycles of this clock needed to cover `micros`
    /// microseconds, rounded up.
    ///
    /// Products that land within floating-point noise of an integer are
    /// taken as exact, so 100 µs at 48 MHz is 4800 cycles rather than 4801.
    /// Non-positive frequencies yield zero.
    pub fn cycles_for_micros(&self, micros: u32) -> u64 {
        if !self.is_valid() {
            return 0;
        }
        let exact = self.0 * f64::from(micros) / 1_000_000.0;
        let nearest = exact.round();
        if (exact - nearest).abs() <= CYCLE_SNAP_EPSILON * nearest.max(1.0) {
            nearest as u64
        } else {
            exact.ceil() as u64
        }
    }
}

impl fmt::Debug for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frequency({self})")
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hz = self.0;
        if hz >= 1_000_000.0 {
            write!(f, "{}MHz", hz / 1_000_000.0)
        } else if hz >= 1_000.0 {
            write!(f, "{}kHz", hz / 1_000.0)
        } else {
            write!(f, "{hz}Hz")
        }
    }
}

/// Error returned when a frequency string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid frequency: '{input}'")]
pub struct ParseFrequencyError {
    /// The input string that failed to parse.
    pub input: String,
}

impl FromStr for Frequency {
    type Err = ParseFrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || ParseFrequencyError {
            input: s.to_string(),
        };

        let lower = s.to_ascii_lowercase();
        let (number, scale) = if let Some(num) = lower.strip_suffix("mhz") {
            (num, 1_000_000.0)
        } else if let Some(num) = lower.strip_suffix("khz") {
            (num, 1_000.0)
        } else if let Some(num) = lower.strip_suffix("hz") {
            (num, 1.0)
        } else {
            (lower.as_str(), 1.0)
        };

        let val: f64 = number.trim().parse().map_err(|_| err())?;
        let freq = Frequency(val * scale);
        if !freq.is_valid() {
            return Err(err());
        }
        Ok(freq)
    }
}
