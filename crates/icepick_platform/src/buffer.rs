//! Buffer descriptors and physical port bindings.

use crate::error::PlatformError;
use icepick_ir::{ClockDomainId, ConstValue, SignalId, SignalRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Pin attribute marking a pin wired to the global clock network.
pub const GLOBAL_ATTR: &str = "GLOBAL";

/// Which way data flows through a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Pin to fabric.
    Input,
    /// Fabric to pin.
    Output,
    /// Both, with an output enable.
    Bidir,
}

impl Direction {
    /// All directions.
    pub const ALL: [Direction; 3] = [Direction::Input, Direction::Output, Direction::Bidir];

    /// Returns `true` unless the buffer is output-only.
    pub fn has_input(self) -> bool {
        self != Direction::Output
    }

    /// Returns `true` unless the buffer is input-only.
    pub fn has_output(self) -> bool {
        self != Direction::Input
    }
}

/// How the buffer registers its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegistrationMode {
    /// Unregistered.
    Combinational,
    /// One register per direction, clocked on the rising edge.
    SingleRegistered,
    /// Two data phases per clock cycle.
    DoubleDataRate,
}

impl RegistrationMode {
    /// All modes.
    pub const ALL: [RegistrationMode; 3] = [
        RegistrationMode::Combinational,
        RegistrationMode::SingleRegistered,
        RegistrationMode::DoubleDataRate,
    ];

    /// Returns `true` for the registered modes.
    pub fn is_registered(self) -> bool {
        self != RegistrationMode::Combinational
    }

    /// Number of data phases per direction.
    pub fn phases(self) -> usize {
        match self {
            RegistrationMode::DoubleDataRate => 2,
            _ => 1,
        }
    }
}

/// Whether a port is one wire per bit or a pair per bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortTopology {
    /// One wire per bit.
    SingleEnded,
    /// A true/complement pair per bit.
    Differential,
}

macro_rules! keyword_enum {
    ($ty:ident, $what:literal, { $($text:literal => $variant:ident),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = PlatformError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($ty::$variant),)+
                    other => Err(PlatformError::type_error($what, format!("'{other}'"))),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(match self {
                    $($ty::$variant => $text,)+
                })
            }
        }
    };
}

keyword_enum!(Direction, "buffer direction 'i', 'o' or 'io'", {
    "i" => Input,
    "o" => Output,
    "io" => Bidir,
});

keyword_enum!(RegistrationMode, "buffer kind 'buffer', 'ff' or 'ddr'", {
    "buffer" => Combinational,
    "ff" => SingleRegistered,
    "ddr" => DoubleDataRate,
});

keyword_enum!(PortTopology, "port kind 'single-ended' or 'differential'", {
    "single-ended" => SingleEnded,
    "differential" => Differential,
});

/// The fabric side of an input path.
#[derive(Debug, Clone)]
pub struct InputSide {
    /// Capture domain; required when registered.
    pub domain: Option<ClockDomainId>,
    /// Destination signals, one per phase.
    pub data: Vec<SignalId>,
}

/// The fabric side of an output path.
#[derive(Debug, Clone)]
pub struct OutputSide {
    /// Launch domain; required when registered.
    pub domain: Option<ClockDomainId>,
    /// Source values, one per phase.
    pub data: Vec<SignalRef>,
    /// One-bit output enable shared by every bit.
    pub enable: SignalRef,
}

/// A request for one logical I/O buffer.
#[derive(Debug, Clone)]
pub struct BufferDescriptor {
    /// Instance name prefix for emitted cells and wires.
    pub name: String,
    /// Data direction.
    pub direction: Direction,
    /// Registration mode.
    pub mode: RegistrationMode,
    /// Expected shape of the binding.
    pub topology: PortTopology,
    /// Per-bit inversion, bit 0 first.
    pub invert: Vec<bool>,
    /// Input path, unless output-only.
    pub input: Option<InputSide>,
    /// Output path, unless input-only.
    pub output: Option<OutputSide>,
}

impl BufferDescriptor {
    /// Starts a descriptor with no inversion and no paths attached.
    pub fn new(
        name: impl Into<String>,
        direction: Direction,
        mode: RegistrationMode,
        topology: PortTopology,
        width: usize,
    ) -> Self {
        Self {
            name: name.into(),
            direction,
            mode,
            topology,
            invert: vec![false; width],
            input: None,
            output: None,
        }
    }

    /// Sets per-bit inversion.
    pub fn with_invert(mut self, invert: Vec<bool>) -> Self {
        self.invert = invert;
        self
    }

    /// Attaches the input path.
    pub fn with_input(mut self, domain: Option<ClockDomainId>, data: Vec<SignalId>) -> Self {
        self.input = Some(InputSide { domain, data });
        self
    }

    /// Attaches the output path.
    pub fn with_output(
        mut self,
        domain: Option<ClockDomainId>,
        data: Vec<SignalRef>,
        enable: SignalRef,
    ) -> Self {
        self.output = Some(OutputSide {
            domain,
            data,
            enable,
        });
        self
    }

    /// Checks the descriptor's shape against a port of `width` bits.
    ///
    /// Signal widths are checked separately by the lowering engine, which
    /// has the module at hand.
    pub fn validate(&self, width: usize) -> Result<(), PlatformError> {
        if self.invert.len() != width {
            return Err(PlatformError::type_error(
                format!("{width} invert flags"),
                format!("{} flags", self.invert.len()),
            ));
        }

        let phases = self.mode.phases();
        let registered = self.mode.is_registered();

        match (&self.input, self.direction.has_input()) {
            (None, true) => {
                return Err(PlatformError::type_error(
                    format!("an input path for a '{}' buffer", self.direction),
                    "none",
                ));
            }
            (Some(_), false) => {
                return Err(PlatformError::type_error(
                    "no input path on an output-only buffer",
                    "an input path",
                ));
            }
            (Some(input), true) => {
                if input.data.len() != phases {
                    return Err(PlatformError::type_error(
                        format!("{phases} input phase(s) for '{}'", self.mode),
                        input.data.len(),
                    ));
                }
                if registered && input.domain.is_none() {
                    return Err(PlatformError::type_error(
                        format!("an input clock domain for '{}'", self.mode),
                        "none",
                    ));
                }
            }
            (None, false) => {}
        }

        match (&self.output, self.direction.has_output()) {
            (None, true) => {
                return Err(PlatformError::type_error(
                    format!("an output path for a '{}' buffer", self.direction),
                    "none",
                ));
            }
            (Some(_), false) => {
                return Err(PlatformError::type_error(
                    "no output path on an input-only buffer",
                    "an output path",
                ));
            }
            (Some(output), true) => {
                if output.data.len() != phases {
                    return Err(PlatformError::type_error(
                        format!("{phases} output phase(s) for '{}'", self.mode),
                        output.data.len(),
                    ));
                }
                if registered && output.domain.is_none() {
                    return Err(PlatformError::type_error(
                        format!("an output clock domain for '{}'", self.mode),
                        "none",
                    ));
                }
            }
            (None, false) => {}
        }

        Ok(())
    }
}

/// One physical pin and its attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct PinBinding {
    /// Package pin name.
    pub name: String,
    /// Attributes; all but `GLOBAL` become cell parameters.
    pub attrs: BTreeMap<String, ConstValue>,
}

impl PinBinding {
    /// A pin with no attributes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: BTreeMap::new(),
        }
    }

    /// Adds an attribute.
    pub fn with_attr(mut self, key: impl Into<String>, value: ConstValue) -> Self {
        self.attrs.insert(key.into(), value);
        self
    }

    /// Returns `true` if the pin is marked as a global clock input.
    pub fn is_global(&self) -> bool {
        self.attrs.get(GLOBAL_ATTR).is_some_and(ConstValue::is_truthy)
    }
}

/// A top-level port signal and the pin behind each of its bits.
#[derive(Debug, Clone)]
pub struct SingleEndedBinding {
    /// The port signal, one bit per pin.
    pub port: SignalId,
    /// Pins, bit 0 first.
    pub pins: Vec<PinBinding>,
}

/// Both halves of a differential port.
#[derive(Debug, Clone)]
pub struct DifferentialBinding {
    /// Positive pins.
    pub p: SingleEndedBinding,
    /// Negative pins, carrying the complement.
    pub n: SingleEndedBinding,
}

/// The physical side of a buffer.
#[derive(Debug, Clone)]
pub enum PortBinding {
    /// One pin per bit.
    SingleEnded(SingleEndedBinding),
    /// A pin pair per bit.
    Differential(DifferentialBinding),
}

impl PortBinding {
    /// The binding's topology.
    pub fn topology(&self) -> PortTopology {
        match self {
            PortBinding::SingleEnded(_) => PortTopology::SingleEnded,
            PortBinding::Differential(_) => PortTopology::Differential,
        }
    }

    /// Number of logical bits.
    pub fn width(&self) -> usize {
        match self {
            PortBinding::SingleEnded(b) => b.pins.len(),
            PortBinding::Differential(d) => d.p.pins.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(n: u32) -> SignalId {
        SignalId::from_raw(n)
    }

    #[test]
    fn parse_keywords() {
        assert_eq!("io".parse::<Direction>().unwrap(), Direction::Bidir);
        assert_eq!(
            "ddr".parse::<RegistrationMode>().unwrap(),
            RegistrationMode::DoubleDataRate
        );
        assert_eq!(
            "differential".parse::<PortTopology>().unwrap(),
            PortTopology::Differential
        );
        assert_eq!(RegistrationMode::SingleRegistered.to_string(), "ff");
    }

    #[test]
    fn unknown_keywords_are_type_errors() {
        let err = "latch".parse::<RegistrationMode>().unwrap_err();
        assert!(matches!(
            err,
            PlatformError::TypeError { ref found, .. } if found == "'latch'"
        ));
        assert!(matches!(
            "pseudo-differential".parse::<PortTopology>(),
            Err(PlatformError::TypeError { .. })
        ));
        assert!(matches!(
            "x".parse::<Direction>(),
            Err(PlatformError::TypeError { .. })
        ));
    }

    #[test]
    fn invert_width_must_match() {
        let desc = BufferDescriptor::new(
            "led",
            Direction::Output,
            RegistrationMode::Combinational,
            PortTopology::SingleEnded,
            2,
        )
        .with_output(None, vec![sig(0).into()], SignalRef::bit_const(true));
        assert!(desc.validate(2).is_ok());
        assert!(matches!(
            desc.validate(3),
            Err(PlatformError::TypeError { .. })
        ));
    }

    #[test]
    fn paths_must_match_direction() {
        let base = BufferDescriptor::new(
            "pin",
            Direction::Input,
            RegistrationMode::Combinational,
            PortTopology::SingleEnded,
            1,
        );
        assert!(base.clone().validate(1).is_err(), "input path missing");
        assert!(base
            .clone()
            .with_input(None, vec![sig(0)])
            .with_output(None, vec![sig(1).into()], SignalRef::bit_const(true))
            .validate(1)
            .is_err());
        assert!(base.with_input(None, vec![sig(0)]).validate(1).is_ok());
    }

    #[test]
    fn registered_modes_need_domains_and_phases() {
        let ddr = BufferDescriptor::new(
            "d",
            Direction::Input,
            RegistrationMode::DoubleDataRate,
            PortTopology::SingleEnded,
            1,
        );
        assert!(ddr
            .clone()
            .with_input(Some(ClockDomainId::from_raw(0)), vec![sig(0)])
            .validate(1)
            .is_err());
        assert!(ddr
            .clone()
            .with_input(None, vec![sig(0), sig(1)])
            .validate(1)
            .is_err());
        assert!(ddr
            .with_input(Some(ClockDomainId::from_raw(0)), vec![sig(0), sig(1)])
            .validate(1)
            .is_ok());
    }

    #[test]
    fn global_attr_truthiness() {
        assert!(PinBinding::new("35")
            .with_attr(GLOBAL_ATTR, ConstValue::Bool(true))
            .is_global());
        assert!(!PinBinding::new("35")
            .with_attr(GLOBAL_ATTR, ConstValue::Bool(false))
            .is_global());
        assert!(!PinBinding::new("35").is_global());
    }
}
