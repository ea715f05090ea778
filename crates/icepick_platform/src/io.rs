//! Lowering of buffer descriptors into `SB_IO` and friends.
//!
//! Each bit of a single-ended binding becomes one I/O cell. Differential
//! bindings are split into legs and each leg is lowered as a single-ended
//! binding of its own. Inversion either folds into the net as a constant
//! mask or becomes a per-bit `SB_LUT4`, and DDR paths gain `SB_DFF`
//! re-registration in the fabric.
//!
//! Every check runs before the first cell is emitted, so a failed buffer
//! leaves nothing behind in the module.

use crate::buffer::{
    BufferDescriptor, Direction, InputSide, OutputSide, PortBinding, PortTopology,
    RegistrationMode, SingleEndedBinding, GLOBAL_ATTR,
};
use crate::codes;
use crate::error::PlatformError;
use icepick_arch::{DifferentialLeg, FamilyProfile, PinTypeCodes};
use icepick_common::Bits;
use icepick_diagnostics::{Diagnostic, DiagnosticSink};
use icepick_ir::{CellId, ClockDomainId, ConstValue, Expr, Instance, ModuleBuilder, SignalId, SignalRef};

/// Cells emitted for one buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoweredBuffer {
    /// `SB_IO` / `SB_GB_IO` cells, per leg in ascending bit order.
    pub io_cells: Vec<CellId>,
    /// `SB_LUT4` and `SB_DFF` cells in the fabric.
    pub fabric_cells: Vec<CellId>,
}

/// Packs the `PIN_TYPE` parameter for a direction and registration mode.
pub fn pin_type(codes: &PinTypeCodes, direction: Direction, mode: RegistrationMode) -> Bits {
    use Direction::*;
    use RegistrationMode::*;

    // Output-only pins still select the plain input path; a registered input
    // field would claim the clock shared with the neighbouring pin.
    let (o_type, i_type) = match (direction, mode) {
        (Input, Combinational) => (codes.output_none, codes.input_plain),
        (Input, SingleRegistered) | (Input, DoubleDataRate) => {
            (codes.output_none, codes.input_registered)
        }
        (Output, Combinational) => (codes.output_tristate, codes.input_plain),
        (Output, SingleRegistered) => (codes.output_registered, codes.input_plain),
        (Output, DoubleDataRate) => (codes.output_ddr, codes.input_plain),
        (Bidir, Combinational) => (codes.output_tristate, codes.input_plain),
        (Bidir, SingleRegistered) => (codes.output_registered, codes.input_registered),
        (Bidir, DoubleDataRate) => (codes.output_ddr, codes.input_registered),
    };
    codes.pack(o_type, i_type)
}

/// How a leg's inversion flags are realised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InversionStyle {
    /// A constant mask folded into a combinational assignment.
    Net,
    /// One `SB_LUT4` per bit.
    Lut,
}

/// One single-ended pass over a binding.
struct Leg<'d> {
    prefix: String,
    pins: &'d SingleEndedBinding,
    invert: Vec<bool>,
}

/// The fabric-side signals each leg's I/O cells connect to.
#[derive(Default)]
struct LegNets {
    input: Vec<SignalId>,
    output: Vec<SignalId>,
}

/// The I/O buffer lowering engine.
pub struct IoLowering<'a> {
    profile: &'a dyn FamilyProfile,
    sink: &'a DiagnosticSink,
}

impl<'a> IoLowering<'a> {
    /// Creates an engine for one family profile.
    pub fn new(profile: &'a dyn FamilyProfile, sink: &'a DiagnosticSink) -> Self {
        Self { profile, sink }
    }

    /// Lowers one buffer into `b`.
    pub fn lower(
        &self,
        b: &mut ModuleBuilder<'_>,
        desc: &BufferDescriptor,
        binding: &PortBinding,
    ) -> Result<LoweredBuffer, PlatformError> {
        if desc.topology != binding.topology() {
            return Err(PlatformError::type_error(
                format!("a {} binding for buffer '{}'", desc.topology, desc.name),
                binding.topology(),
            ));
        }

        let width = binding.width();
        desc.validate(width)?;
        self.check_signals(b, desc, width)?;

        let legs = self.plan_legs(b, desc, binding)?;
        let global_input = self.check_global_pins(desc, &legs)?;
        let input_domain = self.checked_domain(b, desc, desc.input.as_ref().and_then(|i| i.domain))?;
        let output_domain = self.checked_domain(b, desc, desc.output.as_ref().and_then(|o| o.domain))?;

        if desc.direction == Direction::Output
            && legs
                .iter()
                .any(|leg| leg.pins.pins.iter().any(|pin| pin.is_global()))
        {
            self.sink.emit(
                Diagnostic::warning(
                    codes::GLOBAL_ON_OUTPUT,
                    format!(
                        "'{GLOBAL_ATTR}' attribute on output-only buffer '{}' is ignored",
                        desc.name
                    ),
                )
                .with_origin(desc.name.clone()),
            );
        }

        if desc.direction == Direction::Input && desc.topology == PortTopology::Differential {
            let leg = self.profile.differential_input_leg();
            self.sink.emit(
                Diagnostic::note(
                    codes::DIFFERENTIAL_SINGLE_LEG,
                    format!(
                        "differential input '{}' uses only its {} leg",
                        desc.name,
                        match leg {
                            DifferentialLeg::Positive => "positive",
                            DifferentialLeg::Negative => "negative",
                        }
                    ),
                )
                .with_note(format!(
                    "on {} the non-inverting pin of a pair is named {}",
                    self.profile.device_name(),
                    self.profile.non_inverting_pin_naming()
                )),
            );
        }

        let mut lowered = LoweredBuffer::default();
        for leg in &legs {
            let style = self.inversion_style(desc, binding, &leg.invert);
            let nets = self.emit_io_cells(
                b,
                desc,
                leg,
                global_input,
                input_domain,
                output_domain,
                &mut lowered,
            );
            if let Some(input) = &desc.input {
                self.emit_input_path(b, desc, leg, style, input, &nets, &mut lowered);
            }
            if let Some(output) = &desc.output {
                self.emit_output_path(b, desc, leg, style, output, &nets, &mut lowered);
            }
        }
        Ok(lowered)
    }

    fn check_signals(
        &self,
        b: &ModuleBuilder<'_>,
        desc: &BufferDescriptor,
        width: usize,
    ) -> Result<(), PlatformError> {
        let signals = &b.module().signals;
        let expect_width = |what: &str, found: u32, expected: usize| {
            if found as usize == expected {
                Ok(())
            } else {
                Err(PlatformError::type_error(
                    format!("{expected}-bit {what} for buffer '{}'", desc.name),
                    format!("{found} bits"),
                ))
            }
        };
        let known = |id: SignalId| {
            signals.try_get(id).map(|s| s.width).ok_or_else(|| {
                PlatformError::type_error("a signal of this module", format!("{id:?}"))
            })
        };

        if let Some(input) = &desc.input {
            for &data in &input.data {
                expect_width("input data", known(data)?, width)?;
            }
        }
        if let Some(output) = &desc.output {
            for data in &output.data {
                if let Some(id) = data.signal_id() {
                    known(id)?;
                }
                expect_width("output data", b.ref_width(data), width)?;
            }
            if let Some(id) = output.enable.signal_id() {
                known(id)?;
            }
            expect_width("output enable", b.ref_width(&output.enable), 1)?;
        }
        Ok(())
    }

    fn plan_legs<'d>(
        &self,
        b: &ModuleBuilder<'_>,
        desc: &BufferDescriptor,
        binding: &'d PortBinding,
    ) -> Result<Vec<Leg<'d>>, PlatformError> {
        let complement = || desc.invert.iter().map(|&inv| !inv).collect::<Vec<_>>();
        let legs = match binding {
            PortBinding::SingleEnded(pins) => vec![Leg {
                prefix: desc.name.clone(),
                pins,
                invert: desc.invert.clone(),
            }],
            PortBinding::Differential(pair) => {
                if pair.p.pins.len() != pair.n.pins.len() {
                    return Err(PlatformError::type_error(
                        format!("{} negative pins", pair.p.pins.len()),
                        pair.n.pins.len(),
                    ));
                }
                match desc.direction {
                    Direction::Bidir => {
                        return Err(PlatformError::unsupported(format!(
                            "differential buffer '{}' cannot be bidirectional on {}",
                            desc.name,
                            self.profile.family_name()
                        )));
                    }
                    Direction::Output => vec![
                        Leg {
                            prefix: format!("{}.p", desc.name),
                            pins: &pair.p,
                            invert: desc.invert.clone(),
                        },
                        Leg {
                            prefix: format!("{}.n", desc.name),
                            pins: &pair.n,
                            invert: complement(),
                        },
                    ],
                    Direction::Input => match self.profile.differential_input_leg() {
                        DifferentialLeg::Positive => vec![Leg {
                            prefix: format!("{}.p", desc.name),
                            pins: &pair.p,
                            invert: desc.invert.clone(),
                        }],
                        DifferentialLeg::Negative => vec![Leg {
                            prefix: format!("{}.n", desc.name),
                            pins: &pair.n,
                            invert: complement(),
                        }],
                    },
                }
            }
        };

        for leg in &legs {
            let port = b.module().signals.try_get(leg.pins.port).ok_or_else(|| {
                PlatformError::type_error("a port signal of this module", leg.pins.port)
            })?;
            if port.width as usize != leg.pins.pins.len() {
                return Err(PlatformError::type_error(
                    format!("a {}-bit port for '{}'", leg.pins.pins.len(), leg.prefix),
                    format!("{} bits", port.width),
                ));
            }
        }

        Ok(legs)
    }

    /// Returns whether `GLOBAL` pins of this buffer become `SB_GB_IO`.
    fn check_global_pins(&self, desc: &BufferDescriptor, legs: &[Leg<'_>]) -> Result<bool, PlatformError> {
        if !desc.direction.has_input() {
            return Ok(false);
        }
        for leg in legs {
            for (bit, pin) in leg.pins.pins.iter().enumerate() {
                if !pin.is_global() {
                    continue;
                }
                if desc.mode.is_registered() {
                    return Err(PlatformError::unsupported(format!(
                        "global input pin {} of '{}' cannot be registered ('{}')",
                        pin.name, desc.name, desc.mode
                    )));
                }
                if leg.invert[bit] {
                    return Err(PlatformError::unsupported(format!(
                        "global input pin {} of '{}' cannot be inverted",
                        pin.name, desc.name
                    )));
                }
            }
        }
        Ok(true)
    }

    /// Only registered and DDR paths are clocked, so only they need a
    /// rising-edge domain. A combinational path ignores its domain.
    fn checked_domain(
        &self,
        b: &ModuleBuilder<'_>,
        desc: &BufferDescriptor,
        domain: Option<ClockDomainId>,
    ) -> Result<Option<ClockDomainId>, PlatformError> {
        let Some(domain) = domain else {
            return Ok(None);
        };
        if b.module().domains.try_get(domain).is_none() {
            return Err(PlatformError::type_error(
                "a clock domain of this module",
                domain,
            ));
        }
        if desc.mode.is_registered() {
            b.require_posedge(domain)?;
        }
        Ok(Some(domain))
    }

    fn inversion_style(
        &self,
        desc: &BufferDescriptor,
        binding: &PortBinding,
        invert: &[bool],
    ) -> InversionStyle {
        let differential_output = binding.topology() == PortTopology::Differential
            && desc.direction == Direction::Output;
        match desc.mode {
            RegistrationMode::Combinational if differential_output => InversionStyle::Lut,
            RegistrationMode::Combinational => InversionStyle::Net,
            _ if invert.iter().any(|&inv| inv) => InversionStyle::Lut,
            _ => InversionStyle::Net,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_io_cells(
        &self,
        b: &mut ModuleBuilder<'_>,
        desc: &BufferDescriptor,
        leg: &Leg<'_>,
        global_input: bool,
        input_domain: Option<ClockDomainId>,
        output_domain: Option<ClockDomainId>,
        lowered: &mut LoweredBuffer,
    ) -> LegNets {
        let io = &self.profile.catalog().io;
        let width = leg.pins.pins.len() as u32;
        let prefix = &leg.prefix;
        let packed = ConstValue::Bits(pin_type(self.profile.pin_types(), desc.direction, desc.mode));

        let mut nets = LegNets::default();
        if desc.direction.has_input() {
            nets.input = match desc.mode {
                RegistrationMode::DoubleDataRate => vec![
                    b.add_wire(&format!("{prefix}.i0"), width),
                    b.add_wire(&format!("{prefix}.i1"), width),
                ],
                _ => vec![b.add_wire(&format!("{prefix}.i"), width)],
            };
        }
        if desc.direction.has_output() {
            nets.output = match desc.mode {
                RegistrationMode::DoubleDataRate => vec![
                    b.add_wire(&format!("{prefix}.o0"), width),
                    b.add_wire(&format!("{prefix}.o1"), width),
                ],
                _ => vec![b.add_wire(&format!("{prefix}.o"), width)],
            };
        }
        let input_clk = input_domain.map(|d| SignalRef::Signal(b.clock_of(d)));
        let output_clk = output_domain.map(|d| SignalRef::Signal(b.clock_of(d)));

        for (bit, pin) in leg.pins.pins.iter().enumerate() {
            let index = bit as u32;
            let global = global_input && pin.is_global();

            let mut inst = Instance::new(if global {
                io.global_type_name
            } else {
                io.type_name
            });
            for (key, value) in pin.attrs.iter().filter(|(key, _)| *key != GLOBAL_ATTR) {
                inst = inst.param(key.clone(), value.clone());
            }
            inst = inst
                .param(io.pin_type_param, packed.clone())
                .inout(io.package_pin, SignalRef::Signal(leg.pins.port).bit(index));

            if desc.direction.has_input() {
                if global {
                    inst = inst.output(io.global_buffer_output, SignalRef::Signal(nets.input[0]).bit(index));
                } else {
                    if let Some(clk) = input_clk.clone().filter(|_| desc.mode.is_registered()) {
                        inst = inst.input(io.input_clk, clk);
                    }
                    for (phase, &net) in nets.input.iter().enumerate() {
                        inst = inst.output(io.d_in[phase], SignalRef::Signal(net).bit(index));
                    }
                }
            }
            if desc.direction.has_output() {
                if let Some(clk) = output_clk.clone().filter(|_| desc.mode.is_registered()) {
                    inst = inst.input(io.output_clk, clk);
                }
                for (phase, &net) in nets.output.iter().enumerate() {
                    inst = inst.input(io.d_out[phase], SignalRef::Signal(net).bit(index));
                }
                if let Some(output) = &desc.output {
                    inst = inst.input(io.output_enable, output.enable.clone());
                }
            }

            lowered
                .io_cells
                .push(b.add_instance(&format!("{prefix}.buf{bit}"), inst));
        }
        nets
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_input_path(
        &self,
        b: &mut ModuleBuilder<'_>,
        desc: &BufferDescriptor,
        leg: &Leg<'_>,
        style: InversionStyle,
        input: &InputSide,
        nets: &LegNets,
        lowered: &mut LoweredBuffer,
    ) {
        let width = leg.pins.pins.len() as u32;
        for (phase, (&raw, &dest)) in nets.input.iter().zip(&input.data).enumerate() {
            let source = match (desc.mode, input.domain) {
                (RegistrationMode::DoubleDataRate, Some(domain)) => {
                    let name = format!("i{phase}");
                    let captured = b.add_wire(&format!("{}.{name}_ff", leg.prefix), width);
                    self.emit_dffs(b, &leg.prefix, &name, domain, raw.into(), captured, width, lowered);
                    captured
                }
                _ => raw,
            };
            let name = if nets.input.len() > 1 {
                format!("i{phase}")
            } else {
                "i".to_string()
            };
            self.emit_inversion(
                b,
                &leg.prefix,
                &name,
                source.into(),
                dest.into(),
                &leg.invert,
                style,
                lowered,
            );
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_output_path(
        &self,
        b: &mut ModuleBuilder<'_>,
        desc: &BufferDescriptor,
        leg: &Leg<'_>,
        style: InversionStyle,
        output: &OutputSide,
        nets: &LegNets,
        lowered: &mut LoweredBuffer,
    ) {
        let width = leg.pins.pins.len() as u32;
        for (phase, (&wire, data)) in nets.output.iter().zip(&output.data).enumerate() {
            // The falling-edge phase is re-registered so both phases leave
            // the fabric from the same edge.
            let source = match (desc.mode, output.domain) {
                (RegistrationMode::DoubleDataRate, Some(domain)) if phase == 1 => {
                    let realigned = b.add_wire(&format!("{}.o1_ff", leg.prefix), width);
                    self.emit_dffs(b, &leg.prefix, "o1", domain, data.clone(), realigned, width, lowered);
                    SignalRef::Signal(realigned)
                }
                _ => data.clone(),
            };
            let name = if nets.output.len() > 1 {
                format!("o{phase}")
            } else {
                "o".to_string()
            };
            self.emit_inversion(
                b,
                &leg.prefix,
                &name,
                source,
                wire.into(),
                &leg.invert,
                style,
                lowered,
            );
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_dffs(
        &self,
        b: &mut ModuleBuilder<'_>,
        prefix: &str,
        name: &str,
        domain: ClockDomainId,
        d: SignalRef,
        q: SignalId,
        width: u32,
        lowered: &mut LoweredBuffer,
    ) {
        let dff = &self.profile.catalog().dff;
        let clock = SignalRef::Signal(b.clock_of(domain));
        for bit in 0..width {
            let inst = Instance::new(dff.type_name)
                .input(dff.clock, clock.clone())
                .input(dff.data, d.bit(bit))
                .output(dff.q, SignalRef::Signal(q).bit(bit));
            lowered
                .fabric_cells
                .push(b.add_instance(&format!("{prefix}.{name}_dff{bit}"), inst));
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_inversion(
        &self,
        b: &mut ModuleBuilder<'_>,
        prefix: &str,
        name: &str,
        source: SignalRef,
        dest: SignalRef,
        invert: &[bool],
        style: InversionStyle,
        lowered: &mut LoweredBuffer,
    ) {
        match style {
            InversionStyle::Net => {
                let mask = Bits::from_bools(invert);
                let value = if mask.is_zero() {
                    Expr::from(source)
                } else if mask.is_ones() {
                    !Expr::from(source)
                } else {
                    Expr::from(source) ^ Expr::constant(mask)
                };
                b.comb(dest, value);
            }
            InversionStyle::Lut => {
                let lut = &self.profile.catalog().lut;
                let low = SignalRef::bit_const(false);
                for (bit, &inv) in invert.iter().enumerate() {
                    let index = bit as u32;
                    let init = if inv {
                        lut.inverter_init()
                    } else {
                        lut.buffer_init()
                    };
                    let inst = Instance::new(lut.type_name)
                        .param(lut.init_param, ConstValue::Bits(init))
                        .input(lut.inputs[0], source.bit(index))
                        .input(lut.inputs[1], low.clone())
                        .input(lut.inputs[2], low.clone())
                        .input(lut.inputs[3], low.clone())
                        .output(lut.output, dest.bit(index));
                    lowered
                        .fabric_cells
                        .push(b.add_instance(&format!("{prefix}.{name}_lut{bit}"), inst));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::PinBinding;
    use icepick_arch::{load_profile, ICE40_PIN_TYPES};
    use icepick_common::Interner;
    use icepick_ir::{DomainSpec, PortDirection};

    fn code(direction: Direction, mode: RegistrationMode) -> u64 {
        pin_type(&ICE40_PIN_TYPES, direction, mode)
            .to_u64()
            .unwrap()
    }

    #[test]
    fn pin_type_table() {
        use Direction::*;
        use RegistrationMode::*;
        assert_eq!(code(Input, Combinational), 0b0000_01);
        assert_eq!(code(Input, SingleRegistered), 0b0000_00);
        assert_eq!(code(Input, DoubleDataRate), 0b0000_00);
        assert_eq!(code(Output, Combinational), 0b1010_01);
        assert_eq!(code(Output, SingleRegistered), 0b1101_01);
        assert_eq!(code(Output, DoubleDataRate), 0b1100_01);
        assert_eq!(code(Bidir, Combinational), 0b1010_01);
        assert_eq!(code(Bidir, SingleRegistered), 0b1101_00);
        assert_eq!(code(Bidir, DoubleDataRate), 0b1100_00);
        assert_eq!(pin_type(&ICE40_PIN_TYPES, Bidir, DoubleDataRate).width(), 6);
    }

    #[test]
    fn single_registered_output_wires_clock_and_enable() {
        let interner = Interner::new();
        let profile = load_profile("iCE40HX1K", "TQ144").unwrap();
        let sink = DiagnosticSink::new();
        let mut b = ModuleBuilder::new(&interner, "top");
        let sync = b.add_domain(DomainSpec::new("sync")).unwrap();
        let port = b.add_port("led", 1, PortDirection::InOut);
        let data = b.add_wire("data", 1);
        let oe = b.add_wire("oe", 1);

        let desc = BufferDescriptor::new(
            "led",
            Direction::Output,
            RegistrationMode::SingleRegistered,
            PortTopology::SingleEnded,
            1,
        )
        .with_output(Some(sync), vec![data.into()], oe.into());
        let binding = PortBinding::SingleEnded(SingleEndedBinding {
            port,
            pins: vec![PinBinding::new("99")],
        });

        let lowered = IoLowering::new(profile.as_ref(), &sink)
            .lower(&mut b, &desc, &binding)
            .unwrap();
        assert_eq!(lowered.io_cells.len(), 1);
        assert!(lowered.fabric_cells.is_empty());

        let clk = b.clock_of(sync);
        let m = b.finish();
        let cell = m.cell_named(&interner, "led.buf0").unwrap();
        assert_eq!(
            cell.connection(&interner, "OUTPUT_CLK").map(|c| &c.signal),
            Some(&SignalRef::Signal(clk))
        );
        assert_eq!(
            cell.connection(&interner, "OUTPUT_ENABLE").map(|c| &c.signal),
            Some(&SignalRef::Signal(oe))
        );
        assert!(cell.connection(&interner, "INPUT_CLK").is_none());
        assert!(cell.connection(&interner, "D_IN_0").is_none());
    }

    #[test]
    fn topology_mismatch_is_a_type_error() {
        let interner = Interner::new();
        let profile = load_profile("iCE40HX1K", "TQ144").unwrap();
        let sink = DiagnosticSink::new();
        let mut b = ModuleBuilder::new(&interner, "top");
        let port = b.add_port("btn", 1, PortDirection::InOut);
        let dest = b.add_wire("btn_i", 1);

        let desc = BufferDescriptor::new(
            "btn",
            Direction::Input,
            RegistrationMode::Combinational,
            PortTopology::Differential,
            1,
        )
        .with_input(None, vec![dest]);
        let binding = PortBinding::SingleEnded(SingleEndedBinding {
            port,
            pins: vec![PinBinding::new("10")],
        });
        let err = IoLowering::new(profile.as_ref(), &sink)
            .lower(&mut b, &desc, &binding)
            .unwrap_err();
        assert!(matches!(err, PlatformError::TypeError { .. }));
        assert!(b.module().cells.is_empty());
    }

    #[test]
    fn data_width_mismatch_is_a_type_error() {
        let interner = Interner::new();
        let profile = load_profile("iCE40HX1K", "TQ144").unwrap();
        let sink = DiagnosticSink::new();
        let mut b = ModuleBuilder::new(&interner, "top");
        let port = b.add_port("bus", 2, PortDirection::InOut);
        let dest = b.add_wire("bus_i", 3);

        let desc = BufferDescriptor::new(
            "bus",
            Direction::Input,
            RegistrationMode::Combinational,
            PortTopology::SingleEnded,
            2,
        )
        .with_input(None, vec![dest]);
        let binding = PortBinding::SingleEnded(SingleEndedBinding {
            port,
            pins: vec![PinBinding::new("1"), PinBinding::new("2")],
        });
        let err = IoLowering::new(profile.as_ref(), &sink)
            .lower(&mut b, &desc, &binding)
            .unwrap_err();
        assert!(matches!(err, PlatformError::TypeError { .. }));
    }
}
