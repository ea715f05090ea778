//! Primitive catalogue and `PIN_TYPE` field values.
//!
//! These names and widths are consumed verbatim by yosys/nextpnr and
//! icestorm; changing any of them breaks the downstream flow.

use icepick_common::Bits;

/// `SB_IO` / `SB_GB_IO` names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoPrimitive {
    /// The standard I/O cell.
    pub type_name: &'static str,
    /// The I/O cell with a path into the global clock network.
    pub global_type_name: &'static str,
    /// Packed input/output configuration parameter.
    pub pin_type_param: &'static str,
    /// The package pin.
    pub package_pin: &'static str,
    /// Input data, phase 0 and phase 1.
    pub d_in: [&'static str; 2],
    /// Output data, phase 0 and phase 1.
    pub d_out: [&'static str; 2],
    /// Input register clock.
    pub input_clk: &'static str,
    /// Output register clock.
    pub output_clk: &'static str,
    /// Output driver enable.
    pub output_enable: &'static str,
    /// Global network output of `SB_GB_IO`.
    pub global_buffer_output: &'static str,
}

/// `SB_LUT4` names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LutPrimitive {
    /// Type name.
    pub type_name: &'static str,
    /// Truth table parameter.
    pub init_param: &'static str,
    /// Truth table width.
    pub init_width: u32,
    /// Inputs, `I0` first.
    pub inputs: [&'static str; 4],
    /// Output.
    pub output: &'static str,
}

impl LutPrimitive {
    /// Truth table passing `I0` through with the other inputs tied low.
    pub fn buffer_init(&self) -> Bits {
        Bits::from_u64(0b10, self.init_width)
    }

    /// Truth table inverting `I0` with the other inputs tied low.
    pub fn inverter_init(&self) -> Bits {
        Bits::from_u64(0b01, self.init_width)
    }
}

/// `SB_DFF` names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DffPrimitive {
    /// Type name.
    pub type_name: &'static str,
    /// Clock input.
    pub clock: &'static str,
    /// Data input.
    pub data: &'static str,
    /// Data output.
    pub q: &'static str,
}

/// `SB_HFOSC` / `SB_LFOSC` names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OscillatorPrimitive {
    /// Type name.
    pub type_name: &'static str,
    /// Enable input.
    pub enable: &'static str,
    /// Power-up input.
    pub power_up: &'static str,
    /// Clock output.
    pub output: &'static str,
    /// Divider parameter, for oscillators that have one.
    pub divider_param: Option<&'static str>,
}

/// All primitives the lowering engine emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimitiveCatalog {
    /// I/O cells.
    pub io: IoPrimitive,
    /// Lookup table.
    pub lut: LutPrimitive,
    /// Flip-flop.
    pub dff: DffPrimitive,
    /// High-frequency oscillator.
    pub hfosc: OscillatorPrimitive,
    /// Low-frequency oscillator.
    pub lfosc: OscillatorPrimitive,
}

/// The iCE40 technology library.
pub const ICE40_CATALOG: PrimitiveCatalog = PrimitiveCatalog {
    io: IoPrimitive {
        type_name: "SB_IO",
        global_type_name: "SB_GB_IO",
        pin_type_param: "PIN_TYPE",
        package_pin: "PACKAGE_PIN",
        d_in: ["D_IN_0", "D_IN_1"],
        d_out: ["D_OUT_0", "D_OUT_1"],
        input_clk: "INPUT_CLK",
        output_clk: "OUTPUT_CLK",
        output_enable: "OUTPUT_ENABLE",
        global_buffer_output: "GLOBAL_BUFFER_OUTPUT",
    },
    lut: LutPrimitive {
        type_name: "SB_LUT4",
        init_param: "LUT_INIT",
        init_width: 16,
        inputs: ["I0", "I1", "I2", "I3"],
        output: "O",
    },
    dff: DffPrimitive {
        type_name: "SB_DFF",
        clock: "C",
        data: "D",
        q: "Q",
    },
    hfosc: OscillatorPrimitive {
        type_name: "SB_HFOSC",
        enable: "CLKHFEN",
        power_up: "CLKHFPU",
        output: "CLKHF",
        divider_param: Some("CLKHF_DIV"),
    },
    lfosc: OscillatorPrimitive {
        type_name: "SB_LFOSC",
        enable: "CLKLFEN",
        power_up: "CLKLFPU",
        output: "CLKLF",
        divider_param: None,
    },
};

/// Values of the two fields packed into `PIN_TYPE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinTypeCodes {
    /// Unregistered input. Also used by output-only pins.
    pub input_plain: u8,
    /// Registered or DDR input.
    pub input_registered: u8,
    /// No output driver.
    pub output_none: u8,
    /// Combinational output with tristate enable.
    pub output_tristate: u8,
    /// Registered output and output enable.
    pub output_registered: u8,
    /// DDR output, registered output enable.
    pub output_ddr: u8,
    /// Width of the output field; the input field fills the rest.
    pub output_width: u32,
    /// Width of the input field.
    pub input_width: u32,
}

impl PinTypeCodes {
    /// Packs `(o_type << input_width) | i_type` into a sized parameter.
    pub fn pack(&self, o_type: u8, i_type: u8) -> Bits {
        let value = (u64::from(o_type) << self.input_width) | u64::from(i_type);
        Bits::from_u64(value, self.output_width + self.input_width)
    }
}

/// `PIN_TYPE` field values from the iCE40 technology library.
pub const ICE40_PIN_TYPES: PinTypeCodes = PinTypeCodes {
    input_plain: 0b01,
    input_registered: 0b00,
    output_none: 0b0000,
    output_tristate: 0b1010,
    output_registered: 0b1101,
    output_ddr: 0b1100,
    output_width: 4,
    input_width: 2,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_is_six_bits() {
        let codes = &ICE40_PIN_TYPES;
        let packed = codes.pack(codes.output_tristate, codes.input_plain);
        assert_eq!(packed.width(), 6);
        assert_eq!(packed.to_u64(), Some(0b1010_01));
        assert_eq!(
            codes.pack(codes.output_ddr, codes.input_registered).to_u64(),
            Some(0b1100_00)
        );
    }

    #[test]
    fn lut_truth_tables() {
        let lut = &ICE40_CATALOG.lut;
        assert_eq!(lut.inverter_init().width(), 16);
        assert_eq!(lut.inverter_init().to_u64(), Some(1));
        assert_eq!(lut.buffer_init().to_u64(), Some(2));
    }
}
