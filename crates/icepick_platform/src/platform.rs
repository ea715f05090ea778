//! Binding of an `icepick.toml` description to the lowering passes.

use crate::buffer::{
    BufferDescriptor, DifferentialBinding, Direction, PinBinding, PortBinding, RegistrationMode,
    SingleEndedBinding,
};
use crate::error::PlatformError;
use crate::io::{IoLowering, LoweredBuffer};
use crate::por::{DefaultClock, PorDomain, PorInputs, PowerOnReset};
use icepick_arch::{load_profile, FamilyProfile};
use icepick_common::Frequency;
use icepick_config::{
    load_config, resolve_resource, PlatformConfig, ResolvedPins, ResolvedResource, HFOSC_CLOCK,
    LFOSC_CLOCK,
};
use icepick_diagnostics::DiagnosticSink;
use icepick_ir::{ConstValue, ModuleBuilder, PortDirection, SignalId};
use std::collections::BTreeMap;
use std::path::Path;

/// The only domain [`Platform::create_missing_domain`] synthesizes.
pub const PRIMARY_DOMAIN: &str = "sync";

/// A resource allocated as top-level ports.
#[derive(Debug, Clone)]
pub struct RequestedPort {
    /// The ports and pins.
    pub binding: PortBinding,
    /// Per-bit inversion from the resource's `invert` flag.
    pub invert: Vec<bool>,
    /// Nominal frequency, for clock resources.
    pub frequency: Option<Frequency>,
}

/// A device profile and the platform description it was selected by.
#[derive(Debug)]
pub struct Platform {
    config: PlatformConfig,
    profile: Box<dyn FamilyProfile>,
}

impl Platform {
    /// Selects the device profile for a validated description.
    pub fn from_config(config: PlatformConfig) -> Result<Self, PlatformError> {
        let profile = load_profile(&config.platform.device, &config.platform.package)?;
        Ok(Self { config, profile })
    }

    /// Loads `<project_dir>/icepick.toml`.
    pub fn load(project_dir: &Path) -> Result<Self, PlatformError> {
        Self::from_config(load_config(project_dir)?)
    }

    /// The device profile.
    pub fn profile(&self) -> &dyn FamilyProfile {
        self.profile.as_ref()
    }

    /// The platform description.
    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    /// The configured default clock, if any.
    pub fn default_clock(&self) -> Result<Option<DefaultClock>, PlatformError> {
        let meta = &self.config.platform;
        let clock = match meta.default_clk.as_deref() {
            None => return Ok(None),
            Some(HFOSC_CLOCK) => DefaultClock::HighFrequencyOscillator {
                div_exponent: meta.hfosc_div.as_ref().map(raw_const),
            },
            Some(LFOSC_CLOCK) => DefaultClock::LowFrequencyOscillator,
            Some(name) => {
                let resource = resolve_resource(&self.config, name)?;
                let frequency = resource.frequency.ok_or_else(|| {
                    PlatformError::invalid(
                        "default_clk",
                        name,
                        "a clock resource must declare a frequency",
                    )
                })?;
                DefaultClock::External { frequency }
            }
        };
        Ok(Some(clock))
    }

    /// Frequency of the default clock, if one is configured.
    pub fn default_clk_frequency(&self) -> Result<Option<Frequency>, PlatformError> {
        self.default_clock()?
            .map(|clock| PowerOnReset::new(self.profile(), clock).frequency())
            .transpose()
    }

    /// Allocates the ports of a resource and returns its binding.
    ///
    /// Single-ended resources become one `InOut` port named after the
    /// resource; differential ones become `<name>_p` and `<name>_n`.
    pub fn request(
        &self,
        b: &mut ModuleBuilder<'_>,
        name: &str,
    ) -> Result<RequestedPort, PlatformError> {
        let resource = self.check_requestable(b, name)?;
        let attrs = resource
            .attrs
            .iter()
            .map(|(key, value)| Ok((key.clone(), attr_const(key, value)?)))
            .collect::<Result<BTreeMap<_, _>, PlatformError>>()?;
        let pins = |names: &[String]| {
            names
                .iter()
                .map(|pin| PinBinding {
                    name: pin.clone(),
                    attrs: attrs.clone(),
                })
                .collect::<Vec<_>>()
        };

        let width = resource.pins.width();
        let binding = match &resource.pins {
            ResolvedPins::SingleEnded(names) => PortBinding::SingleEnded(SingleEndedBinding {
                port: b.add_port(name, width as u32, PortDirection::InOut),
                pins: pins(names),
            }),
            ResolvedPins::Differential { p, n } => PortBinding::Differential(DifferentialBinding {
                p: SingleEndedBinding {
                    port: b.add_port(&format!("{name}_p"), width as u32, PortDirection::InOut),
                    pins: pins(p),
                },
                n: SingleEndedBinding {
                    port: b.add_port(&format!("{name}_n"), width as u32, PortDirection::InOut),
                    pins: pins(n),
                },
            }),
        };

        Ok(RequestedPort {
            binding,
            invert: vec![resource.invert; width],
            frequency: resource.frequency,
        })
    }

    /// Synthesizes `name` from the default clock and reset.
    ///
    /// Returns `Ok(None)`, touching nothing, unless `name` is the primary
    /// domain and a default clock is configured.
    pub fn create_missing_domain(
        &self,
        b: &mut ModuleBuilder<'_>,
        name: &str,
        sink: &DiagnosticSink,
    ) -> Result<Option<PorDomain>, PlatformError> {
        if name != PRIMARY_DOMAIN {
            return Ok(None);
        }
        let Some(clock) = self.default_clock()? else {
            return Ok(None);
        };

        let external = matches!(clock, DefaultClock::External { .. });
        let por = PowerOnReset::new(self.profile(), clock);
        let plan = por.plan(b, name)?;

        let meta = &self.config.platform;
        let clk_resource = meta.default_clk.as_deref().filter(|_| external);
        let rst_resource = meta.default_rst.as_deref();
        for resource in [clk_resource, rst_resource].into_iter().flatten() {
            let width = self.check_requestable(b, resource)?.pins.width();
            if width != 1 {
                return Err(PlatformError::type_error(
                    format!("a 1-bit resource for default clock or reset '{resource}'"),
                    format!("{width} bits"),
                ));
            }
        }

        // Dry run in a scratch module: a rejected reset pin must not leave
        // the clock buffer behind in `b`.
        let mut scratch = ModuleBuilder::new(b.interner(), name);
        self.bring_in_defaults(&mut scratch, clk_resource, rst_resource, &DiagnosticSink::new())?;
        let inputs = self.bring_in_defaults(b, clk_resource, rst_resource, sink)?;

        por.emit(b, &plan, name, inputs, sink).map(Some)
    }

    /// Lowers one buffer.
    pub fn get_io_buffer(
        &self,
        b: &mut ModuleBuilder<'_>,
        desc: &BufferDescriptor,
        binding: &PortBinding,
        sink: &DiagnosticSink,
    ) -> Result<LoweredBuffer, PlatformError> {
        IoLowering::new(self.profile(), sink).lower(b, desc, binding)
    }

    fn check_requestable(
        &self,
        b: &ModuleBuilder<'_>,
        name: &str,
    ) -> Result<ResolvedResource, PlatformError> {
        let resource = resolve_resource(&self.config, name)?;
        let port_names = match &resource.pins {
            ResolvedPins::SingleEnded(_) => vec![name.to_string()],
            ResolvedPins::Differential { .. } => vec![format!("{name}_p"), format!("{name}_n")],
        };
        let interner = b.interner();
        if port_names
            .iter()
            .any(|port| b.module().signal_named(interner, port).is_some())
        {
            return Err(PlatformError::invalid(
                "resource",
                name,
                "already requested",
            ));
        }
        Ok(resource)
    }

    fn bring_in_defaults(
        &self,
        b: &mut ModuleBuilder<'_>,
        clk_resource: Option<&str>,
        rst_resource: Option<&str>,
        sink: &DiagnosticSink,
    ) -> Result<PorInputs, PlatformError> {
        let mut inputs = PorInputs::default();
        if let Some(resource) = clk_resource {
            let clk = self.bring_in(b, resource, "clk_buf", "clk_in", sink)?;
            inputs.clock = Some(clk.into());
        }
        if let Some(resource) = rst_resource {
            let rst = self.bring_in(b, resource, "rst_buf", "rst_in", sink)?;
            inputs.reset = Some(rst.into());
        }
        Ok(inputs)
    }

    /// Requests a one-bit resource and lowers it as an unregistered input.
    fn bring_in(
        &self,
        b: &mut ModuleBuilder<'_>,
        resource: &str,
        buffer: &str,
        wire: &str,
        sink: &DiagnosticSink,
    ) -> Result<SignalId, PlatformError> {
        let port = self.request(b, resource)?;
        let dest = b.add_wire(wire, 1);
        let desc = BufferDescriptor::new(
            buffer,
            Direction::Input,
            RegistrationMode::Combinational,
            port.binding.topology(),
            1,
        )
        .with_invert(port.invert)
        .with_input(None, vec![dest]);
        self.get_io_buffer(b, &desc, &port.binding, sink)?;
        Ok(dest)
    }
}

/// Converts a pin attribute. Only scalars can become cell parameters.
fn attr_const(key: &str, value: &toml::Value) -> Result<ConstValue, PlatformError> {
    match value {
        toml::Value::Boolean(v) => Ok(ConstValue::Bool(*v)),
        toml::Value::Integer(v) => Ok(ConstValue::Int(*v)),
        toml::Value::Float(v) => Ok(ConstValue::Real(*v)),
        toml::Value::String(v) => Ok(ConstValue::String(v.clone())),
        other => Err(PlatformError::type_error(
            format!("a scalar value for pin attribute '{key}'"),
            other.type_str(),
        )),
    }
}

/// Converts a value that is checked later and reported as written.
fn raw_const(value: &toml::Value) -> ConstValue {
    match value {
        toml::Value::Boolean(v) => ConstValue::Bool(*v),
        toml::Value::Integer(v) => ConstValue::Int(*v),
        toml::Value::Float(v) => ConstValue::Real(*v),
        toml::Value::String(v) => ConstValue::String(v.clone()),
        other => ConstValue::String(other.to_string()),
    }
}
