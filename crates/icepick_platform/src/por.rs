//! Power-on reset and primary clock domain synthesis.
//!
//! iCE40 block RAM reads back as zero for roughly 3 µs after configuration
//! completes. The synthesized reset holds the primary domain until a fixed
//! window has passed, counted in cycles of the clock that drives it.

use crate::codes;
use crate::error::PlatformError;
use icepick_arch::FamilyProfile;
use icepick_common::{Bits, Frequency};
use icepick_diagnostics::{Diagnostic, DiagnosticSink};
use icepick_ir::{
    ClockDomainId, ConstValue, DomainSpec, Expr, Instance, ModuleBuilder, SignalId, SignalRef,
};

/// Name of the reset-less domain the timer runs in.
pub const POR_DOMAIN: &str = "por";

/// Window covered when an on-chip oscillator drives the domain. Includes
/// the oscillator's own start-up time.
pub const OSCILLATOR_WINDOW_MICROS: u32 = 100;

/// Window covered when an external clock drives the domain.
pub const EXTERNAL_WINDOW_MICROS: u32 = 15;

/// Stages in the synchronizer between the combined reset and the domain.
pub const RESET_SYNC_STAGES: u32 = 2;

/// The configured default clock.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultClock {
    /// `SB_HFOSC`. The divider exponent is kept as written so a bad value
    /// can be reported verbatim.
    HighFrequencyOscillator {
        /// Divider exponent, `0..=3` when valid.
        div_exponent: Option<ConstValue>,
    },
    /// `SB_LFOSC`.
    LowFrequencyOscillator,
    /// A clock brought in from a pin.
    External {
        /// Declared nominal frequency.
        frequency: Frequency,
    },
}

/// A validated clock source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PorSource {
    /// `SB_HFOSC` with a checked divider exponent.
    HighFrequencyOscillator {
        /// Divider exponent.
        div_exponent: u32,
    },
    /// `SB_LFOSC`.
    LowFrequencyOscillator,
    /// An external clock.
    External,
}

/// Everything about a reset that can be decided before emitting logic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PorPlan {
    /// The clock source.
    pub source: PorSource,
    /// Frequency of `clk_i`.
    pub frequency: Frequency,
    /// Cycles the reset is held for.
    pub delay: u64,
}

impl PorPlan {
    /// The timer state machine for this plan.
    pub fn timer(&self) -> ResetTimer {
        ResetTimer::new(self.delay)
    }
}

/// State of the reset timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResetTimerState {
    /// `n` clock edges have elapsed.
    Counting(u64),
    /// The window has elapsed. Terminal.
    Ready,
}

impl ResetTimerState {
    /// Returns `true` once the window has elapsed.
    pub fn is_ready(self) -> bool {
        self == ResetTimerState::Ready
    }
}

/// The reset timer as a two-state machine.
///
/// The emitted logic implements the same transitions: a `timer` register
/// counting up from zero and a `ready` register latched when the count
/// reaches the delay. Nothing ever leaves [`ResetTimerState::Ready`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetTimer {
    delay: u64,
}

impl ResetTimer {
    /// A timer that becomes ready after `delay` clock edges.
    pub fn new(delay: u64) -> Self {
        Self { delay }
    }

    /// Cycles until ready.
    pub fn delay(&self) -> u64 {
        self.delay
    }

    /// State before the first clock edge.
    pub fn initial(&self) -> ResetTimerState {
        if self.delay == 0 {
            ResetTimerState::Ready
        } else {
            ResetTimerState::Counting(0)
        }
    }

    /// State after one more clock edge.
    pub fn next(&self, state: ResetTimerState) -> ResetTimerState {
        match state {
            ResetTimerState::Ready => ResetTimerState::Ready,
            ResetTimerState::Counting(n) if n + 1 >= self.delay => ResetTimerState::Ready,
            ResetTimerState::Counting(n) => ResetTimerState::Counting(n + 1),
        }
    }

    /// State after `edges` clock edges.
    pub fn state_after(&self, edges: u64) -> ResetTimerState {
        if edges >= self.delay {
            ResetTimerState::Ready
        } else {
            ResetTimerState::Counting(edges)
        }
    }

    /// Width of the `timer` register. The count saturates at the delay
    /// itself, so the register must hold it.
    pub fn timer_width(&self) -> u32 {
        (u64::BITS - self.delay.leading_zeros()).max(1)
    }
}

/// Signals driven from outside the synthesizer.
#[derive(Debug, Clone, Default)]
pub struct PorInputs {
    /// The external clock, for [`DefaultClock::External`].
    pub clock: Option<SignalRef>,
    /// An external reset combined with the timer.
    pub reset: Option<SignalRef>,
}

/// Handles to what the synthesizer built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PorDomain {
    /// The primary domain.
    pub domain: ClockDomainId,
    /// The reset-less timer domain.
    pub por: ClockDomainId,
    /// The clock driving both domains.
    pub clk: SignalId,
    /// Latched once the window has elapsed.
    pub ready: SignalId,
    /// The saturating counter.
    pub timer: SignalId,
    /// Cycles the reset is held for.
    pub delay: u64,
}

/// The reset and clock domain synthesizer.
pub struct PowerOnReset<'a> {
    profile: &'a dyn FamilyProfile,
    clock: DefaultClock,
}

impl<'a> PowerOnReset<'a> {
    /// Creates a synthesizer for a default clock.
    pub fn new(profile: &'a dyn FamilyProfile, clock: DefaultClock) -> Self {
        Self { profile, clock }
    }

    /// The default clock.
    pub fn clock(&self) -> &DefaultClock {
        &self.clock
    }

    /// Frequency of the clock the domain will run from.
    pub fn frequency(&self) -> Result<Frequency, PlatformError> {
        self.resolve_source().map(|(_, frequency, _)| frequency)
    }

    fn resolve_source(&self) -> Result<(PorSource, Frequency, u32), PlatformError> {
        let catalog = self.profile.catalog();
        let resolved = match &self.clock {
            DefaultClock::HighFrequencyOscillator { div_exponent } => {
                let osc = self.profile.high_frequency_oscillator().ok_or_else(|| {
                    PlatformError::unsupported(format!(
                        "{} has no {}",
                        self.profile.device_name(),
                        catalog.hfosc.type_name
                    ))
                })?;
                let reason = format!(
                    "must be an integer between 0 and {}",
                    osc.max_div_exponent
                );
                let Some(value) = div_exponent else {
                    return Err(PlatformError::invalid("hfosc_div", "<missing>", reason));
                };
                let (exponent, frequency) = value
                    .as_int()
                    .and_then(|e| u32::try_from(e).ok())
                    .and_then(|e| osc.frequency(e).map(|f| (e, f)))
                    .ok_or_else(|| PlatformError::invalid("hfosc_div", value, reason))?;
                (
                    PorSource::HighFrequencyOscillator {
                        div_exponent: exponent,
                    },
                    frequency,
                    OSCILLATOR_WINDOW_MICROS,
                )
            }
            DefaultClock::LowFrequencyOscillator => {
                let frequency = self.profile.low_frequency_oscillator().ok_or_else(|| {
                    PlatformError::unsupported(format!(
                        "{} has no {}",
                        self.profile.device_name(),
                        catalog.lfosc.type_name
                    ))
                })?;
                (
                    PorSource::LowFrequencyOscillator,
                    frequency,
                    OSCILLATOR_WINDOW_MICROS,
                )
            }
            DefaultClock::External { frequency } => {
                if !frequency.is_valid() {
                    return Err(PlatformError::invalid(
                        "frequency",
                        frequency,
                        "the default clock must have a positive frequency",
                    ));
                }
                (PorSource::External, *frequency, EXTERNAL_WINDOW_MICROS)
            }
        };
        Ok(resolved)
    }

    /// Validates the clock source and computes the delay without touching
    /// the module.
    pub fn plan(&self, b: &ModuleBuilder<'_>, domain: &str) -> Result<PorPlan, PlatformError> {
        let (source, frequency, window) = self.resolve_source()?;

        for name in [domain, POR_DOMAIN] {
            if b.domain(name).is_some() {
                return Err(PlatformError::invalid(
                    "domain",
                    name,
                    "clock domain already exists",
                ));
            }
        }
        if domain == POR_DOMAIN {
            return Err(PlatformError::invalid(
                "domain",
                domain,
                "name is reserved for the power-on reset timer",
            ));
        }

        Ok(PorPlan {
            source,
            frequency,
            delay: frequency.cycles_for_micros(window),
        })
    }

    /// Plans and emits the primary domain `domain` with its power-on reset.
    pub fn synthesize(
        &self,
        b: &mut ModuleBuilder<'_>,
        domain: &str,
        inputs: PorInputs,
        sink: &DiagnosticSink,
    ) -> Result<PorDomain, PlatformError> {
        let plan = self.plan(b, domain)?;
        self.emit(b, &plan, domain, inputs, sink)
    }

    /// Emits the logic for a plan.
    pub fn emit(
        &self,
        b: &mut ModuleBuilder<'_>,
        plan: &PorPlan,
        domain: &str,
        inputs: PorInputs,
        sink: &DiagnosticSink,
    ) -> Result<PorDomain, PlatformError> {
        let external = match (plan.source, &inputs.clock) {
            (PorSource::External, None) => {
                return Err(PlatformError::type_error(
                    "a clock signal for an external default clock",
                    "none",
                ));
            }
            (PorSource::External, Some(clock)) => Some(clock.clone()),
            _ => None,
        };
        for input in [&external, &inputs.reset].into_iter().flatten() {
            let width = b.ref_width(input);
            if width != 1 {
                return Err(PlatformError::type_error(
                    "a 1-bit clock or reset",
                    format!("{width} bits"),
                ));
            }
        }

        let catalog = self.profile.catalog();
        let high = SignalRef::bit_const(true);
        let clk_i = b.add_wire("clk_i", 1);
        let source_name = match plan.source {
            PorSource::HighFrequencyOscillator { div_exponent } => {
                let osc = &catalog.hfosc;
                let mut inst = Instance::new(osc.type_name);
                if let Some(param) = osc.divider_param {
                    let div = Bits::from_u64(u64::from(div_exponent), 2);
                    inst = inst.param(param, ConstValue::String(div.to_binary_literal()));
                }
                inst = inst
                    .input(osc.enable, high.clone())
                    .input(osc.power_up, high.clone())
                    .output(osc.output, clk_i.into());
                b.add_instance("hfosc", inst);
                osc.type_name.to_string()
            }
            PorSource::LowFrequencyOscillator => {
                let osc = &catalog.lfosc;
                let inst = Instance::new(osc.type_name)
                    .input(osc.enable, high.clone())
                    .input(osc.power_up, high)
                    .output(osc.output, clk_i.into());
                b.add_instance("lfosc", inst);
                osc.type_name.to_string()
            }
            PorSource::External => {
                if let Some(clock) = external {
                    b.comb(clk_i, clock);
                }
                "external clock".to_string()
            }
        };

        let timer = plan.timer();
        let width = timer.timer_width();
        let por = b.add_domain(DomainSpec::new(POR_DOMAIN).reset_less().local())?;
        let por_clk = b.clock_of(por);
        b.comb(por_clk, clk_i);

        let count = b.add_reg("timer", width, por);
        let ready = b.add_reg("ready", 1, por);
        let last = Expr::constant(Bits::from_u64(plan.delay.saturating_sub(1), width));
        b.sync(
            por,
            ready,
            Expr::signal(ready) | Expr::equals(Expr::signal(count), last),
        );
        b.sync(
            por,
            count,
            Expr::mux(
                Expr::signal(ready),
                Expr::signal(count),
                Expr::sum(Expr::signal(count), Expr::constant(Bits::from_u64(1, width))),
            ),
        );

        let primary = b.add_domain(DomainSpec::new(domain))?;
        let primary_clk = b.clock_of(primary);
        b.comb(primary_clk, clk_i);
        match &inputs.reset {
            Some(rst) => {
                let arst = b.add_wire("por_arst", 1);
                b.comb(arst, !Expr::signal(ready) | Expr::from(rst.clone()));
                b.add_reset_synchronizer("reset_sync", arst.into(), primary, RESET_SYNC_STAGES)?;
            }
            None => {
                let rst = b.reset_of(primary)?;
                b.comb(rst, !Expr::signal(ready));
            }
        }

        if plan.source == PorSource::External && plan.delay <= 1 {
            sink.emit(
                Diagnostic::warning(
                    codes::POR_SINGLE_CYCLE,
                    format!(
                        "default clock at {} is too slow to count a {EXTERNAL_WINDOW_MICROS} µs window",
                        plan.frequency
                    ),
                )
                .with_note("the reset is held for one clock period instead"),
            );
        }
        let mut summary = Diagnostic::note(
            codes::POR_SUMMARY,
            format!(
                "domain '{domain}' held in reset for {} cycles of {source_name} at {}",
                plan.delay, plan.frequency
            ),
        );
        if inputs.reset.is_some() {
            summary = summary.with_note("combined with the external reset through a synchronizer");
        }
        sink.emit(summary);

        Ok(PorDomain {
            domain: primary,
            por,
            clk: clk_i,
            ready,
            timer: count,
            delay: plan.delay,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use icepick_arch::load_profile;
    use icepick_common::Interner;
    use icepick_ir::sim::Simulator;
    use icepick_ir::PortDirection;

    #[test]
    fn timer_transitions() {
        let t = ResetTimer::new(3);
        let mut s = t.initial();
        assert_eq!(s, ResetTimerState::Counting(0));
        s = t.next(s);
        assert_eq!(s, ResetTimerState::Counting(1));
        s = t.next(s);
        assert_eq!(s, ResetTimerState::Counting(2));
        s = t.next(s);
        assert_eq!(s, ResetTimerState::Ready);
        assert_eq!(t.next(s), ResetTimerState::Ready);
    }

    #[test]
    fn timer_state_after_matches_stepping() {
        let t = ResetTimer::new(5);
        let mut s = t.initial();
        for k in 0..12 {
            assert_eq!(t.state_after(k), s, "after {k} edges");
            s = t.next(s);
        }
    }

    #[test]
    fn timer_width_holds_the_delay() {
        assert_eq!(ResetTimer::new(1).timer_width(), 1);
        assert_eq!(ResetTimer::new(180).timer_width(), 8);
        assert_eq!(ResetTimer::new(4800).timer_width(), 13);
        assert_eq!(ResetTimer::new(600).timer_width(), 10);
    }

    #[test]
    fn zero_delay_is_ready_immediately() {
        assert!(ResetTimer::new(0).initial().is_ready());
    }

    #[test]
    fn external_clock_delay() {
        let interner = Interner::new();
        let profile = load_profile("iCE40HX8K", "CT256").unwrap();
        let b = ModuleBuilder::new(&interner, "top");
        let por = PowerOnReset::new(
            profile.as_ref(),
            DefaultClock::External {
                frequency: Frequency::from_mhz(12.0),
            },
        );
        let plan = por.plan(&b, "sync").unwrap();
        assert_eq!(plan.source, PorSource::External);
        assert_eq!(plan.delay, 180);
    }

    #[test]
    fn external_clock_needs_a_signal() {
        let interner = Interner::new();
        let profile = load_profile("iCE40HX8K", "CT256").unwrap();
        let sink = DiagnosticSink::new();
        let mut b = ModuleBuilder::new(&interner, "top");
        let por = PowerOnReset::new(
            profile.as_ref(),
            DefaultClock::External {
                frequency: Frequency::from_mhz(12.0),
            },
        );
        let err = por
            .synthesize(&mut b, "sync", PorInputs::default(), &sink)
            .unwrap_err();
        assert!(matches!(err, PlatformError::TypeError { .. }));
        assert!(b.module().cells.is_empty());
        assert!(b.module().signals.is_empty());
    }

    #[test]
    fn reset_less_primary_tracks_ready() {
        let interner = Interner::new();
        let profile = load_profile("iCE40HX8K", "CT256").unwrap();
        let sink = DiagnosticSink::new();
        let mut b = ModuleBuilder::new(&interner, "top");
        let clk = b.add_port("clk", 1, PortDirection::Input);
        let por = PowerOnReset::new(
            profile.as_ref(),
            DefaultClock::External {
                frequency: Frequency::from_khz(400.0),
            },
        );
        let inputs = PorInputs {
            clock: Some(clk.into()),
            reset: None,
        };
        let out = por.synthesize(&mut b, "sync", inputs, &sink).unwrap();
        assert_eq!(out.delay, 6);
        let rst = b.reset_of(out.domain).unwrap();
        let m = b.finish();

        let mut sim = Simulator::new(&m, &interner);
        for _ in 0..6 {
            assert_eq!(sim.get(rst), 1);
            sim.tick_all();
        }
        assert_eq!(sim.get(rst), 0);
        assert_eq!(sim.get(out.timer), 6);
        sim.run(10);
        assert_eq!(sim.get(rst), 0);
        assert_eq!(sim.get(out.timer), 6);
        assert!(sink.contains(codes::POR_SUMMARY));
        assert!(!sink.contains(codes::POR_SINGLE_CYCLE));
    }
}
