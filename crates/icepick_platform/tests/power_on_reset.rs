//! Behavioural tests for the synthesized power-on reset.

use icepick_arch::{load_profile, FamilyProfile};
use icepick_common::{Frequency, Interner};
use icepick_diagnostics::DiagnosticSink;
use icepick_ir::sim::Simulator;
use icepick_ir::{ConstValue, ModuleBuilder, PortDirection, SignalRef};
use icepick_platform::codes;
use icepick_platform::{
    DefaultClock, PlatformError, PorInputs, PorSource, PowerOnReset, ResetTimer,
};

fn up5k() -> Box<dyn FamilyProfile> {
    load_profile("iCE40UP5K", "SG48").unwrap()
}

fn hfosc(div: ConstValue) -> DefaultClock {
    DefaultClock::HighFrequencyOscillator {
        div_exponent: Some(div),
    }
}

#[test]
fn hfosc_ready_releases_exactly_after_delay() {
    let expected = [4800, 2400, 1200, 600];
    for (e, delay) in expected.into_iter().enumerate() {
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let profile = up5k();
        let mut b = ModuleBuilder::new(&interner, "top");
        let por = PowerOnReset::new(profile.as_ref(), hfosc(ConstValue::Int(e as i64)));
        let out = por
            .synthesize(&mut b, "sync", PorInputs::default(), &sink)
            .unwrap();
        assert_eq!(out.delay, delay, "div exponent {e}");
        let rst = b.reset_of(out.domain).unwrap();
        let m = b.finish();

        let timer = ResetTimer::new(delay);
        let mut sim = Simulator::new(&m, &interner);
        for edge in 0..delay + 4 {
            let ready = timer.state_after(edge).is_ready();
            assert_eq!(sim.get(out.ready) == 1, ready, "e={e} edge={edge}");
            assert_eq!(sim.get(rst) == 0, ready, "e={e} edge={edge}");
            sim.tick_all();
        }
    }
}

#[test]
fn hfosc_cell_encodes_the_divider() {
    let interner = Interner::new();
    let sink = DiagnosticSink::new();
    let profile = up5k();
    let mut b = ModuleBuilder::new(&interner, "top");
    let por = PowerOnReset::new(profile.as_ref(), hfosc(ConstValue::Int(1)));
    let out = por
        .synthesize(&mut b, "sync", PorInputs::default(), &sink)
        .unwrap();
    let m = b.finish();

    let osc = m.cells_of_type(&interner, "SB_HFOSC");
    assert_eq!(osc.len(), 1);
    let osc = osc[0];
    assert_eq!(
        osc.param(&interner, "CLKHF_DIV"),
        Some(&ConstValue::String("0b01".into()))
    );
    assert_eq!(
        osc.connection(&interner, "CLKHF").map(|c| c.signal.clone()),
        Some(SignalRef::Signal(out.clk))
    );
    assert_eq!(
        osc.connection(&interner, "CLKHFEN").map(|c| c.signal.clone()),
        Some(SignalRef::bit_const(true))
    );
    assert!(osc.connection(&interner, "CLKHFPU").is_some());

    let por_domain = m.domain_named(&interner, "por").unwrap();
    assert!(por_domain.is_reset_less());
    assert!(por_domain.local);
    assert!(!m.domain_named(&interner, "sync").unwrap().is_reset_less());
}

#[test]
fn invalid_divider_emits_nothing() {
    let bad = [
        Some(ConstValue::Int(4)),
        Some(ConstValue::Int(-1)),
        Some(ConstValue::Real(1.5)),
        Some(ConstValue::String("1".into())),
        None,
    ];
    for div in bad {
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let profile = up5k();
        let mut b = ModuleBuilder::new(&interner, "top");
        let por = PowerOnReset::new(
            profile.as_ref(),
            DefaultClock::HighFrequencyOscillator {
                div_exponent: div.clone(),
            },
        );
        let err = por
            .synthesize(&mut b, "sync", PorInputs::default(), &sink)
            .unwrap_err();
        match err {
            PlatformError::InvalidConfiguration { field, value, .. } => {
                assert_eq!(field, "hfosc_div");
                if let Some(div) = &div {
                    assert_eq!(value, div.to_string());
                }
            }
            other => panic!("{div:?}: unexpected {other}"),
        }
        let m = b.finish();
        assert!(m.cells.is_empty());
        assert!(m.signals.is_empty());
        assert!(m.domains.is_empty());
        assert!(sink.diagnostics().is_empty());
    }
}

#[test]
fn lfosc_holds_for_one_cycle() {
    let interner = Interner::new();
    let sink = DiagnosticSink::new();
    let profile = up5k();
    let mut b = ModuleBuilder::new(&interner, "top");
    let por = PowerOnReset::new(profile.as_ref(), DefaultClock::LowFrequencyOscillator);
    let plan = por.plan(&b, "sync").unwrap();
    assert_eq!(plan.source, PorSource::LowFrequencyOscillator);
    assert_eq!(plan.delay, 1);

    let out = por.emit(&mut b, &plan, "sync", PorInputs::default(), &sink).unwrap();
    let rst = b.reset_of(out.domain).unwrap();
    let m = b.finish();
    assert_eq!(m.cells_of_type(&interner, "SB_LFOSC").len(), 1);
    assert!(!sink.contains(codes::POR_SINGLE_CYCLE));

    let mut sim = Simulator::new(&m, &interner);
    assert_eq!(sim.get(rst), 1);
    sim.tick_all();
    assert_eq!(sim.get(rst), 0);
    sim.run(5);
    assert_eq!(sim.get(rst), 0);
}

#[test]
fn external_reset_goes_through_the_synchronizer() {
    let interner = Interner::new();
    let sink = DiagnosticSink::new();
    let profile = up5k();
    let mut b = ModuleBuilder::new(&interner, "top");
    let button = b.add_port("button", 1, PortDirection::Input);
    let por = PowerOnReset::new(profile.as_ref(), DefaultClock::LowFrequencyOscillator);
    let inputs = PorInputs {
        clock: None,
        reset: Some(button.into()),
    };
    let out = por.synthesize(&mut b, "sync", inputs, &sink).unwrap();
    let rst = b.reset_of(out.domain).unwrap();
    let m = b.finish();
    assert!(m.cell_named(&interner, "reset_sync").is_some());

    let mut sim = Simulator::new(&m, &interner);
    // Ready after one edge, then two synchronizer stages.
    for _ in 0..3 {
        assert_eq!(sim.get(rst), 1);
        sim.tick_all();
    }
    assert_eq!(sim.get(rst), 0);

    sim.set(button, 1);
    assert_eq!(sim.get(rst), 1, "asserts without waiting for a clock");
    sim.set(button, 0);
    sim.run(1);
    assert_eq!(sim.get(rst), 1);
    sim.run(1);
    assert_eq!(sim.get(rst), 0);
}

#[test]
fn slow_external_clock_warns() {
    let interner = Interner::new();
    let sink = DiagnosticSink::new();
    let profile = load_profile("iCE40HX1K", "VQ100").unwrap();
    let mut b = ModuleBuilder::new(&interner, "top");
    let clk = b.add_port("clk", 1, PortDirection::Input);
    let por = PowerOnReset::new(
        profile.as_ref(),
        DefaultClock::External {
            frequency: Frequency::from_khz(32.768),
        },
    );
    let inputs = PorInputs {
        clock: Some(clk.into()),
        reset: None,
    };
    let out = por.synthesize(&mut b, "sync", inputs, &sink).unwrap();
    assert_eq!(out.delay, 1);
    assert!(sink.contains(codes::POR_SINGLE_CYCLE));
    assert!(sink.contains(codes::POR_SUMMARY));
}

#[test]
fn oscillator_missing_on_device_is_unsupported() {
    let interner = Interner::new();
    let profile = load_profile("iCE40HX8K", "CT256").unwrap();
    let b = ModuleBuilder::new(&interner, "top");
    for clock in [hfosc(ConstValue::Int(0)), DefaultClock::LowFrequencyOscillator] {
        let err = PowerOnReset::new(profile.as_ref(), clock)
            .plan(&b, "sync")
            .unwrap_err();
        assert!(matches!(err, PlatformError::UnsupportedConfiguration { .. }));
    }
}

#[test]
fn existing_domains_are_not_replaced() {
    let interner = Interner::new();
    let sink = DiagnosticSink::new();
    let profile = up5k();
    let mut b = ModuleBuilder::new(&interner, "top");
    let por = PowerOnReset::new(profile.as_ref(), DefaultClock::LowFrequencyOscillator);
    por.synthesize(&mut b, "sync", PorInputs::default(), &sink)
        .unwrap();
    let cells = b.module().cells.len();

    let err = por
        .synthesize(&mut b, "sync", PorInputs::default(), &sink)
        .unwrap_err();
    assert!(matches!(err, PlatformError::InvalidConfiguration { .. }));
    let err = por
        .synthesize(&mut b, "por", PorInputs::default(), &sink)
        .unwrap_err();
    assert!(matches!(err, PlatformError::InvalidConfiguration { .. }));
    assert_eq!(b.module().cells.len(), cells);
}
