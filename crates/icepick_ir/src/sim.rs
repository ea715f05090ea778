//! Two-state cycle simulator for finished modules.
//!
//! Evaluates combinational assignments to a fixed point and applies register
//! updates on demand. Vendor primitives are opaque; reset synchronizers are
//! modelled as a shift register of asserted stages. Values wider than 64 bits
//! are truncated.

use crate::cell::{CellKind, RESET_SYNC_ARST, RESET_SYNC_RST};
use crate::expr::{BinaryOp, Expr, UnaryOp};
use crate::ids::{ClockDomainId, SignalId};
use crate::module::Module;
use crate::signal::SignalRef;
use icepick_common::Interner;

fn mask(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

struct ResetSync {
    domain: ClockDomainId,
    stages: u32,
    arst: SignalRef,
    rst: SignalRef,
    /// One bit per stage; the top bit drives `rst`.
    state: u64,
}

/// A cycle-based simulator over a [`Module`].
///
/// Every signal starts at zero. Reset synchronizers start asserted.
pub struct Simulator<'m> {
    module: &'m Module,
    values: Vec<u64>,
    syncs: Vec<ResetSync>,
    cycle: u64,
}

impl<'m> Simulator<'m> {
    /// Creates a simulator and settles the initial state.
    pub fn new(module: &'m Module, interner: &Interner) -> Self {
        let syncs = module
            .cells
            .values()
            .filter_map(|cell| {
                let CellKind::ResetSynchronizer { domain, stages } = cell.kind else {
                    return None;
                };
                let arst = cell.connection(interner, RESET_SYNC_ARST)?;
                let rst = cell.connection(interner, RESET_SYNC_RST)?;
                let stages = stages.max(1);
                Some(ResetSync {
                    domain,
                    stages,
                    arst: arst.signal.clone(),
                    rst: rst.signal.clone(),
                    state: mask(stages),
                })
            })
            .collect();

        let mut sim = Self {
            module,
            values: vec![0; module.signals.len()],
            syncs,
            cycle: 0,
        };
        sim.settle();
        sim
    }

    /// Number of clock steps applied so far.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Drives a signal, typically an input port, and settles.
    pub fn set(&mut self, signal: SignalId, value: u64) {
        self.write(&SignalRef::Signal(signal), value);
        self.settle();
    }

    /// Current value of a signal.
    pub fn get(&self, signal: SignalId) -> u64 {
        self.values[signal.as_raw() as usize]
    }

    /// Current value of a reference.
    pub fn get_ref(&self, r: &SignalRef) -> u64 {
        match r {
            SignalRef::Signal(id) => self.get(*id),
            SignalRef::Bit { signal, index } => (self.get(*signal) >> index) & 1,
            SignalRef::Const(bits) => bits.to_u64().unwrap_or(0),
        }
    }

    /// Evaluates an expression against the current state.
    pub fn eval(&self, expr: &Expr) -> u64 {
        self.eval_sized(expr).0
    }

    /// Propagates combinational logic until nothing changes.
    pub fn settle(&mut self) {
        let module = self.module;
        let limit = module.comb.len() + self.syncs.len() + 2;
        for _ in 0..limit {
            let mut changed = false;
            for i in 0..self.syncs.len() {
                changed |= self.settle_sync(i);
            }
            for assign in &module.comb {
                let value = self.eval(&assign.value);
                changed |= self.write(&assign.target, value);
            }
            if !changed {
                break;
            }
        }
    }

    /// Applies one active edge of `domain`.
    pub fn tick(&mut self, domain: ClockDomainId) {
        self.step(|d| d == domain);
    }

    /// Applies one active edge of every domain at once, as when all domains
    /// share a clock.
    pub fn tick_all(&mut self) {
        self.step(|_| true);
    }

    /// Runs [`tick_all`](Self::tick_all) `n` times.
    pub fn run(&mut self, n: u64) {
        for _ in 0..n {
            self.tick_all();
        }
    }

    fn step(&mut self, clocked: impl Fn(ClockDomainId) -> bool) {
        self.settle();

        let next: Vec<(SignalId, u64)> = self
            .module
            .sync
            .iter()
            .filter(|u| clocked(u.domain))
            .map(|u| (u.target, self.eval(&u.next)))
            .collect();
        let shifted: Vec<Option<u64>> = self
            .syncs
            .iter()
            .map(|s| {
                clocked(s.domain).then(|| {
                    let arst = u64::from(self.get_ref(&s.arst) != 0);
                    ((s.state << 1) | arst) & mask(s.stages)
                })
            })
            .collect();

        for (target, value) in next {
            self.write(&SignalRef::Signal(target), value);
        }
        for (sync, state) in self.syncs.iter_mut().zip(shifted) {
            if let Some(state) = state {
                sync.state = state;
            }
        }

        self.cycle += 1;
        self.settle();
    }

    fn settle_sync(&mut self, index: usize) -> bool {
        let sync = &self.syncs[index];
        let asserted = self.get_ref(&sync.arst) != 0;
        let stages = sync.stages;
        let rst = sync.rst.clone();
        if asserted {
            self.syncs[index].state = mask(stages);
        }
        let out = (self.syncs[index].state >> (stages - 1)) & 1;
        self.write(&rst, out)
    }

    fn write(&mut self, target: &SignalRef, value: u64) -> bool {
        let (id, new) = match target {
            SignalRef::Signal(id) => (*id, value & mask(self.module.signals[*id].width)),
            SignalRef::Bit { signal, index } => {
                let old = self.get(*signal);
                let bit = 1u64 << index;
                let new = if value & 1 != 0 { old | bit } else { old & !bit };
                (*signal, new)
            }
            SignalRef::Const(_) => return false,
        };
        let slot = &mut self.values[id.as_raw() as usize];
        let changed = *slot != new;
        *slot = new;
        changed
    }

    fn eval_sized(&self, expr: &Expr) -> (u64, u32) {
        match expr {
            Expr::Ref(SignalRef::Signal(id)) => (self.get(*id), self.module.signals[*id].width),
            Expr::Ref(r @ SignalRef::Bit { .. }) => (self.get_ref(r), 1),
            Expr::Ref(r @ SignalRef::Const(bits)) => (self.get_ref(r), bits.width()),
            Expr::Unary {
                op: UnaryOp::Not,
                operand,
            } => {
                let (v, w) = self.eval_sized(operand);
                (!v & mask(w), w)
            }
            Expr::Binary { op, lhs, rhs } => {
                let (a, wa) = self.eval_sized(lhs);
                let (b, wb) = self.eval_sized(rhs);
                let w = wa.max(wb);
                match op {
                    BinaryOp::And => (a & b, w),
                    BinaryOp::Or => (a | b, w),
                    BinaryOp::Xor => (a ^ b, w),
                    BinaryOp::Add => (a.wrapping_add(b) & mask(w), w),
                    BinaryOp::Eq => (u64::from(a == b), 1),
                }
            }
            Expr::Mux {
                cond,
                if_true,
                if_false,
            } => {
                let (t, wt) = self.eval_sized(if_true);
                let (f, wf) = self.eval_sized(if_false);
                let v = if self.eval(cond) != 0 { t } else { f };
                (v, wt.max(wf))
            }
        }
    }
}
