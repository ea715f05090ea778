//! Finished modules and their clock domains.

use crate::arena::Arena;
use crate::cell::Cell;
use crate::expr::Expr;
use crate::ids::{CellId, ClockDomainId, SignalId};
use crate::port::Port;
use crate::signal::{Signal, SignalRef};
use icepick_common::{ContentHash, Ident, Interner};
use serde::{Deserialize, Serialize};

/// The active edge of a clock domain.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Edge {
    /// Rising edge. Registered iCE40 I/O paths only support this.
    Posedge,
    /// Falling edge.
    Negedge,
}

/// A clock domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockDomain {
    /// The domain's ID.
    pub id: ClockDomainId,
    /// The domain name.
    pub name: Ident,
    /// Clock signal.
    pub clock: SignalId,
    /// Reset signal, absent for reset-less domains.
    pub reset: Option<SignalId>,
    /// Visible only inside the module that declares it.
    pub local: bool,
    /// Active edge.
    pub edge: Edge,
}

impl ClockDomain {
    /// Returns `true` if the domain has no reset.
    pub fn is_reset_less(&self) -> bool {
        self.reset.is_none()
    }
}

/// A combinational assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// The driven signal or bit.
    pub target: SignalRef,
    /// The driving expression.
    pub value: Expr,
}

/// A register update taking effect on a domain's active edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    /// The clocking domain.
    pub domain: ClockDomainId,
    /// The register.
    pub target: SignalId,
    /// Next-state expression.
    pub next: Expr,
}

/// A finished netlist module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    /// Module name.
    pub name: Ident,
    /// Top-level ports.
    pub ports: Vec<Port>,
    /// All signals.
    pub signals: Arena<SignalId, Signal>,
    /// Primitive cells and reset synchronizers, in emission order.
    pub cells: Arena<CellId, Cell>,
    /// Clock domains.
    pub domains: Arena<ClockDomainId, ClockDomain>,
    /// Combinational assignments.
    pub comb: Vec<Assignment>,
    /// Register updates.
    pub sync: Vec<Update>,
}

impl Module {
    /// Creates an empty module.
    pub fn new(name: Ident) -> Self {
        Self {
            name,
            ports: Vec::new(),
            signals: Arena::new(),
            cells: Arena::new(),
            domains: Arena::new(),
            comb: Vec::new(),
            sync: Vec::new(),
        }
    }

    /// Primitive cells of the given type, in emission order.
    pub fn cells_of_type<'m>(&'m self, interner: &Interner, type_name: &str) -> Vec<&'m Cell> {
        let Some(ty) = interner.get(type_name) else {
            return Vec::new();
        };
        self.cells
            .values()
            .filter(|c| c.type_name() == Some(ty))
            .collect()
    }

    /// Looks up a cell by instance name.
    pub fn cell_named(&self, interner: &Interner, name: &str) -> Option<&Cell> {
        let name = interner.get(name)?;
        self.cells.values().find(|c| c.name == name)
    }

    /// Looks up a signal by name.
    pub fn signal_named(&self, interner: &Interner, name: &str) -> Option<&Signal> {
        let name = interner.get(name)?;
        self.signals.values().find(|s| s.name == name)
    }

    /// Looks up a clock domain by name.
    pub fn domain_named(&self, interner: &Interner, name: &str) -> Option<&ClockDomain> {
        let name = interner.get(name)?;
        self.domains.values().find(|d| d.name == name)
    }

    /// XXH3-128 digest of the serialized module.
    ///
    /// Interned names are hashed by index, so two modules compare equal only
    /// when built against interners fed the same names in the same order.
    pub fn fingerprint(&self) -> Result<ContentHash, serde_json::Error> {
        let bytes = serde_json::to_vec(self)?;
        Ok(ContentHash::from_bytes(&bytes))
    }
}
