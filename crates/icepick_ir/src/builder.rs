//! The mutable module builder that lowering passes emit into.

use crate::cell::{Cell, CellKind, Connection, Instance, Param, RESET_SYNC_ARST, RESET_SYNC_RST};
use crate::expr::Expr;
use crate::ids::{CellId, ClockDomainId, SignalId};
use crate::module::{Assignment, ClockDomain, Edge, Module, Update};
use crate::port::{Port, PortDirection};
use crate::signal::{Signal, SignalKind, SignalRef};
use icepick_common::Interner;

/// Errors raised by the builder's capability checks and lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// No domain with this name exists.
    #[error("unknown clock domain '{0}'")]
    UnknownDomain(String),

    /// A domain with this name already exists.
    #[error("clock domain '{0}' is already defined")]
    DuplicateDomain(String),

    /// The domain is not clocked on the rising edge.
    #[error("clock domain '{0}' is not clocked on the rising edge")]
    NotPosedge(String),

    /// A reset was requested from a reset-less domain.
    #[error("clock domain '{0}' has no reset")]
    ResetLess(String),
}

/// Declaration of a new clock domain.
#[derive(Debug, Clone)]
pub struct DomainSpec {
    /// Domain name.
    pub name: String,
    /// Whether the domain has no reset signal.
    pub reset_less: bool,
    /// Whether the domain is private to this module.
    pub local: bool,
    /// Active edge.
    pub edge: Edge,
}

impl DomainSpec {
    /// A rising-edge domain with a reset, visible to submodules.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reset_less: false,
            local: false,
            edge: Edge::Posedge,
        }
    }

    /// Marks the domain reset-less.
    pub fn reset_less(mut self) -> Self {
        self.reset_less = true;
        self
    }

    /// Marks the domain local.
    pub fn local(mut self) -> Self {
        self.local = true;
        self
    }

    /// Sets the active edge.
    pub fn edge(mut self, edge: Edge) -> Self {
        self.edge = edge;
        self
    }
}

/// Builds a [`Module`] one signal, cell, and assignment at a time.
///
/// Insertion is append-only with no rollback. A lowering pass that fails
/// partway leaves what it already emitted in place, so passes validate
/// before emitting.
pub struct ModuleBuilder<'a> {
    interner: &'a Interner,
    module: Module,
}

impl<'a> ModuleBuilder<'a> {
    /// Starts an empty module.
    pub fn new(interner: &'a Interner, name: &str) -> Self {
        Self {
            interner,
            module: Module::new(interner.get_or_intern(name)),
        }
    }

    /// The interner names are stored in.
    pub fn interner(&self) -> &'a Interner {
        self.interner
    }

    /// The module built so far.
    pub fn module(&self) -> &Module {
        &self.module
    }

    /// Finishes building.
    pub fn finish(self) -> Module {
        self.module
    }

    /// Allocates a signal.
    pub fn add_signal(&mut self, name: &str, width: u32, kind: SignalKind) -> SignalId {
        let id = self.module.signals.next_id();
        self.module.signals.alloc(Signal {
            id,
            name: self.interner.get_or_intern(name),
            width,
            kind,
            domain: None,
        })
    }

    /// Allocates a wire.
    pub fn add_wire(&mut self, name: &str, width: u32) -> SignalId {
        self.add_signal(name, width, SignalKind::Wire)
    }

    /// Allocates a register clocked by `domain`. Registers start at zero.
    pub fn add_reg(&mut self, name: &str, width: u32, domain: ClockDomainId) -> SignalId {
        let id = self.module.signals.next_id();
        self.module.signals.alloc(Signal {
            id,
            name: self.interner.get_or_intern(name),
            width,
            kind: SignalKind::Reg,
            domain: Some(domain),
        })
    }

    /// Allocates a top-level port and its signal.
    pub fn add_port(&mut self, name: &str, width: u32, direction: PortDirection) -> SignalId {
        let signal = self.add_signal(name, width, SignalKind::Port);
        self.module.ports.push(Port {
            name: self.interner.get_or_intern(name),
            direction,
            signal,
        });
        signal
    }

    /// Width of a signal.
    pub fn signal_width(&self, id: SignalId) -> u32 {
        self.module.signals[id].width
    }

    /// Width of a reference.
    pub fn ref_width(&self, r: &SignalRef) -> u32 {
        match r {
            SignalRef::Signal(id) => self.signal_width(*id),
            SignalRef::Bit { .. } => 1,
            SignalRef::Const(bits) => bits.width(),
        }
    }

    /// Declares a clock domain, allocating `<name>_clk` and, unless
    /// reset-less, `<name>_rst`.
    pub fn add_domain(&mut self, spec: DomainSpec) -> Result<ClockDomainId, BuildError> {
        if self.domain(&spec.name).is_some() {
            return Err(BuildError::DuplicateDomain(spec.name));
        }
        let clock = self.add_wire(&format!("{}_clk", spec.name), 1);
        let reset = (!spec.reset_less).then(|| self.add_wire(&format!("{}_rst", spec.name), 1));
        let id = self.module.domains.next_id();
        Ok(self.module.domains.alloc(ClockDomain {
            id,
            name: self.interner.get_or_intern(&spec.name),
            clock,
            reset,
            local: spec.local,
            edge: spec.edge,
        }))
    }

    /// Looks up a domain by name.
    pub fn domain(&self, name: &str) -> Option<ClockDomainId> {
        let name = self.interner.get(name)?;
        self.module
            .domains
            .values()
            .find(|d| d.name == name)
            .map(|d| d.id)
    }

    /// Looks up a domain by name, failing if absent.
    pub fn require_domain(&self, name: &str) -> Result<ClockDomainId, BuildError> {
        self.domain(name)
            .ok_or_else(|| BuildError::UnknownDomain(name.to_string()))
    }

    /// Name of a domain.
    pub fn domain_name(&self, domain: ClockDomainId) -> &'a str {
        self.interner.resolve(self.module.domains[domain].name)
    }

    /// Clock signal of a domain.
    pub fn clock_of(&self, domain: ClockDomainId) -> SignalId {
        self.module.domains[domain].clock
    }

    /// Reset signal of a domain.
    pub fn reset_of(&self, domain: ClockDomainId) -> Result<SignalId, BuildError> {
        self.module.domains[domain]
            .reset
            .ok_or_else(|| BuildError::ResetLess(self.domain_name(domain).to_string()))
    }

    /// Checks that a domain is clocked on the rising edge.
    pub fn require_posedge(&self, domain: ClockDomainId) -> Result<(), BuildError> {
        match self.module.domains[domain].edge {
            Edge::Posedge => Ok(()),
            Edge::Negedge => Err(BuildError::NotPosedge(self.domain_name(domain).to_string())),
        }
    }

    /// Adds a combinational assignment.
    pub fn comb(&mut self, target: impl Into<SignalRef>, value: impl Into<Expr>) {
        self.module.comb.push(Assignment {
            target: target.into(),
            value: value.into(),
        });
    }

    /// Adds a register update on `domain`.
    pub fn sync(&mut self, domain: ClockDomainId, target: SignalId, next: impl Into<Expr>) {
        self.module.sync.push(Update {
            domain,
            target,
            next: next.into(),
        });
    }

    /// Inserts a primitive instance.
    pub fn add_instance(&mut self, name: &str, inst: Instance) -> CellId {
        let type_name = self.interner.get_or_intern(inst.type_name());
        let params = inst
            .params
            .into_iter()
            .map(|(name, value)| Param {
                name: self.interner.get_or_intern(&name),
                value,
            })
            .collect();
        let connections = inst
            .connections
            .into_iter()
            .map(|(port, direction, signal)| Connection {
                port_name: self.interner.get_or_intern(&port),
                direction,
                signal,
            })
            .collect();
        self.push_cell(name, CellKind::Primitive { type_name }, params, connections)
    }

    /// Inserts a reset synchronizer driving `domain`'s reset from `arst`.
    pub fn add_reset_synchronizer(
        &mut self,
        name: &str,
        arst: SignalRef,
        domain: ClockDomainId,
        stages: u32,
    ) -> Result<CellId, BuildError> {
        let rst = self.reset_of(domain)?;
        let connections = vec![
            Connection {
                port_name: self.interner.get_or_intern(RESET_SYNC_ARST),
                direction: PortDirection::Input,
                signal: arst,
            },
            Connection {
                port_name: self.interner.get_or_intern(RESET_SYNC_RST),
                direction: PortDirection::Output,
                signal: SignalRef::Signal(rst),
            },
        ];
        Ok(self.push_cell(
            name,
            CellKind::ResetSynchronizer { domain, stages },
            Vec::new(),
            connections,
        ))
    }

    fn push_cell(
        &mut self,
        name: &str,
        kind: CellKind,
        params: Vec<Param>,
        connections: Vec<Connection>,
    ) -> CellId {
        let id = self.module.cells.next_id();
        self.module.cells.alloc(Cell {
            id,
            name: self.interner.get_or_intern(name),
            kind,
            params,
            connections,
        })
    }
}
