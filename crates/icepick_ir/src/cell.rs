//! Cells: vendor primitive instances and the reset synchronizer.

use crate::const_value::ConstValue;
use crate::ids::{CellId, ClockDomainId};
use crate::port::PortDirection;
use crate::signal::SignalRef;
use icepick_common::{Ident, Interner};
use serde::{Deserialize, Serialize};

/// Input port of a [`CellKind::ResetSynchronizer`].
pub const RESET_SYNC_ARST: &str = "arst";

/// Output port of a [`CellKind::ResetSynchronizer`], the synchronized reset.
pub const RESET_SYNC_RST: &str = "rst";

/// What a cell is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellKind {
    /// A vendor primitive, e.g. `SB_IO`.
    Primitive {
        /// The primitive type name.
        type_name: Ident,
    },
    /// Asserts `rst` asynchronously while `arst` is high, and releases it
    /// after `stages` edges of `domain` once `arst` falls.
    ResetSynchronizer {
        /// The domain whose clock releases the reset.
        domain: ClockDomainId,
        /// Number of synchronizing flops.
        stages: u32,
    },
}

/// A named parameter binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    /// Parameter name.
    pub name: Ident,
    /// Bound value.
    pub value: ConstValue,
}

/// A direction-tagged port connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    /// Port name on the cell.
    pub port_name: Ident,
    /// Direction from the cell's point of view.
    pub direction: PortDirection,
    /// Connected signal.
    pub signal: SignalRef,
}

/// An emitted cell. Never mutated after insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// The cell's ID.
    pub id: CellId,
    /// Instance name.
    pub name: Ident,
    /// What the cell is.
    pub kind: CellKind,
    /// Parameters, in insertion order.
    pub params: Vec<Param>,
    /// Connections, in insertion order.
    pub connections: Vec<Connection>,
}

impl Cell {
    /// Returns the primitive type name, if this is a primitive.
    pub fn type_name(&self) -> Option<Ident> {
        match &self.kind {
            CellKind::Primitive { type_name } => Some(*type_name),
            CellKind::ResetSynchronizer { .. } => None,
        }
    }

    /// Looks up a parameter by name.
    pub fn param(&self, interner: &Interner, name: &str) -> Option<&ConstValue> {
        let name = interner.get(name)?;
        self.params.iter().find(|p| p.name == name).map(|p| &p.value)
    }

    /// Looks up a connection by port name.
    pub fn connection(&self, interner: &Interner, port: &str) -> Option<&Connection> {
        let port = interner.get(port)?;
        self.connections.iter().find(|c| c.port_name == port)
    }
}

/// A primitive instance under construction, inserted with
/// [`ModuleBuilder::add_instance`](crate::builder::ModuleBuilder::add_instance).
///
/// ```
/// # use icepick_ir::{Instance, ConstValue, SignalRef};
/// let inst = Instance::new("SB_HFOSC")
///     .param("CLKHF_DIV", ConstValue::String("0b01".into()))
///     .input("CLKHFEN", SignalRef::bit_const(true));
/// assert_eq!(inst.type_name(), "SB_HFOSC");
/// ```
#[derive(Debug, Clone)]
pub struct Instance {
    type_name: String,
    pub(crate) params: Vec<(String, ConstValue)>,
    pub(crate) connections: Vec<(String, PortDirection, SignalRef)>,
}

impl Instance {
    /// Starts an instance of the given primitive type.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            params: Vec::new(),
            connections: Vec::new(),
        }
    }

    /// The primitive type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Binds a parameter.
    pub fn param(mut self, name: impl Into<String>, value: ConstValue) -> Self {
        self.params.push((name.into(), value));
        self
    }

    /// Connects an input port.
    pub fn input(self, port: impl Into<String>, signal: SignalRef) -> Self {
        self.connect(port, PortDirection::Input, signal)
    }

    /// Connects an output port.
    pub fn output(self, port: impl Into<String>, signal: SignalRef) -> Self {
        self.connect(port, PortDirection::Output, signal)
    }

    /// Connects a bidirectional port.
    pub fn inout(self, port: impl Into<String>, signal: SignalRef) -> Self {
        self.connect(port, PortDirection::InOut, signal)
    }

    fn connect(mut self, port: impl Into<String>, dir: PortDirection, signal: SignalRef) -> Self {
        self.connections.push((port.into(), dir, signal));
        self
    }
}
