//! Top-level ports and connection directions.

use crate::ids::SignalId;
use icepick_common::Ident;
use serde::{Deserialize, Serialize};

/// The direction of a port or a cell connection.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum PortDirection {
    /// Driven from outside.
    Input,
    /// Driven from inside.
    Output,
    /// Driven from either side; package pins are always `InOut`.
    InOut,
}

/// A top-level port of a module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Port {
    /// The port name.
    pub name: Ident,
    /// The port direction.
    pub direction: PortDirection,
    /// The signal carrying the port's value inside the module.
    pub signal: SignalId,
}
