//! Netlist model for iCE40 lowering.
//!
//! This crate holds the module-builder side of the toolchain: signals,
//! vendor primitive cells, clock domains, combinational assignments and
//! per-domain register updates, plus the reset synchronizer component the
//! power-on-reset synthesizer routes through. [`ModuleBuilder`] is the
//! mutable entry point; [`Module`] is the finished, serializable netlist.
//! [`sim::Simulator`] evaluates a module cycle by cycle for tests.

#![warn(missing_docs)]

pub mod arena;
pub mod builder;
pub mod cell;
pub mod const_value;
pub mod expr;
pub mod ids;
pub mod module;
pub mod port;
pub mod signal;
pub mod sim;

pub use arena::{Arena, ArenaId};
pub use builder::{BuildError, DomainSpec, ModuleBuilder};
pub use cell::{Cell, CellKind, Connection, Instance, Param};
pub use const_value::ConstValue;
pub use expr::{BinaryOp, Expr, UnaryOp};
pub use ids::{CellId, ClockDomainId, SignalId};
pub use module::{Assignment, ClockDomain, Edge, Module, Update};
pub use port::{Port, PortDirection};
pub use signal::{Signal, SignalKind, SignalRef};
