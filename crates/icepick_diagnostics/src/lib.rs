//! Diagnostic records, severity levels, and rendering for the lowering passes.
//!
//! Lowering and reset synthesis report through a thread-safe
//! [`DiagnosticSink`] rather than a logging facade. Errors still propagate as
//! `Result`s; the sink carries notes and warnings that accompany a successful
//! lowering, and front ends can push converted errors into it as well.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
