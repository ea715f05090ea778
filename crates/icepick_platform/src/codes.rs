//! Diagnostic codes emitted by the platform passes.

use icepick_diagnostics::{Category, DiagnosticCode};

/// A differential input was lowered through one leg of the pair.
pub const DIFFERENTIAL_SINGLE_LEG: DiagnosticCode = DiagnosticCode::new(Category::Synthesis, 101);

/// Summary of a synthesized power-on reset.
pub const POR_SUMMARY: DiagnosticCode = DiagnosticCode::new(Category::Synthesis, 102);

/// The power-on window is a single cycle of a slow external clock.
pub const POR_SINGLE_CYCLE: DiagnosticCode = DiagnosticCode::new(Category::Warning, 301);

/// A `GLOBAL` attribute on an output-only pin was ignored.
pub const GLOBAL_ON_OUTPUT: DiagnosticCode = DiagnosticCode::new(Category::Warning, 302);

/// [`PlatformError::InvalidConfiguration`](crate::PlatformError::InvalidConfiguration).
pub const INVALID_CONFIGURATION: DiagnosticCode = DiagnosticCode::new(Category::Error, 301);

/// [`PlatformError::UnsupportedConfiguration`](crate::PlatformError::UnsupportedConfiguration).
pub const UNSUPPORTED_CONFIGURATION: DiagnosticCode = DiagnosticCode::new(Category::Error, 302);

/// [`PlatformError::TypeError`](crate::PlatformError::TypeError).
pub const TYPE_ERROR: DiagnosticCode = DiagnosticCode::new(Category::Error, 303);

/// [`PlatformError::Config`](crate::PlatformError::Config).
pub const CONFIG_FILE: DiagnosticCode = DiagnosticCode::new(Category::Error, 304);
