//! How serious a diagnostic is.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a diagnostic. Later variants are more severe.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Severity {
    /// Informational context, e.g. which differential leg was instantiated.
    Note,
    /// Output was produced but may not behave as the user expects.
    Warning,
    /// Lowering could not proceed.
    Error,
}

impl Severity {
    /// The lowercase label used in rendered output.
    pub fn label(self) -> &'static str {
        match self {
            Severity::Note => "note",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }

    /// SGR color parameter for terminals: red, yellow or cyan.
    pub fn ansi_color(self) -> &'static str {
        match self {
            Severity::Note => "36",
            Severity::Warning => "33",
            Severity::Error => "31",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
