//! Stable diagnostic codes such as `E301` or `S102`.

use crate::severity::Severity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a code reports. Each category renders with its own prefix letter
/// and implies the severity its diagnostics are raised with.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// `E`: a buffer or domain was rejected.
    Error,
    /// `W`: lowering succeeded with a caveat.
    Warning,
    /// `S`: a synthesis report, e.g. the reset delay chosen.
    Synthesis,
}

impl Category {
    /// The prefix letter.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
            Category::Synthesis => 'S',
        }
    }

    /// The severity diagnostics of this category carry.
    pub fn severity(self) -> Severity {
        match self {
            Category::Error => Severity::Error,
            Category::Warning => Severity::Warning,
            Category::Synthesis => Severity::Note,
        }
    }
}

/// A category plus a three-digit number.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// What the code reports.
    pub category: Category,
    /// Number within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a code. Usable in `const` items.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }

    /// Shorthand for `self.category.severity()`.
    pub fn severity(self) -> Severity {
        self.category.severity()
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}
