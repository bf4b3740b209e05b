//! Diagnostic codes.
//!
//! A code is the emitting engine's letter followed by three digits. Numbers
//! below 100 are run reports (statistics, non-fatal outcomes); numbers from
//! 100 up identify failures.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The engine that emitted a diagnostic.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Simulated annealing placement (`P`).
    Placement,
    /// Negotiated congestion routing (`R`).
    Routing,
    /// Mapping verification (`V`).
    Verify,
}

impl Category {
    /// Letter shown before the number.
    pub fn prefix(self) -> char {
        match self {
            Category::Placement => 'P',
            Category::Routing => 'R',
            Category::Verify => 'V',
        }
    }
}

/// Engine plus number, displayed as e.g. `R002`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// Emitting engine.
    pub category: Category,
    /// Number within the engine.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a code.
    pub fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }

    /// Whether the number lies in the failure range.
    pub fn is_failure(self) -> bool {
        self.number >= 100
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}
