//! Diagnostic creation, severity management, and terminal rendering.
//!
//! Placement and routing report progress, run statistics, and failures as
//! structured [`Diagnostic`] values. The thread-safe [`DiagnosticSink`]
//! accumulates them for the caller, and [`TerminalRenderer`] formats them for
//! human consumption.

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
