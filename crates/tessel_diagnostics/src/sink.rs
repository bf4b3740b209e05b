//! Collects diagnostics from the mapping engines.

use crate::code::DiagnosticCode;
use crate::diagnostic::Diagnostic;
use crate::renderer::DiagnosticRenderer;
use crate::severity::Severity;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A thread-safe diagnostic accumulator.
///
/// Callers pass one sink through placement, routing, and verification, then
/// inspect or render what was reported. Counts per severity are kept
/// separately so `has_errors` never takes the lock.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
    counts: [AtomicUsize; 4],
}

impl DiagnosticSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Diagnostic>> {
        self.diagnostics.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records a diagnostic.
    pub fn emit(&self, diag: Diagnostic) {
        self.counts[diag.severity as usize].fetch_add(1, Ordering::Relaxed);
        self.lock().push(diag);
    }

    /// Number of diagnostics of one severity emitted so far, including any
    /// already taken.
    pub fn count(&self, severity: Severity) -> usize {
        self.counts[severity as usize].load(Ordering::Relaxed)
    }

    /// Returns `true` once any error has been emitted.
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Number of errors emitted so far.
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    /// Number of warnings emitted so far.
    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    /// Whether a diagnostic with `code` is currently held.
    pub fn contains_code(&self, code: DiagnosticCode) -> bool {
        self.lock().iter().any(|d| d.code == code)
    }

    /// Drains the held diagnostics. Counts are not reset.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.lock())
    }

    /// Copies the held diagnostics.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.lock().clone()
    }

    /// Renders the held diagnostics in emission order.
    pub fn render(&self, renderer: &dyn DiagnosticRenderer) -> String {
        renderer.render_all(&self.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::Category;
    use crate::renderer::TerminalRenderer;

    fn unplaceable() -> Diagnostic {
        Diagnostic::error(DiagnosticCode::new(Category::Placement, 101), "task `fir` has no legal location")
    }

    fn congested() -> Diagnostic {
        Diagnostic::warning(DiagnosticCode::new(Category::Routing, 2), "routing did not converge")
    }

    #[test]
    fn empty_sink() {
        let sink = DiagnosticSink::new();
        assert!(!sink.has_errors());
        assert_eq!(sink.count(Severity::Note), 0);
        assert!(sink.take_all().is_empty());
    }

    #[test]
    fn counts_by_severity() {
        let sink = DiagnosticSink::new();
        sink.emit(unplaceable());
        sink.emit(congested());
        sink.emit(congested());
        sink.emit(Diagnostic::note(DiagnosticCode::new(Category::Verify, 0), "mapping verified"));
        assert!(sink.has_errors());
        assert_eq!(sink.error_count(), 1);
        assert_eq!(sink.warning_count(), 2);
        assert_eq!(sink.count(Severity::Note), 1);
        assert_eq!(sink.diagnostics().len(), 4);
    }

    #[test]
    fn take_all_drains_but_keeps_counts() {
        let sink = DiagnosticSink::new();
        sink.emit(unplaceable());
        sink.emit(congested());
        assert!(sink.contains_code(DiagnosticCode::new(Category::Routing, 2)));
        assert_eq!(sink.take_all().len(), 2);
        assert!(sink.take_all().is_empty());
        assert!(!sink.contains_code(DiagnosticCode::new(Category::Routing, 2)));
        assert_eq!(sink.error_count(), 1);
    }

    #[test]
    fn renders_in_order() {
        let sink = DiagnosticSink::new();
        sink.emit(congested());
        sink.emit(unplaceable());
        let text = sink.render(&TerminalRenderer::new(false));
        let first = text.find("R002").unwrap();
        let second = text.find("P101").unwrap();
        assert!(first < second);
    }

    #[test]
    fn emit_from_worker_threads() {
        let sink = DiagnosticSink::new();
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..25 {
                        sink.emit(congested());
                    }
                });
            }
        });
        assert_eq!(sink.warning_count(), 100);
        assert_eq!(sink.diagnostics().len(), 100);
    }
}
