//! Diagnostic rendering backends for human-readable output.

use crate::diagnostic::Diagnostic;

/// Trait for rendering diagnostics into formatted output strings.
pub trait DiagnosticRenderer {
    /// Renders a single diagnostic into a formatted string.
    fn render(&self, diag: &Diagnostic) -> String;

    /// Renders a batch of diagnostics, one after another.
    fn render_all(&self, diags: &[Diagnostic]) -> String {
        diags.iter().map(|d| self.render(d)).collect()
    }
}

/// Renders diagnostics in a rustc-style terminal format.
///
/// Produces output like:
/// ```text
/// warning[R002]: routing did not converge after 50 iterations
///   --> channel 7
///    = note: 2 resources over capacity
///    = help: re-run placement with a different seed
/// ```
pub struct TerminalRenderer {
    /// Whether to use ANSI color codes in output.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, text: String, diag: &Diagnostic) -> String {
        if !self.color {
            return text;
        }
        let ansi = diag.severity.ansi_color();
        format!("\x1b[1;{ansi}m{text}\x1b[0m")
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic) -> String {
        let mut out = String::new();

        let header = format!("{}[{}]", diag.severity, diag.code);
        out.push_str(&self.paint(header, diag));
        out.push_str(&format!(": {}\n", diag.message));

        if let Some(subject) = &diag.subject {
            out.push_str(&format!("  --> {subject}\n"));
        }
        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }
        for help in &diag.help {
            out.push_str(&format!("   = help: {help}\n"));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{Category, DiagnosticCode};

    #[test]
    fn render_error_with_subject() {
        let code = DiagnosticCode::new(Category::Routing, 1);
        let diag = Diagnostic::error(code, "channel has no legal start port")
            .with_subject("edge 3 (a -> b)");

        let output = TerminalRenderer::new(false).render(&diag);

        assert!(output.contains("error[R001]: channel has no legal start port"));
        assert!(output.contains("--> edge 3 (a -> b)"));
    }

    #[test]
    fn render_warning_with_notes() {
        let code = DiagnosticCode::new(Category::Placement, 4);
        let diag = Diagnostic::warning(code, "annealing interrupted")
            .with_note("stopped after 12 update cycles")
            .with_help("resume with the returned state");

        let output = TerminalRenderer::new(false).render(&diag);

        assert!(output.contains("warning[P004]: annealing interrupted"));
        assert!(output.contains("= note: stopped after 12 update cycles"));
        assert!(output.contains("= help: resume with the returned state"));
        assert!(!output.contains("-->"));
    }

    #[test]
    fn color_wraps_header_only() {
        let code = DiagnosticCode::new(Category::Placement, 3);
        let diag = Diagnostic::note(code, "objective 12.0");
        let output = TerminalRenderer::new(true).render(&diag);
        assert!(output.starts_with("\x1b[1;36mnote[P003]\x1b[0m: objective 12.0"));
    }

    #[test]
    fn render_all_concatenates() {
        let code = DiagnosticCode::new(Category::Verify, 1);
        let diags = vec![
            Diagnostic::note(code, "first"),
            Diagnostic::note(code, "second"),
        ];
        let output = TerminalRenderer::new(false).render_all(&diags);
        assert_eq!(output.lines().count(), 2);
    }
}
