use ariadne::{Color, Label, Report, ReportKind, Source};
use std::fmt;

/// A syntax diagnostic with source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Byte range of the offending input.
    pub span: std::ops::Range<usize>,
    /// Human-readable description.
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic for the given span.
    pub fn new(span: std::ops::Range<usize>, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (at {}..{})",
            self.message, self.span.start, self.span.end
        )
    }
}

/// Render diagnostics against the expression text using ariadne.
///
/// `label` names the source in the report header, e.g. the binding it came
/// from (`Customer.sale.amount`).
pub fn render_diagnostics(source: &str, label: &str, diagnostics: &[Diagnostic]) -> String {
    let mut output = Vec::new();

    for diag in diagnostics {
        let span = (label, diag.span.clone());
        Report::build(ReportKind::Error, span.clone())
            .with_message(&diag.message)
            .with_label(
                Label::new(span)
                    .with_message(&diag.message)
                    .with_color(Color::Red),
            )
            .finish()
            .write((label, Source::from(source)), &mut output)
            .ok();
    }

    String::from_utf8(output).unwrap_or_default()
}
