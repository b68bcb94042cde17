//! The diagnostic sink contract.
//!
//! The core never opens a terminal; it reports through an injected
//! [`DiagnosticSink`]. `CollectingSink` is the in-memory implementation used
//! by this workspace's own test suites, not a rendering backend.

use serde::{Deserialize, Serialize};

/// A source location: filename plus line/col, with an optional token for
/// "did you mean" hints and similar annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub filename: String,
    pub line: u32,
    pub col: u32,
    pub token: Option<String>,
}

impl Span {
    pub fn new(filename: impl Into<String>, line: u32, col: u32) -> Self {
        Span {
            filename: filename.into(),
            line,
            col,
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

/// One reported diagnostic, as recorded by [`CollectingSink`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub span: Span,
    pub message: String,
}

/// The four entry points every stage reports through.
///
/// `error` is the only severity that increments a stage's error counter;
/// `warning`/`info`/`hint` are advisory and never block later stages.
pub trait DiagnosticSink {
    fn error(&mut self, span: Span, msg: String);
    fn warning(&mut self, span: Span, msg: String);
    fn info(&mut self, span: Span, msg: String);
    fn hint(&mut self, span: Span, msg: String);
}

/// In-memory [`DiagnosticSink`] that just appends to a `Vec`. Used across
/// this workspace's test suites so assertions can inspect exactly what was
/// reported.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    pub diagnostics: Vec<Diagnostic>,
    pub error_count: u32,
}

impl CollectingSink {
    pub fn new() -> Self {
        CollectingSink::default()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Error)
    }
}

impl DiagnosticSink for CollectingSink {
    fn error(&mut self, span: Span, msg: String) {
        self.error_count += 1;
        self.diagnostics.push(Diagnostic { severity: Severity::Error, span, message: msg });
    }

    fn warning(&mut self, span: Span, msg: String) {
        self.diagnostics.push(Diagnostic { severity: Severity::Warning, span, message: msg });
    }

    fn info(&mut self, span: Span, msg: String) {
        self.diagnostics.push(Diagnostic { severity: Severity::Info, span, message: msg });
    }

    fn hint(&mut self, span: Span, msg: String) {
        self.diagnostics.push(Diagnostic { severity: Severity::Hint, span, message: msg });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> Span {
        Span::new("main.alir", 3, 7)
    }

    #[test]
    fn error_increments_error_count_other_severities_do_not() {
        let mut sink = CollectingSink::new();
        sink.error(span(), "bad".into());
        sink.warning(span(), "careful".into());
        sink.info(span(), "fyi".into());
        sink.hint(span(), "maybe".into());
        assert_eq!(sink.error_count, 1);
        assert_eq!(sink.diagnostics.len(), 4);
    }

    #[test]
    fn errors_iterator_filters_by_severity() {
        let mut sink = CollectingSink::new();
        sink.error(span(), "bad".into());
        sink.info(span(), "fyi".into());
        let errs: Vec<_> = sink.errors().collect();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].severity, Severity::Error);
    }

    #[test]
    fn span_with_token_attaches_identifier() {
        let s = span().with_token("lenght");
        assert_eq!(s.token.as_deref(), Some("lenght"));
    }
}
