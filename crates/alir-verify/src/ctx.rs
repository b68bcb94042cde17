//! `VerifyCtx`: the small bundle threaded through the three sub-checks,
//! mirroring `alir-irgen::ctx::IrGenCtx`'s "explicit threading, no globals"
//! discipline at the scale this stage actually needs.

use alir_ir::{DiagnosticSink, Span};

pub struct VerifyCtx<'a, S: DiagnosticSink> {
    pub sink: &'a mut S,
    pub error_count: u32,
    pub filename: String,
}

impl<'a, S: DiagnosticSink> VerifyCtx<'a, S> {
    pub fn new(filename: impl Into<String>, sink: &'a mut S) -> Self {
        VerifyCtx { sink, error_count: 0, filename: filename.into() }
    }

    pub fn span(&self, line: u32, col: u32) -> Span {
        Span::new(self.filename.clone(), line, col)
    }

    pub fn error(&mut self, line: u32, col: u32, msg: impl Into<String>) {
        self.error_count += 1;
        let span = self.span(line, col);
        self.sink.error(span, msg.into());
    }

    pub fn warning(&mut self, line: u32, col: u32, msg: impl Into<String>) {
        let span = self.span(line, col);
        self.sink.warning(span, msg.into());
    }
}
