//! Pipeline-level invariant violations, separate from the per-stage
//! diagnostics reported through [`alir_ir::DiagnosticSink`]: a split between
//! "can't even start" errors and ordinary user-facing diagnostics.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("program has no top-level declarations to compile")]
    EmptyProgram,
}
