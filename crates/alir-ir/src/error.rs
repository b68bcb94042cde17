//! Internal invariant violations: bugs in an upstream caller,
//! never user source errors. User-facing errors are always routed through
//! [`crate::diag::DiagnosticSink`] instead.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("duplicate field `{field}` in struct `{class_name}`")]
    DuplicateField { class_name: String, field: String },

    #[error("non-dense field index {index} in struct `{class_name}` (expected {expected})")]
    NonDenseFieldIndex {
        class_name: String,
        index: u32,
        expected: u32,
    },

    #[error("function `{0}` declared more than once in the same scope")]
    DuplicateFunction(String),
}
