//! Orchestration crate for the Alir middle-end: a single [`compile`] entry
//! point sequencing Semantic Analysis, IR Generation, and IR Verification.

pub mod error;
pub mod pipeline;

pub use error::PipelineError;
pub use pipeline::{compile, verified_module};

use serde::{Deserialize, Serialize};

use alir_ir::Module;

/// Last pipeline stage that ran before [`compile`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Semantic,
    IrGen,
    Verify,
}

/// Result of a full (or partial, if an early stage failed) compilation run.
///
/// `module` is `Some` once IR Generation has produced one, even if that
/// module later fails verification — callers that want a guaranteed-clean
/// module should go through [`verified_module`] instead of reading this
/// field directly.
pub struct CompileOutcome {
    pub module: Option<Module>,
    pub stage_reached: Stage,
    pub error_count: u32,
    pub compilation_time_ms: u64,
}
