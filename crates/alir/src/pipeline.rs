//! Top-level compilation pipeline: Semantic Analyzer → IR Generator → IR
//! Verifier, each stage gated on the previous stage's error count, in the
//! usual staged "typecheck, then codegen, then verify" shape.

use std::time::Instant;

use alir_ir::ast::Ast;
use alir_ir::{DiagnosticSink, Module};

use crate::error::PipelineError;
use crate::{CompileOutcome, Stage};

/// Runs the full pipeline over `ast`, reporting every stage's diagnostics
/// through `sink`. Stops at the first stage that reports an error — later
/// stages assume a clean predecessor.
pub fn compile<S: DiagnosticSink>(ast: &mut Ast, filename: impl Into<String>, sink: &mut S) -> Result<CompileOutcome, PipelineError> {
    if ast.is_empty() {
        return Err(PipelineError::EmptyProgram);
    }
    let start = Instant::now();
    let filename = filename.into();

    let sema = alir_sema::analyze(ast, filename.clone(), sink);
    if sema.error_count > 0 {
        return Ok(CompileOutcome {
            module: None,
            stage_reached: Stage::Semantic,
            error_count: sema.error_count,
            compilation_time_ms: elapsed_ms(start),
        });
    }

    let gen = alir_irgen::generate(ast, &sema.types, filename.clone(), sink);
    if gen.error_count > 0 {
        return Ok(CompileOutcome {
            module: Some(gen.module),
            stage_reached: Stage::IrGen,
            error_count: gen.error_count,
            compilation_time_ms: elapsed_ms(start),
        });
    }

    let verify = alir_verify::verify(&gen.module, filename, sink);
    Ok(CompileOutcome {
        module: Some(gen.module),
        stage_reached: Stage::Verify,
        error_count: verify.error_count,
        compilation_time_ms: elapsed_ms(start),
    })
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Returns the module only if every stage ran clean.
pub fn verified_module(outcome: &CompileOutcome) -> Option<&Module> {
    match outcome.stage_reached {
        Stage::Verify if outcome.error_count == 0 => outcome.module.as_ref(),
        _ => None,
    }
}
