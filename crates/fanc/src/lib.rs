//! FanC Compiler - semantic analysis and LLVM IR generation for FanC
//!
//! FanC is a small imperative language with `int`, `byte`, `bool` and
//! `string` values, functions, `if`/`while` control flow and short-circuit
//! boolean logic. This library checks FanC programs and lowers them to
//! textual LLVM IR.
//!
//! ## Architecture
//!
//! The compiler is organized into:
//! - **Frontend** (`frontend/`): Lexing, parsing and semantic analysis
//! - **IR** (`ir/`): LLVM IR instructions and the code generator
//! - **Common** (`common/`): Shared infrastructure (errors, spans)
//! - **Types** (`types/`): FanC primitive types and conversion rules

pub mod common;
pub mod types;
pub mod frontend;
pub mod ir;

// Re-exports for convenience
pub use common::{CompileError, CompileResult, DiagnosticReporter, SemanticError, Span};
pub use frontend::{CompileContext, FanCFrontend, FrontendConfig};
pub use ir::{CodeGenerator, IrModule};

/// Compile FanC source straight to an IR module, without rendering
/// diagnostics.
pub fn compile(source: &str) -> CompileResult<IrModule> {
    let (program, _) = FanCFrontend::new().analyze(source)?;
    CodeGenerator::new().generate(&program)
}
