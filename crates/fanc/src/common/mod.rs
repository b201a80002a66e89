//! Common infrastructure shared by the frontend and the IR generator

mod error;
mod span;

pub use error::{CompileError, CompileResult, DiagnosticReporter, SemanticError};
pub use span::Span;
