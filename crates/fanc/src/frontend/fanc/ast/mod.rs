//! Abstract Syntax Tree definitions

mod expr;
mod stmt;
mod decl;

pub use expr::*;
pub use stmt::*;
pub use decl::*;

use crate::common::Span;

/// A complete FanC program: a list of function definitions
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub functions: Vec<FuncDecl>,
    pub span: Span,
}

impl Program {
    pub fn new(functions: Vec<FuncDecl>, span: Span) -> Self {
        Self { functions, span }
    }
}
