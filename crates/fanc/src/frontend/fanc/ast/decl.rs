//! Function declaration AST nodes

use super::Stmt;
use crate::common::Span;
use crate::types::Type;

/// Formal parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Formal {
    pub name: String,
    pub ty: Type,
    pub span: Span,
    /// Negative frame slot, -1 for the first parameter (filled in during semantic analysis)
    pub offset: Option<i32>,
}

impl Formal {
    pub fn new(name: String, ty: Type, span: Span) -> Self {
        Self {
            name,
            ty,
            span,
            offset: None,
        }
    }
}

/// Function definition
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    pub name: String,
    pub return_type: Type,
    pub params: Vec<Formal>,
    pub body: Vec<Stmt>,
    pub span: Span,
    /// Number of local slots the body needs (filled in during semantic analysis)
    pub frame_size: Option<usize>,
}

impl FuncDecl {
    pub fn new(name: String, return_type: Type, params: Vec<Formal>, body: Vec<Stmt>, span: Span) -> Self {
        Self {
            name,
            return_type,
            params,
            body,
            span,
            frame_size: None,
        }
    }

    pub fn param_types(&self) -> Vec<Type> {
        self.params.iter().map(|p| p.ty).collect()
    }
}
