//! Statement AST nodes

use super::Expr;
use crate::common::Span;
use crate::types::Type;

/// Statement node
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Statement kinds
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// Nested statement list: { ... }
    Block(Vec<Stmt>),

    /// Local variable: int x; or int x = e;
    VarDecl(VarDecl),

    /// Assignment: x = e;
    Assign {
        target: Expr,
        value: Expr,
    },

    /// Call whose result is discarded: f(x);
    Call(Expr),

    /// If statement: if (cond) then [else else]
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// While loop: while (cond) body
    While {
        condition: Expr,
        body: Box<Stmt>,
    },

    Break,

    Continue,

    /// Return statement: return [expr];
    Return(Option<Expr>),
}

/// Local variable declaration
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: String,
    pub ty: Type,
    pub init: Option<Expr>,
    pub span: Span,
    /// Frame slot relative to the base pointer (filled in during semantic analysis)
    pub offset: Option<i32>,
}

impl VarDecl {
    pub fn new(name: String, ty: Type, span: Span) -> Self {
        Self {
            name,
            ty,
            init: None,
            span,
            offset: None,
        }
    }

    pub fn with_init(mut self, init: Expr) -> Self {
        self.init = Some(init);
        self
    }
}
