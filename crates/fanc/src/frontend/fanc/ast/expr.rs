//! Expression AST nodes

use crate::common::Span;
use crate::types::Type;

/// Expression node
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    /// Type of this expression (filled in during semantic analysis)
    pub ty: Option<Type>,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self {
            kind,
            span,
            ty: None,
        }
    }

    /// Name of the referenced variable, if this is an identifier
    pub fn as_identifier(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Identifier(name) => Some(name),
            _ => None,
        }
    }
}

/// Expression kinds
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Integer literal: 42
    IntLiteral(i64),

    /// Byte literal: 42b
    ByteLiteral(i64),

    /// String literal: "hello"
    StringLiteral(String),

    /// Boolean literal: true, false
    BoolLiteral(bool),

    /// Identifier: foo
    Identifier(String),

    /// Arithmetic: a + b, x / y
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Comparison: a < b, x == y
    Relational {
        op: RelOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Logical negation: not x
    Not(Box<Expr>),

    /// Short-circuit conjunction or disjunction: a and b, a or b
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Explicit conversion: (byte) x
    Cast {
        target: Type,
        expr: Box<Expr>,
    },

    /// Function call: foo(a, b)
    Call(CallExpr),
}

/// Call of a named function with an argument list
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub callee: String,
    pub args: Vec<Expr>,
}

/// Arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}
