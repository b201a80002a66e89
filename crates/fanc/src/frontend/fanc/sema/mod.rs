//! Semantic analysis module
//!
//! This module resolves identifiers, checks types and control flow, and
//! annotates the tree with the types and frame offsets code generation needs.

mod analyzer;
mod scope;
mod trace;

pub use analyzer::SemanticAnalyzer;
pub use scope::{ScopeStack, Symbol, SymbolKind};
pub use trace::{ScopeTrace, TraceEvent};
