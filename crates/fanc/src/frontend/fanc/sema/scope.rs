//! Symbol table and scope management

use super::trace::ScopeTrace;
use crate::common::SemanticError;
use crate::types::Type;
use std::collections::HashMap;
use tracing::trace;

/// A symbol in the symbol table
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Value type for variables, return type for functions
    pub ty: Type,
    /// Frame slot relative to the base pointer; always 0 for functions
    pub offset: i32,
}

/// Kind of symbol
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolKind {
    Variable,
    Function { params: Vec<Type> },
}

impl Symbol {
    pub fn variable(name: impl Into<String>, ty: Type, offset: i32) -> Self {
        Self {
            name: name.into(),
            kind: SymbolKind::Variable,
            ty,
            offset,
        }
    }

    pub fn function(name: impl Into<String>, return_type: Type, params: Vec<Type>) -> Self {
        Self {
            name: name.into(),
            kind: SymbolKind::Function { params },
            ty: return_type,
            offset: 0,
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, SymbolKind::Function { .. })
    }

    /// Parameter types; empty for variables
    pub fn params(&self) -> &[Type] {
        match &self.kind {
            SymbolKind::Function { params } => params,
            SymbolKind::Variable => &[],
        }
    }
}

/// Stack of lexical scopes, innermost last.
///
/// The bottom scope is the global one. It holds the built-in `print` and
/// `printi` routines and is never popped.
#[derive(Debug)]
pub struct ScopeStack {
    scopes: Vec<HashMap<String, Symbol>>,
    trace: ScopeTrace,
}

impl ScopeStack {
    pub fn new() -> Self {
        let mut stack = Self {
            scopes: vec![HashMap::new()],
            trace: ScopeTrace::new(),
        };

        for builtin in [
            Symbol::function("print", Type::Void, vec![Type::String]),
            Symbol::function("printi", Type::Void, vec![Type::Int]),
        ] {
            stack.insert(builtin);
        }

        stack
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
        self.trace.begin_scope();
        trace!(depth = self.depth(), "enter scope");
    }

    /// Pop the innermost scope. The global scope stays in place.
    pub fn exit_scope(&mut self) {
        if self.scopes.len() > 1 {
            trace!(depth = self.depth(), "exit scope");
            self.trace.end_scope();
            self.scopes.pop();
        }
    }

    /// Number of scopes above the global one
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    /// Add `symbol` to the innermost scope
    pub fn declare(&mut self, symbol: Symbol) -> Result<(), SemanticError> {
        let exists = self
            .scopes
            .last()
            .is_some_and(|scope| scope.contains_key(&symbol.name));
        if exists {
            return Err(SemanticError::DuplicateDeclaration(symbol.name));
        }

        trace!(name = %symbol.name, ty = %symbol.ty, offset = symbol.offset, "declare");
        self.insert(symbol);
        Ok(())
    }

    /// Find the innermost symbol named `name`
    pub fn lookup(&self, name: &str) -> Result<&Symbol, SemanticError> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .ok_or_else(|| SemanticError::UndeclaredIdentifier(name.to_string()))
    }

    pub fn trace(&self) -> &ScopeTrace {
        &self.trace
    }

    pub fn into_trace(self) -> ScopeTrace {
        self.trace
    }

    fn insert(&mut self, symbol: Symbol) {
        match &symbol.kind {
            SymbolKind::Variable => self.trace.variable(&symbol.name, symbol.ty, symbol.offset),
            SymbolKind::Function { params } => self.trace.function(&symbol.name, symbol.ty, params),
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(symbol.name.clone(), symbol);
        }
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_are_global() {
        let scopes = ScopeStack::new();

        let print = scopes.lookup("print").unwrap();
        assert!(print.is_function());
        assert_eq!(print.ty, Type::Void);
        assert_eq!(print.params(), &[Type::String]);

        let printi = scopes.lookup("printi").unwrap();
        assert_eq!(printi.params(), &[Type::Int]);
    }

    #[test]
    fn test_duplicate_in_same_scope() {
        let mut scopes = ScopeStack::new();
        scopes.enter_scope();
        scopes.declare(Symbol::variable("x", Type::Int, 0)).unwrap();

        let err = scopes.declare(Symbol::variable("x", Type::Byte, 1)).unwrap_err();
        assert_eq!(err, SemanticError::DuplicateDeclaration("x".to_string()));
    }

    #[test]
    fn test_shadowing_in_nested_scope() {
        let mut scopes = ScopeStack::new();
        scopes.enter_scope();
        scopes.declare(Symbol::variable("x", Type::Int, 0)).unwrap();
        scopes.enter_scope();
        scopes.declare(Symbol::variable("x", Type::Bool, 1)).unwrap();

        assert_eq!(scopes.lookup("x").unwrap().ty, Type::Bool);
        scopes.exit_scope();
        assert_eq!(scopes.lookup("x").unwrap().ty, Type::Int);
        scopes.exit_scope();
        assert_eq!(
            scopes.lookup("x").unwrap_err(),
            SemanticError::UndeclaredIdentifier("x".to_string())
        );
    }

    #[test]
    fn test_global_scope_is_never_popped() {
        let mut scopes = ScopeStack::new();
        scopes.exit_scope();
        scopes.exit_scope();

        assert_eq!(scopes.depth(), 0);
        assert!(scopes.lookup("printi").is_ok());
        assert!(scopes.declare(Symbol::function("print", Type::Void, vec![])).is_err());
    }

    #[test]
    fn test_trace_survives_scope_exit() {
        let mut scopes = ScopeStack::new();
        scopes.enter_scope();
        scopes.declare(Symbol::variable("y", Type::Byte, 0)).unwrap();
        scopes.exit_scope();

        assert_eq!(
            scopes.trace().events().last(),
            Some(&super::super::trace::TraceEvent::EndScope)
        );
        let rendered = scopes.into_trace().to_string();
        assert!(rendered.starts_with("print (string)->void 0\nprinti (int)->void 0\n"));
        assert!(rendered.contains("  y byte 0\n"));
    }
}
