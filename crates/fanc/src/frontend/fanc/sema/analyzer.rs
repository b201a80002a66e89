//! Semantic analyzer - type checking and validation

use super::scope::{ScopeStack, Symbol};
use super::trace::ScopeTrace;
use crate::common::{CompileError, CompileResult, SemanticError, Span};
use crate::frontend::fanc::ast::*;
use crate::types::Type;
use tracing::debug;

/// Semantic analyzer for type checking.
///
/// Analysis makes a single pass over the tree. It records the type of every
/// expression, the frame offset of every parameter and local, and the frame
/// size of every function. It stops at the first violation.
pub struct SemanticAnalyzer {
    scopes: ScopeStack,
    current_return_type: Option<Type>,
    loop_depth: usize,
    next_local_offset: i32,
    main_defined: bool,
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        Self {
            scopes: ScopeStack::new(),
            current_return_type: None,
            loop_depth: 0,
            next_local_offset: 0,
            main_defined: false,
        }
    }

    /// Analyze a whole program
    pub fn analyze(&mut self, program: &mut Program) -> CompileResult<()> {
        for func in &mut program.functions {
            self.analyze_function(func)?;
        }

        if !self.main_defined {
            let end = Span::new(program.span.end, program.span.end);
            return Err(CompileError::semantic(SemanticError::MissingMain, end));
        }

        Ok(())
    }

    pub fn trace(&self) -> &ScopeTrace {
        self.scopes.trace()
    }

    pub fn into_trace(self) -> ScopeTrace {
        self.scopes.into_trace()
    }

    fn analyze_function(&mut self, func: &mut FuncDecl) -> CompileResult<()> {
        let params = func.param_types();

        if func.name == "main" {
            if self.main_defined || !params.is_empty() || func.return_type != Type::Void {
                return Err(CompileError::semantic(
                    SemanticError::InvalidMainSignature,
                    func.span,
                ));
            }
            self.main_defined = true;
        }

        // Registered before the body so the function can call itself
        self.scopes
            .declare(Symbol::function(func.name.clone(), func.return_type, params))
            .map_err(|e| CompileError::semantic(e, func.span))?;

        let saved_return_type = self.current_return_type.replace(func.return_type);
        self.next_local_offset = 0;
        self.scopes.enter_scope();

        let mut offset = -1;
        for param in &mut func.params {
            self.scopes
                .declare(Symbol::variable(param.name.clone(), param.ty, offset))
                .map_err(|e| CompileError::semantic(e, param.span))?;
            param.offset = Some(offset);
            offset -= 1;
        }

        self.analyze_statements(&mut func.body)?;
        self.scopes.exit_scope();

        let frame_size = usize::try_from(self.next_local_offset).unwrap_or_default();
        debug!(function = %func.name, frame_size, "analyzed function");
        func.frame_size = Some(frame_size);
        self.current_return_type = saved_return_type;

        Ok(())
    }

    fn analyze_statements(&mut self, stmts: &mut [Stmt]) -> CompileResult<()> {
        for stmt in stmts {
            self.analyze_stmt(stmt)?;
        }
        Ok(())
    }

    /// Analyze a branch or loop body in a scope of its own
    fn analyze_scoped(&mut self, stmt: &mut Stmt) -> CompileResult<()> {
        self.scopes.enter_scope();
        if let StmtKind::Block(stmts) = &mut stmt.kind {
            self.analyze_statements(stmts)?;
        } else {
            self.analyze_stmt(stmt)?;
        }
        self.scopes.exit_scope();
        Ok(())
    }

    fn analyze_stmt(&mut self, stmt: &mut Stmt) -> CompileResult<()> {
        let span = stmt.span;

        match &mut stmt.kind {
            StmtKind::Block(stmts) => {
                self.scopes.enter_scope();
                self.analyze_statements(stmts)?;
                self.scopes.exit_scope();
            }

            StmtKind::VarDecl(var) => self.analyze_var_decl(var)?,

            StmtKind::Assign { target, value } => {
                let target_ty = self.analyze_expr(target)?;
                let value_ty = self.analyze_expr(value)?;
                if !target_ty.is_assignable_from(value_ty) {
                    return Err(CompileError::semantic(
                        SemanticError::mismatch(target_ty, value_ty),
                        value.span,
                    ));
                }
            }

            StmtKind::Call(call) => {
                self.analyze_expr(call)?;
            }

            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.analyze_condition(condition)?;
                self.analyze_scoped(then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.analyze_scoped(else_branch)?;
                }
            }

            StmtKind::While { condition, body } => {
                self.analyze_condition(condition)?;
                self.loop_depth += 1;
                self.analyze_scoped(body)?;
                self.loop_depth -= 1;
            }

            StmtKind::Break => self.check_in_loop("break", span)?,
            StmtKind::Continue => self.check_in_loop("continue", span)?,

            StmtKind::Return(value) => {
                let expected = self.current_return_type.unwrap_or(Type::Void);
                match value {
                    None if expected != Type::Void => {
                        return Err(CompileError::semantic(
                            SemanticError::mismatch(expected, Type::Void),
                            span,
                        ));
                    }
                    None => {}
                    Some(value) => {
                        let found = self.analyze_expr(value)?;
                        if !expected.is_assignable_from(found) {
                            return Err(CompileError::semantic(
                                SemanticError::mismatch(expected, found),
                                value.span,
                            ));
                        }
                    }
                }
            }
        }

        Ok(())
    }

    fn analyze_var_decl(&mut self, var: &mut VarDecl) -> CompileResult<()> {
        if let Some(init) = &mut var.init {
            let init_ty = self.analyze_expr(init)?;
            if !var.ty.is_assignable_from(init_ty) {
                return Err(CompileError::semantic(
                    SemanticError::mismatch(var.ty, init_ty),
                    init.span,
                ));
            }
        }

        let offset = self.next_local_offset;
        self.scopes
            .declare(Symbol::variable(var.name.clone(), var.ty, offset))
            .map_err(|e| CompileError::semantic(e, var.span))?;
        var.offset = Some(offset);
        self.next_local_offset += 1;

        Ok(())
    }

    fn analyze_condition(&mut self, condition: &mut Expr) -> CompileResult<()> {
        let ty = self.analyze_expr(condition)?;
        if ty != Type::Bool {
            return Err(CompileError::semantic(
                SemanticError::mismatch(Type::Bool, ty),
                condition.span,
            ));
        }
        Ok(())
    }

    fn check_in_loop(&self, keyword: &'static str, span: Span) -> CompileResult<()> {
        if self.loop_depth == 0 {
            return Err(CompileError::semantic(
                SemanticError::MisplacedLoopControl(keyword),
                span,
            ));
        }
        Ok(())
    }

    fn analyze_expr(&mut self, expr: &mut Expr) -> CompileResult<Type> {
        let span = expr.span;

        let ty = match &mut expr.kind {
            ExprKind::IntLiteral(_) => Type::Int,

            ExprKind::ByteLiteral(value) => {
                if *value > Type::BYTE_MAX {
                    return Err(CompileError::semantic(
                        SemanticError::ValueOutOfRange(*value),
                        span,
                    ));
                }
                Type::Byte
            }

            ExprKind::StringLiteral(_) => Type::String,
            ExprKind::BoolLiteral(_) => Type::Bool,

            ExprKind::Identifier(name) => {
                let symbol = self
                    .scopes
                    .lookup(name)
                    .map_err(|e| CompileError::semantic(e, span))?;
                if symbol.is_function() {
                    return Err(CompileError::semantic(
                        SemanticError::IdentifierIsFunction(name.clone()),
                        span,
                    ));
                }
                symbol.ty
            }

            ExprKind::Binary { left, right, .. } => {
                let left_ty = self.analyze_expr(left)?;
                let right_ty = self.analyze_expr(right)?;
                left_ty.arithmetic_result(right_ty).ok_or_else(|| {
                    let found = if left_ty.is_numeric() { right_ty } else { left_ty };
                    CompileError::semantic(SemanticError::mismatch("a numeric type", found), span)
                })?
            }

            ExprKind::Relational { left, right, .. } => {
                let left_ty = self.analyze_expr(left)?;
                let right_ty = self.analyze_expr(right)?;
                if left_ty == Type::Void || right_ty == Type::Void {
                    return Err(CompileError::semantic(
                        SemanticError::mismatch("a value", Type::Void),
                        span,
                    ));
                }
                // Strings are only ever literal addresses
                if left_ty == Type::String || right_ty == Type::String {
                    return Err(CompileError::semantic(
                        SemanticError::mismatch("a comparable type", Type::String),
                        span,
                    ));
                }
                if left_ty != right_ty {
                    return Err(CompileError::semantic(
                        SemanticError::mismatch(left_ty, right_ty),
                        right.span,
                    ));
                }
                Type::Bool
            }

            ExprKind::Not(operand) => {
                self.analyze_condition(operand)?;
                Type::Bool
            }

            ExprKind::Logical { left, right, .. } => {
                self.analyze_condition(left)?;
                self.analyze_condition(right)?;
                Type::Bool
            }

            ExprKind::Cast { target, expr: inner } => {
                let source = self.analyze_expr(inner)?;
                if !target.can_cast_from(source) {
                    return Err(CompileError::semantic(
                        SemanticError::mismatch(*target, source),
                        span,
                    ));
                }
                *target
            }

            ExprKind::Call(call) => self.analyze_call(call, span)?,
        };

        expr.ty = Some(ty);
        Ok(ty)
    }

    fn analyze_call(&mut self, call: &mut CallExpr, span: Span) -> CompileResult<Type> {
        let symbol = self
            .scopes
            .lookup(&call.callee)
            .map_err(|e| CompileError::semantic(e, span))?;

        if !symbol.is_function() {
            return Err(CompileError::semantic(
                SemanticError::IdentifierIsNotFunction(call.callee.clone()),
                span,
            ));
        }

        let params = symbol.params().to_vec();
        let return_type = symbol.ty;

        if call.args.len() != params.len() {
            return Err(CompileError::semantic(
                SemanticError::ArityMismatch {
                    function: call.callee.clone(),
                    expected: params.len(),
                    found: call.args.len(),
                },
                span,
            ));
        }

        for (arg, param) in call.args.iter_mut().zip(params) {
            let arg_ty = self.analyze_expr(arg)?;
            if !param.is_assignable_from(arg_ty) {
                return Err(CompileError::semantic(
                    SemanticError::mismatch(param, arg_ty),
                    arg.span,
                ));
            }
        }

        Ok(return_type)
    }
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
