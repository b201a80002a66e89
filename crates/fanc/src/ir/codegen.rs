//! LLVM IR generation from the annotated FanC tree
//!
//! The generator trusts the analyzer completely: it performs no semantic
//! checks, and the only errors it raises are missing annotations.
//!
//! Every function gets one `i32` frame. Parameters sit below the base
//! pointer at negative offsets and locals at non-negative ones, so slots are
//! addressed exactly by the offsets recorded during analysis.

use super::emitter::CodeBuffer;
use super::inst::*;
use crate::common::{CompileError, CompileResult};
use crate::frontend::fanc::ast::*;
use crate::frontend::fanc::sema::{ScopeStack, Symbol};
use crate::types::Type;
use tracing::debug;

/// Runtime support: libc declarations and the two built-in routines
const PRELUDE: &[&str] = &[
    "declare i32 @printf(i8*, ...)",
    "declare void @exit(i32)",
    r#"@.int_specifier = constant [4 x i8] c"%d\0A\00""#,
    r#"@.str_specifier = constant [4 x i8] c"%s\0A\00""#,
    "",
    "define void @printi(i32) {",
    "  %spec_ptr = getelementptr [4 x i8], [4 x i8]* @.int_specifier, i32 0, i32 0",
    "  call i32 (i8*, ...) @printf(i8* %spec_ptr, i32 %0)",
    "  ret void",
    "}",
    "",
    "define void @print(i8*) {",
    "  %spec_ptr = getelementptr [4 x i8], [4 x i8]* @.str_specifier, i32 0, i32 0",
    "  call i32 (i8*, ...) @printf(i8* %spec_ptr, i8* %0)",
    "  ret void",
    "}",
    "",
];

/// Called with the divisor before every division
const DIVISION_GUARD: &[&str] = &[
    r#"@.DIV_BY_ZERO_ERROR = internal constant [23 x i8] c"Error division by zero\00""#,
    "define void @check_division(i32) {",
    "  %valid = icmp eq i32 %0, 0",
    "  br i1 %valid, label %ILLEGAL, label %LEGAL",
    "ILLEGAL:",
    "  call void @print(i8* getelementptr([23 x i8], [23 x i8]* @.DIV_BY_ZERO_ERROR, i32 0, i32 0))",
    "  call void @exit(i32 0)",
    "  ret void",
    "LEGAL:",
    "  ret void",
    "}",
    "",
];

const DIVISION_GUARD_NAME: &str = "check_division";

/// Globals the runtime support defines or declares besides the built-ins
const RUNTIME_SYMBOLS: &[&str] = &["printf", "exit", DIVISION_GUARD_NAME];

/// Jump targets of the innermost enclosing loop
#[derive(Debug, Clone, Copy)]
struct LoopLabels {
    continue_to: Label,
    break_to: Label,
}

/// Lowers an analyzed program to LLVM IR
pub struct CodeGenerator {
    buffer: CodeBuffer,
    scopes: ScopeStack,
    loops: Vec<LoopLabels>,
    frame_base: Option<Register>,
    return_type: Type,
}

impl CodeGenerator {
    pub fn new() -> Self {
        Self {
            buffer: CodeBuffer::new(),
            scopes: ScopeStack::new(),
            loops: Vec::new(),
            frame_base: None,
            return_type: Type::Void,
        }
    }

    /// Generate the module for a program that passed semantic analysis
    pub fn generate(mut self, program: &Program) -> CompileResult<IrModule> {
        for line in PRELUDE.iter().chain(DIVISION_GUARD) {
            self.buffer.emit_global(*line);
        }

        for func in &program.functions {
            self.build_function(func)?;
        }

        Ok(self.buffer.finish())
    }

    fn build_function(&mut self, func: &FuncDecl) -> CompileResult<()> {
        let frame_size = func.frame_size.ok_or_else(|| {
            CompileError::codegen(format!("function '{}' has no frame size", func.name))
        })?;
        let params: Vec<IrType> = func.params.iter().map(|p| ir_type(p.ty)).collect();
        let param_count = func.params.len();

        self.buffer.begin_function(&symbol_name(&func.name), ir_type(func.return_type), params);
        self.return_type = func.return_type;
        self.loops.clear();

        let frame = self.buffer.fresh_register();
        self.buffer.emit(Inst::Alloca {
            dst: frame,
            count: (param_count + frame_size).max(1),
        });

        let base = self.buffer.fresh_register();
        let base_offset = i32::try_from(param_count).map_err(|_| {
            CompileError::codegen(format!("function '{}' has too many parameters", func.name))
        })?;
        self.buffer.emit(Inst::SlotAddress {
            dst: base,
            base: frame,
            offset: base_offset,
        });
        self.frame_base = Some(base);

        self.scopes.enter_scope();
        for (index, param) in func.params.iter().enumerate() {
            let offset = param.offset.ok_or_else(|| missing_slot(&param.name))?;
            self.declare(Symbol::variable(param.name.clone(), param.ty, offset))?;
            self.store_slot(offset, Operand::Argument(index))?;
        }

        self.build_statements(&func.body)?;
        self.scopes.exit_scope();

        if !self.buffer.is_terminated() {
            let value = (func.return_type != Type::Void).then_some(Operand::Immediate(0));
            self.buffer.emit(Inst::Return(value));
        }

        self.buffer.end_function();
        self.frame_base = None;
        debug!(function = %func.name, "generated function");

        Ok(())
    }

    // =========================================================================
    // Frame slots
    // =========================================================================

    fn declare(&mut self, symbol: Symbol) -> CompileResult<()> {
        self.scopes
            .declare(symbol)
            .map_err(|e| CompileError::codegen(e.to_string()))
    }

    fn resolve(&self, name: &str) -> CompileResult<i32> {
        self.scopes
            .lookup(name)
            .map(|symbol| symbol.offset)
            .map_err(|_| missing_slot(name))
    }

    fn slot_address(&mut self, offset: i32) -> CompileResult<Register> {
        let base = self
            .frame_base
            .ok_or_else(|| CompileError::codegen("slot access outside of a function"))?;
        let dst = self.buffer.fresh_register();
        self.buffer.emit(Inst::SlotAddress { dst, base, offset });
        Ok(dst)
    }

    fn load_slot(&mut self, offset: i32) -> CompileResult<Register> {
        let addr = self.slot_address(offset)?;
        let dst = self.buffer.fresh_register();
        self.buffer.emit(Inst::Load { dst, addr });
        Ok(dst)
    }

    fn store_slot(&mut self, offset: i32, value: Operand) -> CompileResult<()> {
        let addr = self.slot_address(offset)?;
        self.buffer.emit(Inst::Store { value, addr });
        Ok(())
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn build_statements(&mut self, stmts: &[Stmt]) -> CompileResult<()> {
        for stmt in stmts {
            self.build_stmt(stmt)?;
        }
        Ok(())
    }

    fn build_scoped(&mut self, stmt: &Stmt) -> CompileResult<()> {
        self.scopes.enter_scope();
        if let StmtKind::Block(stmts) = &stmt.kind {
            self.build_statements(stmts)?;
        } else {
            self.build_stmt(stmt)?;
        }
        self.scopes.exit_scope();
        Ok(())
    }

    fn build_stmt(&mut self, stmt: &Stmt) -> CompileResult<()> {
        match &stmt.kind {
            StmtKind::Block(stmts) => {
                self.scopes.enter_scope();
                self.build_statements(stmts)?;
                self.scopes.exit_scope();
            }

            StmtKind::VarDecl(var) => {
                let value = match &var.init {
                    Some(init) => self.build_expr(init)?,
                    None => Operand::Immediate(0),
                };
                let offset = var.offset.ok_or_else(|| missing_slot(&var.name))?;
                self.store_slot(offset, value)?;
                self.declare(Symbol::variable(var.name.clone(), var.ty, offset))?;
            }

            StmtKind::Assign { target, value } => {
                let value = self.build_expr(value)?;
                let name = target
                    .as_identifier()
                    .ok_or_else(|| CompileError::codegen("assignment target is not a variable"))?;
                let offset = self.resolve(name)?;
                self.store_slot(offset, value)?;
            }

            StmtKind::Call(call) => self.build_effect(call)?,

            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let then_label = self.buffer.fresh_label();
                let end_label = self.buffer.fresh_label();
                let else_label = match else_branch {
                    Some(_) => self.buffer.fresh_label(),
                    None => end_label,
                };

                self.build_branch(condition, then_label, else_label)?;

                self.buffer.emit_label(then_label);
                self.build_scoped(then_branch)?;

                if let Some(else_branch) = else_branch {
                    if !self.buffer.is_terminated() {
                        self.buffer.emit(Inst::Branch(end_label));
                    }
                    self.buffer.emit_label(else_label);
                    self.build_scoped(else_branch)?;
                }

                self.buffer.emit_label(end_label);
            }

            StmtKind::While { condition, body } => {
                let cond_label = self.buffer.fresh_label();
                let body_label = self.buffer.fresh_label();
                let exit_label = self.buffer.fresh_label();

                self.buffer.emit_label(cond_label);
                self.build_branch(condition, body_label, exit_label)?;

                self.buffer.emit_label(body_label);
                self.loops.push(LoopLabels {
                    continue_to: cond_label,
                    break_to: exit_label,
                });
                self.build_scoped(body)?;
                self.loops.pop();

                if !self.buffer.is_terminated() {
                    self.buffer.emit(Inst::Branch(cond_label));
                }
                self.buffer.emit_label(exit_label);
            }

            StmtKind::Break => {
                let target = self.innermost_loop()?.break_to;
                self.buffer.emit(Inst::Branch(target));
            }

            StmtKind::Continue => {
                let target = self.innermost_loop()?.continue_to;
                self.buffer.emit(Inst::Branch(target));
            }

            StmtKind::Return(value) => match value {
                None => self.buffer.emit(Inst::Return(None)),
                Some(value) if self.return_type == Type::Void => {
                    self.build_effect(value)?;
                    self.buffer.emit(Inst::Return(None));
                }
                Some(value) => {
                    let value = self.build_expr(value)?;
                    self.buffer.emit(Inst::Return(Some(value)));
                }
            },
        }

        Ok(())
    }

    fn innermost_loop(&self) -> CompileResult<LoopLabels> {
        self.loops
            .last()
            .copied()
            .ok_or_else(|| CompileError::codegen("loop control outside of a loop"))
    }

    /// Evaluate an expression for its side effects only
    fn build_effect(&mut self, expr: &Expr) -> CompileResult<()> {
        if let ExprKind::Call(call) = &expr.kind {
            let return_type = type_of(expr)?;
            self.build_call(call, return_type)?;
        } else {
            self.build_expr(expr)?;
        }
        Ok(())
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    /// Materialize the value of an expression
    fn build_expr(&mut self, expr: &Expr) -> CompileResult<Operand> {
        match &expr.kind {
            ExprKind::IntLiteral(value) | ExprKind::ByteLiteral(value) => {
                Ok(Operand::Immediate(*value))
            }

            ExprKind::BoolLiteral(value) => Ok(Operand::Immediate(i64::from(*value))),

            ExprKind::StringLiteral(value) => {
                let constant = self.buffer.add_string(value);
                let dst = self.buffer.fresh_register();
                self.buffer.emit(Inst::StringAddress {
                    dst,
                    global: constant.name,
                    len: constant.len,
                });
                Ok(dst.into())
            }

            ExprKind::Identifier(name) => {
                let offset = self.resolve(name)?;
                Ok(self.load_slot(offset)?.into())
            }

            ExprKind::Binary { op, left, right } => {
                self.build_arithmetic(*op, left, right, type_of(expr)?)
            }

            ExprKind::Relational { .. } | ExprKind::Not(_) | ExprKind::Logical { .. } => {
                self.materialize_bool(expr)
            }

            ExprKind::Cast { target, expr: inner } => {
                let value = self.build_expr(inner)?;
                if *target == Type::Byte && type_of(inner)? == Type::Int {
                    self.mask_byte(value)
                } else {
                    Ok(value)
                }
            }

            ExprKind::Call(call) => self
                .build_call(call, type_of(expr)?)?
                .map(Operand::from)
                .ok_or_else(|| {
                    CompileError::codegen(format!("call to '{}' has no value", call.callee))
                }),
        }
    }

    fn build_arithmetic(
        &mut self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        result: Type,
    ) -> CompileResult<Operand> {
        let lhs = self.build_expr(left)?;
        let rhs = self.build_expr(right)?;

        let opcode = match op {
            BinaryOp::Add => BinOp::Add,
            BinaryOp::Sub => BinOp::Sub,
            BinaryOp::Mul => BinOp::Mul,
            BinaryOp::Div => {
                self.buffer.emit(Inst::Call {
                    dst: None,
                    return_type: IrType::Void,
                    callee: DIVISION_GUARD_NAME.to_string(),
                    args: vec![(IrType::I32, rhs)],
                });
                if result == Type::Byte {
                    BinOp::UDiv
                } else {
                    BinOp::SDiv
                }
            }
        };

        let dst = self.buffer.fresh_register();
        self.buffer.emit(Inst::Binary {
            dst,
            op: opcode,
            lhs,
            rhs,
        });

        // Quotients of two bytes already fit
        if result == Type::Byte && op != BinaryOp::Div {
            return self.mask_byte(dst.into());
        }
        Ok(dst.into())
    }

    fn mask_byte(&mut self, value: Operand) -> CompileResult<Operand> {
        let dst = self.buffer.fresh_register();
        self.buffer.emit(Inst::Binary {
            dst,
            op: BinOp::And,
            lhs: Operand::Immediate(Type::BYTE_MAX),
            rhs: value,
        });
        Ok(dst.into())
    }

    /// Turn a boolean expression into a 0/1 value by joining both outcomes
    fn materialize_bool(&mut self, expr: &Expr) -> CompileResult<Operand> {
        let on_true = self.buffer.fresh_label();
        let on_false = self.buffer.fresh_label();
        let end = self.buffer.fresh_label();

        self.build_branch(expr, on_true, on_false)?;

        self.buffer.emit_label(on_true);
        self.buffer.emit(Inst::Branch(end));
        self.buffer.emit_label(on_false);
        self.buffer.emit(Inst::Branch(end));
        self.buffer.emit_label(end);

        let dst = self.buffer.fresh_register();
        self.buffer.emit(Inst::Phi {
            dst,
            incoming: vec![
                (Operand::Immediate(1), on_true),
                (Operand::Immediate(0), on_false),
            ],
        });
        Ok(dst.into())
    }

    /// Lower a boolean expression as control flow: jump to `on_true` when it
    /// holds and to `on_false` otherwise.
    fn build_branch(&mut self, expr: &Expr, on_true: Label, on_false: Label) -> CompileResult<()> {
        match &expr.kind {
            ExprKind::BoolLiteral(value) => {
                let target = if *value { on_true } else { on_false };
                self.buffer.emit(Inst::Branch(target));
            }

            ExprKind::Not(inner) => self.build_branch(inner, on_false, on_true)?,

            ExprKind::Logical { op, left, right } => {
                let rhs_label = self.buffer.fresh_label();
                match op {
                    LogicalOp::And => self.build_branch(left, rhs_label, on_false)?,
                    LogicalOp::Or => self.build_branch(left, on_true, rhs_label)?,
                }
                self.buffer.emit_label(rhs_label);
                self.build_branch(right, on_true, on_false)?;
            }

            ExprKind::Relational { op, left, right } => {
                let ty = ir_type(type_of(left)?);
                let lhs = self.build_expr(left)?;
                let rhs = self.build_expr(right)?;
                self.emit_test(comparison(*op), ty, lhs, rhs, on_true, on_false);
            }

            _ => {
                let value = self.build_expr(expr)?;
                self.emit_test(
                    Cmp::Ne,
                    IrType::I32,
                    value,
                    Operand::Immediate(0),
                    on_true,
                    on_false,
                );
            }
        }

        Ok(())
    }

    fn emit_test(
        &mut self,
        cmp: Cmp,
        ty: IrType,
        lhs: Operand,
        rhs: Operand,
        on_true: Label,
        on_false: Label,
    ) {
        let cond = self.buffer.fresh_register();
        self.buffer.emit(Inst::Compare {
            dst: cond,
            cmp,
            ty,
            lhs,
            rhs,
        });
        self.buffer.emit(Inst::CondBranch {
            cond,
            on_true,
            on_false,
        });
    }

    /// Emit a call with arguments evaluated left to right. Returns the result
    /// register, or `None` for a void function.
    fn build_call(&mut self, call: &CallExpr, return_type: Type) -> CompileResult<Option<Register>> {
        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            let ty = ir_type(type_of(arg)?);
            let value = self.build_expr(arg)?;
            args.push((ty, value));
        }

        let dst = if return_type == Type::Void {
            None
        } else {
            Some(self.buffer.fresh_register())
        };

        self.buffer.emit(Inst::Call {
            dst,
            return_type: ir_type(return_type),
            callee: symbol_name(&call.callee),
            args,
        });

        Ok(dst)
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// LLVM name of a FanC function. User functions that collide with a runtime
/// symbol move to a dotted name, which no FanC identifier can spell.
fn symbol_name(name: &str) -> String {
    if RUNTIME_SYMBOLS.contains(&name) {
        format!("fanc.{}", name)
    } else {
        name.to_string()
    }
}

fn ir_type(ty: Type) -> IrType {
    match ty {
        Type::Void => IrType::Void,
        Type::String => IrType::I8Ptr,
        Type::Int | Type::Byte | Type::Bool => IrType::I32,
    }
}

fn comparison(op: RelOp) -> Cmp {
    match op {
        RelOp::Eq => Cmp::Eq,
        RelOp::Ne => Cmp::Ne,
        RelOp::Lt => Cmp::Slt,
        RelOp::Le => Cmp::Sle,
        RelOp::Gt => Cmp::Sgt,
        RelOp::Ge => Cmp::Sge,
    }
}

fn type_of(expr: &Expr) -> CompileResult<Type> {
    expr.ty.ok_or_else(|| {
        CompileError::codegen(format!(
            "expression at {}..{} has no type",
            expr.span.start, expr.span.end
        ))
    })
}

fn missing_slot(name: &str) -> CompileError {
    CompileError::codegen(format!("'{}' has no frame slot", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::fanc::parser::Parser;
    use crate::frontend::fanc::sema::SemanticAnalyzer;
    use pretty_assertions::assert_eq;

    fn compile(source: &str) -> String {
        let mut program = Parser::new(source).unwrap().parse().unwrap();
        SemanticAnalyzer::new().analyze(&mut program).unwrap();
        CodeGenerator::new().generate(&program).unwrap().to_string()
    }

    /// Lines of the generated body of `name`, without the signature and brace
    fn function_body<'a>(ir: &'a str, name: &str) -> Vec<&'a str> {
        let header = format!("@{}(", name);
        ir.lines()
            .skip_while(|line| !(line.starts_with("define") && line.contains(&header)))
            .skip(1)
            .take_while(|line| *line != "}")
            .map(str::trim)
            .collect()
    }

    /// Every `%<prefix><digits>` token in `text`
    fn names_in(text: &str, prefix: &str) -> Vec<String> {
        let pattern = format!("%{}", prefix);
        let mut names = Vec::new();
        let mut rest = text;
        while let Some(pos) = rest.find(&pattern) {
            let after = &rest[pos + pattern.len()..];
            let digits: String = after.chars().take_while(char::is_ascii_digit).collect();
            if !digits.is_empty() {
                names.push(format!("{}{}", pattern, digits));
            }
            rest = after;
        }
        names
    }

    fn register_defined_by<'a>(body: &[&'a str], fragment: &str) -> &'a str {
        let line = body
            .iter()
            .copied()
            .find(|line| line.contains(fragment))
            .unwrap_or_else(|| panic!("no line contains {:?}", fragment));
        line.split(" = ").next().unwrap()
    }

    fn position(body: &[&str], fragment: &str) -> usize {
        body.iter()
            .position(|line| line.contains(fragment))
            .unwrap_or_else(|| panic!("no line contains {:?}", fragment))
    }

    const PROGRAM: &str = r#"
        int fact(int n) {
            if (n <= 1) return 1;
            return n * fact(n - 1);
        }

        bool inRange(byte b, int lo, int hi) {
            return lo <= (int) b and (int) b <= hi;
        }

        void main() {
            int i = 0;
            byte acc = 0b;
            while (i < 10) {
                i = i + 1;
                if (i == 3 or not (i != 7)) continue;
                if (i > 8) { break; } else { acc = acc + (byte) i; }
            }
            bool ok = inRange(acc, 0, 5) == true;
            if (ok) print("in range"); else printi(fact(i) / (i - 9));
        }
    "#;

    #[test]
    fn test_registers_defined_before_use_and_labels_local() {
        let ir = compile(PROGRAM);

        for name in ["fact", "inRange", "main"] {
            let body = function_body(&ir, name);
            assert!(!body.is_empty(), "missing function {}", name);

            let mut defined = std::collections::HashSet::new();
            for line in &body {
                let (def, uses) = match line.split_once(" = ") {
                    Some((lhs, rhs)) if lhs.starts_with("%t") => (Some(lhs), rhs),
                    _ => (None, *line),
                };
                for reg in names_in(uses, "t") {
                    assert!(defined.contains(&reg), "{} used before definition in {}", reg, name);
                }
                if let Some(def) = def {
                    assert!(defined.insert(def.to_string()), "{} defined twice", def);
                }
            }

            let labels: std::collections::HashSet<String> = body
                .iter()
                .filter_map(|line| line.strip_suffix(':'))
                .map(|label| format!("%{}", label))
                .collect();
            for line in &body {
                for target in names_in(line, "label_") {
                    assert!(labels.contains(&target), "{} not defined in {}", target, name);
                }
            }
        }
    }

    #[test]
    fn test_every_block_is_terminated() {
        let ir = compile(PROGRAM);
        for name in ["fact", "inRange", "main"] {
            let body = function_body(&ir, name);
            for (index, line) in body.iter().enumerate().skip(1) {
                if line.ends_with(':') {
                    let previous = body[index - 1];
                    assert!(
                        previous.starts_with("br ") || previous.starts_with("ret"),
                        "block {} entered by fallthrough after {:?}",
                        line,
                        previous
                    );
                }
            }
            let last = body.last().unwrap();
            assert!(last.starts_with("ret") || last.starts_with("br "));
        }
    }

    #[test]
    fn test_prelude_and_division_guard_emitted_once() {
        let ir = compile("void main() { }");

        assert_eq!(ir.matches("define void @check_division(i32)").count(), 1);
        assert_eq!(ir.matches("define void @print(i8*)").count(), 1);
        assert_eq!(ir.matches("define void @printi(i32)").count(), 1);
        assert!(ir.contains(
            r#"@.DIV_BY_ZERO_ERROR = internal constant [23 x i8] c"Error division by zero\00""#
        ));
        assert!(ir.contains("call void @exit(i32 0)"));
    }

    #[test]
    fn test_declare_assign_print() {
        let ir = compile("void main() { int x; x = 3; printi(x); }");
        let body = function_body(&ir, "main");

        assert_eq!(body[0], "%t0 = alloca i32, i32 1");
        assert_eq!(body[1], "%t1 = getelementptr i32, i32* %t0, i32 0");
        assert_eq!(
            &body[2..6],
            &[
                "%t2 = getelementptr i32, i32* %t1, i32 0",
                "store i32 0, i32* %t2",
                "%t3 = getelementptr i32, i32* %t1, i32 0",
                "store i32 3, i32* %t3",
            ]
        );

        let loaded = register_defined_by(&body, "= load i32");
        assert!(body.contains(&format!("call void @printi(i32 {})", loaded).as_str()));
        assert_eq!(body.last(), Some(&"ret void"));
    }

    #[test]
    fn test_division_guard_precedes_divide() {
        let ir = compile("int f(int a, int b) { return a / b; } void main() { }");
        let body = function_body(&ir, "f");

        let guard = position(&body, "call void @check_division(i32 ");
        let divide = position(&body, "sdiv i32");
        assert!(guard < divide);

        let divisor = body[guard]
            .trim_start_matches("call void @check_division(i32 ")
            .trim_end_matches(')');
        assert!(body[divide].ends_with(&format!(", {}", divisor)));
    }

    #[test]
    fn test_byte_arithmetic() {
        let ir = compile("void main() { byte a = 200b; byte b = a + a; byte c = a / 3b; }");
        let body = function_body(&ir, "main");

        let sum = register_defined_by(&body, "= add i32");
        assert!(body.iter().any(|l| l.ends_with(&format!("= and i32 255, {}", sum))));
        assert!(body.iter().any(|l| l.contains("= udiv i32")));
        assert!(!body.iter().any(|l| l.contains("sdiv")));
    }

    #[test]
    fn test_mixed_arithmetic_is_not_masked() {
        let ir = compile("void main() { int x = 1b + 300; }");
        let body = function_body(&ir, "main");
        assert!(body.contains(&"%t2 = add i32 1, 300"));
        assert!(!body.iter().any(|l| l.contains("and i32 255")));
    }

    #[test]
    fn test_cast_to_byte_masks() {
        let ir = compile("void main() { int x = 300; byte b = (byte) x; int y = (int) b; }");
        let body = function_body(&ir, "main");
        assert_eq!(body.iter().filter(|l| l.contains("and i32 255")).count(), 1);
    }

    #[test]
    fn test_frame_layout_with_parameters() {
        let ir = compile("int f(int a, bool b) { int c = a; return c; } void main() { }");

        assert!(ir.contains("define i32 @f(i32, i32) {"));
        let body = function_body(&ir, "f");
        assert_eq!(
            &body[..6],
            &[
                "%t0 = alloca i32, i32 3",
                "%t1 = getelementptr i32, i32* %t0, i32 2",
                "%t2 = getelementptr i32, i32* %t1, i32 -1",
                "store i32 %0, i32* %t2",
                "%t3 = getelementptr i32, i32* %t1, i32 -2",
                "store i32 %1, i32* %t3",
            ]
        );
        assert!(body.contains(&"%t4 = getelementptr i32, i32* %t1, i32 -1"));
    }

    #[test]
    fn test_short_circuit_and() {
        let ir = compile("void main() { int x = 1; int y = 2; bool b = x > 0 and y < 5; }");
        let body = function_body(&ir, "main");

        let first = position(&body, "icmp sgt i32");
        let branch = body[first + 1];
        assert!(branch.starts_with("br i1"));

        // The right operand is only evaluated on the left operand's true edge
        let targets = names_in(branch, "label_");
        assert_eq!(body[first + 2], format!("{}:", &targets[0][1..]));
        assert!(position(&body, "icmp slt i32") > first + 2);

        assert!(body.iter().any(|l| l.contains("= phi i32 [1, %label_")));
        assert!(!body.iter().any(|l| l.contains(" i1 ") && l.contains("and")));
    }

    #[test]
    fn test_short_circuit_or_skips_right_on_true() {
        let ir = compile("void main() { int x = 1; if (x == 1 or x == 2) printi(x); }");
        let body = function_body(&ir, "main");

        let first = position(&body, "icmp eq i32");
        let targets = names_in(body[first + 1], "label_");
        // Right operand lives on the false edge
        assert_eq!(body[first + 2], format!("{}:", &targets[1][1..]));
        assert!(!body.iter().any(|l| l.contains("phi")));
    }

    #[test]
    fn test_not_swaps_targets() {
        let plain = compile("void main() { int x = 1; if (x < 2) printi(1); }");
        let negated = compile("void main() { int x = 1; if (not (x < 2)) printi(1); }");

        let plain_body = function_body(&plain, "main");
        let negated_body = function_body(&negated, "main");
        let plain_branch = plain_body[position(&plain_body, "br i1")];
        let negated_branch = negated_body[position(&negated_body, "br i1")];

        let plain_targets = names_in(plain_branch, "label_");
        let negated_targets = names_in(negated_branch, "label_");
        assert_eq!(plain_targets[0], negated_targets[1]);
        assert_eq!(plain_targets[1], negated_targets[0]);
    }

    #[test]
    fn test_while_break_and_continue_targets() {
        let ir = compile("void main() { while (true) { if (false) continue; break; } }");
        let body = function_body(&ir, "main");

        // label_0 is the condition, label_2 the exit
        assert!(body.contains(&"label_0:"));
        assert!(body.contains(&"br label %label_0"));
        assert!(body.contains(&"br label %label_2"));
        let exit = position(&body, "label_2:");
        assert_eq!(body[exit + 1], "ret void");
    }

    #[test]
    fn test_default_returns() {
        let ir = compile("int f() { } void g() { } void main() { }");
        assert_eq!(function_body(&ir, "f").last(), Some(&"ret i32 0"));
        assert_eq!(function_body(&ir, "g").last(), Some(&"ret void"));
    }

    #[test]
    fn test_code_after_return_is_isolated() {
        let ir = compile("int f() { return 1; printi(2); } void main() { }");
        let body = function_body(&ir, "f");

        let ret = position(&body, "ret i32 1");
        assert!(body[ret + 1].ends_with(':'));
        assert!(body.contains(&"call void @printi(i32 2)"));
    }

    #[test]
    fn test_string_literal_global() {
        let ir = compile(r#"void main() { print("hi"); }"#);

        assert!(ir.contains(r#"@.str0 = internal constant [3 x i8] c"hi\00""#));
        let body = function_body(&ir, "main");
        let addr = register_defined_by(&body, "[3 x i8]* @.str0");
        assert!(body.contains(&format!("call void @print(i8* {})", addr).as_str()));
    }

    #[test]
    fn test_bool_argument_and_return_are_materialized() {
        let ir = compile("bool f(bool b) { return b; } void main() { bool r = f(1 < 2); }");

        let main = function_body(&ir, "main");
        let value = register_defined_by(&main, "= phi i32");
        let result = register_defined_by(&main, "= call i32 @f(");
        assert!(main.contains(&format!("{} = call i32 @f(i32 {})", result, value).as_str()));

        let f = function_body(&ir, "f");
        let loaded = register_defined_by(&f, "= load i32");
        assert!(f.contains(&format!("ret i32 {}", loaded).as_str()));
    }

    #[test]
    fn test_recursive_call_uses_result() {
        let ir = compile("int f(int n) { return f(n); } void main() { printi(f(3)); }");
        let main = function_body(&ir, "main");
        let result = register_defined_by(&main, "= call i32 @f(i32 3)");
        assert!(main.contains(&format!("call void @printi(i32 {})", result).as_str()));
    }

    #[test]
    fn test_functions_named_like_runtime_symbols_are_renamed() {
        let ir = compile(
            "void exit(int c) { } int printf(int n) { return n; } \
             void check_division(int d) { } \
             void main() { exit(1); printi(printf(2)); check_division(3); printi(4 / 2); }",
        );

        assert_eq!(ir.matches("declare void @exit(i32)").count(), 1);
        assert_eq!(ir.matches("define void @check_division(i32)").count(), 1);
        assert!(!ir.contains("define void @exit("));
        assert!(!ir.contains("define i32 @printf("));
        assert!(ir.contains("define void @fanc.exit(i32) {"));
        assert!(ir.contains("define i32 @fanc.printf(i32) {"));
        assert!(ir.contains("define void @fanc.check_division(i32) {"));

        let main = function_body(&ir, "main");
        assert!(main.contains(&"call void @fanc.exit(i32 1)"));
        assert!(main.contains(&"call void @fanc.check_division(i32 3)"));
        assert!(main.contains(&"call void @check_division(i32 2)"));
        let result = register_defined_by(&main, "= call i32 @fanc.printf(i32 2)");
        assert!(main.contains(&format!("call void @printi(i32 {})", result).as_str()));
    }

    #[test]
    fn test_unannotated_tree_is_rejected() {
        let program = Parser::new("void main() { printi(1); }").unwrap().parse().unwrap();
        let err = CodeGenerator::new().generate(&program).unwrap_err();
        assert!(matches!(err, CompileError::Codegen { .. }));
    }
}
