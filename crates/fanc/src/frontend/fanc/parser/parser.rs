//! Recursive descent parser for FanC

use crate::common::{CompileError, CompileResult, Span};
use crate::frontend::fanc::ast::*;
use crate::frontend::fanc::lexer::{Lexer, Token, TokenKind};
use crate::types::Type;

/// Recursive descent parser for FanC
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given source
    pub fn new(source: &'a str) -> CompileResult<Self> {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token()?;
        Ok(Self { lexer, current })
    }

    /// Parse a complete program
    pub fn parse(&mut self) -> CompileResult<Program> {
        let start_span = self.current.span;
        let mut functions = Vec::new();

        while !self.at_end() {
            functions.push(self.parse_function()?);
        }

        let span = start_span.merge(self.current.span);
        Ok(Program::new(functions, span))
    }

    // =========================================================================
    // Helper methods
    // =========================================================================

    fn at_end(&self) -> bool {
        matches!(self.current.kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> CompileResult<Token> {
        let prev = std::mem::replace(&mut self.current, self.lexer.next_token()?);
        Ok(prev)
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    fn match_token(&mut self, kind: &TokenKind) -> CompileResult<bool> {
        if self.check(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, kind: TokenKind) -> CompileResult<Token> {
        if self.check(&kind) {
            self.advance()
        } else {
            Err(CompileError::parser(
                format!("expected {}, found {}", kind, self.current.kind),
                self.current.span,
            ))
        }
    }

    fn expect_identifier(&mut self) -> CompileResult<(String, Span)> {
        if let TokenKind::Identifier(name) = &self.current.kind {
            let name = name.clone();
            let token = self.advance()?;
            Ok((name, token.span))
        } else {
            Err(CompileError::parser(
                format!("expected identifier, found {}", self.current.kind),
                self.current.span,
            ))
        }
    }

    fn peek_next(&mut self) -> CompileResult<&TokenKind> {
        Ok(&self.lexer.peek()?.kind)
    }

    // =========================================================================
    // Types and declarations
    // =========================================================================

    fn parse_var_type(&mut self) -> CompileResult<Type> {
        let ty = match self.current.kind {
            TokenKind::Int => Type::Int,
            TokenKind::Byte => Type::Byte,
            TokenKind::Bool => Type::Bool,
            _ => {
                return Err(CompileError::parser(
                    format!("expected type, found {}", self.current.kind),
                    self.current.span,
                ));
            }
        };
        self.advance()?;
        Ok(ty)
    }

    fn parse_return_type(&mut self) -> CompileResult<Type> {
        if self.match_token(&TokenKind::Void)? {
            Ok(Type::Void)
        } else {
            self.parse_var_type()
        }
    }

    fn parse_function(&mut self) -> CompileResult<FuncDecl> {
        let start_span = self.current.span;
        let return_type = self.parse_return_type()?;
        let (name, _) = self.expect_identifier()?;

        self.expect(TokenKind::LParen)?;
        let params = self.parse_formals()?;
        self.expect(TokenKind::RParen)?;

        self.expect(TokenKind::LBrace)?;
        let body = self.parse_statements()?;
        let end = self.expect(TokenKind::RBrace)?;

        Ok(FuncDecl::new(name, return_type, params, body, start_span.merge(end.span)))
    }

    fn parse_formals(&mut self) -> CompileResult<Vec<Formal>> {
        let mut params = Vec::new();

        if self.check(&TokenKind::RParen) {
            return Ok(params);
        }

        loop {
            let start_span = self.current.span;
            let ty = self.parse_var_type()?;
            let (name, name_span) = self.expect_identifier()?;
            params.push(Formal::new(name, ty, start_span.merge(name_span)));

            if !self.match_token(&TokenKind::Comma)? {
                break;
            }
        }

        Ok(params)
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn parse_statements(&mut self) -> CompileResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            stmts.push(self.parse_statement()?);
        }
        Ok(stmts)
    }

    fn parse_statement(&mut self) -> CompileResult<Stmt> {
        let start_span = self.current.span;

        match &self.current.kind {
            TokenKind::LBrace => {
                self.advance()?;
                let stmts = self.parse_statements()?;
                let end = self.expect(TokenKind::RBrace)?;
                Ok(Stmt::new(StmtKind::Block(stmts), start_span.merge(end.span)))
            }

            TokenKind::If => self.parse_if_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::Return => self.parse_return_statement(),

            TokenKind::Break => {
                self.advance()?;
                let end = self.expect(TokenKind::Semi)?;
                Ok(Stmt::new(StmtKind::Break, start_span.merge(end.span)))
            }

            TokenKind::Continue => {
                self.advance()?;
                let end = self.expect(TokenKind::Semi)?;
                Ok(Stmt::new(StmtKind::Continue, start_span.merge(end.span)))
            }

            kind if kind.is_var_type() => self.parse_var_decl(),

            TokenKind::Identifier(_) => {
                if matches!(self.peek_next()?, TokenKind::Eq) {
                    self.parse_assignment()
                } else {
                    let call = self.parse_call()?;
                    let end = self.expect(TokenKind::Semi)?;
                    Ok(Stmt::new(StmtKind::Call(call), start_span.merge(end.span)))
                }
            }

            _ => Err(CompileError::parser(
                format!("expected statement, found {}", self.current.kind),
                start_span,
            )),
        }
    }

    fn parse_var_decl(&mut self) -> CompileResult<Stmt> {
        let start_span = self.current.span;
        let ty = self.parse_var_type()?;
        let (name, _) = self.expect_identifier()?;

        let init = if self.match_token(&TokenKind::Eq)? {
            Some(self.parse_expression()?)
        } else {
            None
        };

        let end = self.expect(TokenKind::Semi)?;
        let span = start_span.merge(end.span);

        let mut var = VarDecl::new(name, ty, span);
        if let Some(init) = init {
            var = var.with_init(init);
        }

        Ok(Stmt::new(StmtKind::VarDecl(var), span))
    }

    fn parse_assignment(&mut self) -> CompileResult<Stmt> {
        let (name, name_span) = self.expect_identifier()?;
        let target = Expr::new(ExprKind::Identifier(name), name_span);

        self.expect(TokenKind::Eq)?;
        let value = self.parse_expression()?;
        let end = self.expect(TokenKind::Semi)?;

        Ok(Stmt::new(
            StmtKind::Assign { target, value },
            name_span.merge(end.span),
        ))
    }

    fn parse_if_statement(&mut self) -> CompileResult<Stmt> {
        let start_span = self.current.span;
        self.expect(TokenKind::If)?;
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;

        let then_branch = Box::new(self.parse_statement()?);
        let mut span = start_span.merge(then_branch.span);

        let else_branch = if self.match_token(&TokenKind::Else)? {
            let stmt = self.parse_statement()?;
            span = span.merge(stmt.span);
            Some(Box::new(stmt))
        } else {
            None
        };

        Ok(Stmt::new(
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            },
            span,
        ))
    }

    fn parse_while_statement(&mut self) -> CompileResult<Stmt> {
        let start_span = self.current.span;
        self.expect(TokenKind::While)?;
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;

        let body = Box::new(self.parse_statement()?);
        let span = start_span.merge(body.span);

        Ok(Stmt::new(StmtKind::While { condition, body }, span))
    }

    fn parse_return_statement(&mut self) -> CompileResult<Stmt> {
        let start_span = self.current.span;
        self.expect(TokenKind::Return)?;

        let value = if self.check(&TokenKind::Semi) {
            None
        } else {
            Some(self.parse_expression()?)
        };

        let end = self.expect(TokenKind::Semi)?;
        Ok(Stmt::new(StmtKind::Return(value), start_span.merge(end.span)))
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn parse_expression(&mut self) -> CompileResult<Expr> {
        self.parse_or_expression()
    }

    fn parse_or_expression(&mut self) -> CompileResult<Expr> {
        let mut left = self.parse_and_expression()?;

        while self.match_token(&TokenKind::Or)? {
            let right = self.parse_and_expression()?;
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::Logical {
                    op: LogicalOp::Or,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }

        Ok(left)
    }

    fn parse_and_expression(&mut self) -> CompileResult<Expr> {
        let mut left = self.parse_equality_expression()?;

        while self.match_token(&TokenKind::And)? {
            let right = self.parse_equality_expression()?;
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::Logical {
                    op: LogicalOp::And,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }

        Ok(left)
    }

    fn parse_equality_expression(&mut self) -> CompileResult<Expr> {
        let mut left = self.parse_relational_expression()?;

        loop {
            let op = match &self.current.kind {
                TokenKind::EqEq => RelOp::Eq,
                TokenKind::NotEq => RelOp::Ne,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_relational_expression()?;
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::Relational {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }

        Ok(left)
    }

    fn parse_relational_expression(&mut self) -> CompileResult<Expr> {
        let mut left = self.parse_additive_expression()?;

        loop {
            let op = match &self.current.kind {
                TokenKind::Lt => RelOp::Lt,
                TokenKind::Gt => RelOp::Gt,
                TokenKind::LtEq => RelOp::Le,
                TokenKind::GtEq => RelOp::Ge,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_additive_expression()?;
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::Relational {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }

        Ok(left)
    }

    fn parse_additive_expression(&mut self) -> CompileResult<Expr> {
        let mut left = self.parse_multiplicative_expression()?;

        loop {
            let op = match &self.current.kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_multiplicative_expression()?;
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }

        Ok(left)
    }

    fn parse_multiplicative_expression(&mut self) -> CompileResult<Expr> {
        let mut left = self.parse_unary_expression()?;

        loop {
            let op = match &self.current.kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_unary_expression()?;
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }

        Ok(left)
    }

    fn parse_unary_expression(&mut self) -> CompileResult<Expr> {
        let start_span = self.current.span;

        if self.match_token(&TokenKind::Not)? {
            let operand = self.parse_unary_expression()?;
            let span = start_span.merge(operand.span);
            return Ok(Expr::new(ExprKind::Not(Box::new(operand)), span));
        }

        // (int) e / (byte) e
        if self.check(&TokenKind::LParen) && self.peek_next()?.is_var_type() {
            self.advance()?;
            let target = self.parse_var_type()?;
            self.expect(TokenKind::RParen)?;
            let operand = self.parse_unary_expression()?;
            let span = start_span.merge(operand.span);
            return Ok(Expr::new(
                ExprKind::Cast {
                    target,
                    expr: Box::new(operand),
                },
                span,
            ));
        }

        self.parse_primary_expression()
    }

    fn parse_call(&mut self) -> CompileResult<Expr> {
        let (callee, start_span) = self.expect_identifier()?;
        self.expect(TokenKind::LParen)?;
        let args = self.parse_argument_list()?;
        let end = self.expect(TokenKind::RParen)?;

        Ok(Expr::new(
            ExprKind::Call(CallExpr { callee, args }),
            start_span.merge(end.span),
        ))
    }

    fn parse_argument_list(&mut self) -> CompileResult<Vec<Expr>> {
        let mut args = Vec::new();

        if self.check(&TokenKind::RParen) {
            return Ok(args);
        }

        loop {
            args.push(self.parse_expression()?);
            if !self.match_token(&TokenKind::Comma)? {
                break;
            }
        }

        Ok(args)
    }

    fn parse_primary_expression(&mut self) -> CompileResult<Expr> {
        let span = self.current.span;

        match &self.current.kind {
            TokenKind::IntLiteral(s) => {
                let value = self.parse_int_literal(s)?;
                self.advance()?;
                Ok(Expr::new(ExprKind::IntLiteral(value), span))
            }
            TokenKind::ByteLiteral(s) => {
                let value = self.parse_byte_literal(s.trim_end_matches('b'));
                self.advance()?;
                Ok(Expr::new(ExprKind::ByteLiteral(value), span))
            }
            TokenKind::StringLiteral(s) => {
                let value = self.parse_string_literal(s)?;
                self.advance()?;
                Ok(Expr::new(ExprKind::StringLiteral(value), span))
            }
            TokenKind::True => {
                self.advance()?;
                Ok(Expr::new(ExprKind::BoolLiteral(true), span))
            }
            TokenKind::False => {
                self.advance()?;
                Ok(Expr::new(ExprKind::BoolLiteral(false), span))
            }
            TokenKind::Identifier(_) => {
                if matches!(self.peek_next()?, TokenKind::LParen) {
                    return self.parse_call();
                }
                let (name, _) = self.expect_identifier()?;
                Ok(Expr::new(ExprKind::Identifier(name), span))
            }
            TokenKind::LParen => {
                self.advance()?;
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            _ => Err(CompileError::parser(
                format!("unexpected token in expression: {}", self.current.kind),
                span,
            )),
        }
    }

    // =========================================================================
    // Literal parsing helpers
    // =========================================================================

    fn parse_int_literal(&self, s: &str) -> CompileResult<i64> {
        s.parse::<i32>().map(i64::from).map_err(|_| {
            CompileError::parser(
                format!("integer literal {} does not fit in int", s),
                self.current.span,
            )
        })
    }

    /// Digits too long for `i64` saturate; the analyzer rejects anything
    /// above 255 anyway.
    fn parse_byte_literal(&self, s: &str) -> i64 {
        s.parse().unwrap_or(i64::MAX)
    }

    fn parse_string_literal(&self, s: &str) -> CompileResult<String> {
        let inner = s
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
            .ok_or_else(|| CompileError::parser("unterminated string literal", self.current.span))?;

        let mut result = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                result.push(c);
                continue;
            }
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('t') => result.push('\t'),
                Some('r') => result.push('\r'),
                Some('0') => result.push('\0'),
                Some('"') => result.push('"'),
                Some('\\') => result.push('\\'),
                _ => {
                    return Err(CompileError::parser(
                        "invalid escape sequence in string literal",
                        self.current.span,
                    ));
                }
            }
        }

        Ok(result)
    }
}
