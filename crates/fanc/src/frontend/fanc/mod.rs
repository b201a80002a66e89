//! FanC language frontend
//!
//! This frontend handles:
//! - Lexing FanC source into tokens
//! - Parsing tokens into a FanC AST
//! - Semantic analysis (scopes, type checking, frame offsets)
//! - Lowering the annotated AST to LLVM IR

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod sema;

use crate::common::CompileResult;
use crate::frontend::{CompileContext, FrontendConfig};
use crate::ir::{CodeGenerator, IrModule};
use tracing::debug;

pub use ast::*;
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::Parser;
pub use sema::{ScopeTrace, SemanticAnalyzer};

/// FanC language frontend
pub struct FanCFrontend;

impl FanCFrontend {
    pub fn new() -> Self {
        Self
    }

    /// Parse and analyze `source`, returning the annotated program and the
    /// trace of every scope the analyzer opened.
    pub fn analyze(&self, source: &str) -> CompileResult<(Program, ScopeTrace)> {
        debug!("parsing");
        let mut program = Parser::new(source)?.parse()?;
        debug!(functions = program.functions.len(), "parsed program");

        debug!("analyzing");
        let mut analyzer = SemanticAnalyzer::new();
        analyzer.analyze(&mut program)?;

        Ok((program, analyzer.into_trace()))
    }

    fn run(&self, source: &str, config: &FrontendConfig) -> CompileResult<IrModule> {
        if config.dump_tokens {
            eprintln!("=== FanC Tokens ===");
            eprint!("{}", self.dump_tokens(source)?);
            eprintln!("=== End Tokens ===\n");
        }

        let (program, trace) = self.analyze(source)?;

        if config.dump_ast {
            eprintln!("=== FanC AST ===");
            eprintln!("{:#?}", program);
            eprintln!("=== End AST ===\n");
        }

        if config.dump_scopes {
            eprintln!("=== Scopes ===");
            eprint!("{}", trace);
            eprintln!("=== End Scopes ===\n");
        }

        debug!("generating IR");
        let module = CodeGenerator::new().generate(&program)?;
        debug!(functions = module.functions.len(), globals = module.globals.len(), "generated module");

        Ok(module)
    }

    /// Run the whole pipeline: lex -> parse -> analyze -> lower. The first
    /// error is reported through the context's reporter and returned.
    pub fn compile(
        &self,
        source: &str,
        ctx: &CompileContext,
        config: &FrontendConfig,
    ) -> CompileResult<IrModule> {
        debug!(file = %ctx.filename, "compiling");
        self.run(source, config).inspect_err(|e| {
            ctx.reporter.report_error(ctx.file_id, e);
        })
    }

    pub fn dump_tokens(&self, source: &str) -> CompileResult<String> {
        let tokens = Lexer::new(source).tokenize_all()?;
        let mut output = String::new();
        for token in &tokens {
            output.push_str(&format!("{:?}\n", token));
        }
        Ok(output)
    }

    pub fn dump_ast(&self, source: &str) -> CompileResult<String> {
        let ast = Parser::new(source)?.parse()?;
        Ok(format!("{:#?}", ast))
    }
}

impl Default for FanCFrontend {
    fn default() -> Self {
        Self::new()
    }
}
