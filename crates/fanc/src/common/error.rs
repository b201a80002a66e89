//! Error types and diagnostic reporting

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::{Files, SimpleFiles};
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, NoColor, StandardStream, WriteColor};
use thiserror::Error;
use super::Span;
use crate::types::Type;

/// A violation of the FanC static semantics
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SemanticError {
    #[error("identifier '{0}' is already defined in this scope")]
    DuplicateDeclaration(String),

    #[error("identifier '{0}' is not defined")]
    UndeclaredIdentifier(String),

    #[error("'{0}' is a function and cannot be used as a value")]
    IdentifierIsFunction(String),

    #[error("'{0}' is not a function")]
    IdentifierIsNotFunction(String),

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: Type },

    #[error("byte literal {0} is out of range (maximum is 255)")]
    ValueOutOfRange(i64),

    #[error("function '{function}' expects {expected} argument(s), found {found}")]
    ArityMismatch {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("'{0}' statement outside of a loop")]
    MisplacedLoopControl(&'static str),

    #[error("'main' must be defined once, take no parameters and return void")]
    InvalidMainSignature,

    #[error("program has no 'main' function")]
    MissingMain,
}

impl SemanticError {
    pub fn mismatch(expected: impl ToString, found: Type) -> Self {
        Self::TypeMismatch {
            expected: expected.to_string(),
            found,
        }
    }
}

/// Compile error with source location
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Lexer error at {span:?}: {message}")]
    Lexer { message: String, span: Span },

    #[error("Parser error at {span:?}: {message}")]
    Parser { message: String, span: Span },

    #[error("Semantic error at {span:?}: {error}")]
    Semantic { error: SemanticError, span: Span },

    #[error("Code generation error: {message}")]
    Codegen { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompileError {
    pub fn lexer(message: impl Into<String>, span: Span) -> Self {
        Self::Lexer {
            message: message.into(),
            span,
        }
    }

    pub fn parser(message: impl Into<String>, span: Span) -> Self {
        Self::Parser {
            message: message.into(),
            span,
        }
    }

    pub fn semantic(error: SemanticError, span: Span) -> Self {
        Self::Semantic { error, span }
    }

    pub fn codegen(message: impl Into<String>) -> Self {
        Self::Codegen {
            message: message.into(),
        }
    }

    /// Source location of the error, if it has one
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Lexer { span, .. } | Self::Parser { span, .. } | Self::Semantic { span, .. } => {
                Some(*span)
            }
            Self::Codegen { .. } | Self::Io(_) => None,
        }
    }

    pub fn as_semantic(&self) -> Option<&SemanticError> {
        match self {
            Self::Semantic { error, .. } => Some(error),
            _ => None,
        }
    }
}

pub type CompileResult<T> = Result<T, CompileError>;

/// Diagnostic reporter for pretty error output
pub struct DiagnosticReporter {
    files: SimpleFiles<String, String>,
    writer: StandardStream,
    config: term::Config,
}

impl DiagnosticReporter {
    pub fn new() -> Self {
        Self {
            files: SimpleFiles::new(),
            writer: StandardStream::stderr(ColorChoice::Auto),
            config: term::Config::default(),
        }
    }

    pub fn add_file(&mut self, name: impl Into<String>, source: impl Into<String>) -> usize {
        self.files.add(name.into(), source.into())
    }

    /// 1-based line number of the start of `span`
    pub fn line_of(&self, file_id: usize, span: Span) -> Option<usize> {
        self.files
            .line_index(file_id, span.start)
            .ok()
            .map(|index| index + 1)
    }

    pub fn report_error(&self, file_id: usize, error: &CompileError) {
        let diagnostic = Self::diagnostic(file_id, error);
        let _ = term::emit(&mut self.writer.lock(), &self.config, &self.files, &diagnostic);
    }

    /// Render an error without colors, as it would appear on the terminal
    pub fn render(&self, file_id: usize, error: &CompileError) -> String {
        let mut buffer = NoColor::new(Vec::new());
        self.emit_to(&mut buffer, file_id, error);
        String::from_utf8_lossy(buffer.get_ref()).into_owned()
    }

    fn emit_to(&self, writer: &mut dyn WriteColor, file_id: usize, error: &CompileError) {
        let diagnostic = Self::diagnostic(file_id, error);
        let _ = term::emit(writer, &self.config, &self.files, &diagnostic);
    }

    fn diagnostic(file_id: usize, error: &CompileError) -> Diagnostic<usize> {
        match error {
            CompileError::Lexer { message, span } => Diagnostic::error()
                .with_message("Lexer error")
                .with_labels(vec![
                    Label::primary(file_id, span.range()).with_message(message)
                ]),

            CompileError::Parser { message, span } => Diagnostic::error()
                .with_message("Syntax error")
                .with_labels(vec![
                    Label::primary(file_id, span.range()).with_message(message)
                ]),

            CompileError::Semantic { error, span } => Diagnostic::error()
                .with_message("Semantic error")
                .with_labels(vec![
                    Label::primary(file_id, span.range()).with_message(error.to_string())
                ]),

            CompileError::Codegen { message } => {
                Diagnostic::error().with_message(format!("Code generation error: {}", message))
            }

            CompileError::Io(err) => {
                Diagnostic::error().with_message(format!("IO error: {}", err))
            }
        }
    }
}

impl Default for DiagnosticReporter {
    fn default() -> Self {
        Self::new()
    }
}
