//! Error types for the pycpp translator
//!
//! One error type per pipeline stage. A translation aborts at the first error, so the
//! stage that produced it is always the earliest failing one.

use crate::ir::{IrOp, SourceLocation};
use crate::lexer::Token;
use serde::Serialize;
use thiserror::Error;

/// Pipeline stage that reported an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Lexical,
    Syntax,
    Semantic,
    Generation,
}

impl Stage {
    /// Process exit code recommended for a failure in this stage
    pub fn exit_code(&self) -> i32 {
        match self {
            Stage::Lexical => 1,
            Stage::Syntax => 2,
            Stage::Semantic => 3,
            Stage::Generation => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Lexical => "lexical",
            Stage::Syntax => "syntax",
            Stage::Semantic => "semantic",
            Stage::Generation => "generation",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Tokenizer failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexicalError {
    #[error("Lexical error at line {line}, column {column}: unexpected character {character:?}")]
    UnexpectedCharacter {
        line: usize,
        column: usize,
        character: char,
    },

    #[error("Lexical error at line {line}, column {column}: unterminated string literal")]
    UnterminatedString {
        line: usize,
        column: usize,
        quote: char,
    },

    #[error(
        "Lexical error at line {line}, column {column}: unindent does not match any outer indentation level"
    )]
    InconsistentDedent {
        line: usize,
        column: usize,
        character: char,
    },
}

impl LexicalError {
    pub fn line(&self) -> usize {
        match self {
            LexicalError::UnexpectedCharacter { line, .. }
            | LexicalError::UnterminatedString { line, .. }
            | LexicalError::InconsistentDedent { line, .. } => *line,
        }
    }

    pub fn column(&self) -> usize {
        match self {
            LexicalError::UnexpectedCharacter { column, .. }
            | LexicalError::UnterminatedString { column, .. }
            | LexicalError::InconsistentDedent { column, .. } => *column,
        }
    }

    /// The character at the reported position
    pub fn offending_character(&self) -> char {
        match self {
            LexicalError::UnexpectedCharacter { character, .. }
            | LexicalError::InconsistentDedent { character, .. } => *character,
            LexicalError::UnterminatedString { quote, .. } => *quote,
        }
    }
}

/// Grammar mismatch reported by the parser
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Syntax error at {position}: expected {expected}, found {found}")]
pub struct SyntaxError {
    pub expected: String,
    pub found: Token,
    pub position: SourceLocation,
}

impl SyntaxError {
    pub fn new(expected: impl Into<String>, found: &Token) -> Self {
        Self {
            expected: expected.into(),
            found: found.clone(),
            position: found.location(),
        }
    }
}

/// Binding or typing failure found while lowering the AST to IR
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticError {
    #[error("Semantic error at {position}: name '{identifier}' is not defined")]
    UnboundName {
        identifier: String,
        position: SourceLocation,
    },

    #[error("Semantic error at {position}: type mismatch: {reason}")]
    TypeMismatch {
        reason: String,
        position: SourceLocation,
    },

    #[error(
        "Semantic error at {position}: {callee}() takes {expected} argument(s) but {found} were given"
    )]
    ArityMismatch {
        callee: String,
        expected: usize,
        found: usize,
        position: SourceLocation,
    },
}

impl SemanticError {
    pub fn type_mismatch(reason: impl Into<String>, position: SourceLocation) -> Self {
        SemanticError::TypeMismatch {
            reason: reason.into(),
            position,
        }
    }

    pub fn position(&self) -> SourceLocation {
        match self {
            SemanticError::UnboundName { position, .. }
            | SemanticError::TypeMismatch { position, .. }
            | SemanticError::ArityMismatch { position, .. } => *position,
        }
    }
}

/// IR that the code generator cannot translate. Signals an internal defect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Generation error at {op}: {message}")]
pub struct GenerationError {
    pub op: IrOp,
    pub message: String,
}

impl GenerationError {
    pub fn new(op: IrOp, message: impl Into<String>) -> Self {
        Self {
            op,
            message: message.into(),
        }
    }
}

/// Error from any stage of a full translation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    #[error(transparent)]
    Lexical(#[from] LexicalError),

    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Semantic(#[from] SemanticError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

impl TranslateError {
    pub fn stage(&self) -> Stage {
        match self {
            TranslateError::Lexical(_) => Stage::Lexical,
            TranslateError::Syntax(_) => Stage::Syntax,
            TranslateError::Semantic(_) => Stage::Semantic,
            TranslateError::Generation(_) => Stage::Generation,
        }
    }

    /// 1-based line, 0 when the stage has no source position
    pub fn line(&self) -> usize {
        match self {
            TranslateError::Lexical(e) => e.line(),
            TranslateError::Syntax(e) => e.position.line,
            TranslateError::Semantic(e) => e.position().line,
            TranslateError::Generation(_) => 0,
        }
    }

    pub fn column(&self) -> usize {
        match self {
            TranslateError::Lexical(e) => e.column(),
            TranslateError::Syntax(e) => e.position.column,
            TranslateError::Semantic(e) => e.position().column,
            TranslateError::Generation(_) => 0,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.stage().exit_code()
    }
}

pub type Result<T> = std::result::Result<T, TranslateError>;
