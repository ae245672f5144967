//! Diagnostics - structured error output for the command line

use crate::error::{LexicalError, SemanticError, Stage, TranslateError};
use serde::Serialize;
use std::path::Path;

/// One translation failure, ready to print as text or JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub stage: Stage,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// 1-based; 0 when the stage has no source position
    pub line: usize,
    pub column: usize,
}

impl Diagnostic {
    pub fn from_error(err: &TranslateError, file: Option<&Path>) -> Self {
        let (code, message) = match err {
            TranslateError::Lexical(e) => {
                let message = match e {
                    LexicalError::UnexpectedCharacter { character, .. } => {
                        format!("unexpected character {character:?}")
                    }
                    LexicalError::UnterminatedString { .. } => {
                        "unterminated string literal".to_string()
                    }
                    LexicalError::InconsistentDedent { .. } => {
                        "unindent does not match any outer indentation level".to_string()
                    }
                };
                ("PYCPP-LEXICAL", message)
            }
            TranslateError::Syntax(e) => (
                "PYCPP-SYNTAX",
                format!("expected {}, found {}", e.expected, e.found),
            ),
            TranslateError::Semantic(e) => match e {
                SemanticError::UnboundName { identifier, .. } => (
                    "PYCPP-UNBOUND-NAME",
                    format!("name '{identifier}' is not defined"),
                ),
                SemanticError::TypeMismatch { reason, .. } => {
                    ("PYCPP-TYPE-MISMATCH", format!("type mismatch: {reason}"))
                }
                SemanticError::ArityMismatch {
                    callee,
                    expected,
                    found,
                    ..
                } => (
                    "PYCPP-ARITY-MISMATCH",
                    format!("{callee}() takes {expected} argument(s) but {found} were given"),
                ),
            },
            TranslateError::Generation(e) => {
                ("PYCPP-GENERATION", format!("{}: {}", e.op, e.message))
            }
        };

        Self {
            stage: err.stage(),
            code: code.to_string(),
            message,
            file: file.map(|p| p.display().to_string()),
            line: err.line(),
            column: err.column(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.stage.exit_code()
    }

    /// `[CODE] file:line:column message`
    pub fn to_text(&self) -> String {
        let file = self.file.as_deref().unwrap_or("<input>");
        if self.line == 0 {
            format!("[{}] {}: {}", self.code, file, self.message)
        } else {
            format!(
                "[{}] {}:{}:{} {}",
                self.code, file, self.line, self.column, self.message
            )
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

impl From<TranslateError> for Diagnostic {
    fn from(err: TranslateError) -> Self {
        Diagnostic::from_error(&err, None)
    }
}
