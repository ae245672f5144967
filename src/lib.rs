//! pycpp - Python subset to C++ translator
//!
//! # Overview
//! A four-stage pipeline: tokenizer → parser → IR lowering → C++ code generation.
//! Every stage is a pure function over the previous stage's output and fails with its
//! own error type; [`translate`] runs them all.
//!
//! ```
//! let cpp = pycpp::translate("x = 5\nprint(x)\n").unwrap();
//! assert!(cpp.contains("long long x = 5;"));
//! ```

pub mod diagnostics;
pub mod emitter;
pub mod error;
pub mod ir;
pub mod lexer;
pub mod parser;
pub mod semantic;

pub use diagnostics::Diagnostic;
pub use emitter::{emit, EmitOptions};
pub use error::{
    GenerationError, LexicalError, SemanticError, Stage, SyntaxError, TranslateError,
};
pub use ir::IrProgram;
pub use lexer::{tokenize, Token, TokenKind};
pub use parser::{parse, unparse, Program};
pub use semantic::lower;

use serde::Serialize;
use std::path::Path;

/// Every intermediate artifact of one translation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Translation {
    pub tokens: Vec<Token>,
    pub ast: Program,
    pub ir: IrProgram,
    pub code: String,
}

/// Translate source text to C++ with default options
pub fn translate(source: &str) -> error::Result<String> {
    translate_with_options(source, &EmitOptions::default())
}

/// Translate source text to C++
pub fn translate_with_options(source: &str, options: &EmitOptions) -> error::Result<String> {
    translate_stages(source, options).map(|t| t.code)
}

/// Run the whole pipeline and keep each stage's output
pub fn translate_stages(source: &str, options: &EmitOptions) -> error::Result<Translation> {
    let tokens = tokenize(source)?;
    let ast = parse(&tokens)?;
    let ir = lower(&ast)?;
    let code = emit(&ir, options)?;
    Ok(Translation {
        tokens,
        ast,
        ir,
        code,
    })
}

/// Translate source text, reporting failure as a [`Diagnostic`]
pub fn translate_with_diagnostics(
    source: &str,
    file: Option<&Path>,
) -> Result<String, Diagnostic> {
    translate(source).map_err(|err| Diagnostic::from_error(&err, file))
}
