//! pycpp CLI - Python subset to C++ translator

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, LevelFilter};
use pycpp::{Diagnostic, EmitOptions, Translation};
use std::io::Read;
use std::path::{Path, PathBuf};

/// pycpp - Python subset to C++ translator
#[derive(Parser, Debug)]
#[command(name = "pycpp")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Translate a small Python subset to C++", long_about = None)]
struct Cli {
    /// Input Python file ('-' or omitted: standard input)
    #[arg(value_name = "INPUT", conflicts_with = "source")]
    input: Option<PathBuf>,

    /// Inline source text
    #[arg(short = 'e', long, value_name = "TEXT")]
    source: Option<String>,

    /// Output C++ file (default: standard output)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Print the token stream
    #[arg(long)]
    dump_tokens: bool,

    /// Print the syntax tree
    #[arg(long)]
    dump_ast: bool,

    /// Print the intermediate representation
    #[arg(long)]
    dump_ir: bool,

    /// Print dumps as JSON
    #[arg(long)]
    json: bool,

    /// Check only (don't generate output)
    #[arg(short, long)]
    check: bool,

    /// Emit JSON diagnostics to stderr (on failure only)
    #[arg(long)]
    diag_json: bool,

    /// Spaces per indentation level in generated code
    #[arg(long, value_name = "N", default_value_t = 4)]
    indent: usize,

    /// Omit function prototypes
    #[arg(long)]
    no_prototypes: bool,

    /// Show debug information
    #[arg(short, long)]
    debug: bool,
}

impl Cli {
    fn file(&self) -> Option<&Path> {
        self.input
            .as_deref()
            .filter(|p| p.as_os_str() != "-")
    }

    fn dumps(&self) -> bool {
        self.dump_tokens || self.dump_ast || self.dump_ir
    }

    fn emit_options(&self) -> EmitOptions {
        EmitOptions {
            indent_width: self.indent,
            prototypes: !self.no_prototypes,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let source = read_source(&cli)?;
    debug!("source length: {} bytes", source.len());

    let translation = match pycpp::translate_stages(&source, &cli.emit_options()) {
        Ok(t) => t,
        Err(err) => {
            let diag = Diagnostic::from_error(&err, cli.file());
            eprintln!("{}", diag.to_text());
            if cli.diag_json {
                eprintln!("{}", diag.to_json());
            }
            std::process::exit(diag.exit_code());
        }
    };

    if cli.check {
        println!("translation successful");
        return Ok(());
    }

    if cli.dumps() {
        dump(&cli, &translation)?;
        return Ok(());
    }

    match &cli.output {
        Some(path) => {
            std::fs::write(path, &translation.code)
                .with_context(|| format!("failed to write {}", path.display()))?;
            debug!("wrote {}", path.display());
        }
        None => print!("{}", translation.code),
    }
    Ok(())
}

fn read_source(cli: &Cli) -> Result<String> {
    if let Some(text) = &cli.source {
        return Ok(text.clone());
    }
    match cli.file() {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read standard input")?;
            Ok(buf)
        }
    }
}

fn dump(cli: &Cli, t: &Translation) -> Result<()> {
    if cli.json {
        let mut stages = serde_json::Map::new();
        if cli.dump_tokens {
            stages.insert("tokens".to_string(), serde_json::to_value(&t.tokens)?);
        }
        if cli.dump_ast {
            stages.insert("ast".to_string(), serde_json::to_value(&t.ast)?);
        }
        if cli.dump_ir {
            stages.insert("ir".to_string(), serde_json::to_value(&t.ir)?);
        }
        println!("{}", serde_json::to_string_pretty(&stages)?);
        return Ok(());
    }

    if cli.dump_tokens {
        println!("=== Tokens ===");
        for (i, tok) in t.tokens.iter().enumerate() {
            println!("[{i:03}] {tok}");
        }
    }
    if cli.dump_ast {
        println!("=== Syntax Tree ===");
        print!("{}", pycpp::unparse(&t.ast));
    }
    if cli.dump_ir {
        println!("=== Intermediate Representation (IR) ===");
        print!("{}", t.ir);
    }
    Ok(())
}
