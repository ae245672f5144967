//! AST → source text
//!
//! Output uses four-space indentation and the fewest parentheses the precedence table
//! allows, so `parse(tokenize(unparse(p)))` rebuilds the same tree shape.

use super::ast::*;
use crate::lexer::{float_lexeme, quote_string};

const INDENT: &str = "    ";

/// Atoms (literals, names, calls) bind tighter than any operator
const ATOM_PRECEDENCE: u8 = 10;

/// Serialize a program back to source text
pub fn unparse(program: &Program) -> String {
    let mut out = String::new();
    for stmt in &program.statements {
        write_stmt(&mut out, stmt, 0);
    }
    out
}

fn write_block(out: &mut String, body: &[Stmt], level: usize) {
    if body.is_empty() {
        push_line(out, level, "pass");
        return;
    }
    for stmt in body {
        write_stmt(out, stmt, level);
    }
}

fn write_stmt(out: &mut String, stmt: &Stmt, level: usize) {
    match stmt {
        Stmt::FunctionDef {
            name,
            params,
            return_type,
            body,
            ..
        } => {
            let params: Vec<String> = params
                .iter()
                .map(|p| match p.type_hint {
                    Some(ty) => format!("{}: {}", p.name, ty.hint_name()),
                    None => p.name.clone(),
                })
                .collect();
            let ret = return_type
                .map(|ty| format!(" -> {}", ty.hint_name()))
                .unwrap_or_default();
            push_line(out, level, &format!("def {name}({}){ret}:", params.join(", ")));
            write_block(out, body, level + 1);
        }
        Stmt::If { .. } => write_if(out, stmt, level, "if"),
        Stmt::While {
            condition, body, ..
        } => {
            push_line(out, level, &format!("while {}:", expr(condition)));
            write_block(out, body, level + 1);
        }
        Stmt::Assign {
            target,
            annotation,
            value,
            ..
        } => {
            let line = match annotation {
                Some(ty) => format!("{target}: {} = {}", ty.hint_name(), expr(value)),
                None => format!("{target} = {}", expr(value)),
            };
            push_line(out, level, &line);
        }
        Stmt::Print { argument, .. } => {
            push_line(out, level, &format!("print({})", expr(argument)));
        }
        Stmt::Call { callee, args, .. } => {
            push_line(out, level, &call(callee, args));
        }
        Stmt::Return { value, .. } => match value {
            Some(v) => push_line(out, level, &format!("return {}", expr(v))),
            None => push_line(out, level, "return"),
        },
    }
}

/// An else branch holding exactly one If is written back as `elif`
fn write_if(out: &mut String, stmt: &Stmt, level: usize, keyword: &str) {
    let Stmt::If {
        condition,
        then_branch,
        else_branch,
        ..
    } = stmt
    else {
        return;
    };
    push_line(out, level, &format!("{keyword} {}:", expr(condition)));
    write_block(out, then_branch, level + 1);

    match else_branch.as_deref() {
        None => {}
        Some([nested @ Stmt::If { .. }]) => write_if(out, nested, level, "elif"),
        Some(body) => {
            push_line(out, level, "else:");
            write_block(out, body, level + 1);
        }
    }
}

fn push_line(out: &mut String, level: usize, text: &str) {
    for _ in 0..level {
        out.push_str(INDENT);
    }
    out.push_str(text);
    out.push('\n');
}

fn precedence(e: &Expr) -> u8 {
    match e {
        Expr::BinOp { op, .. } => op.precedence(),
        Expr::UnaryOp { op, .. } => op.precedence(),
        // a negative literal reads back as unary minus
        Expr::Literal {
            value: LiteralValue::Int(n),
            ..
        } if *n < 0 => UnaryOp::Neg.precedence(),
        Expr::Literal {
            value: LiteralValue::Float(x),
            ..
        } if x.is_sign_negative() => UnaryOp::Neg.precedence(),
        _ => ATOM_PRECEDENCE,
    }
}

fn wrapped(e: &Expr, needs_parens: bool) -> String {
    if needs_parens {
        format!("({})", expr(e))
    } else {
        expr(e)
    }
}

fn call(callee: &str, args: &[Expr]) -> String {
    let args: Vec<String> = args.iter().map(expr).collect();
    format!("{callee}({})", args.join(", "))
}

fn expr(e: &Expr) -> String {
    match e {
        Expr::Literal { value, .. } => match value {
            LiteralValue::Int(n) => n.to_string(),
            LiteralValue::Float(x) => float_lexeme(*x),
            LiteralValue::Str(s) => quote_string(s),
            LiteralValue::Bool(true) => "True".to_string(),
            LiteralValue::Bool(false) => "False".to_string(),
        },
        Expr::Name { id, .. } => id.clone(),
        Expr::BinOp {
            left, op, right, ..
        } => {
            let prec = op.precedence();
            // left-associative: a right operand of equal precedence needs parentheses
            format!(
                "{} {} {}",
                wrapped(left, precedence(left) < prec),
                op.symbol(),
                wrapped(right, precedence(right) <= prec)
            )
        }
        Expr::UnaryOp { op, operand, .. } => {
            format!(
                "{}{}",
                op.symbol(),
                wrapped(operand, precedence(operand) < op.precedence())
            )
        }
        Expr::Call { callee, args, .. } => call(callee, args),
    }
}
