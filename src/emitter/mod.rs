//! Emitter module - C++ code generation
//!
//! Each IR function is first folded back into if/else and while blocks
//! ([`structure`]), then printed with C++ operator precedence.

mod names;
mod structure;

pub use names::{cpp_name, is_reserved};
pub use structure::{structure, Node};

use crate::error::GenerationError;
use crate::ir::{BuiltinId, IrBinOp, IrExpr, IrExprKind, IrFunction, IrInstr, IrProgram, IrUnaryOp};
use crate::lexer::quote_string;
use crate::semantic::Type;
use log::debug;

/// Output formatting options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitOptions {
    /// Spaces per indentation level
    pub indent_width: usize,
    /// Emit forward declarations so functions may call ones defined later
    pub prototypes: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            indent_width: 4,
            prototypes: true,
        }
    }
}

/// Emit C++ code from IR
pub fn emit(ir: &IrProgram, options: &EmitOptions) -> Result<String, GenerationError> {
    let code = CppEmitter::new(options).emit_program(ir)?;
    debug!("emitter: generated {} bytes of C++", code.len());
    Ok(code)
}

// C++ precedence levels, higher binds tighter
const PREC_TERNARY: u8 = 2;
const PREC_OR: u8 = 4;
const PREC_AND: u8 = 5;
const PREC_EQUALITY: u8 = 9;
const PREC_RELATIONAL: u8 = 10;
const PREC_SHIFT: u8 = 11;
const PREC_ADDITIVE: u8 = 12;
const PREC_MULTIPLICATIVE: u8 = 13;
const PREC_UNARY: u8 = 15;
const PREC_POSTFIX: u8 = 16;

/// C++ code emitter
pub struct CppEmitter<'o> {
    options: &'o EmitOptions,
    indent: usize,
    out: String,
    /// `abs` was used, so `<cstdlib>` / `<cmath>` are needed
    needs_math: bool,
}

impl<'o> CppEmitter<'o> {
    pub fn new(options: &'o EmitOptions) -> Self {
        Self {
            options,
            indent: 0,
            out: String::new(),
            needs_math: false,
        }
    }

    pub fn emit_program(mut self, ir: &IrProgram) -> Result<String, GenerationError> {
        for function in &ir.functions {
            self.emit_function(function, &signature(function), false)?;
            self.out.push('\n');
        }
        self.emit_function(&ir.entry, "int main()", true)?;
        let definitions = std::mem::take(&mut self.out);

        let mut code = String::from("#include <iostream>\n#include <string>\n");
        if self.needs_math {
            code.push_str("#include <cstdlib>\n#include <cmath>\n");
        }
        code.push_str("\nusing namespace std;\n\n");
        if self.options.prototypes && !ir.functions.is_empty() {
            for function in &ir.functions {
                code.push_str(&signature(function));
                code.push_str(";\n");
            }
            code.push('\n');
        }
        code.push_str(&definitions);
        Ok(code)
    }

    fn emit_function(
        &mut self,
        function: &IrFunction,
        header: &str,
        is_entry: bool,
    ) -> Result<(), GenerationError> {
        let nodes = structure(function)?;
        self.line(&format!("{header} {{"));
        self.indent += 1;
        self.emit_block(&nodes);
        if is_entry {
            self.line("return 0;");
        }
        self.indent -= 1;
        self.line("}");
        Ok(())
    }

    fn emit_block(&mut self, nodes: &[Node<'_>]) {
        let mut i = 0;
        while i < nodes.len() {
            match &nodes[i] {
                // DECLARE directly followed by its first ASSIGN becomes one definition
                Node::Simple(instr @ IrInstr::Declare { name, ty }) => match nodes.get(i + 1) {
                    Some(Node::Simple(IrInstr::Assign { target, value })) if target == name => {
                        let value = self.expr(value);
                        self.line(&format!("{} {} = {value};", ty.to_cpp_string(), cpp_name(name)));
                        i += 1;
                    }
                    _ => self.emit_simple(instr),
                },
                Node::Simple(instr) => self.emit_simple(instr),
                Node::If {
                    cond,
                    then_branch,
                    else_branch,
                } => self.emit_if(cond, then_branch, else_branch.as_deref(), false),
                Node::While { cond, body } => {
                    let cond = self.expr(cond);
                    self.line(&format!("while ({cond}) {{"));
                    self.nested(body);
                    self.line("}");
                }
            }
            i += 1;
        }
    }

    /// `else_if` continues the previous line's `} else `
    fn emit_if(
        &mut self,
        cond: &IrExpr,
        then_branch: &[Node<'_>],
        else_branch: Option<&[Node<'_>]>,
        else_if: bool,
    ) {
        let cond = self.expr(cond);
        let head = format!("if ({cond}) {{");
        if else_if {
            self.out.push_str(&head);
            self.out.push('\n');
        } else {
            self.line(&head);
        }
        self.nested(then_branch);

        match else_branch {
            None => self.line("}"),
            Some(
                [Node::If {
                    cond,
                    then_branch,
                    else_branch,
                }],
            ) => {
                self.push_indent();
                self.out.push_str("} else ");
                self.emit_if(cond, then_branch, else_branch.as_deref(), true);
            }
            Some(body) => {
                self.line("} else {");
                self.nested(body);
                self.line("}");
            }
        }
    }

    fn emit_simple(&mut self, instr: &IrInstr) {
        let text = match instr {
            IrInstr::Declare { name, ty } => {
                format!("{} {}{{}};", ty.to_cpp_string(), cpp_name(name))
            }
            IrInstr::Assign { target, value } => {
                format!("{} = {};", cpp_name(target), self.expr(value))
            }
            IrInstr::Print { value } => {
                let shown = if value.ty == Type::Bool {
                    format!("({} ? \"True\" : \"False\")", self.expr_prec(value, PREC_TERNARY + 1))
                } else {
                    self.expr_prec(value, PREC_SHIFT + 1)
                };
                format!("cout << {shown} << endl;")
            }
            IrInstr::Call { callee, args } => match BuiltinId::from_name(callee) {
                Some(id) if args.len() == 1 => format!("{};", self.builtin(id, &args[0]).0),
                _ => format!("{};", self.call(callee, args)),
            },
            IrInstr::Return(Some(value)) => format!("return {};", self.expr(value)),
            IrInstr::Return(None) => "return;".to_string(),
            // control flow is folded into Node::If / Node::While
            IrInstr::Label(_)
            | IrInstr::Jump(_)
            | IrInstr::JumpIfFalse { .. }
            | IrInstr::FuncBegin { .. }
            | IrInstr::FuncEnd => return,
        };
        self.line(&text);
    }

    fn nested(&mut self, nodes: &[Node<'_>]) {
        self.indent += 1;
        self.emit_block(nodes);
        self.indent -= 1;
    }

    fn push_indent(&mut self) {
        let width = self.indent * self.options.indent_width;
        self.out.extend(std::iter::repeat(' ').take(width));
    }

    fn line(&mut self, text: &str) {
        self.push_indent();
        self.out.push_str(text);
        self.out.push('\n');
    }

    // --- expressions ---

    fn expr(&mut self, expr: &IrExpr) -> String {
        self.emit_expr(expr).0
    }

    /// Render `expr`, parenthesized when it binds looser than `min_prec`
    fn expr_prec(&mut self, expr: &IrExpr, min_prec: u8) -> String {
        let (text, prec) = self.emit_expr(expr);
        if prec < min_prec {
            format!("({text})")
        } else {
            text
        }
    }

    fn emit_expr(&mut self, expr: &IrExpr) -> (String, u8) {
        match &expr.kind {
            IrExprKind::IntLit(n) => (n.to_string(), if *n < 0 { PREC_UNARY } else { PREC_POSTFIX }),
            IrExprKind::FloatLit(x) => (
                format!("{x:?}"),
                if x.is_sign_negative() { PREC_UNARY } else { PREC_POSTFIX },
            ),
            IrExprKind::StringLit(s) => (quote_string(s), PREC_POSTFIX),
            IrExprKind::BoolLit(b) => (b.to_string(), PREC_POSTFIX),
            IrExprKind::Var(name) => (cpp_name(name).into_owned(), PREC_POSTFIX),
            IrExprKind::BinOp { left, op, right } => self.binop(left, *op, right),
            IrExprKind::UnaryOp { op, operand } => {
                let symbol = match op {
                    IrUnaryOp::Neg => "-",
                    IrUnaryOp::Pos => "+",
                    IrUnaryOp::Not => "!",
                };
                let mut inner = self.expr_prec(operand, PREC_UNARY);
                // keep `- -x` from becoming the decrement operator
                if inner.starts_with(&['-', '+'][..]) {
                    inner = format!("({inner})");
                }
                (format!("{symbol}{inner}"), PREC_UNARY)
            }
            IrExprKind::Call { func, args } => (self.call(func, args), PREC_POSTFIX),
            IrExprKind::Builtin { id, arg } => self.builtin(*id, arg),
        }
    }

    fn binop(&mut self, left: &IrExpr, op: IrBinOp, right: &IrExpr) -> (String, u8) {
        let (symbol, prec) = match op {
            IrBinOp::Add | IrBinOp::Concat => ("+", PREC_ADDITIVE),
            IrBinOp::Sub => ("-", PREC_ADDITIVE),
            IrBinOp::Mul => ("*", PREC_MULTIPLICATIVE),
            IrBinOp::Div => ("/", PREC_MULTIPLICATIVE),
            IrBinOp::Mod => ("%", PREC_MULTIPLICATIVE),
            IrBinOp::Eq => ("==", PREC_EQUALITY),
            IrBinOp::NotEq => ("!=", PREC_EQUALITY),
            IrBinOp::Lt => ("<", PREC_RELATIONAL),
            IrBinOp::Gt => (">", PREC_RELATIONAL),
            IrBinOp::LtEq => ("<=", PREC_RELATIONAL),
            IrBinOp::GtEq => (">=", PREC_RELATIONAL),
            IrBinOp::And => ("&&", PREC_AND),
            IrBinOp::Or => ("||", PREC_OR),
        };

        // two C string literals cannot be added or compared by value
        let both_literals = left.ty == Type::String
            && matches!(left.kind, IrExprKind::StringLit(_))
            && matches!(right.kind, IrExprKind::StringLit(_));
        let left_text = if both_literals {
            format!("string({})", self.expr(left))
        } else {
            self.expr_prec(left, prec)
        };
        let right_text = self.expr_prec(right, prec + 1);
        (format!("{left_text} {symbol} {right_text}"), prec)
    }

    fn call(&mut self, func: &str, args: &[IrExpr]) -> String {
        let args: Vec<String> = args.iter().map(|a| self.expr(a)).collect();
        format!("{}({})", cpp_name(func), args.join(", "))
    }

    fn builtin(&mut self, id: BuiltinId, arg: &IrExpr) -> (String, u8) {
        let literal = matches!(arg.kind, IrExprKind::StringLit(_));
        let text = match (id, arg.ty) {
            (BuiltinId::Str, Type::String) if literal => format!("string({})", self.expr(arg)),
            (BuiltinId::Str, Type::String) => return self.emit_expr(arg),
            (BuiltinId::Str, Type::Bool) => {
                let cond = self.expr_prec(arg, PREC_TERNARY + 1);
                format!("string({cond} ? \"True\" : \"False\")")
            }
            (BuiltinId::Str, _) => format!("to_string({})", self.expr(arg)),
            (BuiltinId::Int, Type::String) => format!("stoll({})", self.expr(arg)),
            (BuiltinId::Int, _) => format!("static_cast<long long>({})", self.expr(arg)),
            (BuiltinId::Float, Type::String) => format!("stod({})", self.expr(arg)),
            (BuiltinId::Float, _) => format!("static_cast<double>({})", self.expr(arg)),
            (BuiltinId::Abs, _) => {
                self.needs_math = true;
                format!("abs({})", self.expr(arg))
            }
            (BuiltinId::Len, _) if literal => {
                format!("static_cast<long long>(string({}).size())", self.expr(arg))
            }
            (BuiltinId::Len, _) => {
                let target = self.expr_prec(arg, PREC_POSTFIX);
                format!("static_cast<long long>({target}.size())")
            }
        };
        (text, PREC_POSTFIX)
    }
}

/// `ret name(T a, T b)`
fn signature(function: &IrFunction) -> String {
    let params: Vec<String> = function
        .params
        .iter()
        .map(|(name, ty)| format!("{} {}", ty.to_cpp_string(), cpp_name(name)))
        .collect();
    format!(
        "{} {}({})",
        function.ret.to_cpp_string(),
        cpp_name(&function.name),
        params.join(", ")
    )
}

#[cfg(test)]
mod tests;
