//! AST definitions

use crate::ir::SourceLocation;
use crate::semantic::Type;
use serde::Serialize;

/// Literal value; its primitive kind is fixed by the lexical form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LiteralValue {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

impl LiteralValue {
    pub fn kind(&self) -> Type {
        match self {
            LiteralValue::Int(_) => Type::Int,
            LiteralValue::Float(_) => Type::Float,
            LiteralValue::Str(_) => Type::String,
            LiteralValue::Bool(_) => Type::Bool,
        }
    }
}

/// Expression types
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    /// Literal
    Literal {
        value: LiteralValue,
        pos: SourceLocation,
    },
    /// Identifier
    Name { id: String, pos: SourceLocation },
    /// Binary operation (`pos` is the operator)
    BinOp {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
        pos: SourceLocation,
    },
    /// Unary operation
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
        pos: SourceLocation,
    },
    /// Function call with positional arguments
    Call {
        callee: String,
        args: Vec<Expr>,
        pos: SourceLocation,
    },
}

impl Expr {
    pub fn pos(&self) -> SourceLocation {
        match self {
            Expr::Literal { pos, .. }
            | Expr::Name { pos, .. }
            | Expr::BinOp { pos, .. }
            | Expr::UnaryOp { pos, .. }
            | Expr::Call { pos, .. } => *pos,
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    And,
    Or,
}

impl BinOp {
    /// Source spelling
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::LtEq => "<=",
            BinOp::GtEq => ">=",
            BinOp::And => "and",
            BinOp::Or => "or",
        }
    }

    /// Binding strength in the source grammar (higher binds tighter)
    pub fn precedence(&self) -> u8 {
        match self {
            BinOp::Or => 1,
            BinOp::And => 2,
            BinOp::Eq | BinOp::NotEq | BinOp::Lt | BinOp::Gt | BinOp::LtEq | BinOp::GtEq => 4,
            BinOp::Add | BinOp::Sub => 5,
            BinOp::Mul | BinOp::Div | BinOp::Mod => 6,
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Pos => "+",
            UnaryOp::Not => "not ",
        }
    }

    /// `not` sits between `and` and the comparisons; `-`/`+` bind tighter than `*`
    pub fn precedence(&self) -> u8 {
        match self {
            UnaryOp::Not => 3,
            UnaryOp::Neg | UnaryOp::Pos => 7,
        }
    }
}

/// Statement types
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Stmt {
    /// Function definition
    FunctionDef {
        name: String,
        params: Vec<Param>,
        return_type: Option<Type>,
        body: Vec<Stmt>,
        pos: SourceLocation,
    },
    /// If statement (`elif` chains arrive as a nested If in `else_branch`)
    If {
        condition: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Option<Vec<Stmt>>,
        pos: SourceLocation,
    },
    /// While loop
    While {
        condition: Expr,
        body: Vec<Stmt>,
        pos: SourceLocation,
    },
    /// Variable assignment, optionally annotated (`x: int = 1`)
    Assign {
        target: String,
        annotation: Option<Type>,
        value: Expr,
        pos: SourceLocation,
    },
    /// print(...)
    Print { argument: Expr, pos: SourceLocation },
    /// Bare call used as a statement
    Call {
        callee: String,
        args: Vec<Expr>,
        pos: SourceLocation,
    },
    /// Return statement
    Return {
        value: Option<Expr>,
        pos: SourceLocation,
    },
}

impl Stmt {
    pub fn pos(&self) -> SourceLocation {
        match self {
            Stmt::FunctionDef { pos, .. }
            | Stmt::If { pos, .. }
            | Stmt::While { pos, .. }
            | Stmt::Assign { pos, .. }
            | Stmt::Print { pos, .. }
            | Stmt::Call { pos, .. }
            | Stmt::Return { pos, .. } => *pos,
        }
    }
}

/// Function parameter with optional type hint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub name: String,
    pub type_hint: Option<Type>,
    pub pos: SourceLocation,
}

/// Program (collection of top-level statements)
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Program {
    pub statements: Vec<Stmt>,
}
