use super::ops::{IrBinOp, IrUnaryOp};
use crate::semantic::Type;
use serde::Serialize;
use std::fmt;

/// 組み込み関数の識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BuiltinId {
    Str,
    Int,
    Float,
    Abs,
    Len,
}

impl BuiltinId {
    /// ソース言語での関数名から識別子を引く
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "str" => Some(BuiltinId::Str),
            "int" => Some(BuiltinId::Int),
            "float" => Some(BuiltinId::Float),
            "abs" => Some(BuiltinId::Abs),
            "len" => Some(BuiltinId::Len),
            _ => None,
        }
    }

    /// ソース言語での関数名
    pub fn name(&self) -> &'static str {
        match self {
            BuiltinId::Str => "str",
            BuiltinId::Int => "int",
            BuiltinId::Float => "float",
            BuiltinId::Abs => "abs",
            BuiltinId::Len => "len",
        }
    }
}

/// IR 式 (型付き)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IrExpr {
    pub kind: IrExprKind,
    /// 解決済みの型
    pub ty: Type,
}

impl IrExpr {
    pub fn new(kind: IrExprKind, ty: Type) -> Self {
        Self { kind, ty }
    }

    pub fn int(value: i64) -> Self {
        Self::new(IrExprKind::IntLit(value), Type::Int)
    }

    pub fn float(value: f64) -> Self {
        Self::new(IrExprKind::FloatLit(value), Type::Float)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(IrExprKind::StringLit(value.into()), Type::String)
    }

    pub fn bool(value: bool) -> Self {
        Self::new(IrExprKind::BoolLit(value), Type::Bool)
    }

    pub fn var(name: impl Into<String>, ty: Type) -> Self {
        Self::new(IrExprKind::Var(name.into()), ty)
    }
}

/// IR 式の型（実体）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value")]
pub enum IrExprKind {
    // --- リテラル ---
    /// 整数リテラル
    IntLit(i64),
    /// 浮動小数点リテラル
    FloatLit(f64),
    /// 文字列リテラル (エスケープ解除済み)
    StringLit(String),
    /// 真偽値リテラル
    BoolLit(bool),

    // --- 変数 ---
    /// 変数参照
    Var(String),

    // --- 演算 ---
    /// 二項演算
    BinOp {
        left: Box<IrExpr>,
        op: IrBinOp,
        right: Box<IrExpr>,
    },
    /// 単項演算
    UnaryOp { op: IrUnaryOp, operand: Box<IrExpr> },

    // --- 呼び出し ---
    /// ユーザー定義関数の呼び出し
    Call { func: String, args: Vec<IrExpr> },
    /// 組み込み関数呼び出し
    Builtin { id: BuiltinId, arg: Box<IrExpr> },
}

impl fmt::Display for IrExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IrExprKind::IntLit(n) => write!(f, "{n}"),
            IrExprKind::FloatLit(x) => write!(f, "{x:?}"),
            IrExprKind::StringLit(s) => write!(f, "{s:?}"),
            IrExprKind::BoolLit(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            IrExprKind::Var(name) => write!(f, "{name}"),
            IrExprKind::BinOp { left, op, right } => {
                write!(f, "({} {left} {right})", op.mnemonic())
            }
            IrExprKind::UnaryOp { op, operand } => write!(f, "({} {operand})", op.mnemonic()),
            IrExprKind::Call { func, args } => {
                write!(f, "(call {func}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                write!(f, ")")
            }
            IrExprKind::Builtin { id, arg } => write!(f, "({} {arg})", id.name()),
        }
    }
}
