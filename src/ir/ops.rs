//! IR Operator Definitions
use serde::Serialize;
use std::fmt;
//
// 中間表現での演算子を定義する。
// - 命令の種類 (IrOp)
// - 二項演算子 (IrBinOp)
// - 単項演算子 (IrUnaryOp)

/// IR 命令の種類 (閉じた集合)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IrOp {
    Declare,
    Assign,
    Print,
    Call,
    Label,
    Jump,
    JumpIfFalse,
    Return,
    FuncBegin,
    FuncEnd,
}

impl IrOp {
    pub fn name(&self) -> &'static str {
        match self {
            IrOp::Declare => "DECLARE",
            IrOp::Assign => "ASSIGN",
            IrOp::Print => "PRINT",
            IrOp::Call => "CALL",
            IrOp::Label => "LABEL",
            IrOp::Jump => "JUMP",
            IrOp::JumpIfFalse => "JUMPIFFALSE",
            IrOp::Return => "RETURN",
            IrOp::FuncBegin => "FUNC_BEGIN",
            IrOp::FuncEnd => "FUNC_END",
        }
    }
}

impl fmt::Display for IrOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// IR 二項演算子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IrBinOp {
    // 算術演算子
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // 文字列連結 (string + string)
    Concat,

    // 比較演算子
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,

    // 論理演算子
    And,
    Or,
}

impl IrBinOp {
    /// IR ダンプでの表記
    pub fn mnemonic(&self) -> &'static str {
        match self {
            IrBinOp::Add => "add",
            IrBinOp::Sub => "sub",
            IrBinOp::Mul => "mul",
            IrBinOp::Div => "div",
            IrBinOp::Mod => "mod",
            IrBinOp::Concat => "concat",
            IrBinOp::Eq => "eq",
            IrBinOp::NotEq => "ne",
            IrBinOp::Lt => "lt",
            IrBinOp::Gt => "gt",
            IrBinOp::LtEq => "le",
            IrBinOp::GtEq => "ge",
            IrBinOp::And => "and",
            IrBinOp::Or => "or",
        }
    }
}

/// IR 単項演算子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IrUnaryOp {
    /// 符号反転
    Neg,
    /// 単項プラス
    Pos,
    /// 論理否定
    Not,
}

impl IrUnaryOp {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            IrUnaryOp::Neg => "neg",
            IrUnaryOp::Pos => "pos",
            IrUnaryOp::Not => "not",
        }
    }
}
