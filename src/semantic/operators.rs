//! Operator conversion module
//!
//! 演算子の AST → IR 変換と型規則を提供する。
//! - 二項演算子 (BinOp) の変換と結果型
//! - 単項演算子 (UnaryOp) の変換と結果型

use super::Type;
use crate::ir::{IrBinOp, IrUnaryOp};
use crate::parser::{BinOp as AstBinOp, UnaryOp as AstUnaryOp};

/// AST の BinOp を IR の IrBinOp に変換する
///
/// 文字列連結 (`Concat`) は型に依存するため、ここでは `Add` のまま返す。
/// 型付きの変換は [`binop_result`] を使う。
pub fn convert_binop(op: &AstBinOp) -> IrBinOp {
    match op {
        AstBinOp::Add => IrBinOp::Add,
        AstBinOp::Sub => IrBinOp::Sub,
        AstBinOp::Mul => IrBinOp::Mul,
        AstBinOp::Div => IrBinOp::Div,
        AstBinOp::Mod => IrBinOp::Mod,
        AstBinOp::Eq => IrBinOp::Eq,
        AstBinOp::NotEq => IrBinOp::NotEq,
        AstBinOp::Lt => IrBinOp::Lt,
        AstBinOp::Gt => IrBinOp::Gt,
        AstBinOp::LtEq => IrBinOp::LtEq,
        AstBinOp::GtEq => IrBinOp::GtEq,
        AstBinOp::And => IrBinOp::And,
        AstBinOp::Or => IrBinOp::Or,
    }
}

/// AST の UnaryOp を IR の IrUnaryOp に変換する
pub fn convert_unaryop(op: &AstUnaryOp) -> IrUnaryOp {
    match op {
        AstUnaryOp::Neg => IrUnaryOp::Neg,
        AstUnaryOp::Pos => IrUnaryOp::Pos,
        AstUnaryOp::Not => IrUnaryOp::Not,
    }
}

/// 演算子が比較演算子かどうかを判定
pub fn is_comparison_op(op: &AstBinOp) -> bool {
    matches!(
        op,
        AstBinOp::Eq
            | AstBinOp::NotEq
            | AstBinOp::Lt
            | AstBinOp::Gt
            | AstBinOp::LtEq
            | AstBinOp::GtEq
    )
}

/// 演算子が論理演算子かどうかを判定
pub fn is_logical_op(op: &AstBinOp) -> bool {
    matches!(op, AstBinOp::And | AstBinOp::Or)
}

/// 演算子が算術演算子かどうかを判定
pub fn is_arithmetic_op(op: &AstBinOp) -> bool {
    matches!(
        op,
        AstBinOp::Add | AstBinOp::Sub | AstBinOp::Mul | AstBinOp::Div | AstBinOp::Mod
    )
}

/// 二項演算の IR 演算子と結果型を決める
///
/// # Arguments
/// * `op` - AST の演算子
/// * `left`, `right` - オペランドの型
///
/// # Returns
/// `(IR 演算子, 結果型)`。型規則に反する場合は理由を返す
pub fn binop_result(op: &AstBinOp, left: Type, right: Type) -> Result<(IrBinOp, Type), String> {
    let ir_op = convert_binop(op);
    let mismatch = || {
        format!(
            "unsupported operand types for '{}': {left} and {right}",
            op.symbol()
        )
    };

    if is_logical_op(op) {
        return if left.is_truthy() && right.is_truthy() {
            Ok((ir_op, Type::Bool))
        } else {
            Err(mismatch())
        };
    }

    if is_comparison_op(op) {
        let comparable = (left.is_numeric() && right.is_numeric())
            || (left == Type::String && right == Type::String)
            || (left == Type::Bool && right != Type::String && right != Type::Void)
            || (right == Type::Bool && left != Type::String && left != Type::Void);
        return if comparable {
            Ok((ir_op, Type::Bool))
        } else {
            Err(mismatch())
        };
    }

    debug_assert!(is_arithmetic_op(op));
    match (op, left, right) {
        (AstBinOp::Add, Type::String, Type::String) => Ok((IrBinOp::Concat, Type::String)),
        (AstBinOp::Mod, Type::Int, Type::Int) => Ok((ir_op, Type::Int)),
        (AstBinOp::Mod, _, _) => Err(mismatch()),
        (_, Type::Int, Type::Int) => Ok((ir_op, Type::Int)),
        (_, l, r) if l.is_numeric() && r.is_numeric() => Ok((ir_op, Type::Float)),
        _ => Err(mismatch()),
    }
}

/// 単項演算の IR 演算子と結果型を決める
pub fn unaryop_result(op: &AstUnaryOp, operand: Type) -> Result<(IrUnaryOp, Type), String> {
    let ir_op = convert_unaryop(op);
    match op {
        AstUnaryOp::Not if operand.is_truthy() => Ok((ir_op, Type::Bool)),
        AstUnaryOp::Neg | AstUnaryOp::Pos if operand.is_numeric() => Ok((ir_op, operand)),
        _ => Err(format!(
            "bad operand type for unary '{}': {operand}",
            op.symbol().trim_end()
        )),
    }
}
