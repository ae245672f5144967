//! IR Node (Instruction) Definitions
//!
//! 中間表現での命令を定義する。
//! 制御構造は入れ子にせず、LABEL / JUMP / JUMPIFFALSE の平坦な列で表す。

use super::exprs::IrExpr;
use super::ops::IrOp;
use crate::error::GenerationError;
use crate::semantic::Type;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// 関数内で一意なラベル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LabelId(pub u32);

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// IR 命令
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", content = "args", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IrInstr {
    // --- 関数境界 ---
    /// 関数の開始 (引数の型と戻り値の型を持つ)
    FuncBegin {
        name: String,
        params: Vec<(String, Type)>,
        ret: Type,
    },
    /// 関数の終了
    FuncEnd,

    // --- 変数 ---
    /// 変数宣言 (スコープ内で最初の代入)
    Declare { name: String, ty: Type },
    /// 代入
    Assign { target: String, value: IrExpr },

    // --- 副作用 ---
    /// 出力
    Print { value: IrExpr },
    /// 関数呼び出し文 (戻り値は捨てる)
    Call { callee: String, args: Vec<IrExpr> },
    /// return文
    Return(Option<IrExpr>),

    // --- 制御 ---
    /// ジャンプ先
    Label(LabelId),
    /// 無条件ジャンプ
    Jump(LabelId),
    /// 条件が偽のときジャンプ
    JumpIfFalse { cond: IrExpr, target: LabelId },
}

impl IrInstr {
    pub fn op(&self) -> IrOp {
        match self {
            IrInstr::FuncBegin { .. } => IrOp::FuncBegin,
            IrInstr::FuncEnd => IrOp::FuncEnd,
            IrInstr::Declare { .. } => IrOp::Declare,
            IrInstr::Assign { .. } => IrOp::Assign,
            IrInstr::Print { .. } => IrOp::Print,
            IrInstr::Call { .. } => IrOp::Call,
            IrInstr::Return(_) => IrOp::Return,
            IrInstr::Label(_) => IrOp::Label,
            IrInstr::Jump(_) => IrOp::Jump,
            IrInstr::JumpIfFalse { .. } => IrOp::JumpIfFalse,
        }
    }

    /// ジャンプ命令の飛び先
    pub fn jump_target(&self) -> Option<LabelId> {
        match self {
            IrInstr::Jump(target) | IrInstr::JumpIfFalse { target, .. } => Some(*target),
            _ => None,
        }
    }
}

impl fmt::Display for IrInstr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = self.op();
        match self {
            IrInstr::FuncBegin { name, params, ret } => {
                let params: Vec<_> = params.iter().map(|(n, t)| format!("{n}:{t}")).collect();
                write!(f, "{op} {name}({})", params.join(", "))?;
                if *ret != Type::Void {
                    write!(f, " -> {ret}")?;
                }
                Ok(())
            }
            IrInstr::FuncEnd => write!(f, "{op}"),
            IrInstr::Declare { name, ty } => write!(f, "{op} {name}:{ty}"),
            IrInstr::Assign { target, value } => write!(f, "{op} {target} = {value}"),
            IrInstr::Print { value } => write!(f, "{op} {value}"),
            IrInstr::Call { callee, args } => {
                let args: Vec<_> = args.iter().map(|a| a.to_string()).collect();
                write!(f, "{op} {callee}({})", args.join(", "))
            }
            IrInstr::Return(None) => write!(f, "{op}"),
            IrInstr::Return(Some(value)) => write!(f, "{op} {value}"),
            IrInstr::Label(label) | IrInstr::Jump(label) => write!(f, "{op} {label}"),
            IrInstr::JumpIfFalse { cond, target } => write!(f, "{op} {cond} {target}"),
        }
    }
}

/// 1関数分の IR 列 (FUNC_BEGIN で始まり FUNC_END で終わる)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IrFunction {
    pub name: String,
    pub params: Vec<(String, Type)>,
    pub ret: Type,
    pub body: Vec<IrInstr>,
}

impl IrFunction {
    /// ラベル → 命令位置 の対応表。同じラベルが二度現れたらエラー
    pub fn label_index(&self) -> Result<HashMap<LabelId, usize>, GenerationError> {
        let mut index = HashMap::new();
        for (pos, instr) in self.body.iter().enumerate() {
            if let IrInstr::Label(label) = instr {
                if index.insert(*label, pos).is_some() {
                    return Err(GenerationError::new(
                        IrOp::Label,
                        format!("label {label} defined twice in '{}'", self.name),
                    ));
                }
            }
        }
        Ok(index)
    }

    /// 全ジャンプの飛び先が同じ関数内にちょうど一つ存在することを確認する
    pub fn verify_labels(&self) -> Result<(), GenerationError> {
        let index = self.label_index()?;
        for instr in &self.body {
            if let Some(target) = instr.jump_target() {
                if !index.contains_key(&target) {
                    return Err(GenerationError::new(
                        instr.op(),
                        format!("jump to undefined label {target} in '{}'", self.name),
                    ));
                }
            }
        }
        Ok(())
    }

    /// 指定した種類の命令の数
    pub fn count(&self, op: IrOp) -> usize {
        self.body.iter().filter(|i| i.op() == op).count()
    }
}

impl fmt::Display for IrFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instr in &self.body {
            match instr {
                IrInstr::FuncBegin { .. } | IrInstr::FuncEnd | IrInstr::Label(_) => {
                    writeln!(f, "{instr}")?
                }
                _ => writeln!(f, "  {instr}")?,
            }
        }
        Ok(())
    }
}

/// プログラム全体の IR
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IrProgram {
    /// ユーザー定義関数 (ソース順)
    pub functions: Vec<IrFunction>,
    /// トップレベル文から作られるエントリ関数
    pub entry: IrFunction,
}

impl IrProgram {
    /// 関数をソース順に、最後にエントリ関数を返す
    pub fn iter(&self) -> impl Iterator<Item = &IrFunction> {
        self.functions.iter().chain(std::iter::once(&self.entry))
    }

    pub fn function(&self, name: &str) -> Option<&IrFunction> {
        self.functions.iter().find(|f| f.name == name)
    }
}

impl fmt::Display for IrProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for func in self.iter() {
            write!(f, "{func}")?;
        }
        Ok(())
    }
}
