//! Built-in function handling module
//!
//! 組み込み関数 (str, int, float, abs, len) の処理を提供する。
//! テーブル駆動設計。すべて引数はひとつ。

use super::Type;
use crate::ir::BuiltinId;

/// 組み込み関数のメタデータ
#[derive(Debug, Clone)]
pub struct BuiltinInfo {
    pub id: BuiltinId,
    /// 受け付ける引数の型
    pub accepts: &'static [Type],
    /// 戻り値の型 (None = 引数と同じ型)
    pub return_type: Option<Type>,
}

impl BuiltinInfo {
    /// 引数の型を検査して戻り値の型を返す
    pub fn result_type(&self, arg: Type) -> Result<Type, String> {
        if !self.accepts.contains(&arg) {
            return Err(format!(
                "{}() does not accept an argument of type {arg}",
                self.id.name()
            ));
        }
        Ok(self.return_type.unwrap_or(arg))
    }
}

const CONVERTIBLE: &[Type] = &[Type::Int, Type::Float, Type::String, Type::Bool];

/// 組み込み関数の情報を取得
///
/// # Returns
/// 関数情報。組み込み関数でない場合はNone
pub fn get_builtin_info(name: &str) -> Option<BuiltinInfo> {
    let id = BuiltinId::from_name(name)?;
    let info = match id {
        BuiltinId::Str => BuiltinInfo {
            id,
            accepts: CONVERTIBLE,
            return_type: Some(Type::String),
        },
        BuiltinId::Int => BuiltinInfo {
            id,
            accepts: CONVERTIBLE,
            return_type: Some(Type::Int),
        },
        BuiltinId::Float => BuiltinInfo {
            id,
            accepts: CONVERTIBLE,
            return_type: Some(Type::Float),
        },
        BuiltinId::Abs => BuiltinInfo {
            id,
            accepts: &[Type::Int, Type::Float],
            return_type: None,
        },
        BuiltinId::Len => BuiltinInfo {
            id,
            accepts: &[Type::String],
            return_type: Some(Type::Int),
        },
    };
    Some(info)
}

/// 組み込み関数かどうかを判定
pub fn is_builtin(name: &str) -> bool {
    BuiltinId::from_name(name).is_some()
}
