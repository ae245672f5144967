//! Source Location Definitions
//!
//! ソースコード位置情報を定義する。
//! トークンから AST、エラー報告まで一貫して行・列情報を保持するための型。

use serde::Serialize;

/// ソースコード位置情報（全コンパイルステージで共有）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SourceLocation {
    /// 行番号 (1-indexed)
    pub line: usize,
    /// 列番号 (1-indexed)
    pub column: usize,
}

impl SourceLocation {
    /// 新しい SourceLocation を作成
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// 位置が不明な場合の SourceLocation
    pub fn unknown() -> Self {
        Self::default()
    }

    /// 位置情報があるかどうか
    pub fn is_known(&self) -> bool {
        self.line > 0
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.is_known() {
            return Ok(());
        }
        write!(f, "line {}, column {}", self.line, self.column)
    }
}
