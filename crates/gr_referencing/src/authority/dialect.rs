// crates/gr_referencing/src/authority/dialect.rs

//! SQL 方言
//!
//! 可移植的查询使用方括号包围的多词表名，例如 `[Coordinate Reference System]`。
//! 不接受方括号标识符的后端通过 [`SqlDialect::adapt`] 改写。

use std::fmt;

use crate::error::{ReferencingError, ReferencingResult};

/// SQL 方言
pub trait SqlDialect: Send + Sync + fmt::Debug {
    /// 方言名称
    fn name(&self) -> &'static str;

    /// 把可移植查询改写为本方言
    fn adapt(&self, sql: &str) -> String;
}

/// 方括号方言：原样使用（SQLite、Access）
#[derive(Debug, Clone, Copy, Default)]
pub struct BracketDialect;

impl SqlDialect for BracketDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn adapt(&self, sql: &str) -> String {
        sql.to_string()
    }
}

/// ANSI 方言：`[Coordinate_Operation Parameter]` → `epsg_coordinateoperationparameter`
#[derive(Debug, Clone)]
pub struct AnsiDialect {
    prefix: String,
}

impl Default for AnsiDialect {
    fn default() -> Self {
        Self::new("epsg_")
    }
}

impl AnsiDialect {
    /// 以给定表名前缀创建
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    fn table_name(&self, bracketed: &str) -> String {
        let mut name = self.prefix.clone();
        name.extend(
            bracketed
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .map(|c| c.to_ascii_lowercase()),
        );
        name
    }
}

impl SqlDialect for AnsiDialect {
    fn name(&self) -> &'static str {
        "ansi"
    }

    fn adapt(&self, sql: &str) -> String {
        let mut out = String::with_capacity(sql.len());
        let mut chars = sql.chars();
        let mut in_literal = false;
        while let Some(c) = chars.next() {
            match c {
                '\'' => {
                    in_literal = !in_literal;
                    out.push(c);
                }
                '[' if !in_literal => {
                    let inner: String = chars.by_ref().take_while(|&c| c != ']').collect();
                    out.push_str(&self.table_name(&inner));
                }
                _ => out.push(c),
            }
        }
        out
    }
}

/// 按驱动标识选择方言：`sqlite`/`bracket` 或 `ansi`
pub fn dialect_for_driver(driver: &str) -> ReferencingResult<Box<dyn SqlDialect>> {
    match driver.trim().to_ascii_lowercase().as_str() {
        "sqlite" | "bracket" => Ok(Box::new(BracketDialect)),
        "ansi" => Ok(Box::new(AnsiDialect::default())),
        other => Err(ReferencingError::invalid_definition(format!(
            "未知的数据库驱动 \"{other}\"，可选 sqlite、ansi"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bracket_is_identity() {
        let sql = "SELECT * FROM [Prime Meridian]";
        assert_eq!(BracketDialect.adapt(sql), sql);
    }

    /// 测试 ANSI 方言改写表名
    #[test]
    fn test_ansi_rewrites_tables() {
        let sql = "SELECT a FROM [Coordinate_Operation Parameter Value] JOIN [Area] ON x = y";
        assert_eq!(
            AnsiDialect::default().adapt(sql),
            "SELECT a FROM epsg_coordinateoperationparametervalue JOIN epsg_area ON x = y"
        );
    }

    #[test]
    fn test_ansi_keeps_literals() {
        let sql = "SELECT '[not a table]' FROM [Alias]";
        assert_eq!(AnsiDialect::default().adapt(sql), "SELECT '[not a table]' FROM epsg_alias");
    }

    #[test]
    fn test_unknown_driver() {
        assert!(dialect_for_driver("oracle").is_err());
        assert_eq!(dialect_for_driver("ANSI").unwrap().name(), "ansi");
    }
}
