// crates/gr_referencing/src/authority/database.rs

//! 内置权威库
//!
//! 随库发布一份 EPSG 子集（表结构与数据均为可移植 SQL），
//! 可安装到任意 SQLite 连接，用于离线运行与测试。

use std::path::Path;

use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use super::dialect::SqlDialect;
use crate::error::ReferencingResult;

/// 内置权威库
#[derive(Debug, Clone, Copy, Default)]
pub struct EpsgDatabase;

impl EpsgDatabase {
    /// 表结构
    pub const SCHEMA: &'static str = include_str!("../../sql/schema.sql");

    /// 数据
    pub const DATASET: &'static str = include_str!("../../sql/dataset.sql");

    /// 创建表结构（不含数据）
    pub fn install_schema(conn: &Connection, dialect: &dyn SqlDialect) -> ReferencingResult<()> {
        conn.execute_batch(&dialect.adapt(Self::SCHEMA))?;
        Ok(())
    }

    /// 安装表结构与数据；已有数据时跳过数据部分
    pub fn install(conn: &Connection, dialect: &dyn SqlDialect) -> ReferencingResult<()> {
        Self::install_schema(conn, dialect)?;
        let populated = conn
            .query_row(&dialect.adapt("SELECT 1 FROM [Unit of Measure] LIMIT 1"), [], |_| Ok(()))
            .optional()?
            .is_some();
        if populated {
            debug!(dialect = dialect.name(), "权威库已有数据，跳过安装");
            return Ok(());
        }
        conn.execute_batch(&format!("BEGIN;\n{}\nCOMMIT;", dialect.adapt(Self::DATASET)))?;
        info!(dialect = dialect.name(), "已安装内置权威数据");
        Ok(())
    }

    /// 在文件中创建权威库
    pub fn create_file(path: impl AsRef<Path>, dialect: &dyn SqlDialect) -> ReferencingResult<()> {
        let conn = Connection::open(path.as_ref())?;
        Self::install(&conn, dialect)
    }
}
