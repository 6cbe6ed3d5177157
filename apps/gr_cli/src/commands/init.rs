// apps/gr_cli/src/commands/init.rs

//! 创建权威库文件
//!
//! 按驱动的方言写入表结构与内置数据；文件已有数据时只补建缺失的表。

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use gr_referencing::authority::{dialect_for_driver, EpsgDatabase};
use tracing::info;

use super::Session;

/// 初始化参数
#[derive(Args)]
pub struct InitArgs {
    /// SQLite 文件路径
    pub path: PathBuf,
}

/// 执行初始化命令
pub fn execute(session: &Session, args: InitArgs) -> Result<()> {
    let dialect = dialect_for_driver(session.driver())
        .with_context(|| format!("未知驱动 {}", session.driver()))?;
    EpsgDatabase::create_file(&args.path, dialect.as_ref())
        .with_context(|| format!("创建权威库失败: {}", args.path.display()))?;
    info!("权威库已写入 {} (方言 {})", args.path.display(), dialect.name());
    println!("已创建 {}", args.path.display());
    println!("使用 --url {} 让后续调用读取该文件", args.path.display());
    Ok(())
}
