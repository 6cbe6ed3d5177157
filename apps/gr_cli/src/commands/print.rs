// apps/gr_cli/src/commands/print.rs

//! 打印权威对象
//!
//! 逐个解析代码并输出 WKT；单个代码失败时打印错误后继续。

use anyhow::Result;
use clap::Args;
use gr_referencing::authority::AuthorityObject;
use gr_referencing::wkt::ToWkt;

use super::{report, Session};

/// 打印参数
#[derive(Args)]
pub struct PrintArgs {
    /// 权威代码，例如 EPSG:4326
    #[arg(required = true)]
    pub codes: Vec<String>,

    /// 同时打印属性表
    #[arg(short, long)]
    pub properties: bool,

    /// 单行 WKT
    #[arg(long)]
    pub compact: bool,
}

/// 执行打印命令
pub fn execute(session: &Session, args: PrintArgs) -> Result<()> {
    let factory = session.open_factory()?;

    for (i, code) in args.codes.iter().enumerate() {
        if i > 0 {
            println!();
        }
        match factory.create_object(code) {
            Ok(object) => print_object(code, &object, &args),
            Err(e) => report(code, &e),
        }
    }
    Ok(())
}

fn print_object(code: &str, object: &AuthorityObject, args: &PrintArgs) {
    println!("=== {} ===", code);
    println!("{}", object);
    if args.compact {
        println!("{}", object.to_wkt());
    } else {
        println!("{}", object.to_pretty_wkt());
    }

    if args.properties {
        let rows = object.describe();
        let width = rows.iter().map(|(name, _)| name.chars().count()).max().unwrap_or(0);
        println!();
        for (name, value) in rows {
            let pad = width - name.chars().count();
            println!("  {}{} : {}", name, " ".repeat(pad), value);
        }
    }
}
