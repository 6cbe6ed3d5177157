// apps/gr_cli/src/main.rs

//! GeoRef 命令行界面
//!
//! 按权威代码解析坐标参考对象并打印 WKT，推导两个 CRS 之间的坐标操作，
//! 以及把内置权威数据写入 SQLite 文件。
//!
//! `--url` / `--driver` 覆盖项跨调用保存为用户默认值，取值 `default` 时清除。

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::Session;

/// GeoRef 坐标参考系统诊断工具
#[derive(Parser)]
#[command(name = "gr_cli")]
#[command(author = "GeoRef Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "GeoRef coordinate reference system diagnostics", long_about = None)]
struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,

    #[command(flatten)]
    session: commands::SessionArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 打印权威代码对应的对象
    Print(commands::print::PrintArgs),
    /// 推导两个 CRS 之间的坐标操作
    Operation(commands::operation::OperationArgs),
    /// 创建权威库文件
    Init(commands::init::InitArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let session = Session::load(&cli.session)?;

    match cli.command {
        Commands::Print(args) => commands::print::execute(&session, args),
        Commands::Operation(args) => commands::operation::execute(&session, args),
        Commands::Init(args) => commands::init::execute(&session, args),
    }
}
