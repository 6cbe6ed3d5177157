// apps/gr_cli/src/commands/operation.rs

//! 推导坐标操作
//!
//! 经由 缓存 → 权威库 → 独立推导 的工厂链得到两个 CRS 之间的操作，
//! 打印类别、精度与步骤；给出 `--point` 时同时变换该点。

use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use gr_referencing::operation::buffered::cached;
use gr_referencing::operation::{
    AccuracyEstimator, AuthorityBackedFactory, CoordinateOperation, CoordinateOperationFactory,
    StandaloneOperationFactory,
};
use gr_referencing::transform::MathTransform;
use gr_referencing::wkt::ToWkt;

use super::{report, Session};

/// 坐标操作参数
#[derive(Args)]
pub struct OperationArgs {
    /// 源 CRS 代码
    pub source: String,

    /// 目标 CRS 代码
    pub target: String,

    /// 要变换的点，按源 CRS 轴序以逗号分隔
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub point: Option<Vec<f64>>,

    /// 打印操作的 WKT
    #[arg(long)]
    pub wkt: bool,
}

/// 执行坐标操作命令
pub fn execute(session: &Session, args: OperationArgs) -> Result<()> {
    let epsg = Arc::new(session.open_factory()?);
    let config = &session.config;

    let source = match epsg.create_coordinate_reference_system(&args.source) {
        Ok(crs) => crs,
        Err(e) => {
            report(&args.source, &e);
            return Ok(());
        }
    };
    let target = match epsg.create_coordinate_reference_system(&args.target) {
        Ok(crs) => crs,
        Err(e) => {
            report(&args.target, &e);
            return Ok(());
        }
    };

    let chain = AuthorityBackedFactory::new(epsg.clone(), StandaloneOperationFactory::from_config(config))
        .with_config(config);
    let factory = cached(chain, &config.cache);

    let op = match factory.create_operation(&source, &target) {
        Ok(op) => op,
        Err(e) => {
            report(&format!("{} → {}", args.source, args.target), &e);
            return Ok(());
        }
    };

    let estimator = AccuracyEstimator::new(config.accuracy);
    println!("源: {}", source.name());
    println!("目标: {}", target.name());
    print_operation(&op, &estimator, 0);

    if let Some(point) = &args.point {
        match op.transform().map(|t| t.apply(point)) {
            Some(Ok(out)) => println!("\n{:?} → {:?}", point, out),
            Some(Err(e)) => report("--point", &e),
            None => report("--point", &"操作没有数学变换"),
        }
    }

    if args.wkt {
        println!("\n{}", op.to_pretty_wkt());
    }
    Ok(())
}

fn print_operation(op: &CoordinateOperation, estimator: &AccuracyEstimator, depth: usize) {
    let indent = "  ".repeat(depth);
    let accuracy = estimator.accuracy(op);
    let accuracy = if accuracy.is_nan() {
        "未知".to_string()
    } else {
        format!("{} m", accuracy)
    };
    println!("{}{}（{}，精度 {}）", indent, op.name(), op.kind_label(), accuracy);
    for step in op.steps() {
        print_operation(step, estimator, depth + 1);
    }
}
