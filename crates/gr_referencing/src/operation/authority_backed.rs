// crates/gr_referencing/src/operation/authority_backed.rs

//! 权威库优先的坐标操作工厂
//!
//! 两个 CRS 都有本权威机构的代码时，先按 (源, 目标) 查询权威库，
//! 没有结果再按 (目标, 源) 查询并求逆；候选的端点必须与请求结构相同。
//! 查询未命中、代码未知或底层故障时退回到内层工厂。

use std::sync::Arc;

use gr_config::{EngineConfig, SelectionPolicy};
use tracing::{debug, warn};

use super::{AccuracyEstimator, CoordinateOperation, CoordinateOperationFactory, OperationAuthorityFactory};
use crate::crs::CoordinateReferenceSystem;
use crate::error::{ReferencingError, ReferencingResult};
use crate::identified::{arc_equals, ComparisonMode};

type SharedCrs = Arc<CoordinateReferenceSystem>;

/// 权威库优先的坐标操作工厂
pub struct AuthorityBackedFactory<A, F> {
    authority: A,
    fallback: F,
    selection: SelectionPolicy,
    estimator: AccuracyEstimator,
}

impl<A: OperationAuthorityFactory, F: CoordinateOperationFactory> AuthorityBackedFactory<A, F> {
    /// 以默认策略创建
    pub fn new(authority: A, fallback: F) -> Self {
        Self {
            authority,
            fallback,
            selection: SelectionPolicy::default(),
            estimator: AccuracyEstimator::default(),
        }
    }

    /// 按引擎配置设置选择策略与精度常数
    #[must_use]
    pub fn with_config(mut self, config: &EngineConfig) -> Self {
        self.selection = config.selection;
        self.estimator = AccuracyEstimator::new(config.accuracy);
        self
    }

    /// 权威工厂
    pub fn authority(&self) -> &A {
        &self.authority
    }

    /// 退回工厂
    pub fn fallback(&self) -> &F {
        &self.fallback
    }

    /// 查询权威库；`Ok(None)` 表示没有可用候选
    fn lookup(&self, source: &SharedCrs, target: &SharedCrs) -> ReferencingResult<Option<Arc<CoordinateOperation>>> {
        let authority = self.authority.authority();
        let (Some(source_code), Some(target_code)) = (source.identifier(authority), target.identifier(authority))
        else {
            return Ok(None);
        };

        let forward: Vec<_> = self
            .authority
            .create_from_crs_codes(&source_code.code, &target_code.code)?
            .into_iter()
            .filter(|op| matches_pair(op, source, target))
            .collect();
        if !forward.is_empty() {
            return Ok(self.select(forward));
        }

        let mut reversed = Vec::new();
        for op in self.authority.create_from_crs_codes(&target_code.code, &source_code.code)? {
            let inverse = op.inverse()?;
            if matches_pair(&inverse, source, target) {
                reversed.push(Arc::new(inverse));
            }
        }
        Ok(self.select(reversed))
    }

    fn select(&self, candidates: Vec<Arc<CoordinateOperation>>) -> Option<Arc<CoordinateOperation>> {
        match self.selection {
            SelectionPolicy::First => candidates.into_iter().next(),
            SelectionPolicy::MostAccurate => candidates.into_iter().min_by(|a, b| {
                let key = |op: &CoordinateOperation| {
                    let value = self.estimator.accuracy(op);
                    if value.is_nan() {
                        f64::INFINITY
                    } else {
                        value
                    }
                };
                key(a).total_cmp(&key(b))
            }),
        }
    }
}

impl<A: OperationAuthorityFactory, F: CoordinateOperationFactory> CoordinateOperationFactory
    for AuthorityBackedFactory<A, F>
{
    fn create_operation(&self, source: &SharedCrs, target: &SharedCrs) -> ReferencingResult<Arc<CoordinateOperation>> {
        match self.lookup(source, target) {
            Ok(Some(op)) => {
                debug!(operation = op.name(), "使用权威库中的坐标操作");
                return Ok(op);
            }
            Ok(None) => {}
            Err(err @ ReferencingError::NoSuchAuthorityCode { .. }) => {
                debug!(error = %err, "权威代码未知，退回独立推导");
            }
            Err(err @ ReferencingError::FactoryFailure { .. }) => {
                warn!(error = %err, "权威库查询失败，退回独立推导");
            }
            Err(err) => return Err(err),
        }
        self.fallback.create_operation(source, target)
    }

    fn is_available(&self) -> bool {
        self.authority.is_available() && self.fallback.is_available()
    }
}

fn matches_pair(op: &CoordinateOperation, source: &SharedCrs, target: &SharedCrs) -> bool {
    match (op.source_crs(), op.target_crs()) {
        (Some(s), Some(t)) => {
            arc_equals(s, source, ComparisonMode::IgnoreMetadata)
                && arc_equals(t, target, ComparisonMode::IgnoreMetadata)
        }
        _ => false,
    }
}
