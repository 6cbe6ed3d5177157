// crates/gr_referencing/src/operation/buffered.rs

//! 带缓存的坐标操作工厂
//!
//! - [`BufferedOperationFactory`]：按 (源, 目标) 严格相等作键，软引用池
//! - [`CachingOperationFactory`]：忽略元数据作键，LRU 池；
//!   结构相同的一对直接返回新建的恒等操作，不查询也不缓存

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use gr_config::{CacheConfig, CachePolicy};
use tracing::trace;

use super::pool::{LruPool, PoolStats, SoftValuePool};
use super::{CoordinateOperation, CoordinateOperationFactory};
use crate::crs::CoordinateReferenceSystem;
use crate::error::ReferencingResult;
use crate::identified::{arc_equals, ComparisonMode};

type SharedCrs = Arc<CoordinateReferenceSystem>;

/// 按比较模式判等与散列的 CRS 对
#[derive(Debug, Clone)]
pub struct CrsPairKey {
    source: SharedCrs,
    target: SharedCrs,
    mode: ComparisonMode,
}

impl CrsPairKey {
    /// 创建
    pub fn new(source: &SharedCrs, target: &SharedCrs, mode: ComparisonMode) -> Self {
        Self {
            source: source.clone(),
            target: target.clone(),
            mode,
        }
    }
}

impl PartialEq for CrsPairKey {
    fn eq(&self, other: &Self) -> bool {
        self.mode == other.mode
            && arc_equals(&self.source, &other.source, self.mode)
            && arc_equals(&self.target, &other.target, self.mode)
    }
}

impl Eq for CrsPairKey {}

impl Hash for CrsPairKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source.hash_with(self.mode, state);
        self.target.hash_with(self.mode, state);
    }
}

// ============================================================================
// 软引用缓存
// ============================================================================

/// 软引用缓存工厂
pub struct BufferedOperationFactory<F> {
    inner: F,
    pool: SoftValuePool<CrsPairKey, CoordinateOperation>,
}

impl<F: CoordinateOperationFactory> BufferedOperationFactory<F> {
    /// 包装 `inner`，保留最近 `strong_references` 个操作的强引用
    pub fn new(inner: F, strong_references: usize) -> Self {
        Self {
            inner,
            pool: SoftValuePool::new(strong_references),
        }
    }

    /// 被包装的工厂
    pub fn inner(&self) -> &F {
        &self.inner
    }

    /// 命中统计
    pub fn stats(&self) -> &PoolStats {
        self.pool.stats()
    }
}

impl<F: CoordinateOperationFactory> CoordinateOperationFactory for BufferedOperationFactory<F> {
    fn create_operation(&self, source: &SharedCrs, target: &SharedCrs) -> ReferencingResult<Arc<CoordinateOperation>> {
        let key = CrsPairKey::new(source, target, ComparisonMode::Strict);
        self.pool.get_or_try_insert_with(&key, || {
            trace!(source = source.name(), target = target.name(), "软引用缓存未命中");
            self.inner.create_operation(source, target)
        })
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }
}

// ============================================================================
// LRU 缓存
// ============================================================================

/// LRU 缓存工厂
pub struct CachingOperationFactory<F> {
    inner: F,
    pool: LruPool<CrsPairKey, CoordinateOperation>,
}

impl<F: CoordinateOperationFactory> CachingOperationFactory<F> {
    /// 包装 `inner`，缓存至多 `capacity` 个操作
    pub fn new(inner: F, capacity: usize) -> Self {
        Self {
            inner,
            pool: LruPool::new(capacity),
        }
    }

    /// 被包装的工厂
    pub fn inner(&self) -> &F {
        &self.inner
    }

    /// 命中统计
    pub fn stats(&self) -> &PoolStats {
        self.pool.stats()
    }

    /// 缓存中的操作数
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    /// 缓存是否为空
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}

impl<F: CoordinateOperationFactory> CoordinateOperationFactory for CachingOperationFactory<F> {
    fn create_operation(&self, source: &SharedCrs, target: &SharedCrs) -> ReferencingResult<Arc<CoordinateOperation>> {
        if arc_equals(source, target, ComparisonMode::IgnoreMetadata) {
            return CoordinateOperation::identity(source.clone(), target.clone()).map(Arc::new);
        }
        let key = CrsPairKey::new(source, target, ComparisonMode::IgnoreMetadata);
        self.pool.get_or_try_insert_with(&key, || {
            trace!(source = source.name(), target = target.name(), "LRU 缓存未命中");
            self.inner.create_operation(source, target)
        })
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }
}

/// 按配置的缓存策略包装工厂
pub fn cached<F>(inner: F, config: &CacheConfig) -> Arc<dyn CoordinateOperationFactory>
where
    F: CoordinateOperationFactory + 'static,
{
    match config.policy {
        CachePolicy::Soft => Arc::new(BufferedOperationFactory::new(inner, config.soft_strong_references)),
        CachePolicy::Lru => Arc::new(CachingOperationFactory::new(inner, config.lru_capacity)),
    }
}
