// crates/gr_referencing/src/operation/pool.rs

//! 对象池
//!
//! - [`SoftValuePool`]：最近使用的 N 个值强引用，其余只保留弱引用，
//!   外部不再持有时自动回收
//! - [`LruPool`]：固定容量的最近最少使用缓存，同一键的并发计算只执行一次
//!
//! 两者都保证：同一键一旦插入完成，所有调用方看到同一个值。

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

/// 命中统计
#[derive(Debug, Default)]
pub struct PoolStats {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl PoolStats {
    /// 命中次数
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// 未命中次数
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }
}

// ============================================================================
// 软引用池
// ============================================================================

struct SoftInner<K, V> {
    entries: HashMap<K, Weak<V>>,
    strong: VecDeque<Arc<V>>,
}

/// 软引用池
pub struct SoftValuePool<K, V> {
    inner: Mutex<SoftInner<K, V>>,
    strong_capacity: usize,
    stats: PoolStats,
}

impl<K: Eq + Hash + Clone, V> SoftValuePool<K, V> {
    /// 创建，保留最近 `strong_capacity` 个值的强引用
    pub fn new(strong_capacity: usize) -> Self {
        Self {
            inner: Mutex::new(SoftInner {
                entries: HashMap::new(),
                strong: VecDeque::with_capacity(strong_capacity),
            }),
            strong_capacity,
            stats: PoolStats::default(),
        }
    }

    /// 查找仍然存活的值
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let mut inner = self.inner.lock();
        let value = inner.entries.get(key).and_then(Weak::upgrade);
        match &value {
            Some(v) => {
                self.stats.hit();
                Self::retain(&mut inner, v.clone(), self.strong_capacity);
            }
            None => self.stats.miss(),
        }
        value
    }

    /// 插入；键已有存活值时保留已有值并返回它
    pub fn insert(&self, key: K, value: Arc<V>) -> Arc<V> {
        let mut inner = self.inner.lock();
        if let Some(existing) = inner.entries.get(&key).and_then(Weak::upgrade) {
            return existing;
        }
        if inner.entries.len() >= self.strong_capacity.max(16) * 4 {
            inner.entries.retain(|_, w| w.strong_count() > 0);
        }
        inner.entries.insert(key, Arc::downgrade(&value));
        Self::retain(&mut inner, value.clone(), self.strong_capacity);
        value
    }

    /// 查找或计算；并发未命中时可能重复计算，但只保留第一个插入的值
    pub fn get_or_try_insert_with<E>(
        &self,
        key: &K,
        compute: impl FnOnce() -> Result<Arc<V>, E>,
    ) -> Result<Arc<V>, E> {
        if let Some(v) = self.get(key) {
            return Ok(v);
        }
        let value = compute()?;
        Ok(self.insert(key.clone(), value))
    }

    /// 存活条目数
    pub fn len(&self) -> usize {
        self.inner.lock().entries.values().filter(|w| w.strong_count() > 0).count()
    }

    /// 是否没有存活条目
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 清空
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.strong.clear();
    }

    /// 命中统计
    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }

    fn retain(inner: &mut SoftInner<K, V>, value: Arc<V>, capacity: usize) {
        if capacity == 0 {
            return;
        }
        if let Some(pos) = inner.strong.iter().position(|v| Arc::ptr_eq(v, &value)) {
            inner.strong.remove(pos);
        }
        inner.strong.push_back(value);
        while inner.strong.len() > capacity {
            inner.strong.pop_front();
        }
    }
}

// ============================================================================
// LRU 池
// ============================================================================

struct LruInner<K, V> {
    entries: HashMap<K, (Arc<V>, u64)>,
    order: BTreeMap<u64, K>,
    tick: u64,
}

impl<K: Eq + Hash + Clone, V> LruInner<K, V> {
    fn touch(&mut self, key: &K) -> Option<Arc<V>> {
        self.tick += 1;
        let tick = self.tick;
        let (value, stamp) = self.entries.get_mut(key)?;
        let old = std::mem::replace(stamp, tick);
        let value = value.clone();
        if let Some(k) = self.order.remove(&old) {
            self.order.insert(tick, k);
        }
        Some(value)
    }
}

/// LRU 池
pub struct LruPool<K, V> {
    inner: Mutex<LruInner<K, V>>,
    /// 正在计算的键
    pending: Mutex<HashMap<K, Arc<Mutex<()>>>>,
    capacity: usize,
    stats: PoolStats,
}

impl<K: Eq + Hash + Clone, V> LruPool<K, V> {
    /// 创建，容量至少为 1
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(LruInner {
                entries: HashMap::new(),
                order: BTreeMap::new(),
                tick: 0,
            }),
            pending: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
            stats: PoolStats::default(),
        }
    }

    /// 查找并刷新使用时间
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let value = self.inner.lock().touch(key);
        match value {
            Some(_) => self.stats.hit(),
            None => self.stats.miss(),
        }
        value
    }

    /// 插入，超出容量时淘汰最久未使用的条目
    pub fn insert(&self, key: K, value: Arc<V>) {
        let mut inner = self.inner.lock();
        inner.tick += 1;
        let tick = inner.tick;
        if let Some((_, old)) = inner.entries.insert(key.clone(), (value, tick)) {
            inner.order.remove(&old);
        }
        inner.order.insert(tick, key);
        while inner.entries.len() > self.capacity {
            let Some((_, evicted)) = inner.order.pop_first() else {
                break;
            };
            inner.entries.remove(&evicted);
        }
    }

    /// 查找或计算；同一键的并发调用只有一个执行 `compute`
    pub fn get_or_try_insert_with<E>(
        &self,
        key: &K,
        compute: impl FnOnce() -> Result<Arc<V>, E>,
    ) -> Result<Arc<V>, E> {
        if let Some(v) = self.get(key) {
            return Ok(v);
        }
        let lock = self.pending.lock().entry(key.clone()).or_default().clone();
        let _guard = lock.lock();
        if let Some(v) = self.inner.lock().touch(key) {
            return Ok(v);
        }
        let result = compute();
        if let Ok(value) = &result {
            self.insert(key.clone(), value.clone());
        }
        self.pending.lock().remove(key);
        result
    }

    /// 条目数
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 容量
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 清空
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
    }

    /// 命中统计
    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    use super::*;

    #[test]
    fn test_soft_pool_keeps_first_value() {
        let pool = SoftValuePool::new(2);
        let first = pool.insert("a", Arc::new(1));
        let second = pool.insert("a", Arc::new(2));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*pool.get(&"a").unwrap(), 1);
    }

    /// 测试超出强引用容量且无外部持有的值被回收
    #[test]
    fn test_soft_pool_releases_weak_values() {
        let pool = SoftValuePool::new(1);
        pool.insert("a", Arc::new(1));
        pool.insert("b", Arc::new(2));
        assert!(pool.get(&"a").is_none());
        assert_eq!(*pool.get(&"b").unwrap(), 2);

        let held = pool.insert("c", Arc::new(3));
        pool.insert("d", Arc::new(4));
        assert!(Arc::ptr_eq(&pool.get(&"c").unwrap(), &held));
    }

    #[test]
    fn test_lru_eviction_order() {
        let pool = LruPool::new(2);
        pool.insert(1, Arc::new("one"));
        pool.insert(2, Arc::new("two"));
        pool.get(&1);
        pool.insert(3, Arc::new("three"));
        assert!(pool.get(&2).is_none());
        assert!(pool.get(&1).is_some());
        assert!(pool.get(&3).is_some());
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_lru_failed_compute_not_cached() {
        let pool: LruPool<u32, u32> = LruPool::new(4);
        let result: Result<_, &str> = pool.get_or_try_insert_with(&1, || Err("boom"));
        assert!(result.is_err());
        assert!(pool.is_empty());
        let value: Result<_, &str> = pool.get_or_try_insert_with(&1, || Ok(Arc::new(7)));
        assert_eq!(*value.unwrap(), 7);
    }

    /// 测试并发未命中时只计算一次
    #[test]
    fn test_lru_computes_once_under_contention() {
        let pool = Arc::new(LruPool::<u32, u32>::new(4));
        let calls = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pool = pool.clone();
                let calls = calls.clone();
                thread::spawn(move || {
                    pool.get_or_try_insert_with::<()>(&42, || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(std::time::Duration::from_millis(20));
                        Ok(Arc::new(42))
                    })
                    .unwrap()
                })
            })
            .collect();
        let values: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(values.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }
}
