// crates/gr_referencing/src/geometry/envelope.rs

//! n 维包络
//!
//! 每个维度一对（最小值, 最大值），可关联 CRS。状态：
//!
//! - **正常**：每个维度 min < max
//! - **空**：某个维度 min ≥ max（或含 NaN）
//! - **null**：全部分量为 NaN，null 必然为空
//! - **无穷**：每个维度都是 (-∞, +∞)
//!
//! 包络由创建者独占并原地修改，跨线程共享需要外部同步。

use std::fmt;
use std::sync::Arc;

use crate::crs::CoordinateReferenceSystem;
use crate::error::{ReferencingError, ReferencingResult};
use crate::geometry::DirectPosition;
use crate::identified::{Comparable, ComparisonMode};

/// n 维包络
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    lower: Vec<f64>,
    upper: Vec<f64>,
    crs: Option<Arc<CoordinateReferenceSystem>>,
}

impl Envelope {
    // ========================================================================
    // 构造方法
    // ========================================================================

    /// 创建 null 包络
    pub fn null(dimension: usize) -> Self {
        Self {
            lower: vec![f64::NAN; dimension],
            upper: vec![f64::NAN; dimension],
            crs: None,
        }
    }

    /// 创建无穷包络
    pub fn infinite(dimension: usize) -> Self {
        Self {
            lower: vec![f64::NEG_INFINITY; dimension],
            upper: vec![f64::INFINITY; dimension],
            crs: None,
        }
    }

    /// 从两个角点创建，任一维度 min > max 时报错
    pub fn from_corners(lower: &[f64], upper: &[f64]) -> ReferencingResult<Self> {
        ReferencingError::check_dimension("包络角点", lower.len(), upper.len())?;
        if let Some(i) = (0..lower.len()).find(|&i| lower[i] > upper[i]) {
            return Err(ReferencingError::invalid_definition(format!(
                "包络第 {i} 维最小值 {} 大于最大值 {}",
                lower[i], upper[i]
            )));
        }
        Ok(Self {
            lower: lower.to_vec(),
            upper: upper.to_vec(),
            crs: None,
        })
    }

    /// 只含一个点的包络
    pub fn from_position(position: &DirectPosition) -> Self {
        Self {
            lower: position.ordinates.clone(),
            upper: position.ordinates.clone(),
            crs: position.crs().cloned(),
        }
    }

    /// 链式设置 CRS
    pub fn with_crs(mut self, crs: Arc<CoordinateReferenceSystem>) -> ReferencingResult<Self> {
        self.set_crs(Some(crs))?;
        Ok(self)
    }

    // ========================================================================
    // 访问
    // ========================================================================

    /// 维度
    #[inline]
    pub fn dimension(&self) -> usize {
        self.lower.len()
    }

    /// 关联的 CRS
    pub fn crs(&self) -> Option<&Arc<CoordinateReferenceSystem>> {
        self.crs.as_ref()
    }

    /// 设置 CRS，维度必须一致
    pub fn set_crs(&mut self, crs: Option<Arc<CoordinateReferenceSystem>>) -> ReferencingResult<()> {
        if let Some(c) = &crs {
            ReferencingError::check_dimension(c.name(), c.dimension(), self.dimension())?;
        }
        self.crs = crs;
        Ok(())
    }

    /// 第 `dim` 维最小值
    pub fn minimum(&self, dim: usize) -> f64 {
        self.lower.get(dim).copied().unwrap_or(f64::NAN)
    }

    /// 第 `dim` 维最大值
    pub fn maximum(&self, dim: usize) -> f64 {
        self.upper.get(dim).copied().unwrap_or(f64::NAN)
    }

    /// 第 `dim` 维中值
    pub fn median(&self, dim: usize) -> f64 {
        0.5 * (self.minimum(dim) + self.maximum(dim))
    }

    /// 第 `dim` 维跨度
    pub fn span(&self, dim: usize) -> f64 {
        self.maximum(dim) - self.minimum(dim)
    }

    /// 下角点
    pub fn lower_corner(&self) -> DirectPosition {
        DirectPosition::from_ordinates(self.lower.clone())
    }

    /// 上角点
    pub fn upper_corner(&self) -> DirectPosition {
        DirectPosition::from_ordinates(self.upper.clone())
    }

    /// 中心点
    pub fn center(&self) -> DirectPosition {
        DirectPosition::from_ordinates((0..self.dimension()).map(|d| self.median(d)).collect::<Vec<_>>())
    }

    // ========================================================================
    // 状态
    // ========================================================================

    /// 是否为空：零维，或某个维度 min ≥ max（含 NaN）
    pub fn is_empty(&self) -> bool {
        self.dimension() == 0 || (0..self.dimension()).any(|d| !(self.upper[d] > self.lower[d]))
    }

    /// 是否为 null：全部分量为 NaN
    pub fn is_null(&self) -> bool {
        self.lower.iter().chain(&self.upper).all(|v| v.is_nan())
    }

    /// 是否为无穷：每个维度都是 (-∞, +∞)
    pub fn is_infinite(&self) -> bool {
        self.dimension() > 0
            && self.lower.iter().all(|v| *v == f64::NEG_INFINITY)
            && self.upper.iter().all(|v| *v == f64::INFINITY)
    }

    /// 置为 null
    pub fn set_to_null(&mut self) {
        self.lower.fill(f64::NAN);
        self.upper.fill(f64::NAN);
    }

    /// 置为无穷
    pub fn set_to_infinite(&mut self) {
        self.lower.fill(f64::NEG_INFINITY);
        self.upper.fill(f64::INFINITY);
    }

    /// 设置某一维的范围
    pub fn set_range(&mut self, dim: usize, min: f64, max: f64) -> ReferencingResult<()> {
        if dim >= self.dimension() {
            return Err(ReferencingError::mismatched_dimension("包络维度索引", self.dimension(), dim + 1));
        }
        if min > max {
            return Err(ReferencingError::invalid_definition(format!(
                "包络第 {dim} 维最小值 {min} 大于最大值 {max}"
            )));
        }
        self.lower[dim] = min;
        self.upper[dim] = max;
        Ok(())
    }

    // ========================================================================
    // 修改
    // ========================================================================

    fn check_compatible(&self, dimension: usize, crs: Option<&Arc<CoordinateReferenceSystem>>) -> ReferencingResult<()> {
        ReferencingError::check_dimension("包络", self.dimension(), dimension)?;
        if let (Some(a), Some(b)) = (&self.crs, crs) {
            if !(Arc::ptr_eq(a, b) || a.equals(b, ComparisonMode::IgnoreMetadata)) {
                return Err(ReferencingError::invalid_definition(format!(
                    "坐标参考系统不一致: \"{}\" 与 \"{}\"",
                    a.name(),
                    b.name()
                )));
            }
        }
        Ok(())
    }

    /// 扩展以包含一个点；null 包络直接变为该点
    pub fn add_position(&mut self, position: &DirectPosition) -> ReferencingResult<()> {
        self.check_compatible(position.dimension(), position.crs())?;
        for (d, &v) in position.ordinates.iter().enumerate() {
            if v.is_nan() {
                continue;
            }
            if self.lower[d].is_nan() || v < self.lower[d] {
                self.lower[d] = v;
            }
            if self.upper[d].is_nan() || v > self.upper[d] {
                self.upper[d] = v;
            }
        }
        Ok(())
    }

    /// 并集；对方为 null 时不变
    pub fn add_envelope(&mut self, other: &Envelope) -> ReferencingResult<()> {
        self.check_compatible(other.dimension(), other.crs())?;
        if other.is_null() {
            return Ok(());
        }
        for d in 0..self.dimension() {
            self.lower[d] = nan_min(self.lower[d], other.lower[d]);
            self.upper[d] = nan_max(self.upper[d], other.upper[d]);
        }
        Ok(())
    }

    /// 交集；无重叠的维度收缩为两者之间的中点，使 min ≤ max 仍然成立
    pub fn intersect(&mut self, other: &Envelope) -> ReferencingResult<()> {
        self.check_compatible(other.dimension(), other.crs())?;
        if self.is_null() || other.is_null() {
            self.set_to_null();
            return Ok(());
        }
        for d in 0..self.dimension() {
            let min = self.lower[d].max(other.lower[d]);
            let max = self.upper[d].min(other.upper[d]);
            if min > max {
                let mid = 0.5 * (min + max);
                self.lower[d] = mid;
                self.upper[d] = mid;
            } else {
                self.lower[d] = min;
                self.upper[d] = max;
            }
        }
        Ok(())
    }

    // ========================================================================
    // 判定
    // ========================================================================

    /// 是否包含一个点（边界包含在内）
    pub fn contains_position(&self, position: &DirectPosition) -> ReferencingResult<bool> {
        self.check_compatible(position.dimension(), position.crs())?;
        Ok(position
            .ordinates
            .iter()
            .enumerate()
            .all(|(d, &v)| v >= self.lower[d] && v <= self.upper[d]))
    }

    /// 是否完全包含另一个包络
    pub fn contains_envelope(&self, other: &Envelope, edges_inclusive: bool) -> ReferencingResult<bool> {
        self.check_compatible(other.dimension(), other.crs())?;
        Ok((0..self.dimension()).all(|d| {
            if edges_inclusive {
                other.lower[d] >= self.lower[d] && other.upper[d] <= self.upper[d]
            } else {
                other.lower[d] > self.lower[d] && other.upper[d] < self.upper[d]
            }
        }))
    }

    /// 是否与另一个包络相交
    pub fn intersects(&self, other: &Envelope, edges_inclusive: bool) -> ReferencingResult<bool> {
        self.check_compatible(other.dimension(), other.crs())?;
        Ok((0..self.dimension()).all(|d| {
            if edges_inclusive {
                other.lower[d] <= self.upper[d] && other.upper[d] >= self.lower[d]
            } else {
                other.lower[d] < self.upper[d] && other.upper[d] > self.lower[d]
            }
        }))
    }

    /// 近似相等：每个分量之差不超过 `eps`，NaN 与 NaN 相等
    pub fn approx_equals(&self, other: &Envelope, eps: f64) -> bool {
        self.dimension() == other.dimension()
            && self
                .lower
                .iter()
                .chain(&self.upper)
                .zip(other.lower.iter().chain(&other.upper))
                .all(|(a, b)| gr_foundation::float::approx_eq(*a, *b, eps))
    }
}

/// 忽略 NaN 的最小值
fn nan_min(a: f64, b: f64) -> f64 {
    if a.is_nan() {
        b
    } else if b.is_nan() {
        a
    } else {
        a.min(b)
    }
}

/// 忽略 NaN 的最大值
fn nan_max(a: f64, b: f64) -> f64 {
    if a.is_nan() {
        b
    } else if b.is_nan() {
        a
    } else {
        a.max(b)
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |v: &[f64]| v.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ");
        write!(f, "BOX{}D({}, {})", self.dimension(), join(&self.lower), join(&self.upper))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Envelope {
        Envelope::from_corners(&[0.0, 0.0], &[10.0, 10.0]).unwrap()
    }

    /// 测试空、null、无穷三种状态的判定
    #[test]
    fn test_states() {
        let normal = square();
        assert!(!normal.is_empty());
        assert!(!normal.is_null());
        assert!(!normal.is_infinite());

        let flat = Envelope::from_corners(&[0.0, 5.0], &[10.0, 5.0]).unwrap();
        assert!(flat.is_empty());
        assert!(!flat.is_null());

        let null = Envelope::null(3);
        assert!(null.is_null());
        assert!(null.is_empty());

        let mut inf = Envelope::infinite(2);
        assert!(inf.is_infinite());
        assert!(!inf.is_empty());
        inf.set_range(1, 0.0, 1.0).unwrap();
        assert!(!inf.is_infinite());
    }

    #[test]
    fn test_reversed_corners_rejected() {
        assert!(Envelope::from_corners(&[5.0], &[1.0]).is_err());
        assert!(Envelope::from_corners(&[0.0, 0.0], &[1.0]).is_err());
    }

    #[test]
    fn test_add_position_to_null() {
        let mut e = Envelope::null(2);
        e.add_position(&DirectPosition::from_ordinates(vec![3.0, 4.0])).unwrap();
        assert_eq!(e.minimum(0), 3.0);
        assert_eq!(e.maximum(1), 4.0);
        assert!(e.is_empty());

        e.add_position(&DirectPosition::from_ordinates(vec![-1.0, 8.0])).unwrap();
        assert_eq!(e.span(0), 4.0);
        assert_eq!(e.median(1), 6.0);
        assert!(!e.is_empty());
    }

    #[test]
    fn test_union_ignores_null() {
        let mut e = square();
        e.add_envelope(&Envelope::null(2)).unwrap();
        assert_eq!(e, square());

        let other = Envelope::from_corners(&[5.0, -5.0], &[20.0, 5.0]).unwrap();
        e.add_envelope(&other).unwrap();
        assert_eq!(e.minimum(1), -5.0);
        assert_eq!(e.maximum(0), 20.0);
    }

    /// 测试无重叠维度收缩为中点
    #[test]
    fn test_disjoint_intersection_collapses() {
        let mut e = square();
        let other = Envelope::from_corners(&[20.0, 2.0], &[30.0, 8.0]).unwrap();
        e.intersect(&other).unwrap();
        assert_eq!(e.minimum(0), 15.0);
        assert_eq!(e.maximum(0), 15.0);
        assert_eq!(e.minimum(1), 2.0);
        assert_eq!(e.maximum(1), 8.0);
        assert!(e.is_empty());
        assert!(e.minimum(0) <= e.maximum(0));
    }

    #[test]
    fn test_contains_and_intersects() {
        let e = square();
        assert!(e.contains_position(&DirectPosition::from_ordinates(vec![10.0, 0.0])).unwrap());
        assert!(!e.contains_position(&DirectPosition::from_ordinates(vec![10.1, 0.0])).unwrap());

        let inner = Envelope::from_corners(&[0.0, 1.0], &[5.0, 5.0]).unwrap();
        assert!(e.contains_envelope(&inner, true).unwrap());
        assert!(!e.contains_envelope(&inner, false).unwrap());

        let touching = Envelope::from_corners(&[10.0, 10.0], &[12.0, 12.0]).unwrap();
        assert!(e.intersects(&touching, true).unwrap());
        assert!(!e.intersects(&touching, false).unwrap());
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut e = square();
        assert!(e.add_envelope(&Envelope::null(3)).is_err());
        assert!(e
            .set_crs(Some(Arc::new(CoordinateReferenceSystem::wgs84_lon_lat())))
            .is_ok());
        assert!(e
            .set_crs(Some(Arc::new(CoordinateReferenceSystem::wgs84_geocentric())))
            .is_err());
    }

    #[test]
    fn test_set_to_null_and_infinite() {
        let mut e = square();
        e.set_to_infinite();
        assert!(e.is_infinite());
        e.set_to_null();
        assert!(e.is_null());
        assert!(e.approx_equals(&Envelope::null(2), 0.0));
    }
}
