// crates/gr_referencing/src/geometry/rectangle.rs

//! 二维矩形
//!
//! 用于有效范围的地理边界框和二维包络变换的快速路径。

use crate::error::{ReferencingError, ReferencingResult};
use crate::geometry::Envelope;

/// 边界框
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// 最小 x
    pub min_x: f64,
    /// 最小 y
    pub min_y: f64,
    /// 最大 x
    pub max_x: f64,
    /// 最大 y
    pub max_y: f64,
}

impl BoundingBox {
    /// 创建新的边界框，自动整理角点顺序
    #[must_use]
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x: min_x.min(max_x),
            min_y: min_y.min(max_y),
            max_x: min_x.max(max_x),
            max_y: min_y.max(max_y),
        }
    }

    /// 从二维包络转换
    pub fn from_envelope(envelope: &Envelope) -> ReferencingResult<Self> {
        ReferencingError::check_dimension("二维矩形", 2, envelope.dimension())?;
        Ok(Self {
            min_x: envelope.minimum(0),
            min_y: envelope.minimum(1),
            max_x: envelope.maximum(0),
            max_y: envelope.maximum(1),
        })
    }

    /// 转换为二维包络
    pub fn to_envelope(&self) -> ReferencingResult<Envelope> {
        Envelope::from_corners(&[self.min_x, self.min_y], &[self.max_x, self.max_y])
    }

    /// 检查两个边界框是否相交
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// 交集，不相交时返回 `None`
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        self.intersects(other).then(|| Self {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        })
    }

    /// 计算中心点
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// 四角与四边中点，共 8 个边界采样点
    #[must_use]
    pub fn boundary_samples(&self) -> [(f64, f64); 8] {
        let (cx, cy) = self.center();
        [
            (self.min_x, self.min_y),
            (cx, self.min_y),
            (self.max_x, self.min_y),
            (self.max_x, cy),
            (self.max_x, self.max_y),
            (cx, self.max_y),
            (self.min_x, self.max_y),
            (self.min_x, cy),
        ]
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}, {}, {}]", self.min_x, self.min_y, self.max_x, self.max_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_orders_corners() {
        let b = BoundingBox::new(10.0, 5.0, 0.0, -5.0);
        assert_eq!(b.min_x, 0.0);
        assert_eq!(b.max_y, 5.0);
        assert_eq!(b.max_x, 10.0);
        assert_eq!(b.center(), (5.0, 0.0));
    }

    #[test]
    fn test_intersection() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 5.0, 15.0, 15.0);
        assert_eq!(a.intersection(&b), Some(BoundingBox::new(5.0, 5.0, 10.0, 10.0)));
        assert_eq!(a.intersection(&BoundingBox::new(20.0, 20.0, 30.0, 30.0)), None);
    }

    #[test]
    fn test_envelope_conversion() {
        let b = BoundingBox::new(1.0, 2.0, 3.0, 4.0);
        let e = b.to_envelope().unwrap();
        assert_eq!(BoundingBox::from_envelope(&e).unwrap(), b);
        assert!(BoundingBox::from_envelope(&Envelope::null(3)).is_err());
    }
}
