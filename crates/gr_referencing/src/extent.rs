// crates/gr_referencing/src/extent.rs

//! 有效范围

use crate::geometry::BoundingBox;

/// 有效范围：文字说明与地理边界框（经纬度，度）
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Extent {
    /// 文字说明
    pub description: Option<String>,
    /// 地理边界框，x 为经度、y 为纬度
    pub bbox: Option<BoundingBox>,
}

impl Extent {
    /// 创建有效范围
    pub fn new(description: Option<String>, bbox: Option<BoundingBox>) -> Self {
        Self { description, bbox }
    }

    /// 两个范围的交集，任一方缺少边界框时取另一方
    pub fn intersection(&self, other: &Extent) -> Extent {
        let bbox = match (&self.bbox, &other.bbox) {
            (Some(a), Some(b)) => a.intersection(b),
            (Some(a), None) => Some(*a),
            (None, b) => *b,
        };
        let description = match (&self.description, &other.description) {
            (Some(a), Some(b)) if a != b => Some(format!("{a} ∩ {b}")),
            (Some(a), _) => Some(a.clone()),
            (None, b) => b.clone(),
        };
        Extent { description, bbox }
    }
}
