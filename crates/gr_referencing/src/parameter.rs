// crates/gr_referencing/src/parameter.rs

//! 操作方法与参数
//!
//! 参数按 EPSG 参数代码索引，取值时可换算到调用方要求的单位。

use std::fmt;
use std::sync::Arc;

use gr_foundation::float::approx_eq;

use crate::error::{ReferencingError, ReferencingResult};
use crate::identified::{Comparable, ComparisonMode, IdentifiedObject};
use crate::unit::Unit;

// ============================================================================
// EPSG 参数代码
// ============================================================================

/// 自然原点纬度
pub const LATITUDE_OF_ORIGIN: u32 = 8801;
/// 自然原点经度
pub const LONGITUDE_OF_ORIGIN: u32 = 8802;
/// 自然原点比例因子
pub const SCALE_FACTOR: u32 = 8805;
/// 假东
pub const FALSE_EASTING: u32 = 8806;
/// 假北
pub const FALSE_NORTHING: u32 = 8807;
/// X 平移
pub const X_TRANSLATION: u32 = 8605;
/// Y 平移
pub const Y_TRANSLATION: u32 = 8606;
/// Z 平移
pub const Z_TRANSLATION: u32 = 8607;
/// X 旋转
pub const X_ROTATION: u32 = 8608;
/// Y 旋转
pub const Y_ROTATION: u32 = 8609;
/// Z 旋转
pub const Z_ROTATION: u32 = 8610;
/// 尺度差
pub const SCALE_DIFFERENCE: u32 = 8611;

// ============================================================================
// 操作方法
// ============================================================================

/// 操作方法
#[derive(Debug, Clone)]
pub struct OperationMethod {
    /// 元数据
    pub object: IdentifiedObject,
    /// 公式说明
    pub formula: Option<String>,
    /// 源维度
    pub source_dimensions: usize,
    /// 目标维度
    pub target_dimensions: usize,
}

impl OperationMethod {
    /// 创建操作方法
    pub fn new(object: IdentifiedObject, source_dimensions: usize, target_dimensions: usize) -> Self {
        Self {
            object,
            formula: None,
            source_dimensions,
            target_dimensions,
        }
    }

    /// EPSG 方法代码
    pub fn epsg_code(&self) -> Option<u32> {
        self.object
            .identifier("EPSG")
            .and_then(|id| id.code.parse().ok())
    }
}

impl Comparable for OperationMethod {
    fn equals(&self, other: &Self, mode: ComparisonMode) -> bool {
        let same_method = match (self.epsg_code(), other.epsg_code()) {
            (Some(a), Some(b)) => a == b,
            _ => self.object.name_matches(&other.object.name),
        };
        same_method
            && self.source_dimensions == other.source_dimensions
            && self.target_dimensions == other.target_dimensions
            && self.object.equals(&other.object, mode)
    }
}

// ============================================================================
// 参数值
// ============================================================================

/// 单个参数值
#[derive(Debug, Clone)]
pub struct ParameterValue {
    /// 参数名称
    pub name: String,
    /// EPSG 参数代码
    pub code: Option<u32>,
    /// 数值
    pub value: f64,
    /// 单位，无单位参数为 `None`
    pub unit: Option<Arc<Unit>>,
}

impl ParameterValue {
    /// 创建参数值
    pub fn new(name: impl Into<String>, code: Option<u32>, value: f64, unit: Option<Arc<Unit>>) -> Self {
        Self {
            name: name.into(),
            code,
            value,
            unit,
        }
    }

    /// 换算到目标单位
    pub fn value_in(&self, unit: &Unit) -> ReferencingResult<f64> {
        match &self.unit {
            Some(own) => own.convert_to(self.value, unit),
            None => Ok(self.value),
        }
    }

    fn same_quantity(&self, other: &Self) -> bool {
        let a = self.unit.as_ref().map_or(self.value, |u| u.to_base(self.value));
        let b = other.unit.as_ref().map_or(other.value, |u| u.to_base(other.value));
        approx_eq(a, b, 1e-12 * a.abs().max(1.0))
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.unit {
            Some(unit) => write!(f, "{} = {} {}", self.name, self.value, unit),
            None => write!(f, "{} = {}", self.name, self.value),
        }
    }
}

/// 参数值组
#[derive(Debug, Clone, Default)]
pub struct ParameterValueGroup {
    /// 参数列表
    pub values: Vec<ParameterValue>,
}

impl ParameterValueGroup {
    /// 空参数组
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加参数
    pub fn push(&mut self, value: ParameterValue) {
        self.values.push(value);
    }

    /// 按 EPSG 代码查找
    pub fn get(&self, code: u32) -> Option<&ParameterValue> {
        self.values.iter().find(|v| v.code == Some(code))
    }

    /// 按名称查找（忽略大小写）
    pub fn by_name(&self, name: &str) -> Option<&ParameterValue> {
        self.values.iter().find(|v| v.name.eq_ignore_ascii_case(name))
    }

    /// 必需参数，换算到目标单位
    pub fn require(&self, code: u32, unit: &Unit) -> ReferencingResult<f64> {
        self.get(code)
            .ok_or_else(|| {
                ReferencingError::invalid_definition(format!("缺少 EPSG 参数 {code}"))
            })?
            .value_in(unit)
    }

    /// 可选参数，缺失时取默认值
    pub fn optional(&self, code: u32, unit: &Unit, default: f64) -> ReferencingResult<f64> {
        match self.get(code) {
            Some(v) => v.value_in(unit),
            None => Ok(default),
        }
    }

    /// 数值是否相同（顺序无关）
    pub fn same_values(&self, other: &Self) -> bool {
        self.values.len() == other.values.len()
            && self.values.iter().all(|a| {
                other.values.iter().any(|b| {
                    ((a.code.is_some() && a.code == b.code) || a.name.eq_ignore_ascii_case(&b.name))
                        && a.same_quantity(b)
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utm_50n() -> ParameterValueGroup {
        let degree = Arc::new(Unit::degree());
        let metre = Arc::new(Unit::metre());
        let mut group = ParameterValueGroup::new();
        group.push(ParameterValue::new("Latitude of natural origin", Some(LATITUDE_OF_ORIGIN), 0.0, Some(degree.clone())));
        group.push(ParameterValue::new("Longitude of natural origin", Some(LONGITUDE_OF_ORIGIN), 117.0, Some(degree)));
        group.push(ParameterValue::new("Scale factor at natural origin", Some(SCALE_FACTOR), 0.9996, Some(Arc::new(Unit::unity()))));
        group.push(ParameterValue::new("False easting", Some(FALSE_EASTING), 500_000.0, Some(metre.clone())));
        group.push(ParameterValue::new("False northing", Some(FALSE_NORTHING), 0.0, Some(metre)));
        group
    }

    #[test]
    fn test_require_with_unit_conversion() {
        let group = utm_50n();
        let lon0 = group.require(LONGITUDE_OF_ORIGIN, &Unit::radian()).unwrap();
        assert!((lon0 - 117f64.to_radians()).abs() < 1e-15);
        assert!(group.require(X_TRANSLATION, &Unit::metre()).is_err());
        assert_eq!(group.optional(X_TRANSLATION, &Unit::metre(), 0.0).unwrap(), 0.0);
    }

    #[test]
    fn test_same_values_ignores_order() {
        let a = utm_50n();
        let mut b = utm_50n();
        b.values.reverse();
        assert!(a.same_values(&b));
        b.values[0].value = 1.0;
        assert!(!a.same_values(&b));
    }
}
