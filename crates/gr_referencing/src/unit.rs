// crates/gr_referencing/src/unit.rs

//! 计量单位
//!
//! 单位以到国际单位制基本单位（米、弧度、无量纲、秒）的线性系数表示，
//! 可选记录其派生自的基础单位。

use std::fmt;
use std::sync::Arc;

use gr_foundation::float::relative_eq;

use crate::error::{ReferencingError, ReferencingResult};
use crate::identified::{arc_equals, Comparable, ComparisonMode, IdentifiedObject};
use crate::metadata::{self, Describe, PropertyDescriptor};

/// 单位类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    /// 长度
    Linear,
    /// 角度
    Angular,
    /// 比例（无量纲）
    Scale,
    /// 时间
    Time,
}

impl UnitKind {
    /// 中文名称
    pub fn label(self) -> &'static str {
        match self {
            Self::Linear => "长度",
            Self::Angular => "角度",
            Self::Scale => "比例",
            Self::Time => "时间",
        }
    }
}

/// 计量单位
#[derive(Debug, Clone)]
pub struct Unit {
    /// 元数据
    pub object: IdentifiedObject,
    /// 类别
    pub kind: UnitKind,
    /// 到基本单位的系数
    pub to_si: f64,
    /// 派生自的基础单位
    pub base: Option<Arc<Unit>>,
}

impl Unit {
    // ========================================================================
    // 构造方法
    // ========================================================================

    /// 创建基本单位或直接给出换算系数的单位
    pub fn new(object: IdentifiedObject, kind: UnitKind, to_si: f64) -> Self {
        Self {
            object,
            kind,
            to_si,
            base: None,
        }
    }

    /// 由基础单位与比例系数派生
    pub fn derived(object: IdentifiedObject, base: Arc<Unit>, factor: f64) -> Self {
        Self {
            object,
            kind: base.kind,
            to_si: base.to_si * factor,
            base: Some(base),
        }
    }

    fn well_known(name: &str, code: &str, kind: UnitKind, to_si: f64) -> Self {
        Self::new(IdentifiedObject::with_code(name, "EPSG", code), kind, to_si)
    }

    /// 米
    pub fn metre() -> Self {
        Self::well_known("metre", "9001", UnitKind::Linear, 1.0)
    }

    /// 国际英尺
    pub fn foot() -> Self {
        Self::well_known("foot", "9002", UnitKind::Linear, 0.3048)
    }

    /// 海里
    pub fn nautical_mile() -> Self {
        Self::well_known("nautical mile", "9030", UnitKind::Linear, 1852.0)
    }

    /// 弧度
    pub fn radian() -> Self {
        Self::well_known("radian", "9101", UnitKind::Angular, 1.0)
    }

    /// 度
    pub fn degree() -> Self {
        Self::well_known("degree", "9102", UnitKind::Angular, std::f64::consts::PI / 180.0)
    }

    /// 百分度
    pub fn grad() -> Self {
        Self::well_known("grad", "9105", UnitKind::Angular, std::f64::consts::PI / 200.0)
    }

    /// 微弧度
    pub fn microradian() -> Self {
        Self::well_known("microradian", "9109", UnitKind::Angular, 1e-6)
    }

    /// 无量纲
    pub fn unity() -> Self {
        Self::well_known("unity", "9201", UnitKind::Scale, 1.0)
    }

    /// 角秒
    pub fn arc_second() -> Self {
        Self::well_known("arc-second", "9104", UnitKind::Angular, std::f64::consts::PI / 648_000.0)
    }

    /// 百万分之一
    pub fn parts_per_million() -> Self {
        Self::well_known("parts per million", "9202", UnitKind::Scale, 1e-6)
    }

    // ========================================================================
    // 换算
    // ========================================================================

    /// 名称
    pub fn name(&self) -> &str {
        &self.object.name
    }

    /// 是否可换算到目标单位
    pub fn is_compatible(&self, other: &Unit) -> bool {
        self.kind == other.kind
    }

    /// 到目标单位的系数：`value_in_other = value_in_self * factor`
    pub fn factor_to(&self, other: &Unit) -> ReferencingResult<f64> {
        if !self.is_compatible(other) {
            return Err(ReferencingError::invalid_definition(format!(
                "{}单位 \"{}\" 无法换算为{}单位 \"{}\"",
                self.kind.label(),
                self.name(),
                other.kind.label(),
                other.name()
            )));
        }
        Ok(self.to_si / other.to_si)
    }

    /// 把数值从本单位换算到目标单位
    pub fn convert_to(&self, value: f64, other: &Unit) -> ReferencingResult<f64> {
        Ok(value * self.factor_to(other)?)
    }

    /// 换算为基本单位
    #[inline]
    pub fn to_base(&self, value: f64) -> f64 {
        value * self.to_si
    }
}

impl Comparable for Unit {
    fn equals(&self, other: &Self, mode: ComparisonMode) -> bool {
        self.kind == other.kind
            && relative_eq(self.to_si, other.to_si, 1e-12)
            && self.object.equals(&other.object, mode)
            && match mode {
                ComparisonMode::Strict => match (&self.base, &other.base) {
                    (Some(a), Some(b)) => arc_equals(a, b, mode),
                    (None, None) => true,
                    _ => false,
                },
                ComparisonMode::IgnoreMetadata => true,
            }
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other, ComparisonMode::Strict)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Describe for Unit {
    const KIND: &'static str = "单位";
    const PROPERTIES: &'static [PropertyDescriptor<Self>] = &[
        PropertyDescriptor { name: "名称", get: |u| Some(u.object.name.clone()) },
        PropertyDescriptor { name: "标识符", get: |u| metadata::identifiers(&u.object) },
        PropertyDescriptor { name: "类别", get: |u| Some(u.kind.label().to_string()) },
        PropertyDescriptor { name: "基本单位系数", get: |u| metadata::number(u.to_si) },
        PropertyDescriptor { name: "基础单位", get: |u| u.base.as_ref().map(|b| b.object.name.clone()) },
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degree_to_radian() {
        let deg = Unit::degree();
        let rad = Unit::radian();
        let value = deg.convert_to(180.0, &rad).unwrap();
        assert!((value - std::f64::consts::PI).abs() < 1e-15);
    }

    #[test]
    fn test_incompatible_units() {
        assert!(Unit::metre().factor_to(&Unit::degree()).is_err());
    }

    /// 测试派生单位沿链换算
    #[test]
    fn test_derived_unit() {
        let metre = Arc::new(Unit::metre());
        let survey_foot = Unit::derived(
            IdentifiedObject::with_code("US survey foot", "EPSG", "9003"),
            metre,
            1200.0 / 3937.0,
        );
        let value = survey_foot.convert_to(3937.0, &Unit::metre()).unwrap();
        assert!((value - 1200.0).abs() < 1e-9);
        assert_eq!(survey_foot.kind, UnitKind::Linear);
    }

    #[test]
    fn test_comparison_modes() {
        let a = Unit::degree();
        let mut b = Unit::degree();
        b.object.name = "degree (supplier to define representation)".into();
        assert!(a.equals(&b, ComparisonMode::IgnoreMetadata));
        assert!(!a.equals(&b, ComparisonMode::Strict));
    }

    #[test]
    fn test_describe() {
        let props = Unit::nautical_mile().describe();
        assert!(props.iter().any(|(k, v)| *k == "名称" && v == "nautical mile"));
        assert!(props.iter().all(|(k, _)| *k != "基础单位"));
    }
}
