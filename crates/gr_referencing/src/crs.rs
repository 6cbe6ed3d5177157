// crates/gr_referencing/src/crs.rs

//! 坐标参考系统
//!
//! 坐标系与基准面的组合。类别是封闭的标签联合：
//! 地理、地心、投影（派生：基础地理 CRS + 定义转换）、垂直、工程与复合。
//! 复合 CRS 的维度等于各分量维度之和。

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::cs::{CoordinateSystem, CsKind};
use crate::datum::{Datum, DatumKind};
use crate::error::{ReferencingError, ReferencingResult};
use crate::extent::Extent;
use crate::identified::{arc_equals, Comparable, ComparisonMode, Identifier, IdentifiedObject};
use crate::metadata::{self, Describe, PropertyDescriptor};
use crate::operation::{CoordinateOperation, OperationKind};

/// 坐标参考系统类别
#[derive(Debug, Clone)]
pub enum CrsKind {
    /// 地理（经纬度[、椭球高]）
    Geographic {
        /// 大地基准面
        datum: Arc<Datum>,
        /// 椭球坐标系
        cs: Arc<CoordinateSystem>,
    },
    /// 地心笛卡尔
    Geocentric {
        /// 大地基准面
        datum: Arc<Datum>,
        /// 三维笛卡尔坐标系
        cs: Arc<CoordinateSystem>,
    },
    /// 投影
    Projected {
        /// 基础地理 CRS
        base: Arc<CoordinateReferenceSystem>,
        /// 定义转换（没有源/目标 CRS 的模板）
        conversion: Arc<CoordinateOperation>,
        /// 二维笛卡尔坐标系
        cs: Arc<CoordinateSystem>,
    },
    /// 垂直
    Vertical {
        /// 垂直基准面
        datum: Arc<Datum>,
        /// 垂直坐标系
        cs: Arc<CoordinateSystem>,
    },
    /// 工程（局部）
    Engineering {
        /// 工程基准面
        datum: Arc<Datum>,
        /// 坐标系
        cs: Arc<CoordinateSystem>,
    },
    /// 复合
    Compound {
        /// 有序分量
        components: Vec<Arc<CoordinateReferenceSystem>>,
    },
}

/// 坐标参考系统
#[derive(Debug, Clone)]
pub struct CoordinateReferenceSystem {
    /// 元数据
    pub object: IdentifiedObject,
    /// 类别与结构
    pub kind: CrsKind,
    /// 有效范围
    pub domain: Option<Extent>,
    /// 用途
    pub scope: Option<String>,
}

impl CoordinateReferenceSystem {
    // ========================================================================
    // 构造方法
    // ========================================================================

    fn build(object: IdentifiedObject, kind: CrsKind) -> Self {
        Self {
            object,
            kind,
            domain: None,
            scope: None,
        }
    }

    /// 地理 CRS：大地基准面 + 椭球坐标系
    pub fn geographic(
        object: IdentifiedObject,
        datum: Arc<Datum>,
        cs: Arc<CoordinateSystem>,
    ) -> ReferencingResult<Self> {
        require_geodetic(&object, &datum)?;
        require_cs(&object, &cs, CsKind::Ellipsoidal)?;
        Ok(Self::build(object, CrsKind::Geographic { datum, cs }))
    }

    /// 地心 CRS：大地基准面 + 三维笛卡尔坐标系
    pub fn geocentric(
        object: IdentifiedObject,
        datum: Arc<Datum>,
        cs: Arc<CoordinateSystem>,
    ) -> ReferencingResult<Self> {
        require_geodetic(&object, &datum)?;
        require_cs(&object, &cs, CsKind::Cartesian)?;
        ReferencingError::check_dimension(&object.name, 3, cs.dimension())?;
        Ok(Self::build(object, CrsKind::Geocentric { datum, cs }))
    }

    /// 投影 CRS：基础地理 CRS + 定义转换 + 二维笛卡尔坐标系
    pub fn projected(
        object: IdentifiedObject,
        base: Arc<CoordinateReferenceSystem>,
        conversion: Arc<CoordinateOperation>,
        cs: Arc<CoordinateSystem>,
    ) -> ReferencingResult<Self> {
        if !matches!(base.kind, CrsKind::Geographic { .. }) {
            return Err(ReferencingError::invalid_definition(format!(
                "投影 CRS \"{}\" 的基础 CRS \"{}\" 不是地理 CRS",
                object.name,
                base.name()
            )));
        }
        if !matches!(conversion.kind, OperationKind::Conversion { .. }) {
            return Err(ReferencingError::invalid_definition(format!(
                "投影 CRS \"{}\" 的定义操作 \"{}\" 不是转换",
                object.name,
                conversion.name()
            )));
        }
        require_cs(&object, &cs, CsKind::Cartesian)?;
        ReferencingError::check_dimension(&object.name, 2, cs.dimension())?;
        Ok(Self::build(object, CrsKind::Projected { base, conversion, cs }))
    }

    /// 垂直 CRS
    pub fn vertical(
        object: IdentifiedObject,
        datum: Arc<Datum>,
        cs: Arc<CoordinateSystem>,
    ) -> ReferencingResult<Self> {
        if !matches!(datum.kind, DatumKind::Vertical) {
            return Err(mismatched_datum(&object, &datum, "垂直"));
        }
        require_cs(&object, &cs, CsKind::Vertical)?;
        Ok(Self::build(object, CrsKind::Vertical { datum, cs }))
    }

    /// 工程 CRS
    pub fn engineering(
        object: IdentifiedObject,
        datum: Arc<Datum>,
        cs: Arc<CoordinateSystem>,
    ) -> ReferencingResult<Self> {
        if !matches!(datum.kind, DatumKind::Engineering) {
            return Err(mismatched_datum(&object, &datum, "工程"));
        }
        Ok(Self::build(object, CrsKind::Engineering { datum, cs }))
    }

    /// 复合 CRS，至少两个分量
    pub fn compound(
        object: IdentifiedObject,
        components: Vec<Arc<CoordinateReferenceSystem>>,
    ) -> ReferencingResult<Self> {
        if components.len() < 2 {
            return Err(ReferencingError::invalid_definition(format!(
                "复合 CRS \"{}\" 至少需要两个分量，实际 {}",
                object.name,
                components.len()
            )));
        }
        Ok(Self::build(object, CrsKind::Compound { components }))
    }

    /// 设置有效范围
    #[must_use]
    pub fn with_domain(mut self, domain: Option<Extent>) -> Self {
        self.domain = domain;
        self
    }

    /// 设置用途
    #[must_use]
    pub fn with_scope(mut self, scope: Option<String>) -> Self {
        self.scope = scope;
        self
    }

    /// 经度、纬度顺序（度）的 WGS 84 地理 CRS，不带权威代码
    pub fn wgs84_lon_lat() -> Self {
        Self::build(
            IdentifiedObject::named("WGS84(DD)"),
            CrsKind::Geographic {
                datum: Arc::new(Datum::wgs84()),
                cs: Arc::new(CoordinateSystem::normalized_ellipsoidal(false)),
            },
        )
    }

    /// WGS 84 地心 CRS，不带权威代码
    pub fn wgs84_geocentric() -> Self {
        Self::build(
            IdentifiedObject::named("WGS84 geocentric"),
            CrsKind::Geocentric {
                datum: Arc::new(Datum::wgs84()),
                cs: Arc::new(CoordinateSystem::normalized_geocentric()),
            },
        )
    }

    // ========================================================================
    // 访问
    // ========================================================================

    /// 名称
    pub fn name(&self) -> &str {
        &self.object.name
    }

    /// 指定权威机构下的标识符
    pub fn identifier(&self, authority: &str) -> Option<&Identifier> {
        self.object.identifier(authority)
    }

    /// 维度；复合 CRS 为各分量之和
    pub fn dimension(&self) -> usize {
        match &self.kind {
            CrsKind::Compound { components } => components.iter().map(|c| c.dimension()).sum(),
            _ => self.coordinate_system().map_or(0, |cs| cs.dimension()),
        }
    }

    /// 坐标系；复合 CRS 没有单一坐标系
    pub fn coordinate_system(&self) -> Option<&Arc<CoordinateSystem>> {
        match &self.kind {
            CrsKind::Geographic { cs, .. }
            | CrsKind::Geocentric { cs, .. }
            | CrsKind::Projected { cs, .. }
            | CrsKind::Vertical { cs, .. }
            | CrsKind::Engineering { cs, .. } => Some(cs),
            CrsKind::Compound { .. } => None,
        }
    }

    /// 基准面；投影 CRS 返回基础 CRS 的基准面
    pub fn datum(&self) -> Option<&Arc<Datum>> {
        match &self.kind {
            CrsKind::Geographic { datum, .. }
            | CrsKind::Geocentric { datum, .. }
            | CrsKind::Vertical { datum, .. }
            | CrsKind::Engineering { datum, .. } => Some(datum),
            CrsKind::Projected { base, .. } => base.datum(),
            CrsKind::Compound { .. } => None,
        }
    }

    /// 分量；单一 CRS 返回空切片
    pub fn components(&self) -> &[Arc<CoordinateReferenceSystem>] {
        match &self.kind {
            CrsKind::Compound { components } => components,
            _ => &[],
        }
    }

    /// 类别名称
    pub fn kind_label(&self) -> &'static str {
        match self.kind {
            CrsKind::Geographic { .. } => "地理",
            CrsKind::Geocentric { .. } => "地心",
            CrsKind::Projected { .. } => "投影",
            CrsKind::Vertical { .. } => "垂直",
            CrsKind::Engineering { .. } => "工程",
            CrsKind::Compound { .. } => "复合",
        }
    }

    /// 类别判别值，用于散列
    fn kind_tag(&self) -> u8 {
        match self.kind {
            CrsKind::Geographic { .. } => 0,
            CrsKind::Geocentric { .. } => 1,
            CrsKind::Projected { .. } => 2,
            CrsKind::Vertical { .. } => 3,
            CrsKind::Engineering { .. } => 4,
            CrsKind::Compound { .. } => 5,
        }
    }

    /// 按比较模式散列，与 [`Comparable::equals`] 一致
    pub fn hash_with<H: Hasher>(&self, mode: ComparisonMode, state: &mut H) {
        self.kind_tag().hash(state);
        self.dimension().hash(state);
        if mode == ComparisonMode::Strict {
            self.object.name.hash(state);
        }
        for component in self.components() {
            component.hash_with(mode, state);
        }
    }
}

fn require_geodetic(object: &IdentifiedObject, datum: &Datum) -> ReferencingResult<()> {
    if matches!(datum.kind, DatumKind::Geodetic { .. }) {
        Ok(())
    } else {
        Err(mismatched_datum(object, datum, "大地"))
    }
}

fn require_cs(object: &IdentifiedObject, cs: &CoordinateSystem, kind: CsKind) -> ReferencingResult<()> {
    if cs.kind == kind {
        Ok(())
    } else {
        Err(ReferencingError::invalid_definition(format!(
            "CRS \"{}\" 的坐标系 \"{}\" 类别为 {:?}，期望 {:?}",
            object.name, cs.object.name, cs.kind, kind
        )))
    }
}

fn mismatched_datum(object: &IdentifiedObject, datum: &Datum, expected: &str) -> ReferencingError {
    ReferencingError::invalid_definition(format!(
        "CRS \"{}\" 需要{}基准面，\"{}\" 是{}基准面",
        object.name,
        expected,
        datum.name(),
        datum.kind_label()
    ))
}

impl Comparable for CoordinateReferenceSystem {
    fn equals(&self, other: &Self, mode: ComparisonMode) -> bool {
        let structure = match (&self.kind, &other.kind) {
            (CrsKind::Geographic { datum: d1, cs: c1 }, CrsKind::Geographic { datum: d2, cs: c2 })
            | (CrsKind::Geocentric { datum: d1, cs: c1 }, CrsKind::Geocentric { datum: d2, cs: c2 })
            | (CrsKind::Vertical { datum: d1, cs: c1 }, CrsKind::Vertical { datum: d2, cs: c2 })
            | (CrsKind::Engineering { datum: d1, cs: c1 }, CrsKind::Engineering { datum: d2, cs: c2 }) => {
                arc_equals(d1, d2, mode) && arc_equals(c1, c2, mode)
            }
            (
                CrsKind::Projected { base: b1, conversion: v1, cs: c1 },
                CrsKind::Projected { base: b2, conversion: v2, cs: c2 },
            ) => arc_equals(b1, b2, mode) && arc_equals(v1, v2, mode) && arc_equals(c1, c2, mode),
            (CrsKind::Compound { components: a }, CrsKind::Compound { components: b }) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| arc_equals(x, y, mode))
            }
            _ => false,
        };
        structure
            && self.object.equals(&other.object, mode)
            && match mode {
                ComparisonMode::Strict => self.domain == other.domain && self.scope == other.scope,
                ComparisonMode::IgnoreMetadata => true,
            }
    }
}

impl PartialEq for CoordinateReferenceSystem {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other, ComparisonMode::Strict)
    }
}

impl fmt::Display for CoordinateReferenceSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.object.primary_identifier() {
            Some(id) => write!(f, "{} ({id})", self.object.name),
            None => f.write_str(&self.object.name),
        }
    }
}

impl Describe for CoordinateReferenceSystem {
    const KIND: &'static str = "坐标参考系统";
    const PROPERTIES: &'static [PropertyDescriptor<Self>] = &[
        PropertyDescriptor { name: "名称", get: |c| Some(c.object.name.clone()) },
        PropertyDescriptor { name: "标识符", get: |c| metadata::identifiers(&c.object) },
        PropertyDescriptor { name: "别名", get: |c| metadata::aliases(&c.object) },
        PropertyDescriptor { name: "类别", get: |c| Some(c.kind_label().to_string()) },
        PropertyDescriptor { name: "维度", get: |c| Some(c.dimension().to_string()) },
        PropertyDescriptor { name: "基准面", get: |c| c.datum().map(|d| d.object.name.clone()) },
        PropertyDescriptor {
            name: "坐标系",
            get: |c| c.coordinate_system().map(|cs| cs.object.name.clone()),
        },
        PropertyDescriptor {
            name: "基础 CRS",
            get: |c| match &c.kind {
                CrsKind::Projected { base, .. } => Some(base.object.name.clone()),
                _ => None,
            },
        },
        PropertyDescriptor {
            name: "分量",
            get: |c| {
                let names: Vec<_> = c.components().iter().map(|x| x.object.name.clone()).collect();
                (!names.is_empty()).then(|| names.join(" + "))
            },
        },
        PropertyDescriptor {
            name: "有效范围",
            get: |c| c.domain.as_ref().and_then(|d| d.description.clone()),
        },
        PropertyDescriptor { name: "用途", get: |c| c.scope.clone() },
        PropertyDescriptor { name: "备注", get: |c| c.object.remarks.clone() },
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::Unit;

    fn msl_height() -> Arc<CoordinateReferenceSystem> {
        Arc::new(
            CoordinateReferenceSystem::vertical(
                IdentifiedObject::with_code("MSL height", "EPSG", "5714"),
                Arc::new(Datum::vertical(IdentifiedObject::named("Mean Sea Level"))),
                Arc::new(CoordinateSystem::normalized_vertical()),
            )
            .unwrap(),
        )
    }

    /// 测试复合 CRS 的维度等于分量维度之和
    #[test]
    fn test_compound_dimension() {
        let horizontal = Arc::new(CoordinateReferenceSystem::wgs84_lon_lat());
        let compound = CoordinateReferenceSystem::compound(
            IdentifiedObject::named("WGS 84 + MSL height"),
            vec![horizontal, msl_height()],
        )
        .unwrap();
        assert_eq!(compound.dimension(), 3);
        assert!(compound.coordinate_system().is_none());
        assert_eq!(compound.components().len(), 2);
    }

    #[test]
    fn test_compound_requires_two_components() {
        let result = CoordinateReferenceSystem::compound(IdentifiedObject::named("x"), vec![msl_height()]);
        assert!(result.is_err());
    }

    #[test]
    fn test_kind_validation() {
        let vertical_datum = Arc::new(Datum::vertical(IdentifiedObject::named("MSL")));
        let result = CoordinateReferenceSystem::geographic(
            IdentifiedObject::named("bad"),
            vertical_datum,
            Arc::new(CoordinateSystem::normalized_ellipsoidal(false)),
        );
        assert!(result.is_err());

        let result = CoordinateReferenceSystem::geographic(
            IdentifiedObject::named("bad"),
            Arc::new(Datum::wgs84()),
            Arc::new(CoordinateSystem::normalized_projected()),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_comparison_modes() {
        let a = CoordinateReferenceSystem::wgs84_lon_lat();
        let mut b = CoordinateReferenceSystem::wgs84_lon_lat();
        b.object = IdentifiedObject::with_code("WGS 84", "EPSG", "4326");
        assert!(a.equals(&b, ComparisonMode::IgnoreMetadata));
        assert!(a != b);

        let geocentric = CoordinateReferenceSystem::wgs84_geocentric();
        assert!(!a.equals(&geocentric, ComparisonMode::IgnoreMetadata));
    }

    /// 测试轴单位不同的地理 CRS 结构不等
    #[test]
    fn test_unit_difference_is_structural() {
        let a = CoordinateReferenceSystem::wgs84_lon_lat();
        let mut cs = CoordinateSystem::normalized_ellipsoidal(false);
        for axis in &mut cs.axes {
            axis.unit = Arc::new(Unit::grad());
        }
        let b = CoordinateReferenceSystem::geographic(
            IdentifiedObject::named("grads"),
            Arc::new(Datum::wgs84()),
            Arc::new(cs),
        )
        .unwrap();
        assert!(!a.equals(&b, ComparisonMode::IgnoreMetadata));
    }
}
