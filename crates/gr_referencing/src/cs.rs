// crates/gr_referencing/src/cs.rs

//! 坐标系
//!
//! 有序坐标轴的集合，每根轴带方向与单位。两个坐标系若只在轴顺序、
//! 方向或单位上不同，可以由 [`swap_and_scale`] 得到二者之间的仿射矩阵。

use std::fmt;
use std::sync::Arc;

use nalgebra::DMatrix;

use crate::error::{ReferencingError, ReferencingResult};
use crate::identified::{arc_equals, Comparable, ComparisonMode, IdentifiedObject};
use crate::metadata::{self, Describe, PropertyDescriptor};
use crate::unit::{Unit, UnitKind};

// ============================================================================
// 轴方向
// ============================================================================

/// 坐标轴方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisDirection {
    /// 北
    North,
    /// 南
    South,
    /// 东
    East,
    /// 西
    West,
    /// 上
    Up,
    /// 下
    Down,
    /// 地心 X（赤道与本初子午线交点）
    GeocentricX,
    /// 地心 Y（赤道与东经 90°交点）
    GeocentricY,
    /// 地心 Z（北极）
    GeocentricZ,
}

impl AxisDirection {
    /// 解析 EPSG 数据库中的方向字符串
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim().to_ascii_lowercase();
        let direction = match text.as_str() {
            "north" => Self::North,
            "south" => Self::South,
            "east" => Self::East,
            "west" => Self::West,
            "up" => Self::Up,
            "down" => Self::Down,
            "geocentre > equator/pm" | "geocentricx" => Self::GeocentricX,
            "geocentre > equator/90de" | "geocentricy" => Self::GeocentricY,
            "geocentre > north pole" | "geocentricz" => Self::GeocentricZ,
            _ => return None,
        };
        Some(direction)
    }

    /// 所在的绝对方向（南→北、西→东、下→上）
    pub fn absolute(self) -> Self {
        match self {
            Self::South => Self::North,
            Self::West => Self::East,
            Self::Down => Self::Up,
            other => other,
        }
    }

    /// 与绝对方向是否相反
    pub fn is_reversed(self) -> bool {
        self.absolute() != self
    }

    /// WKT 关键字
    pub fn wkt_name(self) -> &'static str {
        match self {
            Self::North => "NORTH",
            Self::South => "SOUTH",
            Self::East => "EAST",
            Self::West => "WEST",
            Self::Up => "UP",
            Self::Down => "DOWN",
            Self::GeocentricX => "OTHER",
            Self::GeocentricY => "EAST",
            Self::GeocentricZ => "NORTH",
        }
    }
}

// ============================================================================
// 坐标轴
// ============================================================================

/// 坐标轴
#[derive(Debug, Clone)]
pub struct CoordinateSystemAxis {
    /// 轴名称
    pub name: String,
    /// 缩写
    pub abbreviation: String,
    /// 方向
    pub direction: AxisDirection,
    /// 单位
    pub unit: Arc<Unit>,
}

impl CoordinateSystemAxis {
    /// 创建坐标轴
    pub fn new(
        name: impl Into<String>,
        abbreviation: impl Into<String>,
        direction: AxisDirection,
        unit: Arc<Unit>,
    ) -> Self {
        Self {
            name: name.into(),
            abbreviation: abbreviation.into(),
            direction,
            unit,
        }
    }

    fn equals(&self, other: &Self, mode: ComparisonMode) -> bool {
        self.direction == other.direction
            && arc_equals(&self.unit, &other.unit, mode)
            && match mode {
                ComparisonMode::Strict => {
                    self.name == other.name && self.abbreviation == other.abbreviation
                }
                ComparisonMode::IgnoreMetadata => true,
            }
    }
}

// ============================================================================
// 坐标系
// ============================================================================

/// 坐标系类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CsKind {
    /// 椭球坐标系（经纬度[、椭球高]）
    Ellipsoidal,
    /// 笛卡尔坐标系（投影平面或地心）
    Cartesian,
    /// 垂直坐标系
    Vertical,
}

/// 坐标系
#[derive(Debug, Clone)]
pub struct CoordinateSystem {
    /// 元数据
    pub object: IdentifiedObject,
    /// 类别
    pub kind: CsKind,
    /// 有序坐标轴
    pub axes: Vec<CoordinateSystemAxis>,
}

impl CoordinateSystem {
    /// 创建坐标系，检查轴数与类别相符
    pub fn new(
        object: IdentifiedObject,
        kind: CsKind,
        axes: Vec<CoordinateSystemAxis>,
    ) -> ReferencingResult<Self> {
        let valid = match kind {
            CsKind::Ellipsoidal => matches!(axes.len(), 2 | 3),
            CsKind::Cartesian => matches!(axes.len(), 2 | 3),
            CsKind::Vertical => axes.len() == 1,
        };
        if !valid {
            return Err(ReferencingError::invalid_definition(format!(
                "坐标系 \"{}\" 的轴数 {} 与类别 {:?} 不符",
                object.name,
                axes.len(),
                kind
            )));
        }
        for (i, a) in axes.iter().enumerate() {
            if axes[..i].iter().any(|b| b.direction.absolute() == a.direction.absolute()) {
                return Err(ReferencingError::invalid_definition(format!(
                    "坐标系 \"{}\" 中存在重复方向的轴 \"{}\"",
                    object.name, a.name
                )));
            }
        }
        Ok(Self { object, kind, axes })
    }

    /// 维度
    #[inline]
    pub fn dimension(&self) -> usize {
        self.axes.len()
    }

    /// 经度、纬度（度）的标准椭球坐标系，可选椭球高（米）
    pub fn normalized_ellipsoidal(three_d: bool) -> Self {
        let degree = Arc::new(Unit::degree());
        let mut axes = vec![
            CoordinateSystemAxis::new("Geodetic longitude", "Lon", AxisDirection::East, degree.clone()),
            CoordinateSystemAxis::new("Geodetic latitude", "Lat", AxisDirection::North, degree),
        ];
        if three_d {
            axes.push(CoordinateSystemAxis::new(
                "Ellipsoidal height",
                "h",
                AxisDirection::Up,
                Arc::new(Unit::metre()),
            ));
        }
        Self {
            object: IdentifiedObject::named("Ellipsoidal CS. Axes: longitude, latitude. UoM: degree"),
            kind: CsKind::Ellipsoidal,
            axes,
        }
    }

    /// 东、北（米）的标准平面笛卡尔坐标系
    pub fn normalized_projected() -> Self {
        let metre = Arc::new(Unit::metre());
        Self {
            object: IdentifiedObject::named("Cartesian 2D CS. Axes: easting, northing. UoM: m"),
            kind: CsKind::Cartesian,
            axes: vec![
                CoordinateSystemAxis::new("Easting", "E", AxisDirection::East, metre.clone()),
                CoordinateSystemAxis::new("Northing", "N", AxisDirection::North, metre),
            ],
        }
    }

    /// X、Y、Z（米）的标准地心坐标系
    pub fn normalized_geocentric() -> Self {
        let metre = Arc::new(Unit::metre());
        Self {
            object: IdentifiedObject::named("Cartesian 3D CS (geocentric). Axes: X, Y, Z. UoM: m"),
            kind: CsKind::Cartesian,
            axes: vec![
                CoordinateSystemAxis::new("Geocentric X", "X", AxisDirection::GeocentricX, metre.clone()),
                CoordinateSystemAxis::new("Geocentric Y", "Y", AxisDirection::GeocentricY, metre.clone()),
                CoordinateSystemAxis::new("Geocentric Z", "Z", AxisDirection::GeocentricZ, metre),
            ],
        }
    }

    /// 向上（米）的标准垂直坐标系
    pub fn normalized_vertical() -> Self {
        Self {
            object: IdentifiedObject::named("Vertical CS. Axis: height (H). UoM: m"),
            kind: CsKind::Vertical,
            axes: vec![CoordinateSystemAxis::new(
                "Gravity-related height",
                "H",
                AxisDirection::Up,
                Arc::new(Unit::metre()),
            )],
        }
    }

    /// 第一根指定单位类别的轴
    pub fn axis_unit(&self, kind: UnitKind) -> Option<&Arc<Unit>> {
        self.axes.iter().map(|a| &a.unit).find(|u| u.kind == kind)
    }
}

impl Comparable for CoordinateSystem {
    fn equals(&self, other: &Self, mode: ComparisonMode) -> bool {
        self.kind == other.kind
            && self.axes.len() == other.axes.len()
            && self.axes.iter().zip(&other.axes).all(|(a, b)| a.equals(b, mode))
            && self.object.equals(&other.object, mode)
    }
}

impl PartialEq for CoordinateSystem {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other, ComparisonMode::Strict)
    }
}

impl fmt::Display for CoordinateSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.object.name)
    }
}

impl Describe for CoordinateSystem {
    const KIND: &'static str = "坐标系";
    const PROPERTIES: &'static [PropertyDescriptor<Self>] = &[
        PropertyDescriptor { name: "名称", get: |c| Some(c.object.name.clone()) },
        PropertyDescriptor { name: "标识符", get: |c| metadata::identifiers(&c.object) },
        PropertyDescriptor { name: "维度", get: |c| Some(c.dimension().to_string()) },
        PropertyDescriptor {
            name: "坐标轴",
            get: |c| {
                Some(
                    c.axes
                        .iter()
                        .map(|a| format!("{} ({:?}, {})", a.name, a.direction, a.unit))
                        .collect::<Vec<_>>()
                        .join("; "),
                )
            },
        },
    ];
}

// ============================================================================
// 轴交换与缩放
// ============================================================================

/// 计算从 `source` 坐标系到 `target` 坐标系的仿射矩阵
///
/// 两个坐标系必须只在轴顺序、方向或单位上不同。
/// 返回 `(target_dim+1) × (source_dim+1)` 的齐次矩阵。
pub fn swap_and_scale(
    source: &CoordinateSystem,
    target: &CoordinateSystem,
) -> ReferencingResult<DMatrix<f64>> {
    let src_dim = source.dimension();
    let tgt_dim = target.dimension();
    let mut matrix = DMatrix::<f64>::zeros(tgt_dim + 1, src_dim + 1);
    matrix[(tgt_dim, src_dim)] = 1.0;

    for (j, tgt_axis) in target.axes.iter().enumerate() {
        let absolute = tgt_axis.direction.absolute();
        let (i, src_axis) = source
            .axes
            .iter()
            .enumerate()
            .find(|(_, a)| a.direction.absolute() == absolute)
            .ok_or_else(|| {
                ReferencingError::invalid_definition(format!(
                    "坐标系 \"{}\" 中没有与轴 \"{}\" 同向的轴",
                    source.object.name, tgt_axis.name
                ))
            })?;
        let sign = if src_axis.direction == tgt_axis.direction { 1.0 } else { -1.0 };
        let scale = src_axis.unit.factor_to(&tgt_axis.unit)?;
        matrix[(j, i)] = sign * scale;
    }
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lat_lon() -> CoordinateSystem {
        let degree = Arc::new(Unit::degree());
        CoordinateSystem::new(
            IdentifiedObject::with_code("Ellipsoidal 2D CS. Axes: latitude, longitude.", "EPSG", "6422"),
            CsKind::Ellipsoidal,
            vec![
                CoordinateSystemAxis::new("Geodetic latitude", "Lat", AxisDirection::North, degree.clone()),
                CoordinateSystemAxis::new("Geodetic longitude", "Lon", AxisDirection::East, degree),
            ],
        )
        .unwrap()
    }

    /// 测试纬经到经纬的轴交换
    #[test]
    fn test_swap_axes() {
        let m = swap_and_scale(&lat_lon(), &CoordinateSystem::normalized_ellipsoidal(false)).unwrap();
        assert_eq!(m.nrows(), 3);
        assert_eq!(m[(0, 1)], 1.0);
        assert_eq!(m[(1, 0)], 1.0);
        assert_eq!(m[(0, 0)], 0.0);
        assert_eq!(m[(2, 2)], 1.0);
    }

    /// 测试反向轴与单位缩放
    #[test]
    fn test_reverse_and_scale() {
        let source = CoordinateSystem::new(
            IdentifiedObject::named("depth"),
            CsKind::Vertical,
            vec![CoordinateSystemAxis::new("Depth", "D", AxisDirection::Down, Arc::new(Unit::foot()))],
        )
        .unwrap();
        let m = swap_and_scale(&source, &CoordinateSystem::normalized_vertical()).unwrap();
        assert!((m[(0, 0)] + 0.3048).abs() < 1e-15);
    }

    #[test]
    fn test_incompatible_axes() {
        let result = swap_and_scale(
            &CoordinateSystem::normalized_vertical(),
            &CoordinateSystem::normalized_projected(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_direction_rejected() {
        let metre = Arc::new(Unit::metre());
        let result = CoordinateSystem::new(
            IdentifiedObject::named("bad"),
            CsKind::Cartesian,
            vec![
                CoordinateSystemAxis::new("a", "a", AxisDirection::North, metre.clone()),
                CoordinateSystemAxis::new("b", "b", AxisDirection::South, metre),
            ],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_direction() {
        assert_eq!(AxisDirection::parse("north"), Some(AxisDirection::North));
        assert_eq!(AxisDirection::parse("Geocentre > north pole"), Some(AxisDirection::GeocentricZ));
        assert_eq!(AxisDirection::parse("sideways"), None);
        assert!(AxisDirection::West.is_reversed());
    }
}
