// crates/gr_referencing/src/datum.rs

//! 基准面
//!
//! 大地基准面引用椭球体与本初子午线，并可携带到 WGS 84 的
//! Bursa-Wolf 七参数；垂直与工程基准面仅有元数据。

use std::fmt;
use std::sync::Arc;

use gr_foundation::float::approx_eq;
use nalgebra::DMatrix;

use crate::ellipsoid::Ellipsoid;
use crate::identified::{arc_equals, Comparable, ComparisonMode, IdentifiedObject};
use crate::metadata::{self, Describe, PropertyDescriptor};
use crate::prime_meridian::PrimeMeridian;

/// 角秒转弧度
const ARC_SECOND: f64 = std::f64::consts::PI / (180.0 * 3600.0);

// ============================================================================
// Bursa-Wolf 参数
// ============================================================================

/// Bursa-Wolf 七参数（位置矢量约定）
///
/// 平移单位为米，旋转单位为角秒，尺度单位为 ppm。
#[derive(Debug, Clone, PartialEq)]
pub struct BursaWolfParameters {
    /// 目标基准面名称
    pub target_datum: String,
    /// X 平移
    pub dx: f64,
    /// Y 平移
    pub dy: f64,
    /// Z 平移
    pub dz: f64,
    /// X 旋转
    pub ex: f64,
    /// Y 旋转
    pub ey: f64,
    /// Z 旋转
    pub ez: f64,
    /// 尺度差
    pub ppm: f64,
}

impl BursaWolfParameters {
    /// 全零参数
    pub fn identity(target_datum: impl Into<String>) -> Self {
        Self {
            target_datum: target_datum.into(),
            dx: 0.0,
            dy: 0.0,
            dz: 0.0,
            ex: 0.0,
            ey: 0.0,
            ez: 0.0,
            ppm: 0.0,
        }
    }

    /// 三参数平移
    pub fn translation(target_datum: impl Into<String>, dx: f64, dy: f64, dz: f64) -> Self {
        Self {
            dx,
            dy,
            dz,
            ..Self::identity(target_datum)
        }
    }

    /// 是否为恒等变换
    pub fn is_identity(&self) -> bool {
        self.is_translation() && self.dx == 0.0 && self.dy == 0.0 && self.dz == 0.0
    }

    /// 是否仅含平移
    pub fn is_translation(&self) -> bool {
        self.ex == 0.0 && self.ey == 0.0 && self.ez == 0.0 && self.ppm == 0.0
    }

    /// 地心坐标下的 4×4 仿射矩阵
    ///
    /// X' = (1 + ppm·10⁻⁶) · R · X + T
    pub fn to_matrix(&self) -> DMatrix<f64> {
        let s = 1.0 + self.ppm * 1e-6;
        let rx = self.ex * ARC_SECOND * s;
        let ry = self.ey * ARC_SECOND * s;
        let rz = self.ez * ARC_SECOND * s;
        DMatrix::from_row_slice(
            4,
            4,
            &[
                s, -rz, ry, self.dx, //
                rz, s, -rx, self.dy, //
                -ry, rx, s, self.dz, //
                0.0, 0.0, 0.0, 1.0,
            ],
        )
    }

    /// 一阶近似逆参数
    #[must_use]
    pub fn inverse(&self) -> Self {
        Self {
            target_datum: self.target_datum.clone(),
            dx: -self.dx,
            dy: -self.dy,
            dz: -self.dz,
            ex: -self.ex,
            ey: -self.ey,
            ez: -self.ez,
            ppm: -self.ppm,
        }
    }

    /// 数值近似相等（忽略目标名称）
    pub fn approx_eq(&self, other: &Self, eps: f64) -> bool {
        approx_eq(self.dx, other.dx, eps)
            && approx_eq(self.dy, other.dy, eps)
            && approx_eq(self.dz, other.dz, eps)
            && approx_eq(self.ex, other.ex, eps)
            && approx_eq(self.ey, other.ey, eps)
            && approx_eq(self.ez, other.ez, eps)
            && approx_eq(self.ppm, other.ppm, eps)
    }
}

impl fmt::Display for BursaWolfParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{},{},{}",
            self.dx, self.dy, self.dz, self.ex, self.ey, self.ez, self.ppm
        )
    }
}

// ============================================================================
// 基准面
// ============================================================================

/// 基准面类别
#[derive(Debug, Clone)]
pub enum DatumKind {
    /// 大地基准面
    Geodetic {
        /// 椭球体
        ellipsoid: Arc<Ellipsoid>,
        /// 本初子午线
        prime_meridian: Arc<PrimeMeridian>,
        /// 到 WGS 84 的转换参数
        to_wgs84: Vec<BursaWolfParameters>,
    },
    /// 垂直基准面
    Vertical,
    /// 工程基准面
    Engineering,
}

/// 基准面
#[derive(Debug, Clone)]
pub struct Datum {
    /// 元数据
    pub object: IdentifiedObject,
    /// 类别与参数
    pub kind: DatumKind,
}

impl Datum {
    /// 大地基准面
    pub fn geodetic(
        object: IdentifiedObject,
        ellipsoid: Arc<Ellipsoid>,
        prime_meridian: Arc<PrimeMeridian>,
    ) -> Self {
        Self {
            object,
            kind: DatumKind::Geodetic {
                ellipsoid,
                prime_meridian,
                to_wgs84: Vec::new(),
            },
        }
    }

    /// 垂直基准面
    pub fn vertical(object: IdentifiedObject) -> Self {
        Self {
            object,
            kind: DatumKind::Vertical,
        }
    }

    /// 工程基准面
    pub fn engineering(object: IdentifiedObject) -> Self {
        Self {
            object,
            kind: DatumKind::Engineering,
        }
    }

    /// WGS 84 基准面 (EPSG:6326)
    pub fn wgs84() -> Self {
        Self::geodetic(
            IdentifiedObject::with_code("World Geodetic System 1984", "EPSG", "6326"),
            Arc::new(Ellipsoid::wgs84()),
            Arc::new(PrimeMeridian::greenwich()),
        )
    }

    /// 附加到 WGS 84 的转换参数，非大地基准面忽略
    #[must_use]
    pub fn with_to_wgs84(mut self, params: Vec<BursaWolfParameters>) -> Self {
        if let DatumKind::Geodetic { to_wgs84, .. } = &mut self.kind {
            *to_wgs84 = params;
        }
        self
    }

    /// 名称
    pub fn name(&self) -> &str {
        &self.object.name
    }

    /// 椭球体（仅大地基准面）
    pub fn ellipsoid(&self) -> Option<&Arc<Ellipsoid>> {
        match &self.kind {
            DatumKind::Geodetic { ellipsoid, .. } => Some(ellipsoid),
            _ => None,
        }
    }

    /// 本初子午线（仅大地基准面）
    pub fn prime_meridian(&self) -> Option<&Arc<PrimeMeridian>> {
        match &self.kind {
            DatumKind::Geodetic { prime_meridian, .. } => Some(prime_meridian),
            _ => None,
        }
    }

    /// 到 WGS 84 的参数列表
    pub fn to_wgs84(&self) -> &[BursaWolfParameters] {
        match &self.kind {
            DatumKind::Geodetic { to_wgs84, .. } => to_wgs84,
            _ => &[],
        }
    }

    /// 是否为 WGS 84 本身
    pub fn is_wgs84(&self) -> bool {
        self.object
            .identifier("EPSG")
            .is_some_and(|id| id.code == "6326")
            || self.object.name_matches("WGS84")
            || self.object.name_matches("WGS 84")
            || self.object.name_matches("World Geodetic System 1984")
    }

    /// 类别名称
    pub fn kind_label(&self) -> &'static str {
        match self.kind {
            DatumKind::Geodetic { .. } => "大地",
            DatumKind::Vertical => "垂直",
            DatumKind::Engineering => "工程",
        }
    }
}

impl Comparable for Datum {
    fn equals(&self, other: &Self, mode: ComparisonMode) -> bool {
        let structure = match (&self.kind, &other.kind) {
            (
                DatumKind::Geodetic { ellipsoid: e1, prime_meridian: p1, to_wgs84: w1 },
                DatumKind::Geodetic { ellipsoid: e2, prime_meridian: p2, to_wgs84: w2 },
            ) => {
                arc_equals(e1, e2, mode)
                    && arc_equals(p1, p2, mode)
                    && w1.len() == w2.len()
                    && w1.iter().zip(w2).all(|(a, b)| match mode {
                        ComparisonMode::Strict => a == b,
                        ComparisonMode::IgnoreMetadata => a.approx_eq(b, 1e-9),
                    })
            }
            // 垂直与工程基准面没有数值参数，只能按名称区分
            (DatumKind::Vertical, DatumKind::Vertical)
            | (DatumKind::Engineering, DatumKind::Engineering) => match mode {
                ComparisonMode::Strict => true,
                ComparisonMode::IgnoreMetadata => {
                    self.object.name_matches(&other.object.name)
                        || other.object.name_matches(&self.object.name)
                }
            },
            _ => false,
        };
        structure && self.object.equals(&other.object, mode)
    }
}

impl PartialEq for Datum {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other, ComparisonMode::Strict)
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.object.name)
    }
}

impl Describe for Datum {
    const KIND: &'static str = "基准面";
    const PROPERTIES: &'static [PropertyDescriptor<Self>] = &[
        PropertyDescriptor { name: "名称", get: |d| Some(d.object.name.clone()) },
        PropertyDescriptor { name: "标识符", get: |d| metadata::identifiers(&d.object) },
        PropertyDescriptor { name: "别名", get: |d| metadata::aliases(&d.object) },
        PropertyDescriptor { name: "类别", get: |d| Some(d.kind_label().to_string()) },
        PropertyDescriptor { name: "椭球体", get: |d| d.ellipsoid().map(|e| e.object.name.clone()) },
        PropertyDescriptor { name: "本初子午线", get: |d| d.prime_meridian().map(|p| p.object.name.clone()) },
        PropertyDescriptor {
            name: "TOWGS84",
            get: |d| d.to_wgs84().first().map(ToString::to_string),
        },
        PropertyDescriptor { name: "备注", get: |d| d.object.remarks.clone() },
    ];
}
