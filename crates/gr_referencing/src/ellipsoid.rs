// crates/gr_referencing/src/ellipsoid.rs

//! 椭球体定义
//!
//! 椭球体由长半轴和（短半轴或反扁率）之一定义，轴长以给定单位表示，
//! 换算为米必须显式调用 [`Ellipsoid::semi_major_in_metres`]。
//!
//! # 示例
//!
//! ```
//! use gr_referencing::ellipsoid::Ellipsoid;
//!
//! let wgs84 = Ellipsoid::wgs84();
//! assert!((wgs84.semi_minor_axis() - 6_356_752.314_245).abs() < 1e-3);
//! ```

use std::fmt;
use std::sync::Arc;

use gr_foundation::float::relative_eq;

use crate::error::{ReferencingError, ReferencingResult};
use crate::identified::{arc_equals, Comparable, ComparisonMode, IdentifiedObject};
use crate::metadata::{self, Describe, PropertyDescriptor};
use crate::unit::Unit;

/// 地球椭球体
#[derive(Debug, Clone)]
pub struct Ellipsoid {
    /// 元数据
    pub object: IdentifiedObject,
    /// 长半轴（以 `unit` 表示）
    semi_major: f64,
    /// 短半轴（以 `unit` 表示）
    semi_minor: f64,
    /// 反扁率，正球体为无穷大
    inverse_flattening: f64,
    /// 反扁率是否为定义参数
    ivf_definitive: bool,
    /// 轴长单位
    unit: Arc<Unit>,
}

impl Ellipsoid {
    // ========================================================================
    // 构造方法
    // ========================================================================

    /// 从长半轴和反扁率创建
    pub fn from_flattening(
        object: IdentifiedObject,
        semi_major: f64,
        inverse_flattening: f64,
        unit: Arc<Unit>,
    ) -> ReferencingResult<Self> {
        check_axis(&object.name, semi_major)?;
        if !(inverse_flattening > 0.0) {
            return Err(ReferencingError::invalid_definition(format!(
                "椭球体 \"{}\" 的反扁率必须为正: {inverse_flattening}",
                object.name
            )));
        }
        let semi_minor = if inverse_flattening.is_infinite() {
            semi_major
        } else {
            semi_major * (1.0 - 1.0 / inverse_flattening)
        };
        Ok(Self {
            object,
            semi_major,
            semi_minor,
            inverse_flattening,
            ivf_definitive: true,
            unit,
        })
    }

    /// 从长半轴和短半轴创建
    pub fn from_semi_axes(
        object: IdentifiedObject,
        semi_major: f64,
        semi_minor: f64,
        unit: Arc<Unit>,
    ) -> ReferencingResult<Self> {
        check_axis(&object.name, semi_major)?;
        check_axis(&object.name, semi_minor)?;
        let inverse_flattening = if semi_major == semi_minor {
            f64::INFINITY
        } else {
            semi_major / (semi_major - semi_minor)
        };
        Ok(Self {
            object,
            semi_major,
            semi_minor,
            inverse_flattening,
            ivf_definitive: false,
            unit,
        })
    }

    /// WGS84 椭球体 (EPSG:7030)
    pub fn wgs84() -> Self {
        Self {
            object: IdentifiedObject::with_code("WGS 84", "EPSG", "7030"),
            semi_major: 6_378_137.0,
            semi_minor: 6_378_137.0 * (1.0 - 1.0 / 298.257_223_563),
            inverse_flattening: 298.257_223_563,
            ivf_definitive: true,
            unit: Arc::new(Unit::metre()),
        }
    }

    // ========================================================================
    // 定义参数
    // ========================================================================

    /// 长半轴（以轴长单位表示）
    #[inline]
    pub fn semi_major_axis(&self) -> f64 {
        self.semi_major
    }

    /// 短半轴（以轴长单位表示）
    #[inline]
    pub fn semi_minor_axis(&self) -> f64 {
        self.semi_minor
    }

    /// 反扁率
    #[inline]
    pub fn inverse_flattening(&self) -> f64 {
        self.inverse_flattening
    }

    /// 反扁率是否为定义参数
    #[inline]
    pub fn is_ivf_definitive(&self) -> bool {
        self.ivf_definitive
    }

    /// 是否为正球体
    #[inline]
    pub fn is_sphere(&self) -> bool {
        self.semi_major == self.semi_minor
    }

    /// 轴长单位
    pub fn unit(&self) -> &Arc<Unit> {
        &self.unit
    }

    /// 长半轴（米）
    #[inline]
    pub fn semi_major_in_metres(&self) -> f64 {
        self.unit.to_base(self.semi_major)
    }

    /// 短半轴（米）
    #[inline]
    pub fn semi_minor_in_metres(&self) -> f64 {
        self.unit.to_base(self.semi_minor)
    }

    // ========================================================================
    // 派生参数
    // ========================================================================

    /// 扁率 f = (a-b)/a
    #[inline]
    pub fn flattening(&self) -> f64 {
        (self.semi_major - self.semi_minor) / self.semi_major
    }

    /// 第一偏心率的平方 e² = 2f - f²
    #[inline]
    pub fn e2(&self) -> f64 {
        let f = self.flattening();
        f * (2.0 - f)
    }

    /// 第一偏心率 e = √e²
    #[inline]
    pub fn e(&self) -> f64 {
        self.e2().sqrt()
    }

    /// 第三扁率 n = f/(2-f)
    #[inline]
    pub fn n(&self) -> f64 {
        let f = self.flattening();
        f / (2.0 - f)
    }

    /// 卯酉圈曲率半径（米）
    ///
    /// N = a / √(1-e²sin²φ)
    #[inline]
    pub fn prime_vertical_radius(&self, lat_rad: f64) -> f64 {
        let sin_lat = lat_rad.sin();
        self.semi_major_in_metres() / (1.0 - self.e2() * sin_lat * sin_lat).sqrt()
    }

    /// 子午圈曲率半径（米）
    ///
    /// M = a(1-e²) / (1-e²sin²φ)^(3/2)
    #[inline]
    pub fn meridional_radius(&self, lat_rad: f64) -> f64 {
        let sin_lat = lat_rad.sin();
        let e2 = self.e2();
        self.semi_major_in_metres() * (1.0 - e2) / (1.0 - e2 * sin_lat * sin_lat).powf(1.5)
    }

    // ========================================================================
    // 横轴墨卡托所需的 Krüger 系数
    // ========================================================================

    /// Krüger α 系数（正向投影用，6 阶）
    pub fn krueger_alpha(&self) -> [f64; 6] {
        let n = self.n();
        let n2 = n * n;
        let n3 = n2 * n;
        let n4 = n3 * n;
        let n5 = n4 * n;
        let n6 = n5 * n;

        [
            n / 2.0 - (2.0 / 3.0) * n2 + (5.0 / 16.0) * n3 + (41.0 / 180.0) * n4
                - (127.0 / 288.0) * n5
                + (7891.0 / 37800.0) * n6,
            (13.0 / 48.0) * n2 - (3.0 / 5.0) * n3 + (557.0 / 1440.0) * n4 + (281.0 / 630.0) * n5
                - (1983433.0 / 1935360.0) * n6,
            (61.0 / 240.0) * n3 - (103.0 / 140.0) * n4
                + (15061.0 / 26880.0) * n5
                + (167603.0 / 181440.0) * n6,
            (49561.0 / 161280.0) * n4 - (179.0 / 168.0) * n5 + (6601661.0 / 7257600.0) * n6,
            (34729.0 / 80640.0) * n5 - (3418889.0 / 1995840.0) * n6,
            (212378941.0 / 319334400.0) * n6,
        ]
    }

    /// Krüger β 系数（逆向投影用，6 阶）
    pub fn krueger_beta(&self) -> [f64; 6] {
        let n = self.n();
        let n2 = n * n;
        let n3 = n2 * n;
        let n4 = n3 * n;
        let n5 = n4 * n;
        let n6 = n5 * n;

        [
            n / 2.0 - (2.0 / 3.0) * n2 + (37.0 / 96.0) * n3 - (1.0 / 360.0) * n4
                - (81.0 / 512.0) * n5
                + (96199.0 / 604800.0) * n6,
            (1.0 / 48.0) * n2 + (1.0 / 15.0) * n3 - (437.0 / 1440.0) * n4 + (46.0 / 105.0) * n5
                - (1118711.0 / 3870720.0) * n6,
            (17.0 / 480.0) * n3 - (37.0 / 840.0) * n4 - (209.0 / 4480.0) * n5
                + (5569.0 / 90720.0) * n6,
            (4397.0 / 161280.0) * n4 - (11.0 / 504.0) * n5 - (830251.0 / 7257600.0) * n6,
            (4583.0 / 161280.0) * n5 - (108847.0 / 3991680.0) * n6,
            (20648693.0 / 638668800.0) * n6,
        ]
    }

    /// 缩放常数 A（米）
    ///
    /// A = a/(1+n) * (1 + n²/4 + n⁴/64 + n⁶/256 + ...)
    pub fn krueger_a(&self) -> f64 {
        let n = self.n();
        let n2 = n * n;
        let n4 = n2 * n2;
        let n6 = n4 * n2;
        let n8 = n4 * n4;

        (self.semi_major_in_metres() / (1.0 + n))
            * (1.0 + n2 / 4.0 + n4 / 64.0 + n6 / 256.0 + (25.0 / 16384.0) * n8)
    }
}

fn check_axis(name: &str, value: f64) -> ReferencingResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ReferencingError::invalid_definition(format!(
            "椭球体 \"{name}\" 的轴长必须为正有限值: {value}"
        )))
    }
}

impl Comparable for Ellipsoid {
    fn equals(&self, other: &Self, mode: ComparisonMode) -> bool {
        let geometry = match mode {
            ComparisonMode::Strict => {
                self.semi_major == other.semi_major
                    && self.semi_minor == other.semi_minor
                    && self.ivf_definitive == other.ivf_definitive
                    && arc_equals(&self.unit, &other.unit, mode)
            }
            ComparisonMode::IgnoreMetadata => {
                relative_eq(self.semi_major_in_metres(), other.semi_major_in_metres(), 1e-12)
                    && relative_eq(self.semi_minor_in_metres(), other.semi_minor_in_metres(), 1e-12)
            }
        };
        geometry && self.object.equals(&other.object, mode)
    }
}

impl PartialEq for Ellipsoid {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other, ComparisonMode::Strict)
    }
}

impl fmt::Display for Ellipsoid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}(a={}, 1/f={:.9})",
            self.object.name, self.semi_major, self.inverse_flattening
        )
    }
}

impl Describe for Ellipsoid {
    const KIND: &'static str = "椭球体";
    const PROPERTIES: &'static [PropertyDescriptor<Self>] = &[
        PropertyDescriptor { name: "名称", get: |e| Some(e.object.name.clone()) },
        PropertyDescriptor { name: "标识符", get: |e| metadata::identifiers(&e.object) },
        PropertyDescriptor { name: "别名", get: |e| metadata::aliases(&e.object) },
        PropertyDescriptor { name: "长半轴", get: |e| metadata::number(e.semi_major) },
        PropertyDescriptor { name: "短半轴", get: |e| metadata::number(e.semi_minor) },
        PropertyDescriptor { name: "反扁率", get: |e| metadata::number(e.inverse_flattening) },
        PropertyDescriptor { name: "单位", get: |e| Some(e.unit.name().to_string()) },
        PropertyDescriptor { name: "备注", get: |e| e.object.remarks.clone() },
    ];
}

// ============================================================================
// 测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wgs84_parameters() {
        let e = Ellipsoid::wgs84();
        assert!((e.semi_major_axis() - 6_378_137.0).abs() < 1e-6);
        assert!((e.semi_minor_axis() - 6_356_752.314_245).abs() < 0.001);
        assert!((e.e2() - 0.006_694_379_990_14).abs() < 1e-12);
        assert!(e.is_ivf_definitive());
    }

    /// 测试由短半轴定义的椭球体（Clarke 1866）
    #[test]
    fn test_from_semi_axes() {
        let e = Ellipsoid::from_semi_axes(
            IdentifiedObject::named("Clarke 1866"),
            6_378_206.4,
            6_356_583.8,
            Arc::new(Unit::metre()),
        )
        .unwrap();
        assert!((e.inverse_flattening() - 294.978_698_2).abs() < 1e-6);
        assert!(!e.is_ivf_definitive());
    }

    /// 测试非米制轴长的显式换算
    #[test]
    fn test_semi_major_in_metres() {
        let foot = Arc::new(Unit::foot());
        let e = Ellipsoid::from_flattening(IdentifiedObject::named("ft"), 1000.0, 300.0, foot)
            .unwrap();
        assert_eq!(e.semi_major_axis(), 1000.0);
        assert!((e.semi_major_in_metres() - 304.8).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_axis() {
        let metre = Arc::new(Unit::metre());
        assert!(Ellipsoid::from_flattening(IdentifiedObject::named("x"), -1.0, 300.0, metre.clone())
            .is_err());
        assert!(Ellipsoid::from_flattening(IdentifiedObject::named("x"), 1.0, 0.0, metre).is_err());
    }

    #[test]
    fn test_curvature_radius() {
        let e = Ellipsoid::wgs84();
        let n_equator = e.prime_vertical_radius(0.0);
        assert!(n_equator > e.meridional_radius(0.0));
        assert!((n_equator - 6_378_137.0).abs() < 1e-6);
    }

    #[test]
    fn test_ignore_metadata_comparison() {
        let a = Ellipsoid::wgs84();
        let mut b = Ellipsoid::wgs84();
        b.object = IdentifiedObject::named("WGS84 copy");
        assert!(a.equals(&b, ComparisonMode::IgnoreMetadata));
        assert!(!a.equals(&b, ComparisonMode::Strict));
    }
}
