// crates/gr_referencing/src/transform/geocentric.rs

//! 地理坐标 ⇄ 地心坐标
//!
//! 地理坐标为（经度, 纬度[, 椭球高]），经纬度以度表示、相对格林尼治，
//! 高程与地心坐标以米表示。
//!
//! 正算：
//! - N = a / √(1 - e²sin²φ)
//! - X = (N + h)cosφcosλ
//! - Y = (N + h)cosφsinλ
//! - Z = ((1 - e²)N + h)sinφ

use std::sync::Arc;

use gr_foundation::float::{DEFAULT_CONVERGENCE_TOL, DEFAULT_MAX_ITERATIONS};

use super::{check_point, MathTransform, SharedTransform};
use crate::ellipsoid::Ellipsoid;
use crate::error::{ReferencingError, ReferencingResult};

/// 地理 ⇄ 地心变换
#[derive(Debug, Clone, PartialEq)]
pub struct GeocentricTransform {
    /// 长半轴（米）
    a: f64,
    /// 第一偏心率平方
    e2: f64,
    /// 地理坐标是否带椭球高
    has_height: bool,
    /// 是否为地心 → 地理方向
    inverse: bool,
}

impl GeocentricTransform {
    /// 地理 → 地心
    pub fn new(ellipsoid: &Ellipsoid, has_height: bool) -> Self {
        Self {
            a: ellipsoid.semi_major_in_metres(),
            e2: ellipsoid.e2(),
            has_height,
            inverse: false,
        }
    }

    /// WGS84 椭球体上的地理 → 地心
    pub fn wgs84(has_height: bool) -> Self {
        Self::new(&Ellipsoid::wgs84(), has_height)
    }

    fn geodetic_dimensions(&self) -> usize {
        if self.has_height {
            3
        } else {
            2
        }
    }

    fn to_geocentric(&self, lon: f64, lat: f64, h: f64) -> [f64; 3] {
        let (sin_lat, cos_lat) = lat.to_radians().sin_cos();
        let (sin_lon, cos_lon) = lon.to_radians().sin_cos();
        let n = self.a / (1.0 - self.e2 * sin_lat * sin_lat).sqrt();
        [
            (n + h) * cos_lat * cos_lon,
            (n + h) * cos_lat * sin_lon,
            ((1.0 - self.e2) * n + h) * sin_lat,
        ]
    }

    fn to_geodetic(&self, x: f64, y: f64, z: f64) -> ReferencingResult<[f64; 3]> {
        let p = x.hypot(y);
        let lon = y.atan2(x);
        let mut lat = z.atan2(p * (1.0 - self.e2));
        let mut h = 0.0;
        for _ in 0..DEFAULT_MAX_ITERATIONS {
            let sin_lat = lat.sin();
            let n = self.a / (1.0 - self.e2 * sin_lat * sin_lat).sqrt();
            h = if lat.abs() < std::f64::consts::FRAC_PI_4 {
                p / lat.cos() - n
            } else {
                z / sin_lat - n * (1.0 - self.e2)
            };
            let next = z.atan2(p * (1.0 - self.e2 * n / (n + h)));
            if (next - lat).abs() < DEFAULT_CONVERGENCE_TOL {
                let sin_next = next.sin();
                let n = self.a / (1.0 - self.e2 * sin_next * sin_next).sqrt();
                h = if next.abs() < std::f64::consts::FRAC_PI_4 {
                    p / next.cos() - n
                } else {
                    z / sin_next - n * (1.0 - self.e2)
                };
                return Ok([lon.to_degrees(), next.to_degrees(), h]);
            }
            lat = next;
        }
        if lat.is_finite() && h.is_finite() {
            Ok([lon.to_degrees(), lat.to_degrees(), h])
        } else {
            Err(ReferencingError::transform_failed(
                "地心坐标反算",
                format!("迭代不收敛: ({x}, {y}, {z})"),
            ))
        }
    }
}

impl MathTransform for GeocentricTransform {
    fn source_dimensions(&self) -> usize {
        if self.inverse {
            3
        } else {
            self.geodetic_dimensions()
        }
    }

    fn target_dimensions(&self) -> usize {
        if self.inverse {
            self.geodetic_dimensions()
        } else {
            3
        }
    }

    fn transform(&self, src: &[f64], dst: &mut [f64]) -> ReferencingResult<()> {
        check_point(self, src, dst)?;
        if self.inverse {
            let geodetic = self.to_geodetic(src[0], src[1], src[2])?;
            dst.copy_from_slice(&geodetic[..dst.len()]);
        } else {
            let h = if self.has_height { src[2] } else { 0.0 };
            dst.copy_from_slice(&self.to_geocentric(src[0], src[1], h));
        }
        Ok(())
    }

    fn inverse(&self) -> ReferencingResult<SharedTransform> {
        Ok(Arc::new(Self {
            inverse: !self.inverse,
            ..self.clone()
        }))
    }

    fn name(&self) -> String {
        if self.inverse {
            "Geocentric_To_Ellipsoid".to_string()
        } else {
            "Ellipsoid_To_Geocentric".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equator_prime_meridian() {
        let t = GeocentricTransform::wgs84(true);
        let p = t.apply(&[0.0, 0.0, 0.0]).unwrap();
        assert!((p[0] - 6_378_137.0).abs() < 1e-6);
        assert!(p[1].abs() < 1e-6);
        assert!(p[2].abs() < 1e-6);
    }

    #[test]
    fn test_north_pole() {
        let t = GeocentricTransform::wgs84(true);
        let p = t.apply(&[0.0, 90.0, 0.0]).unwrap();
        assert!((p[2] - 6_356_752.314_245).abs() < 1e-3);

        let back = t.inverse().unwrap().apply(&p).unwrap();
        assert!((back[1] - 90.0).abs() < 1e-9);
        assert!(back[2].abs() < 1e-3);
    }

    /// 测试往返精度
    #[test]
    fn test_round_trip() {
        let t = GeocentricTransform::wgs84(true);
        let inv = t.inverse().unwrap();
        for &(lon, lat, h) in &[(116.0, 40.0, 50.0), (-100.0, -33.5, 1200.0), (179.9, 89.0, -20.0)] {
            let p = t.apply(&[lon, lat, h]).unwrap();
            let q = inv.apply(&p).unwrap();
            assert!((q[0] - lon).abs() < 1e-9);
            assert!((q[1] - lat).abs() < 1e-9);
            assert!((q[2] - h).abs() < 1e-4);
        }
    }

    #[test]
    fn test_two_dimensional_inverse_drops_height() {
        let inv = GeocentricTransform::wgs84(false).inverse().unwrap();
        assert_eq!(inv.source_dimensions(), 3);
        assert_eq!(inv.target_dimensions(), 2);
    }
}
