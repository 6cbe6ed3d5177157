// crates/gr_referencing/src/transform/projection.rs

//! 地图投影
//!
//! 输入为（经度, 纬度）度、相对格林尼治；输出为（东, 北）米。
//! 支持的方法通过静态注册表按 EPSG 方法代码或名称查找：
//!
//! | 代码 | 方法 |
//! |------|------|
//! | 9807 | Transverse Mercator（Krüger 6 阶级数） |
//! | 9804 | Mercator (variant A) |
//! | 1024 | Popular Visualisation Pseudo Mercator |

use std::f64::consts::{FRAC_PI_2, PI};
use std::sync::Arc;

use gr_foundation::float::{DEFAULT_CONVERGENCE_TOL, DEFAULT_MAX_ITERATIONS};

use super::{check_point, MathTransform, SharedTransform};
use crate::ellipsoid::Ellipsoid;
use crate::error::{ReferencingError, ReferencingResult};
use crate::parameter::{
    ParameterValueGroup, FALSE_EASTING, FALSE_NORTHING, LATITUDE_OF_ORIGIN, LONGITUDE_OF_ORIGIN,
    SCALE_FACTOR,
};
use crate::prime_meridian::PrimeMeridian;
use crate::unit::Unit;

// ============================================================================
// 方法注册表
// ============================================================================

/// 投影方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectionMethod {
    /// 横轴墨卡托
    TransverseMercator,
    /// 墨卡托（A 型，切于赤道）
    MercatorVariantA,
    /// Web 墨卡托（椭球坐标按球面公式投影）
    PseudoMercator,
}

/// 注册表条目
#[derive(Debug)]
pub struct MethodEntry {
    /// EPSG 方法代码
    pub code: u32,
    /// EPSG 方法名称
    pub name: &'static str,
    /// 其他常见名称
    pub aliases: &'static [&'static str],
    /// 方法
    pub method: ProjectionMethod,
}

static REGISTRY: [MethodEntry; 3] = [
    MethodEntry {
        code: 9807,
        name: "Transverse Mercator",
        aliases: &["Transverse_Mercator", "Gauss-Kruger"],
        method: ProjectionMethod::TransverseMercator,
    },
    MethodEntry {
        code: 9804,
        name: "Mercator (variant A)",
        aliases: &["Mercator_1SP", "Mercator (1SP)"],
        method: ProjectionMethod::MercatorVariantA,
    },
    MethodEntry {
        code: 1024,
        name: "Popular Visualisation Pseudo Mercator",
        aliases: &["Popular_Visualisation_Pseudo_Mercator", "Web Mercator"],
        method: ProjectionMethod::PseudoMercator,
    },
];

impl ProjectionMethod {
    /// 全部已注册方法
    pub fn registry() -> &'static [MethodEntry] {
        &REGISTRY
    }

    /// 按 EPSG 方法代码查找
    pub fn from_code(code: u32) -> Option<Self> {
        REGISTRY.iter().find(|e| e.code == code).map(|e| e.method)
    }

    /// 按名称或别名查找（忽略大小写）
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        REGISTRY
            .iter()
            .find(|e| {
                e.name.eq_ignore_ascii_case(name)
                    || e.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
            })
            .map(|e| e.method)
    }

    /// 注册表条目
    pub fn entry(self) -> &'static MethodEntry {
        match self {
            Self::TransverseMercator => &REGISTRY[0],
            Self::MercatorVariantA => &REGISTRY[1],
            Self::PseudoMercator => &REGISTRY[2],
        }
    }
}

// ============================================================================
// 投影参数
// ============================================================================

/// 投影参数（角度为度、长度为米）
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionParameters {
    /// 方法
    pub method: ProjectionMethod,
    /// 长半轴
    pub semi_major: f64,
    /// 第一偏心率平方
    pub e2: f64,
    /// 中央经线（相对格林尼治）
    pub central_meridian: f64,
    /// 原点纬度
    pub latitude_of_origin: f64,
    /// 比例因子
    pub scale_factor: f64,
    /// 假东
    pub false_easting: f64,
    /// 假北
    pub false_northing: f64,
}

impl ProjectionParameters {
    /// 从 EPSG 参数组构造
    ///
    /// 参数中的经度相对于基准面的本初子午线，这里换算为相对格林尼治。
    pub fn from_group(
        method: ProjectionMethod,
        group: &ParameterValueGroup,
        ellipsoid: &Ellipsoid,
        prime_meridian: &PrimeMeridian,
    ) -> ReferencingResult<Self> {
        let degree = Unit::degree();
        let metre = Unit::metre();
        let unity = Unit::unity();
        let scale_factor = match method {
            ProjectionMethod::PseudoMercator => group.optional(SCALE_FACTOR, &unity, 1.0)?,
            _ => group.require(SCALE_FACTOR, &unity)?,
        };
        Ok(Self {
            method,
            semi_major: ellipsoid.semi_major_in_metres(),
            e2: ellipsoid.e2(),
            central_meridian: group.optional(LONGITUDE_OF_ORIGIN, &degree, 0.0)?
                + prime_meridian.greenwich_longitude_degrees(),
            latitude_of_origin: group.optional(LATITUDE_OF_ORIGIN, &degree, 0.0)?,
            scale_factor,
            false_easting: group.optional(FALSE_EASTING, &metre, 0.0)?,
            false_northing: group.optional(FALSE_NORTHING, &metre, 0.0)?,
        })
    }
}

// ============================================================================
// 投影变换
// ============================================================================

/// 预计算的 Krüger 系数
#[derive(Debug, Clone, PartialEq)]
struct KruegerSeries {
    alpha: [f64; 6],
    beta: [f64; 6],
    /// 缩放常数 A
    a: f64,
    /// 原点纬度处的 A·ξ
    m0: f64,
}

/// 投影变换
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionTransform {
    params: ProjectionParameters,
    e: f64,
    series: Option<KruegerSeries>,
    inverse: bool,
}

impl ProjectionTransform {
    /// 创建正向投影
    pub fn new(params: ProjectionParameters, ellipsoid: &Ellipsoid) -> ReferencingResult<Self> {
        if !(params.scale_factor > 0.0) {
            return Err(ReferencingError::invalid_definition(format!(
                "比例因子必须为正: {}",
                params.scale_factor
            )));
        }
        if params.method == ProjectionMethod::MercatorVariantA && params.latitude_of_origin != 0.0 {
            return Err(ReferencingError::invalid_definition(
                "Mercator (variant A) 的原点纬度必须为 0",
            ));
        }
        let e = params.e2.sqrt();
        let series = (params.method == ProjectionMethod::TransverseMercator).then(|| {
            let alpha = ellipsoid.krueger_alpha();
            let a = ellipsoid.krueger_a();
            let beta0 = conformal_latitude(params.latitude_of_origin.to_radians(), e);
            let xi0 = beta0
                + alpha
                    .iter()
                    .enumerate()
                    .map(|(j, aj)| aj * (2.0 * (j + 1) as f64 * beta0).sin())
                    .sum::<f64>();
            KruegerSeries {
                alpha,
                beta: ellipsoid.krueger_beta(),
                a,
                m0: a * xi0,
            }
        });
        Ok(Self {
            params,
            e,
            series,
            inverse: false,
        })
    }

    /// 投影参数
    pub fn parameters(&self) -> &ProjectionParameters {
        &self.params
    }

    fn forward(&self, lon: f64, lat: f64) -> ReferencingResult<(f64, f64)> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(ReferencingError::transform_failed(
                "正向投影",
                format!("纬度 {lat} 超出范围 [-90, 90]"),
            ));
        }
        let p = &self.params;
        let phi = lat.to_radians();
        let dlam = normalize_longitude((lon - p.central_meridian).to_radians());

        let (x, y) = match (p.method, &self.series) {
            (ProjectionMethod::TransverseMercator, Some(s)) => {
                let taup = isometric_latitude(phi, self.e).sinh();
                let xip = taup.atan2(dlam.cos());
                let etap = (dlam.sin() / taup.hypot(dlam.cos())).asinh();
                let mut xi = xip;
                let mut eta = etap;
                for (j, aj) in s.alpha.iter().enumerate() {
                    let k = 2.0 * (j + 1) as f64;
                    xi += aj * (k * xip).sin() * (k * etap).cosh();
                    eta += aj * (k * xip).cos() * (k * etap).sinh();
                }
                (
                    p.scale_factor * s.a * eta,
                    p.scale_factor * (s.a * xi - s.m0),
                )
            }
            (ProjectionMethod::MercatorVariantA, _) => {
                if lat.abs() == 90.0 {
                    return Err(pole_error(lat));
                }
                (
                    p.semi_major * p.scale_factor * dlam,
                    p.semi_major * p.scale_factor * isometric_latitude(phi, self.e),
                )
            }
            (ProjectionMethod::PseudoMercator, _) => {
                if lat.abs() == 90.0 {
                    return Err(pole_error(lat));
                }
                (
                    p.semi_major * p.scale_factor * dlam,
                    p.semi_major * p.scale_factor * phi.tan().asinh(),
                )
            }
            (ProjectionMethod::TransverseMercator, None) => {
                return Err(ReferencingError::transform_failed("正向投影", "缺少 Krüger 系数"))
            }
        };
        Ok((x + p.false_easting, y + p.false_northing))
    }

    fn backward(&self, easting: f64, northing: f64) -> ReferencingResult<(f64, f64)> {
        let p = &self.params;
        let x = easting - p.false_easting;
        let y = northing - p.false_northing;

        let (dlam, phi) = match (p.method, &self.series) {
            (ProjectionMethod::TransverseMercator, Some(s)) => {
                let xi = (y / p.scale_factor + s.m0) / s.a;
                let eta = x / (p.scale_factor * s.a);
                let mut xip = xi;
                let mut etap = eta;
                for (j, bj) in s.beta.iter().enumerate() {
                    let k = 2.0 * (j + 1) as f64;
                    xip -= bj * (k * xi).sin() * (k * eta).cosh();
                    etap -= bj * (k * xi).cos() * (k * eta).sinh();
                }
                let taup = xip.sin() / etap.sinh().hypot(xip.cos());
                let dlam = etap.sinh().atan2(xip.cos());
                (dlam, latitude_from_isometric(taup.asinh(), self.e)?)
            }
            (ProjectionMethod::MercatorVariantA, _) => {
                let r = p.semi_major * p.scale_factor;
                (x / r, latitude_from_isometric(y / r, self.e)?)
            }
            (ProjectionMethod::PseudoMercator, _) => {
                let r = p.semi_major * p.scale_factor;
                (x / r, (y / r).sinh().atan())
            }
            (ProjectionMethod::TransverseMercator, None) => {
                return Err(ReferencingError::transform_failed("逆向投影", "缺少 Krüger 系数"))
            }
        };
        let lon = p.central_meridian + dlam.to_degrees();
        Ok((lon, phi.to_degrees()))
    }
}

impl MathTransform for ProjectionTransform {
    fn source_dimensions(&self) -> usize {
        2
    }

    fn target_dimensions(&self) -> usize {
        2
    }

    fn transform(&self, src: &[f64], dst: &mut [f64]) -> ReferencingResult<()> {
        check_point(self, src, dst)?;
        let (a, b) = if self.inverse {
            self.backward(src[0], src[1])?
        } else {
            self.forward(src[0], src[1])?
        };
        dst[0] = a;
        dst[1] = b;
        Ok(())
    }

    fn inverse(&self) -> ReferencingResult<SharedTransform> {
        Ok(Arc::new(Self {
            inverse: !self.inverse,
            ..self.clone()
        }))
    }

    fn name(&self) -> String {
        let name = self.params.method.entry().name;
        if self.inverse {
            format!("Inverse {name}")
        } else {
            name.to_string()
        }
    }
}

// ============================================================================
// 辅助函数
// ============================================================================

fn pole_error(lat: f64) -> ReferencingError {
    ReferencingError::transform_failed("正向投影", format!("墨卡托投影在极点无定义: 纬度 {lat}"))
}

/// 经度差归一化到 [-π, π]
fn normalize_longitude(mut dlam: f64) -> f64 {
    while dlam > PI {
        dlam -= 2.0 * PI;
    }
    while dlam < -PI {
        dlam += 2.0 * PI;
    }
    dlam
}

/// 等量纬度 ψ = asinh(tanφ) − e·atanh(e·sinφ)
fn isometric_latitude(phi: f64, e: f64) -> f64 {
    phi.tan().asinh() - e * (e * phi.sin()).atanh()
}

/// 正形纬度 χ = atan(sinh ψ)
fn conformal_latitude(phi: f64, e: f64) -> f64 {
    isometric_latitude(phi, e).sinh().atan()
}

/// 由等量纬度迭代求大地纬度
fn latitude_from_isometric(psi: f64, e: f64) -> ReferencingResult<f64> {
    let mut q = psi;
    for _ in 0..DEFAULT_MAX_ITERATIONS {
        let next = psi + e * (e * q.tanh()).atanh();
        if (next - q).abs() < DEFAULT_CONVERGENCE_TOL {
            return Ok(next.sinh().atan());
        }
        q = next;
    }
    let phi = q.sinh().atan();
    if phi.is_finite() && phi.abs() <= FRAC_PI_2 {
        Ok(phi)
    } else {
        Err(ReferencingError::transform_failed("逆向投影", format!("纬度迭代不收敛: ψ = {psi}")))
    }
}
