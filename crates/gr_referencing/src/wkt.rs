// crates/gr_referencing/src/wkt.rs

//! WKT（第 1 版风格）格式化
//!
//! 先构造 [`WktElement`] 树再输出，单行与缩进两种格式共用一棵树。

use std::fmt::{self, Write as _};

use crate::crs::{CoordinateReferenceSystem, CrsKind};
use crate::cs::{CoordinateSystem, CoordinateSystemAxis};
use crate::datum::{Datum, DatumKind};
use crate::ellipsoid::Ellipsoid;
use crate::identified::IdentifiedObject;
use crate::operation::{CoordinateOperation, OperationKind};
use crate::parameter::{
    ParameterValue, FALSE_EASTING, FALSE_NORTHING, LATITUDE_OF_ORIGIN, LONGITUDE_OF_ORIGIN, SCALE_FACTOR,
};
use crate::prime_meridian::PrimeMeridian;
use crate::transform::ProjectionMethod;
use crate::unit::{Unit, UnitKind};

// ============================================================================
// 元素树
// ============================================================================

/// WKT 值
#[derive(Debug, Clone, PartialEq)]
pub enum WktValue {
    /// 带引号的文本
    Text(String),
    /// 数值
    Number(f64),
    /// 不带引号的枚举字
    Keyword(&'static str),
    /// 子元素
    Element(WktElement),
}

/// WKT 元素：`KEYWORD[value, ...]`
#[derive(Debug, Clone, PartialEq)]
pub struct WktElement {
    /// 关键字
    pub keyword: &'static str,
    /// 值
    pub values: Vec<WktValue>,
}

impl WktElement {
    /// 以名称开头的元素
    pub fn named(keyword: &'static str, name: &str) -> Self {
        Self {
            keyword,
            values: vec![WktValue::Text(name.to_string())],
        }
    }

    /// 追加数值
    #[must_use]
    pub fn number(mut self, value: f64) -> Self {
        self.values.push(WktValue::Number(value));
        self
    }

    /// 追加枚举字
    #[must_use]
    pub fn keyword(mut self, value: &'static str) -> Self {
        self.values.push(WktValue::Keyword(value));
        self
    }

    /// 追加子元素
    #[must_use]
    pub fn child(mut self, element: WktElement) -> Self {
        self.values.push(WktValue::Element(element));
        self
    }

    /// 追加可选子元素
    #[must_use]
    pub fn child_opt(self, element: Option<WktElement>) -> Self {
        match element {
            Some(e) => self.child(e),
            None => self,
        }
    }

    /// 缩进格式
    pub fn to_pretty(&self, indent: usize) -> String {
        let mut out = String::new();
        self.write_pretty(&mut out, indent, 0);
        out
    }

    fn write_pretty(&self, out: &mut String, indent: usize, level: usize) {
        out.push_str(self.keyword);
        out.push('[');
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            match value {
                WktValue::Element(e) => {
                    out.push('\n');
                    out.push_str(&" ".repeat(indent * (level + 1)));
                    e.write_pretty(out, indent, level + 1);
                }
                other => {
                    if i > 0 {
                        out.push(' ');
                    }
                    // 写入 String 不会失败
                    let _ = write_value(out, other);
                }
            }
        }
        out.push(']');
    }
}

fn write_value(out: &mut impl fmt::Write, value: &WktValue) -> fmt::Result {
    match value {
        WktValue::Text(t) => write!(out, "\"{}\"", t.replace('"', "\"\"")),
        WktValue::Number(n) => write!(out, "{}", format_number(*n)),
        WktValue::Keyword(k) => out.write_str(k),
        WktValue::Element(e) => write!(out, "{e}"),
    }
}

/// 整数值保留一位小数，其余使用最短表示
fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

impl fmt::Display for WktElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword)?;
        f.write_char('[')?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write_value(f, value)?;
        }
        f.write_char(']')
    }
}

// ============================================================================
// ToWkt
// ============================================================================

/// 可以格式化为 WKT 的对象
pub trait ToWkt {
    /// 元素树
    fn wkt_element(&self) -> WktElement;

    /// 单行 WKT
    fn to_wkt(&self) -> String {
        self.wkt_element().to_string()
    }

    /// 缩进 WKT
    fn to_pretty_wkt(&self) -> String {
        self.wkt_element().to_pretty(2)
    }
}

fn authority(object: &IdentifiedObject) -> Option<WktElement> {
    object.primary_identifier().map(|id| WktElement {
        keyword: "AUTHORITY",
        values: vec![WktValue::Text(id.authority.clone()), WktValue::Text(id.code.clone())],
    })
}

impl ToWkt for Unit {
    fn wkt_element(&self) -> WktElement {
        WktElement::named("UNIT", self.name())
            .number(self.to_si)
            .child_opt(authority(&self.object))
    }
}

impl ToWkt for Ellipsoid {
    fn wkt_element(&self) -> WktElement {
        let ivf = if self.is_sphere() { 0.0 } else { self.inverse_flattening() };
        WktElement::named("SPHEROID", &self.object.name)
            .number(self.semi_major_in_metres())
            .number(ivf)
            .child_opt(authority(&self.object))
    }
}

impl ToWkt for PrimeMeridian {
    fn wkt_element(&self) -> WktElement {
        WktElement::named("PRIMEM", &self.object.name)
            .number(self.greenwich_longitude_degrees())
            .child_opt(authority(&self.object))
    }
}

impl ToWkt for Datum {
    fn wkt_element(&self) -> WktElement {
        match &self.kind {
            DatumKind::Geodetic { ellipsoid, to_wgs84, .. } => {
                let mut element = WktElement::named("DATUM", &self.object.name).child(ellipsoid.wkt_element());
                if let Some(bw) = to_wgs84.first() {
                    element = element.child(WktElement {
                        keyword: "TOWGS84",
                        values: [bw.dx, bw.dy, bw.dz, bw.ex, bw.ey, bw.ez, bw.ppm]
                            .into_iter()
                            .map(WktValue::Number)
                            .collect(),
                    });
                }
                element.child_opt(authority(&self.object))
            }
            DatumKind::Vertical => WktElement::named("VERT_DATUM", &self.object.name)
                .number(2005.0)
                .child_opt(authority(&self.object)),
            DatumKind::Engineering => {
                WktElement::named("LOCAL_DATUM", &self.object.name)
                    .number(0.0)
                    .child_opt(authority(&self.object))
            }
        }
    }
}

impl ToWkt for CoordinateSystemAxis {
    fn wkt_element(&self) -> WktElement {
        WktElement::named("AXIS", &self.name).keyword(self.direction.wkt_name())
    }
}

fn with_axes(mut element: WktElement, cs: &CoordinateSystem) -> WktElement {
    for axis in &cs.axes {
        element = element.child(axis.wkt_element());
    }
    element
}

fn first_unit(cs: &CoordinateSystem, kind: UnitKind) -> Option<WktElement> {
    cs.axis_unit(kind).map(|u| u.wkt_element())
}

/// WKT 1 中的投影名
fn projection_name(method: ProjectionMethod) -> &'static str {
    match method {
        ProjectionMethod::TransverseMercator => "Transverse_Mercator",
        ProjectionMethod::MercatorVariantA => "Mercator_1SP",
        ProjectionMethod::PseudoMercator => "Popular_Visualisation_Pseudo_Mercator",
    }
}

/// WKT 1 中的参数名与取值（角度为度，长度为米）
fn parameter_element(value: &ParameterValue) -> WktElement {
    let name = match value.code {
        Some(LATITUDE_OF_ORIGIN) => "latitude_of_origin",
        Some(LONGITUDE_OF_ORIGIN) => "central_meridian",
        Some(SCALE_FACTOR) => "scale_factor",
        Some(FALSE_EASTING) => "false_easting",
        Some(FALSE_NORTHING) => "false_northing",
        _ => value.name.as_str(),
    };
    let number = match value.unit.as_ref().map(|u| u.kind) {
        Some(UnitKind::Angular) => value.value_in(&Unit::degree()).unwrap_or(value.value),
        Some(UnitKind::Linear) => value.value_in(&Unit::metre()).unwrap_or(value.value),
        _ => value.value,
    };
    WktElement::named("PARAMETER", name).number(number)
}

fn projection_element(conversion: &CoordinateOperation) -> Option<WktElement> {
    let method = conversion.method()?;
    let name = method
        .epsg_code()
        .and_then(ProjectionMethod::from_code)
        .map_or(method.object.name.as_str(), |m| projection_name(m));
    Some(WktElement::named("PROJECTION", name).child_opt(authority(&method.object)))
}

impl ToWkt for CoordinateReferenceSystem {
    fn wkt_element(&self) -> WktElement {
        let element = match &self.kind {
            CrsKind::Geographic { datum, cs } => {
                let pm = datum.prime_meridian().map(|p| p.wkt_element());
                with_axes(
                    WktElement::named("GEOGCS", &self.object.name)
                        .child(datum.wkt_element())
                        .child_opt(pm)
                        .child_opt(first_unit(cs, UnitKind::Angular)),
                    cs,
                )
            }
            CrsKind::Geocentric { datum, cs } => {
                let pm = datum.prime_meridian().map(|p| p.wkt_element());
                with_axes(
                    WktElement::named("GEOCCS", &self.object.name)
                        .child(datum.wkt_element())
                        .child_opt(pm)
                        .child_opt(first_unit(cs, UnitKind::Linear)),
                    cs,
                )
            }
            CrsKind::Projected { base, conversion, cs } => {
                let mut element = WktElement::named("PROJCS", &self.object.name)
                    .child(base.wkt_element())
                    .child_opt(projection_element(conversion));
                if let Some(parameters) = conversion.parameters() {
                    for value in &parameters.values {
                        element = element.child(parameter_element(value));
                    }
                }
                with_axes(element.child_opt(first_unit(cs, UnitKind::Linear)), cs)
            }
            CrsKind::Vertical { datum, cs } => with_axes(
                WktElement::named("VERT_CS", &self.object.name)
                    .child(datum.wkt_element())
                    .child_opt(first_unit(cs, UnitKind::Linear)),
                cs,
            ),
            CrsKind::Engineering { datum, cs } => with_axes(
                WktElement::named("LOCAL_CS", &self.object.name)
                    .child(datum.wkt_element())
                    .child_opt(first_unit(cs, UnitKind::Linear)),
                cs,
            ),
            CrsKind::Compound { components } => {
                let mut element = WktElement::named("COMPD_CS", &self.object.name);
                for c in components {
                    element = element.child(c.wkt_element());
                }
                element
            }
        };
        element.child_opt(authority(&self.object))
    }
}

impl ToWkt for CoordinateSystem {
    fn wkt_element(&self) -> WktElement {
        let mut element = with_axes(WktElement::named("CS", &self.object.name), self);
        if let Some(unit) = self.axes.first().map(|a| a.unit.wkt_element()) {
            element = element.child(unit);
        }
        element.child_opt(authority(&self.object))
    }
}

/// 坐标操作没有标准的 WKT 1 形式，按 WKT 2 的结构输出
impl ToWkt for CoordinateOperation {
    fn wkt_element(&self) -> WktElement {
        let keyword = match self.kind {
            OperationKind::Conversion { .. } => "CONVERSION",
            OperationKind::Concatenated { .. } => "CONCATENATEDOPERATION",
            _ => "COORDINATEOPERATION",
        };
        let mut element = WktElement::named(keyword, &self.object.name);
        if let Some(source) = self.source_crs() {
            element = element.child(WktElement {
                keyword: "SOURCECRS",
                values: vec![WktValue::Element(source.wkt_element())],
            });
        }
        if let Some(target) = self.target_crs() {
            element = element.child(WktElement {
                keyword: "TARGETCRS",
                values: vec![WktValue::Element(target.wkt_element())],
            });
        }
        if let Some(method) = self.method() {
            element = element
                .child(WktElement::named("METHOD", &method.object.name).child_opt(authority(&method.object)));
        }
        if let Some(parameters) = self.parameters() {
            for value in &parameters.values {
                element = element.child(parameter_element(value));
            }
        }
        for step in self.steps() {
            element = element.child(WktElement {
                keyword: "STEP",
                values: vec![WktValue::Element(step.wkt_element())],
            });
        }
        element.child_opt(authority(&self.object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_wkt() {
        assert_eq!(Unit::metre().to_wkt(), r#"UNIT["metre", 1.0, AUTHORITY["EPSG", "9001"]]"#);
    }

    /// 测试地理 CRS 的 WKT 结构
    #[test]
    fn test_geographic_wkt() {
        let wkt = CoordinateReferenceSystem::wgs84_lon_lat().to_wkt();
        assert!(wkt.starts_with(r#"GEOGCS["WGS84(DD)", DATUM["World Geodetic System 1984", SPHEROID["#));
        assert!(wkt.contains("6378137.0, 298.257223563"));
        assert!(wkt.contains(r#"PRIMEM["Greenwich", 0.0"#));
        assert!(wkt.contains("AXIS[\"Geodetic longitude\", EAST]"));
    }

    /// 测试投影 CRS 按方法代码输出 WKT 投影名
    #[test]
    fn test_projected_wkt_uses_projection_name() {
        let epsg = crate::authority::EpsgFactory::in_memory().unwrap();
        let wkt = epsg.create_coordinate_reference_system("32650").unwrap().to_wkt();
        assert!(wkt.contains(r#"PROJECTION["Transverse_Mercator", AUTHORITY["EPSG", "9807"]]"#));
        let mercator = epsg.create_coordinate_reference_system("3857").unwrap().to_wkt();
        assert!(mercator.contains(r#"PROJECTION["Popular_Visualisation_Pseudo_Mercator""#));
    }

    #[test]
    fn test_pretty_wkt_indents_children() {
        let pretty = Ellipsoid::wgs84().to_pretty_wkt();
        assert!(pretty.starts_with("SPHEROID[\"WGS 84\", 6378137.0, 298.257223563,\n  AUTHORITY["));
    }

    #[test]
    fn test_quotes_escaped() {
        let element = WktElement::named("X", "a\"b");
        assert_eq!(element.to_string(), r#"X["a""b"]"#);
    }
}
