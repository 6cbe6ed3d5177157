// crates/gr_referencing/src/operation/standalone.rs

//! 独立坐标操作工厂
//!
//! 不查询任何权威库，仅根据 CRS 结构推导操作：
//!
//! - 结构相同：恒等
//! - 地理/地心之间：坐标系归一化 + 可选的地心 Bursa-Wolf 基准面转换
//! - 投影：经基础地理 CRS 中转，投影步骤取自定义转换
//! - 同一基准面上的垂直/工程 CRS：轴交换与单位换算
//! - 复合：按类别严格配对分量，每对生成一个透传步骤
//!
//! 所有内部构造错误统一报告为 `OperationNotFound`。

use std::sync::Arc;

use gr_config::EngineConfig;
use nalgebra::DMatrix;
use tracing::debug;

use super::{CoordinateOperation, CoordinateOperationFactory, OperationBuilder, OperationKind, PositionalAccuracy};
use crate::crs::{CoordinateReferenceSystem, CrsKind};
use crate::cs::{swap_and_scale, CoordinateSystem};
use crate::datum::{BursaWolfParameters, Datum};
use crate::error::{ReferencingError, ReferencingResult};
use crate::identified::{arc_equals, Comparable, ComparisonMode, IdentifiedObject};
use crate::parameter::{
    OperationMethod, ParameterValue, ParameterValueGroup, SCALE_DIFFERENCE, X_ROTATION, X_TRANSLATION,
    Y_ROTATION, Y_TRANSLATION, Z_ROTATION, Z_TRANSLATION,
};
use crate::transform::{
    ConcatenatedTransform, GeocentricTransform, LinearTransform, MathTransform, ProjectionMethod,
    ProjectionParameters, ProjectionTransform, SharedTransform,
};
use crate::unit::Unit;

type SharedCrs = Arc<CoordinateReferenceSystem>;

/// 独立坐标操作工厂
#[derive(Debug, Clone, Default)]
pub struct StandaloneOperationFactory {
    lenient_datum_shift: bool,
}

/// 基准面转换的推导结果
#[derive(Debug)]
enum DatumShift {
    /// 两个基准面在数值上一致
    None,
    /// 地心坐标下的 4×4 矩阵及使用的参数
    Applied(DMatrix<f64>, Vec<(String, BursaWolfParameters)>),
    /// 宽松模式下省略
    Omitted,
}

/// 地理或地心端点
struct GeodeticEnd<'a> {
    datum: &'a Arc<Datum>,
    /// 坐标系到标准形式的仿射变换
    normalize: LinearTransform,
    geocentric: bool,
    three_d: bool,
}

impl StandaloneOperationFactory {
    /// 严格模式：缺少 Bursa-Wolf 参数时报错
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定缺少 Bursa-Wolf 参数时是否省略基准面转换
    pub fn with_lenient_datum_shift(lenient: bool) -> Self {
        Self { lenient_datum_shift: lenient }
    }

    /// 从引擎配置创建
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::with_lenient_datum_shift(config.lenient_datum_shift)
    }

    /// 是否为宽松模式
    pub fn is_lenient(&self) -> bool {
        self.lenient_datum_shift
    }

    // ========================================================================
    // 分派
    // ========================================================================

    fn create_step(&self, source: &SharedCrs, target: &SharedCrs) -> ReferencingResult<Arc<CoordinateOperation>> {
        if arc_equals(source, target, ComparisonMode::IgnoreMetadata) {
            return CoordinateOperation::identity(source.clone(), target.clone()).map(Arc::new);
        }
        if matches!(source.kind, CrsKind::Compound { .. }) || matches!(target.kind, CrsKind::Compound { .. }) {
            return self.compound_step(source, target);
        }
        match (&source.kind, &target.kind) {
            (CrsKind::Projected { base, .. }, _) => {
                let steps = vec![
                    Arc::new(projection_step(source)?.inverse()?),
                    self.create_step(base, target)?,
                ];
                concatenate(source, target, steps)
            }
            (_, CrsKind::Projected { base, .. }) => {
                let steps = vec![self.create_step(source, base)?, Arc::new(projection_step(target)?)];
                concatenate(source, target, steps)
            }
            (
                CrsKind::Geographic { .. } | CrsKind::Geocentric { .. },
                CrsKind::Geographic { .. } | CrsKind::Geocentric { .. },
            ) => self.geodetic_step(source, target),
            (CrsKind::Vertical { datum: d1, cs: c1 }, CrsKind::Vertical { datum: d2, cs: c2 })
            | (CrsKind::Engineering { datum: d1, cs: c1 }, CrsKind::Engineering { datum: d2, cs: c2 }) => {
                if !arc_equals(d1, d2, ComparisonMode::IgnoreMetadata) {
                    return Err(ReferencingError::operation_not_found(
                        source.name(),
                        target.name(),
                        format!("缺少基准面 \"{}\" 与 \"{}\" 之间的转换", d1.name(), d2.name()),
                    ));
                }
                axis_change(source, target, c1, c2)
            }
            _ => Err(ReferencingError::operation_not_found(
                source.name(),
                target.name(),
                format!("不支持从{} CRS 到{} CRS 的操作", source.kind_label(), target.kind_label()),
            )),
        }
    }

    // ========================================================================
    // 地理与地心
    // ========================================================================

    fn geodetic_step(&self, source: &SharedCrs, target: &SharedCrs) -> ReferencingResult<Arc<CoordinateOperation>> {
        let src = geodetic_end(source)?;
        let tgt = geodetic_end(target)?;
        let shift = self.datum_shift(source, target, src.datum, tgt.datum)?;

        let through_geocentric = needs_geocentric(&src, &tgt, matches!(shift, DatumShift::Applied(..)));
        let matrix = match &shift {
            DatumShift::Applied(matrix, _) => Some(matrix),
            _ => None,
        };
        let transform = geodetic_transform(source, target, matrix)?;

        let builder = match shift {
            DatumShift::Applied(_, used) => {
                let mut parameters = ParameterValueGroup::new();
                let prefixed = used.len() > 1;
                for (datum, bw) in &used {
                    push_bursa_wolf(&mut parameters, bw, prefixed.then_some(datum.as_str()));
                }
                OperationBuilder::transformation(
                    IdentifiedObject::named(format!("{} → {}", src.datum.name(), tgt.datum.name())),
                    Arc::new(OperationMethod::new(
                        IdentifiedObject::with_code("Position Vector transformation", "EPSG", "9606"),
                        source.dimension(),
                        target.dimension(),
                    )),
                    parameters,
                )
                .accuracy(PositionalAccuracy::DatumShiftApplied)
            }
            DatumShift::Omitted => OperationBuilder::transformation(
                IdentifiedObject::named(format!("{} → {}（省略基准面转换）", src.datum.name(), tgt.datum.name())),
                Arc::new(OperationMethod::new(
                    IdentifiedObject::named("Ellipsoid change without datum shift"),
                    source.dimension(),
                    target.dimension(),
                )),
                ParameterValueGroup::new(),
            )
            .accuracy(PositionalAccuracy::DatumShiftOmitted),
            DatumShift::None => {
                let method = if through_geocentric {
                    IdentifiedObject::with_code("Geographic/geocentric conversions", "EPSG", "9602")
                } else {
                    IdentifiedObject::named("Axis and unit changes")
                };
                OperationBuilder::conversion(
                    IdentifiedObject::named(format!("{} → {}", source.name(), target.name())),
                    Arc::new(OperationMethod::new(method, source.dimension(), target.dimension())),
                    ParameterValueGroup::new(),
                )
            }
        };
        builder
            .crs(source.clone(), target.clone())
            .transform(transform)
            .build()
            .map(Arc::new)
    }

    /// 推导两个大地基准面之间的地心转换矩阵
    fn datum_shift(
        &self,
        source: &SharedCrs,
        target: &SharedCrs,
        from: &Arc<Datum>,
        to: &Arc<Datum>,
    ) -> ReferencingResult<DatumShift> {
        if same_frame(from, to) || (from.is_wgs84() && to.is_wgs84()) {
            return Ok(DatumShift::None);
        }
        let from_bw = from.to_wgs84().first();
        let to_bw = to.to_wgs84().first();
        let shift = match (from.is_wgs84(), from_bw, to.is_wgs84(), to_bw) {
            (_, Some(a), true, _) => {
                DatumShift::Applied(a.to_matrix(), vec![(from.name().to_string(), a.clone())])
            }
            (true, _, _, Some(b)) => {
                DatumShift::Applied(invert(b.to_matrix())?, vec![(to.name().to_string(), b.inverse())])
            }
            (_, Some(a), _, Some(b)) => DatumShift::Applied(
                invert(b.to_matrix())? * a.to_matrix(),
                vec![(from.name().to_string(), a.clone()), (to.name().to_string(), b.inverse())],
            ),
            _ if self.lenient_datum_shift => {
                debug!(from = from.name(), to = to.name(), "缺少 Bursa-Wolf 参数，省略基准面转换");
                DatumShift::Omitted
            }
            _ => {
                return Err(ReferencingError::operation_not_found(
                    source.name(),
                    target.name(),
                    format!("基准面 \"{}\" 与 \"{}\" 之间缺少 Bursa-Wolf 参数", from.name(), to.name()),
                ))
            }
        };
        Ok(shift)
    }

    // ========================================================================
    // 复合
    // ========================================================================

    fn compound_step(&self, source: &SharedCrs, target: &SharedCrs) -> ReferencingResult<Arc<CoordinateOperation>> {
        let sources = flatten(source);
        let targets = flatten(target);

        // 每个目标分量取第一个尚未使用的同类源分量
        let mut used = vec![false; sources.len()];
        let mut order = Vec::with_capacity(targets.len());
        for t in &targets {
            let i = (0..sources.len())
                .find(|&i| !used[i] && category(&sources[i]) == category(t))
                .ok_or_else(|| {
                    ReferencingError::operation_not_found(
                        source.name(),
                        target.name(),
                        format!("目标分量 \"{}\" 在源中没有对应分量", t.name()),
                    )
                })?;
            used[i] = true;
            order.push(i);
        }
        if let Some(i) = used.iter().position(|u| !u) {
            return Err(ReferencingError::operation_not_found(
                source.name(),
                target.name(),
                format!("源分量 \"{}\" 在目标中没有对应分量", sources[i].name()),
            ));
        }

        let mut steps = Vec::new();
        let mut components: Vec<SharedCrs> = order.iter().map(|&i| sources[i].clone()).collect();
        let mut current = source.clone();
        if order.iter().enumerate().any(|(j, &i)| i != j) {
            let reordered = compound_of(format!("{} (重排)", source.name()), &components)?;
            steps.push(Arc::new(reorder_step(source, &reordered, &sources, &order)?));
            current = reordered;
        }

        let mut leading = 0;
        for (j, t) in targets.iter().enumerate() {
            let sub = self.create_step(&components[j], t)?;
            let trailing: usize = components[j + 1..].iter().map(|c| c.dimension()).sum();
            components[j] = t.clone();
            let next = if j + 1 == targets.len() {
                target.clone()
            } else {
                compound_of(format!("{} (第 {} 步)", target.name(), j + 1), &components)?
            };
            let step = OperationBuilder::pass_through(
                IdentifiedObject::named(format!("{} (透传)", sub.name())),
                sub,
                leading,
                trailing,
            )
            .crs(current.clone(), next.clone())
            .build()?;
            steps.push(Arc::new(step));
            leading += t.dimension();
            current = next;
        }
        concatenate(source, target, steps)
    }
}

impl CoordinateOperationFactory for StandaloneOperationFactory {
    fn create_operation(&self, source: &SharedCrs, target: &SharedCrs) -> ReferencingResult<Arc<CoordinateOperation>> {
        debug!(source = source.name(), target = target.name(), "推导坐标操作");
        self.create_step(source, target).map_err(|err| match err {
            ReferencingError::OperationNotFound { .. } => err,
            other => ReferencingError::operation_not_found(source.name(), target.name(), other.to_string()),
        })
    }
}

// ============================================================================
// 辅助函数
// ============================================================================

/// 两个地理/地心 CRS 之间的变换链：归一化、可选的地心矩阵、反归一化
///
/// 椭球体不同时即使没有基准面矩阵也经地心坐标中转，
/// 宽松模式省略的基准面转换因此仍然包含椭球体变化。
pub(crate) fn geodetic_transform(
    source: &SharedCrs,
    target: &SharedCrs,
    shift: Option<&DMatrix<f64>>,
) -> ReferencingResult<SharedTransform> {
    let src = geodetic_end(source)?;
    let tgt = geodetic_end(target)?;
    let mut steps: Vec<SharedTransform> = vec![Arc::new(src.normalize.clone())];
    if needs_geocentric(&src, &tgt, shift.is_some()) {
        if !src.geocentric {
            steps.push(Arc::new(GeocentricTransform::new(ellipsoid_of(src.datum)?, src.three_d)));
        }
        if let Some(matrix) = shift {
            steps.push(Arc::new(LinearTransform::from_matrix(matrix.clone())?));
        }
        if !tgt.geocentric {
            steps.push(GeocentricTransform::new(ellipsoid_of(tgt.datum)?, tgt.three_d).inverse()?);
        }
    } else if src.three_d != tgt.three_d {
        steps.push(Arc::new(dimension_adapter(source.dimension(), target.dimension())));
    }
    steps.push(Arc::new(tgt.normalize.inverse_linear()?));
    ConcatenatedTransform::chain(source.dimension(), steps)
}

fn geodetic_end(crs: &SharedCrs) -> ReferencingResult<GeodeticEnd<'_>> {
    match &crs.kind {
        CrsKind::Geographic { datum, cs } => {
            let three_d = cs.dimension() == 3;
            let axes = LinearTransform::from_matrix(swap_and_scale(
                cs,
                &CoordinateSystem::normalized_ellipsoidal(three_d),
            )?)?;
            let greenwich = datum.prime_meridian().map_or(0.0, |pm| pm.greenwich_longitude_degrees());
            let mut offsets = vec![0.0; cs.dimension()];
            offsets[0] = greenwich;
            Ok(GeodeticEnd {
                datum,
                normalize: LinearTransform::translation(&offsets).compose(&axes)?,
                geocentric: false,
                three_d,
            })
        }
        CrsKind::Geocentric { datum, cs } => Ok(GeodeticEnd {
            datum,
            normalize: LinearTransform::from_matrix(swap_and_scale(cs, &CoordinateSystem::normalized_geocentric())?)?,
            geocentric: true,
            three_d: true,
        }),
        _ => Err(ReferencingError::invalid_definition(format!(
            "\"{}\" 不是地理或地心 CRS",
            crs.name()
        ))),
    }
}

/// 是否需要经地心坐标中转
fn needs_geocentric(src: &GeodeticEnd<'_>, tgt: &GeodeticEnd<'_>, shifted: bool) -> bool {
    if src.geocentric || tgt.geocentric || shifted {
        return true;
    }
    match (src.datum.ellipsoid(), tgt.datum.ellipsoid()) {
        (Some(a), Some(b)) => !a.equals(b, ComparisonMode::IgnoreMetadata),
        _ => false,
    }
}

fn ellipsoid_of(datum: &Datum) -> ReferencingResult<&crate::ellipsoid::Ellipsoid> {
    datum.ellipsoid().map(|e| e.as_ref()).ok_or_else(|| {
        ReferencingError::invalid_definition(format!("基准面 \"{}\" 没有椭球体", datum.name()))
    })
}

/// 椭球体相同且到 WGS 84 的参数一致
fn same_frame(a: &Datum, b: &Datum) -> bool {
    let (Some(ea), Some(eb)) = (a.ellipsoid(), b.ellipsoid()) else {
        return false;
    };
    ea.equals(eb, ComparisonMode::IgnoreMetadata)
        && a.to_wgs84().len() == b.to_wgs84().len()
        && a.to_wgs84().iter().zip(b.to_wgs84()).all(|(x, y)| x.approx_eq(y, 1e-9))
}

fn invert(matrix: DMatrix<f64>) -> ReferencingResult<DMatrix<f64>> {
    matrix
        .try_inverse()
        .ok_or_else(|| ReferencingError::transform_failed("矩阵求逆", "Bursa-Wolf 矩阵奇异"))
}

fn push_bursa_wolf(group: &mut ParameterValueGroup, bw: &BursaWolfParameters, datum: Option<&str>) {
    let metre = Arc::new(Unit::metre());
    let arc_second = Arc::new(Unit::arc_second());
    let ppm = Arc::new(Unit::parts_per_million());
    let entries = [
        ("X-axis translation", X_TRANSLATION, bw.dx, &metre),
        ("Y-axis translation", Y_TRANSLATION, bw.dy, &metre),
        ("Z-axis translation", Z_TRANSLATION, bw.dz, &metre),
        ("X-axis rotation", X_ROTATION, bw.ex, &arc_second),
        ("Y-axis rotation", Y_ROTATION, bw.ey, &arc_second),
        ("Z-axis rotation", Z_ROTATION, bw.ez, &arc_second),
        ("Scale difference", SCALE_DIFFERENCE, bw.ppm, &ppm),
    ];
    for (name, code, value, unit) in entries {
        let (name, code) = match datum {
            Some(d) => (format!("{name} ({d})"), None),
            None => (name.to_string(), Some(code)),
        };
        group.push(ParameterValue::new(name, code, value, Some(unit.clone())));
    }
}

/// 维度适配：截断或以 0 补齐尾部分量
fn dimension_adapter(from: usize, to: usize) -> LinearTransform {
    let mut matrix = DMatrix::<f64>::zeros(to + 1, from + 1);
    for i in 0..from.min(to) {
        matrix[(i, i)] = 1.0;
    }
    matrix[(to, from)] = 1.0;
    LinearTransform::from_matrix(matrix).unwrap_or_else(|_| LinearTransform::identity(to))
}

/// 基础地理 CRS 到投影 CRS 的正向转换步骤
fn projection_step(crs: &SharedCrs) -> ReferencingResult<CoordinateOperation> {
    let CrsKind::Projected { base, conversion, cs } = &crs.kind else {
        return Err(ReferencingError::invalid_definition(format!("\"{}\" 不是投影 CRS", crs.name())));
    };
    let (Some(method), Some(parameters)) = (conversion.method(), conversion.parameters()) else {
        return Err(ReferencingError::invalid_definition(format!(
            "投影 CRS \"{}\" 的定义转换缺少方法或参数",
            crs.name()
        )));
    };
    let projection = method
        .epsg_code()
        .and_then(ProjectionMethod::from_code)
        .or_else(|| ProjectionMethod::from_name(&method.object.name))
        .ok_or_else(|| {
            ReferencingError::invalid_definition(format!("不支持的投影方法 \"{}\"", method.object.name))
        })?;

    let end = geodetic_end(base)?;
    let ellipsoid = ellipsoid_of(end.datum)?;
    let greenwich = crate::prime_meridian::PrimeMeridian::greenwich();
    let prime_meridian = end.datum.prime_meridian().map_or(&greenwich, |pm| pm.as_ref());
    let params = ProjectionParameters::from_group(projection, parameters, ellipsoid, prime_meridian)?;

    let steps: Vec<SharedTransform> = vec![
        Arc::new(end.normalize),
        Arc::new(dimension_adapter(base.dimension(), 2)),
        Arc::new(ProjectionTransform::new(params, ellipsoid)?),
        Arc::new(LinearTransform::from_matrix(swap_and_scale(
            &CoordinateSystem::normalized_projected(),
            cs,
        )?)?),
    ];
    OperationBuilder::conversion(conversion.object.clone(), method.clone(), parameters.clone())
        .crs(base.clone(), crs.clone())
        .transform(ConcatenatedTransform::chain(base.dimension(), steps)?)
        .version(conversion.version.clone())
        .valid_area(crs.domain.clone())
        .build()
}

fn axis_change(
    source: &SharedCrs,
    target: &SharedCrs,
    from: &CoordinateSystem,
    to: &CoordinateSystem,
) -> ReferencingResult<Arc<CoordinateOperation>> {
    let transform = LinearTransform::from_matrix(swap_and_scale(from, to)?)?;
    OperationBuilder::conversion(
        IdentifiedObject::named(format!("{} → {}", source.name(), target.name())),
        Arc::new(OperationMethod::new(
            IdentifiedObject::named("Axis and unit changes"),
            source.dimension(),
            target.dimension(),
        )),
        ParameterValueGroup::new(),
    )
    .crs(source.clone(), target.clone())
    .transform(Arc::new(transform))
    .build()
    .map(Arc::new)
}

fn flatten(crs: &SharedCrs) -> Vec<SharedCrs> {
    match &crs.kind {
        CrsKind::Compound { components } => components.iter().flat_map(flatten).collect(),
        _ => vec![crs.clone()],
    }
}

/// 分量配对的类别
fn category(crs: &CoordinateReferenceSystem) -> u8 {
    match crs.kind {
        CrsKind::Geographic { .. } | CrsKind::Projected { .. } | CrsKind::Geocentric { .. } => 0,
        CrsKind::Vertical { .. } => 1,
        CrsKind::Engineering { .. } => 2,
        CrsKind::Compound { .. } => 3,
    }
}

fn compound_of(name: String, components: &[SharedCrs]) -> ReferencingResult<SharedCrs> {
    CoordinateReferenceSystem::compound(IdentifiedObject::named(name), components.to_vec()).map(Arc::new)
}

/// 按配对顺序重排源分量的坐标
fn reorder_step(
    source: &SharedCrs,
    reordered: &SharedCrs,
    sources: &[SharedCrs],
    order: &[usize],
) -> ReferencingResult<CoordinateOperation> {
    let mut offsets = Vec::with_capacity(sources.len());
    let mut offset = 0;
    for s in sources {
        offsets.push(offset);
        offset += s.dimension();
    }
    let dimension = offset;
    let mut matrix = DMatrix::<f64>::zeros(dimension + 1, dimension + 1);
    matrix[(dimension, dimension)] = 1.0;
    let mut row = 0;
    for &i in order {
        for k in 0..sources[i].dimension() {
            matrix[(row, offsets[i] + k)] = 1.0;
            row += 1;
        }
    }
    OperationBuilder::conversion(
        IdentifiedObject::named("Ordinate reordering"),
        Arc::new(OperationMethod::new(
            IdentifiedObject::named("Ordinate reordering"),
            dimension,
            dimension,
        )),
        ParameterValueGroup::new(),
    )
    .crs(source.clone(), reordered.clone())
    .transform(Arc::new(LinearTransform::from_matrix(matrix)?))
    .build()
}

/// 串联步骤：展开嵌套串联，去掉端点相同的恒等步骤
fn concatenate(
    source: &SharedCrs,
    target: &SharedCrs,
    steps: Vec<Arc<CoordinateOperation>>,
) -> ReferencingResult<Arc<CoordinateOperation>> {
    let mut flat = Vec::with_capacity(steps.len());
    for step in steps {
        match &step.kind {
            OperationKind::Concatenated { steps } => flat.extend(steps.iter().cloned()),
            _ => flat.push(step),
        }
    }
    flat.retain(|s| {
        !(s.is_identity()
            && match (s.source_crs(), s.target_crs()) {
                (Some(a), Some(b)) => arc_equals(a, b, ComparisonMode::IgnoreMetadata),
                _ => false,
            })
    });
    match flat.len() {
        0 => CoordinateOperation::identity(source.clone(), target.clone()).map(Arc::new),
        1 => Ok(flat.remove(0)),
        _ => OperationBuilder::concatenated(
            IdentifiedObject::named(format!("{} → {}", source.name(), target.name())),
            flat,
        )
        .crs(source.clone(), target.clone())
        .build()
        .map(Arc::new),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cs::{AxisDirection, CoordinateSystemAxis, CsKind};
    use crate::ellipsoid::Ellipsoid;
    use crate::prime_meridian::PrimeMeridian;

    fn wgs84() -> SharedCrs {
        Arc::new(CoordinateReferenceSystem::wgs84_lon_lat())
    }

    fn lat_lon_cs() -> Arc<CoordinateSystem> {
        let degree = Arc::new(Unit::degree());
        Arc::new(
            CoordinateSystem::new(
                IdentifiedObject::named("Ellipsoidal 2D CS. Axes: latitude, longitude."),
                CsKind::Ellipsoidal,
                vec![
                    CoordinateSystemAxis::new("Geodetic latitude", "Lat", AxisDirection::North, degree.clone()),
                    CoordinateSystemAxis::new("Geodetic longitude", "Lon", AxisDirection::East, degree),
                ],
            )
            .unwrap(),
        )
    }

    fn nad27() -> SharedCrs {
        let clarke = Ellipsoid::from_semi_axes(
            IdentifiedObject::with_code("Clarke 1866", "EPSG", "7008"),
            6378206.4,
            6356583.8,
            Arc::new(Unit::metre()),
        )
        .unwrap();
        let datum = Datum::geodetic(
            IdentifiedObject::with_code("North American Datum 1927", "EPSG", "6267"),
            Arc::new(clarke),
            Arc::new(PrimeMeridian::greenwich()),
        )
        .with_to_wgs84(vec![BursaWolfParameters::translation("WGS 84", -8.0, 160.0, 176.0)]);
        Arc::new(
            CoordinateReferenceSystem::geographic(
                IdentifiedObject::with_code("NAD27", "EPSG", "4267"),
                Arc::new(datum),
                lat_lon_cs(),
            )
            .unwrap(),
        )
    }

    /// 没有 Bursa-Wolf 参数的纬经度地理 CRS
    fn datum_without_shift(name: &str, ellipsoid: Ellipsoid) -> SharedCrs {
        let datum = Datum::geodetic(
            IdentifiedObject::named(format!("{name} datum")),
            Arc::new(ellipsoid),
            Arc::new(PrimeMeridian::greenwich()),
        );
        Arc::new(
            CoordinateReferenceSystem::geographic(IdentifiedObject::named(name), Arc::new(datum), lat_lon_cs())
                .unwrap(),
        )
    }

    fn unknown_datum() -> SharedCrs {
        let international = Ellipsoid::from_flattening(
            IdentifiedObject::named("International 1924"),
            6378388.0,
            297.0,
            Arc::new(Unit::metre()),
        )
        .unwrap();
        datum_without_shift("Local", international)
    }

    /// 测试只交换轴顺序的转换
    #[test]
    fn test_axis_swap_only() {
        let lat_lon = Arc::new(
            CoordinateReferenceSystem::geographic(
                IdentifiedObject::named("WGS 84 (lat, lon)"),
                Arc::new(Datum::wgs84()),
                lat_lon_cs(),
            )
            .unwrap(),
        );
        let op = StandaloneOperationFactory::new().create_operation(&lat_lon, &wgs84()).unwrap();
        assert!(matches!(op.kind, OperationKind::Conversion { .. }));
        let out = op.transform().unwrap().apply(&[40.0, 116.0]).unwrap();
        assert_eq!(out, vec![116.0, 40.0]);
    }

    #[test]
    fn test_identity_for_equal_crs() {
        let op = StandaloneOperationFactory::new().create_operation(&wgs84(), &wgs84()).unwrap();
        assert!(op.is_identity());
    }

    /// 测试 NAD27 到 WGS 84 的三参数转换
    #[test]
    fn test_nad27_to_wgs84() {
        let op = StandaloneOperationFactory::new().create_operation(&nad27(), &wgs84()).unwrap();
        assert!(matches!(op.kind, OperationKind::Transformation { .. }));
        assert_eq!(op.accuracy, vec![PositionalAccuracy::DatumShiftApplied]);
        let out = op.transform().unwrap().apply(&[40.0, -100.0]).unwrap();
        assert!((out[0] - -100.000_417_6).abs() < 1e-6, "lon = {}", out[0]);
        assert!((out[1] - 40.000_009_5).abs() < 1e-6, "lat = {}", out[1]);

        let back = op.inverse().unwrap();
        let round = back.transform().unwrap().apply(&out).unwrap();
        assert!((round[0] - 40.0).abs() < 1e-8);
        assert!((round[1] - -100.0).abs() < 1e-8);
    }

    #[test]
    fn test_missing_bursa_wolf_is_not_found() {
        let err = StandaloneOperationFactory::new()
            .create_operation(&unknown_datum(), &wgs84())
            .unwrap_err();
        assert!(matches!(err, ReferencingError::OperationNotFound { .. }));
    }

    /// 测试宽松模式省略基准面转换
    #[test]
    fn test_lenient_omits_datum_shift() {
        let op = StandaloneOperationFactory::with_lenient_datum_shift(true)
            .create_operation(&unknown_datum(), &wgs84())
            .unwrap();
        assert_eq!(op.accuracy, vec![PositionalAccuracy::DatumShiftOmitted]);
        let out = op.transform().unwrap().apply(&[40.0, 116.0]).unwrap();
        // 椭球体不同：经度不变，纬度随椭球体变化
        assert!((out[0] - 116.0).abs() < 1e-9, "lon = {}", out[0]);
        let dlat = (out[1] - 40.0).abs();
        assert!(dlat > 1e-6 && dlat < 1e-2, "dlat = {dlat}");
    }

    /// 测试宽松模式下克拉索夫斯基椭球体到 WGS 84 经地心坐标中转
    #[test]
    fn test_lenient_krassowsky_goes_through_geocentric() {
        let krassowsky = Ellipsoid::from_flattening(
            IdentifiedObject::with_code("Krassowsky 1940", "EPSG", "7024"),
            6378245.0,
            298.3,
            Arc::new(Unit::metre()),
        )
        .unwrap();
        let source = datum_without_shift("Krassowsky local", krassowsky.clone());
        let op = StandaloneOperationFactory::with_lenient_datum_shift(true)
            .create_operation(&source, &wgs84())
            .unwrap();
        assert_eq!(op.accuracy, vec![PositionalAccuracy::DatumShiftOmitted]);

        let out = op.transform().unwrap().apply(&[40.0, 116.0]).unwrap();
        let geocentric = GeocentricTransform::new(&krassowsky, false).apply(&[116.0, 40.0]).unwrap();
        let expected = GeocentricTransform::wgs84(false).inverse().unwrap().apply(&geocentric).unwrap();
        assert!((out[0] - expected[0]).abs() < 1e-9, "lon = {}", out[0]);
        assert!((out[1] - expected[1]).abs() < 1e-9, "lat = {}", out[1]);
        assert!((out[1] - 40.0).abs() > 1e-6, "纬度应随椭球体变化");
    }

    /// 测试相同椭球体的宽松省略只做轴交换
    #[test]
    fn test_lenient_same_ellipsoid_is_axis_swap() {
        let source = datum_without_shift("Unknown", Ellipsoid::wgs84());
        let target = datum_without_shift("Other", Ellipsoid::wgs84());
        let op = StandaloneOperationFactory::with_lenient_datum_shift(true)
            .create_operation(&source, &target)
            .unwrap();
        let out = op.transform().unwrap().apply(&[40.0, 116.0]).unwrap();
        assert_eq!(out, vec![40.0, 116.0]);
    }

    #[test]
    fn test_geographic_to_geocentric() {
        let geocentric = Arc::new(CoordinateReferenceSystem::wgs84_geocentric());
        let op = StandaloneOperationFactory::new().create_operation(&wgs84(), &geocentric).unwrap();
        let out = op.transform().unwrap().apply(&[0.0, 0.0]).unwrap();
        assert!((out[0] - 6378137.0).abs() < 1e-6);
        assert!(out[1].abs() < 1e-6 && out[2].abs() < 1e-6);
    }

    #[test]
    fn test_compound_with_unmatched_component() {
        let vertical = Arc::new(
            CoordinateReferenceSystem::vertical(
                IdentifiedObject::named("MSL height"),
                Arc::new(Datum::vertical(IdentifiedObject::named("Mean Sea Level"))),
                Arc::new(CoordinateSystem::normalized_vertical()),
            )
            .unwrap(),
        );
        let compound = Arc::new(
            CoordinateReferenceSystem::compound(IdentifiedObject::named("WGS 84 + MSL"), vec![wgs84(), vertical])
                .unwrap(),
        );
        let err = StandaloneOperationFactory::new().create_operation(&compound, &wgs84()).unwrap_err();
        assert!(matches!(err, ReferencingError::OperationNotFound { .. }));
    }
}
