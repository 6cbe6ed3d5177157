// crates/gr_referencing/src/authority/epsg.rs

//! EPSG 权威工厂
//!
//! 按代码从关系型权威库构造参照对象。
//!
//! # 约定
//!
//! - 代码可带 `EPSG:` 前缀；非数字代码按名称（忽略大小写）查找
//! - 同一代码的多行结果必须在忽略元数据时相等，否则为 `DuplicateDefinition`
//! - 必需列为 NULL 时报告 `MissingRequiredField`
//! - 同一工厂实例对同一代码总是返回同一个 `Arc`
//!
//! # 并发
//!
//! 连接、查询文本缓存与对象池由一把互斥锁保护。锁不可重入，
//! 内部递归构造全部在持锁的 [`FactoryState`] 上进行，
//! 每次查询先把结果行收集为自有值再递归。

use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OpenFlags, Params, Row};
use tracing::{debug, info, trace, warn};

use super::database::EpsgDatabase;
use super::dialect::{dialect_for_driver, BracketDialect, SqlDialect};
use super::queries::{ObjectKind, QueryPurpose};
use super::AuthorityObject;
use crate::crs::CoordinateReferenceSystem;
use crate::cs::{AxisDirection, CoordinateSystem, CoordinateSystemAxis, CsKind};
use crate::datum::{BursaWolfParameters, Datum};
use crate::ellipsoid::Ellipsoid;
use crate::error::{ReferencingError, ReferencingResult};
use crate::extent::Extent;
use crate::geometry::BoundingBox;
use crate::identified::{arc_equals, Comparable, ComparisonMode, IdentifiedObject, NameSpace, ScopedName};
use crate::operation::standalone::geodetic_transform;
use crate::operation::{
    CoordinateOperation, CoordinateOperationFactory, OperationAuthorityFactory, OperationBuilder,
    PositionalAccuracy, StandaloneOperationFactory,
};
use crate::parameter::{
    OperationMethod, ParameterValue, ParameterValueGroup, SCALE_DIFFERENCE, X_ROTATION, X_TRANSLATION,
    Y_ROTATION, Y_TRANSLATION, Z_ROTATION, Z_TRANSLATION,
};
use crate::prime_meridian::PrimeMeridian;
use crate::unit::{Unit, UnitKind};

type SharedCrs = Arc<CoordinateReferenceSystem>;

const STATEMENT_CACHE_CAPACITY: usize = 32;

/// 派生单位链的最大深度
const MAX_UNIT_CHAIN: usize = 8;

const WGS84_DATUM: i64 = 6326;

const GEOCENTRIC_TRANSLATIONS: i64 = 9603;
const POSITION_VECTOR: i64 = 9606;
const COORDINATE_FRAME: i64 = 9607;

fn degree_supplier() -> Unit {
    Unit::new(
        IdentifiedObject::with_code("degree (supplier to define representation)", "EPSG", "9122"),
        UnitKind::Angular,
        PI / 180.0,
    )
}

/// 常用单位直接构造，作为派生单位链的根
const BASE_UNITS: &[(i64, fn() -> Unit)] = &[
    (9001, Unit::metre),
    (9002, Unit::foot),
    (9030, Unit::nautical_mile),
    (9101, Unit::radian),
    (9102, Unit::degree),
    (9104, Unit::arc_second),
    (9105, Unit::grad),
    (9109, Unit::microradian),
    (9122, degree_supplier),
    (9201, Unit::unity),
    (9202, Unit::parts_per_million),
];

fn base_unit(code: i64) -> Option<Unit> {
    BASE_UNITS.iter().find(|(c, _)| *c == code).map(|(_, make)| make())
}

// ============================================================================
// 结果行
// ============================================================================

struct UnitRow {
    name: String,
    kind: Option<String>,
    target: Option<i64>,
    factor_b: Option<f64>,
    factor_c: Option<f64>,
    remarks: Option<String>,
}

impl UnitRow {
    fn read(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            name: r.get(0)?,
            kind: r.get(1)?,
            target: r.get(2)?,
            factor_b: r.get(3)?,
            factor_c: r.get(4)?,
            remarks: r.get(5)?,
        })
    }
}

struct EllipsoidRow {
    name: String,
    semi_major: Option<f64>,
    inverse_flattening: Option<f64>,
    semi_minor: Option<f64>,
    unit: Option<i64>,
    remarks: Option<String>,
}

impl EllipsoidRow {
    fn read(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            name: r.get(0)?,
            semi_major: r.get(1)?,
            inverse_flattening: r.get(2)?,
            semi_minor: r.get(3)?,
            unit: r.get(4)?,
            remarks: r.get(5)?,
        })
    }
}

struct PrimeMeridianRow {
    name: String,
    longitude: Option<f64>,
    unit: Option<i64>,
    remarks: Option<String>,
}

impl PrimeMeridianRow {
    fn read(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            name: r.get(0)?,
            longitude: r.get(1)?,
            unit: r.get(2)?,
            remarks: r.get(3)?,
        })
    }
}

struct DatumRow {
    name: String,
    kind: Option<String>,
    ellipsoid: Option<i64>,
    prime_meridian: Option<i64>,
    remarks: Option<String>,
}

impl DatumRow {
    fn read(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            name: r.get(0)?,
            kind: r.get(1)?,
            ellipsoid: r.get(2)?,
            prime_meridian: r.get(3)?,
            remarks: r.get(5)?,
        })
    }
}

struct CsRow {
    name: String,
    kind: Option<String>,
    dimension: Option<i64>,
    remarks: Option<String>,
}

impl CsRow {
    fn read(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            name: r.get(0)?,
            kind: r.get(1)?,
            dimension: r.get(2)?,
            remarks: r.get(3)?,
        })
    }
}

struct AxisRow {
    name: String,
    abbreviation: Option<String>,
    orientation: Option<String>,
    unit: Option<i64>,
}

impl AxisRow {
    fn read(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            name: r.get(0)?,
            abbreviation: r.get(1)?,
            orientation: r.get(2)?,
            unit: r.get(3)?,
        })
    }
}

struct CrsRow {
    name: String,
    kind: Option<String>,
    cs: Option<i64>,
    datum: Option<i64>,
    base: Option<i64>,
    conversion: Option<i64>,
    horizontal: Option<i64>,
    vertical: Option<i64>,
    area: Option<i64>,
    scope: Option<String>,
    remarks: Option<String>,
}

impl CrsRow {
    fn read(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            name: r.get(0)?,
            kind: r.get(1)?,
            cs: r.get(2)?,
            datum: r.get(3)?,
            base: r.get(4)?,
            conversion: r.get(5)?,
            horizontal: r.get(6)?,
            vertical: r.get(7)?,
            area: r.get(8)?,
            scope: r.get(9)?,
            remarks: r.get(10)?,
        })
    }
}

struct OperationRow {
    name: String,
    kind: Option<String>,
    source: Option<i64>,
    target: Option<i64>,
    version: Option<String>,
    area: Option<i64>,
    scope: Option<String>,
    accuracy: Option<f64>,
    method: Option<i64>,
    remarks: Option<String>,
}

impl OperationRow {
    fn read(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            name: r.get(0)?,
            kind: r.get(1)?,
            source: r.get(2)?,
            target: r.get(3)?,
            version: r.get(4)?,
            area: r.get(5)?,
            scope: r.get(6)?,
            accuracy: r.get(7)?,
            method: r.get(8)?,
            remarks: r.get(9)?,
        })
    }
}

// ============================================================================
// 工厂状态
// ============================================================================

/// 已构造对象，按代码索引
#[derive(Default)]
struct ObjectPool {
    units: HashMap<i64, Arc<Unit>>,
    ellipsoids: HashMap<i64, Arc<Ellipsoid>>,
    prime_meridians: HashMap<i64, Arc<PrimeMeridian>>,
    datums: HashMap<i64, Arc<Datum>>,
    coordinate_systems: HashMap<i64, Arc<CoordinateSystem>>,
    crs: HashMap<i64, SharedCrs>,
    operations: HashMap<i64, Arc<CoordinateOperation>>,
    methods: HashMap<(i64, usize, usize), Arc<OperationMethod>>,
    areas: HashMap<i64, Extent>,
}

/// 锁内状态
struct FactoryState {
    authority: String,
    conn: Option<Connection>,
    dialect: Box<dyn SqlDialect>,
    /// 按用途缓存的改写后 SQL
    queries: HashMap<QueryPurpose, String>,
    pool: ObjectPool,
    namespaces: HashMap<String, Arc<NameSpace>>,
    /// 上次 `create_object` 命中的类别
    last_kind: Option<ObjectKind>,
    standalone: StandaloneOperationFactory,
}

impl FactoryState {
    fn not_found(&self, kind: ObjectKind, code: impl ToString) -> ReferencingError {
        ReferencingError::no_such_code(self.authority.clone(), code.to_string(), kind.label())
    }

    fn query<T, P: Params>(
        &mut self,
        purpose: QueryPurpose,
        params: P,
        map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
    ) -> ReferencingResult<Vec<T>> {
        let Self { conn, dialect, queries, .. } = self;
        let conn = conn
            .as_ref()
            .ok_or_else(|| ReferencingError::factory_failure("权威工厂已释放"))?;
        let sql = queries.entry(purpose).or_insert_with(|| dialect.adapt(&purpose.sql()));
        trace!(?purpose, "执行权威库查询");
        let mut statement = conn.prepare_cached(sql)?;
        let rows = statement.query_map(params, map)?.collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn exists(&mut self, kind: ObjectKind, code: i64) -> ReferencingResult<bool> {
        Ok(!self.query(QueryPurpose::Exists(kind), [code], |_| Ok(()))?.is_empty())
    }

    /// 去掉权威前缀；非数字代码按名称查找
    fn resolve(&mut self, kind: ObjectKind, code: &str) -> ReferencingResult<i64> {
        let trimmed = code.trim();
        let local = match trimmed.split_once(':') {
            Some((authority, local)) if authority.trim().eq_ignore_ascii_case(&self.authority) => local.trim(),
            Some(_) => return Err(self.not_found(kind, trimmed)),
            None => trimmed,
        };
        if let Ok(numeric) = local.parse::<i64>() {
            return Ok(numeric);
        }
        let codes: Vec<i64> = self.query(QueryPurpose::CodeByName(kind), [local], |r| r.get(0))?;
        codes.into_iter().min().ok_or_else(|| self.not_found(kind, local))
    }

    /// 构造元数据并附上别名
    fn object(
        &mut self,
        kind: ObjectKind,
        code: i64,
        name: String,
        remarks: Option<String>,
    ) -> ReferencingResult<IdentifiedObject> {
        let mut object = IdentifiedObject::with_code(name, self.authority.clone(), code.to_string());
        object.remarks = remarks;
        let aliases: Vec<(String, Option<String>)> =
            self.query(QueryPurpose::Aliases, params![kind.table(), code], |r| Ok((r.get(0)?, r.get(1)?)))?;
        for (alias, scope) in aliases {
            let scope = scope.map(|s| {
                self.namespaces
                    .entry(s.clone())
                    .or_insert_with(|| NameSpace::new(s))
                    .clone()
            });
            object.aliases.push(ScopedName::new(scope, alias));
        }
        Ok(object)
    }

    /// 多行结果必须一致，取第一行
    fn singleton<T: Comparable, R>(
        &mut self,
        kind: ObjectKind,
        code: i64,
        rows: Vec<R>,
        mut build: impl FnMut(&mut Self, R) -> ReferencingResult<T>,
    ) -> ReferencingResult<Arc<T>> {
        let mut result: Option<T> = None;
        for row in rows {
            let value = build(self, row)?;
            match &result {
                Some(previous) if !previous.equals(&value, ComparisonMode::IgnoreMetadata) => {
                    return Err(ReferencingError::duplicate(code.to_string()));
                }
                Some(_) => debug!(code, "重复但一致的定义"),
                None => result = Some(value),
            }
        }
        result.map(Arc::new).ok_or_else(|| self.not_found(kind, code))
    }

    // ========================================================================
    // 单位、椭球体、本初子午线
    // ========================================================================

    fn unit(&mut self, code: i64) -> ReferencingResult<Arc<Unit>> {
        self.unit_at(code, 0)
    }

    fn unit_at(&mut self, code: i64, depth: usize) -> ReferencingResult<Arc<Unit>> {
        if let Some(unit) = self.pool.units.get(&code) {
            return Ok(unit.clone());
        }
        let rows = self.query(QueryPurpose::Unit, [code], UnitRow::read)?;
        let unit = match (rows.is_empty(), base_unit(code)) {
            (true, Some(unit)) => Arc::new(unit),
            _ => self.singleton(ObjectKind::Unit, code, rows, |s, row| s.build_unit(code, row, depth))?,
        };
        self.pool.units.insert(code, unit.clone());
        Ok(unit)
    }

    fn build_unit(&mut self, code: i64, row: UnitRow, depth: usize) -> ReferencingResult<Unit> {
        let object = self.object(ObjectKind::Unit, code, row.name, row.remarks)?;
        if let Some(mut unit) = base_unit(code) {
            unit.object = object;
            return Ok(unit);
        }
        let kind = unit_kind(code, row.kind.as_deref())?;
        let target = row
            .target
            .ok_or_else(|| ReferencingError::missing_field(code.to_string(), "TARGET_UOM_CODE"))?;
        let b = row
            .factor_b
            .ok_or_else(|| ReferencingError::missing_field(code.to_string(), "FACTOR_B"))?;
        let c = row
            .factor_c
            .ok_or_else(|| ReferencingError::missing_field(code.to_string(), "FACTOR_C"))?;
        if c == 0.0 {
            return Err(ReferencingError::invalid_definition(format!("单位 {code} 的 FACTOR_C 为零")));
        }
        if target == code {
            return Ok(Unit::new(object, kind, b / c));
        }
        if depth >= MAX_UNIT_CHAIN {
            return Err(ReferencingError::invalid_definition(format!("单位 {code} 的换算链过长")));
        }
        let base = self.unit_at(target, depth + 1)?;
        if base.kind != kind {
            return Err(ReferencingError::invalid_definition(format!(
                "单位 {code} 的类型与目标单位 {target} 不一致"
            )));
        }
        Ok(Unit::derived(object, base, b / c))
    }

    fn ellipsoid(&mut self, code: i64) -> ReferencingResult<Arc<Ellipsoid>> {
        if let Some(v) = self.pool.ellipsoids.get(&code) {
            return Ok(v.clone());
        }
        let rows = self.query(QueryPurpose::Ellipsoid, [code], EllipsoidRow::read)?;
        let value = self.singleton(ObjectKind::Ellipsoid, code, rows, |s, row| s.build_ellipsoid(code, row))?;
        self.pool.ellipsoids.insert(code, value.clone());
        Ok(value)
    }

    fn build_ellipsoid(&mut self, code: i64, row: EllipsoidRow) -> ReferencingResult<Ellipsoid> {
        let semi_major = row
            .semi_major
            .ok_or_else(|| ReferencingError::missing_field(code.to_string(), "SEMI_MAJOR_AXIS"))?;
        let unit_code = row
            .unit
            .ok_or_else(|| ReferencingError::missing_field(code.to_string(), "UOM_CODE"))?;
        let unit = self.unit(unit_code)?;
        let object = self.object(ObjectKind::Ellipsoid, code, row.name, row.remarks)?;
        match (row.inverse_flattening.filter(|ivf| *ivf != 0.0), row.semi_minor) {
            (Some(ivf), semi_minor) => {
                if semi_minor.is_some() {
                    warn!(code, "椭球体同时给出反扁率与短半轴，以反扁率为准");
                }
                Ellipsoid::from_flattening(object, semi_major, ivf, unit)
            }
            (None, Some(semi_minor)) => Ellipsoid::from_semi_axes(object, semi_major, semi_minor, unit),
            (None, None) => Err(ReferencingError::missing_field(code.to_string(), "INV_FLATTENING")),
        }
    }

    fn prime_meridian(&mut self, code: i64) -> ReferencingResult<Arc<PrimeMeridian>> {
        if let Some(v) = self.pool.prime_meridians.get(&code) {
            return Ok(v.clone());
        }
        let rows = self.query(QueryPurpose::PrimeMeridian, [code], PrimeMeridianRow::read)?;
        let value = self.singleton(ObjectKind::PrimeMeridian, code, rows, |s, row| {
            let longitude = row
                .longitude
                .ok_or_else(|| ReferencingError::missing_field(code.to_string(), "GREENWICH_LONGITUDE"))?;
            let unit_code = row
                .unit
                .ok_or_else(|| ReferencingError::missing_field(code.to_string(), "UOM_CODE"))?;
            let unit = s.unit(unit_code)?;
            let object = s.object(ObjectKind::PrimeMeridian, code, row.name, row.remarks)?;
            PrimeMeridian::new(object, longitude, unit)
        })?;
        self.pool.prime_meridians.insert(code, value.clone());
        Ok(value)
    }

    // ========================================================================
    // 基准面与坐标系
    // ========================================================================

    fn datum(&mut self, code: i64) -> ReferencingResult<Arc<Datum>> {
        if let Some(v) = self.pool.datums.get(&code) {
            return Ok(v.clone());
        }
        let rows = self.query(QueryPurpose::Datum, [code], DatumRow::read)?;
        let value = self.singleton(ObjectKind::Datum, code, rows, |s, row| s.build_datum(code, row))?;
        self.pool.datums.insert(code, value.clone());
        Ok(value)
    }

    fn build_datum(&mut self, code: i64, row: DatumRow) -> ReferencingResult<Datum> {
        let kind = row
            .kind
            .as_deref()
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| ReferencingError::missing_field(code.to_string(), "DATUM_TYPE"))?;
        let object = self.object(ObjectKind::Datum, code, row.name, row.remarks)?;
        match kind.as_str() {
            "geodetic" => {
                let ellipsoid = row
                    .ellipsoid
                    .ok_or_else(|| ReferencingError::missing_field(code.to_string(), "ELLIPSOID_CODE"))?;
                let prime_meridian = row
                    .prime_meridian
                    .ok_or_else(|| ReferencingError::missing_field(code.to_string(), "PRIME_MERIDIAN_CODE"))?;
                let ellipsoid = self.ellipsoid(ellipsoid)?;
                let prime_meridian = self.prime_meridian(prime_meridian)?;
                let to_wgs84 = self.to_wgs84(code)?;
                Ok(Datum::geodetic(object, ellipsoid, prime_meridian).with_to_wgs84(to_wgs84))
            }
            "vertical" => Ok(Datum::vertical(object)),
            "engineering" => Ok(Datum::engineering(object)),
            other => Err(ReferencingError::invalid_definition(format!(
                "基准面 {code} 的类型 \"{other}\" 未知"
            ))),
        }
    }

    /// 以该基准面为源、WGS 84 为目标的 Bursa-Wolf 参数，按精度排序
    fn to_wgs84(&mut self, datum: i64) -> ReferencingResult<Vec<BursaWolfParameters>> {
        if datum == WGS84_DATUM {
            return Ok(Vec::new());
        }
        let operations: Vec<(i64, i64)> =
            self.query(QueryPurpose::BursaWolf, [datum], |r| Ok((r.get(0)?, r.get(1)?)))?;
        let mut result = Vec::with_capacity(operations.len());
        for (operation, method) in operations {
            let parameters = self.parameters(operation, method)?;
            result.push(bursa_wolf(&parameters, method)?);
        }
        Ok(result)
    }

    fn coordinate_system(&mut self, code: i64) -> ReferencingResult<Arc<CoordinateSystem>> {
        if let Some(v) = self.pool.coordinate_systems.get(&code) {
            return Ok(v.clone());
        }
        let rows = self.query(QueryPurpose::CoordinateSystem, [code], CsRow::read)?;
        let value = self.singleton(ObjectKind::CoordinateSystem, code, rows, |s, row| {
            s.build_coordinate_system(code, row)
        })?;
        self.pool.coordinate_systems.insert(code, value.clone());
        Ok(value)
    }

    fn build_coordinate_system(&mut self, code: i64, row: CsRow) -> ReferencingResult<CoordinateSystem> {
        let kind = match row.kind.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("ellipsoidal") => CsKind::Ellipsoidal,
            Some("cartesian") => CsKind::Cartesian,
            Some("vertical") => CsKind::Vertical,
            Some(other) => {
                return Err(ReferencingError::invalid_definition(format!(
                    "坐标系 {code} 的类型 \"{other}\" 未知"
                )))
            }
            None => return Err(ReferencingError::missing_field(code.to_string(), "COORD_SYS_TYPE")),
        };
        let dimension = row
            .dimension
            .ok_or_else(|| ReferencingError::missing_field(code.to_string(), "DIMENSION"))?;
        let object = self.object(ObjectKind::CoordinateSystem, code, row.name, row.remarks)?;

        let axis_rows = self.query(QueryPurpose::Axes, [code], AxisRow::read)?;
        let mut axes = Vec::with_capacity(axis_rows.len());
        for axis in axis_rows {
            let orientation = axis
                .orientation
                .ok_or_else(|| ReferencingError::missing_field(code.to_string(), "COORD_AXIS_ORIENTATION"))?;
            let direction = AxisDirection::parse(&orientation).ok_or_else(|| {
                ReferencingError::invalid_definition(format!("坐标系 {code} 的轴方向 \"{orientation}\" 未知"))
            })?;
            let unit_code = axis
                .unit
                .ok_or_else(|| ReferencingError::missing_field(code.to_string(), "UOM_CODE"))?;
            let unit = self.unit(unit_code)?;
            axes.push(CoordinateSystemAxis::new(
                axis.name,
                axis.abbreviation.unwrap_or_default(),
                direction,
                unit,
            ));
        }
        let expected = usize::try_from(dimension).unwrap_or(0);
        if axes.len() != expected {
            return Err(ReferencingError::mismatched_dimension(
                format!("坐标系 {code} 的轴"),
                expected,
                axes.len(),
            ));
        }
        CoordinateSystem::new(object, kind, axes)
    }

    // ========================================================================
    // 坐标参考系统
    // ========================================================================

    fn crs(&mut self, code: i64) -> ReferencingResult<SharedCrs> {
        if let Some(v) = self.pool.crs.get(&code) {
            return Ok(v.clone());
        }
        let rows = self.query(QueryPurpose::Crs, [code], CrsRow::read)?;
        let value = self.singleton(ObjectKind::Crs, code, rows, |s, row| s.build_crs(code, row))?;
        self.pool.crs.insert(code, value.clone());
        Ok(value)
    }

    fn build_crs(&mut self, code: i64, row: CrsRow) -> ReferencingResult<CoordinateReferenceSystem> {
        let required = |value: Option<i64>, field: &'static str| {
            value.ok_or_else(|| ReferencingError::missing_field(code.to_string(), field))
        };
        let kind = row
            .kind
            .as_deref()
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| ReferencingError::missing_field(code.to_string(), "COORD_REF_SYS_KIND"))?;
        let object = self.object(ObjectKind::Crs, code, row.name, row.remarks)?;
        let crs = match kind.as_str() {
            "geographic 2d" | "geographic 3d" => {
                let datum = self.datum(required(row.datum, "DATUM_CODE")?)?;
                let cs = self.coordinate_system(required(row.cs, "COORD_SYS_CODE")?)?;
                CoordinateReferenceSystem::geographic(object, datum, cs)?
            }
            "geocentric" => {
                let datum = self.datum(required(row.datum, "DATUM_CODE")?)?;
                let cs = self.coordinate_system(required(row.cs, "COORD_SYS_CODE")?)?;
                CoordinateReferenceSystem::geocentric(object, datum, cs)?
            }
            "projected" => {
                let base = self.crs(required(row.base, "SOURCE_GEOGCRS_CODE")?)?;
                let conversion = self.operation(required(row.conversion, "PROJECTION_CONV_CODE")?)?;
                let cs = self.coordinate_system(required(row.cs, "COORD_SYS_CODE")?)?;
                CoordinateReferenceSystem::projected(object, base, conversion, cs)?
            }
            "vertical" => {
                let datum = self.datum(required(row.datum, "DATUM_CODE")?)?;
                let cs = self.coordinate_system(required(row.cs, "COORD_SYS_CODE")?)?;
                CoordinateReferenceSystem::vertical(object, datum, cs)?
            }
            "engineering" => {
                let datum = self.datum(required(row.datum, "DATUM_CODE")?)?;
                let cs = self.coordinate_system(required(row.cs, "COORD_SYS_CODE")?)?;
                CoordinateReferenceSystem::engineering(object, datum, cs)?
            }
            "compound" => {
                let horizontal = self.crs(required(row.horizontal, "CMPD_HORIZCRS_CODE")?)?;
                let vertical = self.crs(required(row.vertical, "CMPD_VERTCRS_CODE")?)?;
                CoordinateReferenceSystem::compound(object, vec![horizontal, vertical])?
            }
            other => {
                return Err(ReferencingError::invalid_definition(format!(
                    "CRS {code} 的类别 \"{other}\" 未知"
                )))
            }
        };
        let domain = self.area(row.area)?;
        Ok(crs.with_domain(domain).with_scope(row.scope))
    }

    fn area(&mut self, code: Option<i64>) -> ReferencingResult<Option<Extent>> {
        let Some(code) = code else {
            return Ok(None);
        };
        if let Some(extent) = self.pool.areas.get(&code) {
            return Ok(Some(extent.clone()));
        }
        type AreaRow = (String, Option<String>, Option<f64>, Option<f64>, Option<f64>, Option<f64>);
        let rows: Vec<AreaRow> = self.query(QueryPurpose::Area, [code], |r| {
            Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?, r.get(5)?))
        })?;
        let Some((name, description, south, north, west, east)) = rows.into_iter().next() else {
            warn!(code, "有效范围代码不存在，忽略");
            return Ok(None);
        };
        let bbox = match (south, north, west, east) {
            (Some(s), Some(n), Some(w), Some(e)) => Some(BoundingBox::new(w, s, e, n)),
            _ => None,
        };
        let extent = Extent::new(Some(description.unwrap_or(name)), bbox);
        self.pool.areas.insert(code, extent.clone());
        Ok(Some(extent))
    }

    // ========================================================================
    // 坐标操作
    // ========================================================================

    fn method(
        &mut self,
        code: i64,
        source_dimensions: usize,
        target_dimensions: usize,
    ) -> ReferencingResult<Arc<OperationMethod>> {
        let key = (code, source_dimensions, target_dimensions);
        if let Some(v) = self.pool.methods.get(&key) {
            return Ok(v.clone());
        }
        type MethodRow = (String, Option<String>, Option<String>);
        let rows: Vec<MethodRow> =
            self.query(QueryPurpose::Method, [code], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))?;
        let Some((name, formula, remarks)) = rows.into_iter().next() else {
            return Err(ReferencingError::invalid_definition(format!("操作方法 {code} 不存在")));
        };
        let mut object = IdentifiedObject::with_code(name, self.authority.clone(), code.to_string());
        object.remarks = remarks;
        let mut method = OperationMethod::new(object, source_dimensions, target_dimensions);
        method.formula = formula;
        let method = Arc::new(method);
        self.pool.methods.insert(key, method.clone());
        Ok(method)
    }

    fn parameters(&mut self, operation: i64, method: i64) -> ReferencingResult<ParameterValueGroup> {
        type ParameterRow = (String, i64, Option<f64>, Option<i64>);
        let rows: Vec<ParameterRow> = self.query(QueryPurpose::ParameterValues, params![operation, method], |r| {
            Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?))
        })?;
        let mut group = ParameterValueGroup::new();
        for (name, code, value, unit) in rows {
            let value =
                value.ok_or_else(|| ReferencingError::missing_field(operation.to_string(), "PARAMETER_VALUE"))?;
            let unit = unit.map(|u| self.unit(u)).transpose()?;
            group.push(ParameterValue::new(name, u32::try_from(code).ok(), value, unit));
        }
        Ok(group)
    }

    fn operation(&mut self, code: i64) -> ReferencingResult<Arc<CoordinateOperation>> {
        if let Some(v) = self.pool.operations.get(&code) {
            return Ok(v.clone());
        }
        let rows = self.query(QueryPurpose::Operation, [code], OperationRow::read)?;
        let value = self.singleton(ObjectKind::Operation, code, rows, |s, row| s.build_operation(code, row))?;
        self.pool.operations.insert(code, value.clone());
        Ok(value)
    }

    fn build_operation(&mut self, code: i64, row: OperationRow) -> ReferencingResult<CoordinateOperation> {
        let kind = row
            .kind
            .as_deref()
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| ReferencingError::missing_field(code.to_string(), "COORD_OP_TYPE"))?;
        let method_code = || {
            row.method
                .ok_or_else(|| ReferencingError::missing_field(code.to_string(), "COORD_OP_METHOD_CODE"))
        };
        let object = self.object(ObjectKind::Operation, code, row.name.clone(), row.remarks.clone())?;
        let valid_area = self.area(row.area)?;
        let source = row.source.map(|c| self.crs(c)).transpose()?;
        let target = row.target.map(|c| self.crs(c)).transpose()?;

        let builder = match kind.as_str() {
            "conversion" => {
                let method_code = method_code()?;
                let parameters = self.parameters(code, method_code)?;
                match (source, target) {
                    (None, None) => {
                        let method = self.method(method_code, 2, 2)?;
                        OperationBuilder::conversion(object, method, parameters)
                    }
                    (Some(source), Some(target)) => {
                        let method = self.method(method_code, source.dimension(), target.dimension())?;
                        let derived = self.standalone.create_operation(&source, &target)?;
                        let transform = derived.transform().cloned().ok_or_else(|| {
                            ReferencingError::invalid_definition(format!("转换 {code} 无法推导变换"))
                        })?;
                        OperationBuilder::conversion(object, method, parameters)
                            .crs(source, target)
                            .transform(transform)
                    }
                    (None, Some(_)) => {
                        return Err(ReferencingError::missing_field(code.to_string(), "SOURCE_CRS_CODE"))
                    }
                    (Some(_), None) => {
                        return Err(ReferencingError::missing_field(code.to_string(), "TARGET_CRS_CODE"))
                    }
                }
            }
            "transformation" => {
                let (source, target) = require_pair(code, source, target)?;
                let method_code = method_code()?;
                if ![GEOCENTRIC_TRANSLATIONS, POSITION_VECTOR, COORDINATE_FRAME].contains(&method_code) {
                    return Err(ReferencingError::invalid_definition(format!(
                        "变换 {code} 使用的方法 {method_code} 不受支持"
                    )));
                }
                let parameters = self.parameters(code, method_code)?;
                let method = self.method(method_code, source.dimension(), target.dimension())?;
                let shift = bursa_wolf(&parameters, method_code)?;
                let transform = geodetic_transform(&source, &target, Some(&shift.to_matrix()))?;
                let mut builder = OperationBuilder::transformation(object, method, parameters)
                    .crs(source, target)
                    .transform(transform);
                if let Some(accuracy) = row.accuracy {
                    builder = builder.accuracy(PositionalAccuracy::metres(accuracy));
                }
                builder.accuracy(PositionalAccuracy::DatumShiftApplied)
            }
            "concatenated operation" => {
                let (source, target) = require_pair(code, source, target)?;
                let steps = self.path(code, &source, &target)?;
                let mut builder = OperationBuilder::concatenated(object, steps).crs(source, target);
                if let Some(accuracy) = row.accuracy {
                    builder = builder.accuracy(PositionalAccuracy::metres(accuracy));
                }
                builder
            }
            other => {
                return Err(ReferencingError::invalid_definition(format!(
                    "操作 {code} 的类型 \"{other}\" 未知"
                )))
            }
        };
        builder
            .version(row.version)
            .valid_area(valid_area)
            .scope(row.scope)
            .build()
    }

    /// 串联操作的步骤；方向与前一步不衔接的步骤自动求逆
    fn path(
        &mut self,
        code: i64,
        source: &SharedCrs,
        target: &SharedCrs,
    ) -> ReferencingResult<Vec<Arc<CoordinateOperation>>> {
        let step_codes: Vec<i64> = self.query(QueryPurpose::OperationPath, [code], |r| r.get(0))?;
        let mut steps = Vec::with_capacity(step_codes.len());
        let mut current = source.clone();
        for step_code in step_codes {
            let step = self.operation(step_code)?;
            let follows = |crs: Option<&SharedCrs>| {
                crs.is_some_and(|c| arc_equals(c, &current, ComparisonMode::IgnoreMetadata))
            };
            let step = if follows(step.source_crs()) {
                step
            } else if follows(step.target_crs()) {
                debug!(code, step = step_code, "串联步骤方向相反，求逆");
                Arc::new(step.inverse()?)
            } else {
                return Err(ReferencingError::invalid_definition(format!(
                    "串联操作 {code} 的步骤 {step_code} 与前一步不衔接"
                )));
            };
            current = step.target_crs().cloned().ok_or_else(|| {
                ReferencingError::invalid_definition(format!("串联操作 {code} 的步骤 {step_code} 没有目标 CRS"))
            })?;
            steps.push(step);
        }
        if !arc_equals(&current, target, ComparisonMode::IgnoreMetadata) {
            return Err(ReferencingError::invalid_definition(format!(
                "串联操作 {code} 的最后一步不以 \"{}\" 结束",
                target.name()
            )));
        }
        Ok(steps)
    }

    fn dispatch(&mut self, kind: ObjectKind, code: i64) -> ReferencingResult<AuthorityObject> {
        Ok(match kind {
            ObjectKind::Unit => AuthorityObject::Unit(self.unit(code)?),
            ObjectKind::Ellipsoid => AuthorityObject::Ellipsoid(self.ellipsoid(code)?),
            ObjectKind::PrimeMeridian => AuthorityObject::PrimeMeridian(self.prime_meridian(code)?),
            ObjectKind::Datum => AuthorityObject::Datum(self.datum(code)?),
            ObjectKind::CoordinateSystem => AuthorityObject::CoordinateSystem(self.coordinate_system(code)?),
            ObjectKind::Crs => AuthorityObject::Crs(self.crs(code)?),
            ObjectKind::Operation => AuthorityObject::Operation(self.operation(code)?),
        })
    }
}

fn unit_kind(code: i64, text: Option<&str>) -> ReferencingResult<UnitKind> {
    match text.map(str::to_ascii_lowercase).as_deref() {
        Some("length") => Ok(UnitKind::Linear),
        Some("angle") => Ok(UnitKind::Angular),
        Some("scale") => Ok(UnitKind::Scale),
        Some("time") => Ok(UnitKind::Time),
        Some(other) => Err(ReferencingError::invalid_definition(format!(
            "单位 {code} 的类型 \"{other}\" 未知"
        ))),
        None => Err(ReferencingError::missing_field(code.to_string(), "UNIT_OF_MEAS_TYPE")),
    }
}

fn require_pair(
    code: i64,
    source: Option<SharedCrs>,
    target: Option<SharedCrs>,
) -> ReferencingResult<(SharedCrs, SharedCrs)> {
    let source = source.ok_or_else(|| ReferencingError::missing_field(code.to_string(), "SOURCE_CRS_CODE"))?;
    let target = target.ok_or_else(|| ReferencingError::missing_field(code.to_string(), "TARGET_CRS_CODE"))?;
    Ok((source, target))
}

/// 参数组转为位置矢量约定的 Bursa-Wolf 参数
fn bursa_wolf(parameters: &ParameterValueGroup, method: i64) -> ReferencingResult<BursaWolfParameters> {
    let metre = Unit::metre();
    let mut bw = BursaWolfParameters::translation(
        "World Geodetic System 1984",
        parameters.require(X_TRANSLATION, &metre)?,
        parameters.require(Y_TRANSLATION, &metre)?,
        parameters.require(Z_TRANSLATION, &metre)?,
    );
    if method != GEOCENTRIC_TRANSLATIONS {
        let second = Unit::arc_second();
        bw.ex = parameters.require(X_ROTATION, &second)?;
        bw.ey = parameters.require(Y_ROTATION, &second)?;
        bw.ez = parameters.require(Z_ROTATION, &second)?;
        bw.ppm = parameters.require(SCALE_DIFFERENCE, &Unit::parts_per_million())?;
        if method == COORDINATE_FRAME {
            bw.ex = -bw.ex;
            bw.ey = -bw.ey;
            bw.ez = -bw.ez;
        }
    }
    Ok(bw)
}

// ============================================================================
// 工厂
// ============================================================================

/// EPSG 权威工厂
pub struct EpsgFactory {
    state: Mutex<FactoryState>,
}

impl EpsgFactory {
    /// 使用已打开的连接
    pub fn new(connection: Connection, dialect: Box<dyn SqlDialect>) -> Self {
        connection.set_prepared_statement_cache_capacity(STATEMENT_CACHE_CAPACITY);
        debug!(dialect = dialect.name(), "创建 EPSG 权威工厂");
        Self {
            state: Mutex::new(FactoryState {
                authority: "EPSG".to_string(),
                conn: Some(connection),
                dialect,
                queries: HashMap::new(),
                pool: ObjectPool::default(),
                namespaces: HashMap::new(),
                last_kind: None,
                standalone: StandaloneOperationFactory::new(),
            }),
        }
    }

    /// 按连接地址与驱动打开；文件不存在或缺少必需的表时失败
    pub fn open(url: &str, driver: &str) -> ReferencingResult<Self> {
        let dialect = dialect_for_driver(driver)?;
        let connection = Connection::open_with_flags(
            url,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        let factory = Self::new(connection, dialect);
        factory.check_schema()?;
        info!(url, driver, "已连接权威库");
        Ok(factory)
    }

    /// 内存库，装入内置数据
    pub fn in_memory() -> ReferencingResult<Self> {
        let connection = Connection::open_in_memory()?;
        EpsgDatabase::install(&connection, &BracketDialect)?;
        Ok(Self::new(connection, Box::new(BracketDialect)))
    }

    fn check_schema(&self) -> ReferencingResult<()> {
        let mut state = self.state.lock();
        for kind in ObjectKind::ALL {
            state.query(QueryPurpose::Exists(kind), [0_i64], |_| Ok(()))?;
        }
        Ok(())
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut FactoryState) -> ReferencingResult<T>) -> ReferencingResult<T> {
        let mut state = self.state.lock();
        f(&mut state)
    }

    /// 当前方言
    pub fn dialect_name(&self) -> &'static str {
        self.state.lock().dialect.name()
    }

    /// 计量单位
    pub fn create_unit(&self, code: &str) -> ReferencingResult<Arc<Unit>> {
        self.with_state(|s| {
            let code = s.resolve(ObjectKind::Unit, code)?;
            s.unit(code)
        })
    }

    /// 椭球体
    pub fn create_ellipsoid(&self, code: &str) -> ReferencingResult<Arc<Ellipsoid>> {
        self.with_state(|s| {
            let code = s.resolve(ObjectKind::Ellipsoid, code)?;
            s.ellipsoid(code)
        })
    }

    /// 本初子午线
    pub fn create_prime_meridian(&self, code: &str) -> ReferencingResult<Arc<PrimeMeridian>> {
        self.with_state(|s| {
            let code = s.resolve(ObjectKind::PrimeMeridian, code)?;
            s.prime_meridian(code)
        })
    }

    /// 基准面
    pub fn create_datum(&self, code: &str) -> ReferencingResult<Arc<Datum>> {
        self.with_state(|s| {
            let code = s.resolve(ObjectKind::Datum, code)?;
            s.datum(code)
        })
    }

    /// 坐标系
    pub fn create_coordinate_system(&self, code: &str) -> ReferencingResult<Arc<CoordinateSystem>> {
        self.with_state(|s| {
            let code = s.resolve(ObjectKind::CoordinateSystem, code)?;
            s.coordinate_system(code)
        })
    }

    /// 坐标参考系统
    pub fn create_coordinate_reference_system(&self, code: &str) -> ReferencingResult<SharedCrs> {
        self.with_state(|s| {
            let code = s.resolve(ObjectKind::Crs, code)?;
            s.crs(code)
        })
    }

    /// 坐标操作
    pub fn create_coordinate_operation(&self, code: &str) -> ReferencingResult<Arc<CoordinateOperation>> {
        self.with_state(|s| {
            let code = s.resolve(ObjectKind::Operation, code)?;
            s.operation(code)
        })
    }

    /// 类别未知的代码：依次探测 CRS、坐标系、基准面、椭球体、本初子午线，
    /// 上次命中的类别优先
    pub fn create_object(&self, code: &str) -> ReferencingResult<AuthorityObject> {
        self.with_state(|s| {
            let mut order = ObjectKind::LOOKUP_ORDER.to_vec();
            if let Some(last) = s.last_kind {
                order.retain(|k| *k != last);
                order.insert(0, last);
            }
            for kind in order {
                let numeric = match s.resolve(kind, code) {
                    Ok(numeric) => numeric,
                    Err(err) if err.is_no_such_code() => continue,
                    Err(err) => return Err(err),
                };
                if s.exists(kind, numeric)? {
                    trace!(code, ?kind, "探测命中");
                    s.last_kind = Some(kind);
                    return s.dispatch(kind, numeric);
                }
            }
            Err(ReferencingError::no_such_code(s.authority.clone(), code.trim(), "对象"))
        })
    }

    /// 某类对象的全部代码
    pub fn authority_codes(&self, kind: ObjectKind) -> ReferencingResult<Vec<String>> {
        self.with_state(|s| {
            let codes: Vec<i64> = s.query(QueryPurpose::Codes(kind), [], |r| r.get(0))?;
            Ok(codes.into_iter().map(|c| c.to_string()).collect())
        })
    }

    /// 代码对应的对象名称，任意类别
    pub fn description_text(&self, code: &str) -> ReferencingResult<String> {
        self.with_state(|s| {
            for kind in ObjectKind::ALL {
                let numeric = match s.resolve(kind, code) {
                    Ok(numeric) => numeric,
                    Err(err) if err.is_no_such_code() => continue,
                    Err(err) => return Err(err),
                };
                let names: Vec<String> = s.query(QueryPurpose::Name(kind), [numeric], |r| r.get(0))?;
                if let Some(name) = names.into_iter().next() {
                    return Ok(name);
                }
            }
            Err(ReferencingError::no_such_code(s.authority.clone(), code.trim(), "对象"))
        })
    }

    /// 释放连接与缓存；之后的查询报告 `FactoryFailure`
    pub fn dispose(&self) {
        let mut state = self.state.lock();
        let Some(connection) = state.conn.take() else {
            return;
        };
        state.queries.clear();
        state.pool = ObjectPool::default();
        state.namespaces.clear();
        state.last_kind = None;
        match connection.close() {
            Ok(()) => info!("EPSG 权威工厂已释放"),
            Err((_, err)) => warn!(error = %err, "关闭权威库连接失败"),
        }
    }
}

impl OperationAuthorityFactory for EpsgFactory {
    fn authority(&self) -> &str {
        "EPSG"
    }

    fn create_from_crs_codes(&self, source: &str, target: &str) -> ReferencingResult<Vec<Arc<CoordinateOperation>>> {
        self.with_state(|s| {
            let source = s.resolve(ObjectKind::Crs, source)?;
            let target = s.resolve(ObjectKind::Crs, target)?;
            s.crs(source)?;
            s.crs(target)?;
            let codes: Vec<i64> = s.query(QueryPurpose::OperationsBetween, params![source, target], |r| r.get(0))?;
            let mut operations = Vec::with_capacity(codes.len());
            for code in codes {
                match s.operation(code) {
                    Ok(op) => operations.push(op),
                    Err(
                        err @ (ReferencingError::InvalidDefinition { .. }
                        | ReferencingError::OperationNotFound { .. }
                        | ReferencingError::MismatchedDimension { .. }
                        | ReferencingError::TransformFailed { .. }),
                    ) => warn!(code, error = %err, "跳过无法构造的候选操作"),
                    Err(err) => return Err(err),
                }
            }
            debug!(source, target, count = operations.len(), "权威库候选操作");
            Ok(operations)
        })
    }

    fn is_available(&self) -> bool {
        let state = self.state.lock();
        state
            .conn
            .as_ref()
            .is_some_and(|c| c.query_row("SELECT 1", [], |_| Ok(())).is_ok())
    }
}

impl Drop for EpsgFactory {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::dialect::AnsiDialect;
    use crate::crs::CrsKind;

    fn factory() -> EpsgFactory {
        EpsgFactory::in_memory().unwrap()
    }

    /// 空表结构上的工厂，由测试自行插入数据
    fn empty() -> (EpsgFactory, Connection, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("epsg.db");
        let conn = Connection::open(&path).unwrap();
        EpsgDatabase::install_schema(&conn, &BracketDialect).unwrap();
        let factory = EpsgFactory::new(Connection::open(&path).unwrap(), Box::new(BracketDialect));
        (factory, conn, dir)
    }

    #[test]
    fn test_create_wgs84() {
        let factory = factory();
        let crs = factory.create_coordinate_reference_system("4326").unwrap();
        assert_eq!(crs.name(), "WGS 84");
        assert_eq!(crs.dimension(), 2);
        let datum = crs.datum().unwrap();
        assert!(datum.is_wgs84());
        assert!(datum.to_wgs84().is_empty());
        assert!(crs.domain.is_some());
    }

    /// 测试同一代码返回同一实例
    #[test]
    fn test_identity_pool() {
        let factory = factory();
        let a = factory.create_coordinate_reference_system("EPSG:4326").unwrap();
        let b = factory.create_coordinate_reference_system(" epsg : 4326 ").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        let etrs = factory.create_coordinate_reference_system("4258").unwrap();
        let unit = |crs: &SharedCrs| crs.coordinate_system().unwrap().axes[0].unit.clone();
        assert!(Arc::ptr_eq(&unit(&a), &unit(&etrs)));
    }

    #[test]
    fn test_unknown_code() {
        let err = factory().create_ellipsoid("1").unwrap_err();
        assert!(err.is_no_such_code());
        let err = factory().create_coordinate_reference_system("ESRI:4326").unwrap_err();
        assert!(err.is_no_such_code());
    }

    #[test]
    fn test_lookup_by_name() {
        let factory = factory();
        let ellipsoid = factory.create_ellipsoid("clarke 1866").unwrap();
        assert!((ellipsoid.semi_minor_in_metres() - 6_356_583.8).abs() < 1e-6);
    }

    /// 测试派生单位沿换算链解析
    #[test]
    fn test_derived_unit_chain() {
        let factory = factory();
        let foot = factory.create_unit("9003").unwrap();
        assert!((foot.to_si - 12.0 / 39.37).abs() < 1e-12);
        let km = factory.create_unit("9036").unwrap();
        assert!(Arc::ptr_eq(km.base.as_ref().unwrap(), &factory.create_unit("9001").unwrap()));
        assert_eq!(factory.create_unit("Kilometre").unwrap().to_si, 1000.0);
    }

    #[test]
    fn test_datum_to_wgs84_from_operations() {
        let factory = factory();
        let datum = factory.create_datum("6284").unwrap();
        let bw = &datum.to_wgs84()[0];
        assert_eq!((bw.dx, bw.dy, bw.dz), (28.0, -130.0, -95.0));

        let osgb = factory.create_datum("6277").unwrap();
        let bw = &osgb.to_wgs84()[0];
        assert!((bw.ez - 0.842).abs() < 1e-12);
        assert!((bw.ppm + 20.489).abs() < 1e-12);
    }

    #[test]
    fn test_paris_prime_meridian_in_grads() {
        let pm = factory().create_prime_meridian("8903").unwrap();
        assert!((pm.greenwich_longitude_degrees() - 2.337_229_17).abs() < 1e-6);
    }

    #[test]
    fn test_projected_crs() {
        let factory = factory();
        let utm = factory.create_coordinate_reference_system("32650").unwrap();
        let CrsKind::Projected { base, conversion, .. } = &utm.kind else {
            panic!("应为投影 CRS");
        };
        assert!(Arc::ptr_eq(base, &factory.create_coordinate_reference_system("4326").unwrap()));
        assert!(conversion.is_defining());
        assert_eq!(conversion.parameters().unwrap().values.len(), 5);
    }

    #[test]
    fn test_compound_crs() {
        let crs = factory().create_coordinate_reference_system("9705").unwrap();
        assert_eq!(crs.components().len(), 2);
        assert_eq!(crs.dimension(), 3);
    }

    /// 测试串联操作中方向相反的步骤被求逆
    #[test]
    fn test_concatenated_operation_reverses_step() {
        let factory = factory();
        let op = factory.create_coordinate_operation("9990").unwrap();
        let steps = op.steps();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1].source_crs().unwrap().name(), "WGS 84");
        assert_eq!(steps[1].target_crs().unwrap().name(), "ETRS89");
    }

    #[test]
    fn test_create_object_tries_each_kind() {
        let factory = factory();
        assert!(matches!(factory.create_object("4326").unwrap(), AuthorityObject::Crs(_)));
        assert!(matches!(factory.create_object("7030").unwrap(), AuthorityObject::Ellipsoid(_)));
        assert!(matches!(factory.create_object("6422").unwrap(), AuthorityObject::CoordinateSystem(_)));
        assert!(factory.create_object("123456").unwrap_err().is_no_such_code());
    }

    #[test]
    fn test_description_and_codes() {
        let factory = factory();
        assert_eq!(factory.description_text("EPSG:3857").unwrap(), "WGS 84 / Pseudo-Mercator");
        let codes = factory.authority_codes(ObjectKind::PrimeMeridian).unwrap();
        assert_eq!(codes, vec!["8901".to_string(), "8903".to_string()]);
    }

    #[test]
    fn test_operations_between_codes() {
        let factory = factory();
        let ops = factory.create_from_crs_codes("4267", "4326").unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].name(), "NAD27 to WGS 84 (4)");
        assert!(factory.create_from_crs_codes("4326", "3857").unwrap().is_empty());
        assert!(factory.create_from_crs_codes("4326", "999999").unwrap_err().is_no_such_code());
    }

    /// 测试同一代码两行定义不一致
    #[test]
    fn test_duplicate_definition() {
        let (factory, conn, _dir) = empty();
        conn.execute_batch(
            "INSERT INTO [Unit of Measure] VALUES (9001, 'metre', 'length', 9001, 1, 1, NULL);
             INSERT INTO [Ellipsoid] VALUES (7030, 'WGS 84', 6378137, 9001, 298.257223563, NULL, NULL);
             INSERT INTO [Ellipsoid] VALUES (7030, 'WGS 84', 6378137, 9001, 300, NULL, NULL);",
        )
        .unwrap();
        let err = factory.create_ellipsoid("7030").unwrap_err();
        assert!(matches!(err, ReferencingError::DuplicateDefinition { .. }));
    }

    #[test]
    fn test_consistent_duplicates_are_accepted() {
        let (factory, conn, _dir) = empty();
        conn.execute_batch(
            "INSERT INTO [Prime Meridian] VALUES (8901, 'Greenwich', 0, 9102, NULL);
             INSERT INTO [Prime Meridian] VALUES (8901, 'Greenwich', 0, 9102, 'copy');",
        )
        .unwrap();
        assert_eq!(factory.create_prime_meridian("8901").unwrap().name(), "Greenwich");
    }

    #[test]
    fn test_missing_required_field() {
        let (factory, conn, _dir) = empty();
        conn.execute_batch("INSERT INTO [Ellipsoid] VALUES (7001, 'Broken', NULL, 9001, 299, NULL, NULL);")
            .unwrap();
        let err = factory.create_ellipsoid("7001").unwrap_err();
        assert!(matches!(err, ReferencingError::MissingRequiredField { field: "SEMI_MAJOR_AXIS", .. }));
    }

    #[test]
    fn test_ansi_dialect_factory() {
        let conn = Connection::open_in_memory().unwrap();
        EpsgDatabase::install(&conn, &AnsiDialect::default()).unwrap();
        let factory = EpsgFactory::new(conn, Box::new(AnsiDialect::default()));
        let crs = factory.create_coordinate_reference_system("4277").unwrap();
        assert_eq!(crs.name(), "OSGB 1936");
        assert_eq!(factory.dialect_name(), "ansi");
    }

    #[test]
    fn test_dispose() {
        let factory = factory();
        assert!(factory.is_available());
        factory.dispose();
        assert!(!factory.is_available());
        let err = factory.create_unit("9001").unwrap_err();
        assert!(matches!(err, ReferencingError::FactoryFailure { .. }));
    }

    #[test]
    fn test_open_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.db");
        assert!(EpsgFactory::open(path.to_str().unwrap(), "sqlite").is_err());
    }
}
