// crates/gr_referencing/src/authority/mod.rs

//! 权威工厂
//!
//! 从关系型权威库（EPSG 表结构）按代码构造参照对象：
//!
//! - [`dialect`]：可移植 SQL 到具体后端的改写
//! - [`queries`]：按用途组织的查询目录
//! - [`database`]：随库发布的 EPSG 子集
//! - [`epsg`]：带身份池的 EPSG 工厂

pub mod database;
pub mod dialect;
pub mod epsg;
pub mod queries;

pub use database::EpsgDatabase;
pub use dialect::{dialect_for_driver, AnsiDialect, BracketDialect, SqlDialect};
pub use epsg::EpsgFactory;
pub use queries::{ObjectKind, QueryPurpose};

use std::fmt;
use std::sync::Arc;

use crate::crs::CoordinateReferenceSystem;
use crate::cs::CoordinateSystem;
use crate::datum::Datum;
use crate::ellipsoid::Ellipsoid;
use crate::identified::IdentifiedObject;
use crate::metadata::Describe;
use crate::operation::CoordinateOperation;
use crate::prime_meridian::PrimeMeridian;
use crate::unit::Unit;
use crate::wkt::{ToWkt, WktElement};

/// 按代码探测得到的对象
#[derive(Debug, Clone)]
pub enum AuthorityObject {
    /// 坐标参考系统
    Crs(Arc<CoordinateReferenceSystem>),
    /// 坐标系
    CoordinateSystem(Arc<CoordinateSystem>),
    /// 基准面
    Datum(Arc<Datum>),
    /// 椭球体
    Ellipsoid(Arc<Ellipsoid>),
    /// 本初子午线
    PrimeMeridian(Arc<PrimeMeridian>),
    /// 计量单位
    Unit(Arc<Unit>),
    /// 坐标操作
    Operation(Arc<CoordinateOperation>),
}

impl AuthorityObject {
    /// 类别
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Crs(_) => ObjectKind::Crs,
            Self::CoordinateSystem(_) => ObjectKind::CoordinateSystem,
            Self::Datum(_) => ObjectKind::Datum,
            Self::Ellipsoid(_) => ObjectKind::Ellipsoid,
            Self::PrimeMeridian(_) => ObjectKind::PrimeMeridian,
            Self::Unit(_) => ObjectKind::Unit,
            Self::Operation(_) => ObjectKind::Operation,
        }
    }

    /// 元数据
    pub fn object(&self) -> &IdentifiedObject {
        match self {
            Self::Crs(v) => &v.object,
            Self::CoordinateSystem(v) => &v.object,
            Self::Datum(v) => &v.object,
            Self::Ellipsoid(v) => &v.object,
            Self::PrimeMeridian(v) => &v.object,
            Self::Unit(v) => &v.object,
            Self::Operation(v) => &v.object,
        }
    }

    /// 名称
    pub fn name(&self) -> &str {
        &self.object().name
    }

    /// 属性表
    pub fn describe(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Crs(v) => v.describe(),
            Self::CoordinateSystem(v) => v.describe(),
            Self::Datum(v) => v.describe(),
            Self::Ellipsoid(v) => v.describe(),
            Self::PrimeMeridian(v) => v.describe(),
            Self::Unit(v) => v.describe(),
            Self::Operation(v) => v.describe(),
        }
    }
}

impl ToWkt for AuthorityObject {
    fn wkt_element(&self) -> WktElement {
        match self {
            Self::Crs(v) => v.wkt_element(),
            Self::CoordinateSystem(v) => v.wkt_element(),
            Self::Datum(v) => v.wkt_element(),
            Self::Ellipsoid(v) => v.wkt_element(),
            Self::PrimeMeridian(v) => v.wkt_element(),
            Self::Unit(v) => v.wkt_element(),
            Self::Operation(v) => v.wkt_element(),
        }
    }
}

impl fmt::Display for AuthorityObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}（{}）", self.name(), self.kind().label())
    }
}
