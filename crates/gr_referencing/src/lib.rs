// crates/gr_referencing/src/lib.rs

//! GeoRef 坐标参考
//!
//! 坐标参考系统（CRS）的对象模型、按权威代码解析 CRS 的工厂，
//! 以及在两个 CRS 之间推导坐标操作的工厂。
//!
//! # 模块概览
//!
//! - 对象模型：[`unit`]、[`ellipsoid`]、[`prime_meridian`]、[`datum`]、[`cs`]、[`crs`]
//! - 元数据：[`identified`]、[`metadata`]、[`extent`]、[`parameter`]
//! - 数学变换：[`transform`]
//! - 坐标操作及其工厂：[`operation`]
//! - 权威库：[`authority`]
//! - 几何与包络变换：[`geometry`]
//! - 输出：[`wkt`]
//!
//! # 示例
//!
//! ```
//! use std::sync::Arc;
//! use gr_referencing::prelude::*;
//!
//! let epsg = Arc::new(EpsgFactory::in_memory().unwrap());
//! let wgs84 = epsg.create_coordinate_reference_system("EPSG:4326").unwrap();
//! let utm = epsg.create_coordinate_reference_system("EPSG:32650").unwrap();
//!
//! let factory = AuthorityBackedFactory::new(epsg.clone(), StandaloneOperationFactory::new());
//! let op = factory.create_operation(&wgs84, &utm).unwrap();
//! let xy = op.transform().unwrap().apply(&[40.0, 116.0]).unwrap();
//! assert!((xy[0] - 414_639.538).abs() < 1e-2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod authority;
pub mod crs;
pub mod cs;
pub mod datum;
pub mod ellipsoid;
pub mod error;
pub mod extent;
pub mod geometry;
pub mod identified;
pub mod metadata;
pub mod operation;
pub mod parameter;
pub mod prime_meridian;
pub mod transform;
pub mod unit;
pub mod wkt;

pub use error::{ReferencingError, ReferencingResult};

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::authority::{AuthorityObject, EpsgDatabase, EpsgFactory, ObjectKind};
    pub use crate::crs::{CoordinateReferenceSystem, CrsKind};
    pub use crate::cs::{AxisDirection, CoordinateSystem, CoordinateSystemAxis, CsKind};
    pub use crate::datum::{BursaWolfParameters, Datum};
    pub use crate::ellipsoid::Ellipsoid;
    pub use crate::error::{ReferencingError, ReferencingResult};
    pub use crate::extent::Extent;
    pub use crate::geometry::{BoundingBox, Envelope};
    pub use crate::identified::{Comparable, ComparisonMode, IdentifiedObject, Identifier};
    pub use crate::metadata::Describe;
    pub use crate::operation::{
        AuthorityBackedFactory, BufferedOperationFactory, CachingOperationFactory, CoordinateOperation,
        CoordinateOperationFactory, OperationAuthorityFactory, StandaloneOperationFactory,
    };
    pub use crate::prime_meridian::PrimeMeridian;
    pub use crate::transform::{MathTransform, SharedTransform};
    pub use crate::unit::{Unit, UnitKind};
    pub use crate::wkt::ToWkt;
}
