// crates/gr_referencing/src/operation/factory.rs

//! 坐标操作工厂接口

use std::sync::Arc;

use super::CoordinateOperation;
use crate::crs::CoordinateReferenceSystem;
use crate::error::ReferencingResult;

/// 坐标操作工厂
///
/// 实现必须可以跨线程共享；缓存层与权威层都以本 trait 组合。
pub trait CoordinateOperationFactory: Send + Sync {
    /// 创建从 `source` 到 `target` 的操作
    ///
    /// 返回操作的源/目标 CRS 与请求的一对在忽略元数据时相等。
    fn create_operation(
        &self,
        source: &Arc<CoordinateReferenceSystem>,
        target: &Arc<CoordinateReferenceSystem>,
    ) -> ReferencingResult<Arc<CoordinateOperation>>;

    /// 工厂当前是否可用
    fn is_available(&self) -> bool {
        true
    }
}

impl<T: CoordinateOperationFactory + ?Sized> CoordinateOperationFactory for Arc<T> {
    fn create_operation(
        &self,
        source: &Arc<CoordinateReferenceSystem>,
        target: &Arc<CoordinateReferenceSystem>,
    ) -> ReferencingResult<Arc<CoordinateOperation>> {
        (**self).create_operation(source, target)
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}

impl<T: CoordinateOperationFactory + ?Sized> CoordinateOperationFactory for Box<T> {
    fn create_operation(
        &self,
        source: &Arc<CoordinateReferenceSystem>,
        target: &Arc<CoordinateReferenceSystem>,
    ) -> ReferencingResult<Arc<CoordinateOperation>> {
        (**self).create_operation(source, target)
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}

/// 按权威代码查询坐标操作
pub trait OperationAuthorityFactory: Send + Sync {
    /// 权威机构名称，例如 `"EPSG"`
    fn authority(&self) -> &str;

    /// 按源/目标 CRS 代码列出候选操作，按权威库的偏好排序
    ///
    /// 代码未知时返回 [`ReferencingError::NoSuchAuthorityCode`](crate::error::ReferencingError::NoSuchAuthorityCode)，
    /// 没有候选时返回空列表。
    fn create_from_crs_codes(
        &self,
        source_code: &str,
        target_code: &str,
    ) -> ReferencingResult<Vec<Arc<CoordinateOperation>>>;

    /// 后端是否可用
    fn is_available(&self) -> bool;
}

impl<T: OperationAuthorityFactory + ?Sized> OperationAuthorityFactory for Arc<T> {
    fn authority(&self) -> &str {
        (**self).authority()
    }

    fn create_from_crs_codes(
        &self,
        source_code: &str,
        target_code: &str,
    ) -> ReferencingResult<Vec<Arc<CoordinateOperation>>> {
        (**self).create_from_crs_codes(source_code, target_code)
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}
