// crates/gr_referencing/src/transform/mod.rs

//! 数学变换
//!
//! 坐标操作携带的数值映射。引擎只关心维度、逐点变换与求逆，
//! 具体的投影与基准面转换公式由本模块下的实现提供。
//!
//! # 变换类型
//!
//! - [`LinearTransform`]：n 维仿射变换（齐次矩阵）
//! - [`ConcatenatedTransform`]：两个变换的复合，相邻仿射步骤自动合并
//! - [`PassThroughTransform`]：只作用于坐标中一段连续分量的变换
//! - [`GeocentricTransform`]：地理坐标与地心坐标互转
//! - [`ProjectionTransform`]：地图投影

pub mod concatenated;
pub mod geocentric;
pub mod linear;
pub mod pass_through;
pub mod projection;

pub use concatenated::ConcatenatedTransform;
pub use geocentric::GeocentricTransform;
pub use linear::LinearTransform;
pub use pass_through::PassThroughTransform;
pub use projection::{ProjectionMethod, ProjectionParameters, ProjectionTransform};

use std::fmt;
use std::sync::Arc;

use crate::error::{ReferencingError, ReferencingResult};

/// 共享的数学变换
pub type SharedTransform = Arc<dyn MathTransform>;

/// 数学变换
pub trait MathTransform: Send + Sync + fmt::Debug {
    /// 源维度
    fn source_dimensions(&self) -> usize;

    /// 目标维度
    fn target_dimensions(&self) -> usize;

    /// 变换单个点，`src.len() == source_dimensions()`，`dst.len() == target_dimensions()`
    fn transform(&self, src: &[f64], dst: &mut [f64]) -> ReferencingResult<()>;

    /// 逆变换
    fn inverse(&self) -> ReferencingResult<SharedTransform>;

    /// 是否为恒等变换
    fn is_identity(&self) -> bool {
        false
    }

    /// 仿射形式（若本变换是仿射的）
    fn as_linear(&self) -> Option<&LinearTransform> {
        None
    }

    /// 变换名称，用于诊断输出
    fn name(&self) -> String;

    /// 变换单个点并返回新向量
    fn apply(&self, point: &[f64]) -> ReferencingResult<Vec<f64>> {
        ReferencingError::check_dimension(&self.name(), self.source_dimensions(), point.len())?;
        let mut out = vec![0.0; self.target_dimensions()];
        self.transform(point, &mut out)?;
        Ok(out)
    }

    /// 批量变换连续存放的点
    fn transform_points(&self, src: &[f64], dst: &mut [f64]) -> ReferencingResult<()> {
        let sd = self.source_dimensions();
        let td = self.target_dimensions();
        if sd == 0 || src.len() % sd != 0 || dst.len() != src.len() / sd * td {
            return Err(ReferencingError::mismatched_dimension(
                self.name(),
                src.len() / sd.max(1) * td,
                dst.len(),
            ));
        }
        for (s, d) in src.chunks_exact(sd).zip(dst.chunks_exact_mut(td)) {
            self.transform(s, d)?;
        }
        Ok(())
    }
}

/// 检查单点变换的输入输出长度
#[inline]
pub(crate) fn check_point(
    transform: &dyn MathTransform,
    src: &[f64],
    dst: &[f64],
) -> ReferencingResult<()> {
    ReferencingError::check_dimension(&transform.name(), transform.source_dimensions(), src.len())?;
    ReferencingError::check_dimension(&transform.name(), transform.target_dimensions(), dst.len())
}

/// n 维恒等变换
pub fn identity(dimension: usize) -> SharedTransform {
    Arc::new(LinearTransform::identity(dimension))
}
