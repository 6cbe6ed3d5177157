// crates/gr_referencing/src/transform/pass_through.rs

//! 透传变换
//!
//! 子变换只作用于坐标中从 `first_affected` 开始的一段分量，
//! 前后其余分量原样保留。

use std::sync::Arc;

use nalgebra::DMatrix;

use super::{check_point, LinearTransform, MathTransform, SharedTransform};
use crate::error::ReferencingResult;

/// 透传变换
#[derive(Debug, Clone)]
pub struct PassThroughTransform {
    first_affected: usize,
    num_trailing: usize,
    sub: SharedTransform,
}

impl PassThroughTransform {
    /// 创建透传变换
    ///
    /// 子变换为恒等时返回整体恒等变换，为仿射时展开为整体仿射矩阵。
    pub fn create(
        first_affected: usize,
        sub: SharedTransform,
        num_trailing: usize,
    ) -> ReferencingResult<SharedTransform> {
        if first_affected == 0 && num_trailing == 0 {
            return Ok(sub);
        }
        if sub.is_identity() {
            let dim = first_affected + sub.source_dimensions() + num_trailing;
            return Ok(Arc::new(LinearTransform::identity(dim)));
        }
        if let Some(linear) = sub.as_linear() {
            return Ok(Arc::new(expand(first_affected, linear, num_trailing)?));
        }
        Ok(Arc::new(Self {
            first_affected,
            num_trailing,
            sub,
        }))
    }

    /// 第一个受影响的分量
    pub fn first_affected(&self) -> usize {
        self.first_affected
    }

    /// 末尾保留的分量数
    pub fn num_trailing(&self) -> usize {
        self.num_trailing
    }

    /// 子变换
    pub fn sub_transform(&self) -> &SharedTransform {
        &self.sub
    }
}

fn expand(
    first: usize,
    linear: &LinearTransform,
    trailing: usize,
) -> ReferencingResult<LinearTransform> {
    let sub = linear.matrix();
    let sd = linear.source_dimensions();
    let td = linear.target_dimensions();
    let src_dim = first + sd + trailing;
    let tgt_dim = first + td + trailing;
    let mut m = DMatrix::zeros(tgt_dim + 1, src_dim + 1);
    for i in 0..first {
        m[(i, i)] = 1.0;
    }
    for i in 0..td {
        for j in 0..sd {
            m[(first + i, first + j)] = sub[(i, j)];
        }
        m[(first + i, src_dim)] = sub[(i, sd)];
    }
    for k in 0..trailing {
        m[(first + td + k, first + sd + k)] = 1.0;
    }
    m[(tgt_dim, src_dim)] = 1.0;
    LinearTransform::from_matrix(m)
}

impl MathTransform for PassThroughTransform {
    fn source_dimensions(&self) -> usize {
        self.first_affected + self.sub.source_dimensions() + self.num_trailing
    }

    fn target_dimensions(&self) -> usize {
        self.first_affected + self.sub.target_dimensions() + self.num_trailing
    }

    fn transform(&self, src: &[f64], dst: &mut [f64]) -> ReferencingResult<()> {
        check_point(self, src, dst)?;
        let first = self.first_affected;
        let sd = self.sub.source_dimensions();
        let td = self.sub.target_dimensions();
        dst[..first].copy_from_slice(&src[..first]);
        self.sub
            .transform(&src[first..first + sd], &mut dst[first..first + td])?;
        dst[first + td..].copy_from_slice(&src[first + sd..]);
        Ok(())
    }

    fn inverse(&self) -> ReferencingResult<SharedTransform> {
        Self::create(self.first_affected, self.sub.inverse()?, self.num_trailing)
    }

    fn name(&self) -> String {
        format!(
            "PassThrough({}, {}, {})",
            self.first_affected,
            self.sub.name(),
            self.num_trailing
        )
    }
}
