// crates/gr_referencing/src/transform/linear.rs

//! n 维仿射变换
//!
//! 以 `(target+1) × (source+1)` 齐次矩阵表示：
//!
//! ```text
//! | x' |   | a00 a01 t0 | | x |
//! | y' | = | a10 a11 t1 | | y |
//! | 1  |   |  0   0  1  | | 1 |
//! ```

use std::sync::Arc;

use nalgebra::DMatrix;

use super::{check_point, MathTransform, SharedTransform};
use crate::error::{ReferencingError, ReferencingResult};

/// 恒等判定阈值
const IDENTITY_TOLERANCE: f64 = 1e-10;

/// 仿射变换
#[derive(Debug, Clone, PartialEq)]
pub struct LinearTransform {
    matrix: DMatrix<f64>,
}

impl LinearTransform {
    /// 恒等变换
    pub fn identity(dimension: usize) -> Self {
        Self {
            matrix: DMatrix::identity(dimension + 1, dimension + 1),
        }
    }

    /// 从齐次矩阵创建，最后一行必须为 `[0 … 0 1]`
    pub fn from_matrix(matrix: DMatrix<f64>) -> ReferencingResult<Self> {
        let (rows, cols) = matrix.shape();
        if rows < 1 || cols < 1 {
            return Err(ReferencingError::invalid_definition("仿射矩阵不能为空"));
        }
        let last = rows - 1;
        for j in 0..cols {
            let expected = if j == cols - 1 { 1.0 } else { 0.0 };
            if matrix[(last, j)] != expected {
                return Err(ReferencingError::invalid_definition(
                    "仿射矩阵最后一行必须为 [0 … 0 1]",
                ));
            }
        }
        Ok(Self { matrix })
    }

    /// 平移变换
    pub fn translation(offsets: &[f64]) -> Self {
        let n = offsets.len();
        let mut matrix = DMatrix::identity(n + 1, n + 1);
        for (i, t) in offsets.iter().enumerate() {
            matrix[(i, n)] = *t;
        }
        Self { matrix }
    }

    /// 各轴缩放
    pub fn scale(factors: &[f64]) -> Self {
        let n = factors.len();
        let mut matrix = DMatrix::identity(n + 1, n + 1);
        for (i, s) in factors.iter().enumerate() {
            matrix[(i, i)] = *s;
        }
        Self { matrix }
    }

    /// 齐次矩阵
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    /// 组合两个变换：先应用 `first`，再应用 `self`
    pub fn compose(&self, first: &LinearTransform) -> ReferencingResult<Self> {
        ReferencingError::check_dimension(
            "仿射变换组合",
            self.source_dimensions(),
            first.target_dimensions(),
        )?;
        Ok(Self {
            matrix: &self.matrix * &first.matrix,
        })
    }

    /// 计算逆变换
    ///
    /// 非方阵（维度增减）使用线性部分的伪逆，
    /// 被丢弃的维度在逆变换中补零。
    pub fn inverse_linear(&self) -> ReferencingResult<Self> {
        let (rows, cols) = self.matrix.shape();
        if rows == cols {
            let inverse = self.matrix.clone().try_inverse().ok_or_else(|| {
                ReferencingError::transform_failed("矩阵求逆", "仿射矩阵奇异（行列式接近零）")
            })?;
            return Ok(Self { matrix: inverse });
        }
        let td = rows - 1;
        let sd = cols - 1;
        let linear = self.matrix.view((0, 0), (td, sd)).into_owned();
        let offset = self.matrix.view((0, sd), (td, 1)).into_owned();
        let pinv = linear
            .pseudo_inverse(1e-12)
            .map_err(|e| ReferencingError::transform_failed("矩阵伪逆", e))?;
        let back = -(&pinv * offset);
        let mut matrix = DMatrix::zeros(sd + 1, td + 1);
        matrix.view_mut((0, 0), (sd, td)).copy_from(&pinv);
        matrix.view_mut((0, td), (sd, 1)).copy_from(&back);
        matrix[(sd, td)] = 1.0;
        Ok(Self { matrix })
    }
}

impl MathTransform for LinearTransform {
    fn source_dimensions(&self) -> usize {
        self.matrix.ncols() - 1
    }

    fn target_dimensions(&self) -> usize {
        self.matrix.nrows() - 1
    }

    fn transform(&self, src: &[f64], dst: &mut [f64]) -> ReferencingResult<()> {
        check_point(self, src, dst)?;
        let sd = self.source_dimensions();
        for (i, out) in dst.iter_mut().enumerate() {
            let mut sum = self.matrix[(i, sd)];
            for (j, x) in src.iter().enumerate() {
                let m = self.matrix[(i, j)];
                // 零系数不参与计算，避免 0 × ∞ 产生 NaN
                if m != 0.0 {
                    sum += m * x;
                }
            }
            *out = sum;
        }
        Ok(())
    }

    fn inverse(&self) -> ReferencingResult<SharedTransform> {
        Ok(Arc::new(self.inverse_linear()?))
    }

    fn is_identity(&self) -> bool {
        let (rows, cols) = self.matrix.shape();
        if rows != cols {
            return false;
        }
        self.matrix.iter().enumerate().all(|(k, v)| {
            // 列主序：k = j * rows + i
            let (i, j) = (k % rows, k / rows);
            let expected = if i == j { 1.0 } else { 0.0 };
            (v - expected).abs() < IDENTITY_TOLERANCE
        })
    }

    fn as_linear(&self) -> Option<&LinearTransform> {
        Some(self)
    }

    fn name(&self) -> String {
        format!(
            "Affine({}→{})",
            self.source_dimensions(),
            self.target_dimensions()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let t = LinearTransform::identity(2);
        assert!(t.is_identity());
        assert_eq!(t.apply(&[3.0, 4.0]).unwrap(), vec![3.0, 4.0]);
    }

    #[test]
    fn test_compose_and_inverse() {
        let scale = LinearTransform::scale(&[2.0, 3.0]);
        let shift = LinearTransform::translation(&[10.0, -5.0]);
        let combined = shift.compose(&scale).unwrap();
        let p = combined.apply(&[1.0, 1.0]).unwrap();
        assert_eq!(p, vec![12.0, -2.0]);

        let inverse = combined.inverse().unwrap();
        let q = inverse.apply(&p).unwrap();
        assert!((q[0] - 1.0).abs() < 1e-12);
        assert!((q[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_singular_inverse_fails() {
        let t = LinearTransform::scale(&[0.0, 1.0]);
        assert!(matches!(
            t.inverse_linear(),
            Err(ReferencingError::TransformFailed { .. })
        ));
    }

    /// 测试丢弃高程的变换的逆在高程上补零
    #[test]
    fn test_dimension_drop_inverse() {
        let mut m = DMatrix::zeros(3, 4);
        m[(0, 0)] = 1.0;
        m[(1, 1)] = 1.0;
        m[(2, 3)] = 1.0;
        let drop = LinearTransform::from_matrix(m).unwrap();
        assert_eq!(drop.apply(&[1.0, 2.0, 3.0]).unwrap(), vec![1.0, 2.0]);

        let add = drop.inverse().unwrap();
        assert_eq!(add.source_dimensions(), 2);
        assert_eq!(add.target_dimensions(), 3);
        let p = add.apply(&[1.0, 2.0]).unwrap();
        assert!((p[0] - 1.0).abs() < 1e-12);
        assert!((p[1] - 2.0).abs() < 1e-12);
        assert!(p[2].abs() < 1e-12);
    }

    #[test]
    fn test_bad_last_row() {
        let m = DMatrix::from_element(3, 3, 1.0);
        assert!(LinearTransform::from_matrix(m).is_err());
    }

    #[test]
    fn test_dimension_check() {
        let t = LinearTransform::identity(2);
        assert!(t.apply(&[1.0, 2.0, 3.0]).is_err());
    }
}
