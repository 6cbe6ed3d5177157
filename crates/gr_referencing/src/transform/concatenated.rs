// crates/gr_referencing/src/transform/concatenated.rs

//! 复合变换

use std::sync::Arc;

use super::{check_point, LinearTransform, MathTransform, SharedTransform};
use crate::error::{ReferencingError, ReferencingResult};

/// 两个变换的复合：先 `first` 后 `second`
#[derive(Debug, Clone)]
pub struct ConcatenatedTransform {
    first: SharedTransform,
    second: SharedTransform,
}

impl ConcatenatedTransform {
    /// 复合两个变换
    ///
    /// 恒等步骤被省略，两个仿射步骤合并为一个矩阵。
    pub fn create(first: SharedTransform, second: SharedTransform) -> ReferencingResult<SharedTransform> {
        ReferencingError::check_dimension(
            "复合变换",
            first.target_dimensions(),
            second.source_dimensions(),
        )?;
        if first.is_identity() {
            return Ok(second);
        }
        if second.is_identity() {
            return Ok(first);
        }
        if let (Some(a), Some(b)) = (first.as_linear(), second.as_linear()) {
            let merged = b.compose(a)?;
            return Ok(Arc::new(merged));
        }
        Ok(Arc::new(Self { first, second }))
    }

    /// 依次复合多个变换，空序列返回 `dimension` 维恒等变换
    pub fn chain<I>(dimension: usize, steps: I) -> ReferencingResult<SharedTransform>
    where
        I: IntoIterator<Item = SharedTransform>,
    {
        let mut result: SharedTransform = Arc::new(LinearTransform::identity(dimension));
        for step in steps {
            result = Self::create(result, step)?;
        }
        Ok(result)
    }

    /// 第一步
    pub fn first(&self) -> &SharedTransform {
        &self.first
    }

    /// 第二步
    pub fn second(&self) -> &SharedTransform {
        &self.second
    }
}

impl MathTransform for ConcatenatedTransform {
    fn source_dimensions(&self) -> usize {
        self.first.source_dimensions()
    }

    fn target_dimensions(&self) -> usize {
        self.second.target_dimensions()
    }

    fn transform(&self, src: &[f64], dst: &mut [f64]) -> ReferencingResult<()> {
        check_point(self, src, dst)?;
        let mut middle = vec![0.0; self.first.target_dimensions()];
        self.first.transform(src, &mut middle)?;
        self.second.transform(&middle, dst)
    }

    fn inverse(&self) -> ReferencingResult<SharedTransform> {
        Self::create(self.second.inverse()?, self.first.inverse()?)
    }

    fn name(&self) -> String {
        format!("{} → {}", self.first.name(), self.second.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::GeocentricTransform;

    #[test]
    fn test_linear_steps_are_merged() {
        let a: SharedTransform = Arc::new(LinearTransform::scale(&[2.0, 2.0]));
        let b: SharedTransform = Arc::new(LinearTransform::translation(&[1.0, 1.0]));
        let t = ConcatenatedTransform::create(a, b).unwrap();
        assert!(t.as_linear().is_some());
        assert_eq!(t.apply(&[1.0, 2.0]).unwrap(), vec![3.0, 5.0]);
    }

    #[test]
    fn test_identity_is_skipped() {
        let geo: SharedTransform = Arc::new(GeocentricTransform::wgs84(true));
        let id: SharedTransform = Arc::new(LinearTransform::identity(3));
        let t = ConcatenatedTransform::create(id, geo.clone()).unwrap();
        assert!(Arc::ptr_eq(&t, &geo));
    }

    /// 测试非线性复合的逆变换往返
    #[test]
    fn test_round_trip() {
        let geo: SharedTransform = Arc::new(GeocentricTransform::wgs84(true));
        let shift: SharedTransform = Arc::new(LinearTransform::translation(&[100.0, -50.0, 20.0]));
        let t = ConcatenatedTransform::create(geo, shift).unwrap();
        let p = t.apply(&[116.0, 40.0, 50.0]).unwrap();
        let back = t.inverse().unwrap().apply(&p).unwrap();
        assert!((back[0] - 116.0).abs() < 1e-9);
        assert!((back[1] - 40.0).abs() < 1e-9);
        assert!((back[2] - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_dimension_mismatch() {
        let a: SharedTransform = Arc::new(LinearTransform::identity(2));
        let b: SharedTransform = Arc::new(LinearTransform::identity(3));
        assert!(ConcatenatedTransform::create(a, b).is_err());
    }
}
