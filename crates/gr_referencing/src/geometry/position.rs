// crates/gr_referencing/src/geometry/position.rs

//! n 维位置

use std::fmt;
use std::sync::Arc;

use crate::crs::CoordinateReferenceSystem;
use crate::error::{ReferencingError, ReferencingResult};

/// n 维位置
#[derive(Debug, Clone, PartialEq)]
pub struct DirectPosition {
    /// 坐标分量
    pub ordinates: Vec<f64>,
    /// 所属坐标参考系统
    crs: Option<Arc<CoordinateReferenceSystem>>,
}

impl DirectPosition {
    /// 原点
    pub fn new(dimension: usize) -> Self {
        Self {
            ordinates: vec![0.0; dimension],
            crs: None,
        }
    }

    /// 从坐标分量创建
    pub fn from_ordinates(ordinates: impl Into<Vec<f64>>) -> Self {
        Self {
            ordinates: ordinates.into(),
            crs: None,
        }
    }

    /// 维度
    #[inline]
    pub fn dimension(&self) -> usize {
        self.ordinates.len()
    }

    /// 第 `i` 个分量
    pub fn ordinate(&self, i: usize) -> ReferencingResult<f64> {
        self.ordinates.get(i).copied().ok_or_else(|| {
            ReferencingError::mismatched_dimension("位置分量索引", self.dimension(), i + 1)
        })
    }

    /// 设置第 `i` 个分量
    pub fn set_ordinate(&mut self, i: usize, value: f64) -> ReferencingResult<()> {
        let dim = self.dimension();
        let slot = self
            .ordinates
            .get_mut(i)
            .ok_or_else(|| ReferencingError::mismatched_dimension("位置分量索引", dim, i + 1))?;
        *slot = value;
        Ok(())
    }

    /// 所属坐标参考系统
    pub fn crs(&self) -> Option<&Arc<CoordinateReferenceSystem>> {
        self.crs.as_ref()
    }

    /// 设置坐标参考系统，维度必须一致
    pub fn set_crs(&mut self, crs: Option<Arc<CoordinateReferenceSystem>>) -> ReferencingResult<()> {
        if let Some(c) = &crs {
            ReferencingError::check_dimension(c.name(), c.dimension(), self.dimension())?;
        }
        self.crs = crs;
        Ok(())
    }

    /// 链式设置坐标参考系统
    pub fn with_crs(mut self, crs: Arc<CoordinateReferenceSystem>) -> ReferencingResult<Self> {
        self.set_crs(Some(crs))?;
        Ok(self)
    }
}

impl fmt::Display for DirectPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("POINT(")?;
        for (i, v) in self.ordinates.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{v}")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinates() {
        let mut p = DirectPosition::new(2);
        p.set_ordinate(1, 5.0).unwrap();
        assert_eq!(p.ordinate(1).unwrap(), 5.0);
        assert!(p.ordinate(2).is_err());
        assert_eq!(p.to_string(), "POINT(0 5)");
    }

    #[test]
    fn test_crs_dimension_check() {
        let crs = Arc::new(CoordinateReferenceSystem::wgs84_lon_lat());
        assert!(DirectPosition::new(2).with_crs(crs.clone()).is_ok());
        assert!(DirectPosition::new(3).with_crs(crs).is_err());
    }
}
