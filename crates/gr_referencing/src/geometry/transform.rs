// crates/gr_referencing/src/geometry/transform.rs

//! 包络的近似变换
//!
//! 任意变换都可能是非线性的，因此结果由若干采样点的像的外包框近似：
//! n 维包络在每个轴上取 {最小值, 中值, 最大值}，共 3ⁿ 个采样点；
//! 二维矩形取四角与四边中点。对仿射变换结果是精确的，对一般非线性
//! 变换只是近似，不保证包含。

use std::sync::Arc;

use crate::error::{ReferencingError, ReferencingResult};
use crate::geometry::{BoundingBox, DirectPosition, Envelope};
use crate::identified::{Comparable, ComparisonMode};
use crate::operation::CoordinateOperation;
use crate::transform::MathTransform;

/// 最多采样的维度，3^8 = 6561 个点
const MAX_SAMPLED_DIMENSIONS: usize = 8;

/// 用 3ⁿ 个采样点近似变换包络，结果不带 CRS
pub fn transform_envelope(transform: &dyn MathTransform, envelope: &Envelope) -> ReferencingResult<Envelope> {
    let sd = transform.source_dimensions();
    let td = transform.target_dimensions();
    ReferencingError::check_dimension(&transform.name(), sd, envelope.dimension())?;
    if sd > MAX_SAMPLED_DIMENSIONS {
        return Err(ReferencingError::transform_failed(
            "包络变换",
            format!("维度 {sd} 超过采样上限 {MAX_SAMPLED_DIMENSIONS}"),
        ));
    }
    if envelope.is_null() {
        return Ok(Envelope::null(td));
    }
    if transform.is_identity() && sd == td {
        let mut copy = envelope.clone();
        copy.set_crs(None)?;
        return Ok(copy);
    }

    let mut result = Envelope::null(td);
    let mut source = vec![0.0; sd];
    let mut target = vec![0.0; td];
    let total = 3usize.pow(sd as u32);
    for index in 0..total {
        let mut k = index;
        for (d, slot) in source.iter_mut().enumerate() {
            *slot = match k % 3 {
                0 => envelope.minimum(d),
                1 => envelope.median(d),
                _ => envelope.maximum(d),
            };
            k /= 3;
        }
        transform.transform(&source, &mut target)?;
        result.add_position(&DirectPosition::from_ordinates(target.clone()))?;
    }
    Ok(result)
}

/// 用四角与四边中点近似变换二维矩形
pub fn transform_rectangle(transform: &dyn MathTransform, rect: &BoundingBox) -> ReferencingResult<BoundingBox> {
    ReferencingError::check_dimension(&transform.name(), 2, transform.source_dimensions())?;
    ReferencingError::check_dimension(&transform.name(), 2, transform.target_dimensions())?;
    if transform.is_identity() {
        return Ok(*rect);
    }
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    let mut dst = [0.0; 2];
    for (x, y) in rect.boundary_samples() {
        transform.transform(&[x, y], &mut dst)?;
        min_x = min_x.min(dst[0]);
        min_y = min_y.min(dst[1]);
        max_x = max_x.max(dst[0]);
        max_y = max_y.max(dst[1]);
    }
    Ok(BoundingBox::new(min_x, min_y, max_x, max_y))
}

/// 用坐标操作变换包络，结果关联操作的目标 CRS
///
/// 包络若已关联 CRS，必须与操作的源 CRS 结构相等。
pub fn transform_envelope_by_operation(
    operation: &CoordinateOperation,
    envelope: &Envelope,
) -> ReferencingResult<Envelope> {
    if let (Some(env_crs), Some(src)) = (envelope.crs(), operation.source_crs()) {
        if !(Arc::ptr_eq(env_crs, src) || env_crs.equals(src, ComparisonMode::IgnoreMetadata)) {
            return Err(ReferencingError::invalid_definition(format!(
                "包络的坐标参考系统 \"{}\" 与操作的源 \"{}\" 不一致",
                env_crs.name(),
                src.name()
            )));
        }
    }
    let transform = operation.transform().ok_or_else(|| {
        ReferencingError::invalid_definition(format!("操作 \"{}\" 没有数学变换", operation.name()))
    })?;
    let mut result = transform_envelope(transform.as_ref(), envelope)?;
    result.set_crs(operation.target_crs().cloned())?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{LinearTransform, ProjectionMethod, ProjectionParameters, ProjectionTransform};
    use crate::ellipsoid::Ellipsoid;

    /// 测试恒等变换下包络不变
    #[test]
    fn test_identity_round_trip() {
        let identity = LinearTransform::identity(2);
        let envelope = Envelope::from_corners(&[0.0, 0.0], &[10.0, 10.0]).unwrap();
        let result = transform_envelope(&identity, &envelope).unwrap();
        assert_eq!(result, envelope);
    }

    #[test]
    fn test_affine_is_exact() {
        let t = LinearTransform::scale(&[2.0, -1.0]);
        let envelope = Envelope::from_corners(&[0.0, 0.0], &[10.0, 10.0]).unwrap();
        let result = transform_envelope(&t, &envelope).unwrap();
        assert_eq!(result.minimum(0), 0.0);
        assert_eq!(result.maximum(0), 20.0);
        assert_eq!(result.minimum(1), -10.0);
        assert_eq!(result.maximum(1), 0.0);
    }

    #[test]
    fn test_null_stays_null() {
        let t = LinearTransform::scale(&[2.0, 3.0]);
        assert!(transform_envelope(&t, &Envelope::null(2)).unwrap().is_null());
    }

    /// 测试非线性投影下中值采样扩大结果
    #[test]
    fn test_projection_samples_median() {
        let params = ProjectionParameters {
            method: ProjectionMethod::TransverseMercator,
            semi_major: 6_378_137.0,
            e2: Ellipsoid::wgs84().e2(),
            central_meridian: 117.0,
            latitude_of_origin: 0.0,
            scale_factor: 0.9996,
            false_easting: 500_000.0,
            false_northing: 0.0,
        };
        let t = ProjectionTransform::new(params, &Ellipsoid::wgs84()).unwrap();
        let envelope = Envelope::from_corners(&[114.0, 0.0], &[120.0, 40.0]).unwrap();
        let result = transform_envelope(&t, &envelope).unwrap();
        let east_on_equator = t.apply(&[120.0, 0.0]).unwrap()[0];
        assert!((result.maximum(0) - east_on_equator).abs() < 1e-6);
        assert!(result.minimum(1).abs() < 1e-6);

        let rect = transform_rectangle(&t, &BoundingBox::new(114.0, 0.0, 120.0, 40.0)).unwrap();
        assert!((rect.max_x - result.maximum(0)).abs() < 1e-6);
    }
}
