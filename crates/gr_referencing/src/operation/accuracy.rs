// crates/gr_referencing/src/operation/accuracy.rs

//! 线性精度估计
//!
//! 返回操作的精度（米），依次应用：
//!
//! 1. 操作声明了线性单位的定量精度：换算为米直接返回
//! 2. 转换：0（精确）
//! 3. 变换：已应用基准面转换 / 省略基准面转换 / 未知变换 三个常数之一
//! 4. 串联操作：各步骤中非 NaN 精度的绝对值之和，全部未知时为 NaN
//! 5. 其他：NaN

use gr_config::AccuracyConfig;

use super::{CoordinateOperation, OperationKind, PositionalAccuracy};
use crate::unit::{Unit, UnitKind};

/// 精度估计器
#[derive(Debug, Clone, Copy, Default)]
pub struct AccuracyEstimator {
    config: AccuracyConfig,
}

impl AccuracyEstimator {
    /// 以给定常数创建
    pub fn new(config: AccuracyConfig) -> Self {
        Self { config }
    }

    /// 使用的常数
    pub fn config(&self) -> &AccuracyConfig {
        &self.config
    }

    /// 估计操作精度（米），未知时为 NaN
    pub fn accuracy(&self, operation: &CoordinateOperation) -> f64 {
        if let Some(value) = quantitative_metres(&operation.accuracy) {
            return value;
        }
        match &operation.kind {
            OperationKind::Conversion { .. } => 0.0,
            OperationKind::Transformation { .. } => {
                if operation.accuracy.contains(&PositionalAccuracy::DatumShiftApplied) {
                    self.config.datum_shift_applied
                } else if operation.accuracy.contains(&PositionalAccuracy::DatumShiftOmitted) {
                    self.config.datum_shift_omitted
                } else {
                    self.config.unknown_transformation
                }
            }
            OperationKind::Concatenated { steps } => {
                let mut sum = f64::NAN;
                for step in steps {
                    let value = self.accuracy(step);
                    if !value.is_nan() {
                        sum = if sum.is_nan() { value.abs() } else { sum + value.abs() };
                    }
                }
                sum
            }
            OperationKind::PassThrough { .. } => f64::NAN,
        }
    }
}

/// 第一个线性单位的定量精度，换算为米
fn quantitative_metres(accuracy: &[PositionalAccuracy]) -> Option<f64> {
    let metre = Unit::metre();
    accuracy.iter().find_map(|a| match a {
        PositionalAccuracy::Quantitative { value, unit } if unit.kind == UnitKind::Linear => {
            unit.convert_to(*value, &metre).ok()
        }
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::crs::CoordinateReferenceSystem;
    use crate::identified::IdentifiedObject;
    use crate::operation::OperationBuilder;
    use crate::parameter::{OperationMethod, ParameterValueGroup};
    use crate::transform;

    fn crs() -> Arc<CoordinateReferenceSystem> {
        Arc::new(CoordinateReferenceSystem::wgs84_lon_lat())
    }

    fn method() -> Arc<OperationMethod> {
        Arc::new(OperationMethod::new(IdentifiedObject::named("Affine"), 2, 2))
    }

    fn transformation(accuracy: Option<PositionalAccuracy>) -> Arc<CoordinateOperation> {
        let mut builder =
            OperationBuilder::transformation(IdentifiedObject::named("t"), method(), ParameterValueGroup::new())
                .crs(crs(), crs())
                .transform(transform::identity(2));
        if let Some(a) = accuracy {
            builder = builder.accuracy(a);
        }
        Arc::new(builder.build().unwrap())
    }

    #[test]
    fn test_conversion_is_exact() {
        let op = CoordinateOperation::identity(crs(), crs()).unwrap();
        assert_eq!(AccuracyEstimator::default().accuracy(&op), 0.0);
    }

    /// 测试定量精度优先并换算为米
    #[test]
    fn test_quantitative_in_feet() {
        let op = transformation(Some(PositionalAccuracy::Quantitative {
            value: 10.0,
            unit: Arc::new(Unit::foot()),
        }));
        let value = AccuracyEstimator::default().accuracy(&op);
        assert!((value - 3.048).abs() < 1e-12);
    }

    #[test]
    fn test_transformation_constants() {
        let estimator = AccuracyEstimator::default();
        assert_eq!(estimator.accuracy(&transformation(Some(PositionalAccuracy::DatumShiftApplied))), 25.0);
        assert_eq!(estimator.accuracy(&transformation(Some(PositionalAccuracy::DatumShiftOmitted))), 1000.0);
        assert_eq!(estimator.accuracy(&transformation(None)), 1000.0);
    }

    /// 测试串联操作对已知精度求和并跳过 NaN
    #[test]
    fn test_concatenated_sum_skips_nan() {
        let steps = [5.0, f64::NAN, 10.0]
            .into_iter()
            .map(|v| transformation(Some(PositionalAccuracy::metres(v))))
            .collect();
        let op = OperationBuilder::concatenated(IdentifiedObject::named("chain"), steps)
            .build()
            .unwrap();
        assert_eq!(AccuracyEstimator::default().accuracy(&op), 15.0);
    }

    #[test]
    fn test_concatenated_all_unknown_is_nan() {
        let steps = vec![
            transformation(Some(PositionalAccuracy::metres(f64::NAN))),
            transformation(Some(PositionalAccuracy::metres(f64::NAN))),
        ];
        let op = OperationBuilder::concatenated(IdentifiedObject::named("chain"), steps)
            .build()
            .unwrap();
        assert!(AccuracyEstimator::default().accuracy(&op).is_nan());
    }

    #[test]
    fn test_custom_constants() {
        let estimator = AccuracyEstimator::new(AccuracyConfig {
            datum_shift_applied: 2.0,
            ..AccuracyConfig::default()
        });
        assert_eq!(estimator.accuracy(&transformation(Some(PositionalAccuracy::DatumShiftApplied))), 2.0);
    }
}
