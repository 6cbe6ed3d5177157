// crates/gr_referencing/src/operation/mod.rs

//! 坐标操作
//!
//! 源 CRS 到目标 CRS 的映射，携带数学变换、版本、精度、有效范围与用途。
//! 类别是封闭的标签联合：
//!
//! - **转换**（Conversion）：精确、仅由参数决定，例如地图投影
//! - **变换**（Transformation）：含统计误差，例如基准面转换
//! - **串联操作**（Concatenated）：维度首尾相接的操作序列
//! - **透传操作**（PassThrough）：只作用于坐标中一段分量的操作
//!
//! 构造时强制 `transform.source == source_crs.dimension` 与
//! `transform.target == target_crs.dimension`；定义转换例外，
//! 它可以没有 CRS 与变换，作为派生 CRS 的模板。

pub mod accuracy;
pub mod authority_backed;
pub mod buffered;
pub mod factory;
pub mod pool;
pub mod standalone;

pub use accuracy::AccuracyEstimator;
pub use authority_backed::AuthorityBackedFactory;
pub use buffered::{BufferedOperationFactory, CachingOperationFactory};
pub use factory::{CoordinateOperationFactory, OperationAuthorityFactory};
pub use standalone::StandaloneOperationFactory;

use std::fmt;
use std::sync::Arc;

use crate::crs::CoordinateReferenceSystem;
use crate::error::{ReferencingError, ReferencingResult};
use crate::extent::Extent;
use crate::identified::{arc_equals, option_arc_equals, Comparable, ComparisonMode, IdentifiedObject};
use crate::metadata::{self, Describe, PropertyDescriptor};
use crate::parameter::{OperationMethod, ParameterValueGroup};
use crate::transform::{self, ConcatenatedTransform, PassThroughTransform, SharedTransform};
use crate::unit::Unit;

// ============================================================================
// 精度
// ============================================================================

/// 位置精度
#[derive(Debug, Clone)]
pub enum PositionalAccuracy {
    /// 定量结果
    Quantitative {
        /// 数值
        value: f64,
        /// 单位
        unit: Arc<Unit>,
    },
    /// 已通过 Bursa-Wolf 参数应用基准面转换
    DatumShiftApplied,
    /// 需要但省略了基准面转换
    DatumShiftOmitted,
}

impl PositionalAccuracy {
    /// 以米表示的定量精度
    pub fn metres(value: f64) -> Self {
        Self::Quantitative {
            value,
            unit: Arc::new(Unit::metre()),
        }
    }
}

impl PartialEq for PositionalAccuracy {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Quantitative { value: a, unit: u }, Self::Quantitative { value: b, unit: v }) => {
                gr_foundation::float::bits_eq(*a, *b) && u == v
            }
            (Self::DatumShiftApplied, Self::DatumShiftApplied)
            | (Self::DatumShiftOmitted, Self::DatumShiftOmitted) => true,
            _ => false,
        }
    }
}

// ============================================================================
// 操作类别
// ============================================================================

/// 操作类别
#[derive(Debug, Clone)]
pub enum OperationKind {
    /// 转换
    Conversion {
        /// 方法
        method: Arc<OperationMethod>,
        /// 参数
        parameters: ParameterValueGroup,
    },
    /// 变换
    Transformation {
        /// 方法
        method: Arc<OperationMethod>,
        /// 参数
        parameters: ParameterValueGroup,
    },
    /// 串联操作
    Concatenated {
        /// 有序步骤
        steps: Vec<Arc<CoordinateOperation>>,
    },
    /// 透传操作
    PassThrough {
        /// 作用于分量的操作
        operation: Arc<CoordinateOperation>,
        /// 第一个受影响的分量
        first_affected_ordinate: usize,
        /// 末尾保留的分量数
        num_trailing_ordinates: usize,
    },
}

// ============================================================================
// 坐标操作
// ============================================================================

/// 坐标操作
#[derive(Debug, Clone)]
pub struct CoordinateOperation {
    /// 元数据
    pub object: IdentifiedObject,
    source_crs: Option<Arc<CoordinateReferenceSystem>>,
    target_crs: Option<Arc<CoordinateReferenceSystem>>,
    transform: Option<SharedTransform>,
    /// 操作版本
    pub version: Option<String>,
    /// 位置精度
    pub accuracy: Vec<PositionalAccuracy>,
    /// 有效范围
    pub valid_area: Option<Extent>,
    /// 用途
    pub scope: Option<String>,
    /// 类别
    pub kind: OperationKind,
}

impl CoordinateOperation {
    /// 两个结构相同的 CRS 之间的恒等操作
    pub fn identity(
        source: Arc<CoordinateReferenceSystem>,
        target: Arc<CoordinateReferenceSystem>,
    ) -> ReferencingResult<Self> {
        let dimension = source.dimension();
        OperationBuilder::conversion(
            IdentifiedObject::named("Identity"),
            Arc::new(OperationMethod::new(IdentifiedObject::named("Identity"), dimension, dimension)),
            ParameterValueGroup::new(),
        )
        .crs(source, target)
        .transform(transform::identity(dimension))
        .build()
    }

    /// 名称
    pub fn name(&self) -> &str {
        &self.object.name
    }

    /// 源 CRS
    pub fn source_crs(&self) -> Option<&Arc<CoordinateReferenceSystem>> {
        self.source_crs.as_ref()
    }

    /// 目标 CRS
    pub fn target_crs(&self) -> Option<&Arc<CoordinateReferenceSystem>> {
        self.target_crs.as_ref()
    }

    /// 数学变换
    pub fn transform(&self) -> Option<&SharedTransform> {
        self.transform.as_ref()
    }

    /// 是否为定义转换（没有 CRS 与变换的模板）
    pub fn is_defining(&self) -> bool {
        self.source_crs.is_none() && self.target_crs.is_none() && self.transform.is_none()
    }

    /// 变换是否为恒等
    pub fn is_identity(&self) -> bool {
        self.transform.as_ref().is_some_and(|t| t.is_identity())
    }

    /// 操作方法（仅转换与变换）
    pub fn method(&self) -> Option<&Arc<OperationMethod>> {
        match &self.kind {
            OperationKind::Conversion { method, .. } | OperationKind::Transformation { method, .. } => {
                Some(method)
            }
            _ => None,
        }
    }

    /// 参数（仅转换与变换）
    pub fn parameters(&self) -> Option<&ParameterValueGroup> {
        match &self.kind {
            OperationKind::Conversion { parameters, .. }
            | OperationKind::Transformation { parameters, .. } => Some(parameters),
            _ => None,
        }
    }

    /// 串联操作的步骤；其他类别为空
    pub fn steps(&self) -> &[Arc<CoordinateOperation>] {
        match &self.kind {
            OperationKind::Concatenated { steps } => steps,
            _ => &[],
        }
    }

    /// 类别名称
    pub fn kind_label(&self) -> &'static str {
        match self.kind {
            OperationKind::Conversion { .. } => "转换",
            OperationKind::Transformation { .. } => "变换",
            OperationKind::Concatenated { .. } => "串联操作",
            OperationKind::PassThrough { .. } => "透传操作",
        }
    }

    /// 逆操作：交换源与目标并对变换求逆，串联步骤逆序
    pub fn inverse(&self) -> ReferencingResult<Self> {
        if self.is_defining() {
            return Err(ReferencingError::invalid_definition(format!(
                "定义转换 \"{}\" 没有变换，无法求逆",
                self.name()
            )));
        }
        let kind = match &self.kind {
            OperationKind::Concatenated { steps } => OperationKind::Concatenated {
                steps: steps
                    .iter()
                    .rev()
                    .map(|s| s.inverse().map(Arc::new))
                    .collect::<ReferencingResult<Vec<_>>>()?,
            },
            OperationKind::PassThrough {
                operation,
                first_affected_ordinate,
                num_trailing_ordinates,
            } => OperationKind::PassThrough {
                operation: Arc::new(operation.inverse()?),
                first_affected_ordinate: *first_affected_ordinate,
                num_trailing_ordinates: *num_trailing_ordinates,
            },
            other => other.clone(),
        };
        let transform = match &self.transform {
            Some(t) => Some(t.inverse()?),
            None => None,
        };
        Ok(Self {
            object: self.object.clone(),
            source_crs: self.target_crs.clone(),
            target_crs: self.source_crs.clone(),
            transform,
            version: self.version.clone(),
            accuracy: self.accuracy.clone(),
            valid_area: self.valid_area.clone(),
            scope: self.scope.clone(),
            kind,
        })
    }

    /// 用给定的 CRS 实例替换端点，结构必须相同
    pub fn with_crs(
        mut self,
        source: Arc<CoordinateReferenceSystem>,
        target: Arc<CoordinateReferenceSystem>,
    ) -> ReferencingResult<Self> {
        for (own, new) in [(&self.source_crs, &source), (&self.target_crs, &target)] {
            if let Some(own) = own {
                if !arc_equals(own, new, ComparisonMode::IgnoreMetadata) {
                    return Err(ReferencingError::invalid_definition(format!(
                        "\"{}\" 与 \"{}\" 结构不同，不能替换操作端点",
                        own.name(),
                        new.name()
                    )));
                }
            }
        }
        self.source_crs = Some(source);
        self.target_crs = Some(target);
        Ok(self)
    }
}

impl Comparable for CoordinateOperation {
    fn equals(&self, other: &Self, mode: ComparisonMode) -> bool {
        let kind = match (&self.kind, &other.kind) {
            (
                OperationKind::Conversion { method: m1, parameters: p1 },
                OperationKind::Conversion { method: m2, parameters: p2 },
            )
            | (
                OperationKind::Transformation { method: m1, parameters: p1 },
                OperationKind::Transformation { method: m2, parameters: p2 },
            ) => arc_equals(m1, m2, mode) && p1.same_values(p2),
            (OperationKind::Concatenated { steps: a }, OperationKind::Concatenated { steps: b }) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| arc_equals(x, y, mode))
            }
            (
                OperationKind::PassThrough {
                    operation: o1,
                    first_affected_ordinate: f1,
                    num_trailing_ordinates: t1,
                },
                OperationKind::PassThrough {
                    operation: o2,
                    first_affected_ordinate: f2,
                    num_trailing_ordinates: t2,
                },
            ) => f1 == f2 && t1 == t2 && arc_equals(o1, o2, mode),
            _ => false,
        };
        kind && option_arc_equals(&self.source_crs, &other.source_crs, mode)
            && option_arc_equals(&self.target_crs, &other.target_crs, mode)
            && self.object.equals(&other.object, mode)
            && match mode {
                ComparisonMode::Strict => {
                    self.version == other.version
                        && self.accuracy == other.accuracy
                        && self.valid_area == other.valid_area
                        && self.scope == other.scope
                }
                ComparisonMode::IgnoreMetadata => true,
            }
    }
}

impl fmt::Display for CoordinateOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = |c: Option<&Arc<CoordinateReferenceSystem>>| {
            c.map_or_else(|| "?".to_string(), |c| c.name().to_string())
        };
        write!(
            f,
            "{}[{}]: {} → {}",
            self.kind_label(),
            self.object.name,
            name(self.source_crs()),
            name(self.target_crs())
        )
    }
}

impl Describe for CoordinateOperation {
    const KIND: &'static str = "坐标操作";
    const PROPERTIES: &'static [PropertyDescriptor<Self>] = &[
        PropertyDescriptor { name: "名称", get: |o| Some(o.object.name.clone()) },
        PropertyDescriptor { name: "标识符", get: |o| metadata::identifiers(&o.object) },
        PropertyDescriptor { name: "类别", get: |o| Some(o.kind_label().to_string()) },
        PropertyDescriptor { name: "源 CRS", get: |o| o.source_crs().map(|c| c.to_string()) },
        PropertyDescriptor { name: "目标 CRS", get: |o| o.target_crs().map(|c| c.to_string()) },
        PropertyDescriptor { name: "方法", get: |o| o.method().map(|m| m.object.name.clone()) },
        PropertyDescriptor {
            name: "参数",
            get: |o| {
                o.parameters().filter(|p| !p.values.is_empty()).map(|p| {
                    p.values.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
                })
            },
        },
        PropertyDescriptor {
            name: "精度(米)",
            get: |o| metadata::number(AccuracyEstimator::default().accuracy(o)),
        },
        PropertyDescriptor { name: "变换", get: |o| o.transform().map(|t| t.name()) },
        PropertyDescriptor { name: "版本", get: |o| o.version.clone() },
        PropertyDescriptor {
            name: "有效范围",
            get: |o| o.valid_area.as_ref().and_then(|a| a.description.clone()),
        },
        PropertyDescriptor { name: "用途", get: |o| o.scope.clone() },
    ];
}

// ============================================================================
// 构建器
// ============================================================================

/// 坐标操作构建器
///
/// 串联与透传操作未显式给出 CRS 或变换时，由步骤自动推导。
#[derive(Debug)]
pub struct OperationBuilder {
    object: IdentifiedObject,
    source: Option<Arc<CoordinateReferenceSystem>>,
    target: Option<Arc<CoordinateReferenceSystem>>,
    transform: Option<SharedTransform>,
    version: Option<String>,
    accuracy: Vec<PositionalAccuracy>,
    valid_area: Option<Extent>,
    scope: Option<String>,
    kind: OperationKind,
}

impl OperationBuilder {
    fn new(object: IdentifiedObject, kind: OperationKind) -> Self {
        Self {
            object,
            source: None,
            target: None,
            transform: None,
            version: None,
            accuracy: Vec::new(),
            valid_area: None,
            scope: None,
            kind,
        }
    }

    /// 转换
    pub fn conversion(
        object: IdentifiedObject,
        method: Arc<OperationMethod>,
        parameters: ParameterValueGroup,
    ) -> Self {
        Self::new(object, OperationKind::Conversion { method, parameters })
    }

    /// 变换
    pub fn transformation(
        object: IdentifiedObject,
        method: Arc<OperationMethod>,
        parameters: ParameterValueGroup,
    ) -> Self {
        Self::new(object, OperationKind::Transformation { method, parameters })
    }

    /// 串联操作
    pub fn concatenated(object: IdentifiedObject, steps: Vec<Arc<CoordinateOperation>>) -> Self {
        Self::new(object, OperationKind::Concatenated { steps })
    }

    /// 透传操作
    pub fn pass_through(
        object: IdentifiedObject,
        operation: Arc<CoordinateOperation>,
        first_affected_ordinate: usize,
        num_trailing_ordinates: usize,
    ) -> Self {
        Self::new(
            object,
            OperationKind::PassThrough {
                operation,
                first_affected_ordinate,
                num_trailing_ordinates,
            },
        )
    }

    /// 源与目标 CRS
    #[must_use]
    pub fn crs(mut self, source: Arc<CoordinateReferenceSystem>, target: Arc<CoordinateReferenceSystem>) -> Self {
        self.source = Some(source);
        self.target = Some(target);
        self
    }

    /// 数学变换
    #[must_use]
    pub fn transform(mut self, transform: SharedTransform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// 版本
    #[must_use]
    pub fn version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    /// 追加精度
    #[must_use]
    pub fn accuracy(mut self, accuracy: PositionalAccuracy) -> Self {
        self.accuracy.push(accuracy);
        self
    }

    /// 有效范围
    #[must_use]
    pub fn valid_area(mut self, area: Option<Extent>) -> Self {
        self.valid_area = area;
        self
    }

    /// 用途
    #[must_use]
    pub fn scope(mut self, scope: Option<String>) -> Self {
        self.scope = scope;
        self
    }

    /// 构建并校验维度
    pub fn build(mut self) -> ReferencingResult<CoordinateOperation> {
        match &self.kind {
            OperationKind::Concatenated { steps } => {
                let first = steps.first().ok_or_else(|| {
                    ReferencingError::invalid_definition(format!(
                        "串联操作 \"{}\" 至少需要一个步骤",
                        self.object.name
                    ))
                })?;
                for pair in steps.windows(2) {
                    let (a, b) = (&pair[0], &pair[1]);
                    let (Some(at), Some(bs)) = (a.target_crs(), b.source_crs()) else {
                        return Err(ReferencingError::invalid_definition(format!(
                            "串联操作 \"{}\" 的步骤缺少 CRS",
                            self.object.name
                        )));
                    };
                    if !arc_equals(at, bs, ComparisonMode::IgnoreMetadata) {
                        return Err(ReferencingError::invalid_definition(format!(
                            "串联操作 \"{}\" 的步骤 \"{}\" 的目标 \"{}\" 与下一步的源 \"{}\" 不一致",
                            self.object.name,
                            a.name(),
                            at.name(),
                            bs.name()
                        )));
                    }
                }
                if self.source.is_none() {
                    self.source = first.source_crs().cloned();
                }
                if self.target.is_none() {
                    self.target = steps.last().and_then(|s| s.target_crs().cloned());
                }
                if self.transform.is_none() {
                    let dimension = first.transform().map_or(0, |t| t.source_dimensions());
                    let transforms = steps
                        .iter()
                        .map(|s| {
                            s.transform().cloned().ok_or_else(|| {
                                ReferencingError::invalid_definition(format!(
                                    "串联操作的步骤 \"{}\" 没有变换",
                                    s.name()
                                ))
                            })
                        })
                        .collect::<ReferencingResult<Vec<_>>>()?;
                    self.transform = Some(ConcatenatedTransform::chain(dimension, transforms)?);
                }
            }
            OperationKind::PassThrough {
                operation,
                first_affected_ordinate,
                num_trailing_ordinates,
            } => {
                if self.transform.is_none() {
                    let sub = operation.transform().cloned().ok_or_else(|| {
                        ReferencingError::invalid_definition(format!(
                            "透传操作的子操作 \"{}\" 没有变换",
                            operation.name()
                        ))
                    })?;
                    self.transform = Some(PassThroughTransform::create(
                        *first_affected_ordinate,
                        sub,
                        *num_trailing_ordinates,
                    )?);
                }
            }
            OperationKind::Conversion { .. } | OperationKind::Transformation { .. } => {}
        }

        let defining = matches!(self.kind, OperationKind::Conversion { .. })
            && self.source.is_none()
            && self.target.is_none()
            && self.transform.is_none();
        if !defining {
            let (Some(source), Some(target), Some(transform)) = (&self.source, &self.target, &self.transform)
            else {
                return Err(ReferencingError::invalid_definition(format!(
                    "操作 \"{}\" 必须同时给出源 CRS、目标 CRS 与变换",
                    self.object.name
                )));
            };
            ReferencingError::check_dimension(
                &format!("操作 \"{}\" 的源", self.object.name),
                source.dimension(),
                transform.source_dimensions(),
            )?;
            ReferencingError::check_dimension(
                &format!("操作 \"{}\" 的目标", self.object.name),
                target.dimension(),
                transform.target_dimensions(),
            )?;
        }

        Ok(CoordinateOperation {
            object: self.object,
            source_crs: self.source,
            target_crs: self.target,
            transform: self.transform,
            version: self.version,
            accuracy: self.accuracy,
            valid_area: self.valid_area,
            scope: self.scope,
            kind: self.kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::LinearTransform;

    fn wgs84() -> Arc<CoordinateReferenceSystem> {
        Arc::new(CoordinateReferenceSystem::wgs84_lon_lat())
    }

    fn affine_method() -> Arc<OperationMethod> {
        Arc::new(OperationMethod::new(IdentifiedObject::named("Affine"), 2, 2))
    }

    #[test]
    fn test_identity_operation() {
        let op = CoordinateOperation::identity(wgs84(), wgs84()).unwrap();
        assert!(op.is_identity());
        assert_eq!(op.transform().unwrap().source_dimensions(), 2);
        assert_eq!(op.kind_label(), "转换");
    }

    /// 测试定义转换可以没有 CRS 与变换
    #[test]
    fn test_defining_conversion() {
        let op = OperationBuilder::conversion(
            IdentifiedObject::named("UTM zone 50N"),
            affine_method(),
            ParameterValueGroup::new(),
        )
        .build()
        .unwrap();
        assert!(op.is_defining());
        assert!(op.inverse().is_err());
    }

    #[test]
    fn test_transformation_requires_crs() {
        let result = OperationBuilder::transformation(
            IdentifiedObject::named("shift"),
            affine_method(),
            ParameterValueGroup::new(),
        )
        .build();
        assert!(result.is_err());
    }

    /// 测试变换维度与 CRS 不符时构造失败
    #[test]
    fn test_dimension_mismatch_is_fatal() {
        let result = OperationBuilder::conversion(
            IdentifiedObject::named("bad"),
            affine_method(),
            ParameterValueGroup::new(),
        )
        .crs(wgs84(), wgs84())
        .transform(Arc::new(LinearTransform::identity(3)))
        .build();
        assert!(matches!(result, Err(ReferencingError::MismatchedDimension { .. })));
    }

    #[test]
    fn test_concatenated_derives_endpoints() {
        let shift = Arc::new(
            OperationBuilder::conversion(IdentifiedObject::named("shift"), affine_method(), ParameterValueGroup::new())
                .crs(wgs84(), wgs84())
                .transform(Arc::new(LinearTransform::translation(&[1.0, 0.0])))
                .build()
                .unwrap(),
        );
        let op = OperationBuilder::concatenated(IdentifiedObject::named("twice"), vec![shift.clone(), shift])
            .build()
            .unwrap();
        assert!(op.source_crs().is_some());
        assert_eq!(op.transform().unwrap().apply(&[0.0, 0.0]).unwrap(), vec![2.0, 0.0]);

        let inverse = op.inverse().unwrap();
        assert_eq!(inverse.steps().len(), 2);
        assert_eq!(inverse.transform().unwrap().apply(&[2.0, 0.0]).unwrap(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_empty_concatenation_rejected() {
        assert!(OperationBuilder::concatenated(IdentifiedObject::named("empty"), vec![])
            .build()
            .is_err());
    }
}
