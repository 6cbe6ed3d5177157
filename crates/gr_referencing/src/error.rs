// crates/gr_referencing/src/error.rs

//! 参考系统错误类型
//!
//! 权威工厂与坐标操作工厂共用的错误分类。
//! 所有错误可转换为 `gr_foundation::GrError` 向上传播。
//!
//! # 错误分类
//!
//! - **权威代码缺失**：`NoSuchAuthorityCode`，探测时属于正常情况
//! - **数据库损坏**：`MissingRequiredField`、`DuplicateDefinition`
//! - **底层故障**：`FactoryFailure`，包装数据库/IO 错误
//! - **操作推导失败**：`OperationNotFound`
//! - **构造错误**：维度不匹配、定义无效、数值变换失败

use gr_foundation::GrError;
use thiserror::Error;

/// 参考系统模块结果类型
pub type ReferencingResult<T> = Result<T, ReferencingError>;

/// 装箱的底层错误
pub type BoxedSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// 参考系统错误
#[derive(Error, Debug)]
pub enum ReferencingError {
    /// 权威代码不存在
    #[error("权威机构 {authority} 中不存在{kind}代码 \"{code}\"")]
    NoSuchAuthorityCode {
        /// 权威机构名称
        authority: String,
        /// 请求的代码
        code: String,
        /// 请求的对象类型（如"椭球体"）
        kind: &'static str,
    },

    /// 必需字段为空
    #[error("代码 \"{code}\" 的必需字段 {field} 为空")]
    MissingRequiredField {
        /// 所属对象代码
        code: String,
        /// 缺失的字段名
        field: &'static str,
    },

    /// 同一代码存在相互冲突的定义
    #[error("代码 \"{code}\" 存在多个相互冲突的定义")]
    DuplicateDefinition {
        /// 重复的代码
        code: String,
    },

    /// 工厂底层故障
    #[error("工厂故障: {message}")]
    FactoryFailure {
        /// 描述
        message: String,
        /// 底层错误
        #[source]
        source: Option<BoxedSource>,
    },

    /// 找不到坐标操作
    #[error("无法找到从 \"{source_crs}\" 到 \"{target_crs}\" 的坐标操作: {reason}")]
    OperationNotFound {
        /// 源坐标参考系统名称
        source_crs: String,
        /// 目标坐标参考系统名称
        target_crs: String,
        /// 原因
        reason: String,
    },

    /// 维度不匹配
    #[error("{name} 维度不匹配: 期望 {expected}, 实际 {actual}")]
    MismatchedDimension {
        /// 对象名称
        name: String,
        /// 期望维度
        expected: usize,
        /// 实际维度
        actual: usize,
    },

    /// 定义无效
    #[error("无效的定义: {message}")]
    InvalidDefinition {
        /// 原因
        message: String,
    },

    /// 数值变换失败
    #[error("{operation} 失败: {message}")]
    TransformFailed {
        /// 变换名称（如"矩阵求逆"）
        operation: &'static str,
        /// 失败原因
        message: String,
    },
}

// ============================================================================
// 转换实现
// ============================================================================

impl From<rusqlite::Error> for ReferencingError {
    fn from(err: rusqlite::Error) -> Self {
        Self::FactoryFailure {
            message: format!("数据库查询失败: {err}"),
            source: Some(Box::new(err)),
        }
    }
}

impl From<ReferencingError> for GrError {
    fn from(err: ReferencingError) -> Self {
        match err {
            ReferencingError::NoSuchAuthorityCode { authority, code, kind } => {
                GrError::not_found(format!("{authority}:{code} ({kind})"))
            }
            ReferencingError::MissingRequiredField { code, field } => {
                GrError::invalid_input(format!("代码 {code} 缺少必需字段 {field}"))
            }
            ReferencingError::DuplicateDefinition { code } => {
                GrError::invalid_input(format!("代码 {code} 存在重复定义"))
            }
            ReferencingError::FactoryFailure { message, .. } => {
                GrError::internal(format!("工厂故障: {message}"))
            }
            ReferencingError::OperationNotFound { source_crs, target_crs, reason } => {
                GrError::not_found(format!("坐标操作 {source_crs} → {target_crs}: {reason}"))
            }
            ReferencingError::MismatchedDimension { name, expected, actual } => {
                GrError::invalid_input(format!("{name} 维度不匹配: 期望 {expected}, 实际 {actual}"))
            }
            ReferencingError::InvalidDefinition { message } => GrError::invalid_input(message),
            ReferencingError::TransformFailed { operation, message } => {
                GrError::internal(format!("{operation} 失败: {message}"))
            }
        }
    }
}

// ============================================================================
// 便捷构造函数
// ============================================================================

impl ReferencingError {
    /// 创建权威代码缺失错误
    #[inline]
    pub fn no_such_code(
        authority: impl Into<String>,
        code: impl Into<String>,
        kind: &'static str,
    ) -> Self {
        Self::NoSuchAuthorityCode {
            authority: authority.into(),
            code: code.into(),
            kind,
        }
    }

    /// 创建必需字段缺失错误
    #[inline]
    pub fn missing_field(code: impl Into<String>, field: &'static str) -> Self {
        Self::MissingRequiredField {
            code: code.into(),
            field,
        }
    }

    /// 创建重复定义错误
    #[inline]
    pub fn duplicate(code: impl Into<String>) -> Self {
        Self::DuplicateDefinition { code: code.into() }
    }

    /// 创建工厂故障错误
    #[inline]
    pub fn factory_failure(message: impl Into<String>) -> Self {
        Self::FactoryFailure {
            message: message.into(),
            source: None,
        }
    }

    /// 创建找不到操作错误
    #[inline]
    pub fn operation_not_found(
        source_crs: impl Into<String>,
        target_crs: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::OperationNotFound {
            source_crs: source_crs.into(),
            target_crs: target_crs.into(),
            reason: reason.into(),
        }
    }

    /// 创建维度不匹配错误
    #[inline]
    pub fn mismatched_dimension(name: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::MismatchedDimension {
            name: name.into(),
            expected,
            actual,
        }
    }

    /// 创建定义无效错误
    #[inline]
    pub fn invalid_definition(message: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            message: message.into(),
        }
    }

    /// 创建数值变换失败错误
    #[inline]
    pub fn transform_failed(operation: &'static str, message: impl Into<String>) -> Self {
        Self::TransformFailed {
            operation,
            message: message.into(),
        }
    }

    /// 是否为权威代码缺失（探测时的正常结果）
    #[inline]
    pub fn is_no_such_code(&self) -> bool {
        matches!(self, Self::NoSuchAuthorityCode { .. })
    }

    /// 验证维度
    #[inline]
    pub fn check_dimension(name: &str, expected: usize, actual: usize) -> Result<(), Self> {
        if expected != actual {
            Err(Self::mismatched_dimension(name, expected, actual))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReferencingError::no_such_code("EPSG", "99999", "椭球体");
        assert!(err.to_string().contains("99999"));
        assert!(err.is_no_such_code());

        let err = ReferencingError::missing_field("7030", "SEMI_MAJOR_AXIS");
        assert!(err.to_string().contains("SEMI_MAJOR_AXIS"));
    }

    #[test]
    fn test_conversion_to_gr_error() {
        let err: GrError = ReferencingError::duplicate("4326").into();
        assert!(matches!(err, GrError::InvalidInput { .. }));

        let err: GrError = ReferencingError::no_such_code("EPSG", "1", "单位").into();
        assert!(matches!(err, GrError::NotFound { .. }));
    }

    #[test]
    fn test_rusqlite_error_is_factory_failure() {
        let err: ReferencingError = rusqlite::Error::InvalidQuery.into();
        assert!(matches!(err, ReferencingError::FactoryFailure { source: Some(_), .. }));
    }

    #[test]
    fn test_check_dimension() {
        assert!(ReferencingError::check_dimension("变换", 2, 2).is_ok());
        assert!(ReferencingError::check_dimension("变换", 2, 3).is_err());
    }
}
