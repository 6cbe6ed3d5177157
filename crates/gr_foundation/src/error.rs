// crates/gr_foundation/src/error.rs

//! 错误处理模块，定义统一错误类型
//!
//! 提供 `GrError` 枚举和 `GrResult` 类型别名。领域相关的错误
//! （权威代码缺失、操作未找到等）在 `gr_referencing` 中定义，
//! 配置错误在 `gr_config` 中定义，二者都可转换为 `GrError`，
//! 供命令行等跨层调用方统一处理。
//!
//! # 示例
//!
//! ```
//! use gr_foundation::error::{GrError, GrResult};
//!
//! fn open_store() -> GrResult<()> {
//!     Err(GrError::config("数据库连接串为空"))
//! }
//! assert!(open_store().is_err());
//! ```

use thiserror::Error;

/// 统一结果类型
pub type GrResult<T> = Result<T, GrError>;

/// GeoRef 错误类型
#[derive(Error, Debug)]
pub enum GrError {
    /// IO 错误
    #[error("IO错误: {message}")]
    Io {
        /// 描述性错误信息
        message: String,
        #[source]
        /// 可选的底层 IO 错误
        source: Option<std::io::Error>,
    },

    /// 配置错误
    #[error("配置错误: {message}")]
    Config {
        /// 具体错误信息
        message: String,
    },

    /// 无效输入
    #[error("无效的输入数据: {message}")]
    InvalidInput {
        /// 说明无效原因
        message: String,
    },

    /// 内部错误
    #[error("内部错误: {message}")]
    Internal {
        /// 内部错误描述
        message: String,
    },

    /// 资源未找到
    #[error("资源未找到: {resource}")]
    NotFound {
        /// 资源名称
        resource: String,
    },
}

// ========================================================================
// 便捷构造方法
// ========================================================================

impl GrError {
    /// 配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// 无效输入
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// 内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// 资源未找到
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }
}

// ========================================================================
// 标准库错误转换
// ========================================================================

impl From<std::io::Error> for GrError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

// ========================================================================
// 测试
// ========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GrError::config("测试配置错误");
        assert!(err.to_string().contains("配置错误"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let gr_err: GrError = io_err.into();
        assert!(matches!(gr_err, GrError::Io { source: Some(_), .. }));
    }

    #[test]
    fn test_io_error_keeps_source() {
        use std::error::Error as _;
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "只读");
        let gr_err = GrError::from(io_err);
        assert!(gr_err.to_string().contains("只读"));
        assert!(gr_err.source().is_some());
    }

    #[test]
    fn test_not_found() {
        let err = GrError::not_found("defaults.json");
        assert!(err.to_string().contains("defaults.json"));
    }
}
