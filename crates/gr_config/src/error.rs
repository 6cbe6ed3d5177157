// crates/gr_config/src/error.rs

//! 配置层错误类型

use gr_foundation::GrError;

/// 配置错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 解析错误
    #[error("解析错误: {0}")]
    Parse(String),

    /// 无效值
    #[error("无效值 '{key}': {value} - {reason}")]
    InvalidValue {
        /// 配置键
        key: String,
        /// 配置值
        value: String,
        /// 原因
        reason: String,
    },

    /// 缺失配置
    #[error("缺失配置: {0}")]
    Missing(String),
}

impl ConfigError {
    /// 创建无效值错误
    pub fn invalid_value(
        key: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<ConfigError> for GrError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Io(e) => GrError::from(e),
            ConfigError::Missing(what) => GrError::not_found(what),
            other => GrError::config(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::invalid_value("cache.lru_capacity", 0, "必须为正");
        assert!(err.to_string().contains("cache.lru_capacity"));
        assert!(err.to_string().contains("必须为正"));
    }

    /// 测试配置错误转换为基础层错误
    #[test]
    fn test_conversion_to_gr_error() {
        let err: GrError = ConfigError::invalid_value("accuracy.default", -1.0, "必须非负").into();
        assert!(matches!(err, GrError::Config { ref message } if message.contains("accuracy.default")));

        let err: GrError = ConfigError::Missing("用户配置目录".into()).into();
        assert!(matches!(err, GrError::NotFound { .. }));

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "defaults.json");
        let err: GrError = ConfigError::Io(io).into();
        assert!(matches!(err, GrError::Io { source: Some(_), .. }));
    }
}
