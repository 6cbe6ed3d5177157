// crates/gr_config/src/defaults.rs

//! 命令行用户默认值
//!
//! 保存后备数据库连接串与驱动标识，跨调用持久化。
//! 任何取值为字面量 `default` 的覆盖项都会清除已保存的值。

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// 表示"恢复默认"的保留字
pub const RESET_KEYWORD: &str = "default";

/// 默认值文件所在的应用目录名
const APP_DIR: &str = "georef";

/// 默认值文件名
const FILE_NAME: &str = "defaults.json";

/// 持久化的用户默认值
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDefaults {
    /// 后备数据库连接串（SQLite 文件路径或 `:memory:`）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// 驱动标识（`sqlite` 或 `ansi`）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
}

impl UserDefaults {
    /// 用户配置目录下的默认位置
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(FILE_NAME))
            .ok_or_else(|| ConfigError::Missing("用户配置目录".to_string()))
    }

    /// 读取默认值；文件不存在时返回空默认值
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// 写入默认值，必要时创建父目录
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content)?;
        tracing::debug!("用户默认值已保存到 {}", path.display());
        Ok(())
    }

    /// 应用连接串覆盖，返回是否发生了变化
    pub fn override_url(&mut self, value: &str) -> bool {
        Self::apply(&mut self.url, value)
    }

    /// 应用驱动覆盖，返回是否发生了变化
    pub fn override_driver(&mut self, value: &str) -> bool {
        Self::apply(&mut self.driver, value)
    }

    fn apply(slot: &mut Option<String>, value: &str) -> bool {
        let next = if value.trim().eq_ignore_ascii_case(RESET_KEYWORD) {
            None
        } else {
            Some(value.trim().to_string())
        };
        let changed = *slot != next;
        *slot = next;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_and_reset() {
        let mut defaults = UserDefaults::default();
        assert!(defaults.override_url("/tmp/epsg.db"));
        assert_eq!(defaults.url.as_deref(), Some("/tmp/epsg.db"));
        assert!(!defaults.override_url("/tmp/epsg.db"));

        assert!(defaults.override_url("default"));
        assert_eq!(defaults.url, None);

        assert!(defaults.override_driver("ansi"));
        assert!(defaults.override_driver("DEFAULT"));
        assert_eq!(defaults.driver, None);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = UserDefaults::load(&dir.path().join("none.json")).unwrap();
        assert_eq!(loaded, UserDefaults::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(FILE_NAME);

        let mut defaults = UserDefaults::default();
        defaults.override_url("epsg.db");
        defaults.override_driver("sqlite");
        defaults.save(&path).unwrap();

        let loaded = UserDefaults::load(&path).unwrap();
        assert_eq!(loaded, defaults);
    }
}
