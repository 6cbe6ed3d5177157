// crates/gr_config/src/engine.rs

//! EngineConfig - 坐标操作引擎配置
//!
//! 决定使用哪一种缓存策略、缓存容量、精度估计使用的经验常数，
//! 以及权威库返回多个候选操作时的选择策略。

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// 引擎配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 权威机构名称（例如 "EPSG"）
    #[serde(default = "default_authority")]
    pub authority: String,

    /// 缓存配置
    #[serde(default)]
    pub cache: CacheConfig,

    /// 精度估计常数
    #[serde(default)]
    pub accuracy: AccuracyConfig,

    /// 缺少 Bursa-Wolf 参数时是否允许忽略基准面转换
    #[serde(default)]
    pub lenient_datum_shift: bool,

    /// 多个候选操作的选择策略
    #[serde(default)]
    pub selection: SelectionPolicy,
}

fn default_authority() -> String {
    "EPSG".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            authority: default_authority(),
            cache: CacheConfig::default(),
            accuracy: AccuracyConfig::default(),
            lenient_datum_shift: false,
            selection: SelectionPolicy::default(),
        }
    }
}

/// 缓存淘汰策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    /// 软引用池：严格相等键，旧条目仅在仍被调用方持有时存活
    Soft,
    /// 有界 LRU 池：忽略元数据的键，恒等变换短路
    #[default]
    Lru,
}

/// 缓存配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// 缓存策略
    #[serde(default)]
    pub policy: CachePolicy,

    /// LRU 池容量
    #[serde(default = "default_lru_capacity")]
    pub lru_capacity: usize,

    /// 软引用池中保持强引用的最近条目数
    #[serde(default = "default_soft_strong_references")]
    pub soft_strong_references: usize,
}

fn default_lru_capacity() -> usize {
    100
}
fn default_soft_strong_references() -> usize {
    20
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            policy: CachePolicy::default(),
            lru_capacity: default_lru_capacity(),
            soft_strong_references: default_soft_strong_references(),
        }
    }
}

/// 精度估计使用的经验常数（米）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccuracyConfig {
    /// 已应用 Bursa-Wolf 基准面转换时的精度
    #[serde(default = "default_datum_shift_applied")]
    pub datum_shift_applied: f64,

    /// 需要但省略了基准面转换时的精度
    #[serde(default = "default_datum_shift_omitted")]
    pub datum_shift_omitted: f64,

    /// 没有任何精度信息的转换（Transformation）的默认精度
    #[serde(default = "default_unknown_transformation")]
    pub unknown_transformation: f64,
}

fn default_datum_shift_applied() -> f64 {
    25.0
}
fn default_datum_shift_omitted() -> f64 {
    1000.0
}
fn default_unknown_transformation() -> f64 {
    1000.0
}

impl Default for AccuracyConfig {
    fn default() -> Self {
        Self {
            datum_shift_applied: default_datum_shift_applied(),
            datum_shift_omitted: default_datum_shift_omitted(),
            unknown_transformation: default_unknown_transformation(),
        }
    }
}

/// 权威库返回多个候选操作时的选择策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// 取第一个候选
    #[default]
    First,
    /// 取估计精度最高（数值最小）的候选
    MostAccurate,
}

impl EngineConfig {
    /// 从文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;

        let config: EngineConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.authority.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "authority",
                &self.authority,
                "权威机构名称不能为空",
            ));
        }

        if self.cache.lru_capacity == 0 {
            return Err(ConfigError::invalid_value(
                "cache.lru_capacity",
                self.cache.lru_capacity,
                "LRU 容量必须为正",
            ));
        }

        let accuracy = [
            ("accuracy.datum_shift_applied", self.accuracy.datum_shift_applied),
            ("accuracy.datum_shift_omitted", self.accuracy.datum_shift_omitted),
            (
                "accuracy.unknown_transformation",
                self.accuracy.unknown_transformation,
            ),
        ];
        for (key, value) in accuracy {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid_value(key, value, "精度必须为非负有限值"));
            }
        }

        Ok(())
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content).map_err(ConfigError::Io)?;
        Ok(())
    }
}
