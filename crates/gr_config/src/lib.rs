// crates/gr_config/src/lib.rs

//! GeoRef 配置层
//!
//! - [`engine`]: 坐标操作引擎配置（缓存策略、精度常数、候选选择策略）
//! - [`defaults`]: 命令行工具跨调用持久化的用户默认值
//!
//! 所有配置均为纯数据结构，通过 serde 以 JSON 读写。

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod defaults;
pub mod engine;
pub mod error;

pub use defaults::UserDefaults;
pub use engine::{AccuracyConfig, CacheConfig, CachePolicy, EngineConfig, SelectionPolicy};
pub use error::ConfigError;
