// apps/gr_cli/src/commands/mod.rs

//! 子命令与共享的会话状态

pub mod init;
pub mod operation;
pub mod print;

use std::path::PathBuf;

use clap::Args;
use gr_config::{EngineConfig, UserDefaults};
use gr_foundation::{GrError, GrResult};
use gr_referencing::authority::EpsgFactory;
use tracing::{debug, info, warn};

/// 默认驱动
const DEFAULT_DRIVER: &str = "sqlite";

/// 全局参数
#[derive(Args)]
pub struct SessionArgs {
    /// 权威库连接串（SQLite 文件路径）；`default` 清除已保存的值
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// 驱动标识（sqlite 或 ansi）；`default` 清除已保存的值
    #[arg(long, global = true)]
    pub driver: Option<String>,

    /// 引擎配置文件（JSON）
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// 用户默认值文件，缺省为用户配置目录下的 georef/defaults.json
    #[arg(long, global = true, hide = true)]
    pub defaults_file: Option<PathBuf>,
}

/// 一次调用的会话：用户默认值与引擎配置
pub struct Session {
    pub defaults: UserDefaults,
    pub config: EngineConfig,
}

impl Session {
    /// 读取默认值，应用并保存覆盖项，读取引擎配置
    ///
    /// 配置层与领域层的错误在这里统一为 `GrError`。
    pub fn load(args: &SessionArgs) -> GrResult<Self> {
        let path = match &args.defaults_file {
            Some(path) => Some(path.clone()),
            None => match UserDefaults::default_path() {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("无法确定用户默认值位置: {}", e);
                    None
                }
            },
        };

        let mut defaults = match &path {
            Some(path) => UserDefaults::load(path).map_err(|e| {
                GrError::config(format!("读取用户默认值失败 {}: {}", path.display(), e))
            })?,
            None => UserDefaults::default(),
        };

        let mut changed = false;
        if let Some(url) = &args.url {
            changed |= defaults.override_url(url);
        }
        if let Some(driver) = &args.driver {
            changed |= defaults.override_driver(driver);
        }
        if changed {
            if let Some(path) = &path {
                defaults.save(path).map_err(|e| {
                    GrError::config(format!("保存用户默认值失败 {}: {}", path.display(), e))
                })?;
                info!("用户默认值已更新");
            }
        }

        let config = match &args.config {
            Some(path) => {
                debug!("读取引擎配置 {}", path.display());
                let config = EngineConfig::from_file(path)?;
                config.validate()?;
                config
            }
            None => EngineConfig::default(),
        };

        Ok(Self { defaults, config })
    }

    /// 驱动标识
    pub fn driver(&self) -> &str {
        self.defaults.driver.as_deref().unwrap_or(DEFAULT_DRIVER)
    }

    /// 按默认值打开权威工厂；未设置连接串时使用内置数据
    pub fn open_factory(&self) -> GrResult<EpsgFactory> {
        let factory = match self.defaults.url.as_deref() {
            Some(url) => {
                debug!(url, driver = self.driver(), "打开权威库");
                EpsgFactory::open(url, self.driver())?
            }
            None => {
                debug!("未设置连接串，使用内置权威数据");
                EpsgFactory::in_memory()?
            }
        };
        Ok(factory)
    }
}

/// 打印单个代码的错误并继续
pub fn report(code: &str, err: &dyn std::fmt::Display) {
    eprintln!("错误：{}：{}", code, err);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn args(defaults_file: &Path) -> SessionArgs {
        SessionArgs {
            url: None,
            driver: None,
            config: None,
            defaults_file: Some(defaults_file.to_path_buf()),
        }
    }

    /// 测试覆盖项写入默认值文件并在下次调用时生效
    #[test]
    fn test_override_persists_across_loads() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("georef").join("defaults.json");

        let mut first = args(&file);
        first.url = Some("/data/epsg.db".into());
        first.driver = Some("ansi".into());
        let session = Session::load(&first).unwrap();
        assert_eq!(session.defaults.url.as_deref(), Some("/data/epsg.db"));
        assert_eq!(session.driver(), "ansi");
        assert!(file.exists());

        let session = Session::load(&args(&file)).unwrap();
        assert_eq!(session.defaults.url.as_deref(), Some("/data/epsg.db"));
        assert_eq!(session.driver(), "ansi");
    }

    /// 测试 `default` 清除已保存的连接串与驱动
    #[test]
    fn test_default_keyword_clears_saved_values() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("defaults.json");

        let mut set = args(&file);
        set.url = Some("/data/epsg.db".into());
        set.driver = Some("ansi".into());
        Session::load(&set).unwrap();

        let mut reset = args(&file);
        reset.url = Some("default".into());
        reset.driver = Some("default".into());
        let session = Session::load(&reset).unwrap();
        assert_eq!(session.defaults.url, None);
        assert_eq!(session.driver(), DEFAULT_DRIVER);

        let reloaded = UserDefaults::load(&file).unwrap();
        assert_eq!(reloaded, UserDefaults::default());
    }

    /// 测试未设置连接串时使用内置权威数据
    #[test]
    fn test_open_factory_without_url_uses_builtin_data() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::load(&args(&dir.path().join("defaults.json"))).unwrap();
        let factory = session.open_factory().unwrap();
        assert!(factory.create_coordinate_reference_system("4326").is_ok());
    }

    /// 测试损坏的默认值文件与无效引擎配置报告为配置错误
    #[test]
    fn test_bad_files_become_config_errors() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("defaults.json");
        std::fs::write(&file, "{ not json").unwrap();
        let err = Session::load(&args(&file)).err().unwrap();
        assert!(matches!(err, GrError::Config { ref message } if message.contains("defaults.json")));

        let config = dir.path().join("engine.json");
        std::fs::write(&config, "{ not json").unwrap();
        let mut with_config = args(&dir.path().join("other.json"));
        with_config.config = Some(config);
        let err = Session::load(&with_config).err().unwrap();
        assert!(matches!(err, GrError::Config { .. }));
    }

    /// 测试无法打开的权威库报告为基础层错误
    #[test]
    fn test_unopenable_database_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut bad = args(&dir.path().join("defaults.json"));
        bad.url = Some(dir.path().join("missing").join("epsg.db").display().to_string());
        let session = Session::load(&bad).unwrap();
        assert!(matches!(session.open_factory().err(), Some(GrError::Internal { .. })));
    }
}
