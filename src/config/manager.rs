//! # 配置管理器
//!
//! 按 默认值 → TOML 文件 → 环境变量 → 规范化 → 验证 的顺序构建配置

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{AppConfig, normalize_database_url};
use crate::error::GeoAiError;

/// 支持覆盖配置的环境变量
const ENV_OVERRIDE_KEYS: &[&str] = &[
    "DIFY_API_URL",
    "DIFY_API_KEY",
    "DIFY_CONNECT_TIMEOUT_SECS",
    "DATABASE_URL",
    "SERVER_HOST",
    "SERVER_PORT",
];

/// 配置管理器
#[derive(Debug, Clone)]
pub struct ConfigManager {
    /// 当前配置
    config: Arc<AppConfig>,
    /// 实际加载的配置文件
    source: Option<PathBuf>,
}

impl ConfigManager {
    /// 创建配置管理器
    ///
    /// 配置文件优先级：`GEOAI_CONFIG_PATH` > `cli_path` > `config/config.{RUST_ENV}.toml`。
    /// 显式指定的文件必须存在；默认文件缺失时仅使用默认值和环境变量。
    pub fn new(cli_path: Option<&Path>) -> crate::error::Result<Self> {
        Self::with_env(cli_path, |key| env::var(key).ok())
    }

    /// 使用给定的变量查找函数创建配置管理器
    pub fn with_env<F>(cli_path: Option<&Path>, lookup: F) -> crate::error::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let explicit = lookup("GEOAI_CONFIG_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .or_else(|| cli_path.map(Path::to_path_buf));

        let source = match explicit {
            Some(path) => Some(path),
            None => {
                let env_name = lookup("RUST_ENV").unwrap_or_else(|| "dev".to_string());
                let path = PathBuf::from(format!("config/config.{env_name}.toml"));
                if path.exists() {
                    Some(path)
                } else {
                    debug!("默认配置文件不存在，使用内置默认值: {:?}", path);
                    None
                }
            }
        };

        Self::build(source, &Self::build_env_overrides(&lookup))
    }

    /// 从指定文件创建配置管理器，不读取环境变量
    pub fn from_file(config_path: impl AsRef<Path>) -> crate::error::Result<Self> {
        Self::build(Some(config_path.as_ref().to_path_buf()), &HashMap::new())
    }

    fn build(
        source: Option<PathBuf>,
        overrides: &HashMap<String, String>,
    ) -> crate::error::Result<Self> {
        let mut config = match &source {
            Some(path) => Self::load_config_file(path)?,
            None => AppConfig::default(),
        };

        Self::apply_env_overrides(&mut config, overrides)?;
        config.database.url = normalize_database_url(&config.database.url);
        super::validate_config(&config)?;

        info!("配置管理器初始化完成");
        info!(
            "- 配置文件: {}",
            source
                .as_ref()
                .map_or_else(|| "无（内置默认值）".to_string(), |p| p.display().to_string())
        );
        info!("- 环境变量覆盖: {} 个", overrides.len());
        info!("- Dify 接口: {}", config.dify.api_url);
        info!("- 数据库: {}", config.database.masked_url());
        if config.dify.api_key().is_none() {
            warn!("未配置 DIFY_API_KEY，聊天接口将返回 500");
        }

        Ok(Self {
            config: Arc::new(config),
            source,
        })
    }

    /// 获取当前配置
    pub fn config(&self) -> Arc<AppConfig> {
        Arc::clone(&self.config)
    }

    /// 实际加载的配置文件路径
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// 加载配置文件
    fn load_config_file(path: &Path) -> crate::error::Result<AppConfig> {
        if !path.exists() {
            return Err(GeoAiError::config(format!("配置文件不存在: {path:?}")));
        }

        let config_content = std::fs::read_to_string(path).map_err(|e| {
            GeoAiError::config_with_source(format!("读取配置文件失败: {path:?}"), e)
        })?;

        toml::from_str(&config_content).map_err(|e| {
            GeoAiError::config_with_source(
                format!("TOML解析失败 - 配置文件: {path:?}, 详细错误: {e}"),
                e,
            )
        })
    }

    /// 收集已设置的覆盖变量
    fn build_env_overrides<F>(lookup: &F) -> HashMap<String, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let overrides: HashMap<String, String> = ENV_OVERRIDE_KEYS
            .iter()
            .filter_map(|key| lookup(key).map(|value| ((*key).to_string(), value)))
            .collect();

        debug!("发现 {} 个环境变量覆盖", overrides.len());
        overrides
    }

    /// 应用环境变量覆盖
    fn apply_env_overrides(
        config: &mut AppConfig,
        overrides: &HashMap<String, String>,
    ) -> crate::error::Result<()> {
        for (key, value) in overrides {
            debug!(
                "应用环境变量覆盖: {} = {}",
                key,
                if key.contains("KEY") || key == "DATABASE_URL" {
                    "***"
                } else {
                    value
                }
            );

            match key.as_str() {
                "DIFY_API_URL" => config.dify.api_url = value.trim().to_string(),
                "DIFY_API_KEY" => config.dify.api_key = Some(value.clone()),
                "DIFY_CONNECT_TIMEOUT_SECS" => {
                    config.dify.connect_timeout_secs = if value.trim().is_empty() {
                        None
                    } else {
                        Some(value.trim().parse().map_err(|e| {
                            GeoAiError::config_with_source(
                                format!("无效的连接超时秒数: {value}"),
                                e,
                            )
                        })?)
                    };
                }
                "DATABASE_URL" => config.database.url = value.clone(),
                "SERVER_HOST" => config.server.host = value.trim().to_string(),
                "SERVER_PORT" => {
                    config.server.port = value.trim().parse().map_err(|e| {
                        GeoAiError::config_with_source(format!("无效的端口号: {value}"), e)
                    })?;
                }
                _ => warn!("未知的配置项，忽略环境变量覆盖: {}", key),
            }
        }
        Ok(())
    }
}
