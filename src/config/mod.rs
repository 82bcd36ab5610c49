//! # 配置管理模块
//!
//! 处理应用配置加载、环境变量覆盖、规范化和验证。
//! 配置在进程启动时构建一次，之后以 `Arc<AppConfig>` 注入各组件。

mod app_config;
mod database;
mod manager;

pub use app_config::{AppConfig, DifyConfig, ServerConfig};
pub use database::{DatabaseConfig, normalize_database_url};
pub use manager::ConfigManager;

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> crate::error::Result<()> {
    crate::ensure_config!(config.server.port != 0, "无效的服务器端口: 0");

    let dify_url = url::Url::parse(&config.dify.api_url).map_err(|e| {
        crate::error::GeoAiError::config_with_source(
            format!("无效的 DIFY_API_URL: {}", config.dify.api_url),
            e,
        )
    })?;
    crate::ensure_config!(
        matches!(dify_url.scheme(), "http" | "https"),
        "DIFY_API_URL 必须使用 http 或 https: {}",
        config.dify.api_url
    );

    crate::ensure_config!(!config.database.url.is_empty(), "数据库URL不能为空");
    crate::ensure_config!(
        config.database.is_postgres(),
        "仅支持 PostgreSQL 数据库: {}",
        config.database.masked_url()
    );
    crate::ensure_config!(
        config.database.max_connections > 0,
        "数据库最大连接数必须大于0"
    );
    crate::ensure_config!(
        config.database.min_connections <= config.database.max_connections,
        "数据库最小连接数不能大于最大连接数"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.dify.api_url, "https://api.dify.ai/v1/chat-messages");
        assert!(config.dify.api_key().is_none());
    }

    #[test]
    fn test_rejects_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_rejects_non_http_dify_url() {
        let mut config = AppConfig::default();
        config.dify.api_url = "ftp://example.com/chat".to_string();
        assert!(validate_config(&config).is_err());

        config.dify.api_url = "not a url".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_rejects_sqlite_url() {
        let mut config = AppConfig::default();
        config.database.url = "sqlite://./data/dev.db".to_string();
        assert!(validate_config(&config).is_err());
    }
}
