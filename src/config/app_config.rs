//! # 应用配置结构定义

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

/// Dify 公共聊天接口
pub const DEFAULT_DIFY_API_URL: &str = "https://api.dify.ai/v1/chat-messages";

/// 应用主配置结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP 服务配置
    pub server: ServerConfig,
    /// Dify 上游配置
    pub dify: DifyConfig,
    /// 数据库配置
    pub database: super::DatabaseConfig,
}

/// HTTP 服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听地址
    pub host: String,
    /// 监听端口
    pub port: u16,
    /// 是否启用CORS
    pub enable_cors: bool,
    /// 允许的CORS源地址，`*` 表示任意
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
            cors_origins: vec!["*".to_string()],
        }
    }
}

impl ServerConfig {
    /// 解析监听地址
    pub fn socket_addr(&self) -> crate::error::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port).parse().map_err(|e| {
            crate::error::GeoAiError::config_with_source(
                format!("无效的监听地址: {}:{}", self.host, self.port),
                e,
            )
        })
    }
}

/// Dify 上游配置
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DifyConfig {
    /// 聊天接口完整URL
    pub api_url: String,
    /// API 密钥，缺失时聊天请求直接返回 500
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// 建立连接的超时时间（秒），为空表示不设超时
    pub connect_timeout_secs: Option<u64>,
}

impl Default for DifyConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_DIFY_API_URL.to_string(),
            api_key: None,
            connect_timeout_secs: None,
        }
    }
}

impl DifyConfig {
    /// 获取非空的 API 密钥
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }
}

impl fmt::Debug for DifyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DifyConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key().map(|_| "***"))
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let config = DifyConfig {
            api_key: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(config.api_key().is_none());
    }

    #[test]
    fn test_debug_masks_api_key() {
        let config = DifyConfig {
            api_key: Some("app-secret".to_string()),
            ..Default::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("app-secret"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            port = 9000

            [dify]
            connect_timeout_secs = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.dify.api_url, DEFAULT_DIFY_API_URL);
        assert_eq!(config.dify.connect_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_socket_addr() {
        let server = ServerConfig::default();
        assert_eq!(server.socket_addr().unwrap().port(), 8000);

        let bad = ServerConfig {
            host: "not a host".to_string(),
            ..Default::default()
        };
        assert!(bad.socket_addr().is_err());
    }
}
