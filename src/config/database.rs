//! # 数据库配置

use sea_orm::ConnectOptions;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use ::migration::normalize_database_url;

/// 本地/开发环境默认连接串
pub const DEFAULT_DATABASE_URL: &str = "postgres://postgres:postgres@db:5432/geoai";

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// 数据库URL
    pub url: String,
    /// 最大连接数
    pub max_connections: u32,
    /// 最小连接数
    pub min_connections: u32,
    /// 连接超时时间（秒）
    pub connect_timeout: u64,
    /// 启动时是否执行迁移
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: 30,
            run_migrations: true,
        }
    }
}

impl DatabaseConfig {
    /// 检查是否为 PostgreSQL 连接串
    pub fn is_postgres(&self) -> bool {
        self.url.starts_with("postgres://") || self.url.starts_with("postgresql://")
    }

    /// 隐藏密码后的连接串，用于日志输出
    pub fn masked_url(&self) -> String {
        match url::Url::parse(&self.url) {
            Ok(mut parsed) if parsed.password().is_some() => {
                if parsed.set_password(Some("***")).is_ok() {
                    parsed.to_string()
                } else {
                    self.url.clone()
                }
            }
            Ok(parsed) => parsed.to_string(),
            Err(_) => "<invalid database url>".to_string(),
        }
    }

    /// 构建 Sea-ORM 连接选项
    pub fn connect_options(&self) -> ConnectOptions {
        let mut options = ConnectOptions::new(self.url.clone());
        options
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .connect_timeout(Duration::from_secs(self.connect_timeout))
            .sqlx_logging(true);
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("postgresql+psycopg2://u:p@db:5432/geoai", "postgres://u:p@db:5432/geoai")]
    #[case("postgresql+asyncpg://u:p@db:5432/geoai", "postgres://u:p@db:5432/geoai")]
    #[case("postgresql://u:p@db:5432/geoai", "postgres://u:p@db:5432/geoai")]
    #[case("postgres://u:p@db/geoai", "postgres://u:p@db/geoai")]
    #[case("  postgres://u@db/geoai \n", "postgres://u@db/geoai")]
    #[case("mysql://u:p@db/geoai", "mysql://u:p@db/geoai")]
    #[case("not-a-url", "not-a-url")]
    fn test_normalize_database_url(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_database_url(raw), expected);
    }

    #[test]
    fn test_masked_url_hides_password() {
        let config = DatabaseConfig::default();
        let masked = config.masked_url();
        assert!(masked.contains("***"));
        assert!(!masked.contains(":postgres@"));
    }

    #[test]
    fn test_is_postgres() {
        let mut config = DatabaseConfig::default();
        assert!(config.is_postgres());
        config.url = "sqlite::memory:".to_string();
        assert!(!config.is_postgres());
    }
}
