//! # 日志配置模块
//!
//! 初始化 tracing 订阅器，并提供带有请求ID、阶段、组件和操作名的结构化日志宏

use std::env;
use std::fmt;
use tracing_subscriber::{EnvFilter, fmt as tracing_fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// 日志所处的处理阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStage {
    Startup,
    Shutdown,
    Db,
    RequestStart,
    UpstreamRequest,
    UpstreamResponse,
    Streaming,
    Response,
    ResponseFailure,
}

impl LogStage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Shutdown => "shutdown",
            Self::Db => "db",
            Self::RequestStart => "request_start",
            Self::UpstreamRequest => "upstream_request",
            Self::UpstreamResponse => "upstream_response",
            Self::Streaming => "streaming",
            Self::Response => "response",
            Self::ResponseFailure => "response_failure",
        }
    }
}

impl fmt::Display for LogStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 产生日志的组件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogComponent {
    Main,
    ServerSetup,
    Database,
    DifyClient,
    Relay,
    ChatHandler,
    MineService,
    GeoHandler,
}

impl LogComponent {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::ServerSetup => "server_setup",
            Self::Database => "database",
            Self::DifyClient => "dify_client",
            Self::Relay => "relay",
            Self::ChatHandler => "chat_handler",
            Self::MineService => "mine_service",
            Self::GeoHandler => "geo_handler",
        }
    }
}

impl fmt::Display for LogComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 结构化 info 日志
///
/// `linfo!(request_id, stage, component, operation, message)`
#[macro_export]
macro_rules! linfo {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(,)?) => {
        ::tracing::info!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            "{}",
            $message
        )
    };
}

/// 结构化 warn 日志
#[macro_export]
macro_rules! lwarn {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(,)?) => {
        ::tracing::warn!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            "{}",
            $message
        )
    };
}

/// 结构化 error 日志
#[macro_export]
macro_rules! lerror {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(,)?) => {
        ::tracing::error!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            "{}",
            $message
        )
    };
}

/// 结构化 debug 日志
#[macro_export]
macro_rules! ldebug {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(,)?) => {
        ::tracing::debug!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            "{}",
            $message
        )
    };
}

/// 记录一个 [`GeoAiError`](crate::error::GeoAiError)：客户端错误用 warn，服务端错误用 error
pub fn log_error(
    request_id: &str,
    stage: LogStage,
    component: LogComponent,
    operation: &str,
    message: &str,
    err: &crate::error::GeoAiError,
) {
    let (status, code) = err.to_http_response_parts();
    match err.category() {
        crate::error::ErrorCategory::Client => tracing::warn!(
            request_id = %request_id,
            stage = %stage,
            component = %component,
            operation = operation,
            status = status.as_u16(),
            code = code,
            error = %err,
            "{}",
            message
        ),
        crate::error::ErrorCategory::Server => tracing::error!(
            request_id = %request_id,
            stage = %stage,
            component = %component,
            operation = operation,
            status = status.as_u16(),
            code = code,
            error = ?err,
            "{}",
            message
        ),
    }
}

/// 默认过滤规则：关闭逐条 SQL 日志
fn default_filter(level: &str) -> String {
    format!("{level},geoai_server=debug,sqlx::query=off,sea_orm::query=warn,sqlx=warn")
}

/// 初始化优化的日志系统
pub fn init_optimized_logging(log_level: Option<&String>) {
    let level = log_level.map_or("info", std::string::String::as_str);
    let log_filter = env::var("RUST_LOG").unwrap_or_else(|_| default_filter(level));

    let result = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| log_filter.into()))
        .with(
            tracing_fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();

    if result.is_err() {
        // 已有全局订阅器（如测试环境），保持现状
        return;
    }

    if env::var("RUST_LOG").is_ok_and(|v| v.contains("sqlx::query=info") || v.contains("sqlx::query=debug")) {
        tracing::info!("🔍 SQLx database query logging enabled");
    } else {
        tracing::info!("📋 SQLx database query logging disabled");
    }
}

/// 环境变量设置指南
#[allow(clippy::print_stdout)]
pub fn print_logging_help() {
    println!("📋 日志配置指南:");
    println!("  RUST_LOG=info                        # 标准日志级别");
    println!("  RUST_LOG=debug                       # 调试级别");
    println!("  RUST_LOG=info,sqlx::query=info       # 开发环境：启用数据库查询日志");
    println!("  RUST_LOG=geoai_server=trace          # 应用详细追踪");
    println!();
    println!("💡 组合示例:");
    println!("  RUST_LOG=info,sqlx::query=off        # 生产模式：性能优先");
    println!("  RUST_LOG=debug,reqwest=debug         # 排查 Dify 上游连接问题");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_disables_sql_logs() {
        let filter = default_filter("warn");
        assert!(filter.starts_with("warn,"));
        assert!(filter.contains("sqlx::query=off"));
        assert!(EnvFilter::try_new(&filter).is_ok());
    }

    #[test]
    fn test_stage_and_component_names() {
        assert_eq!(LogStage::Streaming.to_string(), "streaming");
        assert_eq!(LogComponent::DifyClient.to_string(), "dify_client");
    }
}
