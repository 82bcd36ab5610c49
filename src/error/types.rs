//! # 错误类型定义

use axum::http::StatusCode;
use thiserror::Error;

use super::ErrorCategory;

/// 应用主要错误类型
#[derive(Debug, Error)]
pub enum GeoAiError {
    /// 配置相关错误（如缺少 `DIFY_API_KEY`）
    #[error("配置错误: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 上游返回了非成功状态码，携带原始状态码与响应体
    #[error("上游服务错误: HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    /// 与上游之间的网络传输错误
    #[error("网络传输错误: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 数据库相关错误
    #[error("数据库错误: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 资源未找到
    #[error("资源未找到: {resource_type} {identifier}")]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    /// 请求参数验证错误
    #[error("参数验证错误: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// 序列化/反序列化错误
    #[error("序列化错误: {message}")]
    Serialization {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    /// IO相关错误
    #[error("IO错误: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// 服务器初始化错误
    #[error("服务器初始化错误: {message}")]
    ServerInit {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 系统内部错误
    #[error("内部错误: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 附加了上下文的错误
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<GeoAiError>,
    },
}

impl GeoAiError {
    /// 将错误转换为HTTP状态码和错误代码
    pub fn to_http_response_parts(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Config { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            Self::Upstream { status, .. } => (
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                "UPSTREAM_ERROR",
            ),
            Self::Transport { .. } => (StatusCode::BAD_GATEWAY, "TRANSPORT_ERROR"),
            Self::Database { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            Self::NotFound { .. } => (StatusCode::NOT_FOUND, "RESOURCE_NOT_FOUND"),
            Self::Validation { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::Serialization { .. } => (StatusCode::BAD_REQUEST, "SERIALIZATION_ERROR"),
            Self::Io { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
            Self::ServerInit { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "SERVER_INIT_ERROR"),
            Self::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::Context { source, .. } => source.to_http_response_parts(),
        }
    }

    /// 返回给调用方的错误详情
    ///
    /// 上游错误直接透传上游响应体，其余错误使用各自的消息。
    pub fn detail(&self) -> String {
        match self {
            Self::Upstream { body, .. } => body.clone(),
            Self::Config { message, .. } | Self::Validation { message, .. } => message.clone(),
            Self::Context { source, .. } => source.detail(),
            other => other.to_string(),
        }
    }

    /// 错误归类：4xx 属于客户端错误，其余属于服务端错误
    pub fn category(&self) -> ErrorCategory {
        if self.to_http_response_parts().0.is_client_error() {
            ErrorCategory::Client
        } else {
            ErrorCategory::Server
        }
    }

    /// 创建配置错误
    pub fn config<T: Into<String>>(message: T) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的配置错误
    pub fn config_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建上游错误
    pub fn upstream<T: Into<String>>(status: u16, body: T) -> Self {
        Self::Upstream {
            status,
            body: body.into(),
        }
    }

    /// 创建网络传输错误
    pub fn transport<T: Into<String>>(message: T) -> Self {
        Self::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的网络传输错误
    pub fn transport_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Transport {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建带来源的数据库错误
    pub fn database_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Database {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建资源未找到错误
    pub fn not_found<T: Into<String>, I: Into<String>>(resource_type: T, identifier: I) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            identifier: identifier.into(),
        }
    }

    /// 创建参数验证错误
    pub fn validation<T: Into<String>>(message: T, field: Option<&str>) -> Self {
        Self::Validation {
            message: message.into(),
            field: field.map(str::to_string),
        }
    }

    /// 创建带来源的服务器初始化错误
    pub fn server_init_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::ServerInit {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建内部错误
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的内部错误
    pub fn internal_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

// 自动转换常见错误类型
impl From<std::io::Error> for GeoAiError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: "文件操作失败".to_string(),
            source: err,
        }
    }
}

impl From<toml::de::Error> for GeoAiError {
    fn from(err: toml::de::Error) -> Self {
        Self::config_with_source("TOML解析失败", err)
    }
}

impl From<url::ParseError> for GeoAiError {
    fn from(err: url::ParseError) -> Self {
        Self::config_with_source("URL格式无效", err)
    }
}

impl From<serde_json::Error> for GeoAiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: "JSON处理失败".to_string(),
            source: err.into(),
        }
    }
}

impl From<sea_orm::DbErr> for GeoAiError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::database_with_source("数据库操作失败", err)
    }
}

impl From<reqwest::Error> for GeoAiError {
    fn from(err: reqwest::Error) -> Self {
        Self::transport_with_source(format!("HTTP请求失败: {err}"), err)
    }
}
