//! # API 响应结构
//!
//! 错误统一返回 `{"detail", "code", "timestamp"}`，成功直接返回资源 JSON。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GeoAiError;

/// # 标准错误响应
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
    pub code: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    pub fn from_error(error: &GeoAiError) -> Self {
        let (_, code) = error.to_http_response_parts();
        Self {
            detail: error.detail(),
            code: code.to_string(),
            timestamp: Utc::now(),
        }
    }
}

impl IntoResponse for GeoAiError {
    fn into_response(self) -> Response {
        let (status, _) = self.to_http_response_parts();
        (status, Json(ErrorResponse::from_error(&self))).into_response()
    }
}

/// # 便捷函数：200 JSON
pub fn success<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// # 便捷函数：201 JSON
pub fn created<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// # 便捷函数：204
pub fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}
