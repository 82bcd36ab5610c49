//! # 错误处理测试

use crate::error::{Context, ErrorCategory, GeoAiError};
use axum::http::StatusCode;
use std::error::Error;

#[test]
fn test_config_error_creation() {
    let err = GeoAiError::config("DIFY_API_KEY is not configured");
    assert!(matches!(err, GeoAiError::Config { .. }));
    assert_eq!(err.to_string(), "配置错误: DIFY_API_KEY is not configured");
    assert_eq!(
        err.to_http_response_parts(),
        (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR")
    );
    assert_eq!(err.detail(), "DIFY_API_KEY is not configured");
}

#[test]
fn test_upstream_error_passes_status_and_body() {
    let err = GeoAiError::upstream(404, "not found");
    assert_eq!(err.to_http_response_parts().0, StatusCode::NOT_FOUND);
    assert_eq!(err.detail(), "not found");
    assert_eq!(err.category(), ErrorCategory::Client);

    let err = GeoAiError::upstream(503, "busy");
    assert_eq!(err.to_http_response_parts().0, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(err.category(), ErrorCategory::Server);
}

#[test]
fn test_upstream_error_with_out_of_range_status() {
    let err = GeoAiError::upstream(42, "weird");
    assert_eq!(err.to_http_response_parts().0, StatusCode::BAD_GATEWAY);
}

#[test]
fn test_config_error_with_source() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "文件不存在");
    let err = GeoAiError::config_with_source("配置文件加载失败", io_err);

    assert!(err.to_string().contains("配置错误: 配置文件加载失败"));
    assert!(err.source().is_some());
}

#[test]
fn test_context_keeps_inner_status() {
    let result: Result<(), GeoAiError> = Err(GeoAiError::not_found("mine", "abc"));
    let err = result.context("查询矿山失败").unwrap_err();

    assert!(matches!(err, GeoAiError::Context { .. }));
    assert_eq!(err.to_http_response_parts().0, StatusCode::NOT_FOUND);
    assert!(err.to_string().starts_with("查询矿山失败: "));
}

#[test]
fn test_auto_conversion_from_io_error() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "文件不存在");
    let err: GeoAiError = io_err.into();

    assert!(matches!(err, GeoAiError::Io { .. }));
    assert!(err.to_string().contains("IO错误: 文件操作失败"));
}

#[test]
fn test_auto_conversion_from_toml_error() {
    let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
    let err: GeoAiError = toml_err.into();

    assert!(matches!(err, GeoAiError::Config { .. }));
    assert!(err.to_string().contains("配置错误: TOML解析失败"));
}

#[test]
fn test_auto_conversion_from_json_error() {
    let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    let err: GeoAiError = json_err.into();

    assert_eq!(err.to_http_response_parts().0, StatusCode::BAD_REQUEST);
}

#[test]
fn test_validation_macro() {
    let err = crate::validation_error!("name", "名称不能为空");
    match err {
        GeoAiError::Validation { message, field } => {
            assert_eq!(message, "名称不能为空");
            assert_eq!(field.as_deref(), Some("name"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_context_on_db_error_reports_database_failure() {
    let result: Result<(), sea_orm::DbErr> =
        Err(sea_orm::DbErr::Custom("connection refused".to_string()));
    let err = result.context("数据库连接失败").unwrap_err();

    assert_eq!(
        err.to_http_response_parts(),
        (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR")
    );
    assert!(err.to_string().starts_with("数据库连接失败: 数据库错误"));
    assert_eq!(err.category(), ErrorCategory::Server);
}
