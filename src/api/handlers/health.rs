//! 健康检查相关处理器

use axum::extract::State;
use axum::response::Response;
use serde::{Deserialize, Serialize};

use crate::api::{response, server::AppState};

/// 健康检查响应
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
}

/// `GET /ping`
pub async fn ping_handler() -> &'static str {
    "pong"
}

/// `GET /api/health`，数据库不可用时仍返回 200，由 `database` 字段体现
pub async fn health_check(State(state): State<AppState>) -> Response {
    let database = if crate::database::ping(&state.db).await {
        "up"
    } else {
        "down"
    };

    response::success(HealthResponse {
        status: "ok".to_string(),
        database: database.to_string(),
    })
}
