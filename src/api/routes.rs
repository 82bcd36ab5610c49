//! # 路由配置

use axum::Router;
use axum::routing::{get, post};

use super::handlers::{chat, health, mines};
use super::server::AppState;

/// 创建 `/api` 下的所有路由
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(chat::chat))
        .route("/health", get(health::health_check))
        .nest("/mines", mine_routes())
        .with_state(state)
}

/// 矿山与钻孔路由
fn mine_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(mines::list_mines).post(mines::create_mine))
        .route("/{id}", get(mines::get_mine).delete(mines::delete_mine))
        .route(
            "/{id}/drill-holes",
            get(mines::list_drill_holes).post(mines::create_drill_hole),
        )
}
