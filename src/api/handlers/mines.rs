//! 矿山与钻孔处理器

use axum::{
    Extension, Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    response::Response,
};
use uuid::Uuid;

use crate::api::{RequestId, response, server::AppState, services::MineService};
use crate::error::{GeoAiError, Result};
use crate::logging::{LogComponent, LogStage, log_error};
use crate::types::{
    CreateDrillHoleRequest, CreateMineRequest, DrillHoleProperties, Feature, FeatureCollection,
    MineProperties,
};

/// 统一记录处理失败
fn logged(request_id: &RequestId, operation: &str, err: GeoAiError) -> GeoAiError {
    log_error(
        request_id,
        LogStage::ResponseFailure,
        LogComponent::GeoHandler,
        operation,
        "处理请求失败",
        &err,
    );
    err
}

/// JSON 提取失败（字段缺失、类型不符）按校验错误处理
fn json_body<T>(body: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| GeoAiError::validation(rejection.body_text(), None))
}

/// 路径中的 UUID 无法解析时同样按校验错误处理
fn path_id(path: std::result::Result<Path<Uuid>, PathRejection>) -> Result<Uuid> {
    path.map(|Path(id)| id)
        .map_err(|rejection| GeoAiError::validation(rejection.body_text(), Some("id")))
}

/// `GET /api/mines`
pub async fn list_mines(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> Result<Response> {
    let mines = MineService::new(&state.db, &request_id)
        .list_mines()
        .await
        .map_err(|e| logged(&request_id, "list_mines", e))?;

    let collection: FeatureCollection<MineProperties> =
        mines.into_iter().map(Feature::from).collect();
    Ok(response::success(collection))
}

/// `POST /api/mines`
pub async fn create_mine(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: std::result::Result<Json<CreateMineRequest>, JsonRejection>,
) -> Result<Response> {
    let request = json_body(body).map_err(|e| logged(&request_id, "create_mine", e))?;
    let mine = MineService::new(&state.db, &request_id)
        .create_mine(request)
        .await
        .map_err(|e| logged(&request_id, "create_mine", e))?;
    Ok(response::created(mine))
}

/// `GET /api/mines/{id}`
pub async fn get_mine(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    path: std::result::Result<Path<Uuid>, PathRejection>,
) -> Result<Response> {
    let id = path_id(path).map_err(|e| logged(&request_id, "get_mine", e))?;
    let mine = MineService::new(&state.db, &request_id)
        .get_mine(id)
        .await
        .map_err(|e| logged(&request_id, "get_mine", e))?;
    Ok(response::success(mine))
}

/// `DELETE /api/mines/{id}`
pub async fn delete_mine(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    path: std::result::Result<Path<Uuid>, PathRejection>,
) -> Result<Response> {
    let id = path_id(path).map_err(|e| logged(&request_id, "delete_mine", e))?;
    MineService::new(&state.db, &request_id)
        .delete_mine(id)
        .await
        .map_err(|e| logged(&request_id, "delete_mine", e))?;
    Ok(response::no_content())
}

/// `GET /api/mines/{id}/drill-holes`
pub async fn list_drill_holes(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    path: std::result::Result<Path<Uuid>, PathRejection>,
) -> Result<Response> {
    let mine_id = path_id(path).map_err(|e| logged(&request_id, "list_drill_holes", e))?;
    let holes = MineService::new(&state.db, &request_id)
        .list_drill_holes(mine_id)
        .await
        .map_err(|e| logged(&request_id, "list_drill_holes", e))?;

    let collection: FeatureCollection<DrillHoleProperties> =
        holes.into_iter().map(Feature::from).collect();
    Ok(response::success(collection))
}

/// `POST /api/mines/{id}/drill-holes`
pub async fn create_drill_hole(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    path: std::result::Result<Path<Uuid>, PathRejection>,
    body: std::result::Result<Json<CreateDrillHoleRequest>, JsonRejection>,
) -> Result<Response> {
    let mine_id = path_id(path).map_err(|e| logged(&request_id, "create_drill_hole", e))?;
    let request = json_body(body).map_err(|e| logged(&request_id, "create_drill_hole", e))?;
    let hole = MineService::new(&state.db, &request_id)
        .create_drill_hole(mine_id, request)
        .await
        .map_err(|e| logged(&request_id, "create_drill_hole", e))?;
    Ok(response::created(hole))
}
