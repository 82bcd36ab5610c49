//! 聊天代理处理器

use axum::{
    Extension,
    body::{Body, Bytes},
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};

use crate::api::{RequestId, server::AppState};
use crate::error::{GeoAiError, Result};
use crate::logging::{LogComponent, LogStage, log_error};
use crate::proxy::relay_stream;
use crate::{ldebug, linfo};

/// `POST /api/chat`
///
/// 请求体原样转发给 Dify。上游在写出首字节前失败时返回对应的 HTTP 错误，
/// 成功时以 `text/event-stream` 逐行转发。
pub async fn chat(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Bytes,
) -> Result<Response> {
    let payload: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
        let err = GeoAiError::from(e);
        log_error(
            &request_id,
            LogStage::RequestStart,
            LogComponent::ChatHandler,
            "parse_payload",
            "请求体不是合法 JSON",
            &err,
        );
        err
    })?;

    ldebug!(
        request_id,
        LogStage::RequestStart,
        LogComponent::ChatHandler,
        "chat_request",
        &format!("收到聊天请求，请求体 {} 字节", body.len())
    );

    let lines = state
        .upstream
        .open(&request_id, payload)
        .await
        .map_err(|err| {
            log_error(
                &request_id,
                LogStage::ResponseFailure,
                LogComponent::ChatHandler,
                "open_upstream",
                "打开上游流失败",
                &err,
            );
            err
        })?;

    linfo!(
        request_id,
        LogStage::Response,
        LogComponent::ChatHandler,
        "stream_start",
        "开始转发 SSE 流"
    );

    let stream = relay_stream(request_id.as_str(), lines, state.shutdown.child_token());

    Ok((
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}
