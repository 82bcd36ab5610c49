//! 聊天代理端到端测试：wiremock 模拟 Dify，tower oneshot 驱动 axum 路由

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use futures::stream::{self, StreamExt};
use geoai_server::GeoAiError;
use geoai_server::api::AppState;
use geoai_server::api::server::create_router;
use geoai_server::api::response::ErrorResponse;
use geoai_server::config::{AppConfig, DifyConfig};
use geoai_server::proxy::{ChatUpstream, DifyClient, LineStream};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use sea_orm::{DatabaseBackend, MockDatabase};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use wiremock::matchers::{body_json, header as header_matcher, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SIX_LINES: &str = "event: message\ndata: hello\n\nevent: message\ndata: world\n\n";

fn app_with(upstream: Arc<dyn ChatUpstream>) -> (Router, CancellationToken) {
    let config = Arc::new(AppConfig::default());
    let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
    let state = AppState::new(Arc::clone(&config), db, upstream);
    let token = state.shutdown.clone();
    (create_router(state, &config.server), token)
}

fn dify_app(server: &MockServer, api_key: Option<&str>) -> Router {
    let client = DifyClient::new(DifyConfig {
        api_url: format!("{}/v1/chat-messages", server.uri()),
        api_key: api_key.map(str::to_string),
        connect_timeout_secs: Some(5),
    })
    .unwrap();
    app_with(Arc::new(client)).0
}

fn chat_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

async fn error_body(response: axum::response::Response) -> ErrorResponse {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn relays_upstream_lines_in_order() {
    let server = MockServer::start().await;
    let payload = json!({"query": "哪些矿山靠近断层?", "inputs": {}, "response_mode": "streaming", "user": "u-1"});

    Mock::given(method("POST"))
        .and(path("/v1/chat-messages"))
        .and(header_matcher("authorization", "Bearer app-test"))
        .and(header_matcher("accept", "text/event-stream"))
        .and(body_json(&payload))
        .respond_with(ResponseTemplate::new(200).set_body_raw(SIX_LINES, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let app = dify_app(&server, Some("app-test"));
    let response = app
        .oneshot(chat_request(payload.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
    assert_eq!(response.headers()["x-accel-buffering"], "no");
    assert!(response.headers().contains_key("x-request-id"));

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(std::str::from_utf8(&body).unwrap(), SIX_LINES);
}

#[tokio::test]
async fn unterminated_last_line_gets_newline() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("data: a\r\n\r\ndata: tail", "text/event-stream"),
        )
        .mount(&server)
        .await;

    let response = dify_app(&server, Some("app-test"))
        .oneshot(chat_request("{}"))
        .await
        .unwrap();

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(std::str::from_utf8(&body).unwrap(), "data: a\n\ndata: tail\n");
}

#[tokio::test]
async fn upstream_404_is_passed_through() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .expect(1)
        .mount(&server)
        .await;

    let response = dify_app(&server, Some("app-test"))
        .oneshot(chat_request("{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = error_body(response).await;
    assert_eq!(body.detail, "not found");
    assert_eq!(body.code, "UPSTREAM_ERROR");
}

#[tokio::test]
async fn missing_api_key_fails_without_calling_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    for api_key in [None, Some("")] {
        let response = dify_app(&server, api_key)
            .oneshot(chat_request("{}"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error_body(response).await.code, "CONFIG_ERROR");
    }
}

#[tokio::test]
async fn malformed_utf8_error_body_uses_replacement_characters() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_bytes(b"bad \xff\xfe body".to_vec()))
        .mount(&server)
        .await;

    let response = dify_app(&server, Some("app-test"))
        .oneshot(chat_request("{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = error_body(response).await;
    assert!(body.detail.starts_with("bad "));
    assert!(body.detail.contains('\u{FFFD}'));
    assert!(body.detail.ends_with(" body"));
}

#[tokio::test]
async fn invalid_json_body_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let response = dify_app(&server, Some("app-test"))
        .oneshot(chat_request("{not json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unreachable_upstream_is_bad_gateway() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = DifyClient::new(DifyConfig {
        api_url: format!("http://{addr}/v1/chat-messages"),
        api_key: Some("app-test".to_string()),
        connect_timeout_secs: Some(2),
    })
    .unwrap();
    let (app, _) = app_with(Arc::new(client));

    let response = app.oneshot(chat_request("{}")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(error_body(response).await.code, "TRANSPORT_ERROR");
}

/// 丢弃时置位，用于确认上游流已释放
struct ReleaseFlag(Arc<AtomicBool>);

impl Drop for ReleaseFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// 先发一行，之后永远挂起的上游
struct HangingUpstream {
    released: Arc<AtomicBool>,
}

#[async_trait]
impl ChatUpstream for HangingUpstream {
    async fn open(
        &self,
        _request_id: &str,
        _payload: serde_json::Value,
    ) -> geoai_server::Result<LineStream> {
        let flag = ReleaseFlag(Arc::clone(&self.released));
        let lines = stream::iter([Ok::<_, GeoAiError>("data: first".to_string())])
            .chain(stream::pending())
            .map(move |line| {
                let _held = &flag;
                line
            });
        Ok(lines.boxed())
    }
}

#[tokio::test]
async fn client_disconnect_releases_upstream() {
    let released = Arc::new(AtomicBool::new(false));
    let (app, _) = app_with(Arc::new(HangingUpstream {
        released: Arc::clone(&released),
    }));

    let response = app.oneshot(chat_request("{}")).await.unwrap();
    let mut body = response.into_body();

    let frame = body.frame().await.unwrap().unwrap();
    assert_eq!(frame.into_data().unwrap(), "data: first\n");
    assert!(!released.load(Ordering::SeqCst));

    drop(body);
    assert!(released.load(Ordering::SeqCst));
}

#[tokio::test]
async fn shutdown_ends_inflight_stream() {
    let released = Arc::new(AtomicBool::new(false));
    let (app, shutdown) = app_with(Arc::new(HangingUpstream {
        released: Arc::clone(&released),
    }));

    let response = app.oneshot(chat_request("{}")).await.unwrap();
    let mut body = response.into_body();
    body.frame().await.unwrap().unwrap();

    shutdown.cancel();
    assert!(body.frame().await.is_none());
    assert!(released.load(Ordering::SeqCst));
}
