//! # HTTP 服务器
//!
//! 组装路由与中间件，监听端口，收到关闭信号后优雅退出

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::routing::get;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::middleware::request_id_middleware;
use crate::config::{AppConfig, ServerConfig};
use crate::error::{GeoAiError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::proxy::ChatUpstream;
use crate::{linfo, lwarn};

/// 应用状态
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Arc<DatabaseConnection>,
    pub upstream: Arc<dyn ChatUpstream>,
    /// 服务级关闭信号，每个转发流持有其子令牌
    pub shutdown: CancellationToken,
}

impl AppState {
    #[must_use]
    pub fn new(
        config: Arc<AppConfig>,
        db: Arc<DatabaseConnection>,
        upstream: Arc<dyn ChatUpstream>,
    ) -> Self {
        Self {
            config,
            db,
            upstream,
            shutdown: CancellationToken::new(),
        }
    }
}

/// API 服务器
pub struct ApiServer {
    state: AppState,
    router: Router,
}

impl ApiServer {
    #[must_use]
    pub fn new(state: AppState) -> Self {
        let router = create_router(state.clone(), &state.config.server);
        Self { state, router }
    }

    #[must_use]
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// 服务级关闭令牌
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.state.shutdown.clone()
    }

    /// 绑定配置的地址并启动
    pub async fn serve(self) -> Result<()> {
        let addr = self.state.config.server.socket_addr()?;
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            GeoAiError::server_init_with_source(format!("无法绑定监听地址 {addr}"), e)
        })?;
        self.serve_with_listener(listener).await
    }

    /// 在给定监听器上运行，直到关闭令牌被取消
    pub async fn serve_with_listener(self, listener: TcpListener) -> Result<()> {
        let addr = listener.local_addr()?;
        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::ServerSetup,
            "server_start",
            &format!("HTTP 服务启动于 {addr}")
        );

        let shutdown = self.state.shutdown.clone();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(|e| GeoAiError::internal_with_source(format!("HTTP 服务异常: {e}"), e))?;

        linfo!(
            "system",
            LogStage::Shutdown,
            LogComponent::ServerSetup,
            "server_stopped",
            "HTTP 服务已停止"
        );
        Ok(())
    }
}

/// 创建带中间件的完整路由
pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    let mut app = Router::new()
        .nest("/api", super::routes::create_routes(state))
        .route("/ping", get(super::handlers::health::ping_handler));

    let service_builder = ServiceBuilder::new().layer(TraceLayer::new_for_http());

    if config.enable_cors {
        app = app.layer(service_builder.layer(cors_layer(config)));
    } else {
        app = app.layer(service_builder);
    }

    // 最外层，保证 TraceLayer 和处理器都能拿到 request_id
    app.layer(axum::middleware::from_fn(request_id_middleware))
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let cors_layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN]);

    if config.cors_origins.iter().any(|origin| origin == "*") {
        return cors_layer.allow_origin(Any);
    }

    let origins = config
        .cors_origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<std::result::Result<Vec<_>, _>>();

    match origins {
        Ok(origins) => cors_layer.allow_origin(origins),
        Err(e) => {
            lwarn!(
                "system",
                LogStage::Startup,
                LogComponent::ServerSetup,
                "cors_config_fail",
                &format!("无效的 CORS 源配置: {e}，回退为允许任意来源")
            );
            cors_layer.allow_origin(Any)
        }
    }
}

/// 等待 Ctrl+C 或 SIGTERM 后取消关闭令牌
pub async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            lwarn!(
                "system",
                LogStage::Shutdown,
                LogComponent::Main,
                "signal_fail",
                &format!("监听 Ctrl+C 失败: {e}")
            );
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                lwarn!(
                    "system",
                    LogStage::Shutdown,
                    LogComponent::Main,
                    "signal_fail",
                    &format!("监听 SIGTERM 失败: {e}")
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    linfo!(
        "system",
        LogStage::Shutdown,
        LogComponent::Main,
        "shutdown_signal",
        "收到关闭信号，停止接收新请求并终止进行中的转发流"
    );
    token.cancel();
}
