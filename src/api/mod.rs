//! # HTTP 接口模块
//!
//! Axum 路由、处理器、中间件与服务层

pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod server;
pub mod services;

pub use middleware::RequestId;
pub use server::{ApiServer, AppState};
