//! # GeoAI Server Library
//!
//! 矿山与钻孔地理数据服务，以及转发 Dify 聊天 SSE 流的代理接口

pub mod api;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod proxy;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{GeoAiError, Result};
