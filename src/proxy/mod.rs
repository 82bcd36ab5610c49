//! # 聊天代理模块
//!
//! Dify 上游客户端与 SSE 转发

pub mod relay;
pub mod upstream;

pub use relay::{RelayStream, relay_stream};
pub use upstream::{ChatUpstream, DifyClient, LineStream};
