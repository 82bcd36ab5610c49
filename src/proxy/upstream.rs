//! # Dify 上游客户端
//!
//! 对配置的聊天接口发起一次流式 POST，把响应体按行暴露出来

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use std::io;
use tokio_util::codec::FramedRead;
use tokio_util::io::StreamReader;

use crate::config::DifyConfig;
use crate::error::{GeoAiError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::utils::line_codec::SseLineCodec;
use crate::{ldebug, linfo, lwarn};

/// 上游文本行流，单次消费，丢弃即释放连接
pub type LineStream = BoxStream<'static, Result<String>>;

/// 聊天上游
///
/// `open` 返回之前的失败（缺少密钥、上游状态码 >= 400、连接失败）都以错误返回，
/// 此时尚未向客户端写出任何字节。
#[async_trait]
pub trait ChatUpstream: Send + Sync {
    async fn open(&self, request_id: &str, payload: serde_json::Value) -> Result<LineStream>;
}

/// Dify 聊天接口客户端
#[derive(Debug, Clone)]
pub struct DifyClient {
    http_client: Client,
    config: DifyConfig,
}

impl DifyClient {
    /// 根据配置创建客户端；仅设置连接超时，流式读取不设超时
    pub fn new(config: DifyConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.connect_timeout() {
            builder = builder.connect_timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| GeoAiError::server_init_with_source("构建 Dify HTTP 客户端失败", e))?;

        Ok(Self {
            http_client,
            config,
        })
    }
}

#[async_trait]
impl ChatUpstream for DifyClient {
    async fn open(&self, request_id: &str, payload: serde_json::Value) -> Result<LineStream> {
        let Some(api_key) = self.config.api_key() else {
            return Err(GeoAiError::config("DIFY_API_KEY 未配置"));
        };

        ldebug!(
            request_id,
            LogStage::UpstreamRequest,
            LogComponent::DifyClient,
            "send_request",
            &format!("发送流式请求到: {}", self.config.api_url)
        );

        let response = self
            .http_client
            .post(&self.config.api_url)
            .header(AUTHORIZATION, format!("Bearer {api_key}"))
            .header(ACCEPT, "text/event-stream")
            .header(CONTENT_TYPE, "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| GeoAiError::transport_with_source(format!("连接 Dify 失败: {e}"), e))?;

        let status = response.status();
        if status.as_u16() >= 400 {
            let body = response.bytes().await.map_err(|e| {
                GeoAiError::transport_with_source(format!("读取 Dify 错误响应失败: {e}"), e)
            })?;
            let body = String::from_utf8_lossy(&body).into_owned();
            lwarn!(
                request_id,
                LogStage::UpstreamResponse,
                LogComponent::DifyClient,
                "upstream_error",
                &format!("Dify 返回错误: status={status}, body={body}")
            );
            return Err(GeoAiError::upstream(status.as_u16(), body));
        }

        linfo!(
            request_id,
            LogStage::UpstreamResponse,
            LogComponent::DifyClient,
            "stream_open",
            &format!("Dify 响应流已建立: status={status}")
        );

        let bytes = response.bytes_stream().map_err(io::Error::other);
        let lines = FramedRead::new(StreamReader::new(bytes), SseLineCodec::new())
            .map_err(|e| GeoAiError::transport_with_source(format!("读取 Dify 响应流失败: {e}"), e));

        Ok(lines.boxed())
    }
}
