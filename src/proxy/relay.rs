//! # SSE 转发
//!
//! 把上游文本行重新编码为下游字节块：每行追加一个 `\n`，顺序不变，不合并。
//! 流开始后出现的传输错误转为一个终止的 `event: error` 事件。

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use std::convert::Infallible;
use tokio_util::sync::CancellationToken;

use super::upstream::LineStream;
use crate::error::GeoAiError;
use crate::logging::{LogComponent, LogStage};
use crate::{ldebug, linfo, lwarn};

/// 下游 SSE 字节流
pub type RelayStream = stream::BoxStream<'static, Result<Bytes, Infallible>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RelayEnd {
    Completed,
    UpstreamError,
    Cancelled,
}

struct RelayState {
    request_id: String,
    lines: LineStream,
    cancel: CancellationToken,
    relayed: u64,
    end: Option<RelayEnd>,
}

impl Drop for RelayState {
    fn drop(&mut self) {
        if self.end.is_none() {
            // 下游先断开，上游流随本结构一起释放
            linfo!(
                self.request_id,
                LogStage::Streaming,
                LogComponent::Relay,
                "client_disconnected",
                &format!("客户端断开，已转发 {} 行，释放上游连接", self.relayed)
            );
        }
    }
}

/// 单行编码为下游字节块
pub fn frame_line(line: String) -> Bytes {
    let mut chunk = line.into_bytes();
    chunk.push(b'\n');
    Bytes::from(chunk)
}

/// 终止错误事件
pub fn error_event(err: &GeoAiError) -> Bytes {
    let data = serde_json::json!({ "detail": err.detail() });
    Bytes::from(format!("event: error\ndata: {data}\n\n"))
}

/// 把上游行流转为下游字节流
///
/// `cancel` 触发或返回的流被丢弃时，上游流立即释放。
pub fn relay_stream(
    request_id: impl Into<String>,
    lines: LineStream,
    cancel: CancellationToken,
) -> RelayStream {
    let state = RelayState {
        request_id: request_id.into(),
        lines,
        cancel,
        relayed: 0,
        end: None,
    };

    stream::unfold(state, |mut state| async move {
        if state.end.is_some() {
            return None;
        }

        let next = tokio::select! {
            biased;
            () = state.cancel.cancelled() => {
                state.end = Some(RelayEnd::Cancelled);
                linfo!(
                    state.request_id,
                    LogStage::Streaming,
                    LogComponent::Relay,
                    "relay_cancelled",
                    &format!("服务关闭，终止转发，已转发 {} 行", state.relayed)
                );
                return None;
            }
            item = state.lines.next() => item,
        };

        match next {
            Some(Ok(line)) => {
                state.relayed += 1;
                Some((Ok::<_, Infallible>(frame_line(line)), state))
            }
            Some(Err(err)) => {
                lwarn!(
                    state.request_id,
                    LogStage::Streaming,
                    LogComponent::Relay,
                    "upstream_stream_error",
                    &format!("上游流中断，已转发 {} 行: {err}", state.relayed)
                );
                state.end = Some(RelayEnd::UpstreamError);
                Some((Ok(error_event(&err)), state))
            }
            None => {
                state.end = Some(RelayEnd::Completed);
                ldebug!(
                    state.request_id,
                    LogStage::Streaming,
                    LogComponent::Relay,
                    "relay_completed",
                    &format!("上游流结束，共转发 {} 行", state.relayed)
                );
                None
            }
        }
    })
    .boxed()
}
