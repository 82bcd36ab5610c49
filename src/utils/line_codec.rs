//! 按行切分上游 SSE 字节流
//!
//! `\n`、`\r\n` 和单独的 `\r` 都结束一行。空行保留，它是 SSE 的事件分隔符。
//! 非法 UTF-8 字节替换为 U+FFFD，不会中断流。

use bytes::{Buf, BytesMut};
use std::io;
use tokio_util::codec::Decoder;

#[derive(Debug, Clone, Default)]
pub struct SseLineCodec {
    /// 已扫描过、确认不含行结束符的前缀长度
    next_index: usize,
    /// 上一行以缓冲区末尾的 `\r` 结束，下一个字节若是 `\n` 需丢弃
    skip_lf: bool,
}

impl SseLineCodec {
    pub const fn new() -> Self {
        Self {
            next_index: 0,
            skip_lf: false,
        }
    }

    fn take_line(src: &mut BytesMut, line_len: usize, terminator_len: usize) -> String {
        let line_bytes = src.split_to(line_len);
        src.advance(terminator_len);
        String::from_utf8_lossy(&line_bytes).into_owned()
    }
}

impl Decoder for SseLineCodec {
    type Item = String;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> io::Result<Option<Self::Item>> {
        if self.skip_lf && !src.is_empty() {
            if src[0] == b'\n' {
                src.advance(1);
            }
            self.skip_lf = false;
        }

        let start = self.next_index.min(src.len());
        let offset = src[start..].iter().position(|b| *b == b'\n' || *b == b'\r');

        let Some(offset) = offset else {
            self.next_index = src.len();
            return Ok(None);
        };

        let line_len = start + offset;
        self.next_index = 0;

        if src[line_len] == b'\n' {
            return Ok(Some(Self::take_line(src, line_len, 1)));
        }

        match src.get(line_len + 1) {
            Some(b'\n') => Ok(Some(Self::take_line(src, line_len, 2))),
            Some(_) => Ok(Some(Self::take_line(src, line_len, 1))),
            None => {
                self.skip_lf = true;
                Ok(Some(Self::take_line(src, line_len, 1)))
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> io::Result<Option<Self::Item>> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        self.next_index = 0;
        self.skip_lf = false;
        if src.is_empty() {
            return Ok(None);
        }
        let len = src.len();
        Ok(Some(Self::take_line(src, len, 0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_line_waits_for_newline() {
        let mut codec = SseLineCodec::new();
        let mut buf = BytesMut::from(&b"data: hel"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(b"lo\n");
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("data: hello"));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_eof_flushes_unterminated_line() {
        let mut codec = SseLineCodec::new();
        let mut buf = BytesMut::from(&b"data: tail"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert_eq!(codec.decode_eof(&mut buf).unwrap().as_deref(), Some("data: tail"));
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), None);
    }

    #[test]
    fn test_bare_carriage_return_ends_line() {
        let mut codec = SseLineCodec::new();
        let mut buf = BytesMut::from(&b"data: a\rdata: b\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("data: a"));
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("data: b"));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_crlf_split_across_reads_yields_one_line() {
        let mut codec = SseLineCodec::new();
        let mut buf = BytesMut::from(&b"data: a\r"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("data: a"));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(b"\ndata: b\n");
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("data: b"));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn test_carriage_return_before_blank_line() {
        let mut codec = SseLineCodec::new();
        let mut buf = BytesMut::from(&b"data: a\r\rdata: b\r"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("data: a"));
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some(""));
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("data: b"));
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), None);
    }
}
