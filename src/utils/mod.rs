//! # 工具模块

pub mod line_codec;
