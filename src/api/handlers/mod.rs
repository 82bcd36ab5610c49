//! # HTTP 处理器

pub mod chat;
pub mod health;
pub mod mines;
