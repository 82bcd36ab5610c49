//! # 服务层
//!
//! 封装数据库访问，HTTP handler 只负责提取参数与组装响应。

pub mod mines;

pub use mines::MineService;
