//! # Entity 模块
//!
//! 包含矿山与钻孔的 Sea-ORM 实体定义
//!
//! 几何列以 EWKT 文本写入（`CAST(... AS geometry)`），读取时转换为 `text`，
//! `PostGIS` 会将其渲染为十六进制 EWKB。

pub mod drill_holes;
pub mod mines;

pub use drill_holes::Entity as DrillHoles;
pub use mines::Entity as Mines;
