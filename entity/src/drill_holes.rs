//! # 钻孔实体定义
//!
//! `drill_holes` 表的 Sea-ORM 实体模型，每个钻孔隶属于一个矿山

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 钻孔实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "drill_holes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub mine_id: Uuid,
    pub name: String,
    pub depth: Option<f64>,
    /// 孔口位置，`geometry(Point, 4326)`
    #[sea_orm(select_as = "text", save_as = "geometry")]
    pub collar_location: String,
    /// 钻孔轨迹，`geometry(LineString, 4326)`
    #[sea_orm(select_as = "text", save_as = "geometry")]
    pub path: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::mines::Entity",
        from = "Column::MineId",
        to = "super::mines::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Mine,
}

impl Related<super::mines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Mine.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
