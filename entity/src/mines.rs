//! # 矿山实体定义
//!
//! `mines` 表的 Sea-ORM 实体模型

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 矿山实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    /// 矿山类型（如 open_pit、underground）
    #[sea_orm(column_name = "type")]
    #[serde(rename = "type")]
    pub mine_type: String,
    /// 点位，`geometry(Point, 4326)`
    #[sea_orm(select_as = "text", save_as = "geometry")]
    pub location: String,
    pub elevation: Option<f64>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::drill_holes::Entity")]
    DrillHoles,
}

impl Related<super::drill_holes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DrillHoles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
