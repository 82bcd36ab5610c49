//! # 矿山与钻孔服务

use entity::{DrillHoles, Mines, drill_holes, mines};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, SqlErr,
};
use uuid::Uuid;

use crate::error::{GeoAiError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::types::{CreateDrillHoleRequest, CreateMineRequest, DrillHoleSchema, MineSchema};
use crate::{ldebug, linfo};

pub struct MineService<'a> {
    db: &'a DatabaseConnection,
    request_id: &'a str,
}

impl<'a> MineService<'a> {
    #[must_use]
    pub const fn new(db: &'a DatabaseConnection, request_id: &'a str) -> Self {
        Self { db, request_id }
    }

    /// 全部矿山，按名称排序
    pub async fn list_mines(&self) -> Result<Vec<MineSchema>> {
        let models = Mines::find()
            .order_by_asc(mines::Column::Name)
            .all(self.db)
            .await?;

        ldebug!(
            self.request_id,
            LogStage::Db,
            LogComponent::MineService,
            "list_mines",
            &format!("查询到 {} 个矿山", models.len())
        );

        models.into_iter().map(MineSchema::try_from).collect()
    }

    pub async fn get_mine(&self, id: Uuid) -> Result<MineSchema> {
        MineSchema::try_from(self.find_mine(id).await?)
    }

    pub async fn create_mine(&self, request: CreateMineRequest) -> Result<MineSchema> {
        request.validate()?;

        let id = Uuid::new_v4();
        let name = request.name.trim().to_string();
        let mine_type = request.mine_type.trim().to_string();
        let active = mines::ActiveModel {
            id: Set(id),
            name: Set(name.clone()),
            mine_type: Set(mine_type.clone()),
            location: Set(request.location.to_ewkt()),
            elevation: Set(request.elevation),
            ..Default::default()
        };
        Mines::insert(active).exec_without_returning(self.db).await?;

        linfo!(
            self.request_id,
            LogStage::Db,
            LogComponent::MineService,
            "create_mine",
            &format!("创建矿山: id={id}, name={name}")
        );

        Ok(MineSchema {
            id,
            name,
            mine_type,
            elevation: request.elevation,
            location: request.location,
        })
    }

    /// 删除矿山，其钻孔由外键级联删除
    pub async fn delete_mine(&self, id: Uuid) -> Result<()> {
        let result = Mines::delete_by_id(id).exec(self.db).await?;
        if result.rows_affected == 0 {
            return Err(GeoAiError::not_found("mine", id.to_string()));
        }

        linfo!(
            self.request_id,
            LogStage::Db,
            LogComponent::MineService,
            "delete_mine",
            &format!("删除矿山: id={id}")
        );
        Ok(())
    }

    /// 某矿山的钻孔，按名称排序
    pub async fn list_drill_holes(&self, mine_id: Uuid) -> Result<Vec<DrillHoleSchema>> {
        self.find_mine(mine_id).await?;

        let models = DrillHoles::find()
            .filter(drill_holes::Column::MineId.eq(mine_id))
            .order_by_asc(drill_holes::Column::Name)
            .all(self.db)
            .await?;

        models.into_iter().map(DrillHoleSchema::try_from).collect()
    }

    pub async fn create_drill_hole(
        &self,
        mine_id: Uuid,
        request: CreateDrillHoleRequest,
    ) -> Result<DrillHoleSchema> {
        request.validate()?;
        self.find_mine(mine_id).await?;

        let id = Uuid::new_v4();
        let name = request.name.trim().to_string();
        let active = drill_holes::ActiveModel {
            id: Set(id),
            mine_id: Set(mine_id),
            name: Set(name.clone()),
            depth: Set(request.depth),
            collar_location: Set(request.collar_location.to_ewkt()),
            path: Set(request.path.as_ref().map(crate::types::GeoLineString::to_ewkt)),
            ..Default::default()
        };
        DrillHoles::insert(active)
            .exec_without_returning(self.db)
            .await
            .map_err(|e| {
                let sql_err = e.sql_err();
                drill_hole_insert_error(mine_id, e, sql_err)
            })?;

        linfo!(
            self.request_id,
            LogStage::Db,
            LogComponent::MineService,
            "create_drill_hole",
            &format!("创建钻孔: id={id}, mine_id={mine_id}, name={name}")
        );

        Ok(DrillHoleSchema {
            id,
            mine_id,
            name,
            depth: request.depth,
            collar_location: request.collar_location,
            path: request.path,
        })
    }

    async fn find_mine(&self, id: Uuid) -> Result<mines::Model> {
        Mines::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or_else(|| GeoAiError::not_found("mine", id.to_string()))
    }
}

/// 检查矿山存在后、插入钻孔前矿山可能被并发删除，外键冲突按矿山不存在处理
fn drill_hole_insert_error(mine_id: Uuid, err: DbErr, sql_err: Option<SqlErr>) -> GeoAiError {
    match sql_err {
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
            GeoAiError::not_found("mine", mine_id.to_string())
        }
        _ => err.into(),
    }
}
