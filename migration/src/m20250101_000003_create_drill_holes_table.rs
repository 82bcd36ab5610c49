use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DrillHoles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DrillHoles::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DrillHoles::MineId).uuid().not_null())
                    .col(ColumnDef::new(DrillHoles::Name).string_len(120).not_null())
                    .col(ColumnDef::new(DrillHoles::Depth).double().null())
                    .col(
                        ColumnDef::new(DrillHoles::CollarLocation)
                            .custom(Alias::new("geometry(Point, 4326)"))
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DrillHoles::Path)
                            .custom(Alias::new("geometry(LineString, 4326)"))
                            .null(),
                    )
                    .col(
                        ColumnDef::new(DrillHoles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(DrillHoles::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    // 删除矿山时级联删除其钻孔
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_drill_holes_mine_id")
                            .from(DrillHoles::Table, DrillHoles::MineId)
                            .to(Mines::Table, Mines::Id)
                            .on_update(ForeignKeyAction::Cascade)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_drill_holes_mine_id")
                    .table(DrillHoles::Table)
                    .col(DrillHoles::MineId)
                    .to_owned(),
            )
            .await?;

        let db = manager.get_connection();

        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_drill_holes_collar_location \
             ON drill_holes USING GIST (collar_location)",
        )
        .await?;

        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_drill_holes_path ON drill_holes USING GIST (path)",
        )
        .await?;

        db.execute_unprepared(
            "CREATE TRIGGER trg_drill_holes_updated_at BEFORE UPDATE ON drill_holes \
             FOR EACH ROW EXECUTE FUNCTION set_updated_at()",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DrillHoles::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DrillHoles {
    Table,
    Id,
    MineId,
    Name,
    Depth,
    CollarLocation,
    Path,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Mines {
    Table,
    Id,
}
