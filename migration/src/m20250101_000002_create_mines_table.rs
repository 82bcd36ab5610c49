use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Mines::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Mines::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Mines::Name).string_len(120).not_null())
                    .col(ColumnDef::new(Mines::Type).string_len(60).not_null())
                    .col(
                        ColumnDef::new(Mines::Location)
                            .custom(Alias::new("geometry(Point, 4326)"))
                            .not_null(),
                    )
                    .col(ColumnDef::new(Mines::Elevation).double().null())
                    .col(
                        ColumnDef::new(Mines::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Mines::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_mines_name")
                    .table(Mines::Table)
                    .col(Mines::Name)
                    .to_owned(),
            )
            .await?;

        let db = manager.get_connection();

        // 空间索引
        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_mines_location ON mines USING GIST (location)",
        )
        .await?;

        db.execute_unprepared(
            "CREATE TRIGGER trg_mines_updated_at BEFORE UPDATE ON mines \
             FOR EACH ROW EXECUTE FUNCTION set_updated_at()",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Mines::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Mines {
    Table,
    Id,
    Name,
    Type,
    Location,
    Elevation,
    CreatedAt,
    UpdatedAt,
}
