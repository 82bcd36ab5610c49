pub use sea_orm_migration::prelude::*;

mod m20250101_000001_enable_postgis;
mod m20250101_000002_create_mines_table;
mod m20250101_000003_create_drill_holes_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_enable_postgis::Migration),
            Box::new(m20250101_000002_create_mines_table::Migration),
            Box::new(m20250101_000003_create_drill_holes_table::Migration),
        ]
    }
}

/// 规范化数据库连接串
///
/// 兼容 SQLAlchemy 风格的驱动后缀：`postgresql+psycopg2://`、`postgresql+asyncpg://`
/// 等统一改写为 sqlx 可识别的 `postgres://`。其他形式保持不变。
pub fn normalize_database_url(raw_url: &str) -> String {
    let raw_url = raw_url.trim();
    let Some((scheme, rest)) = raw_url.split_once("://") else {
        return raw_url.to_string();
    };

    let base_scheme = scheme.split('+').next().unwrap_or(scheme);
    match base_scheme {
        "postgresql" | "postgres" => format!("postgres://{rest}"),
        _ => raw_url.to_string(),
    }
}
