//! # 数据库模块
//!
//! 数据库连接、迁移管理和健康探测

use crate::config::DatabaseConfig;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr, Statement};
use sea_orm_migration::MigratorTrait;
use tracing::{error, info, warn};

/// 初始化数据库连接
pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    info!("正在连接数据库: {}", config.masked_url());

    let db = Database::connect(config.connect_options()).await?;

    info!("数据库连接成功");
    Ok(db)
}

/// 运行数据库迁移
pub async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    info!("开始运行数据库迁移...");

    match ::migration::Migrator::up(db, None).await {
        Ok(()) => {
            info!("数据库迁移完成");
            Ok(())
        }
        Err(e) => {
            error!("数据库迁移失败: {}", e);
            Err(e)
        }
    }
}

/// 检查数据库状态
pub async fn check_database_status(db: &DatabaseConnection) -> Result<(), DbErr> {
    info!("检查数据库状态...");

    let status = ::migration::Migrator::get_pending_migrations(db).await?;

    if status.is_empty() {
        info!("所有迁移都已应用");
    } else {
        warn!("有 {} 个待应用的迁移", status.len());
    }

    Ok(())
}

/// 执行 `SELECT 1` 探测数据库是否可用
pub async fn ping(db: &DatabaseConnection) -> bool {
    let result = db
        .query_one(Statement::from_string(DbBackend::Postgres, "SELECT 1"))
        .await;

    match result {
        Ok(_) => true,
        Err(e) => {
            warn!("数据库探测失败: {}", e);
            false
        }
    }
}
