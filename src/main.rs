//! # GeoAI Server 主程序

use clap::Parser;
use geoai_server::{
    Result,
    api::{ApiServer, AppState, server::shutdown_signal},
    config::ConfigManager,
    database,
    error::Context,
    lerror, linfo,
    logging::{self, LogComponent, LogStage},
    proxy::DifyClient,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "geoai-server")]
#[command(about = "Mine and drill-hole geodata API with a streaming Dify chat relay", long_about = None)]
struct Cli {
    /// 配置文件路径（`GEOAI_CONFIG_PATH` 优先）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 日志级别，未设置 `RUST_LOG` 时生效
    #[arg(long)]
    log_level: Option<String>,

    /// 打印日志配置指南后退出
    #[arg(long)]
    logging_help: bool,

    /// 启动时跳过数据库迁移
    #[arg(long)]
    skip_migrations: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.logging_help {
        logging::print_logging_help();
        return Ok(());
    }

    // 初始化日志系统
    logging::init_optimized_logging(cli.log_level.as_ref());

    if let Err(e) = run(cli).await {
        lerror!(
            "system",
            LogStage::Startup,
            LogComponent::Main,
            "service_start_failed",
            &format!("服务启动失败: {e:?}")
        );
        std::process::exit(1);
    }

    linfo!(
        "system",
        LogStage::Shutdown,
        LogComponent::Main,
        "service_shutdown",
        "服务正常关闭"
    );
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config_manager = ConfigManager::new(cli.config.as_deref())?;
    let config = config_manager.config();

    let db = database::init_database(&config.database)
        .await
        .context("数据库连接失败")?;

    if config.database.run_migrations && !cli.skip_migrations {
        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::Database,
            "run_migrations",
            "📋 执行数据库迁移..."
        );
        database::run_migrations(&db)
            .await
            .context("数据库迁移失败")?;
    } else {
        database::check_database_status(&db)
            .await
            .context("数据库状态检查失败")?;
    }

    let upstream = DifyClient::new(config.dify.clone())?;
    let state = AppState::new(Arc::clone(&config), Arc::new(db), Arc::new(upstream));
    let server = ApiServer::new(state);

    tokio::spawn(shutdown_signal(server.shutdown_token()));

    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Main,
        "service_starting",
        "服务启动"
    );
    server.serve().await
}
