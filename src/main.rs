//! MoMo Relay CLI
//!
//! 捕获移动支付通知、转发候选交易、查询历史短信

use anyhow::Result;
use clap::{Parser, Subcommand};
use momo_relay::cli::{
    handle_classify, handle_permissions, handle_query, handle_relay, handle_store_add, ClassifyArgs,
    PermissionsArgs, QueryArgs, RelayArgs, StoreAddArgs,
};
use momo_relay::RelayConfig;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "momo-relay")]
#[command(about = "MoMo Relay - 转发移动支付通知并查询历史短信")]
#[command(version)]
struct Cli {
    /// 配置文件（默认 ~/.config/momo-relay/config.json）
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 对单条通知事件分类
    Classify(ClassifyArgs),
    /// 处理 JSONL 通知事件流并投递候选交易
    Relay(RelayArgs),
    /// 查询历史短信（需要授权）
    Query(QueryArgs),
    /// 向本地短信存储追加一条记录
    StoreAdd(StoreAddArgs),
    /// 检查或请求短信访问权限
    Permissions(PermissionsArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // 通过 RUST_LOG 环境变量控制日志级别，默认为 info
    // 例如: RUST_LOG=debug momo-relay relay --dry-run
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("momo_relay=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            let mut config = RelayConfig::load_from(path)?;
            config.apply_env();
            config
        }
        None => RelayConfig::auto_load()?,
    };

    match cli.command {
        Commands::Classify(args) => handle_classify(args, &config)?,
        Commands::Relay(args) => handle_relay(args, &config).await?,
        Commands::Query(args) => handle_query(args, &config)?,
        Commands::StoreAdd(args) => handle_store_add(args)?,
        Commands::Permissions(args) => handle_permissions(args).await?,
    }

    Ok(())
}
