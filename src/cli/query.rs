//! query / store-add 命令：查询历史短信，或向本地存储追加记录

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::Utc;
use clap::Args;

use super::output::format_output;
use super::permissions::build_gate;
use crate::config::RelayConfig;
use crate::query::{
    JsonlMessageStore, MessageRecord, QueryEngine, QueryError, QueryFilter, QueryResult, MESSAGE_TYPE_INBOX,
};

/// 默认存储路径 `~/.config/momo-relay/messages.jsonl`
pub fn default_store_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("momo-relay")
        .join("messages.jsonl")
}

/// query 命令参数
#[derive(Args)]
pub struct QueryArgs {
    /// JSONL 短信存储文件
    #[arg(long)]
    pub store: Option<PathBuf>,
    /// 发送方子串
    #[arg(long)]
    pub sender: Option<String>,
    /// 起始时间（毫秒时间戳，含）
    #[arg(long)]
    pub since: Option<i64>,
    /// 最多返回条数（默认取配置 query.default_limit）
    #[arg(long, allow_negative_numbers = true)]
    pub limit: Option<i64>,
    /// 权限文件
    #[arg(long)]
    pub permissions_file: Option<PathBuf>,
    /// 输出 JSON 格式
    #[arg(long)]
    pub json: bool,
}

/// store-add 命令参数
#[derive(Args)]
pub struct StoreAddArgs {
    /// JSONL 短信存储文件
    #[arg(long)]
    pub store: Option<PathBuf>,
    /// 发送方
    #[arg(long)]
    pub sender: String,
    /// 短信内容
    #[arg(long)]
    pub body: String,
    /// 毫秒时间戳（默认当前时间）
    #[arg(long)]
    pub timestamp: Option<i64>,
}

/// 处理 query 命令
pub fn handle_query(args: QueryArgs, config: &RelayConfig) -> Result<()> {
    let store = JsonlMessageStore::new(args.store.unwrap_or_else(default_store_path));
    let engine = QueryEngine::new(build_gate(args.permissions_file), Arc::new(store))
        .with_max_limit(config.query.max_limit);

    let filter = QueryFilter {
        sender_pattern: args.sender,
        since_timestamp_ms: args.since,
        limit: args.limit.unwrap_or(config.query.default_limit),
    };

    let outcome = engine.query(&filter);
    println!("{}", format_query_outcome(&outcome, args.json));
    outcome
        .map(|_| ())
        .map_err(|e| anyhow!("query failed: {}", e.code()))
}

/// 格式化查询结果：JSON 或每行一条的文本
pub fn format_query_outcome(outcome: &Result<QueryResult, QueryError>, json: bool) -> String {
    match (outcome, json) {
        (Ok(result), true) => format_output(result),
        (Err(e), true) => format_output(&e.to_body()),
        (Ok(result), false) => {
            let mut lines: Vec<String> = result
                .messages
                .iter()
                .map(|m| format!("{}\t{}\t{}", m.timestamp_ms, m.sender, m.body.replace('\n', " ")))
                .collect();
            lines.push(format!("{} message(s)", result.count));
            lines.join("\n")
        }
        (Err(e), false) => format!("{}: {}", e.code(), e),
    }
}

/// 处理 store-add 命令
pub fn handle_store_add(args: StoreAddArgs) -> Result<()> {
    let store = JsonlMessageStore::new(args.store.unwrap_or_else(default_store_path));
    let timestamp_ms = args.timestamp.unwrap_or_else(|| Utc::now().timestamp_millis());

    let record = MessageRecord {
        id: format!("{}", timestamp_ms),
        sender: args.sender,
        body: args.body,
        timestamp_ms,
        kind: MESSAGE_TYPE_INBOX,
    };
    store.append(&record)?;
    println!("{}", format_output(&record));
    Ok(())
}
