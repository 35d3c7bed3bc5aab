//! classify 命令：对单条通知事件做分类并展示 payload

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use super::output::{format_output, read_input};
use crate::config::RelayConfig;
use crate::notification::{extract, ClassificationResult, Classifier, NotificationEvent, TransactionPayload};

/// classify 命令参数
#[derive(Args)]
pub struct ClassifyArgs {
    /// 事件 JSON 文件（默认读取 stdin）
    #[arg(long, short)]
    pub file: Option<PathBuf>,
}

#[derive(Serialize)]
struct ClassifyReport {
    classification: ClassificationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<TransactionPayload>,
}

/// 处理 classify 命令
pub fn handle_classify(args: ClassifyArgs, config: &RelayConfig) -> Result<()> {
    let input = read_input(args.file.as_deref())?;
    let event: NotificationEvent =
        serde_json::from_str(input.trim()).context("Invalid notification event JSON")?;

    let classification = Classifier::new(&config.classifier).classify(&event);
    let payload = classification.is_candidate.then(|| extract(&event));

    println!(
        "{}",
        format_output(&ClassifyReport {
            classification,
            payload,
        })
    );
    Ok(())
}
