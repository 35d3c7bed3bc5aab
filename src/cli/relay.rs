//! relay 命令：读取 JSONL 通知事件，跑完整管线并等待投递结束

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tracing::{info, warn};

use super::output::{format_output, read_input};
use crate::config::RelayConfig;
use crate::delivery::{
    DeliveryQueue, DeliveryStatsSnapshot, DeliveryTransport, DryRunTransport, HttpTransport, RetryPolicy,
};
use crate::notification::{CaptureOutcome, CapturePipeline, Classifier, NotificationEvent, PayloadDeduplicator};

/// relay 命令参数
#[derive(Args)]
pub struct RelayArgs {
    /// JSONL 事件文件（默认读取 stdin）
    #[arg(long, short)]
    pub file: Option<PathBuf>,
    /// Dry-run 模式（只打印不发送）
    #[arg(long)]
    pub dry_run: bool,
    /// 等待投递完成的最长时间（秒）
    #[arg(long, default_value = "300")]
    pub drain_timeout: u64,
}

#[derive(Debug, Default, Serialize)]
struct RelayReport {
    events: usize,
    invalid: usize,
    skipped: usize,
    duplicates: usize,
    enqueued: usize,
    delivery: DeliveryStatsSnapshot,
    drained: bool,
}

/// 处理 relay 命令
pub async fn handle_relay(args: RelayArgs, config: &RelayConfig) -> Result<()> {
    let transport: Arc<dyn DeliveryTransport> = if args.dry_run {
        Arc::new(DryRunTransport)
    } else {
        Arc::new(HttpTransport::new(&config.delivery)?)
    };

    let queue = Arc::new(DeliveryQueue::start(
        transport,
        RetryPolicy::from(&config.delivery),
        config.delivery.workers,
    ));
    let pipeline = CapturePipeline::new(
        Classifier::new(&config.classifier),
        PayloadDeduplicator::new(config.dedup_window()),
        queue.clone(),
    );

    let input = read_input(args.file.as_deref())?;
    let mut report = RelayReport::default();

    for (index, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        report.events += 1;

        // 单条事件解析失败不影响后续事件
        let event: NotificationEvent = match serde_json::from_str(line) {
            Ok(event) => event,
            Err(e) => {
                warn!(line = index + 1, error = %e, "Ignoring invalid notification event");
                report.invalid += 1;
                continue;
            }
        };

        match pipeline.process(&event) {
            CaptureOutcome::Skipped => report.skipped += 1,
            CaptureOutcome::Duplicate => report.duplicates += 1,
            CaptureOutcome::Enqueued => report.enqueued += 1,
        }
    }

    info!(enqueued = report.enqueued, "Waiting for delivery queue to drain");
    report.drained = tokio::time::timeout(Duration::from_secs(args.drain_timeout), queue.wait_idle())
        .await
        .is_ok();
    if !report.drained {
        warn!(pending = queue.pending(), "Drain timeout reached, pending payloads abandoned");
    }
    report.delivery = queue.stats();

    println!("{}", format_output(&report));
    Ok(())
}
