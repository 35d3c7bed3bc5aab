//! 通知捕获管线
//!
//! 宿主每收到一条系统通知就调用一次 `NotificationSink::on_notification_posted`。
//! 回调必须快速返回，任何失败都在这里吸收并记录，不能传回事件源。
//!
//! 流程：Classifier -> Extractor -> PayloadDeduplicator -> DeliveryQueue

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::classifier::Classifier;
use super::deduplicator::PayloadDeduplicator;
use super::event::NotificationEvent;
use super::extractor::extract;
use crate::delivery::DeliveryQueue;

/// 宿主通知回调（由 NotificationSource 调用）
///
/// 实现必须快速返回，且不能把失败传回调用方。
pub trait NotificationSink: Send + Sync {
    fn on_notification_posted(&self, event: NotificationEvent);
}

/// 单条事件的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureOutcome {
    /// 不是交易候选
    Skipped,
    /// 窗口内已转发过相同内容
    Duplicate,
    /// 已交给投递队列
    Enqueued,
}

/// 捕获管线
pub struct CapturePipeline {
    classifier: Classifier,
    dedup: Mutex<PayloadDeduplicator>,
    queue: Arc<DeliveryQueue>,
}

impl CapturePipeline {
    pub fn new(classifier: Classifier, dedup: PayloadDeduplicator, queue: Arc<DeliveryQueue>) -> Self {
        Self {
            classifier,
            dedup: Mutex::new(dedup),
            queue,
        }
    }

    pub fn queue(&self) -> &Arc<DeliveryQueue> {
        &self.queue
    }

    /// 处理一条事件
    pub fn process(&self, event: &NotificationEvent) -> CaptureOutcome {
        let classification = self.classifier.classify(event);
        if !classification.is_candidate {
            debug!(source_app = %event.source_app, "Notification skipped (not a transaction candidate)");
            return CaptureOutcome::Skipped;
        }

        let payload = extract(event);

        let forward = match self.dedup.lock() {
            Ok(mut dedup) => dedup.should_forward(&payload),
            Err(poisoned) => {
                warn!("Deduplicator lock poisoned, recovering");
                poisoned.into_inner().should_forward(&payload)
            }
        };
        if !forward {
            return CaptureOutcome::Duplicate;
        }

        info!(
            source_app = %payload.source_app,
            hints = ?classification.matched_hints,
            preview = %payload.preview(40),
            "Transaction candidate captured"
        );
        self.queue.enqueue(payload);
        CaptureOutcome::Enqueued
    }
}

impl NotificationSink for CapturePipeline {
    fn on_notification_posted(&self, event: NotificationEvent) {
        self.process(&event);
    }
}
