//! 投递队列 - 异步、可重试地转发 payload
//!
//! - `enqueue` 立即返回，不阻塞宿主回调，也不向调用方报错
//! - 固定数量的 worker 从内存队列消费，共享同一个 transport
//! - 失败后按指数退避重新排队，超过 `max_attempts` 后丢弃并记录日志
//! - 不同 payload 之间互不阻塞，也不保证顺序
//! - 队列持有唯一的强 sender；worker 只持有弱引用用于重排队，
//!   `shutdown()` 或 drop 队列都会关闭通道并让 worker 退出

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError};

use serde::Serialize;
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::retry::{DeliveryAttempt, RetryPolicy};
use super::transport::DeliveryTransport;
use crate::notification::TransactionPayload;

/// 投递统计
#[derive(Debug, Default)]
pub struct DeliveryStats {
    enqueued: AtomicU64,
    delivered: AtomicU64,
    retried: AtomicU64,
    dropped: AtomicU64,
}

/// 统计快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryStatsSnapshot {
    pub enqueued: u64,
    pub delivered: u64,
    pub retried: u64,
    pub dropped: u64,
}

impl DeliveryStats {
    pub fn snapshot(&self) -> DeliveryStatsSnapshot {
        DeliveryStatsSnapshot {
            enqueued: self.enqueued.load(Ordering::SeqCst),
            delivered: self.delivered.load(Ordering::SeqCst),
            retried: self.retried.load(Ordering::SeqCst),
            dropped: self.dropped.load(Ordering::SeqCst),
        }
    }
}

/// worker 之间共享的状态
struct QueueShared {
    transport: Arc<dyn DeliveryTransport>,
    policy: RetryPolicy,
    stats: DeliveryStats,
    /// 尚未成功或丢弃的 payload 数量（含等待重试的）
    pending: AtomicUsize,
    idle: Notify,
}

impl QueueShared {
    fn finish(&self) {
        if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}

/// 投递队列
pub struct DeliveryQueue {
    /// `shutdown()` 后为 None
    sender: std::sync::Mutex<Option<mpsc::UnboundedSender<DeliveryAttempt>>>,
    shared: Arc<QueueShared>,
    workers: std::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl DeliveryQueue {
    /// 启动队列和 worker（必须在 tokio runtime 内调用）
    pub fn start(transport: Arc<dyn DeliveryTransport>, policy: RetryPolicy, workers: usize) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let receiver = Arc::new(Mutex::new(receiver));
        let shared = Arc::new(QueueShared {
            transport,
            policy,
            stats: DeliveryStats::default(),
            pending: AtomicUsize::new(0),
            idle: Notify::new(),
        });

        let worker_count = workers.max(1);
        let handles = (0..worker_count)
            .map(|id| {
                tokio::spawn(worker_loop(
                    id,
                    receiver.clone(),
                    sender.downgrade(),
                    shared.clone(),
                ))
            })
            .collect();

        info!(
            transport = shared.transport.name(),
            workers = worker_count,
            max_attempts = policy.max_attempts,
            "Delivery queue started"
        );

        Self {
            sender: std::sync::Mutex::new(Some(sender)),
            shared,
            workers: std::sync::Mutex::new(handles),
        }
    }

    /// 入队，立即返回
    pub fn enqueue(&self, payload: TransactionPayload) {
        self.shared.pending.fetch_add(1, Ordering::SeqCst);
        self.shared.stats.enqueued.fetch_add(1, Ordering::SeqCst);

        let attempt = DeliveryAttempt::new(payload);
        let sent = match self.sender.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
            Some(sender) => sender.send(attempt).map_err(|e| e.0),
            None => Err(attempt),
        };

        if let Err(attempt) = sent {
            error!(source_app = %attempt.payload.source_app, "Delivery queue closed, payload dropped");
            self.shared.stats.dropped.fetch_add(1, Ordering::SeqCst);
            self.shared.finish();
        }
    }

    /// 统计快照
    pub fn stats(&self) -> DeliveryStatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// 等待中的 payload 数量
    pub fn pending(&self) -> usize {
        self.shared.pending.load(Ordering::SeqCst)
    }

    /// 等待所有 payload 成功或被丢弃
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.shared.idle.notified();
            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// 等待空闲后关闭通道并等待 worker 退出
    ///
    /// 之后的 `enqueue` 会直接计为丢弃。
    pub async fn shutdown(&self) {
        self.wait_idle().await;
        self.sender.lock().unwrap_or_else(PoisonError::into_inner).take();

        let handles = std::mem::take(&mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner));
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Delivery worker ended abnormally");
            }
        }
        debug!("Delivery queue stopped");
    }
}

async fn worker_loop(
    id: usize,
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<DeliveryAttempt>>>,
    requeue: mpsc::WeakUnboundedSender<DeliveryAttempt>,
    shared: Arc<QueueShared>,
) {
    loop {
        let next = { receiver.lock().await.recv().await };
        let Some(attempt) = next else {
            debug!(worker = id, "Delivery worker exiting");
            return;
        };
        process_attempt(id, attempt, &requeue, &shared).await;
    }
}

async fn process_attempt(
    worker: usize,
    mut attempt: DeliveryAttempt,
    requeue: &mpsc::WeakUnboundedSender<DeliveryAttempt>,
    shared: &Arc<QueueShared>,
) {
    match shared.transport.deliver(&attempt.payload).await {
        Ok(()) => {
            info!(
                worker,
                source_app = %attempt.payload.source_app,
                attempt = attempt.attempt_count + 1,
                "Payload delivered"
            );
            shared.stats.delivered.fetch_add(1, Ordering::SeqCst);
            shared.finish();
        }
        Err(e) => match attempt.record_failure(e.to_string(), &shared.policy) {
            Some(delay) => {
                warn!(
                    worker,
                    source_app = %attempt.payload.source_app,
                    attempt = attempt.attempt_count,
                    retry_in_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %e,
                    "Delivery failed, scheduling retry"
                );
                shared.stats.retried.fetch_add(1, Ordering::SeqCst);

                // 等待期间不占用 worker
                let requeue = requeue.clone();
                let shared = shared.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let sent = match requeue.upgrade() {
                        Some(sender) => sender.send(attempt).map_err(|e| e.0),
                        None => Err(attempt),
                    };
                    if let Err(attempt) = sent {
                        error!(source_app = %attempt.payload.source_app, "Delivery queue closed before retry");
                        shared.stats.dropped.fetch_add(1, Ordering::SeqCst);
                        shared.finish();
                    }
                });
            }
            None => {
                error!(
                    source_app = %attempt.payload.source_app,
                    attempts = attempt.attempt_count,
                    last_error = attempt.last_error.as_deref().unwrap_or_default(),
                    preview = %attempt.payload.preview(40),
                    "Delivery failed permanently, payload dropped"
                );
                shared.stats.dropped.fetch_add(1, Ordering::SeqCst);
                shared.finish();
            }
        },
    }
}
