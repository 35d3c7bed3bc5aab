//! 投递层 - 把候选交易可靠地转发到接收端
//!
//! # 组成
//! 1. `DeliveryTransport`：单次发送（HTTP POST / dry-run）
//! 2. `RetryPolicy` / `DeliveryAttempt`：有界重试与指数退避
//! 3. `DeliveryQueue`：worker 池 + 内存队列，`enqueue` 不阻塞调用方

pub mod queue;
pub mod retry;
pub mod transport;

pub use queue::{DeliveryQueue, DeliveryStats, DeliveryStatsSnapshot};
pub use retry::{DeliveryAttempt, RetryPolicy};
pub use transport::{DeliveryError, DeliveryTransport, DryRunTransport, HttpTransport};
