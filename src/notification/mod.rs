//! 通知捕获层 - 识别交易通知并生成 payload
//!
//! # 设计目标
//! 1. 不阻塞：分类和提取都是纯函数，在宿主回调内同步完成
//! 2. 不外抛：回调边界吸收所有失败，只记录日志
//! 3. 单一入口：资金应用通知和短信通知共用一个 Classifier，并做跨来源去重
//!
//! # 使用示例
//! ```ignore
//! use momo_relay::notification::{Classifier, extract};
//!
//! let classifier = Classifier::default();
//! if classifier.classify(&event).is_candidate {
//!     queue.enqueue(extract(&event));
//! }
//! ```

pub mod classifier;
pub mod deduplicator;
pub mod event;
pub mod extractor;
pub mod listener;
pub mod payload;

pub use classifier::{normalized_text, ClassificationResult, Classifier};
pub use deduplicator::PayloadDeduplicator;
pub use event::{NotificationEvent, NotificationEventBuilder};
pub use extractor::extract;
pub use listener::{CaptureOutcome, CapturePipeline, NotificationSink};
pub use payload::TransactionPayload;
