//! MoMo Relay - 捕获移动支付通知并转发到接收端，受权限保护地查询历史短信

pub mod cli;
pub mod config;
pub mod delivery;
pub mod notification;
pub mod permission;
pub mod query;

pub use config::RelayConfig;
pub use delivery::{DeliveryError, DeliveryQueue, DeliveryTransport, HttpTransport, RetryPolicy};
pub use notification::{
    extract, CaptureOutcome, CapturePipeline, ClassificationResult, Classifier, NotificationEvent,
    NotificationEventBuilder, NotificationSink, PayloadDeduplicator, TransactionPayload,
};
pub use permission::{PermissionBackend, PermissionCheck, PermissionGate, PermissionOutcome, PermissionState};
pub use query::{MessageRecord, MessageStore, QueryEngine, QueryError, QueryFilter, QueryResult};
