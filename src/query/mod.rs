//! 查询层 - 受权限保护的历史短信查询
//!
//! caller -> PermissionGate::check -> QueryEngine::query -> MessageStore

pub mod engine;
pub mod error;
pub mod filter;
pub mod record;
pub mod store;

pub use engine::{QueryEngine, QueryResult, READ_ERROR_MESSAGE};
pub use error::{QueryError, QueryErrorBody};
pub use filter::{Predicate, QueryFilter};
pub use record::{MessageRecord, MESSAGE_TYPE_INBOX, MESSAGE_TYPE_SENT};
pub use store::{InMemoryMessageStore, JsonlMessageStore, MessageStore, StoreError};
