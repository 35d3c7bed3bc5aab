//! 查询引擎 - 权限检查后对历史短信做有界、有序的读取
//!
//! 1. 未授权 -> `PermissionDenied`（不访问存储）
//! 2. 过滤条件 -> 谓词，limit 限制在 `[1, max_limit]`
//! 3. 存储失败 -> `ReadError`，只返回简短描述
//!
//! 查询之间互不影响，引擎本身不持有任何锁。

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error};

use super::error::QueryError;
use super::filter::QueryFilter;
use super::record::MessageRecord;
use super::store::MessageStore;
use crate::config::DEFAULT_MAX_LIMIT;
use crate::permission::PermissionGate;

/// 存储失败时返回给调用方的描述
pub const READ_ERROR_MESSAGE: &str = "Failed to read SMS";

/// 查询结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryResult {
    /// 按时间戳降序
    pub messages: Vec<MessageRecord>,
    /// 返回的条数（不是存储中的总匹配数）
    pub count: usize,
}

/// 查询引擎
pub struct QueryEngine {
    gate: Arc<PermissionGate>,
    store: Arc<dyn MessageStore>,
    max_limit: i64,
}

impl QueryEngine {
    pub fn new(gate: Arc<PermissionGate>, store: Arc<dyn MessageStore>) -> Self {
        Self {
            gate,
            store,
            max_limit: DEFAULT_MAX_LIMIT,
        }
    }

    /// 设置 limit 上限
    pub fn with_max_limit(mut self, max_limit: i64) -> Self {
        self.max_limit = max_limit.max(1);
        self
    }

    pub fn gate(&self) -> &Arc<PermissionGate> {
        &self.gate
    }

    /// 执行查询
    pub fn query(&self, filter: &QueryFilter) -> Result<QueryResult, QueryError> {
        if !self.gate.check().granted {
            return Err(QueryError::PermissionDenied);
        }

        let limit = filter.effective_limit(self.max_limit);
        let predicate = filter.to_predicate();
        debug!(predicate = %predicate, limit, "Querying message store");

        let mut messages = self.store.fetch(&predicate, limit).map_err(|e| {
            error!(error = %e, "Message store read failed");
            QueryError::ReadError(READ_ERROR_MESSAGE.to_string())
        })?;

        // 外部存储的顺序和数量不可信
        messages.retain(|m| predicate.matches(m));
        messages.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
        messages.truncate(limit);

        let count = messages.len();
        Ok(QueryResult { messages, count })
    }
}
