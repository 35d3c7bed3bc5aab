//! 查询过滤条件与谓词
//!
//! 过滤字段被翻译成可组合的 `Predicate`，不拼接任何查询字符串。
//! - sender：对发送方做子串包含匹配（ASCII 大小写不敏感，同 SQLite LIKE）
//! - since：`timestamp_ms >= since`
//! - 两者同时给出时用 AND 组合
//!
//! 空 sender 与 `since <= 0` 视为未设置。

use serde::{Deserialize, Serialize};
use std::fmt;

use super::record::MessageRecord;
use crate::config::DEFAULT_QUERY_LIMIT;

/// 查询过滤条件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryFilter {
    #[serde(default, alias = "sender")]
    pub sender_pattern: Option<String>,
    #[serde(default, alias = "since")]
    pub since_timestamp_ms: Option<i64>,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    DEFAULT_QUERY_LIMIT
}

impl Default for QueryFilter {
    fn default() -> Self {
        Self {
            sender_pattern: None,
            since_timestamp_ms: None,
            limit: DEFAULT_QUERY_LIMIT,
        }
    }
}

impl QueryFilter {
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender_pattern = Some(sender.into());
        self
    }

    pub fn with_since(mut self, since_timestamp_ms: i64) -> Self {
        self.since_timestamp_ms = Some(since_timestamp_ms);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// 把 limit 限制在 `[1, max_limit]`
    pub fn effective_limit(&self, max_limit: i64) -> usize {
        let max_limit = max_limit.max(1);
        self.limit.clamp(1, max_limit) as usize
    }

    /// 翻译为谓词
    pub fn to_predicate(&self) -> Predicate {
        let mut clauses = Vec::new();

        if let Some(sender) = self.sender_pattern.as_deref().map(str::trim) {
            if !sender.is_empty() {
                clauses.push(Predicate::SenderContains(sender.to_string()));
            }
        }
        if let Some(since) = self.since_timestamp_ms {
            if since > 0 {
                clauses.push(Predicate::SinceTimestamp(since));
            }
        }

        match clauses.len() {
            0 => Predicate::All,
            1 => clauses.remove(0),
            _ => Predicate::And(clauses),
        }
    }
}

/// 记录谓词
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// 匹配所有记录
    All,
    /// 发送方包含子串
    SenderContains(String),
    /// 时间戳不早于（毫秒）
    SinceTimestamp(i64),
    /// 全部满足
    And(Vec<Predicate>),
}

impl Predicate {
    pub fn matches(&self, record: &MessageRecord) -> bool {
        match self {
            Predicate::All => true,
            Predicate::SenderContains(pattern) => record
                .sender
                .to_ascii_lowercase()
                .contains(&pattern.to_ascii_lowercase()),
            Predicate::SinceTimestamp(since) => record.timestamp_ms >= *since,
            Predicate::And(clauses) => clauses.iter().all(|c| c.matches(record)),
        }
    }

    /// 与另一个谓词组合
    pub fn and(self, other: Predicate) -> Predicate {
        match (self, other) {
            (Predicate::All, p) | (p, Predicate::All) => p,
            (Predicate::And(mut left), Predicate::And(right)) => {
                left.extend(right);
                Predicate::And(left)
            }
            (Predicate::And(mut left), p) => {
                left.push(p);
                Predicate::And(left)
            }
            (p, Predicate::And(mut right)) => {
                right.insert(0, p);
                Predicate::And(right)
            }
            (a, b) => Predicate::And(vec![a, b]),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::All => write!(f, "*"),
            Predicate::SenderContains(pattern) => write!(f, "sender contains {:?}", pattern),
            Predicate::SinceTimestamp(since) => write!(f, "timestamp >= {}", since),
            Predicate::And(clauses) => {
                let parts: Vec<String> = clauses.iter().map(|c| c.to_string()).collect();
                write!(f, "{}", parts.join(" AND "))
            }
        }
    }
}
