//! Payload 去重器 - 防止同一笔交易被重复转发
//!
//! 资金应用本身的通知和短信应用的通知可能描述同一笔交易。
//! 去重键只取规范化正文的哈希，不含来源应用，所以两条通道送来的同一笔交易
//! 会得到同一个键；窗口内出现相同键则跳过。
//!
//! ## 规范化
//! 1. 连续空白合并为单个空格
//! 2. 转小写并去除首尾空白

use regex::Regex;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};
use tracing::debug;

use super::payload::TransactionPayload;

/// Payload 去重器
pub struct PayloadDeduplicator {
    /// 最近转发的键: dedup_key -> 时间
    recent: HashMap<u64, Instant>,
    /// 去重窗口，0 表示关闭
    window: Duration,
    whitespace: Regex,
}

impl PayloadDeduplicator {
    /// 创建去重器
    pub fn new(window: Duration) -> Self {
        Self {
            recent: HashMap::new(),
            window,
            whitespace: Regex::new(r"\s+").unwrap(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.window.is_zero()
    }

    /// 是否应该转发
    ///
    /// 返回 `true` 表示应该转发，`false` 表示窗口内已转发过相同内容
    pub fn should_forward(&mut self, payload: &TransactionPayload) -> bool {
        self.should_forward_at(payload, Instant::now())
    }

    /// 是否应该转发（带时间，用于测试）
    pub fn should_forward_at(&mut self, payload: &TransactionPayload, now: Instant) -> bool {
        if !self.is_enabled() {
            return true;
        }

        self.cleanup_expired(now);

        let key = self.dedup_key(payload);
        if let Some(seen) = self.recent.get(&key) {
            if now.saturating_duration_since(*seen) < self.window {
                debug!(
                    source_app = %payload.source_app,
                    key = %format!("{:016x}", key),
                    "Payload deduplicated within window"
                );
                return false;
            }
        }

        self.recent.insert(key, now);
        true
    }

    /// 生成去重键（与来源应用无关）
    pub fn dedup_key(&self, payload: &TransactionPayload) -> u64 {
        let body = if payload.text.is_empty() {
            &payload.big
        } else {
            &payload.text
        };
        let normalized = self.normalize(body);

        let mut hasher = DefaultHasher::new();
        normalized.hash(&mut hasher);
        hasher.finish()
    }

    fn normalize(&self, body: &str) -> String {
        self.whitespace
            .replace_all(body.trim(), " ")
            .to_lowercase()
    }

    /// 清理过期记录
    fn cleanup_expired(&mut self, now: Instant) {
        let window = self.window;
        self.recent
            .retain(|_, seen| now.saturating_duration_since(*seen) < window);
    }

    /// 当前记录数
    pub fn len(&self) -> usize {
        self.recent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }
}
