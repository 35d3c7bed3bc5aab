//! 重试策略与投递尝试
//!
//! 退避：`base * 2^attempt_count`，不超过 `cap`。
//! 单个 payload 最多尝试 `max_attempts` 次，之后丢弃。

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::config::DeliveryConfig;
use crate::notification::TransactionPayload;

/// 重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 最多尝试次数（含第一次）
    pub max_attempts: u32,
    /// 退避基数
    pub base: Duration,
    /// 退避上限
    pub cap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&DeliveryConfig::default())
    }
}

impl From<&DeliveryConfig> for RetryPolicy {
    fn from(config: &DeliveryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base: Duration::from_millis(config.backoff_base_ms),
            cap: Duration::from_millis(config.backoff_cap_ms),
        }
    }
}

impl RetryPolicy {
    /// 第 `attempt_count` 次失败后的等待时间
    pub fn delay_for(&self, attempt_count: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt_count).unwrap_or(u32::MAX);
        self.base
            .checked_mul(factor)
            .unwrap_or(self.cap)
            .min(self.cap)
    }
}

/// 一次投递尝试，只由 DeliveryQueue 的重试循环修改
#[derive(Debug, Clone)]
pub struct DeliveryAttempt {
    pub payload: TransactionPayload,
    /// 已经尝试的次数
    pub attempt_count: u32,
    pub last_error: Option<String>,
    pub next_retry_at: Option<DateTime<Utc>>,
}

impl DeliveryAttempt {
    pub fn new(payload: TransactionPayload) -> Self {
        Self {
            payload,
            attempt_count: 0,
            last_error: None,
            next_retry_at: None,
        }
    }

    /// 记录一次失败
    ///
    /// 返回下次重试前的等待时间；预算用尽时返回 `None`
    pub fn record_failure(&mut self, error: impl Into<String>, policy: &RetryPolicy) -> Option<Duration> {
        self.attempt_count += 1;
        self.last_error = Some(error.into());

        if self.attempt_count >= policy.max_attempts {
            self.next_retry_at = None;
            return None;
        }

        let delay = policy.delay_for(self.attempt_count);
        self.next_retry_at = chrono::Duration::from_std(delay)
            .ok()
            .map(|d| Utc::now() + d);
        Some(delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_attempts: u32, base_ms: u64, cap_ms: u64) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base: Duration::from_millis(base_ms),
            cap: Duration::from_millis(cap_ms),
        }
    }

    #[test]
    fn test_exponential_backoff() {
        let p = policy(5, 100, 60_000);
        assert_eq!(p.delay_for(1), Duration::from_millis(200));
        assert_eq!(p.delay_for(2), Duration::from_millis(400));
        assert_eq!(p.delay_for(3), Duration::from_millis(800));
    }

    #[test]
    fn test_backoff_respects_cap() {
        let p = policy(10, 100, 500);
        assert_eq!(p.delay_for(2), Duration::from_millis(400));
        assert_eq!(p.delay_for(3), Duration::from_millis(500));
        assert_eq!(p.delay_for(40), Duration::from_millis(500));
    }

    #[test]
    fn test_attempt_budget() {
        let p = policy(3, 10, 1_000);
        let mut attempt = DeliveryAttempt::new(TransactionPayload::default());

        let first = attempt.record_failure("HTTP 500", &p).unwrap();
        assert!(attempt.next_retry_at.is_some());
        let second = attempt.record_failure("timeout", &p).unwrap();
        assert!(second > first);

        assert!(attempt.record_failure("connection refused", &p).is_none());
        assert_eq!(attempt.attempt_count, 3);
        assert_eq!(attempt.last_error.as_deref(), Some("connection refused"));
        assert!(attempt.next_retry_at.is_none());
    }

    #[test]
    fn test_single_attempt_policy_never_retries() {
        let p = policy(1, 10, 1_000);
        let mut attempt = DeliveryAttempt::new(TransactionPayload::default());
        assert!(attempt.record_failure("HTTP 503", &p).is_none());
    }

    #[test]
    fn test_zero_attempts_config_means_one() {
        let config = DeliveryConfig {
            max_attempts: 0,
            ..Default::default()
        };
        assert_eq!(RetryPolicy::from(&config).max_attempts, 1);
    }
}
