//! Relay 配置
//!
//! 配置读取优先级：
//! 1. 环境变量 `MOMO_RELAY_CONFIG` 指向的 JSON 文件，否则 `~/.config/momo-relay/config.json`
//! 2. 环境变量 `MOMO_RELAY_ENDPOINT` / `MOMO_RELAY_TOKEN` 覆盖文件中的 endpoint 与 token
//! 3. 未设置的字段使用默认值
//!
//! endpoint 没有默认值，投递前必须显式配置。

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// 默认允许列表：MTN MoMo 与 Airtel Money
pub const DEFAULT_ALLOWED_APPS: &[&str] = &["rw.mtn.momo", "com.airtel.money"];

/// 默认发送方提示词
pub const DEFAULT_SENDER_HINTS: &[&str] =
    &["MTN", "AIRTEL", "AIRTELMONEY", "MTNMOMO", "RW-MTN", "RW-AIRTEL"];

/// 默认金融关键词
pub const DEFAULT_MONEY_KEYWORDS: &[&str] = &["PAYMENT", "RECEIVED", "MOMO"];

/// 查询上限
pub const DEFAULT_MAX_LIMIT: i64 = 500;

/// 未指定 limit 时的默认值
pub const DEFAULT_QUERY_LIMIT: i64 = 100;

/// 完整配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub classifier: ClassifierConfig,
    pub delivery: DeliveryConfig,
    pub query: QueryConfig,
    /// 去重窗口（秒），0 表示关闭
    pub dedup_window_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            delivery: DeliveryConfig::default(),
            query: QueryConfig::default(),
            dedup_window_secs: 60,
        }
    }
}

/// 分类器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// 无条件视为候选的应用包名
    pub allowed_apps: Vec<String>,
    /// 发送方提示词（大小写不敏感）
    pub sender_hints: Vec<String>,
    /// 金融关键词（大小写不敏感）
    pub money_keywords: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            allowed_apps: to_strings(DEFAULT_ALLOWED_APPS),
            sender_hints: to_strings(DEFAULT_SENDER_HINTS),
            money_keywords: to_strings(DEFAULT_MONEY_KEYWORDS),
        }
    }
}

/// 投递配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// 接收端 URL
    pub endpoint: Option<String>,
    /// Bearer token（可选）
    pub token: Option<String>,
    /// 单个 payload 最多尝试次数
    pub max_attempts: u32,
    /// 退避基数（毫秒）
    pub backoff_base_ms: u64,
    /// 退避上限（毫秒）
    pub backoff_cap_ms: u64,
    /// 连接超时（秒）
    pub connect_timeout_secs: u64,
    /// 读取超时（秒）
    pub read_timeout_secs: u64,
    /// worker 数量
    pub workers: usize,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            token: None,
            max_attempts: 5,
            backoff_base_ms: 500,
            backoff_cap_ms: 60_000,
            connect_timeout_secs: 8,
            read_timeout_secs: 8,
            workers: 4,
        }
    }
}

impl DeliveryConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

/// 查询配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub max_limit: i64,
    pub default_limit: i64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_limit: DEFAULT_MAX_LIMIT,
            default_limit: DEFAULT_QUERY_LIMIT,
        }
    }
}

impl RelayConfig {
    /// 默认配置文件路径
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var("MOMO_RELAY_CONFIG") {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("momo-relay")
            .join("config.json")
    }

    /// 从文件和环境变量加载配置
    pub fn auto_load() -> Result<Self> {
        let path = Self::default_path();
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            debug!(path = %path.display(), "Config file not found, using defaults");
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// 读取指定的 JSON 配置文件
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: RelayConfig = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        debug!(path = %path.display(), "Loaded relay config");
        Ok(config)
    }

    /// 用环境变量覆盖 endpoint 与 token
    pub fn apply_env(&mut self) {
        if let Ok(endpoint) = std::env::var("MOMO_RELAY_ENDPOINT") {
            if !endpoint.is_empty() {
                self.delivery.endpoint = Some(endpoint);
            }
        }
        if let Ok(token) = std::env::var("MOMO_RELAY_TOKEN") {
            if !token.is_empty() {
                self.delivery.token = Some(token);
            }
        }
    }

    pub fn dedup_window(&self) -> Duration {
        Duration::from_secs(self.dedup_window_secs)
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
