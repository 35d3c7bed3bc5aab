//! 投递传输层
//!
//! `HttpTransport` 通过 HTTP POST 把 payload 发送到接收端；
//! `DryRunTransport` 只打印日志，用于调试。

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::DeliveryConfig;
use crate::notification::TransactionPayload;

/// 投递失败
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("failed to serialize payload: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("endpoint returned HTTP {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for DeliveryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            DeliveryError::Timeout
        } else if e.is_connect() {
            DeliveryError::Connect(e.to_string())
        } else {
            DeliveryError::Transport(e.to_string())
        }
    }
}

/// 投递通道 trait
#[async_trait]
pub trait DeliveryTransport: Send + Sync {
    /// 名称（用于日志）
    fn name(&self) -> &str;

    /// 发送一次；只有 2xx 视为成功
    async fn deliver(&self, payload: &TransactionPayload) -> Result<(), DeliveryError>;
}

/// HTTP 传输，所有 worker 共享同一个 Client（连接池）
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    authorization: Option<String>,
}

impl HttpTransport {
    pub fn new(config: &DeliveryConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| anyhow!("delivery endpoint is not configured (set MOMO_RELAY_ENDPOINT)"))?
            .to_string();

        // reqwest 0.11 只有整体超时，读取上限 = 连接超时 + 读取超时
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.connect_timeout() + config.read_timeout())
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        let authorization = config
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(bearer_header);

        Ok(Self {
            client,
            endpoint,
            authorization,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// 已带 `Bearer ` 前缀的 token 原样使用
fn bearer_header(token: &str) -> String {
    if token.starts_with("Bearer ") {
        token.to_string()
    } else {
        format!("Bearer {}", token)
    }
}

#[async_trait]
impl DeliveryTransport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    async fn deliver(&self, payload: &TransactionPayload) -> Result<(), DeliveryError> {
        let body = payload.to_json()?;

        let mut request = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json; charset=utf-8")
            .body(body);
        if let Some(auth) = &self.authorization {
            request = request.header("Authorization", auth);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), source_app = %payload.source_app, "Endpoint response");

        if status.is_success() {
            Ok(())
        } else {
            Err(DeliveryError::Status(status.as_u16()))
        }
    }
}

/// Dry-run 传输：只打印，不发送
#[derive(Debug, Default)]
pub struct DryRunTransport;

#[async_trait]
impl DeliveryTransport for DryRunTransport {
    fn name(&self) -> &str {
        "dry-run"
    }

    async fn deliver(&self, payload: &TransactionPayload) -> Result<(), DeliveryError> {
        let body = payload.to_json()?;
        info!(body = %String::from_utf8_lossy(&body), "[DRY-RUN] Would POST payload");
        Ok(())
    }
}
