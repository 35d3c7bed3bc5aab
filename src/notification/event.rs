//! 通知事件结构
//!
//! 系统每投递一条通知产生一个 `NotificationEvent`，由接收它的那次回调独占。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OS 投递的通知事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    /// 来源应用包名（如 rw.mtn.momo）
    pub source_app: String,
    /// 通知标题
    #[serde(default)]
    pub title: Option<String>,
    /// 通知正文
    #[serde(default)]
    pub text: Option<String>,
    /// 展开后的长文本
    #[serde(default)]
    pub big_text: Option<String>,
    /// 状态栏滚动文本
    #[serde(default)]
    pub ticker: Option<String>,
    /// 捕获时间
    #[serde(default = "Utc::now")]
    pub captured_at: DateTime<Utc>,
}

impl NotificationEvent {
    /// 创建只有来源应用的事件
    pub fn new(source_app: impl Into<String>) -> Self {
        Self {
            source_app: source_app.into(),
            title: None,
            text: None,
            big_text: None,
            ticker: None,
            captured_at: Utc::now(),
        }
    }

    /// 正文：优先 big_text，其次 text（空字符串视为缺失）
    pub fn body(&self) -> Option<&str> {
        non_empty(&self.big_text).or_else(|| non_empty(&self.text))
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.trim().is_empty())
}

/// 事件构建器
#[derive(Debug, Default)]
pub struct NotificationEventBuilder {
    source_app: Option<String>,
    title: Option<String>,
    text: Option<String>,
    big_text: Option<String>,
    ticker: Option<String>,
    captured_at: Option<DateTime<Utc>>,
}

impl NotificationEventBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source_app(mut self, source_app: impl Into<String>) -> Self {
        self.source_app = Some(source_app.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn big_text(mut self, big_text: impl Into<String>) -> Self {
        self.big_text = Some(big_text.into());
        self
    }

    pub fn ticker(mut self, ticker: impl Into<String>) -> Self {
        self.ticker = Some(ticker.into());
        self
    }

    pub fn captured_at(mut self, captured_at: DateTime<Utc>) -> Self {
        self.captured_at = Some(captured_at);
        self
    }

    /// 构建事件，source_app 缺失时为空字符串
    pub fn build(self) -> NotificationEvent {
        NotificationEvent {
            source_app: self.source_app.unwrap_or_default(),
            title: self.title,
            text: self.text,
            big_text: self.big_text,
            ticker: self.ticker,
            captured_at: self.captured_at.unwrap_or_else(Utc::now),
        }
    }
}
