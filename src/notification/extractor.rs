//! Payload 提取器
//!
//! 将通知事件映射为 `TransactionPayload`，不做任何过滤（过滤在 Classifier 完成）。
//! - `text`：标题 + 正文（big_text 优先，否则 text），单个空格连接
//! - `title` / `big` / `ticker`：原样复制并去除首尾空白
//! - 缺失字段为空字符串

use super::event::NotificationEvent;
use super::payload::TransactionPayload;

/// 从事件提取 payload
pub fn extract(event: &NotificationEvent) -> TransactionPayload {
    let title = trimmed(&event.title);
    let body = event.body().map(str::trim).unwrap_or_default();

    let text = [title.as_str(), body]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ");

    TransactionPayload {
        source_app: event.source_app.trim().to_string(),
        title,
        text,
        big: trimmed(&event.big_text),
        ticker: trimmed(&event.ticker),
    }
}

fn trimmed(field: &Option<String>) -> String {
    field.as_deref().map(str::trim).unwrap_or_default().to_string()
}
