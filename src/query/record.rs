//! 短信记录 - 外部存储的只读投影

use serde::{Deserialize, Serialize};

/// 收件箱
pub const MESSAGE_TYPE_INBOX: i32 = 1;
/// 已发送
pub const MESSAGE_TYPE_SENT: i32 = 2;

/// 短信记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    pub id: String,
    /// 发送方地址
    #[serde(alias = "address")]
    pub sender: String,
    pub body: String,
    /// 毫秒时间戳
    #[serde(alias = "timestamp", alias = "date")]
    pub timestamp_ms: i64,
    /// 消息类型（1 收件箱，2 已发送）
    #[serde(rename = "type", default = "default_kind")]
    pub kind: i32,
}

fn default_kind() -> i32 {
    MESSAGE_TYPE_INBOX
}
