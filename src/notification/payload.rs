//! 交易 payload - 投递到接收端的请求体
//!
//! Payload 格式：
//! ```json
//! {
//!   "package": "rw.mtn.momo",
//!   "title": "MTN MoMo",
//!   "text": "MTN MoMo You received 5000 RWF",
//!   "big": "You received 5000 RWF",
//!   "ticker": ""
//! }
//! ```
//!
//! 字符串按 JSON 规则转义（反斜杠、双引号、换行及其他控制字符），接收端可无损解码。

use serde::{Deserialize, Serialize};

/// 交易 payload，构建后不可变
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionPayload {
    /// 来源应用包名
    #[serde(rename = "package")]
    pub source_app: String,
    pub title: String,
    pub text: String,
    pub big: String,
    pub ticker: String,
}

impl TransactionPayload {
    /// 序列化为请求体
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// 日志中使用的简短预览
    pub fn preview(&self, max_chars: usize) -> String {
        let body = if self.text.is_empty() { &self.big } else { &self.text };
        let mut preview: String = body.chars().take(max_chars).collect();
        if body.chars().count() > max_chars {
            preview.push_str("...");
        }
        preview
    }
}
