//! 交易候选分类器
//!
//! 在宿主回调内同步执行：纯函数，无 IO。
//!
//! ## 判定规则
//! 1. 规范化文本 = title、big_text（否则 text）、ticker 依次以单个空格拼接后转小写
//! 2. 规范化文本为空 -> 不是候选
//! 3. 来源应用在允许列表中 -> 候选
//! 4. 规范化文本包含任一提示词（发送方或金融关键词）-> 候选，并记录命中的提示词

use std::collections::BTreeSet;

use serde::Serialize;

use super::event::NotificationEvent;
use crate::config::ClassifierConfig;

/// 分类结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub is_candidate: bool,
    /// 命中的提示词（仅用于诊断）
    pub matched_hints: BTreeSet<String>,
}

impl ClassificationResult {
    fn skip() -> Self {
        Self::default()
    }
}

/// 分类器
#[derive(Debug, Clone)]
pub struct Classifier {
    allowed_apps: Vec<String>,
    /// (原始提示词, 小写形式)
    hints: Vec<(String, String)>,
}

impl Classifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        let hints = config
            .sender_hints
            .iter()
            .chain(config.money_keywords.iter())
            .map(|h| h.trim())
            .filter(|h| !h.is_empty())
            .map(|h| (h.to_string(), h.to_lowercase()))
            .collect();

        Self {
            allowed_apps: config.allowed_apps.clone(),
            hints,
        }
    }

    /// 是否为允许列表中的资金应用
    pub fn is_allowed_app(&self, source_app: &str) -> bool {
        self.allowed_apps.iter().any(|app| app == source_app)
    }

    /// 对事件分类
    pub fn classify(&self, event: &NotificationEvent) -> ClassificationResult {
        let normalized = normalized_text(event);
        if normalized.is_empty() {
            return ClassificationResult::skip();
        }

        if self.is_allowed_app(&event.source_app) {
            return ClassificationResult {
                is_candidate: true,
                matched_hints: BTreeSet::new(),
            };
        }

        let matched_hints: BTreeSet<String> = self
            .hints
            .iter()
            .filter(|(_, lower)| normalized.contains(lower.as_str()))
            .map(|(original, _)| original.clone())
            .collect();

        ClassificationResult {
            is_candidate: !matched_hints.is_empty(),
            matched_hints,
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(&ClassifierConfig::default())
    }
}

/// 规范化文本：title、正文、ticker 以空格拼接并转小写
pub fn normalized_text(event: &NotificationEvent) -> String {
    let parts = [event.title.as_deref(), event.body(), event.ticker.as_deref()];
    parts
        .iter()
        .flatten()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
