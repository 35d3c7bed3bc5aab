//! 历史短信存储
//!
//! `MessageStore` 是外部存储的抽象：按谓词过滤，按时间戳降序，最多返回 limit 条。
//! 提供两个实现：
//! - `InMemoryMessageStore`：进程内
//! - `JsonlMessageStore`：本地 JSONL 文件（带文件锁）

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use fs2::FileExt;
use thiserror::Error;
use tracing::warn;

use super::filter::Predicate;
use super::record::MessageRecord;

/// 存储内部错误（不直接暴露给查询调用方）
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// 历史短信存储
pub trait MessageStore: Send + Sync {
    /// 返回满足谓词的记录，按 `timestamp_ms` 降序，最多 `limit` 条
    fn fetch(&self, predicate: &Predicate, limit: usize) -> Result<Vec<MessageRecord>, StoreError>;
}

fn select(records: impl Iterator<Item = MessageRecord>, predicate: &Predicate, limit: usize) -> Vec<MessageRecord> {
    let mut matched: Vec<MessageRecord> = records.filter(|r| predicate.matches(r)).collect();
    matched.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
    matched.truncate(limit);
    matched
}

/// 内存存储
#[derive(Debug, Default)]
pub struct InMemoryMessageStore {
    records: RwLock<Vec<MessageRecord>>,
}

impl InMemoryMessageStore {
    pub fn new(records: Vec<MessageRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    pub fn insert(&self, record: MessageRecord) {
        match self.records.write() {
            Ok(mut records) => records.push(record),
            Err(poisoned) => poisoned.into_inner().push(record),
        }
    }
}

impl MessageStore for InMemoryMessageStore {
    fn fetch(&self, predicate: &Predicate, limit: usize) -> Result<Vec<MessageRecord>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        Ok(select(records.iter().cloned(), predicate, limit))
    }
}

/// JSONL 文件存储，每行一条 `MessageRecord`
#[derive(Debug, Clone)]
pub struct JsonlMessageStore {
    path: PathBuf,
}

impl JsonlMessageStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 追加记录（独占锁）
    pub fn append(&self, record: &MessageRecord) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.lock_exclusive()?;
        let line = serde_json::to_string(record)?;
        let written = writeln!(file, "{}", line);
        file.unlock()?;
        written?;
        Ok(())
    }
}

impl MessageStore for JsonlMessageStore {
    fn fetch(&self, predicate: &Predicate, limit: usize) -> Result<Vec<MessageRecord>, StoreError> {
        if !self.path.exists() {
            return Err(StoreError::Unavailable(format!(
                "{} does not exist",
                self.path.display()
            )));
        }

        let file = File::open(&self.path)?;
        file.lock_shared()?;

        let records = read_records(&file);
        file.unlock()?;
        let records = records?;

        Ok(select(records.into_iter(), predicate, limit))
    }
}

/// 逐行解析；非 UTF-8 与非法 JSON 的行都跳过
fn read_records(file: &File) -> Result<Vec<MessageRecord>, StoreError> {
    let mut records = Vec::new();
    for (index, line) in BufReader::new(file).split(b'\n').enumerate() {
        let bytes = line?;
        let line = match std::str::from_utf8(&bytes) {
            Ok(line) => line.trim(),
            Err(e) => {
                warn!(line = index + 1, error = %e, "Skipping non UTF-8 message record");
                continue;
            }
        };
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<MessageRecord>(line) {
            Ok(record) => records.push(record),
            Err(e) => warn!(line = index + 1, error = %e, "Skipping malformed message record"),
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, sender: &str, ts: i64) -> MessageRecord {
        MessageRecord {
            id: id.to_string(),
            sender: sender.to_string(),
            body: format!("body {}", id),
            timestamp_ms: ts,
            kind: 1,
        }
    }

    #[test]
    fn test_memory_store_sorts_and_limits() {
        let store = InMemoryMessageStore::new(vec![
            record("1", "MTN", 10),
            record("2", "MTN", 30),
            record("3", "MTN", 20),
        ]);
        let records = store.fetch(&Predicate::All, 2).unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3"]);
    }

    #[test]
    fn test_jsonl_store_append_and_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlMessageStore::new(dir.path().join("sms.jsonl"));

        store.append(&record("1", "RW-MTN", 100)).unwrap();
        store.append(&record("2", "AIRTEL", 200)).unwrap();
        store.append(&record("3", "MTN", 300)).unwrap();

        let records = store
            .fetch(&Predicate::SenderContains("MTN".to_string()), 10)
            .unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1"]);
    }

    #[test]
    fn test_jsonl_store_skips_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sms.jsonl");
        std::fs::write(
            &path,
            "{\"id\":\"1\",\"sender\":\"MTN\",\"body\":\"a\",\"timestampMs\":1}\nnot json\n\n",
        )
        .unwrap();

        let records = JsonlMessageStore::new(&path).fetch(&Predicate::All, 10).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_jsonl_store_skips_invalid_utf8_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sms.jsonl");
        let mut content = b"{\"id\":\"1\",\"sender\":\"MTN\",\"body\":\"a\",\"timestampMs\":1}\n".to_vec();
        content.extend_from_slice(b"{\"id\":\"2\",\"sender\":\"\xff\xfe\"}\n");
        content.extend_from_slice(b"{\"id\":\"3\",\"sender\":\"AIRTEL\",\"body\":\"b\",\"timestampMs\":2}\r\n");
        std::fs::write(&path, content).unwrap();

        let records = JsonlMessageStore::new(&path).fetch(&Predicate::All, 10).unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1"]);
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlMessageStore::new(dir.path().join("missing.jsonl"));
        assert!(matches!(
            store.fetch(&Predicate::All, 10),
            Err(StoreError::Unavailable(_))
        ));
    }
}
