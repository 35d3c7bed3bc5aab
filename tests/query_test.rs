use momo_relay::permission::FilePermissionBackend;
use momo_relay::query::{JsonlMessageStore, READ_ERROR_MESSAGE};
use momo_relay::{MessageRecord, PermissionGate, QueryEngine, QueryError, QueryFilter};
use std::path::Path;
use std::sync::Arc;

fn record(id: &str, sender: &str, ts: i64) -> MessageRecord {
    MessageRecord {
        id: id.to_string(),
        sender: sender.to_string(),
        body: format!("You received {} RWF", ts),
        timestamp_ms: ts,
        kind: 1,
    }
}

/// 写入授权文件和短信存储，返回查询引擎
fn engine(dir: &Path, granted: bool, records: &[MessageRecord]) -> QueryEngine {
    let backend = FilePermissionBackend::new(dir.join("permissions.json"));
    backend.write_grants(granted).unwrap();

    let store = JsonlMessageStore::new(dir.join("messages.jsonl"));
    for r in records {
        store.append(r).unwrap();
    }

    let gate = Arc::new(PermissionGate::new(Arc::new(backend)));
    QueryEngine::new(gate, Arc::new(store))
}

fn sample() -> Vec<MessageRecord> {
    vec![
        record("a", "MTN", 1000),
        record("b", "AIRTEL", 2000),
        record("c", "RW-MTN", 3000),
        record("d", "Bank", 4000),
    ]
}

#[test]
fn test_since_filter_returns_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path(), true, &sample());

    let result = engine
        .query(&QueryFilter::default().with_since(2000))
        .unwrap();
    let ids: Vec<&str> = result.messages.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["d", "c", "b"]);
    assert_eq!(result.count, 3);
}

#[test]
fn test_sender_filter_is_case_insensitive() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path(), true, &sample());

    let result = engine
        .query(&QueryFilter::default().with_sender("mtn").with_since(2000))
        .unwrap();
    let ids: Vec<&str> = result.messages.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["c"]);
}

#[test]
fn test_non_positive_limit_returns_one_record() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path(), true, &sample());

    for limit in [0, -5] {
        let result = engine.query(&QueryFilter::default().with_limit(limit)).unwrap();
        assert_eq!(result.count, 1);
        assert_eq!(result.messages[0].id, "d");
    }
}

#[test]
fn test_not_granted_is_permission_denied() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path(), false, &sample());

    let err = engine.query(&QueryFilter::default()).unwrap_err();
    assert_eq!(err, QueryError::PermissionDenied);
    assert_eq!(err.code(), "SMS_PERMISSION_DENIED");
}

#[test]
fn test_missing_store_is_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path(), true, &[]);

    let err = engine.query(&QueryFilter::default()).unwrap_err();
    assert_eq!(err, QueryError::ReadError(READ_ERROR_MESSAGE.to_string()));
    assert_eq!(err.code(), "SMS_READ_ERROR");

    let body = serde_json::to_value(err.to_body()).unwrap();
    assert_eq!(body["code"], "SMS_READ_ERROR");
    assert!(!body["message"].as_str().unwrap().contains("messages.jsonl"));
}

#[test]
fn test_filter_json_accepts_short_names() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path(), true, &sample());

    let filter: QueryFilter =
        serde_json::from_str(r#"{"sender": "airtel", "since": 0, "limit": 10}"#).unwrap();
    let result = engine.query(&filter).unwrap();
    assert_eq!(result.count, 1);
    assert_eq!(result.messages[0].sender, "AIRTEL");
}
