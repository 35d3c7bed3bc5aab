use async_trait::async_trait;
use momo_relay::permission::{FilePermissionBackend, DENIED_MESSAGE};
use momo_relay::{PermissionBackend, PermissionGate, PermissionState};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// 包装文件后端，prompt 时按预设答案写入授权文件
struct ScriptedBackend {
    inner: FilePermissionBackend,
    answer: bool,
    prompts: AtomicUsize,
}

#[async_trait]
impl PermissionBackend for ScriptedBackend {
    fn status(&self) -> BTreeMap<String, bool> {
        self.inner.status()
    }

    async fn prompt(&self) -> anyhow::Result<()> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.inner.write_grants(self.answer)
    }
}

fn scripted(dir: &std::path::Path, answer: bool) -> Arc<ScriptedBackend> {
    Arc::new(ScriptedBackend {
        inner: FilePermissionBackend::new(dir.join("permissions.json")),
        answer,
        prompts: AtomicUsize::new(0),
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_prompt_once() {
    let dir = tempfile::tempdir().unwrap();
    let backend = scripted(dir.path(), true);
    let gate = Arc::new(PermissionGate::new(backend.clone()));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let gate = gate.clone();
            tokio::spawn(async move { gate.request().await })
        })
        .collect();

    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.await.unwrap());
    }

    assert!(outcomes.iter().all(|o| o.granted));
    assert_eq!(backend.prompts.load(Ordering::SeqCst), 1);
    assert_eq!(gate.state(), PermissionState::Granted);
    assert!(gate.check().granted);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_denial_shared_by_all_callers() {
    let dir = tempfile::tempdir().unwrap();
    let backend = scripted(dir.path(), false);
    let gate = Arc::new(PermissionGate::new(backend.clone()));

    let (a, b, c) = tokio::join!(gate.request(), gate.request(), gate.request());
    assert_eq!(a, b);
    assert_eq!(b, c);
    assert!(!a.granted);
    assert_eq!(a.message.as_deref(), Some(DENIED_MESSAGE));
    assert_eq!(backend.prompts.load(Ordering::SeqCst), 1);
    assert_eq!(gate.state(), PermissionState::Denied);
}

#[tokio::test]
async fn test_grant_written_outside_gate_is_observed() {
    let dir = tempfile::tempdir().unwrap();
    let backend = scripted(dir.path(), false);
    let gate = PermissionGate::new(backend.clone());

    assert!(!gate.request().await.granted);

    // 用户在系统设置里手动授权
    backend.inner.write_grants(true).unwrap();
    assert!(gate.check().granted);

    let outcome = gate.request().await;
    assert!(outcome.granted);
    assert_eq!(backend.prompts.load(Ordering::SeqCst), 1);
    assert_eq!(gate.state(), PermissionState::Granted);
}
