//! 权限闸门 - 历史短信访问权限的状态机
//!
//! ```text
//! Unknown ──request──> Requested ──用户决定──> Granted | Denied
//! ```
//!
//! - `check()` 只读系统状态，不加锁，可并发重复调用
//! - `request()` 单飞：请求进行中时，并发调用者共享同一个结果，不会重复弹窗
//! - Denied 不会自动重试，需要调用方再次 `request()`

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use tracing::{info, warn};

use super::backend::PermissionBackend;

/// 拒绝时返回给调用方的说明
pub const DENIED_MESSAGE: &str = "SMS permissions denied by user";

/// 权限状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PermissionState {
    Unknown,
    Requested,
    Granted,
    Denied,
}

impl PermissionState {
    fn as_u8(self) -> u8 {
        match self {
            PermissionState::Unknown => 0,
            PermissionState::Requested => 1,
            PermissionState::Granted => 2,
            PermissionState::Denied => 3,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => PermissionState::Requested,
            2 => PermissionState::Granted,
            3 => PermissionState::Denied,
            _ => PermissionState::Unknown,
        }
    }
}

/// `check()` 结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionCheck {
    pub granted: bool,
    /// 各 scope 的授权状态（readSms / receiveSms）
    #[serde(flatten)]
    pub scopes: BTreeMap<String, bool>,
}

/// `request()` 结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionOutcome {
    pub granted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PermissionOutcome {
    fn granted() -> Self {
        Self {
            granted: true,
            message: None,
        }
    }

    fn denied(message: impl Into<String>) -> Self {
        Self {
            granted: false,
            message: Some(message.into()),
        }
    }
}

type InFlight = Shared<BoxFuture<'static, PermissionOutcome>>;

/// 权限闸门
pub struct PermissionGate {
    backend: Arc<dyn PermissionBackend>,
    state: Arc<AtomicU8>,
    in_flight: Mutex<Option<InFlight>>,
}

impl PermissionGate {
    pub fn new(backend: Arc<dyn PermissionBackend>) -> Self {
        Self {
            backend,
            state: Arc::new(AtomicU8::new(PermissionState::Unknown.as_u8())),
            in_flight: Mutex::new(None),
        }
    }

    /// 当前状态
    pub fn state(&self) -> PermissionState {
        PermissionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// 读取系统权限状态
    ///
    /// 首次检查且系统已授权时，状态从 Unknown 初始化为 Granted；其余情况不改变状态。
    pub fn check(&self) -> PermissionCheck {
        let scopes = self.backend.status();
        let granted = all_granted(&scopes);

        if granted {
            let _ = self.state.compare_exchange(
                PermissionState::Unknown.as_u8(),
                PermissionState::Granted.as_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            );
        }

        PermissionCheck { granted, scopes }
    }

    /// 请求权限
    pub async fn request(&self) -> PermissionOutcome {
        if self.check().granted {
            transition(&self.state, PermissionState::Granted);
            return PermissionOutcome::granted();
        }

        let flight = {
            let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            match slot.as_ref() {
                Some(existing) => existing.clone(),
                None => {
                    transition(&self.state, PermissionState::Requested);
                    let flight = run_prompt(self.backend.clone(), self.state.clone())
                        .boxed()
                        .shared();
                    *slot = Some(flight.clone());
                    flight
                }
            }
        };

        let outcome = flight.clone().await;

        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|current| current.ptr_eq(&flight)) {
            *slot = None;
        }

        outcome
    }
}

async fn run_prompt(backend: Arc<dyn PermissionBackend>, state: Arc<AtomicU8>) -> PermissionOutcome {
    if let Err(e) = backend.prompt().await {
        warn!(error = %e, "Permission prompt failed");
    }

    if all_granted(&backend.status()) {
        transition(&state, PermissionState::Granted);
        PermissionOutcome::granted()
    } else {
        transition(&state, PermissionState::Denied);
        PermissionOutcome::denied(DENIED_MESSAGE)
    }
}

fn transition(state: &AtomicU8, to: PermissionState) {
    let from = PermissionState::from_u8(state.swap(to.as_u8(), Ordering::SeqCst));
    if from != to {
        info!(from = ?from, to = ?to, "Permission state changed");
    }
}

fn all_granted(scopes: &BTreeMap<String, bool>) -> bool {
    !scopes.is_empty() && scopes.values().all(|granted| *granted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use std::time::Duration;

    /// 测试用后端：prompt 后按预设结果授权
    struct MockBackend {
        granted: AtomicBool,
        answer: bool,
        prompts: AtomicUsize,
    }

    impl MockBackend {
        fn new(initially_granted: bool, answer: bool) -> Self {
            Self {
                granted: AtomicBool::new(initially_granted),
                answer,
                prompts: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PermissionBackend for MockBackend {
        fn status(&self) -> BTreeMap<String, bool> {
            let granted = self.granted.load(Ordering::SeqCst);
            BTreeMap::from([
                ("readSms".to_string(), granted),
                ("receiveSms".to_string(), granted),
            ])
        }

        async fn prompt(&self) -> anyhow::Result<()> {
            self.prompts.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.granted.store(self.answer, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_first_check_initializes_granted() {
        let gate = PermissionGate::new(Arc::new(MockBackend::new(true, true)));
        assert_eq!(gate.state(), PermissionState::Unknown);

        let check = gate.check();
        assert!(check.granted);
        assert_eq!(check.scopes.get("readSms"), Some(&true));
        assert_eq!(gate.state(), PermissionState::Granted);
    }

    #[test]
    fn test_check_without_grant_keeps_unknown() {
        let gate = PermissionGate::new(Arc::new(MockBackend::new(false, false)));
        assert!(!gate.check().granted);
        assert!(!gate.check().granted);
        assert_eq!(gate.state(), PermissionState::Unknown);
    }

    #[tokio::test]
    async fn test_request_when_granted_does_not_prompt() {
        let backend = Arc::new(MockBackend::new(true, true));
        let gate = PermissionGate::new(backend.clone());

        let outcome = gate.request().await;
        assert!(outcome.granted);
        assert!(outcome.message.is_none());
        assert_eq!(backend.prompts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_request_granted_by_user() {
        let backend = Arc::new(MockBackend::new(false, true));
        let gate = PermissionGate::new(backend.clone());

        assert!(gate.request().await.granted);
        assert_eq!(gate.state(), PermissionState::Granted);

        // 已授权后不再弹窗
        assert!(gate.request().await.granted);
        assert_eq!(backend.prompts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_request_denied_has_message() {
        let backend = Arc::new(MockBackend::new(false, false));
        let gate = PermissionGate::new(backend.clone());

        let outcome = gate.request().await;
        assert!(!outcome.granted);
        assert_eq!(outcome.message.as_deref(), Some(DENIED_MESSAGE));
        assert_eq!(gate.state(), PermissionState::Denied);
    }

    #[tokio::test]
    async fn test_check_in_denied_state_does_not_change_state() {
        let backend = Arc::new(MockBackend::new(false, false));
        let gate = PermissionGate::new(backend.clone());
        gate.request().await;

        let check = gate.check();
        assert!(!check.granted);
        assert_eq!(gate.state(), PermissionState::Denied);
        assert_eq!(backend.prompts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_prompt() {
        let backend = Arc::new(MockBackend::new(false, true));
        let gate = PermissionGate::new(backend.clone());

        let (a, b) = tokio::join!(gate.request(), gate.request());
        assert_eq!(a, b);
        assert!(a.granted);
        assert_eq!(backend.prompts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_denied_can_be_requested_again() {
        let backend = Arc::new(MockBackend::new(false, false));
        let gate = PermissionGate::new(backend.clone());

        gate.request().await;
        gate.request().await;
        assert_eq!(backend.prompts.load(Ordering::SeqCst), 2);
    }
}
