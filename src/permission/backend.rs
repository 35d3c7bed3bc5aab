//! 权限后端 - 与操作系统权限交互的适配层
//!
//! `PermissionGate` 只依赖这个 trait；真正的弹窗由适配器负责。

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 读取短信
pub const SCOPE_READ_SMS: &str = "readSms";
/// 接收短信
pub const SCOPE_RECEIVE_SMS: &str = "receiveSms";

/// 需要的全部 scope
pub const REQUIRED_SCOPES: &[&str] = &[SCOPE_READ_SMS, SCOPE_RECEIVE_SMS];

/// 权限后端
#[async_trait]
pub trait PermissionBackend: Send + Sync {
    /// 当前系统报告的各 scope 授权状态
    fn status(&self) -> BTreeMap<String, bool>;

    /// 弹出授权提示并等待用户决定
    ///
    /// 结果通过之后的 `status()` 体现
    async fn prompt(&self) -> Result<()>;
}

/// 基于 JSON 文件的权限后端，提示使用终端确认框
///
/// 文件格式：`{"readSms": true, "receiveSms": true}`
#[derive(Debug, Clone)]
pub struct FilePermissionBackend {
    path: PathBuf,
}

impl FilePermissionBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 默认路径 `~/.config/momo-relay/permissions.json`
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("momo-relay")
            .join("permissions.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 写入所有 scope 的授权结果
    pub fn write_grants(&self, granted: bool) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let grants: BTreeMap<&str, bool> = REQUIRED_SCOPES.iter().map(|s| (*s, granted)).collect();
        fs::write(&self.path, serde_json::to_string_pretty(&grants)?)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }

    fn read_grants(&self) -> BTreeMap<String, bool> {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|content| serde_json::from_str::<BTreeMap<String, bool>>(&content).ok())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PermissionBackend for FilePermissionBackend {
    fn status(&self) -> BTreeMap<String, bool> {
        let grants = self.read_grants();
        REQUIRED_SCOPES
            .iter()
            .map(|scope| (scope.to_string(), grants.get(*scope).copied().unwrap_or(false)))
            .collect()
    }

    async fn prompt(&self) -> Result<()> {
        let backend = self.clone();
        let granted = tokio::task::spawn_blocking(move || {
            dialoguer::Confirm::new()
                .with_prompt("Allow momo-relay to read and receive SMS messages?")
                .default(false)
                .interact()
        })
        .await
        .context("Permission prompt task failed")?
        .context("Permission prompt failed")?;

        debug!(granted, path = %backend.path.display(), "Permission prompt answered");
        backend.write_grants(granted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_means_not_granted() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilePermissionBackend::new(dir.path().join("permissions.json"));
        let status = backend.status();
        assert_eq!(status.len(), 2);
        assert!(status.values().all(|granted| !granted));
    }

    #[test]
    fn test_write_grants_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilePermissionBackend::new(dir.path().join("nested").join("permissions.json"));

        backend.write_grants(true).unwrap();
        assert!(backend.status().values().all(|granted| *granted));

        backend.write_grants(false).unwrap();
        assert_eq!(backend.status().get(SCOPE_READ_SMS), Some(&false));
    }

    #[test]
    fn test_partial_grants() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("permissions.json");
        fs::write(&path, r#"{"readSms": true}"#).unwrap();

        let status = FilePermissionBackend::new(&path).status();
        assert_eq!(status.get(SCOPE_READ_SMS), Some(&true));
        assert_eq!(status.get(SCOPE_RECEIVE_SMS), Some(&false));
    }
}
