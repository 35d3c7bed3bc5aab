//! 权限层 - 历史短信查询前的授权检查

pub mod backend;
pub mod gate;

pub use backend::{FilePermissionBackend, PermissionBackend, REQUIRED_SCOPES, SCOPE_READ_SMS, SCOPE_RECEIVE_SMS};
pub use gate::{PermissionCheck, PermissionGate, PermissionOutcome, PermissionState, DENIED_MESSAGE};
