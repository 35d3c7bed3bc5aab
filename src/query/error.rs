//! 查询错误 - 对调用方暴露的稳定错误码

use serde::Serialize;
use thiserror::Error;

/// 查询失败
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// 未获得短信读取权限
    #[error("SMS read permission not granted")]
    PermissionDenied,
    /// 存储读取失败（只带简短描述，不含内部细节）
    #[error("{0}")]
    ReadError(String),
}

/// 序列化后的错误
#[derive(Debug, Serialize)]
pub struct QueryErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl QueryError {
    /// 稳定错误码
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::PermissionDenied => "SMS_PERMISSION_DENIED",
            QueryError::ReadError(_) => "SMS_READ_ERROR",
        }
    }

    pub fn to_body(&self) -> QueryErrorBody {
        QueryErrorBody {
            code: self.code(),
            message: self.to_string(),
        }
    }
}
