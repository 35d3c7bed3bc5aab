//! permissions 命令：检查 / 请求短信访问权限

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Subcommand};

use super::output::format_output;
use crate::permission::{FilePermissionBackend, PermissionGate};

/// permissions 命令参数
#[derive(Args)]
pub struct PermissionsArgs {
    #[command(subcommand)]
    pub action: PermissionAction,
    /// 权限文件（默认 ~/.config/momo-relay/permissions.json）
    #[arg(long, global = true)]
    pub permissions_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum PermissionAction {
    /// 查看当前授权状态
    Check,
    /// 请求授权（交互式确认）
    Request,
}

/// 根据可选路径构建权限闸门
pub fn build_gate(permissions_file: Option<PathBuf>) -> Arc<PermissionGate> {
    let path = permissions_file.unwrap_or_else(FilePermissionBackend::default_path);
    Arc::new(PermissionGate::new(Arc::new(FilePermissionBackend::new(path))))
}

/// 处理 permissions 命令
pub async fn handle_permissions(args: PermissionsArgs) -> Result<()> {
    let gate = build_gate(args.permissions_file);

    match args.action {
        PermissionAction::Check => println!("{}", format_output(&gate.check())),
        PermissionAction::Request => println!("{}", format_output(&gate.request().await)),
    }
    Ok(())
}
