//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了同步系统的错误类型和处理机制。

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 远程错误分类
///
/// 区分"预期内"的失败（冲突、权限、未找到）和"预期外"的失败（网络、服务器），
/// 以便变更层决定向用户展示哪条失败消息。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteErrorCode {
    /// 约束冲突（如唯一性违反）
    Conflict,
    /// 权限拒绝
    Permission,
    /// 实体未找到（仅单实体查询会产生；列表查询返回空结果集）
    NotFound,
    /// 服务器内部错误
    Server,
    /// 网络失败
    Network,
}

/// 远程存储错误
///
/// 远程存储拒绝操作时返回的结构化错误，携带分类码和可读消息。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("remote error ({code:?}): {message}")]
pub struct RemoteError {
    /// 错误分类码
    pub code: RemoteErrorCode,
    /// 错误消息
    pub message: String,
}

impl RemoteError {
    /// 创建新的远程错误
    pub fn new(code: RemoteErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// 判断错误是否属于"预期内"类别
    ///
    /// 冲突、权限、未找到属于业务上可预期的失败，其消息足够具体，
    /// 可以直接展示给用户；网络和服务器错误则使用变更描述符中的兜底消息。
    ///
    /// # 返回值
    ///
    /// 预期内失败返回 true
    pub fn is_expected(&self) -> bool {
        matches!(
            self.code,
            RemoteErrorCode::Conflict | RemoteErrorCode::Permission | RemoteErrorCode::NotFound
        )
    }
}

/// 同步系统错误类型枚举
///
/// 定义了同步系统中可能发生的各种错误类型
#[derive(Error, Debug, Clone)]
pub enum SyncError {
    /// 校验错误：调用方输入在发出任何远程请求之前就未通过前置条件
    #[error("Validation error: {0}")]
    Validation(String),

    /// 远程存储错误
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    /// 补偿回滚失败：复合变更的回滚步骤自身失败，同时报告两个原因
    #[error("Compensation failed: primary error: {primary}; compensation error: {compensation}")]
    Compensation {
        /// 触发回滚的原始失败
        primary: Box<SyncError>,
        /// 回滚步骤自身的失败
        compensation: Box<SyncError>,
    },

    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// 远程载荷解码错误（未知或畸形结构在边界处被拒绝）
    #[error("Decode error: {0}")]
    Decode(String),

    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(String),

    /// 关闭错误
    #[error("Shutdown error: {0}")]
    Shutdown(String),
}

impl SyncError {
    /// 提取远程错误引用（如果是远程错误）
    pub fn as_remote(&self) -> Option<&RemoteError> {
        match self {
            SyncError::Remote(e) => Some(e),
            _ => None,
        }
    }
}

/// 同步操作结果类型别名
///
/// 简化错误处理，所有同步操作都返回此类型
pub type Result<T> = std::result::Result<T, SyncError>;
