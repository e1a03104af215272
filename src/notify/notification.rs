//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了用户通知的数据结构。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 通知类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

/// 用户通知
///
/// 在变更成功或失败时创建，存活于上下文级通知列表中。
/// `duration_ms` 到期后自行消失；为 0 时常驻，直到用户显式关闭。
/// 移除是终态，同一通知不会复活。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// 通知ID
    pub id: Uuid,
    /// 通知类型
    pub kind: NotificationKind,
    /// 标题
    pub title: String,
    /// 正文
    pub message: String,
    /// 展示时长（毫秒），0 表示常驻
    pub duration_ms: u64,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// 创建新通知
    pub fn new(
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            title: title.into(),
            message: message.into(),
            duration_ms,
            created_at: Utc::now(),
        }
    }

    /// 是否常驻（不自动消失）
    pub fn is_sticky(&self) -> bool {
        self.duration_ms == 0
    }
}
