//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了通知中心：按插入顺序维护通知列表，
//! 管理自动消失定时器，并通过 watch 通道向观察者广播变更。

pub mod notification;

pub use notification::{Notification, NotificationKind};

use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

/// 通知中心
///
/// 通知列表的唯一持有者。所有增删都经过这里，
/// 以保证定时器与列表状态的一致：每个带时长的通知对应一个
/// 消失定时器，用户提前关闭时定时器被中止，不存在对已移除
/// ID 的悬挂触发（移除本身幂等，重复关闭是无操作）。
pub struct NotificationCenter {
    entries: Mutex<Vec<Notification>>,
    timers: DashMap<Uuid, JoinHandle<()>>,
    revision: watch::Sender<u64>,
    default_duration_ms: u64,
}

impl NotificationCenter {
    /// 创建新的通知中心
    ///
    /// # 参数
    ///
    /// * `default_duration_ms` - 未显式指定时长时使用的默认值
    pub fn new(default_duration_ms: u64) -> Arc<Self> {
        let (revision, _) = watch::channel(0);
        Arc::new(Self {
            entries: Mutex::new(Vec::new()),
            timers: DashMap::new(),
            revision,
            default_duration_ms,
        })
    }

    /// 发布通知
    ///
    /// # 参数
    ///
    /// * `kind` - 通知类型
    /// * `title` - 标题
    /// * `message` - 正文
    /// * `duration_ms` - 展示时长（毫秒），None 使用默认值，Some(0) 常驻
    ///
    /// # 返回值
    ///
    /// 返回通知ID，可用于显式关闭
    pub fn push(
        self: &Arc<Self>,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        duration_ms: Option<u64>,
    ) -> Uuid {
        let duration_ms = duration_ms.unwrap_or(self.default_duration_ms);
        let notification = Notification::new(kind, title, message, duration_ms);
        let id = notification.id;

        {
            let mut entries = self.entries.lock().unwrap();
            entries.push(notification);
        }
        self.bump_revision();
        debug!("通知已发布: id={}, kind={:?}", id, kind);

        if duration_ms > 0 {
            let center = Arc::downgrade(self);
            let handle = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(duration_ms)).await;
                if let Some(center) = center.upgrade() {
                    center.dismiss(id);
                }
            });
            self.timers.insert(id, handle);
        }
        id
    }

    /// 发布成功通知（使用默认时长）
    pub fn success(self: &Arc<Self>, title: impl Into<String>, message: impl Into<String>) -> Uuid {
        self.push(NotificationKind::Success, title, message, None)
    }

    /// 发布错误通知（使用默认时长）
    pub fn error(self: &Arc<Self>, title: impl Into<String>, message: impl Into<String>) -> Uuid {
        self.push(NotificationKind::Error, title, message, None)
    }

    /// 关闭通知
    ///
    /// 幂等：ID 不存在时是无操作，不报错也不产生重复的移除副作用。
    ///
    /// # 参数
    ///
    /// * `id` - 通知ID
    ///
    /// # 返回值
    ///
    /// 实际移除了通知返回 true
    pub fn dismiss(&self, id: Uuid) -> bool {
        let removed = {
            let mut entries = self.entries.lock().unwrap();
            let before = entries.len();
            entries.retain(|n| n.id != id);
            entries.len() != before
        };
        if let Some((_, handle)) = self.timers.remove(&id) {
            handle.abort();
        }
        if removed {
            self.bump_revision();
            debug!("通知已关闭: id={}", id);
        }
        removed
    }

    /// 当前可见通知的快照（插入顺序）
    pub fn snapshot(&self) -> Vec<Notification> {
        self.entries.lock().unwrap().clone()
    }

    /// 指定ID的通知是否仍可见
    pub fn contains(&self, id: Uuid) -> bool {
        self.entries.lock().unwrap().iter().any(|n| n.id == id)
    }

    /// 订阅变更
    ///
    /// 返回修订号通道，列表每次变更修订号加一，观察者可 await 变更。
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// 关闭通知中心
    ///
    /// 中止所有未触发的定时器并清空列表。
    pub fn shutdown(&self) {
        for entry in self.timers.iter() {
            entry.value().abort();
        }
        self.timers.clear();
        self.entries.lock().unwrap().clear();
        self.bump_revision();
    }

    fn bump_revision(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}
