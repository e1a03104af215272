//! oxsync - 客户端数据同步库
//!
//! 把命名的远程资源绑定到本地读取状态和写入操作：
//! 按资源身份与过滤参数键控的读穿缓存、单飞请求合并、
//! 按请求序列号丢弃乱序过期响应、变更成功后按键前缀确定性失效缓存，
//! 以及带自动消失定时器的用户通知。

#![doc(html_root_url = "https://docs.rs/oxsync/0.1.0")]

pub use serde;
pub use serde::{Deserialize, Serialize};
pub use serde_json;
pub use tokio;

pub mod cache;
pub mod client;
pub mod config;
pub mod context;
pub mod effects;
pub mod error;
pub mod key;
pub mod metrics;
pub mod notify;
pub mod remote;

// Re-export commonly used items
pub use client::{with_compensation, MutationDescriptor, ReadOptions, ReadState, ResourceClient};
pub use config::Config;
pub use context::SyncContext;
pub use error::{RemoteError, RemoteErrorCode, Result, SyncError};
pub use key::{KeyParam, KeyPrefix, ResourceKey};
pub use notify::{Notification, NotificationCenter, NotificationKind};
pub use remote::{ObjectStore, RemoteStore, WriteOp};

/// oxsync 版本号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
