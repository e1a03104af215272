//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了缓存条目。

use chrono::{DateTime, Utc};

/// 缓存条目
///
/// 保存最近一次成功读取的序列化载荷。
/// 首次成功读取时创建，之后每次被接受的读取覆盖，
/// 匹配的变更失效后从存储中移除（下次读取视为未命中）。
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// 序列化后的载荷
    pub bytes: Vec<u8>,
    /// 拉取时间
    pub fetched_at: DateTime<Utc>,
    /// 被接受的响应所属的请求序列号
    pub sequence: u64,
}

impl CacheEntry {
    /// 创建新的缓存条目
    pub fn new(bytes: Vec<u8>, sequence: u64) -> Self {
        Self {
            bytes,
            fetched_at: Utc::now(),
            sequence,
        }
    }
}
