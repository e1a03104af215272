//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了同步系统的指标收集功能。
//! 指标随上下文创建，不使用全局状态，便于测试中按实例断言。

use std::sync::atomic::{AtomicU64, Ordering};

/// 指标收集器
///
/// 收集缓存与同步层的运行时计数。所有计数器为单调递增。
#[derive(Debug, Default)]
pub struct SyncMetrics {
    /// 缓存命中数
    pub cache_hits: AtomicU64,
    /// 缓存未命中数
    pub cache_misses: AtomicU64,
    /// 发出的远程读取请求数（单飞合并后）
    pub remote_reads: AtomicU64,
    /// 因序列号过期而被丢弃的响应数
    pub discarded_responses: AtomicU64,
    /// 因前缀匹配而失效的键数
    pub invalidated_keys: AtomicU64,
    /// 成功的变更数
    pub mutations_ok: AtomicU64,
    /// 失败的变更数
    pub mutations_failed: AtomicU64,
}

impl SyncMetrics {
    pub fn record_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_remote_read(&self) {
        self.remote_reads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_discarded_response(&self) {
        self.discarded_responses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalidated(&self, count: u64) {
        self.invalidated_keys.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_mutation(&self, ok: bool) {
        if ok {
            self.mutations_ok.fetch_add(1, Ordering::Relaxed);
        } else {
            self.mutations_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// 生成指标快照
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            remote_reads: self.remote_reads.load(Ordering::Relaxed),
            discarded_responses: self.discarded_responses.load(Ordering::Relaxed),
            invalidated_keys: self.invalidated_keys.load(Ordering::Relaxed),
            mutations_ok: self.mutations_ok.load(Ordering::Relaxed),
            mutations_failed: self.mutations_failed.load(Ordering::Relaxed),
        }
    }
}

/// 指标快照
///
/// 某一时刻所有计数器的一致读数，用于监控采集和测试断言
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub remote_reads: u64,
    pub discarded_responses: u64,
    pub invalidated_keys: u64,
    pub mutations_ok: u64,
    pub mutations_failed: u64,
}

impl MetricsSnapshot {
    /// 将快照格式化为文本行，用于监控系统采集
    pub fn render(&self) -> String {
        format!(
            "sync_cache_hits_total {}\n\
             sync_cache_misses_total {}\n\
             sync_remote_reads_total {}\n\
             sync_discarded_responses_total {}\n\
             sync_invalidated_keys_total {}\n\
             sync_mutations_ok_total {}\n\
             sync_mutations_failed_total {}\n",
            self.cache_hits,
            self.cache_misses,
            self.remote_reads,
            self.discarded_responses,
            self.invalidated_keys,
            self.mutations_ok,
            self.mutations_failed
        )
    }
}
