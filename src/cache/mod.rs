//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了资源缓存：按资源键存放最近一次成功读取的结果，
//! 提供按键前缀的确定性失效和按请求序列号的过期响应丢弃。

pub mod entry;
pub mod flight;

pub use entry::CacheEntry;
pub use flight::{Flight, FlightResult, FlightRole, FlightTable};

use crate::config::CacheConfig;
use crate::key::{KeyPrefix, ResourceKey};
use crate::metrics::SyncMetrics;
use dashmap::DashMap;
use moka::future::Cache as MokaCache;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// 资源缓存
///
/// 条目存储有界且带TTL（失效主要由变更驱动，容量与TTL是
/// 长期运行进程的兜底）。每个键维护单调递增的请求序列号：
/// 读取发起时分配，响应只有携带该键最新序列号时才被接受，
/// 失效会推进序列号，使失效前发出的在飞响应全部作废。
pub struct ResourceCache {
    store: MokaCache<ResourceKey, Arc<CacheEntry>>,
    sequences: DashMap<ResourceKey, u64>,
    flights: FlightTable,
    metrics: Arc<SyncMetrics>,
}

impl ResourceCache {
    /// 创建新的资源缓存
    ///
    /// # 参数
    ///
    /// * `config` - 缓存配置
    /// * `metrics` - 指标收集器
    pub fn new(config: &CacheConfig, metrics: Arc<SyncMetrics>) -> Self {
        let mut builder = MokaCache::builder().max_capacity(config.max_capacity);
        if let Some(ttl) = config.ttl_secs {
            builder = builder.time_to_live(Duration::from_secs(ttl));
        }
        Self {
            store: builder.build(),
            sequences: DashMap::new(),
            flights: FlightTable::new(),
            metrics,
        }
    }

    /// 读取缓存条目
    ///
    /// # 参数
    ///
    /// * `key` - 资源键
    ///
    /// # 返回值
    ///
    /// 命中返回条目，未命中（含已失效、已过期）返回 None
    pub async fn get(&self, key: &ResourceKey) -> Option<Arc<CacheEntry>> {
        match self.store.get(key).await {
            Some(entry) => {
                self.metrics.record_hit();
                debug!("缓存命中: key={}", key);
                Some(entry)
            }
            None => {
                self.metrics.record_miss();
                debug!("缓存未命中: key={}", key);
                None
            }
        }
    }

    /// 为键分配新的请求序列号
    ///
    /// 在发出远程读取请求之前调用，返回值即该请求的序列号。
    pub fn begin_request(&self, key: &ResourceKey) -> u64 {
        let mut seq = self.sequences.entry(key.clone()).or_insert(0);
        *seq += 1;
        *seq
    }

    /// 该键当前最新的请求序列号
    pub fn latest_sequence(&self, key: &ResourceKey) -> u64 {
        self.sequences.get(key).map(|s| *s).unwrap_or(0)
    }

    /// 尝试接受一个响应
    ///
    /// 仅当响应的序列号仍是该键最新时写入缓存；否则丢弃。
    /// 乱序完成的旧响应因此永远不会覆盖新响应的结果。
    ///
    /// # 参数
    ///
    /// * `key` - 资源键
    /// * `sequence` - 响应对应的请求序列号
    /// * `bytes` - 序列化后的载荷
    ///
    /// # 返回值
    ///
    /// 被接受返回 true，被丢弃返回 false
    pub async fn accept(&self, key: &ResourceKey, sequence: u64, bytes: Vec<u8>) -> bool {
        if self.latest_sequence(key) != sequence {
            self.metrics.record_discarded_response();
            debug!("丢弃过期响应: key={}, sequence={}", key, sequence);
            return false;
        }
        self.store
            .insert(key.clone(), Arc::new(CacheEntry::new(bytes, sequence)))
            .await;
        // 插入与失效之间存在窗口，插入后复查序列号，输掉竞争则撤回
        if self.latest_sequence(key) != sequence {
            self.store.invalidate(key).await;
            self.metrics.record_discarded_response();
            debug!("撤回竞争失败的响应: key={}, sequence={}", key, sequence);
            return false;
        }
        true
    }

    /// 按前缀失效缓存条目
    ///
    /// 对每个匹配的键：推进其序列号（作废失效前发出的在飞响应），
    /// 并从条目存储中移除，使下一次读取必然回源。
    ///
    /// # 参数
    ///
    /// * `prefixes` - 键前缀列表
    ///
    /// # 返回值
    ///
    /// 返回失效的键数量
    #[instrument(skip(self), level = "debug", fields(prefix_count = prefixes.len()))]
    pub async fn invalidate_prefixes(&self, prefixes: &[KeyPrefix]) -> usize {
        let mut matched = Vec::new();
        for mut entry in self.sequences.iter_mut() {
            if prefixes.iter().any(|p| entry.key().matches(p)) {
                *entry.value_mut() += 1;
                matched.push(entry.key().clone());
            }
        }
        for key in &matched {
            self.store.invalidate(key).await;
            debug!("缓存键已失效: {}", key);
        }
        self.metrics.record_invalidated(matched.len() as u64);
        matched.len()
    }

    /// 单飞表
    pub fn flights(&self) -> &FlightTable {
        &self.flights
    }

    /// 指标收集器
    pub fn metrics(&self) -> &Arc<SyncMetrics> {
        &self.metrics
    }

    /// 缓存中的条目数（近似值，moka惰性维护）
    pub fn entry_count(&self) -> u64 {
        self.store.entry_count()
    }

    /// 清空缓存与序列号表
    ///
    /// 仅在上下文关闭时调用；运行期间失效必须走 `invalidate_prefixes`。
    pub fn clear(&self) {
        self.store.invalidate_all();
        self.sequences.clear();
    }
}
