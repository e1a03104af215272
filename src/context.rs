//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了同步上下文：缓存、通知中心和副作用队列的显式持有者。
//! 上下文在应用启动时构造、关闭时销毁，并注入到每个客户端实例，
//! 不存在进程级全局状态，测试可以为每个用例创建独立的上下文。

use crate::cache::ResourceCache;
use crate::config::Config;
use crate::effects::EffectQueue;
use crate::error::{Result, SyncError};
use crate::metrics::SyncMetrics;
use crate::notify::NotificationCenter;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

/// 同步上下文
///
/// 上下文内的缓存与通知列表只能通过暴露的操作修改，
/// 外部直接改动会破坏失效与定时器的不变量。
pub struct SyncContext {
    config: Config,
    metrics: Arc<SyncMetrics>,
    cache: Arc<ResourceCache>,
    notifications: Arc<NotificationCenter>,
    effects: EffectQueue,
    shutdown_token: CancellationToken,
}

impl SyncContext {
    /// 创建新的同步上下文
    ///
    /// # 参数
    ///
    /// * `config` - 同步系统配置
    ///
    /// # 返回值
    ///
    /// 返回上下文实例或配置错误
    #[instrument(skip(config), level = "info")]
    pub fn new(config: Config) -> Result<Arc<Self>> {
        config.validate().map_err(SyncError::Config)?;

        let metrics = Arc::new(SyncMetrics::default());
        let cache = Arc::new(ResourceCache::new(&config.cache, metrics.clone()));
        let notifications =
            NotificationCenter::new(config.notifications.default_duration_ms);
        let effects = EffectQueue::new(&config.effects);

        info!(
            "SyncContext initialized: cache_capacity={}, ttl_secs={:?}",
            config.cache.max_capacity, config.cache.ttl_secs
        );
        Ok(Arc::new(Self {
            config,
            metrics,
            cache,
            notifications,
            effects,
            shutdown_token: CancellationToken::new(),
        }))
    }

    /// 使用默认配置创建上下文
    pub fn with_defaults() -> Result<Arc<Self>> {
        Self::new(Config::default())
    }

    /// 配置
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 资源缓存
    pub fn cache(&self) -> &Arc<ResourceCache> {
        &self.cache
    }

    /// 通知中心
    pub fn notifications(&self) -> &Arc<NotificationCenter> {
        &self.notifications
    }

    /// 副作用队列
    pub fn effects(&self) -> &EffectQueue {
        &self.effects
    }

    /// 指标收集器
    pub fn metrics(&self) -> &Arc<SyncMetrics> {
        &self.metrics
    }

    /// 关闭令牌
    ///
    /// 上下文关闭时取消，长生命周期的读取可将其作为存活标志。
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown_token
    }

    /// 是否已关闭
    pub fn is_shut_down(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }

    /// 优雅关闭上下文
    ///
    /// 取消关闭令牌，排空副作用队列，中止通知定时器并清空缓存。
    /// 幂等：重复关闭返回错误但不产生副作用。
    #[instrument(skip(self), level = "info")]
    pub async fn shutdown(&self) -> Result<()> {
        if self.shutdown_token.is_cancelled() {
            return Err(SyncError::Shutdown("上下文已关闭".to_string()));
        }
        info!("正在关闭 SyncContext...");
        self.shutdown_token.cancel();
        self.effects.shutdown().await;
        self.notifications.shutdown();
        self.cache.clear();
        info!("SyncContext 已关闭");
        Ok(())
    }
}
