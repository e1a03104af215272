//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了资源客户端：把命名的远程资源绑定到本地读取状态
//! 和写入操作的核心原语。读取走读穿缓存（单飞合并、序列号验收），
//! 写入走 [`mutation`] 中的变更操作。

pub mod mutation;

pub use mutation::{with_compensation, MutationDescriptor};

use crate::cache::FlightRole;
use crate::context::SyncContext;
use crate::error::{Result, SyncError};
use crate::key::{KeyParam, ResourceKey};
use crate::remote::{decode_record, decode_records, Filters, RemoteStore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// 读取结果状态
///
/// 视图直接消费的形态：数据、加载标志和就地渲染的错误。
/// 读取错误只出现在这里，不产生用户通知。
#[derive(Debug)]
pub struct ReadState<T> {
    /// 读取到的数据
    pub data: Option<T>,
    /// 是否仍在加载
    pub is_loading: bool,
    /// 读取错误
    pub error: Option<SyncError>,
}

impl<T> ReadState<T> {
    /// 数据就绪
    pub fn ready(data: T) -> Self {
        Self {
            data: Some(data),
            is_loading: false,
            error: None,
        }
    }

    /// 加载中（供视图层在 await 期间组合使用）
    pub fn loading() -> Self {
        Self {
            data: None,
            is_loading: true,
            error: None,
        }
    }

    /// 读取被抑制（enabled=false）或调用方已不存活，未发出请求或不再更新状态
    pub fn idle() -> Self {
        Self {
            data: None,
            is_loading: false,
            error: None,
        }
    }

    /// 读取失败
    pub fn failed(error: SyncError) -> Self {
        Self {
            data: None,
            is_loading: false,
            error: Some(error),
        }
    }

    /// 是否已有数据
    pub fn is_ready(&self) -> bool {
        self.data.is_some()
    }

    /// 取出数据
    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

/// 读取选项
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// 为 false 时完全抑制读取：不发请求，返回空闲状态。
    /// 用于必需参数缺失等场景。
    pub enabled: bool,
    /// 存活令牌：令牌被取消后不再代表该调用方更新状态
    /// （已绑定到已卸载视图的读取不得触碰共享状态）
    pub liveness: Option<CancellationToken>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            liveness: None,
        }
    }
}

impl ReadOptions {
    /// 抑制读取的选项
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            liveness: None,
        }
    }

    /// 绑定存活令牌
    pub fn with_liveness(mut self, token: CancellationToken) -> Self {
        self.liveness = Some(token);
        self
    }
}

/// 资源客户端
///
/// 在抽象远程存储之上提供读穿缓存和写穿变更原语，
/// 以及确定性的缓存失效和用户通知。每个实例持有注入的上下文，
/// 不同上下文之间完全隔离。
pub struct ResourceClient {
    ctx: Arc<SyncContext>,
    store: Arc<dyn RemoteStore>,
}

impl ResourceClient {
    /// 创建新的资源客户端
    ///
    /// # 参数
    ///
    /// * `ctx` - 同步上下文
    /// * `store` - 远程资源存储
    pub fn new(ctx: Arc<SyncContext>, store: Arc<dyn RemoteStore>) -> Self {
        Self { ctx, store }
    }

    /// 同步上下文
    pub fn context(&self) -> &Arc<SyncContext> {
        &self.ctx
    }

    /// 远程资源存储
    pub fn store(&self) -> &Arc<dyn RemoteStore> {
        &self.store
    }

    /// 读取资源
    ///
    /// 缓存命中直接返回；未命中时单飞回源：同一键同一时刻至多一个
    /// 在飞请求，并发调用方共享同一个待定结果。响应按请求序列号验收，
    /// 乱序完成的旧响应被丢弃，不会污染缓存。
    ///
    /// 领飞者的拉取在独立任务中执行，调用方中途取消不会使跟飞者悬挂，
    /// 缓存回填照常完成。
    ///
    /// # 参数
    ///
    /// * `key` - 资源键（必须由稳定、可序列化的参数构成，调用方契约）
    /// * `fetch` - 缓存未命中时执行的拉取闭包
    /// * `options` - 读取选项
    ///
    /// # 返回值
    ///
    /// 返回读取状态。错误在状态中就地返回，不抛出、不通知。
    pub async fn read<T, F, Fut>(
        &self,
        key: &ResourceKey,
        fetch: F,
        options: ReadOptions,
    ) -> ReadState<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        if !options.enabled {
            return ReadState::idle();
        }
        if let Some(token) = &options.liveness {
            if token.is_cancelled() {
                return ReadState::idle();
            }
        }

        let cache = self.ctx.cache().clone();
        if let Some(entry) = cache.get(key).await {
            return match serde_json::from_slice::<T>(&entry.bytes) {
                Ok(value) => ReadState::ready(value),
                Err(e) => ReadState::failed(SyncError::Decode(e.to_string())),
            };
        }

        let latest = cache.latest_sequence(key);
        let flight = match cache
            .flights()
            .join_or_lead(key, latest, || cache.begin_request(key))
        {
            FlightRole::Leader(flight) => {
                cache.metrics().record_remote_read();
                debug!("发出远程读取: key={}, sequence={}", key, flight.sequence());
                let fut = fetch();
                let sequence = flight.sequence();
                let task_cache = cache.clone();
                let task_key = key.clone();
                let task_flight = flight.clone();
                tokio::spawn(async move {
                    let outcome = match fut.await {
                        Ok(value) => match serde_json::to_vec(&value) {
                            Ok(bytes) => {
                                task_cache.accept(&task_key, sequence, bytes.clone()).await;
                                Ok(bytes)
                            }
                            Err(e) => Err(SyncError::Serialization(e.to_string())),
                        },
                        Err(e) => Err(e),
                    };
                    task_cache.flights().complete(&task_key, &task_flight, outcome);
                });
                flight
            }
            FlightRole::Follower(flight) => {
                debug!("加入在飞请求: key={}", key);
                flight
            }
        };

        let outcome = if let Some(token) = &options.liveness {
            tokio::select! {
                _ = token.cancelled() => return ReadState::idle(),
                result = flight.wait() => result,
            }
        } else {
            flight.wait().await
        };

        match outcome {
            Ok(bytes) => match serde_json::from_slice::<T>(&bytes) {
                Ok(value) => ReadState::ready(value),
                Err(e) => ReadState::failed(SyncError::Decode(e.to_string())),
            },
            Err(e) => ReadState::failed(e),
        }
    }

    /// 读取资源列表（远程存储便捷封装）
    ///
    /// 键由资源名和过滤条件按给定顺序构成，远程返回的实体
    /// 在边界处解码为封闭结构。无匹配返回空列表。
    ///
    /// # 参数
    ///
    /// * `resource` - 资源名称
    /// * `filters` - 过滤条件（顺序参与键身份）
    /// * `options` - 读取选项
    pub async fn read_list<T>(
        &self,
        resource: &str,
        filters: &[(&str, KeyParam)],
        options: ReadOptions,
    ) -> ReadState<Vec<T>>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
    {
        if resource.is_empty() {
            return ReadState::failed(SyncError::Validation(
                "资源名称不能为空".to_string(),
            ));
        }
        let (key, filter_map) = build_query(resource, filters);
        let store = self.store.clone();
        let resource = resource.to_string();
        self.read(
            &key,
            move || async move {
                let values = store.fetch(&resource, &filter_map).await?;
                decode_records::<T>(values)
            },
            options,
        )
        .await
    }

    /// 读取单个资源实体（远程存储便捷封装）
    ///
    /// 未找到时以 `NotFound` 远程错误返回在读取状态中。
    pub async fn read_one<T>(
        &self,
        resource: &str,
        filters: &[(&str, KeyParam)],
        options: ReadOptions,
    ) -> ReadState<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
    {
        if resource.is_empty() {
            return ReadState::failed(SyncError::Validation(
                "资源名称不能为空".to_string(),
            ));
        }
        let (mut key, filter_map) = build_query(resource, filters);
        key.push("one");
        let store = self.store.clone();
        let resource = resource.to_string();
        self.read(
            &key,
            move || async move {
                let value = store.fetch_one(&resource, &filter_map).await?;
                decode_record::<T>(value)
            },
            options,
        )
        .await
    }

    /// 提交尽力而为副作用
    ///
    /// 委托给上下文的副作用队列，失败只记录日志。
    pub fn submit_effect<F>(&self, label: impl Into<String>, task: F) -> bool
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        self.ctx.effects().submit(label, task)
    }
}

/// 由资源名和有序过滤条件构造键与过滤映射
fn build_query(resource: &str, filters: &[(&str, KeyParam)]) -> (ResourceKey, Filters) {
    let mut key = ResourceKey::new(resource);
    let mut map = Filters::new();
    for (name, value) in filters {
        key.push(*name);
        key.push(value.clone());
        map.insert((*name).to_string(), value.into());
    }
    (key, map)
}
