//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了变更操作：写穿远程存储、成功后按键前缀失效缓存、
//! 发出用户通知，以及复合变更的补偿回滚。

use crate::client::ResourceClient;
use crate::error::{Result, SyncError};
use crate::key::KeyPrefix;
use crate::notify::NotificationKind;
use crate::remote::WriteOp;
use serde_json::Value;
use std::future::Future;
use tracing::{debug, instrument, warn};

/// 变更描述符
///
/// 一次变更的声明部分：成功/失败消息和成功后要失效的键前缀集合。
#[derive(Debug, Clone)]
pub struct MutationDescriptor {
    /// 变更标签，用作通知标题和日志标识
    pub label: String,
    /// 成功通知正文
    pub success_message: String,
    /// 失败通知正文（远程错误属于预期内类别且消息更具体时被其覆盖）
    pub failure_message: String,
    /// 成功后失效的键前缀
    pub invalidation_prefixes: Vec<KeyPrefix>,
    /// 通知展示时长（毫秒），None 使用上下文默认值
    pub notification_duration_ms: Option<u64>,
}

impl MutationDescriptor {
    /// 创建新的变更描述符
    ///
    /// # 参数
    ///
    /// * `label` - 变更标签
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            success_message: format!("{} succeeded", label),
            failure_message: format!("{} failed", label),
            label,
            invalidation_prefixes: Vec::new(),
            notification_duration_ms: None,
        }
    }

    /// 设置成功通知正文
    pub fn on_success(mut self, message: impl Into<String>) -> Self {
        self.success_message = message.into();
        self
    }

    /// 设置失败通知正文
    pub fn on_failure(mut self, message: impl Into<String>) -> Self {
        self.failure_message = message.into();
        self
    }

    /// 追加一个成功后失效的键前缀
    pub fn invalidates(mut self, prefix: KeyPrefix) -> Self {
        self.invalidation_prefixes.push(prefix);
        self
    }

    /// 设置通知展示时长
    pub fn notification_duration(mut self, duration_ms: u64) -> Self {
        self.notification_duration_ms = Some(duration_ms);
        self
    }
}

impl ResourceClient {
    /// 执行变更
    ///
    /// `perform(input)` 恰好执行一次，不自动重试（远程写不保证幂等）。
    /// 成功时副作用的顺序固定：缓存失效先于通知发出，通知先于返回，
    /// 因此响应返回值而重新渲染的视图总能看到已失效的缓存状态。
    /// 失败时缓存不被触碰，发出失败通知并返回错误——双重暴露是有意的：
    /// 通知是环境反馈，返回的错误让调用方保留表单状态以便修正。
    ///
    /// 同一键上的并发变更允许交叠，本层不做互斥；
    /// 业务需要互斥时由调用方处理（如变更期间禁用相应控件）。
    ///
    /// # 参数
    ///
    /// * `input` - 变更输入
    /// * `perform` - 远程写操作
    /// * `descriptor` - 变更描述符
    ///
    /// # 返回值
    ///
    /// 返回远程结果或错误
    #[instrument(skip(self, input, perform, descriptor), level = "debug", fields(label = %descriptor.label))]
    pub async fn mutate<I, R, F, Fut>(
        &self,
        input: I,
        perform: F,
        descriptor: &MutationDescriptor,
    ) -> Result<R>
    where
        F: FnOnce(I) -> Fut,
        Fut: Future<Output = Result<R>>,
    {
        match perform(input).await {
            Ok(result) => {
                let invalidated = self
                    .context()
                    .cache()
                    .invalidate_prefixes(&descriptor.invalidation_prefixes)
                    .await;
                debug!(
                    "变更成功: label={}, invalidated_keys={}",
                    descriptor.label, invalidated
                );
                self.context().metrics().record_mutation(true);
                self.context().notifications().push(
                    NotificationKind::Success,
                    descriptor.label.clone(),
                    descriptor.success_message.clone(),
                    descriptor.notification_duration_ms,
                );
                Ok(result)
            }
            Err(e) => {
                warn!("变更失败: label={}: {}", descriptor.label, e);
                self.context().metrics().record_mutation(false);
                let message = match e.as_remote() {
                    Some(remote) if remote.is_expected() => remote.message.clone(),
                    _ => descriptor.failure_message.clone(),
                };
                self.context().notifications().push(
                    NotificationKind::Error,
                    descriptor.label.clone(),
                    message,
                    descriptor.notification_duration_ms,
                );
                Err(e)
            }
        }
    }

    /// 执行单次远程写变更（便捷封装）
    ///
    /// # 参数
    ///
    /// * `resource` - 资源名称
    /// * `op` - 写操作类型
    /// * `payload` - 载荷
    /// * `descriptor` - 变更描述符
    pub async fn mutate_write(
        &self,
        resource: &str,
        op: WriteOp,
        payload: Value,
        descriptor: &MutationDescriptor,
    ) -> Result<Option<Value>> {
        if resource.is_empty() {
            return Err(SyncError::Validation("资源名称不能为空".to_string()));
        }
        let store = self.store().clone();
        let resource = resource.to_string();
        self.mutate(
            payload,
            move |payload| async move { Ok(store.write(&resource, op, payload).await?) },
            descriptor,
        )
        .await
    }
}

/// 带补偿回滚地执行两步远程写
///
/// 复合变更（如"创建项目"后"把创建者加为成员"）没有跨资源事务原语可用：
/// 第二步失败时执行补偿动作撤销第一步。补偿自身也失败时，
/// 错误同时报告两个原因，绝不吞掉第二个失败。
///
/// 作为单个变更描述符的 perform 函数使用，配合 [`ResourceClient::mutate`]。
///
/// # 参数
///
/// * `primary` - 第一步写操作
/// * `secondary` - 第二步写操作，接收第一步的结果
/// * `compensate` - 第二步失败时撤销第一步的补偿动作
///
/// # 返回值
///
/// 两步都成功时返回两步的结果
pub async fn with_compensation<A, B, P, FP, S, FS, C, FC>(
    primary: P,
    secondary: S,
    compensate: C,
) -> Result<(A, B)>
where
    A: Clone,
    P: FnOnce() -> FP,
    FP: Future<Output = Result<A>>,
    S: FnOnce(A) -> FS,
    FS: Future<Output = Result<B>>,
    C: FnOnce(A) -> FC,
    FC: Future<Output = Result<()>>,
{
    let first = primary().await?;
    match secondary(first.clone()).await {
        Ok(second) => Ok((first, second)),
        Err(secondary_err) => {
            warn!("复合变更第二步失败，执行补偿回滚: {}", secondary_err);
            match compensate(first).await {
                Ok(()) => Err(secondary_err),
                Err(comp_err) => Err(SyncError::Compensation {
                    primary: Box::new(secondary_err),
                    compensation: Box::new(comp_err),
                }),
            }
        }
    }
}
