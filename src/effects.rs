//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了尽力而为的副作用队列。
//! 外发通知（如"提交后发送邮件"）对主操作是即发即忘的：
//! 其失败只记录日志，永远不影响主变更的结果。

use crate::config::EffectConfig;
use crate::error::Result;
use futures::future::BoxFuture;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

struct Effect {
    label: String,
    task: BoxFuture<'static, Result<()>>,
}

/// 尽力而为副作用队列
///
/// mpsc 供给的单个后台工作任务顺序执行副作用。
/// 队列满时新任务被丢弃并记录日志（尽力而为契约的一部分）。
pub struct EffectQueue {
    tx: Mutex<Option<mpsc::Sender<Effect>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl EffectQueue {
    /// 创建队列并启动后台工作任务
    ///
    /// # 参数
    ///
    /// * `config` - 队列配置
    pub fn new(config: &EffectConfig) -> Self {
        let (tx, mut rx) = mpsc::channel::<Effect>(config.queue_depth);
        let worker = tokio::spawn(async move {
            while let Some(effect) = rx.recv().await {
                match effect.task.await {
                    Ok(()) => debug!("副作用完成: {}", effect.label),
                    Err(e) => warn!("副作用失败（不影响主操作）: {}: {}", effect.label, e),
                }
            }
            debug!("副作用队列工作任务退出");
        });
        Self {
            tx: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// 提交副作用
    ///
    /// 永不阻塞、永不失败地返回：队列满或已关闭时任务被丢弃并记录日志。
    ///
    /// # 参数
    ///
    /// * `label` - 用于日志的任务标签
    /// * `task` - 副作用任务
    ///
    /// # 返回值
    ///
    /// 任务入队返回 true，被丢弃返回 false
    pub fn submit<F>(&self, label: impl Into<String>, task: F) -> bool
    where
        F: std::future::Future<Output = Result<()>> + Send + 'static,
    {
        let label = label.into();
        let effect = Effect {
            label: label.clone(),
            task: Box::pin(task),
        };
        let sender = self.tx.lock().unwrap().clone();
        match sender {
            Some(tx) => match tx.try_send(effect) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!("副作用队列已满，任务被丢弃: {}", label);
                    false
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    warn!("副作用队列已关闭，任务被丢弃: {}", label);
                    false
                }
            },
            None => {
                warn!("副作用队列已关闭，任务被丢弃: {}", label);
                false
            }
        }
    }

    /// 关闭队列
    ///
    /// 关闭发送端并等待工作任务清空剩余副作用后退出。
    pub async fn shutdown(&self) {
        let tx = self.tx.lock().unwrap().take();
        drop(tx);
        let worker = self.worker.lock().unwrap().take();
        if let Some(handle) = worker {
            if let Err(e) = handle.await {
                warn!("副作用队列工作任务异常退出: {}", e);
            }
        }
    }
}
