//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了单飞机制：同一键同一时刻至多一个在飞远程请求，
//! 并发调用方共享领飞者的结果而不是重复发起远程调用。

use crate::error::Result;
use crate::key::ResourceKey;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::{Arc, OnceLock};
use tokio::sync::Notify;

/// 单飞结果
///
/// 领飞者拉取并序列化后的载荷，或失败原因。跟飞者克隆共享。
pub type FlightResult = Result<Vec<u8>>;

/// 在飞请求
///
/// 携带发起时分配的请求序列号。结果写入后不可变更。
pub struct Flight {
    sequence: u64,
    notify: Notify,
    result: OnceLock<FlightResult>,
}

impl Flight {
    fn new(sequence: u64) -> Self {
        Self {
            sequence,
            notify: Notify::new(),
            result: OnceLock::new(),
        }
    }

    /// 该在飞请求的序列号
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// 写入结果并唤醒所有跟飞者
    pub fn complete(&self, result: FlightResult) {
        let _ = self.result.set(result);
        self.notify.notify_waiters();
    }

    /// 等待结果
    ///
    /// 先注册唤醒再检查结果，避免错过 complete 与 notified 之间的竞争。
    pub async fn wait(&self) -> FlightResult {
        loop {
            let notified = self.notify.notified();
            if let Some(result) = self.result.get() {
                return result.clone();
            }
            notified.await;
        }
    }
}

/// 角色：本次读取是领飞还是跟飞
pub enum FlightRole {
    /// 领飞者，负责发起远程请求并回填结果
    Leader(Arc<Flight>),
    /// 跟飞者，等待领飞者的结果
    Follower(Arc<Flight>),
}

/// 在飞请求表
#[derive(Default)]
pub struct FlightTable {
    in_flight: DashMap<ResourceKey, Arc<Flight>>,
}

impl FlightTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 加入既有在飞请求或成为领飞者
    ///
    /// 既有在飞请求的序列号低于该键当前最新序列号时（即期间发生过失效），
    /// 不允许加入——替换为新的在飞请求，保证失效之后的读取
    /// 严格晚于失效被记录后才发出。
    ///
    /// # 参数
    ///
    /// * `key` - 资源键
    /// * `latest` - 该键当前最新的请求序列号
    /// * `next_sequence` - 成为领飞者时分配新序列号的回调
    pub fn join_or_lead<F>(&self, key: &ResourceKey, latest: u64, next_sequence: F) -> FlightRole
    where
        F: FnOnce() -> u64,
    {
        match self.in_flight.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().sequence() >= latest {
                    FlightRole::Follower(occupied.get().clone())
                } else {
                    let flight = Arc::new(Flight::new(next_sequence()));
                    *occupied.get_mut() = flight.clone();
                    FlightRole::Leader(flight)
                }
            }
            Entry::Vacant(vacant) => {
                let flight = Arc::new(Flight::new(next_sequence()));
                vacant.insert(flight.clone());
                FlightRole::Leader(flight)
            }
        }
    }

    /// 完成在飞请求
    ///
    /// 仅当表中仍持有同一个在飞请求时才将其移除——
    /// 过期的领飞者不能移除替换它的新在飞请求。
    pub fn complete(&self, key: &ResourceKey, flight: &Arc<Flight>, result: FlightResult) {
        self.in_flight
            .remove_if(key, |_, current| Arc::ptr_eq(current, flight));
        flight.complete(result);
    }

    /// 当前在飞请求数（测试与指标用）
    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }
}
