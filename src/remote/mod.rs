//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了远程资源存储的抽象接口。
//! 具体的传输、鉴权和字段映射由协作方实现，核心层只消费这里的契约。

use crate::error::{RemoteError, Result, SyncError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// 远程写操作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    /// 插入新实体
    Insert,
    /// 更新既有实体
    Update,
    /// 删除实体
    Delete,
}

/// 查询过滤条件
///
/// 开放的字段到值映射，语义由远程实现解释（通常为等值过滤）
pub type Filters = Map<String, Value>;

/// 远程资源存储接口
///
/// 同步层的唯一后端依赖。实现方负责传输细节（包括超时），
/// 所有失败以 [`RemoteError`] 返回并携带分类码。
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// 列表查询
    ///
    /// # 参数
    ///
    /// * `resource` - 资源名称
    /// * `filters` - 过滤条件
    ///
    /// # 返回值
    ///
    /// 返回匹配的实体列表。无匹配时返回空列表，不视为错误。
    async fn fetch(
        &self,
        resource: &str,
        filters: &Filters,
    ) -> std::result::Result<Vec<Value>, RemoteError>;

    /// 单实体查询
    ///
    /// # 参数
    ///
    /// * `resource` - 资源名称
    /// * `filters` - 过滤条件
    ///
    /// # 返回值
    ///
    /// 返回匹配的实体。未找到时返回 `NotFound` 错误。
    async fn fetch_one(
        &self,
        resource: &str,
        filters: &Filters,
    ) -> std::result::Result<Value, RemoteError>;

    /// 写操作
    ///
    /// # 参数
    ///
    /// * `resource` - 资源名称
    /// * `op` - 写操作类型
    /// * `payload` - 载荷
    ///
    /// # 返回值
    ///
    /// 返回写入后的实体（删除操作可返回 None）。
    /// 约束冲突、权限拒绝和网络失败以带分类码的 `RemoteError` 返回。
    async fn write(
        &self,
        resource: &str,
        op: WriteOp,
        payload: Value,
    ) -> std::result::Result<Option<Value>, RemoteError>;
}

/// 对象存储接口
///
/// 附件类变更消费的独立协作方接口。核心层只把它当作
/// 复合变更中的一个 perform 步骤，不关心其内部实现。
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// 上传对象
    ///
    /// # 参数
    ///
    /// * `path` - 对象路径
    /// * `bytes` - 对象内容
    /// * `content_type` - 内容类型
    ///
    /// # 返回值
    ///
    /// 返回存储侧的对象路径
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> std::result::Result<String, RemoteError>;

    /// 获取对象的公开访问URL
    fn public_url(&self, path: &str) -> String;

    /// 删除对象
    async fn remove(&self, paths: &[String]) -> std::result::Result<(), RemoteError>;
}

/// 将远程返回的实体列表解码为封闭结构
///
/// 边界校验：远程载荷不被信任，解码失败（包括未知字段，
/// 当目标类型声明了 `#[serde(deny_unknown_fields)]` 时）返回 `Decode` 错误。
///
/// # 参数
///
/// * `values` - 远程返回的原始JSON值
///
/// # 返回值
///
/// 返回解码后的实体列表或第一个解码错误
pub fn decode_records<T: DeserializeOwned>(values: Vec<Value>) -> Result<Vec<T>> {
    values
        .into_iter()
        .map(|v| {
            serde_json::from_value(v).map_err(|e| SyncError::Decode(format!("载荷解码失败: {}", e)))
        })
        .collect()
}

/// 将单个远程实体解码为封闭结构
pub fn decode_record<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| SyncError::Decode(format!("载荷解码失败: {}", e)))
}
