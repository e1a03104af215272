//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了资源键与键前缀，缓存槽位的身份由它们决定。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 键参数
///
/// 资源键中的单个参数值。只允许稳定、可序列化的标量——
/// 身份由值相等决定，不稳定的参数会导致缓存永远未命中（调用方契约）。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyParam {
    /// 字符串参数
    Str(String),
    /// 有符号整数参数
    Int(i64),
    /// 无符号整数参数
    Uint(u64),
    /// 布尔参数
    Bool(bool),
    /// 空参数（显式的"无值"，与省略参数不同，参与身份比较）
    Null,
}

impl From<&str> for KeyParam {
    fn from(v: &str) -> Self {
        KeyParam::Str(v.to_string())
    }
}

impl From<String> for KeyParam {
    fn from(v: String) -> Self {
        KeyParam::Str(v)
    }
}

impl From<i64> for KeyParam {
    fn from(v: i64) -> Self {
        KeyParam::Int(v)
    }
}

impl From<u64> for KeyParam {
    fn from(v: u64) -> Self {
        KeyParam::Uint(v)
    }
}

impl From<bool> for KeyParam {
    fn from(v: bool) -> Self {
        KeyParam::Bool(v)
    }
}

impl From<&KeyParam> for serde_json::Value {
    fn from(param: &KeyParam) -> Self {
        match param {
            KeyParam::Str(v) => serde_json::Value::String(v.clone()),
            KeyParam::Int(v) => serde_json::Value::from(*v),
            KeyParam::Uint(v) => serde_json::Value::from(*v),
            KeyParam::Bool(v) => serde_json::Value::Bool(*v),
            KeyParam::Null => serde_json::Value::Null,
        }
    }
}

impl fmt::Display for KeyParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyParam::Str(v) => write!(f, "{}", v),
            KeyParam::Int(v) => write!(f, "{}", v),
            KeyParam::Uint(v) => write!(f, "{}", v),
            KeyParam::Bool(v) => write!(f, "{}", v),
            KeyParam::Null => write!(f, "null"),
        }
    }
}

/// 资源键
///
/// 有序元组 `(resource, p1, p2, ...)`，唯一标识一个缓存读取结果。
/// 键是扁平序列而非集合：参数插入顺序参与身份比较，
/// 两个值相等的键指向同一个缓存槽位。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceKey {
    resource: String,
    params: Vec<KeyParam>,
}

impl ResourceKey {
    /// 创建只含资源名的键
    ///
    /// # 参数
    ///
    /// * `resource` - 资源名称（如 "projects"、"milestones"）
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            params: Vec::new(),
        }
    }

    /// 追加一个参数并返回键（链式构造）
    pub fn with(mut self, param: impl Into<KeyParam>) -> Self {
        self.params.push(param.into());
        self
    }

    /// 追加一个参数
    pub fn push(&mut self, param: impl Into<KeyParam>) {
        self.params.push(param.into());
    }

    /// 资源名称
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// 参数序列
    pub fn params(&self) -> &[KeyParam] {
        &self.params
    }

    /// 判断键是否匹配给定前缀
    ///
    /// 资源名相等且键的前导参数与前缀参数逐项相等时匹配。
    ///
    /// # 参数
    ///
    /// * `prefix` - 键前缀
    ///
    /// # 返回值
    ///
    /// 匹配返回 true
    pub fn matches(&self, prefix: &KeyPrefix) -> bool {
        if self.resource != prefix.resource {
            return false;
        }
        if prefix.params.len() > self.params.len() {
            return false;
        }
        self.params
            .iter()
            .zip(prefix.params.iter())
            .all(|(a, b)| a == b)
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.resource)?;
        for p in &self.params {
            write!(f, ":{}", p)?;
        }
        Ok(())
    }
}

/// 键前缀
///
/// 资源名加可选的前导参数，用于声明一次变更成功后需要失效哪些缓存条目。
/// 只含资源名的前缀使该资源命名空间下的所有键失效。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyPrefix {
    resource: String,
    params: Vec<KeyParam>,
}

impl KeyPrefix {
    /// 创建覆盖整个资源命名空间的前缀
    pub fn resource(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            params: Vec::new(),
        }
    }

    /// 追加一个前导参数并返回前缀（链式构造）
    pub fn with(mut self, param: impl Into<KeyParam>) -> Self {
        self.params.push(param.into());
        self
    }
}

impl From<&ResourceKey> for KeyPrefix {
    fn from(key: &ResourceKey) -> Self {
        Self {
            resource: key.resource.clone(),
            params: key.params.clone(),
        }
    }
}

impl fmt::Display for KeyPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.resource)?;
        for p in &self.params {
            write!(f, ":{}", p)?;
        }
        write!(f, ":*")
    }
}
