//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了同步系统的配置结构和解析逻辑。

use serde::Deserialize;
use std::path::Path;

pub const CONFIG_VERSION: u32 = 1;

/// 同步系统配置
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub config_version: Option<u32>,
    /// 缓存配置
    #[serde(default)]
    pub cache: CacheConfig,
    /// 通知配置
    #[serde(default)]
    pub notifications: NotificationConfig,
    /// 尽力而为副作用队列配置
    #[serde(default)]
    pub effects: EffectConfig,
}

/// 缓存配置
///
/// 条目存储的容量上界和TTL。失效主要由变更的键前缀驱动，
/// 容量与TTL是长期运行进程中防止无界增长的兜底。
#[derive(Deserialize, Clone, Debug)]
pub struct CacheConfig {
    /// 最大条目数
    pub max_capacity: u64,
    /// 条目存活时间（秒），None 表示条目只被显式失效
    pub ttl_secs: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            ttl_secs: Some(300),
        }
    }
}

/// 通知配置
#[derive(Deserialize, Clone, Debug)]
pub struct NotificationConfig {
    /// 默认展示时长（毫秒），0 表示常驻直到用户关闭
    pub default_duration_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            default_duration_ms: 5000,
        }
    }
}

/// 尽力而为副作用队列配置
#[derive(Deserialize, Clone, Debug)]
pub struct EffectConfig {
    /// 队列深度，队列满时新任务被丢弃并记录日志
    pub queue_depth: usize,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self { queue_depth: 256 }
    }
}

impl Config {
    /// 从TOML文件加载配置
    ///
    /// # 参数
    ///
    /// * `path` - 配置文件路径
    ///
    /// # 返回值
    ///
    /// 返回解析后的配置或错误
    pub fn from_file(path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| crate::error::SyncError::Config(format!("读取配置文件失败: {}", e)))?;
        Self::from_str(&content)
    }

    /// 从TOML字符串解析配置
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> crate::error::Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| crate::error::SyncError::Config(format!("解析配置失败: {}", e)))?;
        config
            .validate()
            .map_err(crate::error::SyncError::Config)?;
        Ok(config)
    }

    /// 校验配置
    ///
    /// # 返回值
    ///
    /// 配置合法返回 Ok(())，否则返回描述性错误消息
    pub fn validate(&self) -> std::result::Result<(), String> {
        if let Some(version) = self.config_version {
            if version > CONFIG_VERSION {
                return Err(format!(
                    "不支持的配置版本 {}，当前支持的最高版本为 {}",
                    version, CONFIG_VERSION
                ));
            }
        }
        if self.cache.max_capacity == 0 {
            return Err("cache.max_capacity 必须大于 0".to_string());
        }
        if let Some(ttl) = self.cache.ttl_secs {
            if ttl == 0 {
                return Err("cache.ttl_secs 必须大于 0，如需禁用TTL请省略该字段".to_string());
            }
        }
        if self.effects.queue_depth == 0 {
            return Err("effects.queue_depth 必须大于 0".to_string());
        }
        Ok(())
    }
}
