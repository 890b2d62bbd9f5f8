//! 配置加载器抽象接口

use infrastructure_common::ConfigError;
use serde_json::Value;
use std::fmt::Debug;
use std::path::Path;

/// 配置加载器 trait
///
/// 按应用根目录与运行环境加载应用配置
pub trait ConfigLoader: Send + Sync + Debug {
    /// 加载配置，没有可用配置时返回 `None`
    fn load(&self, root: &Path, env: Option<&str>) -> Result<Option<Value>, ConfigError>;

    /// 获取加载器名称
    fn name(&self) -> &str;
}

/// 空配置加载器
///
/// 始终不返回配置
#[derive(Debug, Clone, Copy, Default)]
pub struct NullConfigLoader;

impl ConfigLoader for NullConfigLoader {
    fn load(&self, _root: &Path, _env: Option<&str>) -> Result<Option<Value>, ConfigError> {
        Ok(None)
    }

    fn name(&self) -> &str {
        "NullConfigLoader"
    }
}
