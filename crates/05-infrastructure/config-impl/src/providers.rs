//! 配置加载器实现

use config_abstractions::ConfigLoader;
use infrastructure_common::ConfigError;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, error};

/// 默认配置文件基础名称（相对应用根目录，不含扩展名）
pub const DEFAULT_CONFIG_BASE: &str = "config/application";

/// 文件配置加载器
///
/// 读取 `<root>/<base>.{toml,yaml,json}`，再以 `<root>/<base>.local.*` 覆盖，
/// 然后选取以运行环境命名的顶层表。
#[derive(Debug, Clone)]
pub struct FileConfigLoader {
    base_name: String,
    local_overrides: bool,
}

impl FileConfigLoader {
    /// 创建新的文件配置加载器
    pub fn new() -> Self {
        Self {
            base_name: DEFAULT_CONFIG_BASE.to_string(),
            local_overrides: true,
        }
    }

    /// 设置配置文件基础名称
    pub fn with_base_name(mut self, base_name: impl Into<String>) -> Self {
        self.base_name = base_name.into();
        self
    }

    /// 设置是否读取本地覆盖文件
    pub fn with_local_overrides(mut self, enabled: bool) -> Self {
        self.local_overrides = enabled;
        self
    }

    /// 合并所有配置文件
    fn read_merged(&self, root: &Path) -> Result<Value, ConfigError> {
        let base = root.join(&self.base_name);
        let base_name = base.to_string_lossy().into_owned();

        let mut builder =
            config::Config::builder().add_source(config::File::with_name(&base_name).required(false));

        if self.local_overrides {
            let local = format!("{}.local", base_name);
            builder = builder.add_source(config::File::with_name(&local).required(false));
        }

        let settings = builder.build().map_err(|e| {
            error!("配置构建失败: {}", e);
            ConfigError::ParseError {
                source: Box::new(e),
            }
        })?;

        settings.try_deserialize::<Value>().map_err(|e| {
            error!("配置反序列化失败: {}", e);
            ConfigError::ParseError {
                source: Box::new(e),
            }
        })
    }
}

impl Default for FileConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader for FileConfigLoader {
    fn load(&self, root: &Path, env: Option<&str>) -> Result<Option<Value>, ConfigError> {
        debug!("加载应用配置: root={}, env={:?}", root.display(), env);

        let merged = match self.read_merged(root)? {
            Value::Object(map) if map.is_empty() => {
                debug!("未找到应用配置文件");
                return Ok(None);
            }
            Value::Object(map) => map,
            other => {
                return Err(ConfigError::TypeConversionError {
                    message: format!("应用配置顶层必须是表，实际为: {}", other),
                })
            }
        };

        let Some(env) = env else {
            return Ok(Some(Value::Object(merged)));
        };

        match merged.get(env) {
            Some(section @ Value::Object(_)) => {
                debug!("使用环境配置节: {}", env);
                Ok(Some(section.clone()))
            }
            Some(other) => Err(ConfigError::TypeConversionError {
                message: format!("环境配置节 {} 不是表类型: {}", env, other),
            }),
            None => {
                debug!("应用配置中没有环境 {} 的配置节", env);
                Ok(None)
            }
        }
    }

    fn name(&self) -> &str {
        "FileConfigLoader"
    }
}
