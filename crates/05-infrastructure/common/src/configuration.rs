//! 配置相关的基础定义

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// 默认核心目录名称
pub const DEFAULT_CORE_DIR: &str = "core";

/// 默认源文件扩展名
pub const DEFAULT_SOURCE_EXTENSION: &str = "rs";

/// 启动单元所在的子目录
pub const BOOT_DIR: &str = "boot";

/// 容器配置
///
/// 通过 `configure` 设定一次，之后容器进入已配置状态
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ContainerSettings {
    /// 运行环境名称
    pub env: Option<String>,
    /// 应用根目录
    pub root: PathBuf,
    /// 核心目录名称，启动单元位于 `<core_dir>/boot`
    pub core_dir: String,
    /// 需要自动注册的目录（相对根目录）
    pub auto_register: Vec<String>,
    /// 源文件扩展名
    pub source_extension: String,
    /// 配置加载器返回的应用配置
    pub app: Option<Value>,
}

impl ContainerSettings {
    /// 使用指定根目录创建配置
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// 启动单元目录（绝对路径）
    pub fn boot_dir(&self) -> PathBuf {
        self.root.join(&self.core_dir).join(BOOT_DIR)
    }

    /// 指定名称的启动单元文件（绝对路径）
    pub fn boot_file(&self, name: &str) -> PathBuf {
        self.boot_dir()
            .join(format!("{}.{}", name, self.source_extension))
    }

    /// 读取应用配置中的值，键使用 `.` 分隔
    pub fn app_value(&self, key: &str) -> Option<&Value> {
        let mut current = self.app.as_ref()?;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }
}

impl Default for ContainerSettings {
    fn default() -> Self {
        Self {
            env: None,
            root: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            core_dir: DEFAULT_CORE_DIR.to_string(),
            auto_register: Vec::new(),
            source_extension: DEFAULT_SOURCE_EXTENSION.to_string(),
            app: None,
        }
    }
}

/// 插件选项
///
/// 启用插件时传入的参数，仅对有状态插件生效
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PluginOptions {
    data: Map<String, Value>,
}

impl PluginOptions {
    /// 创建空选项
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置选项
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// 获取选项
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// 获取字符串选项
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    /// 是否没有任何选项
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 绑定到具体类型
    pub fn bind<T>(&self) -> Result<T, ConfigError>
    where
        T: for<'de> Deserialize<'de>,
    {
        serde_json::from_value(Value::Object(self.data.clone()))
            .map_err(|e| ConfigError::SerializationError { source: e })
    }
}

impl TryFrom<Value> for PluginOptions {
    type Error = ConfigError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(data) => Ok(Self { data }),
            Value::Null => Ok(Self::default()),
            other => Err(ConfigError::TypeConversionError {
                message: format!("插件选项必须是对象，实际为: {}", other),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct EnvOptions {
        var: String,
        #[serde(default)]
        fallback: Option<String>,
    }

    #[test]
    fn test_settings_defaults() {
        let settings = ContainerSettings::with_root("/srv/app");

        assert_eq!(settings.core_dir, "core");
        assert_eq!(settings.source_extension, "rs");
        assert!(settings.auto_register.is_empty());
        assert_eq!(settings.boot_file("db"), PathBuf::from("/srv/app/core/boot/db.rs"));
    }

    #[test]
    fn test_app_value_lookup() {
        let mut settings = ContainerSettings::with_root("/srv/app");
        settings.app = Some(json!({ "database": { "url": "postgres://localhost" } }));

        assert_eq!(
            settings.app_value("database.url"),
            Some(&json!("postgres://localhost"))
        );
        assert!(settings.app_value("database.pool").is_none());
    }

    #[test]
    fn test_plugin_options_bind() {
        let options = PluginOptions::new().with("var", "RACK_ENV");
        let bound: EnvOptions = options.bind().unwrap();

        assert_eq!(
            bound,
            EnvOptions {
                var: "RACK_ENV".to_string(),
                fallback: None
            }
        );
        assert_eq!(options.get_str("var"), Some("RACK_ENV"));
    }

    #[test]
    fn test_plugin_options_from_value() {
        assert!(PluginOptions::try_from(json!(null)).unwrap().is_empty());
        assert!(PluginOptions::try_from(json!([1, 2])).is_err());
    }
}
