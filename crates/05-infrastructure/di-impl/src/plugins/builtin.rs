//! 内置插件
//!
//! - `env`：确定运行环境
//! - `logging`：为容器生命周期事件输出日志
//! - `dependency_graph`：记录组件注册顺序
//! - `notifications`：把生命周期事件发布到事件总线
//! - `monitoring`：跟踪选定组件的解析

use super::monitoring::MonitoringExtension;
use super::notifications::NotificationsExtension;
use super::{Behavior, Extension, Plugin, PluginRegistry};
use crate::container::Container;
use infrastructure_common::{ContainerResult, PluginOptions};
use parking_lot::Mutex;
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, info};

/// 默认读取的环境变量
pub const DEFAULT_ENV_VAR: &str = "APP_ENV";

/// 未指定时使用的运行环境
pub const DEFAULT_ENV: &str = "development";

/// 运行环境扩展
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvExtension {
    env: String,
}

impl EnvExtension {
    /// 依次使用 `env` 选项、`var` 选项指定的环境变量、默认值
    pub fn from_options(options: &PluginOptions) -> Self {
        let env = match options.get_str("env") {
            Some(env) => env.to_string(),
            None => {
                let var = options.get_str("var").unwrap_or(DEFAULT_ENV_VAR);
                std::env::var(var).unwrap_or_else(|_| DEFAULT_ENV.to_string())
            }
        };
        Self { env }
    }

    pub fn env(&self) -> &str {
        &self.env
    }
}

impl Extension for EnvExtension {
    fn name(&self) -> &str {
        "env"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn applied(&self, container: &mut Container) -> ContainerResult<()> {
        let settings = container.settings_mut();
        if settings.env.is_none() {
            debug!("设置运行环境: {}", self.env);
            settings.env = Some(self.env.clone());
        }
        Ok(())
    }
}

/// 生命周期日志扩展
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingExtension;

impl Extension for LoggingExtension {
    fn name(&self) -> &str {
        "logging"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn after_register(&self, _container: &Container, key: &str) {
        info!(component = key, "组件已注册");
    }

    fn before_boot(&self, _container: &Container, unit: &str) {
        info!(unit = unit, "启动单元开始");
    }

    fn after_boot(&self, _container: &Container, unit: &str) {
        info!(unit = unit, "启动单元完成");
    }

    fn after_finalize(&self, container: &Container) {
        info!(components = container.keys().len(), "容器已完成启动");
    }
}

/// 依赖图扩展
///
/// 按注册顺序记录组件标识符
#[derive(Debug, Default)]
pub struct DependencyGraphExtension {
    identifiers: Mutex<Vec<String>>,
}

impl DependencyGraphExtension {
    pub fn identifiers(&self) -> Vec<String> {
        self.identifiers.lock().clone()
    }
}

impl Extension for DependencyGraphExtension {
    fn name(&self) -> &str {
        "dependency_graph"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn applied(&self, container: &mut Container) -> ContainerResult<()> {
        self.identifiers.lock().extend(container.keys());
        Ok(())
    }

    fn after_register(&self, _container: &Container, key: &str) {
        self.identifiers.lock().push(key.to_string());
    }
}

/// 注册全部内置插件
pub fn register_builtins(registry: &PluginRegistry) {
    registry.register(Plugin::new(
        "env",
        Behavior::stateful(|options| {
            Ok(Arc::new(EnvExtension::from_options(options)) as Arc<dyn Extension>)
        }),
    ));
    registry.register(Plugin::new(
        "logging",
        Behavior::stateless(LoggingExtension),
    ));
    registry.register(Plugin::new(
        "dependency_graph",
        Behavior::stateful(|_| {
            Ok(Arc::new(DependencyGraphExtension::default()) as Arc<dyn Extension>)
        }),
    ));
    registry.register(Plugin::new(
        "notifications",
        Behavior::stateful(|_| Ok(Arc::new(NotificationsExtension::new()) as Arc<dyn Extension>)),
    ));
    registry.register(Plugin::new(
        "monitoring",
        Behavior::stateful(|options| {
            Ok(Arc::new(MonitoringExtension::from_options(options)?) as Arc<dyn Extension>)
        }),
    ));
}
