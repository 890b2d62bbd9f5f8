//! 监控插件
//!
//! 对选定组件的每次解析输出 `tracing` span 与事件并计数。
//! 启用时会先启用 `notifications` 插件，计数结果同时发布到事件总线。

use super::notifications::{ContainerEvent, ContainerEventType, NotificationsExtension};
use super::Extension;
use crate::container::Container;
use infrastructure_common::{ContainerResult, Identifier, PluginOptions};
use parking_lot::Mutex;
use serde::Deserialize;
use std::any::Any;
use std::collections::{HashMap, HashSet};
use tracing::{info, info_span};

/// 监控事件名称
pub const MONITORING_EVENT: &str = "monitoring.resolved";

/// 监控插件选项
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MonitoringOptions {
    /// 需要监控的组件标识符
    pub keys: Vec<String>,
}

/// 监控扩展
#[derive(Debug, Default)]
pub struct MonitoringExtension {
    monitored: Mutex<HashSet<String>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl MonitoringExtension {
    /// 从启用选项创建，标识符按规范键保存
    pub fn from_options(options: &PluginOptions) -> ContainerResult<Self> {
        let options: MonitoringOptions = options.bind()?;
        let extension = Self::default();
        for key in &options.keys {
            extension.monitor(key)?;
        }
        Ok(extension)
    }

    /// 追加需要监控的组件
    pub fn monitor(&self, key: &str) -> ContainerResult<()> {
        let id = Identifier::parse(key)?;
        self.monitored.lock().insert(id.key());
        Ok(())
    }

    pub fn is_monitored(&self, key: &str) -> bool {
        self.monitored.lock().contains(key)
    }

    /// 组件被解析的次数
    pub fn calls(&self, key: &str) -> usize {
        self.calls.lock().get(key).copied().unwrap_or(0)
    }
}

impl Extension for MonitoringExtension {
    fn name(&self) -> &str {
        "monitoring"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn applied(&self, container: &mut Container) -> ContainerResult<()> {
        container.use_plugin("notifications", PluginOptions::new())
    }

    fn after_resolve(&self, container: &Container, key: &str) {
        if !self.is_monitored(key) {
            return;
        }

        let calls = {
            let mut calls = self.calls.lock();
            let count = calls.entry(key.to_string()).or_insert(0);
            *count += 1;
            *count
        };

        let span = info_span!("component_resolve", component = key);
        let _guard = span.enter();
        info!(calls, "监控组件解析");

        if let Some(notifications) = container.extension::<NotificationsExtension>() {
            let event = ContainerEvent::new(
                ContainerEventType::Custom(MONITORING_EVENT.to_string()),
                key,
            )
            .with_metadata("calls", calls.to_string());
            notifications.bus().publish(&event);
        }
    }
}
