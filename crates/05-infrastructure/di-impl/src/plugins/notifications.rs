//! 通知插件
//!
//! 把容器生命周期事件转发到事件总线。总线同时以 `notifications`
//! 组件注册到容器中，应用代码可以解析它来订阅或发布自定义事件。

use super::Extension;
use crate::container::Container;
use infrastructure_common::{instance, ContainerResult};
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// 总线在容器中的组件键
pub const NOTIFICATIONS_KEY: &str = "notifications";

/// 容器事件类型
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContainerEventType {
    /// 组件已注册
    Registered,
    /// 组件已解析
    Resolved,
    /// 启动单元开始
    BootStarted,
    /// 启动单元完成
    BootCompleted,
    /// 容器已冻结
    Finalized,
    /// 应用自定义事件
    Custom(String),
}

impl fmt::Display for ContainerEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registered => write!(f, "component.registered"),
            Self::Resolved => write!(f, "component.resolved"),
            Self::BootStarted => write!(f, "boot.started"),
            Self::BootCompleted => write!(f, "boot.completed"),
            Self::Finalized => write!(f, "container.finalized"),
            Self::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// 容器事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerEvent {
    /// 事件类型
    pub event_type: ContainerEventType,
    /// 事件主体：组件键或启动单元名称
    pub subject: String,
    /// 额外元数据
    pub metadata: HashMap<String, String>,
}

impl ContainerEvent {
    pub fn new(event_type: ContainerEventType, subject: impl Into<String>) -> Self {
        Self {
            event_type,
            subject: subject.into(),
            metadata: HashMap::new(),
        }
    }

    /// 添加元数据
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// 事件监听函数
pub type Listener = Arc<dyn Fn(&ContainerEvent) + Send + Sync>;

/// 同步事件总线
///
/// 监听函数在发布线程上按订阅顺序执行
#[derive(Default)]
pub struct Notifications {
    listeners: Mutex<HashMap<ContainerEventType, Vec<Listener>>>,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    /// 订阅事件
    pub fn subscribe<F>(&self, event_type: ContainerEventType, listener: F)
    where
        F: Fn(&ContainerEvent) + Send + Sync + 'static,
    {
        debug!("订阅容器事件: {}", event_type);
        self.listeners
            .lock()
            .entry(event_type)
            .or_default()
            .push(Arc::new(listener));
    }

    /// 发布事件，返回收到事件的监听函数数量
    pub fn publish(&self, event: &ContainerEvent) -> usize {
        // 监听函数可能再次订阅，执行前释放锁
        let listeners = self
            .listeners
            .lock()
            .get(&event.event_type)
            .cloned()
            .unwrap_or_default();

        for listener in &listeners {
            listener(event);
        }
        listeners.len()
    }

    /// 某类事件的监听函数数量
    pub fn listener_count(&self, event_type: &ContainerEventType) -> usize {
        self.listeners
            .lock()
            .get(event_type)
            .map_or(0, Vec::len)
    }
}

impl fmt::Debug for Notifications {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<String, usize> = self
            .listeners
            .lock()
            .iter()
            .map(|(event_type, listeners)| (event_type.to_string(), listeners.len()))
            .collect();
        f.debug_struct("Notifications").field("listeners", &counts).finish()
    }
}

/// 通知扩展
#[derive(Debug, Default)]
pub struct NotificationsExtension {
    bus: Arc<Notifications>,
}

impl NotificationsExtension {
    pub fn new() -> Self {
        Self::default()
    }

    /// 事件总线
    pub fn bus(&self) -> &Arc<Notifications> {
        &self.bus
    }
}

impl Extension for NotificationsExtension {
    fn name(&self) -> &str {
        "notifications"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn applied(&self, container: &mut Container) -> ContainerResult<()> {
        if container.contains(NOTIFICATIONS_KEY) {
            debug!("容器中已存在 notifications 组件，跳过注册");
            return Ok(());
        }
        let bus: Arc<Notifications> = Arc::clone(&self.bus);
        container.register(NOTIFICATIONS_KEY, instance(bus))
    }

    fn after_register(&self, _container: &Container, key: &str) {
        self.bus
            .publish(&ContainerEvent::new(ContainerEventType::Registered, key));
    }

    fn after_resolve(&self, _container: &Container, key: &str) {
        self.bus
            .publish(&ContainerEvent::new(ContainerEventType::Resolved, key));
    }

    fn before_boot(&self, _container: &Container, unit: &str) {
        self.bus
            .publish(&ContainerEvent::new(ContainerEventType::BootStarted, unit));
    }

    fn after_boot(&self, _container: &Container, unit: &str) {
        self.bus
            .publish(&ContainerEvent::new(ContainerEventType::BootCompleted, unit));
    }

    fn after_finalize(&self, container: &Container) {
        let event = ContainerEvent::new(ContainerEventType::Finalized, "container")
            .with_metadata("components", container.keys().len().to_string());
        self.bus.publish(&event);
    }
}
