//! 插件引擎
//!
//! 插件在进程级的 [`PluginRegistry`] 中注册，在每个容器上单独启用。
//! 插件行为分为无状态与有状态两类，启用时通过模式匹配分派。

pub mod builtin;
pub mod monitoring;
pub mod notifications;

use crate::container::Container;
use dashmap::DashMap;
use infrastructure_common::{
    ContainerError, ContainerResult, ContainerSettings, LoadError, LoadResult, PluginOptions,
};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 容器扩展
///
/// 插件应用到容器后的能力集合，可以观察容器的生命周期事件
pub trait Extension: Any + Send + Sync + fmt::Debug {
    /// 扩展名称
    fn name(&self) -> &str;

    /// 用于按具体类型查询扩展
    fn as_any(&self) -> &dyn Any;

    /// 扩展被应用到容器时调用
    fn applied(&self, _container: &mut Container) -> ContainerResult<()> {
        Ok(())
    }

    /// 组件注册之后
    fn after_register(&self, _container: &Container, _key: &str) {}

    /// 组件解析成功之后
    fn after_resolve(&self, _container: &Container, _key: &str) {}

    /// 启动单元开始之前
    fn before_boot(&self, _container: &Container, _unit: &str) {}

    /// 启动单元完成之后
    fn after_boot(&self, _container: &Container, _unit: &str) {}

    /// 容器冻结之后
    fn after_finalize(&self, _container: &Container) {}
}

/// 有状态扩展的工厂
pub type ExtensionFactory =
    Arc<dyn Fn(&PluginOptions) -> ContainerResult<Arc<dyn Extension>> + Send + Sync>;

/// 插件配置块，在容器上下文中执行
pub type ConfigBlock = Arc<dyn Fn(&mut Container) -> ContainerResult<()> + Send + Sync>;

/// 插件行为
#[derive(Clone)]
pub enum Behavior {
    /// 无状态能力集合，启用选项被忽略
    Stateless(Arc<dyn Extension>),
    /// 根据启用选项构造新的能力集合
    Stateful(ExtensionFactory),
}

impl Behavior {
    pub fn stateless<E: Extension>(extension: E) -> Self {
        Self::Stateless(Arc::new(extension))
    }

    pub fn stateful<F>(factory: F) -> Self
    where
        F: Fn(&PluginOptions) -> ContainerResult<Arc<dyn Extension>> + Send + Sync + 'static,
    {
        Self::Stateful(Arc::new(factory))
    }

    pub fn is_stateful(&self) -> bool {
        matches!(self, Self::Stateful(_))
    }

    /// 得到要应用到容器的扩展实例
    pub fn instantiate(&self, options: &PluginOptions) -> ContainerResult<Arc<dyn Extension>> {
        match self {
            Self::Stateless(extension) => {
                if !options.is_empty() {
                    debug!("无状态插件忽略启用选项: {}", extension.name());
                }
                Ok(Arc::clone(extension))
            }
            Self::Stateful(factory) => factory(options),
        }
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stateless(extension) => f.debug_tuple("Stateless").field(extension).finish(),
            Self::Stateful(_) => f.debug_tuple("Stateful").field(&"<factory>").finish(),
        }
    }
}

/// 插件定义
#[derive(Clone)]
pub struct Plugin {
    name: String,
    behavior: Behavior,
    dependencies: Vec<String>,
    config_block: Option<ConfigBlock>,
}

impl Plugin {
    pub fn new(name: impl Into<String>, behavior: Behavior) -> Self {
        Self {
            name: name.into(),
            behavior,
            dependencies: Vec::new(),
            config_block: None,
        }
    }

    /// 声明外部依赖
    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    /// 设置配置块
    pub fn with_config_block<F>(mut self, block: F) -> Self
    where
        F: Fn(&mut Container) -> ContainerResult<()> + Send + Sync + 'static,
    {
        self.config_block = Some(Arc::new(block));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn behavior(&self) -> &Behavior {
        &self.behavior
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// 加载全部声明的依赖，已加载过的依赖不会重复加载
    pub fn load_dependencies(&self, registry: &PluginRegistry) -> ContainerResult<()> {
        for dependency in &self.dependencies {
            registry.load_dependency(&self.name, dependency)?;
        }
        Ok(())
    }

    /// 应用插件行为并执行配置块
    ///
    /// 任何一步失败时容器回到应用之前的状态：配置、加载路径、扩展以及
    /// 期间新注册的组件都会撤回。已加载的源文件属于进程级状态，不会撤回。
    pub fn apply_to(
        &self,
        container: &mut Container,
        options: &PluginOptions,
    ) -> ContainerResult<Arc<dyn Extension>> {
        let snapshot = ContainerSnapshot::take(container);

        let result = self.behavior.instantiate(options).and_then(|extension| {
            container.extend(Arc::clone(&extension))?;
            if let Some(block) = &self.config_block {
                block(container)?;
            }
            Ok(extension)
        });

        if let Err(e) = &result {
            error!("插件应用失败: {}, 错误: {}", self.name, e);
            snapshot.restore(container);
        }
        result
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("behavior", &self.behavior)
            .field("dependencies", &self.dependencies)
            .field("config_block", &self.config_block.is_some())
            .finish()
    }
}

/// 启用插件前的容器状态
struct ContainerSnapshot {
    settings: ContainerSettings,
    configured: bool,
    load_paths: Vec<PathBuf>,
    extensions: usize,
    enabled_plugins: usize,
    applied_plugins: usize,
    keys: HashSet<String>,
}

impl ContainerSnapshot {
    fn take(container: &Container) -> Self {
        Self {
            settings: container.settings.clone(),
            configured: container.configured,
            load_paths: container.load_paths.clone(),
            extensions: container.extensions.len(),
            enabled_plugins: container.enabled_plugins.len(),
            applied_plugins: container.applied_plugins.len(),
            keys: container.registry.keys().into_iter().collect(),
        }
    }

    fn restore(self, container: &mut Container) {
        container.settings = self.settings;
        container.configured = self.configured;
        container.load_paths = self.load_paths;
        container.extensions.truncate(self.extensions);
        container.enabled_plugins.truncate(self.enabled_plugins);
        container.applied_plugins.truncate(self.applied_plugins);

        for key in container.registry.keys() {
            if !self.keys.contains(&key) {
                debug!("撤回组件注册: {}", key);
                container.registry.remove(&key);
            }
        }
    }
}

/// 已在容器上启用的插件实例
#[derive(Clone)]
pub(crate) struct AppliedPlugin {
    pub(crate) behavior: Behavior,
    pub(crate) options: PluginOptions,
    pub(crate) extension: Arc<dyn Extension>,
}

impl AppliedPlugin {
    /// 为派生容器准备扩展：有状态插件按原选项重新构造，无状态插件共享
    pub(crate) fn fork(&self) -> ContainerResult<Self> {
        let extension = match &self.behavior {
            Behavior::Stateful(_) => self.behavior.instantiate(&self.options)?,
            Behavior::Stateless(_) => Arc::clone(&self.extension),
        };
        Ok(Self {
            extension,
            ..self.clone()
        })
    }
}

/// 插件依赖加载器
pub trait DependencyLoader: Send + Sync + fmt::Debug {
    /// 加载依赖，失败时返回原因
    fn load(&self, dependency: &str) -> LoadResult<()>;
}

type DependencyInit = Arc<dyn Fn() -> LoadResult<()> + Send + Sync>;

/// 依赖目录
///
/// 按名称登记依赖的初始化例程，未登记的依赖视为缺失
#[derive(Default)]
pub struct DependencyCatalog {
    entries: DashMap<String, DependencyInit>,
}

impl DependencyCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记依赖初始化例程
    pub fn provide<F>(&self, name: impl Into<String>, init: F)
    where
        F: Fn() -> LoadResult<()> + Send + Sync + 'static,
    {
        self.entries.insert(name.into(), Arc::new(init));
    }

    /// 登记无需初始化的依赖
    pub fn provide_available(&self, name: impl Into<String>) {
        self.provide(name, || Ok(()));
    }
}

impl DependencyLoader for DependencyCatalog {
    fn load(&self, dependency: &str) -> LoadResult<()> {
        let init = self
            .entries
            .get(dependency)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| LoadError::NotFound {
                path: dependency.to_string(),
            })?;
        init()
    }
}

impl fmt::Debug for DependencyCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        names.sort();
        f.debug_struct("DependencyCatalog").field("entries", &names).finish()
    }
}

static GLOBAL_REGISTRY: Lazy<Arc<PluginRegistry>> =
    Lazy::new(|| Arc::new(PluginRegistry::with_builtins()));

/// 插件注册表
///
/// 进程级共享，保存插件定义与已加载依赖集合
pub struct PluginRegistry {
    plugins: DashMap<String, Plugin>,
    loaded_dependencies: Mutex<Vec<String>>,
    dependency_loader: Arc<dyn DependencyLoader>,
}

impl PluginRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::with_dependency_loader(Arc::new(DependencyCatalog::new()))
    }

    /// 使用指定依赖加载器创建空注册表
    pub fn with_dependency_loader(loader: Arc<dyn DependencyLoader>) -> Self {
        Self {
            plugins: DashMap::new(),
            loaded_dependencies: Mutex::new(Vec::new()),
            dependency_loader: loader,
        }
    }

    /// 创建已注册内置插件的注册表
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        builtin::register_builtins(&registry);
        registry
    }

    /// 进程级全局注册表
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL_REGISTRY)
    }

    /// 注册插件，同名插件后注册者生效
    pub fn register(&self, plugin: Plugin) {
        if self.plugins.contains_key(plugin.name()) {
            warn!("覆盖已注册的插件: {}", plugin.name());
        } else {
            debug!("注册插件: {}", plugin.name());
        }
        self.plugins.insert(plugin.name().to_string(), plugin);
    }

    pub fn get(&self, name: &str) -> Option<Plugin> {
        self.plugins.get(name).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    /// 已注册插件名称（排序）
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.plugins.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn is_dependency_loaded(&self, dependency: &str) -> bool {
        self.loaded_dependencies.lock().iter().any(|d| d == dependency)
    }

    /// 已加载依赖，按加载顺序
    pub fn loaded_dependencies(&self) -> Vec<String> {
        self.loaded_dependencies.lock().clone()
    }

    /// 加载插件依赖，只有成功时才记入已加载集合
    pub fn load_dependency(&self, plugin: &str, dependency: &str) -> ContainerResult<()> {
        if self.is_dependency_loaded(dependency) {
            return Ok(());
        }

        debug!("加载插件依赖: {} -> {}", plugin, dependency);
        self.dependency_loader.load(dependency).map_err(|e| {
            error!("插件依赖加载失败: {} -> {}, 错误: {}", plugin, dependency, e);
            ContainerError::PluginDependencyMissing {
                plugin: plugin.to_string(),
                message: format!("{}: {}", dependency, e),
            }
        })?;

        let mut loaded = self.loaded_dependencies.lock();
        if !loaded.iter().any(|d| d == dependency) {
            loaded.push(dependency.to_string());
        }
        Ok(())
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.names())
            .field("loaded_dependencies", &self.loaded_dependencies())
            .field("dependency_loader", &self.dependency_loader)
            .finish()
    }
}

impl Container {
    /// 在容器上启用插件
    ///
    /// 已启用时直接返回。依赖加载失败或行为应用失败时，已启用集合保持不变。
    pub fn use_plugin(&mut self, name: &str, options: PluginOptions) -> ContainerResult<()> {
        self.ensure_mutable("use_plugin")?;

        if self.is_plugin_enabled(name) {
            debug!("插件已启用，跳过: {}", name);
            return Ok(());
        }

        let plugin = self
            .plugins
            .get(name)
            .ok_or_else(|| ContainerError::PluginNotRegistered {
                plugin: name.to_string(),
            })?;

        plugin.load_dependencies(&self.plugins)?;
        let extension = plugin.apply_to(self, &options)?;

        self.applied_plugins.push(AppliedPlugin {
            behavior: plugin.behavior().clone(),
            options,
            extension,
        });
        self.enabled_plugins.push(name.to_string());
        info!("插件已启用: {}", name);
        Ok(())
    }

    /// 已启用插件，按启用顺序
    pub fn enabled_plugins(&self) -> &[String] {
        &self.enabled_plugins
    }

    pub fn is_plugin_enabled(&self, name: &str) -> bool {
        self.enabled_plugins.iter().any(|p| p == name)
    }

    /// 添加扩展到容器
    pub fn extend(&mut self, extension: Arc<dyn Extension>) -> ContainerResult<()> {
        self.ensure_mutable("extend")?;
        self.extensions.push(Arc::clone(&extension));

        if let Err(e) = extension.applied(self) {
            error!("扩展应用失败: {}, 错误: {}", extension.name(), e);
            self.extensions
                .retain(|applied| !Arc::ptr_eq(applied, &extension));
            return Err(e);
        }
        debug!("扩展已应用: {}", extension.name());
        Ok(())
    }

    /// 已应用的扩展
    pub fn extensions(&self) -> &[Arc<dyn Extension>] {
        &self.extensions
    }

    /// 按具体类型查找扩展
    pub fn extension<E: Extension>(&self) -> Option<&E> {
        self.extensions
            .iter()
            .find_map(|extension| extension.as_any().downcast_ref::<E>())
    }
}
