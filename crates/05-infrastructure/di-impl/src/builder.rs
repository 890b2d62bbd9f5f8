//! 容器构建器

use crate::container::{Container, RegistryFactory, SourceTable};
use crate::filesystem::OsFileSystem;
use crate::loader::StaticSourceLoader;
use crate::plugins::PluginRegistry;
use crate::registry::MemoryRegistry;
use config_abstractions::{ConfigLoader, NullConfigLoader};
use di_abstractions::{BackingRegistry, FileSystem, SourceLoader};
use infrastructure_common::{ContainerSettings, ConventionalNaming, NamingStrategy};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// 容器构建器
///
/// 未指定的协作者使用默认实现：内存注册表、约定命名、本地文件系统、
/// 空的静态加载器、空配置加载器以及全局插件注册表。
pub struct ContainerBuilder {
    settings: ContainerSettings,
    registry_factory: RegistryFactory,
    naming: Arc<dyn NamingStrategy>,
    filesystem: Arc<dyn FileSystem>,
    loader: Arc<dyn SourceLoader<Container>>,
    config_loader: Arc<dyn ConfigLoader>,
    plugins: Arc<PluginRegistry>,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self {
            settings: ContainerSettings::default(),
            registry_factory: Arc::new(|| Box::new(MemoryRegistry::new()) as Box<dyn BackingRegistry>),
            naming: Arc::new(ConventionalNaming::new()),
            filesystem: Arc::new(OsFileSystem::new()),
            loader: Arc::new(StaticSourceLoader::new()),
            config_loader: Arc::new(NullConfigLoader),
            plugins: PluginRegistry::global(),
        }
    }

    /// 设置应用根目录
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.settings.root = root.into();
        self
    }

    /// 设置初始配置
    pub fn with_settings(mut self, settings: ContainerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// 设置后备注册表工厂，派生容器也使用它创建注册表
    pub fn with_registry<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn BackingRegistry> + Send + Sync + 'static,
    {
        self.registry_factory = Arc::new(factory);
        self
    }

    pub fn with_naming<N: NamingStrategy + 'static>(mut self, naming: N) -> Self {
        self.naming = Arc::new(naming);
        self
    }

    pub fn with_filesystem<F: FileSystem + 'static>(mut self, filesystem: F) -> Self {
        self.filesystem = Arc::new(filesystem);
        self
    }

    /// 使用已共享的文件系统
    pub fn with_shared_filesystem(mut self, filesystem: Arc<dyn FileSystem>) -> Self {
        self.filesystem = filesystem;
        self
    }

    pub fn with_loader<L: SourceLoader<Container> + 'static>(mut self, loader: L) -> Self {
        self.loader = Arc::new(loader);
        self
    }

    pub fn with_config_loader<C: ConfigLoader + 'static>(mut self, config_loader: C) -> Self {
        self.config_loader = Arc::new(config_loader);
        self
    }

    /// 使用已共享的配置加载器
    pub fn with_shared_config_loader(mut self, config_loader: Arc<dyn ConfigLoader>) -> Self {
        self.config_loader = config_loader;
        self
    }

    /// 使用指定插件注册表代替全局注册表
    pub fn with_plugin_registry(mut self, plugins: Arc<PluginRegistry>) -> Self {
        self.plugins = plugins;
        self
    }

    /// 构建容器
    pub fn build(self) -> Container {
        debug!(
            "构建容器: root={}, loader={}, config_loader={}",
            self.settings.root.display(),
            self.loader.name(),
            self.config_loader.name()
        );

        Container {
            settings: self.settings,
            configured: false,
            frozen: false,
            registry: (self.registry_factory)(),
            registry_factory: self.registry_factory,
            naming: self.naming,
            filesystem: self.filesystem,
            loader: self.loader,
            config_loader: self.config_loader,
            plugins: self.plugins,
            load_paths: Vec::new(),
            sources: Arc::new(Mutex::new(SourceTable::default())),
            booted: HashMap::new(),
            finalizers: HashMap::new(),
            enabled_plugins: Vec::new(),
            applied_plugins: Vec::new(),
            extensions: Vec::new(),
        }
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
