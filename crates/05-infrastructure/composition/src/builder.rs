//! 应用构建器

use crate::error::CompositionError;
use crate::logging::LoggingConfig;
use config_abstractions::ConfigLoader;
use config_impl::FileConfigLoader;
use di_abstractions::FileSystem;
use di_impl::{Container, OsFileSystem, PluginRegistry, StaticSourceLoader};
use infrastructure_common::{ContainerResult, ContainerSettings, PluginOptions};
use std::any::Any;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 应用构建器
///
/// 组合默认协作者：文件配置加载器、本地文件系统、全局插件注册表，
/// 按 插件 → 配置 → 加载路径 的顺序准备容器。
pub struct ApplicationBuilder {
    /// 初始容器配置
    settings: ContainerSettings,
    /// 源文件加载器
    loader: StaticSourceLoader,
    /// 应用配置加载器
    config_loader: Arc<dyn ConfigLoader>,
    /// 文件系统
    filesystem: Arc<dyn FileSystem>,
    /// 插件注册表，未设置时使用全局注册表
    plugin_registry: Option<Arc<PluginRegistry>>,
    /// 需要启用的插件
    plugins: Vec<(String, PluginOptions)>,
    /// 额外加载路径
    load_paths: Vec<String>,
    /// 是否初始化日志
    logging_enabled: bool,
    /// 日志配置
    logging_config: LoggingConfig,
}

impl ApplicationBuilder {
    /// 创建指定根目录的应用构建器
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            settings: ContainerSettings::with_root(root),
            loader: StaticSourceLoader::new(),
            config_loader: Arc::new(FileConfigLoader::new()),
            filesystem: Arc::new(OsFileSystem::new()),
            plugin_registry: None,
            plugins: Vec::new(),
            load_paths: Vec::new(),
            logging_enabled: false,
            logging_config: LoggingConfig::default(),
        }
    }

    /// 设置运行环境
    pub fn with_env(mut self, env: impl Into<String>) -> Self {
        self.settings.env = Some(env.into());
        self
    }

    /// 设置核心目录
    pub fn with_core_dir(mut self, core_dir: impl Into<String>) -> Self {
        self.settings.core_dir = core_dir.into();
        self
    }

    /// 启动时自动注册的目录
    pub fn auto_register(mut self, dir: impl Into<String>) -> Self {
        self.settings.auto_register.push(dir.into());
        self
    }

    /// 添加加载路径
    pub fn add_load_path(mut self, dir: impl Into<String>) -> Self {
        self.load_paths.push(dir.into());
        self
    }

    /// 添加源文件函数体
    pub fn with_source<F>(mut self, logical: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut Container) -> ContainerResult<()> + Send + Sync + 'static,
    {
        self.loader.insert(logical, body);
        self
    }

    /// 添加只定义单个类型的组件源文件
    pub fn with_component<T>(mut self, logical: impl Into<String>, type_name: impl Into<String>) -> Self
    where
        T: Default + Any + Send + Sync,
    {
        self.loader = self.loader.component::<T>(logical, type_name);
        self
    }

    /// 使用自定义配置加载器
    pub fn with_config_loader<C: ConfigLoader + 'static>(mut self, config_loader: C) -> Self {
        info!("使用配置加载器: {}", config_loader.name());
        self.config_loader = Arc::new(config_loader);
        self
    }

    /// 使用自定义文件系统
    pub fn with_filesystem<F: FileSystem + 'static>(mut self, filesystem: F) -> Self {
        self.filesystem = Arc::new(filesystem);
        self
    }

    /// 使用指定插件注册表
    pub fn with_plugin_registry(mut self, registry: Arc<PluginRegistry>) -> Self {
        self.plugin_registry = Some(registry);
        self
    }

    /// 启用插件
    pub fn use_plugin(mut self, name: impl Into<String>, options: PluginOptions) -> Self {
        self.plugins.push((name.into(), options));
        self
    }

    /// 配置日志
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging_config = config;
        self.logging_enabled = true;
        self
    }

    /// 构建已配置但尚未冻结的容器
    pub fn build(self) -> Result<Container, CompositionError> {
        // 只有在明确配置了日志时才初始化，避免测试中重复初始化
        if self.logging_enabled {
            if let Err(e) = self.logging_config.init() {
                warn!("跳过日志初始化: {}", e);
            }
        }

        info!("开始构建应用容器: {}", self.settings.root.display());

        let plugin_registry = self.plugin_registry.unwrap_or_else(PluginRegistry::global);
        let mut container = Container::builder()
            .with_settings(self.settings)
            .with_loader(self.loader)
            .with_plugin_registry(plugin_registry)
            .with_shared_config_loader(self.config_loader)
            .with_shared_filesystem(self.filesystem)
            .build();

        for (name, options) in self.plugins {
            container.use_plugin(&name, options)?;
        }

        container.configure(|_| {})?;

        let load_paths: Vec<&str> = self.load_paths.iter().map(String::as_str).collect();
        container.add_load_paths(&load_paths)?;
        debug!("加载路径: {:?}", container.load_paths());

        info!("应用容器构建完成");
        Ok(container)
    }

    /// 构建容器并完成启动，返回冻结的容器
    pub fn boot(self) -> Result<Container, CompositionError> {
        let mut container = self.build()?;
        container.finalize_all()?;
        Ok(container)
    }
}
