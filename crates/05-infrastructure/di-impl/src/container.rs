//! 组件容器
//!
//! 负责容器配置、组件解析、自动注册、延迟导入与容器派生

use crate::boot::{BootState, Finalizer};
use crate::builder::ContainerBuilder;
use crate::import::PendingImport;
use crate::plugins::{AppliedPlugin, Extension, PluginRegistry};
use config_abstractions::ConfigLoader;
use di_abstractions::{BackingRegistry, Entry, FileSystem, SourceFile, SourceLoader, TypeDef};
use infrastructure_common::{
    ComponentDescriptor, ContainerError, ContainerResult, ContainerSettings, Identifier, Instance,
    LoadError, NamingStrategy, RegistryResult,
};
use parking_lot::Mutex;
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 后备注册表工厂类型
pub type RegistryFactory = Arc<dyn Fn() -> Box<dyn BackingRegistry> + Send + Sync>;

/// 自动注册时的自定义构造函数类型
type ConstructFn<'a> = &'a dyn Fn(&TypeDef) -> ContainerResult<Instance>;

/// 已加载源文件表
///
/// 记录已加载的源文件和它们提供的类型定义，在派生容器之间共享
#[derive(Debug, Default)]
pub(crate) struct SourceTable {
    /// 已成功加载的源文件
    pub(crate) loaded: HashSet<PathBuf>,
    /// 类型名称到类型定义
    pub(crate) definitions: HashMap<String, TypeDef>,
}

/// 组件容器
///
/// 按标识符延迟加载并注册组件，管理启动单元与插件。
/// 调用 [`Container::finalize_all`] 后容器冻结，任何修改操作都会返回
/// [`ContainerError::Frozen`]。
pub struct Container {
    pub(crate) settings: ContainerSettings,
    pub(crate) configured: bool,
    pub(crate) frozen: bool,
    pub(crate) registry: Box<dyn BackingRegistry>,
    pub(crate) registry_factory: RegistryFactory,
    pub(crate) naming: Arc<dyn NamingStrategy>,
    pub(crate) filesystem: Arc<dyn FileSystem>,
    pub(crate) loader: Arc<dyn SourceLoader<Container>>,
    pub(crate) config_loader: Arc<dyn ConfigLoader>,
    pub(crate) plugins: Arc<PluginRegistry>,
    pub(crate) load_paths: Vec<PathBuf>,
    pub(crate) sources: Arc<Mutex<SourceTable>>,
    pub(crate) booted: HashMap<String, BootState>,
    pub(crate) finalizers: HashMap<String, Finalizer>,
    pub(crate) enabled_plugins: Vec<String>,
    pub(crate) applied_plugins: Vec<AppliedPlugin>,
    pub(crate) extensions: Vec<Arc<dyn Extension>>,
}

impl Container {
    /// 创建容器构建器
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    /// 配置容器
    ///
    /// 只生效一次，重复调用直接返回。配置完成后核心目录加入加载路径，
    /// 配置加载器返回的应用配置挂到 `settings.app`。
    pub fn configure<F>(&mut self, f: F) -> ContainerResult<()>
    where
        F: FnOnce(&mut ContainerSettings),
    {
        self.ensure_mutable("configure")?;

        if self.configured {
            debug!("容器已配置，忽略重复的 configure 调用");
            return Ok(());
        }

        let mut settings = self.settings.clone();
        f(&mut settings);

        if let Some(app) = self
            .config_loader
            .load(&settings.root, settings.env.as_deref())?
        {
            debug!("载入应用配置 (加载器: {})", self.config_loader.name());
            settings.app = Some(app);
        }

        let core_dir = settings.core_dir.clone();
        self.settings = settings;
        self.push_load_path(&core_dir);
        self.configured = true;

        info!(
            "容器配置完成: root={}, env={:?}, core_dir={}",
            self.settings.root.display(),
            self.settings.env,
            self.settings.core_dir
        );
        Ok(())
    }

    /// 是否已配置
    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// 是否已冻结
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// 获取容器配置
    pub fn settings(&self) -> &ContainerSettings {
        &self.settings
    }

    pub(crate) fn settings_mut(&mut self) -> &mut ContainerSettings {
        &mut self.settings
    }

    /// 应用根目录
    pub fn root(&self) -> &Path {
        &self.settings.root
    }

    /// 命名策略
    pub fn naming(&self) -> &dyn NamingStrategy {
        self.naming.as_ref()
    }

    /// 插件注册表句柄
    pub fn plugin_registry(&self) -> &Arc<PluginRegistry> {
        &self.plugins
    }

    /// 后备注册表
    pub fn registry(&self) -> &dyn BackingRegistry {
        self.registry.as_ref()
    }

    /// 追加加载路径（相对根目录）
    pub fn add_load_paths(&mut self, dirs: &[&str]) -> ContainerResult<()> {
        self.ensure_mutable("add_load_paths")?;
        for dir in dirs {
            self.push_load_path(dir);
        }
        Ok(())
    }

    /// 按搜索顺序返回加载路径
    pub fn load_paths(&self) -> &[PathBuf] {
        &self.load_paths
    }

    fn push_load_path(&mut self, dir: &str) {
        let path = self.settings.root.join(dir);
        if !self.load_paths.contains(&path) {
            debug!("添加加载路径: {}", path.display());
            self.load_paths.push(path);
        }
    }

    /// 直接注册已构造的值
    pub fn register(&mut self, key: &str, value: Instance) -> ContainerResult<()> {
        self.ensure_mutable("register")?;
        let id = Identifier::parse(key)?;
        self.insert_entry(&id, Entry::value(value))
    }

    /// 直接注册工厂，首次解析时构造
    pub fn register_factory<F>(&mut self, key: &str, factory: F) -> ContainerResult<()>
    where
        F: Fn() -> RegistryResult<Instance> + Send + Sync + 'static,
    {
        self.ensure_mutable("register_factory")?;
        let id = Identifier::parse(key)?;
        self.insert_entry(&id, Entry::factory(factory))
    }

    /// 检查标识符是否已注册
    pub fn contains(&self, key: &str) -> bool {
        Identifier::parse(key).is_ok_and(|id| self.registry.contains(&id.key()))
    }

    /// 按注册顺序返回所有键
    pub fn keys(&self) -> Vec<String> {
        self.registry.keys()
    }

    fn insert_entry(&mut self, id: &Identifier, entry: Entry) -> ContainerResult<()> {
        let key = id.key();
        self.registry.register(&key, entry)?;
        debug!("组件已注册: {}", key);
        self.notify(|extension, container| extension.after_register(container, &key));
        Ok(())
    }

    pub(crate) fn notify<F>(&self, f: F)
    where
        F: Fn(&dyn Extension, &Self),
    {
        for extension in &self.extensions {
            f(extension.as_ref(), self);
        }
    }

    /// 推导组件描述符
    pub fn descriptor(&self, id: &Identifier) -> ComponentDescriptor {
        ComponentDescriptor::new(id.clone(), self.naming.as_ref(), &self.settings.source_extension)
    }

    /// 加载并注册组件
    ///
    /// 已注册时直接返回；否则在加载路径中查找源文件，加载后注册一个
    /// 以无参构造创建实例的工厂。找不到源文件时不产生任何注册。
    pub fn register_component(&mut self, identifier: &str) -> ContainerResult<()> {
        self.ensure_mutable("register_component")?;
        let id = Identifier::parse(identifier)?;

        if self.registry.contains(&id.key()) {
            debug!("组件已注册，跳过加载: {}", id);
            return Ok(());
        }

        let type_def = self.require_component(&id)?;
        self.insert_entry(&id, Entry::factory(move || Ok(type_def.construct())))?;

        info!("组件已加载并注册: {}", id);
        Ok(())
    }

    /// 在加载路径中定位并加载组件源文件，返回其类型定义
    fn require_component(&mut self, id: &Identifier) -> ContainerResult<TypeDef> {
        let descriptor = self.descriptor(id);

        let base = self
            .load_paths
            .iter()
            .find(|path| self.filesystem.exists(&path.join(&descriptor.file)))
            .cloned()
            .ok_or_else(|| {
                warn!("在加载路径中找不到组件源文件: {}", descriptor.file);
                ContainerError::resolution_failed(
                    id.key(),
                    format!("在加载路径中找不到源文件 {}", descriptor.file),
                )
            })?;

        self.load_source(SourceFile::new(
            base.join(&descriptor.file),
            descriptor.path.clone(),
        ))?;
        self.definition(&descriptor)
    }

    fn definition(&self, descriptor: &ComponentDescriptor) -> ContainerResult<TypeDef> {
        self.sources
            .lock()
            .definitions
            .get(&descriptor.type_name)
            .cloned()
            .ok_or_else(|| {
                ContainerError::resolution_failed(
                    descriptor.key(),
                    format!("源文件 {} 未定义类型 {}", descriptor.file, descriptor.type_name),
                )
            })
    }

    /// 提供类型定义，由加载中的源文件调用
    pub fn define(&mut self, type_def: TypeDef) {
        debug!("定义类型: {}", type_def.name());
        self.sources
            .lock()
            .definitions
            .insert(type_def.name().to_string(), type_def);
    }

    /// 按类型名称查找类型定义
    pub fn type_def(&self, type_name: &str) -> Option<TypeDef> {
        self.sources.lock().definitions.get(type_name).cloned()
    }

    /// 源文件是否已加载
    pub fn is_loaded(&self, path: &Path) -> bool {
        self.sources.lock().loaded.contains(path)
    }

    /// 加载源文件，已加载过的路径直接跳过
    ///
    /// 返回本次是否真正执行了加载
    pub(crate) fn load_source(&mut self, file: SourceFile) -> ContainerResult<bool> {
        if self.sources.lock().loaded.contains(&file.path) {
            debug!("源文件已加载，跳过: {}", file.path.display());
            return Ok(false);
        }

        let loader = Arc::clone(&self.loader);
        debug!(
            "加载源文件: {} (加载器: {})",
            file.path.display(),
            loader.name()
        );
        loader.load(&file, self).map_err(ContainerError::from_load)?;

        self.sources.lock().loaded.insert(file.path);
        Ok(true)
    }

    /// 解析组件实例
    ///
    /// 只返回已注册的组件，工厂在首次解析时构造，之后复用同一实例
    pub fn resolve(&self, key: &str) -> ContainerResult<Instance> {
        let id = Identifier::parse(key)?;
        let key = id.key();

        if !self.registry.contains(&key) {
            return Err(ContainerError::resolution_failed(key, "组件未注册"));
        }

        let instance = self.registry.resolve(&key)?;
        self.notify(|extension, container| extension.after_resolve(container, &key));
        Ok(instance)
    }

    /// 解析组件并转换为具体类型
    pub fn resolve_as<T>(&self, key: &str) -> ContainerResult<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        self.resolve(key)?
            .downcast::<T>()
            .map_err(|_| ContainerError::TypeMismatch {
                identifier: key.to_string(),
                expected: std::any::type_name::<T>().to_string(),
            })
    }

    /// 确保组件已加载后解析
    pub fn load_and_resolve(&mut self, key: &str) -> ContainerResult<Instance> {
        if !self.contains(key) {
            self.register_component(key)?;
        }
        self.resolve(key)
    }

    /// 扫描目录并自动注册其中的组件
    ///
    /// 标识符由文件相对于目录第一段的路径推导，已注册的标识符总是跳过。
    /// 返回本次新注册的组件数量。
    pub fn auto_register(&mut self, dir: &str) -> ContainerResult<usize> {
        self.auto_register_inner(dir, None)
    }

    /// 扫描目录并使用自定义构造函数注册组件
    pub fn auto_register_with<F>(&mut self, dir: &str, construct: F) -> ContainerResult<usize>
    where
        F: Fn(&TypeDef) -> ContainerResult<Instance>,
    {
        self.auto_register_inner(dir, Some(&construct))
    }

    fn auto_register_inner(
        &mut self,
        dir: &str,
        construct: Option<ConstructFn<'_>>,
    ) -> ContainerResult<usize> {
        self.ensure_mutable("auto_register")?;

        let dir = dir.trim_matches('/');
        let first = dir.split('/').next().unwrap_or(dir);
        let dir_root = self.settings.root.join(first);
        let pattern = format!(
            "{}/**/*.{}",
            self.settings.root.join(dir).display(),
            self.settings.source_extension
        );

        debug!("自动注册扫描: {}", pattern);
        let paths = self.filesystem.glob(&pattern)?;
        let mut registered = 0;

        for path in paths {
            let logical = logical_name(&path, &dir_root).ok_or_else(|| {
                ContainerError::resolution_failed(path.display().to_string(), "文件不在自动注册目录内")
            })?;
            let id = self.naming.from_path(&logical)?;

            if self.registry.contains(&id.key()) {
                debug!("组件已注册，跳过: {}", id);
                continue;
            }

            self.load_source(SourceFile::new(path, logical))?;
            let type_def = self.definition(&self.descriptor(&id))?;

            let entry = match construct {
                Some(construct) => Entry::value(construct(&type_def)?),
                None => Entry::factory(move || Ok(type_def.construct())),
            };
            self.insert_entry(&id, entry)?;
            registered += 1;
        }

        info!("自动注册目录 {} 完成，新注册 {} 个组件", dir, registered);
        Ok(registered)
    }

    /// 加载根目录下的源文件，支持 `*` 通配
    ///
    /// 返回本次真正加载的文件数量
    pub fn require(&mut self, paths: &[&str]) -> ContainerResult<usize> {
        self.ensure_mutable("require")?;

        let root = self.settings.root.clone();
        let mut files = Vec::new();

        for pattern in paths {
            if pattern.contains('*') {
                files.extend(self.filesystem.glob(&root.join(pattern).display().to_string())?);
                continue;
            }

            let exact = root.join(pattern);
            let file = if self.filesystem.exists(&exact) {
                exact
            } else {
                root.join(format!("{}.{}", pattern, self.settings.source_extension))
            };

            if !self.filesystem.exists(&file) {
                return Err(LoadError::NotFound {
                    path: file.display().to_string(),
                }
                .into());
            }
            files.push(file);
        }

        let mut loaded = 0;
        for file in files {
            let logical = logical_name(&file, &root).unwrap_or_else(|| file.display().to_string());
            if self.load_source(SourceFile::new(file, logical))? {
                loaded += 1;
            }
        }
        Ok(loaded)
    }

    /// 创建延迟导入
    ///
    /// 标识符立即校验，加载与解析推迟到 [`PendingImport::resolve_now`]
    pub fn import(&self, identifiers: &[&str]) -> ContainerResult<PendingImport> {
        let ids = identifiers
            .iter()
            .map(|raw| Identifier::parse(raw))
            .collect::<ContainerResult<Vec<_>>>()?;
        Ok(PendingImport::new(ids))
    }

    /// 派生新容器
    ///
    /// 复制配置与已启用插件集合。有状态插件按启用时的选项重新构造扩展，
    /// 派生容器与父容器的扩展状态互不影响；无状态插件与直接添加的扩展共享。
    /// 注册表、加载路径、启动状态以及已配置/冻结标记全部重新开始。
    /// 源文件加载记录与类型定义在派生容器之间共享。
    pub fn derive(&self) -> ContainerResult<Self> {
        debug!(
            "派生容器，继承插件: {:?}",
            self.enabled_plugins
        );

        let mut child = Self {
            settings: self.settings.clone(),
            configured: false,
            frozen: false,
            registry: (self.registry_factory)(),
            registry_factory: Arc::clone(&self.registry_factory),
            naming: Arc::clone(&self.naming),
            filesystem: Arc::clone(&self.filesystem),
            loader: Arc::clone(&self.loader),
            config_loader: Arc::clone(&self.config_loader),
            plugins: Arc::clone(&self.plugins),
            load_paths: Vec::new(),
            sources: Arc::clone(&self.sources),
            booted: HashMap::new(),
            finalizers: HashMap::new(),
            enabled_plugins: self.enabled_plugins.clone(),
            applied_plugins: Vec::with_capacity(self.applied_plugins.len()),
            extensions: Vec::with_capacity(self.extensions.len()),
        };

        for extension in &self.extensions {
            let applied = self
                .applied_plugins
                .iter()
                .find(|applied| Arc::ptr_eq(&applied.extension, extension));

            match applied {
                Some(applied) if applied.behavior.is_stateful() => {
                    let forked = applied.fork()?;
                    child.extend(Arc::clone(&forked.extension))?;
                    child.applied_plugins.push(forked);
                }
                Some(applied) => {
                    child.extensions.push(Arc::clone(extension));
                    child.applied_plugins.push(applied.clone());
                }
                None => child.extensions.push(Arc::clone(extension)),
            }
        }
        Ok(child)
    }

    pub(crate) fn ensure_mutable(&self, operation: &str) -> ContainerResult<()> {
        if self.frozen {
            warn!("容器已冻结，拒绝操作: {}", operation);
            return Err(ContainerError::frozen(operation));
        }
        Ok(())
    }
}

/// 文件相对基准目录的逻辑名称：`/` 分隔，不含扩展名
fn logical_name(path: &Path, base: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?.with_extension("");
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("settings", &self.settings)
            .field("configured", &self.configured)
            .field("frozen", &self.frozen)
            .field("registry", &self.registry)
            .field("load_paths", &self.load_paths)
            .field("booted", &self.booted)
            .field("finalizers", &self.finalizers.keys().collect::<Vec<_>>())
            .field("enabled_plugins", &self.enabled_plugins)
            .field("extensions", &self.extensions)
            .finish()
    }
}
