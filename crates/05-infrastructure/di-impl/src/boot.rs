//! 启动引擎
//!
//! 启动单元位于 `<root>/<core_dir>/boot/<name>.<ext>`，每个单元的状态按
//! `Unbooted -> Loaded -> Finalized` 推进。单元自身注册的终结器在其
//! 函数体执行完后立即运行，而不是推迟到整体启动结束。

use crate::container::Container;
use di_abstractions::SourceFile;
use infrastructure_common::{ContainerError, ContainerResult, Identifier, BOOT_DIR};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info};

/// 终结器类型
///
/// 终结器成功之前一直保留，失败后再次启动单元会重新运行它
pub type Finalizer = Arc<dyn Fn(&mut Container) -> ContainerResult<()> + Send + Sync>;

/// 启动单元状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BootState {
    /// 尚未启动
    Unbooted,
    /// 函数体已执行，终结器尚未完成
    Loaded,
    /// 已完成启动
    Finalized,
}

impl fmt::Display for BootState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootState::Unbooted => write!(f, "unbooted"),
            BootState::Loaded => write!(f, "loaded"),
            BootState::Finalized => write!(f, "finalized"),
        }
    }
}

impl Container {
    /// 为启动单元注册终结器，同名重复注册时后者生效
    pub fn finalize<F>(&mut self, name: &str, finalizer: F) -> ContainerResult<()>
    where
        F: Fn(&mut Container) -> ContainerResult<()> + Send + Sync + 'static,
    {
        self.ensure_mutable("finalize")?;
        debug!("注册启动单元终结器: {}", name);
        self.finalizers.insert(name.to_string(), Arc::new(finalizer));
        Ok(())
    }

    /// 校验并启动单元
    ///
    /// 名称必须是单段标识符且对应的启动文件存在，否则返回
    /// [`ContainerError::InvalidBootIdentifier`]。已启动的单元直接返回。
    pub fn boot(&mut self, name: &str) -> ContainerResult<()> {
        self.ensure_mutable("boot")?;
        self.check_boot_name(name)?;

        if self.boot_state(name) == BootState::Finalized {
            debug!("启动单元已启动，跳过: {}", name);
            return Ok(());
        }

        self.boot_now(name)
    }

    /// 加载启动单元并立即运行其终结器
    ///
    /// 处于 `Loaded` 的单元不会重新加载，只重新运行尚未成功的终结器
    pub fn boot_now(&mut self, name: &str) -> ContainerResult<()> {
        self.ensure_mutable("boot")?;
        info!("启动单元开始: {}", name);
        self.notify(|extension, container| extension.before_boot(container, name));

        let file = SourceFile::new(
            self.settings.boot_file(name),
            format!("{}/{}", BOOT_DIR, name),
        );
        if let Err(e) = self.load_source(file) {
            error!("启动单元加载失败: {}, 错误: {}", name, e);
            self.finalizers.remove(name);
            return Err(e);
        }
        self.booted.insert(name.to_string(), BootState::Loaded);

        if let Some(finalizer) = self.finalizers.get(name).cloned() {
            debug!("运行启动单元终结器: {}", name);
            finalizer(self).map_err(|e| {
                error!("启动单元终结器失败: {}, 错误: {}", name, e);
                e
            })?;
            self.finalizers.remove(name);
        }

        self.booted.insert(name.to_string(), BootState::Finalized);
        self.notify(|extension, container| extension.after_boot(container, name));
        info!("启动单元完成: {}", name);
        Ok(())
    }

    /// 启动单元是否已完成启动
    pub fn is_booted(&self, name: &str) -> bool {
        self.boot_state(name) == BootState::Finalized
    }

    /// 启动单元当前状态
    pub fn boot_state(&self, name: &str) -> BootState {
        self.booted
            .get(name)
            .copied()
            .unwrap_or(BootState::Unbooted)
    }

    /// 按字典序启动全部单元，自动注册配置的目录，然后冻结容器
    pub fn finalize_all(&mut self) -> ContainerResult<()> {
        self.finalize_with(|_| Ok(()))
    }

    /// 先执行回调，再完成 [`Container::finalize_all`] 的全部步骤
    pub fn finalize_with<F>(&mut self, f: F) -> ContainerResult<()>
    where
        F: FnOnce(&mut Container) -> ContainerResult<()>,
    {
        self.ensure_mutable("finalize")?;
        f(self)?;

        let units = self.boot_units()?;
        info!("发现 {} 个启动单元: {:?}", units.len(), units);
        for name in &units {
            self.boot(name)?;
        }

        let dirs = self.settings.auto_register.clone();
        for dir in &dirs {
            self.auto_register(dir)?;
        }

        self.frozen = true;
        self.notify(|extension, container| extension.after_finalize(container));
        info!("容器已冻结，共 {} 个组件", self.registry.len());
        Ok(())
    }

    /// 启动目录顶层的单元名称，按路径字典序排列
    pub fn boot_units(&self) -> ContainerResult<Vec<String>> {
        let pattern = format!(
            "{}/*.{}",
            self.settings.boot_dir().display(),
            self.settings.source_extension
        );
        let paths = self.filesystem.glob(&pattern)?;

        Ok(paths
            .iter()
            .filter_map(|path| path.file_stem())
            .map(|stem| stem.to_string_lossy().into_owned())
            .collect())
    }

    fn check_boot_name(&self, name: &str) -> ContainerResult<()> {
        let invalid = || ContainerError::InvalidBootIdentifier {
            name: name.to_string(),
        };

        let id = Identifier::parse(name).map_err(|_| invalid())?;
        if id.segments().len() != 1 {
            return Err(invalid());
        }

        if !self.filesystem.exists(&self.settings.boot_file(name)) {
            return Err(invalid());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::StaticSourceLoader;
    use parking_lot::Mutex;
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn recording_unit(
        log: &Arc<Mutex<Vec<String>>>,
        name: &'static str,
    ) -> impl Fn(&mut Container) -> ContainerResult<()> + Send + Sync + 'static {
        let log = Arc::clone(log);
        move |container: &mut Container| {
            log.lock().push(name.to_string());
            let log = Arc::clone(&log);
            container.finalize(name, move |_| {
                log.lock().push(format!("{}-finalizer", name));
                Ok(())
            })
        }
    }

    #[test]
    fn test_boot_runs_finalizer_immediately() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "core/boot/db.rs");

        let log = Arc::new(Mutex::new(Vec::new()));
        let loader = StaticSourceLoader::new().source("boot/db", recording_unit(&log, "db"));
        let mut container = Container::builder()
            .with_root(dir.path())
            .with_loader(loader)
            .build();
        container.configure(|_| {}).unwrap();

        assert_eq!(container.boot_state("db"), BootState::Unbooted);
        container.boot("db").unwrap();
        container.boot("db").unwrap();

        assert_eq!(*log.lock(), vec!["db", "db-finalizer"]);
        assert!(container.is_booted("db"));
    }

    #[test]
    fn test_invalid_boot_identifier() {
        let dir = TempDir::new().unwrap();
        let mut container = Container::builder().with_root(dir.path()).build();
        container.configure(|_| {}).unwrap();

        for name in ["missing", "Bad-Name", "nested.unit"] {
            let err = container.boot(name).unwrap_err();
            assert!(matches!(err, ContainerError::InvalidBootIdentifier { .. }));
        }
    }

    #[test]
    fn test_failing_finalizer_leaves_unit_loaded() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "core/boot/cache.rs");

        let loader = StaticSourceLoader::new().source("boot/cache", |container| {
            container.finalize("cache", |_| {
                Err(ContainerError::hook_failed("cache", "连接失败"))
            })
        });
        let mut container = Container::builder()
            .with_root(dir.path())
            .with_loader(loader)
            .build();
        container.configure(|_| {}).unwrap();

        assert!(container.boot("cache").is_err());
        assert_eq!(container.boot_state("cache"), BootState::Loaded);
        assert!(!container.is_booted("cache"));
    }

    #[test]
    fn test_failed_finalizer_runs_again_on_retry() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "core/boot/cache.rs");

        let runs = Arc::new(Mutex::new(0_usize));
        let counter = Arc::clone(&runs);
        let loads = Arc::new(Mutex::new(0_usize));
        let load_counter = Arc::clone(&loads);
        let loader = StaticSourceLoader::new().source("boot/cache", move |container| {
            *load_counter.lock() += 1;
            let counter = Arc::clone(&counter);
            container.finalize("cache", move |_| {
                let mut runs = counter.lock();
                *runs += 1;
                if *runs == 1 {
                    Err(ContainerError::hook_failed("cache", "连接失败"))
                } else {
                    Ok(())
                }
            })
        });
        let mut container = Container::builder()
            .with_root(dir.path())
            .with_loader(loader)
            .build();
        container.configure(|_| {}).unwrap();

        assert!(container.boot("cache").is_err());
        container.boot("cache").unwrap();

        assert_eq!(*runs.lock(), 2);
        assert_eq!(*loads.lock(), 1);
        assert!(container.is_booted("cache"));
    }

    #[test]
    fn test_finalize_all_does_not_skip_failing_finalizer() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "core/boot/cache.rs");

        let runs = Arc::new(Mutex::new(0_usize));
        let counter = Arc::clone(&runs);
        let loader = StaticSourceLoader::new().source("boot/cache", move |container| {
            let counter = Arc::clone(&counter);
            container.finalize("cache", move |_| {
                *counter.lock() += 1;
                Err(ContainerError::hook_failed("cache", "连接失败"))
            })
        });
        let mut container = Container::builder()
            .with_root(dir.path())
            .with_loader(loader)
            .build();
        container.configure(|_| {}).unwrap();

        assert!(container.boot("cache").is_err());
        assert!(container.finalize_all().is_err());

        assert_eq!(*runs.lock(), 2);
        assert_eq!(container.boot_state("cache"), BootState::Loaded);
        assert!(!container.is_frozen());
    }

    #[test]
    fn test_boot_units_are_sorted_and_top_level() {
        let dir = TempDir::new().unwrap();
        for file in ["core/boot/c.rs", "core/boot/a.rs", "core/boot/b.rs", "core/boot/nested/d.rs"] {
            touch(dir.path(), file);
        }

        let mut container = Container::builder().with_root(dir.path()).build();
        container.configure(|_| {}).unwrap();

        assert_eq!(container.boot_units().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_finalize_freezes_container() {
        let dir = TempDir::new().unwrap();
        let mut container = Container::builder().with_root(dir.path()).build();
        container.configure(|_| {}).unwrap();

        container.finalize_all().unwrap();

        assert!(container.is_frozen());
        assert!(container.finalize_all().unwrap_err().is_frozen());
        assert!(container.boot("db").unwrap_err().is_frozen());
    }
}
