//! 组件容器集中集成测试
//!
//! 每个测试在临时目录中搭建应用目录树，源文件内容由静态加载器提供

use di_abstractions::TypeDef;
use di_impl::{
    Behavior, BootState, Container, DependencyCatalog, Extension, Plugin, PluginRegistry,
    StaticSourceLoader,
};
use infrastructure_common::{instance, ContainerError, ContainerResult, PluginOptions};
use parking_lot::Mutex;
use std::any::Any;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use tempfile::TempDir;

static INIT_LOGGER: Once = Once::new();

/// 初始化测试日志系统（只初始化一次）
fn init_test_logger() {
    INIT_LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

fn touch(root: &Path, relative: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "").unwrap();
}

/// 记录加载次数的组件源文件
fn counted_component<T>(
    loader: &mut StaticSourceLoader,
    logical: &str,
    type_name: &'static str,
    loads: &Arc<AtomicUsize>,
) where
    T: Default + Any + Send + Sync,
{
    let loads = Arc::clone(loads);
    loader.insert(logical, move |container: &mut Container| {
        loads.fetch_add(1, Ordering::SeqCst);
        container.define(TypeDef::of::<T>(type_name));
        Ok(())
    });
}

fn container(root: &Path, loader: StaticSourceLoader, plugins: PluginRegistry) -> Container {
    init_test_logger();
    let mut container = Container::builder()
        .with_root(root)
        .with_loader(loader)
        .with_plugin_registry(Arc::new(plugins))
        .build();
    container.configure(|_| {}).unwrap();
    container
}

#[derive(Debug, Default)]
struct UserRepo;

#[derive(Debug, Default)]
struct Widget;

#[derive(Debug)]
struct Tag(&'static str);

impl Extension for Tag {
    fn name(&self) -> &str {
        self.0
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn tag_plugin(name: &'static str) -> Plugin {
    Plugin::new(name, Behavior::stateless(Tag(name)))
}

#[test]
fn test_resolve_unregistered_identifier_fails_without_entry() {
    let dir = TempDir::new().unwrap();
    let container = container(dir.path(), StaticSourceLoader::new(), PluginRegistry::new());

    for id in ["users.user_repo", "mailer", "a.b.c"] {
        let err = container.resolve(id).unwrap_err();
        assert!(matches!(err, ContainerError::ResolutionFailed { .. }));
        assert!(!container.contains(id));
    }
    assert!(container.keys().is_empty());
}

#[test]
fn test_invalid_identifier_is_reported_immediately() {
    let dir = TempDir::new().unwrap();
    let mut container = container(dir.path(), StaticSourceLoader::new(), PluginRegistry::new());

    let err = container.register_component("Users.Repo").unwrap_err();
    assert!(matches!(err, ContainerError::InvalidIdentifier { .. }));
    assert!(container.keys().is_empty());
}

#[test]
fn test_register_component_twice_loads_once() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    touch(dir.path(), "core/users/user_repo.rs");

    let loads = Arc::new(AtomicUsize::new(0));
    let mut loader = StaticSourceLoader::new();
    counted_component::<UserRepo>(&mut loader, "users/user_repo", "Users::UserRepo", &loads);

    let mut container = container(dir.path(), loader, PluginRegistry::new());
    container.register_component("users.user_repo")?;
    container.register_component("users.user_repo")?;

    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert_eq!(container.keys(), vec!["users.user_repo"]);

    let first = container.resolve("users.user_repo")?;
    let second = container.resolve("users.user_repo")?;
    assert!(Arc::ptr_eq(&first, &second));
    Ok(())
}

#[test]
fn test_first_matching_load_path_wins() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    touch(dir.path(), "lib/widget.rs");
    touch(dir.path(), "vendor/widget.rs");

    let loaded_from = Arc::new(Mutex::new(Vec::new()));
    let record = Arc::clone(&loaded_from);
    let loader = StaticSourceLoader::new().source("widget", move |container| {
        record.lock().push("widget".to_string());
        container.define(TypeDef::of::<Widget>("Widget"));
        Ok(())
    });

    let mut container = container(dir.path(), loader, PluginRegistry::new());
    container.add_load_paths(&["lib", "vendor"])?;
    container.register_component("widget")?;

    assert!(container.is_loaded(&dir.path().join("lib/widget.rs")));
    assert!(!container.is_loaded(&dir.path().join("vendor/widget.rs")));
    assert_eq!(loaded_from.lock().len(), 1);
    Ok(())
}

#[test]
fn test_use_plugin_twice_applies_once() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);

    let plugins = PluginRegistry::new();
    plugins.register(tag_plugin("audit").with_config_block(move |container| {
        counter.fetch_add(1, Ordering::SeqCst);
        container.register("audit.log", instance(Vec::<String>::new()))
    }));

    let mut container = container(dir.path(), StaticSourceLoader::new(), plugins);
    container.use_plugin("audit", PluginOptions::new())?;
    container.use_plugin("audit", PluginOptions::new().with("level", "debug"))?;

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(container.extensions().len(), 1);
    assert_eq!(container.enabled_plugins(), &["audit".to_string()]);
    assert_eq!(container.keys(), vec!["audit.log"]);
    Ok(())
}

#[test]
fn test_boot_order_runs_each_finalizer_before_next_unit() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    for unit in ["c", "a", "b"] {
        touch(dir.path(), &format!("core/boot/{}.rs", unit));
    }

    let events = Arc::new(Mutex::new(Vec::<String>::new()));
    let mut loader = StaticSourceLoader::new();
    for unit in ["a", "b", "c"] {
        let events = Arc::clone(&events);
        loader.insert(format!("boot/{}", unit), move |container: &mut Container| {
            events.lock().push(unit.to_string());
            let events = Arc::clone(&events);
            container.finalize(unit, move |_| {
                events.lock().push(format!("{}-finalizer", unit));
                Ok(())
            })
        });
    }

    let mut container = container(dir.path(), loader, PluginRegistry::new());
    container.finalize_all()?;

    assert_eq!(
        *events.lock(),
        vec!["a", "a-finalizer", "b", "b-finalizer", "c", "c-finalizer"]
    );
    for unit in ["a", "b", "c"] {
        assert_eq!(container.boot_state(unit), BootState::Finalized);
    }
    Ok(())
}

#[test]
fn test_unit_booted_early_is_skipped_by_finalize() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    touch(dir.path(), "core/boot/db.rs");

    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);
    let loader = StaticSourceLoader::new().source("boot/db", move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    let mut container = container(dir.path(), loader, PluginRegistry::new());
    container.boot("db")?;
    container.finalize_all()?;

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn test_frozen_container_rejects_mutation() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    touch(dir.path(), "core/users/user_repo.rs");

    let loader =
        StaticSourceLoader::new().component::<UserRepo>("users/user_repo", "Users::UserRepo");
    let plugins = PluginRegistry::new();
    plugins.register(tag_plugin("audit"));

    let mut container = container(dir.path(), loader, plugins);
    container.finalize_all()?;
    let keys_before = container.keys();

    assert!(container.register_component("users.user_repo").unwrap_err().is_frozen());
    assert!(container.use_plugin("audit", PluginOptions::new()).unwrap_err().is_frozen());
    assert!(container
        .configure(|settings| settings.env = Some("production".to_string()))
        .unwrap_err()
        .is_frozen());
    assert!(container.register("late", instance(1_u8)).unwrap_err().is_frozen());
    assert!(container.auto_register("core").unwrap_err().is_frozen());

    assert_eq!(container.keys(), keys_before);
    assert!(container.enabled_plugins().is_empty());
    assert!(container.settings().env.is_none());
    Ok(())
}

#[test]
fn test_overlapping_auto_register_registers_each_once() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    for file in ["lib/parts/x.rs", "lib/parts/y.rs", "lib/more/x.rs", "lib/more/z.rs"] {
        touch(dir.path(), file);
    }

    let loads = Arc::new(AtomicUsize::new(0));
    let mut loader = StaticSourceLoader::new();
    counted_component::<Widget>(&mut loader, "parts/x", "Parts::X", &loads);
    counted_component::<Widget>(&mut loader, "parts/y", "Parts::Y", &loads);
    counted_component::<Widget>(&mut loader, "more/x", "More::X", &loads);
    counted_component::<Widget>(&mut loader, "more/z", "More::Z", &loads);

    let mut container = container(dir.path(), loader, PluginRegistry::new());

    assert_eq!(container.auto_register("lib/parts")?, 2);
    assert_eq!(container.auto_register("lib")?, 2);
    assert_eq!(container.auto_register("lib/parts")?, 0);

    assert_eq!(
        container.keys(),
        vec!["parts.x", "parts.y", "more.x", "more.z"]
    );
    assert_eq!(loads.load(Ordering::SeqCst), 4);
    Ok(())
}

#[test]
fn test_auto_register_with_custom_construction() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    touch(dir.path(), "lib/widgets/gear.rs");

    let loader = StaticSourceLoader::new().component::<Widget>("widgets/gear", "Widgets::Gear");
    let mut container = container(dir.path(), loader, PluginRegistry::new());

    let registered = container.auto_register_with("lib", |type_def| {
        Ok(instance(format!("built {}", type_def.name())))
    })?;

    assert_eq!(registered, 1);
    let value = container.resolve_as::<String>("widgets.gear")?;
    assert_eq!(value.as_str(), "built Widgets::Gear");
    Ok(())
}

#[test]
fn test_plugin_dependency_failure_leaves_enabled_set_unchanged() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let catalog = DependencyCatalog::new();
    catalog.provide_available("json");
    catalog.provide("redis", || {
        Err(infrastructure_common::LoadError::failed("redis", "连接被拒绝"))
    });

    let plugins = PluginRegistry::with_dependency_loader(Arc::new(catalog));
    plugins.register(tag_plugin("serializer").with_dependencies(["json"]));
    plugins.register(tag_plugin("cache").with_dependencies(["json", "redis"]));

    let mut container = container(dir.path(), StaticSourceLoader::new(), plugins);
    container.use_plugin("serializer", PluginOptions::new())?;

    let err = container.use_plugin("cache", PluginOptions::new()).unwrap_err();
    match err {
        ContainerError::PluginDependencyMissing { plugin, message } => {
            assert_eq!(plugin, "cache");
            assert!(message.contains("redis"));
        }
        other => panic!("unexpected error: {}", other),
    }

    assert_eq!(container.enabled_plugins(), &["serializer".to_string()]);
    assert_eq!(container.extensions().len(), 1);
    assert_eq!(container.plugin_registry().loaded_dependencies(), vec!["json"]);
    Ok(())
}

#[test]
fn test_derived_container_inherits_plugins_by_copy() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let plugins = PluginRegistry::new();
    plugins.register(tag_plugin("p"));
    plugins.register(tag_plugin("q"));

    let mut parent = container(dir.path(), StaticSourceLoader::new(), plugins);
    parent.use_plugin("p", PluginOptions::new())?;
    parent.register("parent.only", instance(1_u8))?;

    let mut child = parent.derive()?;
    assert!(child.is_plugin_enabled("p"));
    assert!(child.extension::<Tag>().is_some());
    assert!(!child.is_configured());
    assert!(!child.contains("parent.only"));

    child.use_plugin("q", PluginOptions::new())?;
    assert_eq!(child.enabled_plugins(), &["p".to_string(), "q".to_string()]);
    assert_eq!(parent.enabled_plugins(), &["p".to_string()]);
    Ok(())
}

#[test]
fn test_pending_import_loads_on_demand() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    touch(dir.path(), "core/users/user_repo.rs");

    let loads = Arc::new(AtomicUsize::new(0));
    let mut loader = StaticSourceLoader::new();
    counted_component::<UserRepo>(&mut loader, "users/user_repo", "Users::UserRepo", &loads);

    let mut container = container(dir.path(), loader, PluginRegistry::new());
    let pending = container.import(&["users.user_repo"])?;
    assert_eq!(loads.load(Ordering::SeqCst), 0);

    let first = pending.resolve_now(&mut container)?;
    let second = pending.resolve_now(&mut container)?;

    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(
        &first.get::<UserRepo>("user_repo")?,
        &second.get::<UserRepo>("users.user_repo")?
    ));
    Ok(())
}

#[test]
fn test_failed_boot_unit_surfaces_error() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "core/boot/broken.rs");

    let loader = StaticSourceLoader::new().source("boot/broken", |_| -> ContainerResult<()> {
        Err(ContainerError::hook_failed("boot/broken", "初始化失败"))
    });
    let mut container = container(dir.path(), loader, PluginRegistry::new());

    let err = container.finalize_all().unwrap_err();
    assert!(matches!(
        err,
        ContainerError::HookFailed { ref hook, .. } if hook == "boot/broken"
    ));
    assert_eq!(container.boot_state("broken"), BootState::Unbooted);
    assert!(!container.is_frozen());
}
