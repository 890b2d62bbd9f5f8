//! # 组件容器实现
//!
//! 提供延迟加载的组件容器、启动引擎和插件引擎。
//!
//! ## 主要组件
//!
//! - [`Container`] - 组件容器：配置、解析、自动注册、延迟导入、派生
//! - [`BootState`] - 启动单元状态
//! - [`PluginRegistry`] - 进程级插件注册表
//! - [`MemoryRegistry`] - 内存后备注册表
//! - [`OsFileSystem`] - 本地文件系统
//! - [`StaticSourceLoader`] - 静态源文件加载器
//!
//! ## 使用示例
//!
//! ```no_run
//! use di_impl::{Container, StaticSourceLoader};
//!
//! #[derive(Default)]
//! struct UserRepo;
//!
//! let loader = StaticSourceLoader::new()
//!     .component::<UserRepo>("users/user_repo", "Users::UserRepo");
//!
//! let mut container = Container::builder()
//!     .with_root("/srv/app")
//!     .with_loader(loader)
//!     .build();
//!
//! container.configure(|settings| settings.env = Some("production".into()))?;
//! container.register_component("users.user_repo")?;
//! let repo = container.resolve_as::<UserRepo>("users.user_repo")?;
//! # Ok::<(), infrastructure_common::ContainerError>(())
//! ```

pub mod boot;
pub mod builder;
pub mod container;
pub mod filesystem;
pub mod import;
pub mod loader;
pub mod plugins;
pub mod registry;

pub use boot::{BootState, Finalizer};
pub use builder::ContainerBuilder;
pub use container::{Container, RegistryFactory};
pub use filesystem::OsFileSystem;
pub use import::{PendingImport, ResolvedImports};
pub use loader::{SourceBody, StaticSourceLoader};
pub use plugins::builtin::{DependencyGraphExtension, EnvExtension, LoggingExtension};
pub use plugins::monitoring::{MonitoringExtension, MonitoringOptions};
pub use plugins::notifications::{
    ContainerEvent, ContainerEventType, Notifications, NotificationsExtension,
};
pub use plugins::{
    Behavior, DependencyCatalog, DependencyLoader, Extension, Plugin, PluginRegistry,
};
pub use registry::MemoryRegistry;
