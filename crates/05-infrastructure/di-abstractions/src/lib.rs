//! # Dependency Injection Abstractions
//!
//! 组件容器的协作者抽象层，定义容器所依赖的外部能力接口。
//!
//! ## 核心接口
//!
//! - [`BackingRegistry`] - 后备注册表接口
//! - [`SourceLoader`] - 源文件加载接口
//! - [`FileSystem`] - 文件系统接口
//! - [`TypeDef`] - 可构造类型定义

pub mod factory;
pub mod filesystem;
pub mod loader;
pub mod registry;

pub use factory::*;
pub use filesystem::*;
pub use loader::*;
pub use registry::*;
