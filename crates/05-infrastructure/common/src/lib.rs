//! # Infrastructure Common
//!
//! 这个 crate 提供了组件容器各层共享的基础类型与约定。
//!
//! ## 核心内容
//!
//! - [`Identifier`] - 组件标识符
//! - [`NamingStrategy`] - 标识符与源文件路径、类型名称之间的命名约定
//! - [`ComponentDescriptor`] - 由标识符推导的组件描述符
//! - [`ContainerSettings`] - 容器配置
//! - [`ContainerError`] - 容器错误类型
//!
//! ## 设计原则
//!
//! - 同步、单线程的加载模型
//! - 约定优于配置
//! - 命名约定必须可逆

pub mod component;
pub mod configuration;
pub mod conventions;
pub mod errors;

pub use component::*;
pub use configuration::*;
pub use conventions::*;
pub use errors::*;
