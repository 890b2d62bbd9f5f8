//! # Configuration Abstractions
//!
//! 配置加载抽象层，容器在 `configure` 时通过它获取应用配置。
//!
//! ## 核心接口
//!
//! - [`ConfigLoader`] - 应用配置加载接口

pub mod provider;

pub use provider::*;
