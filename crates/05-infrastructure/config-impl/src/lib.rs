//! # Configuration Implementation
//!
//! 配置加载的具体实现。
//!
//! ## 主要组件
//!
//! - [`FileConfigLoader`] - 基于 `config` crate 的文件配置加载器

pub mod providers;

pub use providers::*;
