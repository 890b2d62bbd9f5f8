//! # 基础设施组合层
//!
//! 这个 crate 是组件容器的组合根，负责把默认的协作者组装成一个可以直接
//! 启动的应用容器。
//!
//! ## 主要功能
//!
//! - **应用构建器**: 使用构建者模式组装配置加载器、文件系统、插件和源文件
//! - **日志初始化**: 基于 `tracing-subscriber` 的开发/生产日志预设
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use infrastructure_composition::{ApplicationBuilder, LoggingConfig};
//! use infrastructure_common::PluginOptions;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let container = ApplicationBuilder::new("/srv/app")
//!         .with_logging(LoggingConfig::development())
//!         .use_plugin("env", PluginOptions::new())
//!         .auto_register("lib")
//!         .boot()?;
//!
//!     println!("已注册组件: {:?}", container.keys());
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod error;
pub mod logging;

// 重新导出主要类型
pub use builder::ApplicationBuilder;
pub use error::CompositionError;
pub use logging::LoggingConfig;
