//! 组合层错误类型

use infrastructure_common::ContainerError;
use thiserror::Error;

/// 组合层错误
#[derive(Error, Debug)]
pub enum CompositionError {
    #[error("日志初始化失败: {message}")]
    LoggingInit { message: String },

    #[error("应用启动失败: {source}")]
    Container {
        #[from]
        source: ContainerError,
    },
}
