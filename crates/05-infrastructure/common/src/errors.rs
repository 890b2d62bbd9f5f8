//! 错误类型定义

use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败: {source}")]
    FileReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("配置解析失败: {source}")]
    ParseError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("配置序列化失败: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },

    #[error("配置键不存在: {key}")]
    KeyNotFound { key: String },

    #[error("配置类型转换失败: {message}")]
    TypeConversionError { message: String },
}

/// 源文件加载错误类型
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("源文件不存在: {path}")]
    NotFound { path: String },

    #[error("源文件执行失败: {path}, 原因: {source}")]
    Failed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("文件匹配模式无效: {pattern}, 原因: {message}")]
    Pattern { pattern: String, message: String },

    #[error("文件系统访问失败: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl LoadError {
    /// 创建执行失败错误
    pub fn failed(
        path: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Failed {
            path: path.into(),
            source: source.into(),
        }
    }
}

/// 后备注册表错误类型
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("组件已注册: {key}")]
    AlreadyRegistered { key: String },

    #[error("组件未注册: {key}")]
    NotRegistered { key: String },

    #[error("组件工厂执行失败: {key}, 原因: {message}")]
    FactoryFailed { key: String, message: String },
}

/// 容器错误类型
#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("组件解析失败: {identifier}, 原因: {message}")]
    ResolutionFailed { identifier: String, message: String },

    #[error("组件标识符无效: {identifier}, 原因: {reason}")]
    InvalidIdentifier { identifier: String, reason: String },

    #[error("启动单元标识符 {name} 无效或启动文件缺失")]
    InvalidBootIdentifier { name: String },

    #[error("插件 {plugin} 的依赖缺失: {message}")]
    PluginDependencyMissing { plugin: String, message: String },

    #[error("插件未注册: {plugin}")]
    PluginNotRegistered { plugin: String },

    #[error("容器已冻结，禁止操作: {operation}")]
    Frozen { operation: String },

    #[error("组件类型不匹配: {identifier}, 期望类型: {expected}")]
    TypeMismatch { identifier: String, expected: String },

    #[error("回调执行失败: {hook}, 原因: {message}")]
    HookFailed { hook: String, message: String },

    #[error("源文件加载失败: {source}")]
    SourceLoad {
        #[from]
        source: LoadError,
    },

    #[error("注册表错误: {source}")]
    Registry {
        #[from]
        source: RegistryError,
    },

    #[error("配置错误: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },
}

impl ContainerError {
    /// 创建解析失败错误
    pub fn resolution_failed(identifier: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ResolutionFailed {
            identifier: identifier.into(),
            message: message.into(),
        }
    }

    /// 创建冻结错误
    pub fn frozen(operation: impl Into<String>) -> Self {
        Self::Frozen {
            operation: operation.into(),
        }
    }

    /// 创建回调失败错误
    pub fn hook_failed(hook: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HookFailed {
            hook: hook.into(),
            message: message.into(),
        }
    }

    /// 转换源文件加载错误
    ///
    /// 源文件体以容器错误失败时，直接返回该容器错误
    pub fn from_load(error: LoadError) -> Self {
        match error {
            LoadError::Failed { path, source } => match source.downcast::<ContainerError>() {
                Ok(inner) => *inner,
                Err(source) => Self::SourceLoad {
                    source: LoadError::Failed { path, source },
                },
            },
            other => Self::SourceLoad { source: other },
        }
    }

    /// 是否为不可变性违规
    pub fn is_frozen(&self) -> bool {
        matches!(self, Self::Frozen { .. })
    }
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type LoadResult<T> = Result<T, LoadError>;
pub type RegistryResult<T> = Result<T, RegistryError>;
pub type ContainerResult<T> = Result<T, ContainerError>;
