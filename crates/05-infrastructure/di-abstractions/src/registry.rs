//! 后备注册表抽象接口

use infrastructure_common::{Instance, RegistryError, RegistryResult};
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

/// 组件工厂函数类型
pub type ComponentFactoryFn = Arc<dyn Fn() -> RegistryResult<Instance> + Send + Sync>;

/// 注册表条目
///
/// 已构造的值，或首次解析时才执行的工厂
pub enum Entry {
    /// 已构造的值
    Value(Instance),
    /// 工厂，结果在首次解析后缓存
    Factory {
        /// 工厂函数
        factory: ComponentFactoryFn,
        /// 缓存的实例
        memoized: OnceCell<Instance>,
    },
}

impl Entry {
    /// 创建值条目
    pub fn value(instance: Instance) -> Self {
        Self::Value(instance)
    }

    /// 创建工厂条目
    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn() -> RegistryResult<Instance> + Send + Sync + 'static,
    {
        Self::Factory {
            factory: Arc::new(factory),
            memoized: OnceCell::new(),
        }
    }

    /// 取得实例，工厂最多执行一次成功构造
    pub fn get(&self) -> RegistryResult<Instance> {
        match self {
            Self::Value(instance) => Ok(Arc::clone(instance)),
            Self::Factory { factory, memoized } => memoized
                .get_or_try_init(|| factory())
                .map(Arc::clone),
        }
    }

    /// 工厂条目是否已经构造过实例
    pub fn is_materialized(&self) -> bool {
        match self {
            Self::Value(_) => true,
            Self::Factory { memoized, .. } => memoized.get().is_some(),
        }
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(_) => f.write_str("Entry::Value(<instance>)"),
            Self::Factory { memoized, .. } => f
                .debug_struct("Entry::Factory")
                .field("factory", &"<function>")
                .field("materialized", &memoized.get().is_some())
                .finish(),
        }
    }
}

/// 后备注册表 trait
///
/// 标识符到值或工厂的映射，每个键最多注册一次
pub trait BackingRegistry: Send + Sync + fmt::Debug {
    /// 注册条目，键已存在时返回 [`RegistryError::AlreadyRegistered`]
    fn register(&mut self, key: &str, entry: Entry) -> RegistryResult<()>;

    /// 解析实例
    fn resolve(&self, key: &str) -> RegistryResult<Instance>;

    /// 检查键是否已注册
    fn contains(&self, key: &str) -> bool;

    /// 按注册顺序获取所有键
    fn keys(&self) -> Vec<String>;

    /// 撤销注册，只用于回滚未完成的操作
    fn remove(&mut self, key: &str) -> Option<Entry>;

    /// 已注册条目数量
    fn len(&self) -> usize {
        self.keys().len()
    }

    /// 是否没有任何条目
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 将注册表错误包装为工厂失败
pub fn factory_failed(key: impl Into<String>, message: impl fmt::Display) -> RegistryError {
    RegistryError::FactoryFailed {
        key: key.into(),
        message: message.to_string(),
    }
}
