//! 可构造类型定义
//!
//! 源文件加载后向容器提供的顶层定义

use infrastructure_common::Instance;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 无参构造函数类型
pub type ConstructorFn = Arc<dyn Fn() -> Instance + Send + Sync>;

/// 可构造类型定义
///
/// 类型名称加上一个无参构造函数
#[derive(Clone)]
pub struct TypeDef {
    name: String,
    constructor: ConstructorFn,
}

impl TypeDef {
    /// 使用自定义构造函数创建类型定义
    pub fn new<F>(name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn() -> Instance + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            constructor: Arc::new(constructor),
        }
    }

    /// 使用 [`Default`] 作为构造函数
    pub fn of<T>(name: impl Into<String>) -> Self
    where
        T: Default + Any + Send + Sync,
    {
        Self::new(name, || Arc::new(T::default()) as Instance)
    }

    /// 类型名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 构造新实例
    pub fn construct(&self) -> Instance {
        (self.constructor)()
    }
}

impl fmt::Debug for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDef")
            .field("name", &self.name)
            .field("constructor", &"<function>")
            .finish()
    }
}
