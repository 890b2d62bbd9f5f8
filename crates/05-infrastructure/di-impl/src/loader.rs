//! 静态源文件加载器
//!
//! 源文件的内容以编译期注册的函数体提供，按逻辑名称查找

use crate::container::Container;
use di_abstractions::{SourceFile, SourceLoader, TypeDef};
use infrastructure_common::{ContainerResult, LoadError, LoadResult};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// 源文件函数体类型
pub type SourceBody = Arc<dyn Fn(&mut Container) -> ContainerResult<()> + Send + Sync>;

/// 静态源文件加载器
#[derive(Clone, Default)]
pub struct StaticSourceLoader {
    sources: HashMap<String, SourceBody>,
}

impl StaticSourceLoader {
    /// 创建空加载器
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加源文件函数体
    pub fn source<F>(mut self, logical: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut Container) -> ContainerResult<()> + Send + Sync + 'static,
    {
        self.insert(logical, body);
        self
    }

    /// 添加只定义单个类型的组件源文件
    pub fn component<T>(self, logical: impl Into<String>, type_name: impl Into<String>) -> Self
    where
        T: Default + Any + Send + Sync,
    {
        let type_name = type_name.into();
        self.source(logical, move |container| {
            container.define(TypeDef::of::<T>(type_name.clone()));
            Ok(())
        })
    }

    /// 添加源文件函数体
    pub fn insert<F>(&mut self, logical: impl Into<String>, body: F)
    where
        F: Fn(&mut Container) -> ContainerResult<()> + Send + Sync + 'static,
    {
        self.sources.insert(logical.into(), Arc::new(body));
    }

    /// 是否包含指定逻辑名称
    pub fn contains(&self, logical: &str) -> bool {
        self.sources.contains_key(logical)
    }

    /// 源文件数量
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl SourceLoader<Container> for StaticSourceLoader {
    fn load(&self, file: &SourceFile, context: &mut Container) -> LoadResult<()> {
        let body = self.sources.get(&file.logical).ok_or_else(|| LoadError::NotFound {
            path: format!("{} ({})", file.logical, file.path.display()),
        })?;

        debug!("执行源文件: {}", file.logical);
        body(context).map_err(|e| LoadError::failed(file.path.display().to_string(), e))
    }

    fn name(&self) -> &str {
        "StaticSourceLoader"
    }
}

impl fmt::Debug for StaticSourceLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.sources.keys().collect();
        names.sort();
        f.debug_struct("StaticSourceLoader")
            .field("sources", &names)
            .finish()
    }
}
