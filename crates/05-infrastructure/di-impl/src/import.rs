//! 延迟导入
//!
//! [`Container::import`] 只记录并校验标识符，真正的加载与解析发生在
//! [`PendingImport::resolve_now`]，这样相互依赖的组件之间不需要约定加载顺序。

use crate::container::Container;
use infrastructure_common::{ContainerError, ContainerResult, Identifier, Instance};
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

/// 待解析的导入
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingImport {
    identifiers: Vec<Identifier>,
}

impl PendingImport {
    pub(crate) fn new(identifiers: Vec<Identifier>) -> Self {
        Self { identifiers }
    }

    /// 导入的标识符
    pub fn identifiers(&self) -> &[Identifier] {
        &self.identifiers
    }

    /// 确保每个标识符已注册，然后解析全部依赖
    pub fn resolve_now(&self, container: &mut Container) -> ContainerResult<ResolvedImports> {
        for id in &self.identifiers {
            if !container.registry.contains(&id.key()) {
                debug!("导入时加载组件: {}", id);
                container.register_component(&id.key())?;
            }
        }

        let entries = self
            .identifiers
            .iter()
            .map(|id| Ok((id.clone(), container.resolve(&id.key())?)))
            .collect::<ContainerResult<Vec<_>>>()?;

        Ok(ResolvedImports { entries })
    }
}

/// 已解析的依赖集合
///
/// 可以按完整标识符或最后一段名称取值
#[derive(Debug, Clone)]
pub struct ResolvedImports {
    entries: Vec<(Identifier, Instance)>,
}

impl ResolvedImports {
    /// 按名称取依赖实例
    pub fn get_instance(&self, name: &str) -> Option<&Instance> {
        self.entries
            .iter()
            .find(|(id, _)| id.key() == name)
            .or_else(|| self.entries.iter().find(|(id, _)| id.last() == name))
            .map(|(_, instance)| instance)
    }

    /// 按名称取依赖并转换为具体类型
    pub fn get<T>(&self, name: &str) -> ContainerResult<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let instance = self
            .get_instance(name)
            .cloned()
            .ok_or_else(|| ContainerError::resolution_failed(name, "依赖不在导入列表中"))?;

        instance.downcast::<T>().map_err(|_| ContainerError::TypeMismatch {
            identifier: name.to_string(),
            expected: std::any::type_name::<T>().to_string(),
        })
    }

    /// 依赖名称（最后一段），按导入顺序
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(id, _)| id.last()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
