//! 组件基础定义
//!
//! 组件实例的统一表示，以及从标识符推导出的组件描述符

use crate::conventions::{Identifier, NamingStrategy};
use std::any::Any;
use std::sync::Arc;

/// 组件实例
///
/// 容器与注册表之间传递的类型擦除实例，使用方通过向下转型取回具体类型
pub type Instance = Arc<dyn Any + Send + Sync>;

/// 将具体值包装为组件实例
pub fn instance<T: Any + Send + Sync>(value: T) -> Instance {
    Arc::new(value)
}

/// 组件描述符
///
/// 由标识符按命名约定推导得到，不做存储，需要时重新计算
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentDescriptor {
    /// 组件标识符
    pub identifier: Identifier,
    /// 相对源文件路径（不含扩展名）
    pub path: String,
    /// 相对源文件名（含扩展名）
    pub file: String,
    /// 源文件中应当定义的类型名称
    pub type_name: String,
}

impl ComponentDescriptor {
    /// 按命名策略推导组件描述符
    pub fn new(identifier: Identifier, naming: &dyn NamingStrategy, extension: &str) -> Self {
        let path = naming.to_path(&identifier);
        let file = format!("{}.{}", path, extension);
        let type_name = naming.to_type_name(&identifier);

        Self {
            identifier,
            path,
            file,
            type_name,
        }
    }

    /// 注册表中使用的键
    pub fn key(&self) -> String {
        self.identifier.key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conventions::ConventionalNaming;

    #[test]
    fn test_descriptor_is_derived_from_identifier() {
        let id = Identifier::parse("persistence/user_repo").unwrap();
        let descriptor = ComponentDescriptor::new(id, &ConventionalNaming, "rs");

        assert_eq!(descriptor.key(), "persistence.user_repo");
        assert_eq!(descriptor.path, "persistence/user_repo");
        assert_eq!(descriptor.file, "persistence/user_repo.rs");
        assert_eq!(descriptor.type_name, "Persistence::UserRepo");
    }
}
