//! 内存后备注册表实现

use di_abstractions::{BackingRegistry, Entry};
use infrastructure_common::{Instance, RegistryError, RegistryResult};
use std::collections::HashMap;
use tracing::debug;

/// 内存注册表
///
/// 保留注册顺序，工厂结果由条目自身缓存
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    /// 注册条目
    entries: HashMap<String, Entry>,
    /// 注册顺序
    order: Vec<String>,
}

impl MemoryRegistry {
    /// 创建新的内存注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 条目是否已经构造过实例
    pub fn is_materialized(&self, key: &str) -> bool {
        self.entries.get(key).is_some_and(Entry::is_materialized)
    }
}

impl BackingRegistry for MemoryRegistry {
    fn register(&mut self, key: &str, entry: Entry) -> RegistryResult<()> {
        if self.entries.contains_key(key) {
            return Err(RegistryError::AlreadyRegistered {
                key: key.to_string(),
            });
        }

        debug!("注册表新增条目: {} ({:?})", key, entry);
        self.entries.insert(key.to_string(), entry);
        self.order.push(key.to_string());
        Ok(())
    }

    fn resolve(&self, key: &str) -> RegistryResult<Instance> {
        self.entries
            .get(key)
            .ok_or_else(|| RegistryError::NotRegistered {
                key: key.to_string(),
            })?
            .get()
    }

    fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn keys(&self) -> Vec<String> {
        self.order.clone()
    }

    fn remove(&mut self, key: &str) -> Option<Entry> {
        let entry = self.entries.remove(key)?;
        self.order.retain(|k| k != key);
        debug!("注册表移除条目: {}", key);
        Some(entry)
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}
