//! 操作系统文件系统实现

use di_abstractions::FileSystem;
use infrastructure_common::{LoadError, LoadResult};
use std::path::{Path, PathBuf};
use tracing::debug;

/// 基于 `glob` 的本地文件系统
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl OsFileSystem {
    /// 创建本地文件系统
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for OsFileSystem {
    fn glob(&self, pattern: &str) -> LoadResult<Vec<PathBuf>> {
        let entries = glob::glob(pattern).map_err(|e| LoadError::Pattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(std::io::Error::from)?;
            if path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        debug!("展开文件模式 {}: {} 个文件", pattern, paths.len());
        Ok(paths)
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}
