//! 文件系统抽象接口

use infrastructure_common::LoadResult;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// 文件系统 trait
///
/// 目录通配展开与文件存在性检查。
/// 展开结果对同一文件系统快照必须稳定。
pub trait FileSystem: Send + Sync + Debug {
    /// 展开通配模式，返回按路径排序的结果
    fn glob(&self, pattern: &str) -> LoadResult<Vec<PathBuf>>;

    /// 检查文件是否存在
    fn exists(&self, path: &Path) -> bool;
}
