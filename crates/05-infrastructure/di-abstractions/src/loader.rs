//! 源文件加载抽象接口

use infrastructure_common::LoadResult;
use std::path::PathBuf;

/// 待加载的源文件
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceFile {
    /// 绝对路径
    pub path: PathBuf,
    /// 逻辑名称：相对所在基准目录的路径，使用 `/` 分隔，不含扩展名
    pub logical: String,
}

impl SourceFile {
    /// 创建源文件描述
    pub fn new(path: impl Into<PathBuf>, logical: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            logical: logical.into(),
        }
    }
}

/// 源文件加载器 trait
///
/// 加载源文件即执行其顶层定义，使其中的类型对上下文可用。
/// 同一路径只能成功加载一次，调用方负责去重。
pub trait SourceLoader<C: ?Sized>: Send + Sync {
    /// 加载源文件
    fn load(&self, file: &SourceFile, context: &mut C) -> LoadResult<()>;

    /// 加载器名称
    fn name(&self) -> &str;
}
