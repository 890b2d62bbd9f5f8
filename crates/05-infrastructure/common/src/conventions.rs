//! 约定规范定义
//!
//! 提供组件标识符的解析规则，以及标识符与源文件路径、类型名称之间的命名约定

use crate::errors::ContainerError;
use once_cell::sync::Lazy;
use std::fmt;
use std::str::FromStr;

/// 标识符片段格式：小写字母开头，单词之间以单个下划线分隔，每个单词以字母开头
static SEGMENT_PATTERN: Lazy<regex::Regex> = Lazy::new(|| {
    regex::Regex::new(r"^[a-z][a-z0-9]*(_[a-z][a-z0-9]*)*$").expect("标识符片段正则表达式无效")
});

/// 类型名称片段格式
static TYPE_SEGMENT_PATTERN: Lazy<regex::Regex> =
    Lazy::new(|| regex::Regex::new(r"^[A-Z][A-Za-z0-9]*$").expect("类型名称正则表达式无效"));

/// 组件标识符
///
/// 由若干片段组成，输入时片段之间可以使用 `.` 或 `/` 分隔，
/// 规范形式统一使用 `.` 连接，作为注册表中的键。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier {
    segments: Vec<String>,
}

impl Identifier {
    /// 规范形式的片段分隔符
    pub const SEPARATOR: char = '.';

    /// 解析标识符字符串
    pub fn parse(raw: &str) -> Result<Self, ContainerError> {
        if raw.is_empty() {
            return Err(ContainerError::InvalidIdentifier {
                identifier: raw.to_string(),
                reason: "标识符为空".to_string(),
            });
        }

        Self::from_segments(raw.split(['.', '/']))
            .map_err(|e| match e {
                ContainerError::InvalidIdentifier { reason, .. } => {
                    ContainerError::InvalidIdentifier {
                        identifier: raw.to_string(),
                        reason,
                    }
                }
                other => other,
            })
    }

    /// 从片段列表构建标识符
    pub fn from_segments<I, S>(segments: I) -> Result<Self, ContainerError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();

        if segments.is_empty() {
            return Err(ContainerError::InvalidIdentifier {
                identifier: String::new(),
                reason: "标识符为空".to_string(),
            });
        }

        for segment in &segments {
            if !SEGMENT_PATTERN.is_match(segment) {
                return Err(ContainerError::InvalidIdentifier {
                    identifier: segments.join("."),
                    reason: format!("片段 '{}' 含有不允许的字符", segment),
                });
            }
        }

        Ok(Self { segments })
    }

    /// 获取所有片段
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// 获取规范形式的键
    pub fn key(&self) -> String {
        self.segments.join(".")
    }

    /// 获取最后一个片段
    pub fn last(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl FromStr for Identifier {
    type Err = ContainerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for Identifier {
    type Error = ContainerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

/// 命名策略 trait
///
/// 标识符与源文件路径、类型名称之间的双向映射。
/// 实现必须是纯函数，并且正向与反向映射互为逆运算。
pub trait NamingStrategy: Send + Sync + fmt::Debug {
    /// 标识符到相对源文件路径（不含扩展名，使用 `/` 分隔）
    fn to_path(&self, identifier: &Identifier) -> String;

    /// 标识符到完整类型名称
    fn to_type_name(&self, identifier: &Identifier) -> String;

    /// 相对源文件路径（不含扩展名）到标识符
    fn from_path(&self, path: &str) -> Result<Identifier, ContainerError>;

    /// 完整类型名称到标识符
    fn from_type_name(&self, type_name: &str) -> Result<Identifier, ContainerError>;
}

/// 默认命名约定
///
/// `users.user_repo` ⇄ `users/user_repo` ⇄ `Users::UserRepo`
#[derive(Debug, Clone, Copy, Default)]
pub struct ConventionalNaming;

impl ConventionalNaming {
    /// 创建默认命名约定
    pub fn new() -> Self {
        Self
    }

    /// 将蛇形命名转换为驼峰命名
    fn to_camel_case(s: &str) -> String {
        s.split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect()
    }

    /// 将驼峰命名转换为蛇形命名
    fn to_snake_case(s: &str) -> String {
        let mut result = String::new();

        for ch in s.chars() {
            if ch.is_uppercase() && !result.is_empty() {
                result.push('_');
            }
            result.extend(ch.to_lowercase());
        }

        result
    }
}

impl NamingStrategy for ConventionalNaming {
    fn to_path(&self, identifier: &Identifier) -> String {
        identifier.segments().join("/")
    }

    fn to_type_name(&self, identifier: &Identifier) -> String {
        identifier
            .segments()
            .iter()
            .map(|segment| Self::to_camel_case(segment))
            .collect::<Vec<_>>()
            .join("::")
    }

    fn from_path(&self, path: &str) -> Result<Identifier, ContainerError> {
        let normalized = path.replace('\\', "/");
        Identifier::from_segments(normalized.trim_matches('/').split('/')).map_err(|e| match e {
            ContainerError::InvalidIdentifier { reason, .. } => ContainerError::InvalidIdentifier {
                identifier: path.to_string(),
                reason,
            },
            other => other,
        })
    }

    fn from_type_name(&self, type_name: &str) -> Result<Identifier, ContainerError> {
        let mut segments = Vec::new();

        for part in type_name.split("::") {
            if !TYPE_SEGMENT_PATTERN.is_match(part) {
                return Err(ContainerError::InvalidIdentifier {
                    identifier: type_name.to_string(),
                    reason: format!("类型名称片段 '{}' 不符合驼峰命名", part),
                });
            }
            segments.push(Self::to_snake_case(part));
        }

        Identifier::from_segments(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_both_separators() {
        let dotted = Identifier::parse("users.user_repo").unwrap();
        let slashed = Identifier::parse("users/user_repo").unwrap();

        assert_eq!(dotted, slashed);
        assert_eq!(dotted.key(), "users.user_repo");
        assert_eq!(dotted.last(), "user_repo");
    }

    #[test]
    fn test_parse_rejects_invalid_segments() {
        for raw in ["", "Users.repo", "users..repo", "users.repo-1", "users.2fa", "a__b", "a_"] {
            let err = Identifier::parse(raw).unwrap_err();
            assert!(
                matches!(err, ContainerError::InvalidIdentifier { .. }),
                "{} 应该被拒绝",
                raw
            );
        }
    }

    #[test]
    fn test_conventional_naming_forward() {
        let naming = ConventionalNaming::new();
        let id = Identifier::parse("my_app.users.user_repo2").unwrap();

        assert_eq!(naming.to_path(&id), "my_app/users/user_repo2");
        assert_eq!(naming.to_type_name(&id), "MyApp::Users::UserRepo2");
    }

    #[test]
    fn test_conventional_naming_is_invertible() {
        let naming = ConventionalNaming::new();

        for raw in ["a", "a_b", "v2_api.handler", "my_app.users.user_repo2", "x.y_z.w1_q2"] {
            let id = Identifier::parse(raw).unwrap();
            let from_path = naming.from_path(&naming.to_path(&id)).unwrap();
            let from_type = naming.from_type_name(&naming.to_type_name(&id)).unwrap();

            assert_eq!(from_path, id);
            assert_eq!(from_type, id);
        }
    }

    #[test]
    fn test_from_type_name_rejects_non_camel_case() {
        let naming = ConventionalNaming::new();

        assert!(naming.from_type_name("users::Repo").is_err());
        assert!(naming.from_type_name("Users::").is_err());
    }
}
