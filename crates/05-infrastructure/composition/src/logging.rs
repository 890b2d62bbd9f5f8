//! 日志初始化

use crate::error::CompositionError;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: tracing::Level,
    /// 过滤指令，设置后优先于日志级别
    pub filter: Option<String>,
    /// 是否显示目标
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
    /// 是否显示文件名
    pub show_file: bool,
    /// 是否显示行号
    pub show_line_number: bool,
    /// 是否使用 JSON 格式
    pub json_format: bool,
}

impl LoggingConfig {
    /// 开发环境：debug 级别，显示源码位置
    pub fn development() -> Self {
        Self {
            level: tracing::Level::DEBUG,
            show_file: true,
            show_line_number: true,
            ..Self::default()
        }
    }

    /// 生产环境：info 级别，JSON 输出
    pub fn production() -> Self {
        Self {
            level: tracing::Level::INFO,
            json_format: true,
            ..Self::default()
        }
    }

    /// 设置过滤指令
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// 过滤器：`RUST_LOG` 优先，其次是过滤指令，最后是日志级别
    pub fn env_filter(&self) -> Result<EnvFilter, CompositionError> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => self.configured_filter(),
        }
    }

    fn configured_filter(&self) -> Result<EnvFilter, CompositionError> {
        let directives = self
            .filter
            .clone()
            .unwrap_or_else(|| self.level.to_string().to_lowercase());

        EnvFilter::try_new(&directives).map_err(|e| CompositionError::LoggingInit {
            message: format!("日志过滤指令无效 '{}': {}", directives, e),
        })
    }

    /// 初始化全局日志订阅者
    ///
    /// 已经初始化过时返回错误，调用方可以选择忽略
    pub fn init(&self) -> Result<(), CompositionError> {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(self.env_filter()?)
            .with_target(self.show_target)
            .with_thread_ids(self.show_thread_ids)
            .with_file(self.show_file)
            .with_line_number(self.show_line_number);

        if self.json_format {
            subscriber.json().try_init()
        } else {
            subscriber.try_init()
        }
        .map_err(|e| CompositionError::LoggingInit {
            message: format!("日志初始化失败: {}", e),
        })?;

        info!("日志系统初始化完成");
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            filter: None,
            show_target: true,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let dev = LoggingConfig::development();
        assert_eq!(dev.level, tracing::Level::DEBUG);
        assert!(dev.show_file && !dev.json_format);

        let prod = LoggingConfig::production();
        assert_eq!(prod.level, tracing::Level::INFO);
        assert!(prod.json_format);
    }

    #[test]
    fn test_filter_directives() {
        assert!(LoggingConfig::default().configured_filter().is_ok());
        assert!(LoggingConfig::development()
            .with_filter("di_impl=trace,config_impl=warn")
            .configured_filter()
            .is_ok());
    }
}
