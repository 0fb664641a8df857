use super::{LogDataSanitizer, LogLevel, LogProvider};
use serde_json::Value;
use std::sync::atomic::{AtomicU8, Ordering};

/// 基于 `tracing` 的日志实现
///
/// - Debug/Info/Warning 低于配置级别时丢弃；Error/Critical 始终输出；
/// - 键值属性经 `LogDataSanitizer` 清洗后作为 `data` 字段输出。
pub struct TracingLogProvider {
    level: AtomicU8,
    sanitizer: LogDataSanitizer,
}

impl TracingLogProvider {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level: AtomicU8::new(level as u8),
            sanitizer: LogDataSanitizer::default(),
        }
    }

    pub fn with_sanitizer(mut self, sanitizer: LogDataSanitizer) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    fn enabled(&self, level: LogLevel) -> bool {
        level >= LogLevel::Error || level >= self.log_level()
    }
}

impl Default for TracingLogProvider {
    fn default() -> Self {
        Self::new(LogLevel::Info)
    }
}

impl LogProvider for TracingLogProvider {
    fn log(&self, level: LogLevel, msg: &str, data: Value) {
        if !self.enabled(level) {
            return;
        }
        let data = self.sanitizer.sanitize(data);

        match level {
            LogLevel::Debug => tracing::debug!(data = %data, "{msg}"),
            LogLevel::Info => tracing::info!(data = %data, "{msg}"),
            LogLevel::Warning => tracing::warn!(data = %data, "{msg}"),
            LogLevel::Error => tracing::error!(data = %data, "{msg}"),
            LogLevel::Critical => tracing::error!(critical = true, data = %data, "{msg}"),
        }
    }

    fn set_log_level(&self, level: LogLevel) {
        self.level.store(level as u8, Ordering::Relaxed);
    }

    fn log_level(&self) -> LogLevel {
        LogLevel::from_u8(self.level.load(Ordering::Relaxed))
    }
}
