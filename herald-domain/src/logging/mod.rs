//! 日志协作者（LogProvider）
//!
//! 事件系统通过注入的结构化日志接口上报监听器失败与队列饱和，
//! 自身不负责格式化或持久化日志：
//! - `LogProvider`：消息 + 开放式键值属性（JSON 对象）；
//! - `LogLevel`：Debug < Info < Warning < Error < Critical；
//! - `TracingLogProvider`：转发至 `tracing`；
//! - `MemoryLogProvider`：内存记录，便于测试与示例断言。
//!
mod level;
mod memory;
mod sanitizer;
mod tracing_provider;

pub use level::LogLevel;
pub use memory::{LogRecord, MemoryLogProvider};
pub use sanitizer::LogDataSanitizer;
pub use tracing_provider::TracingLogProvider;

use serde_json::Value;

/// 结构化日志接口
///
/// `data` 约定为 JSON 对象（`serde_json::json!({ .. })`），键值对开放扩展。
pub trait LogProvider: Send + Sync {
    /// 以指定级别写入一条记录（级别过滤由实现负责）
    fn log(&self, level: LogLevel, msg: &str, data: Value);

    fn set_log_level(&self, level: LogLevel);

    fn log_level(&self) -> LogLevel;

    fn debug(&self, msg: &str, data: Value) {
        self.log(LogLevel::Debug, msg, data);
    }

    fn info(&self, msg: &str, data: Value) {
        self.log(LogLevel::Info, msg, data);
    }

    fn warning(&self, msg: &str, data: Value) {
        self.log(LogLevel::Warning, msg, data);
    }

    fn error(&self, msg: &str, data: Value) {
        self.log(LogLevel::Error, msg, data);
    }

    fn critical(&self, msg: &str, data: Value) {
        self.log(LogLevel::Critical, msg, data);
    }
}
