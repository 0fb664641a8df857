//! 内存版日志实现（MemoryLogProvider）
//!
//! 按级别过滤后将记录保存在内存中，典型用途：测试环境与示例中断言
//! “监听器失败已上报”“队列饱和已告警”等行为。

use super::{LogLevel, LogProvider};
use serde_json::Value;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// 一条日志记录
#[derive(Clone, Debug, PartialEq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    pub data: Value,
}

pub struct MemoryLogProvider {
    level: AtomicU8,
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryLogProvider {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level: AtomicU8::new(level as u8),
            records: Mutex::new(Vec::new()),
        }
    }

    /// 全部记录的快照
    pub fn records(&self) -> Vec<LogRecord> {
        self.lock().clone()
    }

    /// 指定级别且消息完全匹配的记录
    pub fn find(&self, level: LogLevel, message: &str) -> Vec<LogRecord> {
        self.lock()
            .iter()
            .filter(|r| r.level == level && r.message == message)
            .cloned()
            .collect()
    }

    pub fn count(&self, level: LogLevel) -> usize {
        self.lock().iter().filter(|r| r.level == level).count()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryLogProvider {
    fn default() -> Self {
        Self::new(LogLevel::Debug)
    }
}

impl LogProvider for MemoryLogProvider {
    fn log(&self, level: LogLevel, msg: &str, data: Value) {
        if level < LogLevel::Error && level < self.log_level() {
            return;
        }
        self.lock().push(LogRecord {
            level,
            message: msg.to_string(),
            data,
        });
    }

    fn set_log_level(&self, level: LogLevel) {
        self.level.store(level as u8, Ordering::Relaxed);
    }

    fn log_level(&self) -> LogLevel {
        LogLevel::from_u8(self.level.load(Ordering::Relaxed))
    }
}
