use crate::error::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

/// 内存分发器配置（构造后固定不变）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InMemoryDispatcherConfig {
    /// 待分发队列容量
    pub buffer_size: usize,
    /// worker 数量
    pub workers: usize,
}

impl Default for InMemoryDispatcherConfig {
    fn default() -> Self {
        Self {
            buffer_size: 100,
            workers: 8,
        }
    }
}

impl InMemoryDispatcherConfig {
    pub fn new(buffer_size: usize, workers: usize) -> Self {
        Self {
            buffer_size,
            workers,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.buffer_size == 0 {
            return Err(DomainError::invalid_config(
                "buffer_size must be at least 1",
            ));
        }
        if self.buffer_size > Semaphore::MAX_PERMITS {
            return Err(DomainError::invalid_config(format!(
                "buffer_size must not exceed {}",
                Semaphore::MAX_PERMITS
            )));
        }
        if self.workers == 0 {
            return Err(DomainError::invalid_config("workers must be at least 1"));
        }
        Ok(())
    }
}
