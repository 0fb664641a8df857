//! 领域层统一错误定义
//!
//! 事件分发本身从不向生产者暴露监听器失败；这里只覆盖装配期的错误：
//! 协作者缺失、配置非法、未知实现类型与解析失败。
//!
use thiserror::Error;

/// 统一错误类型（基础库最小必要集）
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("provider not found: {provider}")]
    ProviderNotFound { provider: &'static str },

    #[error("invalid config: {reason}")]
    InvalidConfig { reason: String },

    #[error("unknown provider type: {kind}")]
    UnknownProvider { kind: String },

    #[error("parse error: {reason}")]
    Parse { reason: String },
}

impl DomainError {
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}

/// 统一 Result 类型别名
pub type DomainResult<T> = Result<T, DomainError>;
