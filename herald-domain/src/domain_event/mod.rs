//! 领域事件（Domain Event）
//!
//! 定义事件记录需要实现的最小接口（`DomainEvent`）：路由键 `name` 与由生产者
//! 设定的 `occurred_at`。事件一经构造即不可变，总线从不修改或重新打时间戳。

mod domain_event_trait;

pub use domain_event_trait::DomainEvent;

/// 事件发生时间（UTC）
pub type Timestamp = chrono::DateTime<chrono::Utc>;
