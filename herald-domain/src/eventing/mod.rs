//! 事件分发子系统（eventing）
//!
//! 进程内领域事件的发布/订阅：
//! - `EventListener`：绑定单一事件名的监听器，区分同步/异步投递；
//! - `DomainEventsProvider`：订阅、发布、分发与生命周期协议；
//! - `InMemoryDomainEventsProvider`：有界队列 + 固定 worker 池的内存实现。
//!
//! 同步监听器在发布方任务内按注册顺序执行；异步监听器由 worker 取出事件后
//! 各自独立调度，失败只记录日志，不回传给发布方。
//!
mod config;
mod inmemory;
mod listener;
mod provider;
mod registry;

pub use config::InMemoryDispatcherConfig;
pub use inmemory::{InMemoryDomainEventsProvider, LifecycleState};
pub use listener::{Delivery, EventListener, ListenerContext};
pub use provider::DomainEventsProvider;
