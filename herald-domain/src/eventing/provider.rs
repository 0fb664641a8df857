use super::EventListener;
use crate::domain_event::DomainEvent;
use crate::error::DomainResult;
use async_trait::async_trait;
use std::sync::Arc;

/// 领域事件分发协议
///
/// 生命周期：`constructed --collect()--> collecting --close()--> closed`。
/// `publish` 与 `subscribe` 在任意阶段都可调用。
#[async_trait]
pub trait DomainEventsProvider: Send + Sync {
    /// 启动 worker 池，持续从队列取出事件并 `dispatch`
    fn collect(&self);

    /// 按同步/异步登记监听器；不做去重
    async fn subscribe(&self, listener: Arc<dyn EventListener>) -> DomainResult<()>;

    /// 依次执行同步监听器，再将事件放入队列；队列满时转后台等待，不阻塞调用方
    async fn publish(&self, event: Arc<dyn DomainEvent>) -> DomainResult<()>;

    /// 为每个异步监听器独立调度一次调用，不等待其完成
    async fn dispatch(&self, event: Arc<dyn DomainEvent>) -> DomainResult<()>;

    /// 发出取消信号并等待 worker 与进行中的监听器结束；队列积压被丢弃
    async fn close(&self) -> DomainResult<()>;
}
