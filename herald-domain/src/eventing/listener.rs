//! 事件监听器（EventListener）
//!
//! 一个监听器只绑定一个事件名；需要监听多个事件时注册多个实例。
//!
use crate::ProviderHub;
use crate::domain_event::DomainEvent;
use async_trait::async_trait;
use std::fmt;
use tokio_util::sync::CancellationToken;

/// 投递方式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Delivery {
    /// 在发布方任务内、`publish` 返回前执行
    Sync,
    /// 经队列由 worker 取出后独立调度执行
    Async,
}

impl Delivery {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sync => "sync",
            Self::Async => "async",
        }
    }
}

impl fmt::Display for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单次监听器调用的上下文
///
/// `cancellation` 为分发器取消令牌的子令牌：`close` 后被触发，
/// 长耗时监听器可据此协作退出；分发器本身不会强制中断监听器。
#[derive(Clone, Debug)]
pub struct ListenerContext {
    delivery: Delivery,
    cancellation: CancellationToken,
}

impl ListenerContext {
    pub fn new(delivery: Delivery, cancellation: CancellationToken) -> Self {
        Self {
            delivery,
            cancellation,
        }
    }

    pub fn delivery(&self) -> Delivery {
        self.delivery
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

/// 事件监听器
#[async_trait]
pub trait EventListener: Send + Sync {
    /// 订阅的事件名（精确匹配 `DomainEvent::name`）
    fn event_name(&self) -> &str;

    /// 是否异步投递；在监听器生命周期内保持不变
    fn is_async(&self) -> bool;

    /// 监听器名称（用于日志）
    fn listener_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// 处理事件；可通过 `hub` 解析协作者，也可再次发布事件
    async fn handle(
        &self,
        ctx: &ListenerContext,
        event: &dyn DomainEvent,
        hub: &ProviderHub,
    ) -> anyhow::Result<()>;

    fn delivery(&self) -> Delivery {
        if self.is_async() {
            Delivery::Async
        } else {
            Delivery::Sync
        }
    }
}
