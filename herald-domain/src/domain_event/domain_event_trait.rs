use chrono::{DateTime, Utc};
use std::any::Any;
use std::fmt;

/// 领域事件记录需要满足的通用能力边界
///
/// 通常通过 `#[derive(DomainEvent)]` 生成实现：
///
/// ```
/// use chrono::{DateTime, Utc};
/// use herald_domain::domain_event::DomainEvent;
/// use herald_macros::DomainEvent;
///
/// #[derive(Debug, DomainEvent)]
/// #[event(name = "order.placed")]
/// struct OrderPlaced {
///     order_id: String,
///     occurred_at: DateTime<Utc>,
/// }
///
/// let ev = OrderPlaced { order_id: "o-1".into(), occurred_at: Utc::now() };
/// assert_eq!(ev.name(), "order.placed");
/// ```
pub trait DomainEvent: fmt::Debug + Send + Sync + 'static {
    /// 路由键：与监听器注册的事件名精确匹配（区分大小写，无通配）
    fn name(&self) -> &str;

    /// 发生时间（仅供参考，总线不据此排序或过期）
    fn occurred_at(&self) -> DateTime<Utc>;

    /// 类型擦除视图，供监听器还原具体事件类型
    fn as_any(&self) -> &dyn Any;
}

impl dyn DomainEvent {
    /// 尝试还原为具体事件类型
    pub fn downcast_ref<E: DomainEvent>(&self) -> Option<&E> {
        self.as_any().downcast_ref::<E>()
    }

    pub fn is<E: DomainEvent>(&self) -> bool {
        self.as_any().is::<E>()
    }
}
