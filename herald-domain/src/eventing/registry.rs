use super::{Delivery, EventListener};
use std::collections::HashMap;
use std::sync::Arc;

type Listeners = Vec<Arc<dyn EventListener>>;

/// 订阅表：事件名 -> 按注册顺序排列的监听器，同步与异步分表存放
#[derive(Default)]
pub(crate) struct SubscriberRegistry {
    sync: HashMap<String, Listeners>,
    deferred: HashMap<String, Listeners>,
}

impl SubscriberRegistry {
    /// 登记监听器，返回其所在的表
    pub(crate) fn insert(&mut self, listener: Arc<dyn EventListener>) -> Delivery {
        let delivery = listener.delivery();
        let table = match delivery {
            Delivery::Sync => &mut self.sync,
            Delivery::Async => &mut self.deferred,
        };
        table
            .entry(listener.event_name().to_string())
            .or_default()
            .push(listener);
        delivery
    }

    /// 指定事件名的监听器快照
    pub(crate) fn listeners(&self, delivery: Delivery, event_name: &str) -> Listeners {
        let table = match delivery {
            Delivery::Sync => &self.sync,
            Delivery::Async => &self.deferred,
        };
        table.get(event_name).cloned().unwrap_or_default()
    }

    pub(crate) fn count(&self, delivery: Delivery, event_name: &str) -> usize {
        let table = match delivery {
            Delivery::Sync => &self.sync,
            Delivery::Async => &self.deferred,
        };
        table.get(event_name).map_or(0, Vec::len)
    }
}
