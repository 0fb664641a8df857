use super::ProviderFactory;
use crate::error::AppResult;
use crate::server_events::{InMemoryServerEvents, ServerEventProvider};
use herald_domain::ProviderHub;
use std::sync::Arc;

/// 注册进程内的 `dyn ServerEventProvider`，不依赖其他协作者
pub struct ServerEventFactory {
    event_id: String,
}

impl ServerEventFactory {
    pub fn new(event_id: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
        }
    }
}

impl ProviderFactory for ServerEventFactory {
    fn init(&mut self, _hub: &ProviderHub) -> AppResult<()> {
        Ok(())
    }

    fn register(&self, hub: &Arc<ProviderHub>) -> AppResult<()> {
        let provider = InMemoryServerEvents::new(self.event_id.clone());
        hub.register::<dyn ServerEventProvider>(Arc::new(provider));
        Ok(())
    }
}
