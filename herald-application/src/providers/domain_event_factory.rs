use super::ProviderFactory;
use crate::config::{EventsConfig, HeraldConfig};
use crate::error::AppResult;
use herald_domain::ProviderHub;
use herald_domain::error::DomainError;
use herald_domain::eventing::{DomainEventsProvider, InMemoryDomainEventsProvider};
use herald_domain::logging::LogProvider;
use serde_json::json;
use std::sync::Arc;

/// 按 `events.provider_type` 构建分发器，注册为 `dyn DomainEventsProvider` 并立即启动 worker 池
///
/// 需在 tokio 运行时内调用 `register`。
#[derive(Default)]
pub struct DomainEventFactory {
    config: Option<EventsConfig>,
    logger: Option<Arc<dyn LogProvider>>,
}

impl DomainEventFactory {
    pub fn new() -> Self {
        Self::default()
    }

    fn build(
        &self,
        config: &EventsConfig,
        hub: &Arc<ProviderHub>,
        logger: Arc<dyn LogProvider>,
    ) -> AppResult<Arc<dyn DomainEventsProvider>> {
        match config.provider_type.as_str() {
            "in-memory" => Ok(Arc::new(InMemoryDomainEventsProvider::with_logger(
                config.dispatcher(),
                hub.clone(),
                logger,
            )?)),
            other => {
                logger.error(
                    "invalid domain event provider type",
                    json!({ "type": other }),
                );
                Err(DomainError::UnknownProvider {
                    kind: other.to_string(),
                }
                .into())
            }
        }
    }
}

impl ProviderFactory for DomainEventFactory {
    fn init(&mut self, hub: &ProviderHub) -> AppResult<()> {
        self.config = Some(hub.get::<HeraldConfig>()?.events.clone());
        self.logger = Some(hub.get::<dyn LogProvider>()?);
        Ok(())
    }

    fn register(&self, hub: &Arc<ProviderHub>) -> AppResult<()> {
        let config = self.config.clone().unwrap_or_default();
        let logger = match &self.logger {
            Some(logger) => logger.clone(),
            None => hub.get::<dyn LogProvider>()?,
        };

        let provider = self.build(&config, hub, logger)?;
        hub.register::<dyn DomainEventsProvider>(provider.clone());
        provider.collect();
        Ok(())
    }
}
