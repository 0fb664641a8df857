use super::ProviderFactory;
use crate::error::AppResult;
use herald_domain::ProviderHub;
use std::sync::Arc;

#[derive(Default)]
pub struct ProviderHubFactory {
    hub: Arc<ProviderHub>,
}

impl ProviderHubFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 在已有 hub 上继续装配
    pub fn with_hub(hub: Arc<ProviderHub>) -> Self {
        Self { hub }
    }

    pub fn create(self, factories: Vec<Box<dyn ProviderFactory>>) -> AppResult<Arc<ProviderHub>> {
        for mut factory in factories {
            factory.init(&self.hub)?;
            factory.register(&self.hub)?;
        }
        tracing::debug!(providers = ?self.hub.registered(), "provider hub assembled");
        Ok(self.hub)
    }
}
