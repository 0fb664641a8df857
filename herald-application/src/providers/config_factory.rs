use super::ProviderFactory;
use crate::config::ConfigLoader;
use crate::error::AppResult;
use herald_domain::ProviderHub;
use std::sync::Arc;

/// 注册 `ConfigLoader` 与加载后的 `HeraldConfig`；无上游依赖
#[derive(Default)]
pub struct ConfigProviderFactory {
    loader: ConfigLoader,
}

impl ConfigProviderFactory {
    pub fn new(loader: ConfigLoader) -> Self {
        Self { loader }
    }
}

impl ProviderFactory for ConfigProviderFactory {
    fn init(&mut self, _hub: &ProviderHub) -> AppResult<()> {
        Ok(())
    }

    fn register(&self, hub: &Arc<ProviderHub>) -> AppResult<()> {
        let config = self.loader.load()?;
        hub.register(Arc::new(self.loader.clone()));
        hub.register(Arc::new(config));
        Ok(())
    }
}
