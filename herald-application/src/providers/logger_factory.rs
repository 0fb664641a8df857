use super::ProviderFactory;
use crate::config::{HeraldConfig, LoggingConfig};
use crate::error::AppResult;
use herald_domain::ProviderHub;
use herald_domain::error::DomainError;
use herald_domain::logging::{LogProvider, MemoryLogProvider, TracingLogProvider};
use std::sync::Arc;

/// 按 `logging.kind` 注册 `dyn LogProvider`
#[derive(Default)]
pub struct LoggerProviderFactory {
    config: Option<LoggingConfig>,
}

impl LoggerProviderFactory {
    pub fn new() -> Self {
        Self::default()
    }

    fn build(config: &LoggingConfig) -> AppResult<Arc<dyn LogProvider>> {
        let level = config.level();
        match config.kind.as_str() {
            "tracing" => Ok(Arc::new(TracingLogProvider::new(level))),
            "memory" => Ok(Arc::new(MemoryLogProvider::new(level))),
            other => Err(DomainError::UnknownProvider {
                kind: format!("logger:{other}"),
            }
            .into()),
        }
    }
}

impl ProviderFactory for LoggerProviderFactory {
    fn init(&mut self, hub: &ProviderHub) -> AppResult<()> {
        self.config = Some(hub.get::<HeraldConfig>()?.logging.clone());
        Ok(())
    }

    fn register(&self, hub: &Arc<ProviderHub>) -> AppResult<()> {
        let config = self.config.clone().unwrap_or_default();
        hub.register::<dyn LogProvider>(Self::build(&config)?);
        Ok(())
    }
}
