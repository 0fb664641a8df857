//! 协作者装配（ProviderFactory）
//!
//! 每个工厂分两步参与装配：`init` 从 hub 解析所需的上游协作者，
//! `register` 构建自身提供的协作者并注册回 hub。`ProviderHubFactory`
//! 按给定顺序依次执行，任一步失败即中止。
//!
mod config_factory;
mod domain_event_factory;
mod hub_factory;
mod logger_factory;
mod server_event_factory;

pub use config_factory::ConfigProviderFactory;
pub use domain_event_factory::DomainEventFactory;
pub use hub_factory::ProviderHubFactory;
pub use logger_factory::LoggerProviderFactory;
pub use server_event_factory::ServerEventFactory;

use crate::error::AppResult;
use herald_domain::ProviderHub;
use std::sync::Arc;

pub trait ProviderFactory: Send {
    /// 解析依赖（此时 hub 中只包含排在前面的工厂注册的协作者）
    fn init(&mut self, hub: &ProviderHub) -> AppResult<()>;

    /// 构建并注册协作者
    fn register(&self, hub: &Arc<ProviderHub>) -> AppResult<()>;
}
