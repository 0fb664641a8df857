//! 应用层装配（herald-application）
//!
//! - `config`：基于 figment 的环境配置加载；
//! - `providers`：按顺序初始化并注册协作者的工厂，产出共享 `ProviderHub`；
//! - `session`：会话生产方服务，在状态提交后发布 `auth.session.*` 事件；
//! - `listeners`：参考监听器（会话审计、服务端事件转发）；
//! - `server_events`：进程内的服务端事件广播中心；
//! - `telemetry`：tracing 订阅器初始化。
//!
pub mod config;
pub mod error;
pub mod listeners;
pub mod providers;
pub mod server_events;
pub mod session;
pub mod telemetry;

pub use config::{ConfigLoader, HeraldConfig};
pub use error::{AppError, AppResult};
