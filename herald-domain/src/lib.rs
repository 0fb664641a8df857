//! 进程内领域事件分发基础库（herald-domain）
//!
//! 将“状态变更”（例如会话已创建）与其副作用（通知、审计、缓存失效、级联流程）解耦：
//! - 领域事件（`domain_event`）：不可变的事件记录，仅包含名称与发生时间；
//! - 事件系统（`eventing`）：监听器协议、订阅注册表、有界待处理队列与工作池；
//! - 服务定位（`provider_hub`）：以类型为键的只读协作者容器，供监听器解析依赖；
//! - 日志协作者（`logging`）：结构化日志接口及基于 `tracing` 的实现。
//!
//! 典型用法：
//! 1. 定义事件结构体并派生 `DomainEvent`；
//! 2. 实现 `EventListener`，通过 `is_async` 选择同步或异步投递；
//! 3. 构建 `InMemoryDomainEventsProvider`，`subscribe` 后调用 `collect` 启动工作池；
//! 4. 业务服务在状态提交后 `publish` 事件，退出前 `close`。
//!
//! 本 crate 不提供持久化、跨进程投递或事件重放。
//!
pub mod domain_event;
pub mod error;
pub mod eventing;
pub mod logging;
pub mod provider_hub;

pub use provider_hub::ProviderHub;

// 允许在本 crate 内部通过 ::herald_domain 进行自引用，
// 以便派生宏在本 crate 的单元测试中也能解析到 ::herald_domain 路径。
extern crate self as herald_domain;
