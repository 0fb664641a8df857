//! 会话（session）
//!
//! 会话的创建与注销是事件系统的主要生产方：
//! 状态写入仓储后发布 `auth.session.created` / `auth.session.deleted`。
//! 身份提供方的令牌交换不在此处，服务接收的是已验证的用户身份与令牌。
//!
mod events;
mod model;
mod repository;
mod service;

pub use events::{SessionWasCreated, SessionWasDeleted};
pub use model::AuthSession;
pub use repository::{InMemorySessionRepository, SessionRepository};
pub use service::{OpenSession, SessionService};
