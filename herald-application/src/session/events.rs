use super::AuthSession;
use chrono::{DateTime, Utc};
use herald_macros::DomainEvent;
use std::sync::Arc;

/// 会话已创建；发生时间取会话创建时间
#[derive(Clone, Debug, DomainEvent)]
#[event(name = "auth.session.created", occurred_at = session.created_at)]
pub struct SessionWasCreated {
    pub session: Arc<AuthSession>,
}

/// 会话已注销；发生时间取注销时间
#[derive(Clone, Debug, DomainEvent)]
#[event(name = "auth.session.deleted", occurred_at = logout_at)]
pub struct SessionWasDeleted {
    pub session: Arc<AuthSession>,
    pub logout_at: DateTime<Utc>,
}
