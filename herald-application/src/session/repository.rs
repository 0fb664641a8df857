use super::AuthSession;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// 会话仓储
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, session: &AuthSession) -> AppResult<()>;

    async fn find_by_session_id(&self, session_id: &str) -> AppResult<Option<AuthSession>>;

    async fn update(&self, session: &AuthSession) -> AppResult<()>;

    /// 按会话 ID 删除，返回被删除的会话
    async fn delete_by_session_id(&self, session_id: &str) -> AppResult<Option<AuthSession>>;

    async fn delete(&self, session: &AuthSession) -> AppResult<()>;

    async fn find_by_user_id(&self, user_id: &str) -> AppResult<Vec<AuthSession>>;

    /// 删除用户的全部会话，返回被删除的会话
    async fn delete_all_by_user_id(&self, user_id: &str) -> AppResult<Vec<AuthSession>>;

    /// 刷新令牌已过期（`refresh_expiry < now`）的会话
    async fn find_expired(&self, now: DateTime<Utc>) -> AppResult<Vec<AuthSession>>;

    /// 删除刷新令牌已过期的会话，返回删除数量
    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<usize>;
}

/// 内存版会话仓储
#[derive(Default)]
pub struct InMemorySessionRepository {
    sessions: DashMap<String, AuthSession>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn remove_where(&self, mut pred: impl FnMut(&AuthSession) -> bool) -> Vec<AuthSession> {
        let mut removed = Vec::new();
        self.sessions.retain(|_, session| {
            if pred(session) {
                removed.push(session.clone());
                false
            } else {
                true
            }
        });
        removed
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn create(&self, session: &AuthSession) -> AppResult<()> {
        use dashmap::mapref::entry::Entry;

        match self.sessions.entry(session.session_id.clone()) {
            Entry::Occupied(_) => Err(AppError::Repository(format!(
                "duplicate session id: {}",
                session.session_id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(session.clone());
                Ok(())
            }
        }
    }

    async fn find_by_session_id(&self, session_id: &str) -> AppResult<Option<AuthSession>> {
        Ok(self.sessions.get(session_id).map(|s| s.value().clone()))
    }

    async fn update(&self, session: &AuthSession) -> AppResult<()> {
        match self.sessions.get_mut(&session.session_id) {
            Some(mut current) => {
                *current = session.clone();
                Ok(())
            }
            None => Err(AppError::SessionNotFound(session.session_id.clone())),
        }
    }

    async fn delete_by_session_id(&self, session_id: &str) -> AppResult<Option<AuthSession>> {
        Ok(self.sessions.remove(session_id).map(|(_, s)| s))
    }

    async fn delete(&self, session: &AuthSession) -> AppResult<()> {
        self.sessions.remove(&session.session_id);
        Ok(())
    }

    async fn find_by_user_id(&self, user_id: &str) -> AppResult<Vec<AuthSession>> {
        let mut sessions: Vec<AuthSession> = self
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id)
            .map(|s| s.value().clone())
            .collect();
        sessions.sort_by_key(|s| s.created_at);
        Ok(sessions)
    }

    async fn delete_all_by_user_id(&self, user_id: &str) -> AppResult<Vec<AuthSession>> {
        Ok(self.remove_where(|s| s.user_id == user_id))
    }

    async fn find_expired(&self, now: DateTime<Utc>) -> AppResult<Vec<AuthSession>> {
        Ok(self
            .sessions
            .iter()
            .filter(|s| s.refresh_expiry < now)
            .map(|s| s.value().clone())
            .collect())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<usize> {
        Ok(self.remove_where(|s| s.refresh_expiry < now).len())
    }
}
