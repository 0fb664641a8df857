use super::{AuthSession, SessionRepository, SessionWasCreated, SessionWasDeleted};
use crate::config::SessionConfig;
use crate::error::{AppError, AppResult};
use bon::Builder;
use chrono::{DateTime, TimeDelta, Utc};
use herald_domain::domain_event::DomainEvent;
use herald_domain::error::DomainError;
use herald_domain::eventing::DomainEventsProvider;
use std::sync::Arc;

/// 开启会话所需的已验证身份与令牌
#[derive(Builder, Clone, Debug)]
pub struct OpenSession {
    #[builder(into)]
    pub user_id: String,
    #[builder(into)]
    pub username: String,
    #[builder(into)]
    pub access_token: String,
    #[builder(into)]
    pub refresh_token: String,
    /// 访问令牌过期时间（由身份提供方给出）
    pub expires_at: DateTime<Utc>,
    #[builder(into, default)]
    pub user_agent: String,
    #[builder(into, default)]
    pub ip_address: String,
}

/// 会话服务：写入仓储后发布会话事件
///
/// `events` 为空时只做状态变更，不发布事件。
pub struct SessionService {
    repository: Arc<dyn SessionRepository>,
    events: Option<Arc<dyn DomainEventsProvider>>,
    refresh_ttl: TimeDelta,
}

impl SessionService {
    pub fn new(
        repository: Arc<dyn SessionRepository>,
        events: Option<Arc<dyn DomainEventsProvider>>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            repository,
            events,
            refresh_ttl: config.refresh_ttl(),
        }
    }

    pub async fn open_session(&self, cmd: OpenSession) -> AppResult<Arc<AuthSession>> {
        let now = Utc::now();
        let Some(refresh_expiry) = now.checked_add_signed(self.refresh_ttl) else {
            return Err(DomainError::invalid_config(format!(
                "session refresh ttl out of range: {}s",
                self.refresh_ttl.num_seconds()
            ))
            .into());
        };
        let session = Arc::new(
            AuthSession::builder()
                .session_id(uuid::Uuid::new_v4().simple().to_string())
                .user_id(cmd.user_id)
                .username(cmd.username)
                .access_token(cmd.access_token)
                .refresh_token(cmd.refresh_token)
                .expires_at(cmd.expires_at)
                .refresh_expiry(refresh_expiry)
                .user_agent(cmd.user_agent)
                .ip_address(cmd.ip_address)
                .created_at(now)
                .build(),
        );

        self.repository.create(&session).await?;
        tracing::debug!(
            session_id = %session.session_id,
            user_id = %session.user_id,
            "session opened"
        );

        self.emit(SessionWasCreated {
            session: session.clone(),
        })
        .await?;
        Ok(session)
    }

    /// 注销（登出）会话；并发注销同一会话时只有一方成功并发布事件
    pub async fn invalidate_session(&self, session_id: &str) -> AppResult<()> {
        let session = self
            .repository
            .delete_by_session_id(session_id)
            .await?
            .ok_or_else(|| AppError::SessionNotFound(session_id.to_string()))?;

        self.emit(SessionWasDeleted {
            session: Arc::new(session),
            logout_at: Utc::now(),
        })
        .await
    }

    /// 查询有效会话；刷新令牌过期时返回 `SessionExpired`
    pub async fn session(&self, session_id: &str) -> AppResult<AuthSession> {
        let session = self
            .repository
            .find_by_session_id(session_id)
            .await?
            .ok_or_else(|| AppError::SessionNotFound(session_id.to_string()))?;

        if session.is_refresh_expired() {
            return Err(AppError::SessionExpired(session_id.to_string()));
        }
        Ok(session)
    }

    pub async fn user_sessions(&self, user_id: &str) -> AppResult<Vec<AuthSession>> {
        self.repository.find_by_user_id(user_id).await
    }

    /// 注销用户的全部会话，每个被删除的会话发布一次 `auth.session.deleted`
    pub async fn invalidate_all_user_sessions(&self, user_id: &str) -> AppResult<usize> {
        let removed = self.repository.delete_all_by_user_id(user_id).await?;
        let logout_at = Utc::now();
        let count = removed.len();

        for session in removed {
            self.emit(SessionWasDeleted {
                session: Arc::new(session),
                logout_at,
            })
            .await?;
        }
        Ok(count)
    }

    /// 清理刷新令牌已过期的会话（不发布事件）
    pub async fn clean_expired_sessions(&self) -> AppResult<usize> {
        let removed = self.repository.delete_expired(Utc::now()).await?;
        if removed > 0 {
            tracing::info!(removed, "expired sessions cleaned");
        }
        Ok(removed)
    }

    async fn emit<E: DomainEvent>(&self, event: E) -> AppResult<()> {
        if let Some(events) = &self.events {
            events.publish(Arc::new(event)).await?;
        }
        Ok(())
    }
}
