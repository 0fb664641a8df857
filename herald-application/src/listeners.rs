//! 参考监听器
//!
//! - `SessionAuditListener`：异步监听会话事件，从 hub 解析 `dyn LogProvider` 写入审计记录；
//!   一个实例只监听一个事件名，`SessionAuditListener::all()` 返回全部实例。
//! - `ServerEventRelay`：把领域事件转发为服务端事件广播。
//!
use crate::server_events::{EventMessage, ServerEventProvider};
use crate::session::{AuthSession, SessionWasCreated, SessionWasDeleted};
use async_trait::async_trait;
use herald_domain::ProviderHub;
use herald_domain::domain_event::DomainEvent;
use herald_domain::eventing::{EventListener, ListenerContext};
use herald_domain::logging::LogProvider;
use serde_json::json;
use std::sync::Arc;

pub const SESSION_CREATED: &str = "auth.session.created";
pub const SESSION_DELETED: &str = "auth.session.deleted";

pub struct SessionAuditListener {
    event_name: &'static str,
}

impl SessionAuditListener {
    pub fn created() -> Self {
        Self {
            event_name: SESSION_CREATED,
        }
    }

    pub fn deleted() -> Self {
        Self {
            event_name: SESSION_DELETED,
        }
    }

    pub fn all() -> Vec<Arc<dyn EventListener>> {
        vec![Arc::new(Self::created()), Arc::new(Self::deleted())]
    }
}

#[async_trait]
impl EventListener for SessionAuditListener {
    fn event_name(&self) -> &str {
        self.event_name
    }

    fn is_async(&self) -> bool {
        true
    }

    fn listener_name(&self) -> &str {
        "session-audit"
    }

    async fn handle(
        &self,
        _ctx: &ListenerContext,
        event: &dyn DomainEvent,
        hub: &ProviderHub,
    ) -> anyhow::Result<()> {
        let logger = hub.get::<dyn LogProvider>()?;

        let Some((session, action)) = session_of(event) else {
            anyhow::bail!("unsupported event for session audit: {}", event.name());
        };

        logger.info(
            "session audit",
            json!({
                "action": action,
                "event": event.name(),
                "session_id": session.session_id,
                "user_id": session.user_id,
                "ip_address": session.ip_address,
                "occurred_at": event.occurred_at().to_rfc3339(),
            }),
        );
        Ok(())
    }
}

fn session_of(event: &dyn DomainEvent) -> Option<(&AuthSession, &'static str)> {
    if let Some(created) = event.downcast_ref::<SessionWasCreated>() {
        Some((created.session.as_ref(), "opened"))
    } else {
        event
            .downcast_ref::<SessionWasDeleted>()
            .map(|deleted| (deleted.session.as_ref(), "closed"))
    }
}

/// 异步监听器：把事件广播给 hub 中的 `dyn ServerEventProvider`
///
/// 消息的 `event` 为领域事件名，`data` 为 JSON 文本；会话事件附带会话与用户 ID。
pub struct ServerEventRelay {
    event_name: String,
}

impl ServerEventRelay {
    pub fn new(event_name: impl Into<String>) -> Self {
        Self {
            event_name: event_name.into(),
        }
    }

    pub fn sessions() -> Vec<Arc<dyn EventListener>> {
        vec![
            Arc::new(Self::new(SESSION_CREATED)),
            Arc::new(Self::new(SESSION_DELETED)),
        ]
    }
}

#[async_trait]
impl EventListener for ServerEventRelay {
    fn event_name(&self) -> &str {
        &self.event_name
    }

    fn is_async(&self) -> bool {
        true
    }

    fn listener_name(&self) -> &str {
        "server-event-relay"
    }

    async fn handle(
        &self,
        _ctx: &ListenerContext,
        event: &dyn DomainEvent,
        hub: &ProviderHub,
    ) -> anyhow::Result<()> {
        let server_events = hub.get::<dyn ServerEventProvider>()?;

        let mut data = json!({ "occurred_at": event.occurred_at().to_rfc3339() });
        if let Some((session, _)) = session_of(event) {
            data["session_id"] = json!(session.session_id);
            data["user_id"] = json!(session.user_id);
        }

        let message = EventMessage::new(event.name(), data.to_string());
        server_events.broadcast(&message).await?;
        Ok(())
    }
}
