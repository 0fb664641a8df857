use anyhow::Result as AnyResult;
use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use herald_application::listeners::{ServerEventRelay, SessionAuditListener};
use herald_application::providers::{
    ConfigProviderFactory, DomainEventFactory, LoggerProviderFactory, ProviderHubFactory,
    ServerEventFactory,
};
use herald_application::server_events::{ChannelEventClient, ServerEventProvider};
use herald_application::session::{
    InMemorySessionRepository, OpenSession, SessionRepository, SessionService, SessionWasCreated,
};
use herald_application::telemetry::init_tracing;
use herald_application::{ConfigLoader, HeraldConfig};
use herald_domain::ProviderHub;
use herald_domain::domain_event::DomainEvent;
use herald_domain::eventing::{DomainEventsProvider, EventListener, ListenerContext};
use std::sync::Arc;
use std::time::Duration;

/// 同步监听器：通过 hub 解析仓储，输出用户当前的会话数
struct ActiveSessions;

#[async_trait]
impl EventListener for ActiveSessions {
    fn event_name(&self) -> &str {
        "auth.session.created"
    }

    fn is_async(&self) -> bool {
        false
    }

    async fn handle(
        &self,
        _ctx: &ListenerContext,
        event: &dyn DomainEvent,
        hub: &ProviderHub,
    ) -> AnyResult<()> {
        let Some(created) = event.downcast_ref::<SessionWasCreated>() else {
            return Ok(());
        };
        let repository = hub.get::<dyn SessionRepository>()?;
        let active = repository.find_by_user_id(&created.session.user_id).await?;
        println!(
            "user {} now has {} active session(s)",
            created.session.username,
            active.len()
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() -> AnyResult<()> {
    let loader = ConfigLoader::new();
    let level = loader.load()?.logging.level();
    if let Err(err) = init_tracing(level) {
        eprintln!("tracing already initialised: {err}");
    }

    // 配置 -> 日志 -> 服务端事件 -> 事件分发器（注册后立即启动 worker 池）
    let hub = ProviderHubFactory::new().create(vec![
        Box::new(ConfigProviderFactory::new(loader)),
        Box::new(LoggerProviderFactory::new()),
        Box::new(ServerEventFactory::new("sessions")),
        Box::new(DomainEventFactory::new()),
    ])?;
    let repository =
        hub.register::<dyn SessionRepository>(Arc::new(InMemorySessionRepository::new()));
    tracing::info!(providers = ?hub.registered(), "hub ready");

    let events = hub.get::<dyn DomainEventsProvider>()?;
    events.subscribe(Arc::new(ActiveSessions)).await?;
    for listener in SessionAuditListener::all() {
        events.subscribe(listener).await?;
    }
    for relay in ServerEventRelay::sessions() {
        events.subscribe(relay).await?;
    }

    let (client, mut inbox) = ChannelEventClient::new("console", 16);
    let server_events = hub.get::<dyn ServerEventProvider>()?;
    server_events.subscribe(Arc::new(client))?;
    let printer = tokio::spawn(async move {
        while let Some(message) = inbox.recv().await {
            println!("server event {}: {}", message.event, message.data);
        }
    });

    let config = hub.get::<HeraldConfig>()?;
    let service = SessionService::new(repository, Some(events.clone()), &config.session);

    let mut opened = Vec::new();
    for (user, agent) in [("u-1", "firefox"), ("u-1", "curl"), ("u-2", "safari")] {
        let cmd = OpenSession::builder()
            .user_id(user)
            .username(format!("{user}-name"))
            .access_token(format!("access-{agent}"))
            .refresh_token(format!("refresh-{agent}"))
            .expires_at(Utc::now() + TimeDelta::hours(1))
            .user_agent(agent)
            .ip_address("127.0.0.1")
            .build();
        opened.push(service.open_session(cmd).await?);
    }
    println!("opened {} sessions", opened.len());

    service.invalidate_session(&opened[2].session_id).await?;
    let closed = service.invalidate_all_user_sessions("u-1").await?;
    println!("closed {} session(s) for u-1", closed);

    // close 只等待进行中的监听器，队列积压会被丢弃
    tokio::time::sleep(Duration::from_millis(100)).await;
    events.close().await?;
    println!("dispatcher closed");

    // 取消订阅后发送端被释放，打印任务随之结束
    server_events.unsubscribe("console")?;
    printer.await?;
    Ok(())
}
