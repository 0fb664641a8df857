//! 服务端事件广播（ServerEventProvider）
//!
//! 客户端按 ID 订阅一个广播中心，`broadcast` 把消息推送给当前全部订阅者。
//! 这里只有进程内实现：`ChannelEventClient` 通过 `mpsc` 通道交付消息，
//! 具体传输（SSE 等）由持有接收端的一方负责。
//!
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

/// 推送给客户端的消息
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMessage {
    pub event: String,
    pub data: String,
}

impl EventMessage {
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
        }
    }
}

/// 广播的接收方
#[async_trait]
pub trait EventClient: Send + Sync {
    fn id(&self) -> &str;

    /// 连接建立后、首条消息之前调用
    async fn setup(&self) -> AppResult<()> {
        Ok(())
    }

    async fn send_message(&self, message: &EventMessage) -> AppResult<()>;

    /// 心跳
    async fn online(&self) -> AppResult<()> {
        Ok(())
    }
}

#[async_trait]
pub trait ServerEventProvider: Send + Sync {
    /// 同一 ID 重复订阅返回 `ClientAlreadySubscribed`
    fn subscribe(&self, client: Arc<dyn EventClient>) -> AppResult<()>;

    /// 未订阅的 ID 返回 `ClientNotSubscribed`
    fn unsubscribe(&self, client_id: &str) -> AppResult<()>;

    /// 推送给全部订阅者；个别客户端失败不影响其余客户端，返回第一个错误
    async fn broadcast(&self, message: &EventMessage) -> AppResult<()>;
}

/// 进程内广播中心
pub struct InMemoryServerEvents {
    event_id: String,
    clients: DashMap<String, Arc<dyn EventClient>>,
}

impl InMemoryServerEvents {
    pub fn new(event_id: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            clients: DashMap::new(),
        }
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }
}

#[async_trait]
impl ServerEventProvider for InMemoryServerEvents {
    fn subscribe(&self, client: Arc<dyn EventClient>) -> AppResult<()> {
        match self.clients.entry(client.id().to_string()) {
            Entry::Occupied(slot) => Err(AppError::ClientAlreadySubscribed(slot.key().clone())),
            Entry::Vacant(slot) => {
                tracing::debug!(
                    event_id = %self.event_id,
                    client = %slot.key(),
                    "client subscribed"
                );
                slot.insert(client);
                Ok(())
            }
        }
    }

    fn unsubscribe(&self, client_id: &str) -> AppResult<()> {
        match self.clients.remove(client_id) {
            Some(_) => Ok(()),
            None => Err(AppError::ClientNotSubscribed(client_id.to_string())),
        }
    }

    async fn broadcast(&self, message: &EventMessage) -> AppResult<()> {
        // 先取快照，发送期间不持有分片锁
        let clients: Vec<Arc<dyn EventClient>> =
            self.clients.iter().map(|c| Arc::clone(c.value())).collect();

        let mut first_error = None;
        for client in clients {
            if let Err(err) = client.send_message(message).await {
                tracing::warn!(
                    event_id = %self.event_id,
                    client = client.id(),
                    error = %err,
                    "server event delivery failed"
                );
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// 以 `mpsc` 通道交付消息的客户端
pub struct ChannelEventClient {
    id: String,
    sender: mpsc::Sender<EventMessage>,
}

impl ChannelEventClient {
    /// 返回客户端与对应的接收端；接收端被丢弃后发送返回 `ClientDisconnected`
    pub fn new(id: impl Into<String>, capacity: usize) -> (Self, mpsc::Receiver<EventMessage>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let client = Self {
            id: id.into(),
            sender,
        };
        (client, receiver)
    }
}

#[async_trait]
impl EventClient for ChannelEventClient {
    fn id(&self) -> &str {
        &self.id
    }

    async fn send_message(&self, message: &EventMessage) -> AppResult<()> {
        self.sender
            .send(message.clone())
            .await
            .map_err(|_| AppError::ClientDisconnected(self.id.clone()))
    }
}
