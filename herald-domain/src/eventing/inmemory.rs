//! 内存版领域事件分发器（InMemoryDomainEventsProvider）
//!
//! - 有界 `mpsc` 队列承载待分发事件，固定数量的 worker 共享同一接收端；
//! - 同步监听器在 `publish` 内按注册顺序执行，异步监听器在 `dispatch` 中逐个独立调度；
//! - 队列满时由后台任务阻塞等待入队并记录告警，调用方从不阻塞；
//! - 监听器的错误与 panic 均被隔离并记录到注入的 `LogProvider`；
//! - `close` 可重复调用：取消 worker，等待进行中的监听器与后台入队任务退出，丢弃队列积压。
//!
use super::registry::SubscriberRegistry;
use super::{
    Delivery, DomainEventsProvider, EventListener, InMemoryDispatcherConfig, ListenerContext,
};
use crate::ProviderHub;
use crate::domain_event::DomainEvent;
use crate::error::DomainResult;
use crate::logging::LogProvider;
use async_trait::async_trait;
use futures_util::FutureExt;
use serde_json::json;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use tokio::runtime::Handle;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, RwLock, mpsc};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

type QueuedEvent = Arc<dyn DomainEvent>;

/// 分发器生命周期状态
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LifecycleState {
    Constructed = 0,
    Collecting = 1,
    Closing = 2,
    Closed = 3,
}

impl LifecycleState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Constructed,
            1 => Self::Collecting,
            2 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

/// 有界队列 + worker 池的内存分发器；克隆共享同一实例
#[derive(Clone)]
pub struct InMemoryDomainEventsProvider {
    inner: Arc<Inner>,
}

struct Inner {
    config: InMemoryDispatcherConfig,
    sender: mpsc::Sender<QueuedEvent>,
    receiver: Mutex<mpsc::Receiver<QueuedEvent>>,
    subscribers: RwLock<SubscriberRegistry>,
    token: CancellationToken,
    workers: TaskTracker,
    tasks: TaskTracker,
    state: AtomicU8,
    overflow: AtomicUsize,
    hub: Arc<ProviderHub>,
    logger: Arc<dyn LogProvider>,
}

impl InMemoryDomainEventsProvider {
    /// 从 hub 解析 `dyn LogProvider` 作为日志协作者
    pub fn new(config: InMemoryDispatcherConfig, hub: Arc<ProviderHub>) -> DomainResult<Self> {
        let logger = hub.get::<dyn LogProvider>()?;
        Self::with_logger(config, hub, logger)
    }

    pub fn with_logger(
        config: InMemoryDispatcherConfig,
        hub: Arc<ProviderHub>,
        logger: Arc<dyn LogProvider>,
    ) -> DomainResult<Self> {
        config.validate()?;
        let (sender, receiver) = mpsc::channel(config.buffer_size);

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                sender,
                receiver: Mutex::new(receiver),
                subscribers: RwLock::new(SubscriberRegistry::default()),
                token: CancellationToken::new(),
                workers: TaskTracker::new(),
                tasks: TaskTracker::new(),
                state: AtomicU8::new(LifecycleState::Constructed as u8),
                overflow: AtomicUsize::new(0),
                hub,
                logger,
            }),
        })
    }

    pub fn config(&self) -> InMemoryDispatcherConfig {
        self.inner.config
    }

    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.inner.state.load(Ordering::Acquire))
    }

    /// 队列中等待分发的事件数
    pub fn queued(&self) -> usize {
        self.inner.config.buffer_size - self.inner.sender.capacity()
    }

    /// 仍在等待入队的后台任务数
    pub fn pending_overflow(&self) -> usize {
        self.inner.overflow.load(Ordering::Acquire)
    }

    /// 指定事件名的 (同步, 异步) 监听器数量
    pub async fn listener_count(&self, event_name: &str) -> (usize, usize) {
        let registry = self.inner.subscribers.read().await;
        (
            registry.count(Delivery::Sync, event_name),
            registry.count(Delivery::Async, event_name),
        )
    }
}

impl Inner {
    fn set_state(&self, state: LifecycleState) {
        self.state.store(state as u8, Ordering::Release);
    }

    async fn run_worker(self: Arc<Self>, worker: usize) {
        loop {
            let next = tokio::select! {
                biased;
                _ = self.token.cancelled() => None,
                event = async { self.receiver.lock().await.recv().await } => event,
            };
            let Some(event) = next else { break };
            self.fan_out(event).await;
        }
        self.logger
            .info("collect worker stopped", json!({ "worker": worker }));
    }

    async fn fan_out(self: &Arc<Self>, event: QueuedEvent) {
        let listeners = self
            .subscribers
            .read()
            .await
            .listeners(Delivery::Async, event.name());

        // 关闭开始后不再调度新的监听器
        if self.token.is_cancelled() {
            self.logger.debug(
                "dispatch skipped while closing",
                json!({ "event": event.name() }),
            );
            return;
        }

        for listener in listeners {
            let inner = Arc::clone(self);
            let event = Arc::clone(&event);
            self.tasks.spawn(async move {
                inner.invoke(&listener, &event, Delivery::Async).await;
            });
        }
    }

    fn defer_enqueue(self: &Arc<Self>, event: QueuedEvent) {
        let pending = self.overflow.fetch_add(1, Ordering::AcqRel) + 1;
        self.logger.warning(
            "queue is full waiting for a slot",
            json!({
                "event": event.name(),
                "occurred_at": event.occurred_at().to_rfc3339(),
                "capacity": self.config.buffer_size,
                "pending": pending,
            }),
        );

        let inner = Arc::clone(self);
        self.tasks.spawn(async move {
            let name = event.name().to_string();
            tokio::select! {
                biased;
                _ = inner.token.cancelled() => {
                    inner.logger.debug("overflow enqueue abandoned", json!({ "event": name }));
                }
                _ = inner.sender.send(event) => {}
            }
            inner.overflow.fetch_sub(1, Ordering::AcqRel);
        });
    }

    async fn invoke(
        &self,
        listener: &Arc<dyn EventListener>,
        event: &QueuedEvent,
        delivery: Delivery,
    ) {
        let ctx = ListenerContext::new(delivery, self.token.child_token());
        let outcome = AssertUnwindSafe(listener.handle(&ctx, event.as_ref(), &self.hub))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => self.logger.error(
                "error dispatching event for handler",
                json!({
                    "event": event.name(),
                    "handler": listener.listener_name(),
                    "delivery": delivery.as_str(),
                    "error": format!("{err:#}"),
                }),
            ),
            Err(payload) => self.logger.error(
                "listener panicked",
                json!({
                    "event": event.name(),
                    "handler": listener.listener_name(),
                    "delivery": delivery.as_str(),
                    "panic": panic_message(payload.as_ref()),
                }),
            ),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[async_trait]
impl DomainEventsProvider for InMemoryDomainEventsProvider {
    fn collect(&self) {
        let Ok(runtime) = Handle::try_current() else {
            self.inner
                .logger
                .error("collect requires a tokio runtime", json!({}));
            return;
        };

        let started = self.inner.state.compare_exchange(
            LifecycleState::Constructed as u8,
            LifecycleState::Collecting as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        if let Err(current) = started {
            self.inner.logger.warning(
                "collect ignored",
                json!({ "state": format!("{:?}", LifecycleState::from_u8(current)) }),
            );
            return;
        }

        for worker in 0..self.inner.config.workers {
            let inner = Arc::clone(&self.inner);
            self.inner
                .workers
                .spawn_on(inner.run_worker(worker), &runtime);
        }
    }

    async fn subscribe(&self, listener: Arc<dyn EventListener>) -> DomainResult<()> {
        self.inner.logger.debug(
            "subscribing to event",
            json!({
                "event": listener.event_name(),
                "handler": listener.listener_name(),
                "delivery": listener.delivery().as_str(),
            }),
        );
        self.inner.subscribers.write().await.insert(listener);
        Ok(())
    }

    async fn publish(&self, event: Arc<dyn DomainEvent>) -> DomainResult<()> {
        let listeners = self
            .inner
            .subscribers
            .read()
            .await
            .listeners(Delivery::Sync, event.name());

        for listener in &listeners {
            self.inner.invoke(listener, &event, Delivery::Sync).await;
        }

        match self.inner.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => self.inner.defer_enqueue(event),
            // 接收端由 Inner 持有，通道不会先于分发器关闭
            Err(TrySendError::Closed(_)) => {}
        }
        Ok(())
    }

    async fn dispatch(&self, event: Arc<dyn DomainEvent>) -> DomainResult<()> {
        self.inner.fan_out(event).await;
        Ok(())
    }

    async fn close(&self) -> DomainResult<()> {
        let _ = self
            .inner
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |s| {
                (s < LifecycleState::Closing as u8).then_some(LifecycleState::Closing as u8)
            });

        self.inner.token.cancel();
        self.inner.workers.close();
        self.inner.workers.wait().await;
        self.inner.tasks.close();
        self.inner.tasks.wait().await;

        self.inner.set_state(LifecycleState::Closed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_event::Timestamp;
    use crate::error::DomainError;
    use crate::logging::{LogLevel, MemoryLogProvider};
    use chrono::Utc;
    use herald_macros::DomainEvent;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;
    use tokio::sync::Notify;

    #[derive(Debug, DomainEvent)]
    #[event(name = "x")]
    struct Ping {
        seq: usize,
        occurred_at: Timestamp,
    }

    #[derive(Debug, DomainEvent)]
    #[event(name = "y")]
    struct Pong {
        occurred_at: Timestamp,
    }

    fn ping(seq: usize) -> Arc<dyn DomainEvent> {
        Arc::new(Ping {
            seq,
            occurred_at: Utc::now(),
        })
    }

    fn pong() -> Arc<dyn DomainEvent> {
        Arc::new(Pong {
            occurred_at: Utc::now(),
        })
    }

    #[derive(Clone, Copy)]
    enum Behaviour {
        Ok,
        Fail,
        Panic,
    }

    /// 记录调用顺序与次数的监听器
    struct Recorder {
        label: &'static str,
        event: &'static str,
        is_async: bool,
        behaviour: Behaviour,
        calls: Arc<AtomicUsize>,
        journal: Arc<StdMutex<Vec<&'static str>>>,
        gate: Option<Arc<Notify>>,
    }

    impl Recorder {
        fn new(label: &'static str, event: &'static str, is_async: bool) -> Self {
            Self {
                label,
                event,
                is_async,
                behaviour: Behaviour::Ok,
                calls: Arc::new(AtomicUsize::new(0)),
                journal: Arc::new(StdMutex::new(Vec::new())),
                gate: None,
            }
        }

        fn behaviour(mut self, behaviour: Behaviour) -> Self {
            self.behaviour = behaviour;
            self
        }

        fn journal(mut self, journal: &Arc<StdMutex<Vec<&'static str>>>) -> Self {
            self.journal = journal.clone();
            self
        }

        fn gate(mut self, gate: &Arc<Notify>) -> Self {
            self.gate = Some(gate.clone());
            self
        }

        fn calls(&self) -> Arc<AtomicUsize> {
            self.calls.clone()
        }
    }

    #[async_trait]
    impl EventListener for Recorder {
        fn event_name(&self) -> &str {
            self.event
        }
        fn is_async(&self) -> bool {
            self.is_async
        }
        fn listener_name(&self) -> &str {
            self.label
        }
        async fn handle(
            &self,
            _ctx: &ListenerContext,
            _event: &dyn DomainEvent,
            _hub: &ProviderHub,
        ) -> anyhow::Result<()> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.journal.lock().unwrap().push(self.label);
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                Behaviour::Ok => Ok(()),
                Behaviour::Fail => anyhow::bail!("{} failed", self.label),
                Behaviour::Panic => panic!("{} exploded", self.label),
            }
        }
    }

    fn setup(
        buffer_size: usize,
        workers: usize,
    ) -> (InMemoryDomainEventsProvider, Arc<MemoryLogProvider>) {
        let hub = Arc::new(ProviderHub::new());
        let logger = Arc::new(MemoryLogProvider::new(LogLevel::Debug));
        hub.register::<dyn LogProvider>(logger.clone());
        let provider = InMemoryDomainEventsProvider::new(
            InMemoryDispatcherConfig::new(buffer_size, workers),
            hub,
        )
        .unwrap();
        (provider, logger)
    }

    async fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
        tokio::time::timeout(Duration::from_secs(2), async {
            while !cond() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .is_ok()
    }

    #[tokio::test]
    async fn sync_listener_runs_before_publish_returns() {
        let (provider, _) = setup(10, 1);
        let listener = Recorder::new("sync", "x", false);
        let calls = listener.calls();
        provider.subscribe(Arc::new(listener)).await.unwrap();

        for expected in 1..=5 {
            provider.publish(ping(expected)).await.unwrap();
            assert_eq!(calls.load(Ordering::SeqCst), expected);
        }
    }

    #[tokio::test]
    async fn sync_listeners_run_in_registration_order() {
        let (provider, _) = setup(10, 1);
        let journal = Arc::new(StdMutex::new(Vec::new()));
        for label in ["l1", "l2", "l3", "l4"] {
            let listener = Recorder::new(label, "x", false).journal(&journal);
            provider.subscribe(Arc::new(listener)).await.unwrap();
        }

        provider.publish(ping(1)).await.unwrap();
        assert_eq!(*journal.lock().unwrap(), vec!["l1", "l2", "l3", "l4"]);
    }

    #[tokio::test]
    async fn failing_sync_listener_does_not_skip_the_next() {
        let (provider, logger) = setup(10, 1);
        let failing = Recorder::new("failing", "x", false).behaviour(Behaviour::Fail);
        let second = Recorder::new("second", "x", false);
        let calls = second.calls();
        provider.subscribe(Arc::new(failing)).await.unwrap();
        provider.subscribe(Arc::new(second)).await.unwrap();

        assert!(provider.publish(ping(1)).await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let errors = logger.find(LogLevel::Error, "error dispatching event for handler");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].data["handler"], "failing");
        assert_eq!(errors[0].data["event"], "x");
        assert_eq!(errors[0].data["delivery"], "sync");
        assert_eq!(errors[0].data["error"], "failing failed");
    }

    #[tokio::test]
    async fn panicking_listeners_are_contained() {
        let (provider, logger) = setup(10, 1);
        provider
            .subscribe(Arc::new(
                Recorder::new("sync-boom", "x", false).behaviour(Behaviour::Panic),
            ))
            .await
            .unwrap();
        provider
            .subscribe(Arc::new(
                Recorder::new("async-boom", "x", true).behaviour(Behaviour::Panic),
            ))
            .await
            .unwrap();
        let survivor = Recorder::new("survivor", "x", false);
        let calls = survivor.calls();
        provider.subscribe(Arc::new(survivor)).await.unwrap();
        provider.collect();

        provider.publish(ping(1)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let both_logged = || logger.find(LogLevel::Error, "listener panicked").len() == 2;
        assert!(wait_until(both_logged).await);
        provider.close().await.unwrap();

        let panics = logger.find(LogLevel::Error, "listener panicked");
        assert_eq!(panics[0].data["panic"], "sync-boom exploded");
        assert_eq!(panics[0].data["delivery"], "sync");
        assert_eq!(panics[1].data["delivery"], "async");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn async_listeners_are_invoked_once_per_publish() {
        let (provider, _) = setup(10, 4);
        let first = Recorder::new("first", "x", true);
        let second = Recorder::new("second", "x", true);
        let (a, b) = (first.calls(), second.calls());
        provider.subscribe(Arc::new(first)).await.unwrap();
        provider.subscribe(Arc::new(second)).await.unwrap();
        provider.collect();
        assert_eq!(provider.state(), LifecycleState::Collecting);

        for seq in 0..3 {
            provider.publish(ping(seq)).await.unwrap();
        }

        let both_done = || a.load(Ordering::SeqCst) == 3 && b.load(Ordering::SeqCst) == 3;
        assert!(wait_until(both_done).await);
        provider.close().await.unwrap();
        assert_eq!(a.load(Ordering::SeqCst), 3);
        assert_eq!(b.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn publish_does_not_wait_for_async_listeners() {
        let (provider, _) = setup(16, 2);
        let gate = Arc::new(Notify::new());
        let listener = Recorder::new("blocked", "x", true).gate(&gate);
        let calls = listener.calls();
        provider.subscribe(Arc::new(listener)).await.unwrap();
        provider.collect();

        let publishers: Vec<_> = (0..8)
            .map(|seq| {
                let provider = provider.clone();
                tokio::spawn(async move { provider.publish(ping(seq)).await })
            })
            .collect();

        let all_returned = tokio::time::timeout(Duration::from_secs(1), async {
            for handle in publishers {
                handle.await.unwrap().unwrap();
            }
        })
        .await;
        assert!(all_returned.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let _ = wait_until(|| {
            gate.notify_waiters();
            calls.load(Ordering::SeqCst) == 8
        })
        .await;
        provider.close().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 8);
    }

    #[tokio::test]
    async fn overflow_publish_returns_and_event_is_not_dropped() {
        let (provider, logger) = setup(1, 1);
        let listener = Recorder::new("counter", "x", true);
        let calls = listener.calls();
        provider.subscribe(Arc::new(listener)).await.unwrap();

        let published = tokio::time::timeout(Duration::from_millis(500), async {
            for seq in 0..3 {
                provider.publish(ping(seq)).await.unwrap();
            }
        })
        .await;
        assert!(published.is_ok());
        assert_eq!(provider.queued(), 1);
        assert_eq!(provider.pending_overflow(), 2);

        let warnings = logger.find(LogLevel::Warning, "queue is full waiting for a slot");
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[1].data["pending"], 2);
        assert_eq!(warnings[1].data["capacity"], 1);

        provider.collect();
        assert!(wait_until(|| calls.load(Ordering::SeqCst) == 3).await);
        assert_eq!(provider.pending_overflow(), 0);
        provider.close().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn bounded_count_with_small_queue() {
        let (provider, _) = setup(2, 1);
        let listener = Recorder::new("count", "x", true);
        let count = listener.calls();
        provider.subscribe(Arc::new(listener)).await.unwrap();
        provider.collect();

        for seq in 0..3 {
            provider.publish(ping(seq)).await.unwrap();
        }
        assert!(wait_until(|| count.load(Ordering::SeqCst) >= 2).await);
        provider.close().await.unwrap();

        let observed = count.load(Ordering::SeqCst);
        assert!((2..=3).contains(&observed), "observed {observed}");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn close_waits_for_in_flight_handlers() {
        struct Slow {
            started: Arc<AtomicUsize>,
            finished: Arc<AtomicUsize>,
        }

        #[async_trait]
        impl EventListener for Slow {
            fn event_name(&self) -> &str {
                "x"
            }
            fn is_async(&self) -> bool {
                true
            }
            async fn handle(
                &self,
                _ctx: &ListenerContext,
                _event: &dyn DomainEvent,
                _hub: &ProviderHub,
            ) -> anyhow::Result<()> {
                self.started.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(200)).await;
                self.finished.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }

        let (provider, _) = setup(4, 1);
        let started = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicUsize::new(0));
        provider
            .subscribe(Arc::new(Slow {
                started: started.clone(),
                finished: finished.clone(),
            }))
            .await
            .unwrap();
        provider.collect();
        provider.publish(ping(1)).await.unwrap();

        assert!(wait_until(|| started.load(Ordering::SeqCst) == 1).await);
        provider.close().await.unwrap();
        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert_eq!(provider.state(), LifecycleState::Closed);
    }

    #[tokio::test]
    async fn listener_observes_cancellation_on_close() {
        struct Cooperative {
            cancelled: Arc<AtomicUsize>,
        }

        #[async_trait]
        impl EventListener for Cooperative {
            fn event_name(&self) -> &str {
                "x"
            }
            fn is_async(&self) -> bool {
                true
            }
            async fn handle(
                &self,
                ctx: &ListenerContext,
                _event: &dyn DomainEvent,
                _hub: &ProviderHub,
            ) -> anyhow::Result<()> {
                assert_eq!(ctx.delivery(), Delivery::Async);
                ctx.cancellation().cancelled().await;
                self.cancelled.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }

        let (provider, _) = setup(4, 1);
        let cancelled = Arc::new(AtomicUsize::new(0));
        provider
            .subscribe(Arc::new(Cooperative {
                cancelled: cancelled.clone(),
            }))
            .await
            .unwrap();
        provider.collect();
        provider.publish(ping(1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        tokio::time::timeout(Duration::from_secs(1), provider.close())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cancelled.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn close_discards_queued_backlog() {
        let (provider, logger) = setup(4, 2);
        let listener = Recorder::new("never", "x", true);
        let calls = listener.calls();
        provider.subscribe(Arc::new(listener)).await.unwrap();

        for seq in 0..6 {
            provider.publish(ping(seq)).await.unwrap();
        }
        assert_eq!(provider.queued(), 4);
        assert_eq!(provider.pending_overflow(), 2);

        provider.close().await.unwrap();
        assert_eq!(provider.pending_overflow(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let abandoned = logger.find(LogLevel::Debug, "overflow enqueue abandoned");
        assert_eq!(abandoned.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn dispatch_racing_close_starts_no_listener() {
        let (provider, logger) = setup(4, 1);
        let listener = Recorder::new("late", "x", true);
        let calls = listener.calls();
        provider.subscribe(Arc::new(listener)).await.unwrap();

        // 持有写锁，使分发停在读取监听器之前
        let registry = provider.inner.subscribers.write().await;
        let pending = {
            let provider = provider.clone();
            tokio::spawn(async move { provider.dispatch(ping(1)).await })
        };
        provider.close().await.unwrap();
        drop(registry);
        pending.await.unwrap().unwrap();

        assert_eq!(provider.state(), LifecycleState::Closed);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let skipped = logger.find(LogLevel::Debug, "dispatch skipped while closing");
        assert_eq!(skipped.len(), 1);
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let (provider, logger) = setup(4, 3);
        provider.collect();
        provider.close().await.unwrap();
        provider.close().await.unwrap();

        assert_eq!(provider.state(), LifecycleState::Closed);
        let stopped = logger.find(LogLevel::Info, "collect worker stopped");
        assert_eq!(stopped.len(), 3);
    }

    #[tokio::test]
    async fn collect_after_close_is_ignored() {
        let (provider, logger) = setup(4, 2);
        provider.close().await.unwrap();
        provider.collect();
        provider.collect();

        assert_eq!(provider.state(), LifecycleState::Closed);
        assert_eq!(logger.find(LogLevel::Warning, "collect ignored").len(), 2);
        let stopped = logger.find(LogLevel::Info, "collect worker stopped");
        assert!(stopped.is_empty());
    }

    #[tokio::test]
    async fn publish_after_close_runs_sync_listeners_only() {
        let (provider, _) = setup(4, 1);
        let sync = Recorder::new("sync", "x", false);
        let deferred = Recorder::new("async", "x", true);
        let (s, a) = (sync.calls(), deferred.calls());
        provider.subscribe(Arc::new(sync)).await.unwrap();
        provider.subscribe(Arc::new(deferred)).await.unwrap();
        provider.collect();
        provider.close().await.unwrap();

        assert!(provider.publish(ping(1)).await.is_ok());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(s.load(Ordering::SeqCst), 1);
        assert_eq!(a.load(Ordering::SeqCst), 0);
        assert_eq!(provider.queued(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn subscribe_after_collect_is_picked_up() {
        let (provider, _) = setup(4, 2);
        provider.collect();

        let late = Recorder::new("late", "x", true);
        let calls = late.calls();
        provider.subscribe(Arc::new(late)).await.unwrap();
        provider.publish(ping(1)).await.unwrap();

        assert!(wait_until(|| calls.load(Ordering::SeqCst) == 1).await);
        provider.close().await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_subscription_fires_twice() {
        let (provider, _) = setup(4, 1);
        let recorder = Recorder::new("dup", "x", false);
        let calls = recorder.calls();
        let listener: Arc<dyn EventListener> = Arc::new(recorder);
        provider.subscribe(listener.clone()).await.unwrap();
        provider.subscribe(listener).await.unwrap();

        provider.publish(ping(1)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(provider.listener_count("x").await, (2, 0));
    }

    #[tokio::test]
    async fn direct_dispatch_only_reaches_async_listeners_of_that_name() {
        let (provider, _) = setup(4, 1);
        let sync = Recorder::new("sync", "x", false);
        let other = Recorder::new("other", "y", true);
        let target = Recorder::new("target", "x", true);
        let (s, o, t) = (sync.calls(), other.calls(), target.calls());
        for listener in [sync, other, target] {
            provider.subscribe(Arc::new(listener)).await.unwrap();
        }

        provider.dispatch(ping(1)).await.unwrap();
        assert!(wait_until(|| t.load(Ordering::SeqCst) == 1).await);
        provider.close().await.unwrap();
        assert_eq!(s.load(Ordering::SeqCst), 0);
        assert_eq!(o.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn listeners_may_publish_through_the_hub() {
        struct Relay;

        #[async_trait]
        impl EventListener for Relay {
            fn event_name(&self) -> &str {
                "x"
            }
            fn is_async(&self) -> bool {
                true
            }
            async fn handle(
                &self,
                _ctx: &ListenerContext,
                event: &dyn DomainEvent,
                hub: &ProviderHub,
            ) -> anyhow::Result<()> {
                let ping = event
                    .downcast_ref::<Ping>()
                    .ok_or_else(|| anyhow::anyhow!("unexpected event"))?;
                assert_eq!(ping.seq, 7);
                hub.get::<dyn DomainEventsProvider>()?.publish(pong()).await?;
                Ok(())
            }
        }

        let hub = Arc::new(ProviderHub::new());
        hub.register::<dyn LogProvider>(Arc::new(MemoryLogProvider::default()));
        let provider = InMemoryDomainEventsProvider::new(
            InMemoryDispatcherConfig::new(4, 2),
            hub.clone(),
        )
        .unwrap();
        hub.register::<dyn DomainEventsProvider>(Arc::new(provider.clone()));

        let downstream = Recorder::new("downstream", "y", true);
        let calls = downstream.calls();
        provider.subscribe(Arc::new(Relay)).await.unwrap();
        provider.subscribe(Arc::new(downstream)).await.unwrap();
        provider.collect();

        provider.publish(ping(7)).await.unwrap();
        assert!(wait_until(|| calls.load(Ordering::SeqCst) == 1).await);
        provider.close().await.unwrap();
    }

    #[test]
    fn construction_errors() {
        let hub = Arc::new(ProviderHub::new());
        let missing =
            InMemoryDomainEventsProvider::new(InMemoryDispatcherConfig::default(), hub.clone());
        assert!(matches!(missing, Err(DomainError::ProviderNotFound { .. })));

        let invalid = InMemoryDomainEventsProvider::with_logger(
            InMemoryDispatcherConfig::new(0, 1),
            hub,
            Arc::new(MemoryLogProvider::default()),
        );
        assert!(matches!(invalid, Err(DomainError::InvalidConfig { .. })));
    }

    #[test]
    fn collect_outside_runtime_is_reported() {
        let hub = Arc::new(ProviderHub::new());
        let logger = Arc::new(MemoryLogProvider::default());
        let provider = InMemoryDomainEventsProvider::with_logger(
            InMemoryDispatcherConfig::default(),
            hub,
            logger.clone(),
        )
        .unwrap();

        provider.collect();
        assert_eq!(provider.state(), LifecycleState::Constructed);
        let reported = logger.find(LogLevel::Error, "collect requires a tokio runtime");
        assert_eq!(reported.len(), 1);
    }
}
