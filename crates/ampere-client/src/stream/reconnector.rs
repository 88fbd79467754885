use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::StreamExt;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::errors::{ConfigurationError, StreamError};
use crate::stream::backoff::{Backoff, DEFAULT_MAX_DELAY, DEFAULT_MIN_DELAY};
use crate::stream::connector::{MessageStream, SseConnector, StreamConnector};
use crate::stream::url::UrlSource;
use crate::stream::visibility::VisibilitySignal;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubscribeOptions {
    /// Backoff floor, restored after every successful open.
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for SubscribeOptions {
    fn default() -> Self {
        Self {
            min_delay: DEFAULT_MIN_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl SubscribeOptions {
    pub fn max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }
}

pub type EventHandler<T> = Box<dyn FnMut(T) + Send>;
pub type OpenHandler = Box<dyn FnMut() + Send>;
pub type ErrorHandler = Box<dyn FnMut(&StreamError) + Send>;

/// Callbacks for one subscription. Only `on_event` is required.
pub struct StreamHandlers<T> {
    on_event: EventHandler<T>,
    on_open: Option<OpenHandler>,
    on_error: Option<ErrorHandler>,
}

impl<T> StreamHandlers<T> {
    pub fn new(on_event: impl FnMut(T) + Send + 'static) -> Self {
        Self {
            on_event: Box::new(on_event),
            on_open: None,
            on_error: None,
        }
    }

    pub fn on_open(mut self, on_open: impl FnMut() + Send + 'static) -> Self {
        self.on_open = Some(Box::new(on_open));
        self
    }

    pub fn on_error(mut self, on_error: impl FnMut(&StreamError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(on_error));
        self
    }
}

#[derive(Clone)]
pub struct StreamReconnector {
    connector: Arc<dyn StreamConnector>,
    visibility: VisibilitySignal,
}

impl StreamReconnector {
    pub fn new(connector: Arc<dyn StreamConnector>, visibility: VisibilitySignal) -> Self {
        Self {
            connector,
            visibility,
        }
    }

    /// Reconnector over the `text/event-stream` connector.
    pub fn sse(config: &ApiConfig, visibility: VisibilitySignal) -> Result<Self, ConfigurationError> {
        Ok(Self::new(Arc::new(SseConnector::new(config)?), visibility))
    }

    /// Start a subscription. Must be called inside a tokio runtime.
    ///
    /// The first connection opens immediately when the host is visible,
    /// otherwise once it becomes visible. Payloads that fail to decode as `T`
    /// are dropped and counted, never reported through `on_error`.
    pub fn subscribe<T, U>(
        &self,
        url: U,
        handlers: StreamHandlers<T>,
        options: SubscribeOptions,
    ) -> Subscription
    where
        T: DeserializeOwned + Send + 'static,
        U: UrlSource,
    {
        let state = Arc::new(SubscriptionState::new());
        let driver = Driver {
            url,
            handlers,
            connector: Arc::clone(&self.connector),
            visibility: self.visibility.clone(),
            backoff: Backoff::new(options.min_delay, options.max_delay),
            state: Arc::clone(&state),
        };
        tracing::debug!(subscription = %state.id, "stream subscription started");
        let task = tokio::spawn(driver.run());
        Subscription { state, task }
    }
}

/// Handle to a live subscription. Dropping it unsubscribes.
pub struct Subscription {
    state: Arc<SubscriptionState>,
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn id(&self) -> Uuid {
        self.state.id
    }

    /// Stop permanently: close the connection and cancel any pending reconnect.
    /// Once this returns no handler of this subscription runs again, and one
    /// already running on another thread has finished.
    ///
    /// Called from inside a handler (of any subscription) it returns without
    /// waiting for another thread's in-flight handler, so handlers that
    /// unsubscribe each other cannot deadlock. No new handler starts either way.
    pub fn unsubscribe(&self) {
        if self.state.stop() {
            tracing::debug!(subscription = %self.state.id, "stream subscription stopped");
        }
        self.task.abort();
    }

    pub fn is_stopped(&self) -> bool {
        self.state.is_stopped()
    }

    /// False once stopped or once the host has been torn down.
    pub fn is_active(&self) -> bool {
        !self.state.is_stopped() && !self.task.is_finished()
    }

    /// Messages discarded because their payload did not decode.
    pub fn dropped_messages(&self) -> u64 {
        self.state.dropped.load(Ordering::Relaxed)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.state.id)
            .field("stopped", &self.state.is_stopped())
            .field("dropped_messages", &self.dropped_messages())
            .finish()
    }
}

struct SubscriptionState {
    id: Uuid,
    stopped: AtomicBool,
    dropped: AtomicU64,
    // Held for the duration of every handler call.
    gate: Mutex<()>,
}

thread_local! {
    // Handler calls currently on this thread's stack, across all subscriptions.
    static HANDLER_DEPTH: Cell<u32> = const { Cell::new(0) };
}

impl SubscriptionState {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            stopped: AtomicBool::new(false),
            dropped: AtomicU64::new(0),
            gate: Mutex::new(()),
        }
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Run one handler call unless stopped. Returns whether it ran.
    fn dispatch(&self, call: impl FnOnce()) -> bool {
        let _gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_stopped() {
            return false;
        }
        let _scope = HandlerScope::enter();
        call();
        true
    }

    /// Returns false when already stopped. Waits out an in-flight handler
    /// unless the caller is itself running inside a handler.
    fn stop(&self) -> bool {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return false;
        }
        if !HandlerScope::active() {
            drop(self.gate.lock().unwrap_or_else(PoisonError::into_inner));
        }
        true
    }
}

struct HandlerScope;

impl HandlerScope {
    fn enter() -> Self {
        HANDLER_DEPTH.with(|depth| depth.set(depth.get() + 1));
        Self
    }

    fn active() -> bool {
        HANDLER_DEPTH.with(|depth| depth.get() > 0)
    }
}

impl Drop for HandlerScope {
    fn drop(&mut self) {
        HANDLER_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

enum Outcome {
    Suspended,
    Failed(StreamError),
}

struct Driver<T, U> {
    url: U,
    handlers: StreamHandlers<T>,
    connector: Arc<dyn StreamConnector>,
    visibility: VisibilitySignal,
    backoff: Backoff,
    state: Arc<SubscriptionState>,
}

impl<T, U> Driver<T, U>
where
    T: DeserializeOwned + Send + 'static,
    U: UrlSource,
{
    async fn run(mut self) {
        let id = self.state.id;
        loop {
            if self.state.is_stopped() {
                return;
            }
            if !self.visibility.current().is_visible() {
                tracing::debug!(subscription = %id, "stream suspended until host is visible");
            }
            if !self.visibility.wait_visible().await {
                tracing::debug!(subscription = %id, "host torn down, ending stream subscription");
                return;
            }
            if self.state.is_stopped() {
                return;
            }

            match self.open().await {
                Outcome::Suspended => continue,
                Outcome::Failed(error) => self.fail(error).await,
            }
        }
    }

    async fn open(&mut self) -> Outcome {
        let url = match self.url.resolve() {
            Ok(url) => url,
            Err(error) => return Outcome::Failed(error),
        };

        let attempt = tokio::select! {
            biased;
            _ = self.visibility.wait_hidden() => return Outcome::Suspended,
            result = self.connector.connect(&url) => result,
        };
        let stream = match attempt {
            Ok(stream) => stream,
            Err(error) => return Outcome::Failed(error),
        };

        self.backoff.reset();
        tracing::debug!(subscription = %self.state.id, path = %url.path(), "stream connection open");
        let on_open = &mut self.handlers.on_open;
        self.state.dispatch(|| {
            if let Some(on_open) = on_open.as_mut() {
                on_open();
            }
        });

        self.pump(stream).await
    }

    async fn pump(&mut self, mut stream: MessageStream) -> Outcome {
        loop {
            let item = tokio::select! {
                biased;
                _ = self.visibility.wait_hidden() => {
                    tracing::debug!(subscription = %self.state.id, "closing stream connection while host is hidden");
                    return Outcome::Suspended;
                }
                item = stream.next() => item,
            };
            match item {
                Some(Ok(data)) => self.deliver(&data),
                Some(Err(error)) => return Outcome::Failed(error),
                None => return Outcome::Failed(StreamError::Closed),
            }
        }
    }

    fn deliver(&mut self, data: &str) {
        match serde_json::from_str::<T>(data) {
            Ok(event) => {
                let on_event = &mut self.handlers.on_event;
                self.state.dispatch(|| on_event(event));
            }
            Err(error) => {
                self.state.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(subscription = %self.state.id, %error, "dropping malformed stream message");
            }
        }
    }

    async fn fail(&mut self, error: StreamError) {
        let on_error = &mut self.handlers.on_error;
        self.state.dispatch(|| {
            if let Some(on_error) = on_error.as_mut() {
                on_error(&error);
            }
        });

        let delay = self.backoff.next_delay();
        tracing::debug!(
            subscription = %self.state.id,
            %error,
            delay_ms = delay.as_millis() as u64,
            "stream connection failed, reconnect scheduled"
        );
        tokio::select! {
            biased;
            _ = self.visibility.wait_hidden() => {
                tracing::debug!(subscription = %self.state.id, "reconnect timer cancelled while host is hidden");
            }
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
