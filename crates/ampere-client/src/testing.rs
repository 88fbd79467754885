//! In-memory transport and connector doubles for gateway and stream tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use futures::{StreamExt, stream};
use reqwest::Url;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::errors::{StreamError, TransportError};
use crate::stream::{MessageStream, StreamConnector};
use crate::transport::{HttpTransport, RawResponse, RequestDescriptor};

/// Scripted [`HttpTransport`]. Responses are served in push order; once the
/// script is empty every call fails as a transport error.
#[derive(Clone, Debug, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportState>>,
}

#[derive(Debug, Default)]
struct MockTransportState {
    responses: VecDeque<Result<RawResponse, String>>,
    requests: Vec<RequestDescriptor>,
}

impl MockTransport {
    pub fn respond(&self, response: RawResponse) -> &Self {
        self.lock().responses.push_back(Ok(response));
        self
    }

    pub fn respond_json(&self, status: u16, value: Value) -> &Self {
        self.respond(RawResponse::json(status, &value))
    }

    /// Script a call that obtains no response at all.
    pub fn fail(&self, message: impl Into<String>) -> &Self {
        self.lock().responses.push_back(Err(message.into()));
        self
    }

    pub fn requests(&self) -> Vec<RequestDescriptor> {
        self.lock().requests.clone()
    }

    pub fn last_request(&self) -> Option<RequestDescriptor> {
        self.lock().requests.last().cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockTransportState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn execute(&self, request: RequestDescriptor) -> Result<RawResponse, TransportError> {
        let mut state = self.lock();
        state.requests.push(request);
        match state.responses.pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(TransportError::with_source(
                "http request failed",
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, message),
            )),
            None => Err(TransportError::new("mock transport has no scripted response")),
        }
    }
}

/// One recorded connect call.
#[derive(Clone, Debug)]
pub struct ConnectAttempt {
    pub url: Url,
    pub at: tokio::time::Instant,
}

enum ScriptedConnection {
    Refuse(StreamError),
    Messages(Vec<String>),
    Live(mpsc::UnboundedReceiver<Result<String, StreamError>>),
}

/// Scripted [`StreamConnector`]. Outcomes are consumed in push order; once the
/// script is empty connections open and stay silent.
#[derive(Clone, Default)]
pub struct MockConnector {
    inner: Arc<Mutex<MockConnectorState>>,
}

#[derive(Default)]
struct MockConnectorState {
    script: VecDeque<ScriptedConnection>,
    attempts: Vec<ConnectAttempt>,
}

impl MockConnector {
    pub fn refuse(&self, error: StreamError) -> &Self {
        self.lock().script.push_back(ScriptedConnection::Refuse(error));
        self
    }

    /// Open, deliver `messages`, then close from the server side.
    pub fn messages<I, S>(&self, messages: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let messages = messages.into_iter().map(Into::into).collect();
        self.lock()
            .script
            .push_back(ScriptedConnection::Messages(messages));
        self
    }

    /// Open a connection driven by the returned feed.
    pub fn live(&self) -> MockFeed {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().script.push_back(ScriptedConnection::Live(rx));
        MockFeed { tx }
    }

    pub fn attempts(&self) -> Vec<ConnectAttempt> {
        self.lock().attempts.clone()
    }

    pub fn attempt_count(&self) -> usize {
        self.lock().attempts.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockConnectorState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl StreamConnector for MockConnector {
    async fn connect(&self, url: &Url) -> Result<MessageStream, StreamError> {
        let mut state = self.lock();
        state.attempts.push(ConnectAttempt {
            url: url.clone(),
            at: tokio::time::Instant::now(),
        });
        match state.script.pop_front() {
            Some(ScriptedConnection::Refuse(error)) => Err(error),
            Some(ScriptedConnection::Messages(messages)) => {
                Ok(stream::iter(messages.into_iter().map(Ok)).boxed())
            }
            Some(ScriptedConnection::Live(rx)) => Ok(receiver_stream(rx).boxed()),
            None => Ok(stream::pending::<Result<String, StreamError>>().boxed()),
        }
    }
}

fn receiver_stream(
    rx: mpsc::UnboundedReceiver<Result<String, StreamError>>,
) -> impl futures::Stream<Item = Result<String, StreamError>> + Send {
    stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|item| (item, rx)) })
}

/// Server side of a live mock connection. Dropping it closes the connection.
#[derive(Clone, Debug)]
pub struct MockFeed {
    tx: mpsc::UnboundedSender<Result<String, StreamError>>,
}

impl MockFeed {
    pub fn send(&self, message: impl Into<String>) -> bool {
        self.tx.send(Ok(message.into())).is_ok()
    }

    pub fn fail(&self, error: StreamError) -> bool {
        self.tx.send(Err(error)).is_ok()
    }

    /// True once the client side dropped the connection.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
