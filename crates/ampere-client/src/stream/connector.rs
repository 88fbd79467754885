use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt, stream};
use reqwest::Url;
use reqwest::header::{ACCEPT, CACHE_CONTROL};

use crate::config::ApiConfig;
use crate::errors::{ConfigurationError, StreamError};
use crate::utils::sse::{SseDecoder, SseFrame};

/// Message payloads of one open connection, in delivery order. Ending the
/// stream means the server closed the connection.
pub type MessageStream = Pin<Box<dyn Stream<Item = Result<String, StreamError>> + Send>>;

/// Opens one connection to a push channel.
#[async_trait]
pub trait StreamConnector: Send + Sync {
    async fn connect(&self, url: &Url) -> Result<MessageStream, StreamError>;
}

/// `text/event-stream` connector over reqwest.
#[derive(Clone, Debug)]
pub struct SseConnector {
    client: reqwest::Client,
}

impl SseConnector {
    /// No total request timeout is applied; the stream is long-lived.
    pub fn new(config: &ApiConfig) -> Result<Self, ConfigurationError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|err| ConfigurationError::new(format!("stream client build failed: {err}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl StreamConnector for SseConnector {
    async fn connect(&self, url: &Url) -> Result<MessageStream, StreamError> {
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|err| StreamError::Connect(err.to_string()))?;
        if !response.status().is_success() {
            return Err(StreamError::Status(response.status().as_u16()));
        }
        Ok(sse_message_stream(Box::pin(response.bytes_stream())))
    }
}

/// Decode a raw SSE body into the data payloads of its message events.
pub fn sse_message_stream<S, E>(body: S) -> MessageStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + Unpin + 'static,
    E: Display + Send + 'static,
{
    let state = (body, SseDecoder::new(), VecDeque::<String>::new());
    Box::pin(stream::unfold(state, |(mut body, mut decoder, mut ready)| async move {
        loop {
            if let Some(data) = ready.pop_front() {
                return Some((Ok(data), (body, decoder, ready)));
            }
            match body.next().await {
                Some(Ok(chunk)) => ready.extend(
                    decoder
                        .feed(&chunk)
                        .into_iter()
                        .filter(SseFrame::is_message)
                        .map(|frame| frame.data),
                ),
                Some(Err(err)) => {
                    return Some((Err(StreamError::Read(err.to_string())), (body, decoder, ready)));
                }
                None => return None,
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "current_thread")]
    async fn message_stream_yields_message_payloads_in_order() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"data: {\"seq\":1}\n\nevent: ping\ndata: x\n\n")),
            Ok(Bytes::from_static(b"data: {\"seq\"")),
            Ok(Bytes::from_static(b":2}\n\n")),
        ];
        let messages: Vec<_> = sse_message_stream(stream::iter(chunks)).collect().await;
        assert_eq!(
            messages,
            vec![Ok("{\"seq\":1}".to_string()), Ok("{\"seq\":2}".to_string())]
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn message_stream_treats_empty_event_name_as_message() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![Ok(Bytes::from_static(
            b"event:\ndata: {\"n\":1}\r\revent: status\ndata: {\"n\":2}\n\n",
        ))];
        let messages: Vec<_> = sse_message_stream(stream::iter(chunks)).collect().await;
        assert_eq!(messages, vec![Ok("{\"n\":1}".to_string())]);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn message_stream_surfaces_body_errors() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "reset",
        ))];
        let mut messages = sse_message_stream(stream::iter(chunks));
        assert_eq!(
            messages.next().await,
            Some(Err(StreamError::Read("reset".to_string())))
        );
    }
}
