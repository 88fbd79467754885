//! Reconnecting push-channel subscriptions.
//!
//! A [`StreamReconnector`] owns no connections itself: every
//! [`StreamReconnector::subscribe`] spawns an independent driver task with its
//! own connection, backoff state and visibility receiver. Two subscriptions to
//! the same URL never share a connection.
//!
//! Reconnection is attempted indefinitely until the returned [`Subscription`]
//! is unsubscribed or dropped. A handle that is kept alive but never used
//! keeps reconnecting for the life of the process.

pub mod backoff;
pub mod connector;
pub mod reconnector;
pub mod url;
pub mod visibility;

pub use backoff::Backoff;
pub use connector::{MessageStream, SseConnector, StreamConnector, sse_message_stream};
pub use reconnector::{StreamHandlers, StreamReconnector, SubscribeOptions, Subscription};
pub use url::{StreamUrl, UrlSource};
pub use visibility::{Visibility, VisibilityController, VisibilitySignal, visibility_channel};
