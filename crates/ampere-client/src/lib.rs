//! Client runtime core for the Ampere charging backend.
//!
//! Two cooperating pieces share only a [`TokenAccessor`]:
//!
//! - [`Gateway`]: authenticated JSON request gateway with uniform error
//!   classification ([`ApiError`]), plus the typed domain surface in [`api`].
//! - [`StreamReconnector`]: server-push subscriptions that reconnect with
//!   exponential backoff and suspend while the host is not visible.

pub mod api;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod stream;
pub mod testing;
pub mod token;
pub mod transport;
pub mod types;
pub mod utils;

pub use config::{ApiConfig, set_global_config};
pub use errors::{
    ApiError, ApiErrorKind, ApiResult, ConfigurationError, StreamError, TransportError,
};
pub use gateway::{Gateway, GatewayBuilder};
pub use stream::{
    Backoff, StreamHandlers, StreamReconnector, StreamUrl, SubscribeOptions, Subscription,
    UrlSource, Visibility, VisibilityController, VisibilitySignal, visibility_channel,
};
pub use token::{TokenAccessor, anonymous, static_token, token_accessor};
pub use transport::{HttpTransport, RawResponse, ReqwestTransport, RequestDescriptor};
