//! Authenticated request gateway.
//!
//! Every domain call goes through [`Gateway::request`]: resolve the endpoint
//! under the configured base path, attach `Authorization: Bearer <token>` when
//! the token accessor yields one, dispatch through the [`HttpTransport`] and
//! classify the outcome. The gateway never retries; mutating calls that move
//! money must stay at-most-once, so retry is left to the caller.

use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::{Method, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::ApiConfig;
use crate::errors::{ApiError, ApiResult, ConfigurationError};
use crate::stream::StreamUrl;
use crate::token::{TokenAccessor, current_token};
use crate::transport::{HttpTransport, RawResponse, ReqwestTransport, RequestDescriptor};

pub const CONTENT_TYPE_JSON: &str = "application/json";

#[derive(Clone)]
pub struct Gateway {
    base_url: Url,
    transport: Arc<dyn HttpTransport>,
    token: TokenAccessor,
}

#[derive(Default)]
pub struct GatewayBuilder {
    config: Option<ApiConfig>,
    transport: Option<Arc<dyn HttpTransport>>,
    token: Option<TokenAccessor>,
}

impl GatewayBuilder {
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn token_accessor(mut self, token: TokenAccessor) -> Self {
        self.token = Some(token);
        self
    }

    /// Fails when no token accessor was supplied; use [`crate::token::anonymous`]
    /// for deliberately unauthenticated gateways.
    pub fn build(self) -> Result<Gateway, ConfigurationError> {
        let token = self
            .token
            .ok_or_else(|| ConfigurationError::new("gateway requires a token accessor"))?;
        let config = self.config.unwrap_or_else(|| ApiConfig::global().clone());
        let base_url = config.base_url()?;
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(&config)?),
        };

        Ok(Gateway {
            base_url,
            transport,
            token,
        })
    }
}

impl Gateway {
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::default()
    }

    /// Gateway over the process-wide config and the reqwest transport.
    pub fn new(token: TokenAccessor) -> Result<Self, ConfigurationError> {
        Self::builder().token_accessor(token).build()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn token_accessor(&self) -> TokenAccessor {
        Arc::clone(&self.token)
    }

    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<Value>,
    ) -> ApiResult<Option<T>> {
        let descriptor = self.describe(method, segments, body)?;
        tracing::debug!(
            method = %descriptor.method,
            path = %descriptor.path,
            authorized = descriptor.headers.contains_key(AUTHORIZATION),
            "dispatching api request"
        );
        let response = self.transport.execute(descriptor).await?;
        decode_response(response)
    }

    pub async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> ApiResult<Option<T>> {
        self.request(Method::GET, segments, None).await
    }

    pub async fn post<T, B>(&self, segments: &[&str], body: &B) -> ApiResult<Option<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body).map_err(ApiError::Encode)?;
        self.request(Method::POST, segments, Some(body)).await
    }

    pub async fn patch<T, B>(&self, segments: &[&str], body: &B) -> ApiResult<Option<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body).map_err(ApiError::Encode)?;
        self.request(Method::PATCH, segments, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, segments: &[&str]) -> ApiResult<Option<T>> {
        self.request(Method::DELETE, segments, None).await
    }

    /// Build the descriptor for one call. The token is read here, per call.
    pub fn describe(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<Value>,
    ) -> ApiResult<RequestDescriptor> {
        let path = self.endpoint(segments)?.path().to_string();
        let mut headers = BTreeMap::from([(CONTENT_TYPE.to_string(), CONTENT_TYPE_JSON.to_string())]);
        if let Some(token) = current_token(&self.token) {
            headers.insert(AUTHORIZATION.to_string(), format!("Bearer {token}"));
        }

        Ok(RequestDescriptor {
            method,
            path,
            headers,
            body,
        })
    }

    /// Channel URL for a push stream under the base path. The token is
    /// appended as a `token` query parameter on every connect attempt.
    pub fn stream_url(&self, segments: &[&str]) -> ApiResult<StreamUrl> {
        Ok(StreamUrl::new(self.endpoint(segments)?, Arc::clone(&self.token)))
    }

    /// Empty and dot segments are refused; the url crate would collapse them.
    fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        if let Some(segment) = segments
            .iter()
            .find(|segment| matches!(**segment, "" | "." | ".."))
        {
            return Err(ApiError::InvalidPath {
                segment: segment.to_string(),
            });
        }
        let mut url = self.base_url.clone();
        // base_url was validated as a base url in GatewayBuilder::build
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }
}

const CONTENT_TYPE: &str = "Content-Type";
const AUTHORIZATION: &str = "Authorization";

fn decode_response<T: DeserializeOwned>(response: RawResponse) -> ApiResult<Option<T>> {
    if !response.is_success() {
        return Err(ApiError::Http {
            status: response.status,
            status_text: response.status_text,
        });
    }
    if response.status == 204 {
        return Ok(None);
    }
    serde_json::from_slice(&response.body)
        .map(Some)
        .map_err(ApiError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ApiErrorKind;
    use crate::token::{anonymous, static_token};
    use serde_json::json;

    fn gateway(token: TokenAccessor) -> Gateway {
        Gateway::builder()
            .config(ApiConfig::default())
            .transport(Arc::new(crate::testing::MockTransport::default()))
            .token_accessor(token)
            .build()
            .expect("gateway should build")
    }

    #[test]
    fn build_without_token_accessor_fails_fast() {
        let error = Gateway::builder()
            .config(ApiConfig::default())
            .transport(Arc::new(crate::testing::MockTransport::default()))
            .build()
            .err()
            .expect("missing accessor should fail");
        assert!(error.message.contains("token accessor"));
    }

    #[test]
    fn describe_attaches_bearer_token_when_present() {
        let descriptor = gateway(static_token("tok123"))
            .describe(Method::GET, &["v1", "stations"], None)
            .unwrap();
        assert_eq!(descriptor.path, "/api/v1/stations");
        assert_eq!(descriptor.header("authorization"), Some("Bearer tok123"));
        assert_eq!(descriptor.header("content-type"), Some("application/json"));
    }

    #[test]
    fn describe_omits_authorization_without_token() {
        let descriptor = gateway(anonymous())
            .describe(Method::GET, &["v1", "stations"], None)
            .unwrap();
        assert!(!descriptor.headers.contains_key("Authorization"));
        assert_eq!(descriptor.headers.len(), 1);
    }

    #[test]
    fn describe_percent_encodes_segments() {
        let descriptor = gateway(anonymous())
            .describe(Method::GET, &["v1", "stations", "a/b c"], None)
            .unwrap();
        assert_eq!(descriptor.path, "/api/v1/stations/a%2Fb%20c");

        let escaped = gateway(anonymous())
            .describe(Method::GET, &["v1", "stations", "%2e%2e"], None)
            .unwrap();
        assert_eq!(escaped.path, "/api/v1/stations/%252e%252e");
    }

    #[test]
    fn describe_refuses_empty_and_dot_segments() {
        let gateway = gateway(anonymous());
        for segment in ["", ".", ".."] {
            let error = gateway
                .describe(Method::DELETE, &["v1", "reservations", segment], None)
                .unwrap_err();
            assert_eq!(error.kind(), ApiErrorKind::InvalidPath);
            assert_eq!(error.to_string(), format!("invalid path segment {segment:?}"));
        }
        assert!(gateway.stream_url(&["v1", "sessions", "..", "events"]).is_err());
    }

    #[test]
    fn decode_response_maps_statuses() {
        let none: Option<Value> = decode_response(RawResponse::no_content()).unwrap();
        assert_eq!(none, None);

        let ok: Option<Value> = decode_response(RawResponse::json(200, &json!({"id": "s1"}))).unwrap();
        assert_eq!(ok, Some(json!({"id": "s1"})));

        let not_found = decode_response::<Value>(RawResponse::new(404, "{}")).unwrap_err();
        assert_eq!(not_found.status(), Some(404));

        let malformed = decode_response::<Value>(RawResponse::new(200, "{oops")).unwrap_err();
        assert!(malformed.is_decode());
    }
}
