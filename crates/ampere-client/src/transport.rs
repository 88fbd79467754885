use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Method, StatusCode, Url};
use serde_json::Value;

use crate::config::ApiConfig;
use crate::errors::{ConfigurationError, TransportError};

/// One outbound call, built per request from caller intent plus the current token.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    /// Absolute path including the base path, e.g. `/api/v1/stations/s1`.
    pub path: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
}

impl RequestDescriptor {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub status_text: String,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        let status_text = StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or_default()
            .to_string();
        Self {
            status,
            status_text,
            body: body.into(),
        }
    }

    pub fn json(status: u16, value: &Value) -> Self {
        Self::new(status, value.to_string())
    }

    pub fn no_content() -> Self {
        Self::new(204, Bytes::new())
    }

    pub fn is_success(&self) -> bool {
        (200..400).contains(&self.status)
    }
}

/// Transport seam under the gateway.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: RequestDescriptor) -> Result<RawResponse, TransportError>;
}

#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    origin: Url,
}

impl ReqwestTransport {
    pub fn new(config: &ApiConfig) -> Result<Self, ConfigurationError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|err| ConfigurationError::new(format!("http client build failed: {err}")))?;
        Ok(Self {
            client,
            origin: config.origin.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        self.origin
            .join(path)
            .map_err(|err| TransportError::with_source(format!("invalid request path '{path}'"), err))
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: RequestDescriptor) -> Result<RawResponse, TransportError> {
        let url = self.endpoint(&request.path)?;
        let mut builder = self.client.request(request.method.clone(), url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| TransportError::with_source("http request failed", err))?;
        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        if !(200..400).contains(&status.as_u16()) {
            return Ok(RawResponse {
                status: status.as_u16(),
                status_text,
                body: Bytes::new(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| TransportError::with_source("http read body failed", err))?;
        Ok(RawResponse {
            status: status.as_u16(),
            status_text,
            body,
        })
    }
}
