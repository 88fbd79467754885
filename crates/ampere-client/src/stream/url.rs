use reqwest::Url;

use crate::errors::StreamError;
use crate::token::{TokenAccessor, current_token};

/// Produces the channel URL. Resolved again before every connect attempt.
pub trait UrlSource: Send + Sync + 'static {
    fn resolve(&self) -> Result<Url, StreamError>;
}

impl UrlSource for Url {
    fn resolve(&self) -> Result<Url, StreamError> {
        Ok(self.clone())
    }
}

impl UrlSource for String {
    fn resolve(&self) -> Result<Url, StreamError> {
        Url::parse(self).map_err(|err| StreamError::Url(format!("{self}: {err}")))
    }
}

/// Channel URL carrying the bearer token as a `token` query parameter, since
/// the event-stream transport cannot send custom headers.
#[derive(Clone)]
pub struct StreamUrl {
    url: Url,
    token: TokenAccessor,
}

impl StreamUrl {
    pub fn new(url: Url, token: TokenAccessor) -> Self {
        Self { url, token }
    }

    /// The channel URL without credentials.
    pub fn base(&self) -> &Url {
        &self.url
    }
}

impl std::fmt::Debug for StreamUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamUrl").field("url", &self.url.as_str()).finish()
    }
}

impl UrlSource for StreamUrl {
    fn resolve(&self) -> Result<Url, StreamError> {
        let mut url = self.url.clone();
        if let Some(token) = current_token(&self.token) {
            url.query_pairs_mut().append_pair("token", &token);
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{anonymous, static_token};

    #[test]
    fn resolve_appends_token_query_parameter() {
        let url = Url::parse("http://localhost:8080/api/v1/events").unwrap();
        let source = StreamUrl::new(url, static_token("tok 123"));
        assert_eq!(
            source.resolve().unwrap().as_str(),
            "http://localhost:8080/api/v1/events?token=tok+123"
        );
    }

    #[test]
    fn resolve_leaves_url_untouched_without_token() {
        let url = Url::parse("http://localhost:8080/api/v1/events").unwrap();
        let source = StreamUrl::new(url.clone(), anonymous());
        assert_eq!(source.resolve().unwrap(), url);
    }

    #[test]
    fn string_source_reports_invalid_urls() {
        let error = "::nope".to_string().resolve().unwrap_err();
        assert!(matches!(error, StreamError::Url(_)));
    }
}
