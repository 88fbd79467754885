use serde_json::json;

use crate::api::API_VERSION;
use crate::errors::ApiResult;
use crate::gateway::Gateway;
use crate::stream::StreamUrl;
use crate::types::{ChargingSession, StartSession};

#[derive(Clone, Copy)]
pub struct Sessions<'a> {
    gateway: &'a Gateway,
}

impl<'a> Sessions<'a> {
    pub(crate) fn new(gateway: &'a Gateway) -> Self {
        Self { gateway }
    }

    pub async fn start(&self, request: &StartSession) -> ApiResult<Option<ChargingSession>> {
        self.gateway.post(&[API_VERSION, "sessions"], request).await
    }

    pub async fn stop(&self, id: &str) -> ApiResult<Option<ChargingSession>> {
        self.gateway
            .post(&[API_VERSION, "sessions", id, "stop"], &json!({}))
            .await
    }

    pub async fn get(&self, id: &str) -> ApiResult<Option<ChargingSession>> {
        self.gateway.get(&[API_VERSION, "sessions", id]).await
    }

    /// Channel URL for live updates of one session; pass it to
    /// [`crate::stream::StreamReconnector::subscribe`].
    pub fn events(&self, id: &str) -> ApiResult<StreamUrl> {
        self.gateway
            .stream_url(&[API_VERSION, "sessions", id, "events"])
    }
}
