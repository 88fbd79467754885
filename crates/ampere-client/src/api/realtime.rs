use crate::api::API_VERSION;
use crate::errors::ApiResult;
use crate::gateway::Gateway;
use crate::stream::StreamUrl;

#[derive(Clone, Copy)]
pub struct Realtime<'a> {
    gateway: &'a Gateway,
}

impl<'a> Realtime<'a> {
    pub(crate) fn new(gateway: &'a Gateway) -> Self {
        Self { gateway }
    }

    /// Channel URL of the general event feed.
    pub fn feed(&self) -> ApiResult<StreamUrl> {
        self.gateway.stream_url(&[API_VERSION, "events"])
    }
}
