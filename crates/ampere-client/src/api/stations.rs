use crate::api::API_VERSION;
use crate::errors::ApiResult;
use crate::gateway::Gateway;
use crate::types::Station;

#[derive(Clone, Copy)]
pub struct Stations<'a> {
    gateway: &'a Gateway,
}

impl<'a> Stations<'a> {
    pub(crate) fn new(gateway: &'a Gateway) -> Self {
        Self { gateway }
    }

    pub async fn list(&self) -> ApiResult<Option<Vec<Station>>> {
        self.gateway.get(&[API_VERSION, "stations"]).await
    }

    pub async fn by_id(&self, id: &str) -> ApiResult<Option<Station>> {
        self.gateway.get(&[API_VERSION, "stations", id]).await
    }
}
