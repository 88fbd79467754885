use crate::api::API_VERSION;
use crate::errors::ApiResult;
use crate::gateway::Gateway;
use crate::types::{NewReservation, Reservation, ReservationChanges};

#[derive(Clone, Copy)]
pub struct Reservations<'a> {
    gateway: &'a Gateway,
}

impl<'a> Reservations<'a> {
    pub(crate) fn new(gateway: &'a Gateway) -> Self {
        Self { gateway }
    }

    pub async fn create(&self, reservation: &NewReservation) -> ApiResult<Option<Reservation>> {
        self.gateway
            .post(&[API_VERSION, "reservations"], reservation)
            .await
    }

    pub async fn modify(
        &self,
        id: &str,
        changes: &ReservationChanges,
    ) -> ApiResult<Option<Reservation>> {
        self.gateway
            .patch(&[API_VERSION, "reservations", id], changes)
            .await
    }

    /// Backends answer either 204 or the cancelled reservation.
    pub async fn cancel(&self, id: &str) -> ApiResult<Option<Reservation>> {
        self.gateway
            .delete(&[API_VERSION, "reservations", id])
            .await
    }
}
