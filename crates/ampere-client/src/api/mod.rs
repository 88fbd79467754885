//! Domain surface over the gateway. Each operation is one gateway call; only
//! method, path and body differ.
//!
//! | Operation | Call |
//! | --- | --- |
//! | `stations().list()` | `GET /v1/stations` |
//! | `stations().by_id(id)` | `GET /v1/stations/{id}` |
//! | `reservations().create(body)` | `POST /v1/reservations` |
//! | `reservations().modify(id, body)` | `PATCH /v1/reservations/{id}` |
//! | `reservations().cancel(id)` | `DELETE /v1/reservations/{id}` |
//! | `sessions().start(body)` | `POST /v1/sessions` |
//! | `sessions().stop(id)` | `POST /v1/sessions/{id}/stop` |
//! | `sessions().get(id)` | `GET /v1/sessions/{id}` |
//! | `sessions().events(id)` | stream `/v1/sessions/{id}/events` |
//! | `payments().create_intent(body)` | `POST /v1/payments/intents` |
//! | `payments().confirm(id, body)` | `POST /v1/payments/intents/{id}/confirm` |
//! | `payments().refund(id, body)` | `POST /v1/payments/intents/{id}/refund` |
//! | `realtime().feed()` | stream `/v1/events` |

pub mod payments;
pub mod realtime;
pub mod reservations;
pub mod sessions;
pub mod stations;

pub use payments::Payments;
pub use realtime::Realtime;
pub use reservations::Reservations;
pub use sessions::Sessions;
pub use stations::Stations;

use crate::gateway::Gateway;

pub(crate) const API_VERSION: &str = "v1";

impl Gateway {
    pub fn stations(&self) -> Stations<'_> {
        Stations::new(self)
    }

    pub fn reservations(&self) -> Reservations<'_> {
        Reservations::new(self)
    }

    pub fn sessions(&self) -> Sessions<'_> {
        Sessions::new(self)
    }

    pub fn payments(&self) -> Payments<'_> {
        Payments::new(self)
    }

    pub fn realtime(&self) -> Realtime<'_> {
        Realtime::new(self)
    }
}
