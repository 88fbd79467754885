use crate::api::API_VERSION;
use crate::errors::ApiResult;
use crate::gateway::Gateway;
use crate::types::{ConfirmPayment, NewPaymentIntent, PaymentIntent, RefundPayment};

/// Money-moving calls. Never retried here; a caller retrying a failed
/// `confirm` or `refund` must first check the intent's state.
#[derive(Clone, Copy)]
pub struct Payments<'a> {
    gateway: &'a Gateway,
}

impl<'a> Payments<'a> {
    pub(crate) fn new(gateway: &'a Gateway) -> Self {
        Self { gateway }
    }

    pub async fn create_intent(&self, intent: &NewPaymentIntent) -> ApiResult<Option<PaymentIntent>> {
        self.gateway
            .post(&[API_VERSION, "payments", "intents"], intent)
            .await
    }

    pub async fn confirm(
        &self,
        intent_id: &str,
        confirmation: &ConfirmPayment,
    ) -> ApiResult<Option<PaymentIntent>> {
        self.gateway
            .post(
                &[API_VERSION, "payments", "intents", intent_id, "confirm"],
                confirmation,
            )
            .await
    }

    pub async fn refund(
        &self,
        intent_id: &str,
        refund: &RefundPayment,
    ) -> ApiResult<Option<PaymentIntent>> {
        self.gateway
            .post(
                &[API_VERSION, "payments", "intents", intent_id, "refund"],
                refund,
            )
            .await
    }
}
