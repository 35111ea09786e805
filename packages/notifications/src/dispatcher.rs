// ABOUTME: Notification dispatcher for repair order status changes
// ABOUTME: Sends email and SMS after a committed transition; failures are logged and swallowed

use std::sync::Arc;

use async_trait::async_trait;
use revv_repair_orders::{RepairOrder, Transition, TransitionObserver};
use tracing::{debug, warn};

use crate::templates::{compose, compose_sms};
use crate::transport::NotificationTransport;

/// Which channels accepted the message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub email_sent: bool,
    pub sms_sent: bool,
}

pub struct NotificationDispatcher {
    email: Arc<dyn NotificationTransport>,
    sms: Arc<dyn NotificationTransport>,
    shop_name: String,
}

impl NotificationDispatcher {
    pub fn new(
        email: Arc<dyn NotificationTransport>,
        sms: Arc<dyn NotificationTransport>,
        shop_name: impl Into<String>,
    ) -> Self {
        Self {
            email,
            sms,
            shop_name: shop_name.into(),
        }
    }

    /// Notify the customer about a transition. Nothing is sent when the
    /// status did not change.
    pub async fn dispatch(&self, ro: &RepairOrder, transition: &Transition) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();

        if !transition.status_changed() {
            debug!(
                "Repair order {} unchanged at {}; no notification",
                ro.id, transition.to
            );
            return outcome;
        }

        if let Some(email) = ro.customer_email.as_deref() {
            let message = compose(ro, transition.to, &self.shop_name);
            outcome.email_sent = self
                .deliver(self.email.as_ref(), email, &message.subject, &message.body, ro)
                .await;
        }

        if let Some(phone) = ro.customer_phone.as_deref() {
            let text = compose_sms(ro, transition.to, &self.shop_name);
            outcome.sms_sent = self
                .deliver(self.sms.as_ref(), phone, "", &text, ro)
                .await;
        }

        outcome
    }

    async fn deliver(
        &self,
        transport: &dyn NotificationTransport,
        destination: &str,
        subject: &str,
        body: &str,
        ro: &RepairOrder,
    ) -> bool {
        match transport.send(destination, subject, body).await {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    "Failed to send {} notification for repair order {}: {}",
                    transport.name(),
                    ro.id,
                    err
                );
                false
            }
        }
    }
}

#[async_trait]
impl TransitionObserver for NotificationDispatcher {
    async fn on_transition(&self, ro: &RepairOrder, transition: &Transition) {
        self.dispatch(ro, transition).await;
    }
}
