// ABOUTME: Customer notifications for REVV repair order status changes
// ABOUTME: Message templates, email and SMS transports, and the dispatcher observing transitions

pub mod dispatcher;
pub mod templates;
pub mod transport;

pub use dispatcher::{DispatchOutcome, NotificationDispatcher};
pub use templates::{compose, compose_sms, Message};
pub use transport::{
    HttpEmailTransport, LogTransport, NotificationTransport, TransportError, TwilioSmsTransport,
};
