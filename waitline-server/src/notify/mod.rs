//! Notification dispatch
//!
//! Sending an SMS or WhatsApp message is decoupled from the `call`
//! transition: the manager commits the entry with pending channel records,
//! then the [`NotifierService`] dispatches them against the provider and
//! writes the outcome back per channel. A provider outage can therefore
//! never block or roll back a queue transition.
//!
//! There is no automatic retry. A failed channel stays `failed` with its
//! error until an operator explicitly retries it.

pub mod provider;
pub mod quota;
pub mod service;

pub use provider::{
    DisabledProvider, HttpGatewayProvider, NotificationProvider, ProviderError, ProviderReceipt,
};
pub use quota::{DailyQuota, MessageQuota, Unmetered};
pub use service::NotifierService;
