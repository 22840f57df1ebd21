//! Shared types for the Waitline platform
//!
//! Common types used by the server and its clients: waitlist and entry
//! models, status enums, and the fan-out bus message types.

pub mod message;
pub mod models;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use message::{EntryChange, Topic};
pub use models::{
    Channel, ChannelDelivery, DeliveryStatus, EntryStatus, ListType, Waitlist, WaitlistEntry,
};
