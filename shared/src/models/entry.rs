//! Waitlist entry model and status machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Entry lifecycle status
///
/// ```text
/// Waiting ──> Notified ──> Seated
///    │            │
///    │            └──────> Archived   (no-show)
///    └───────────────────> Archived   (remove / list clear)
///
/// any non-terminal ──> Cancelled      (customer self-cancel)
/// ```
///
/// `Seated`, `Archived` and `Cancelled` are terminal; an entry never
/// transitions backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Waiting,
    Notified,
    Seated,
    Archived,
    Cancelled,
}

impl EntryStatus {
    /// Whether the entry still occupies the queue (shown in the operator table)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Waiting | Self::Notified)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Seated | Self::Archived | Self::Cancelled)
    }

    /// Transition legality check, the single source of truth for the
    /// status graph. Self-transitions are not legal.
    pub fn can_transition_to(&self, next: EntryStatus) -> bool {
        use EntryStatus::*;
        match (self, next) {
            (Waiting, Notified) => true,
            (Waiting, Archived) => true,
            (Notified, Seated) => true,
            (Notified, Archived) => true,
            (Waiting | Notified, Cancelled) => true,
            _ => false,
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Notified => write!(f, "notified"),
            Self::Seated => write!(f, "seated"),
            Self::Archived => write!(f, "archived"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Notification channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Sms,
    Whatsapp,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sms => write!(f, "sms"),
            Self::Whatsapp => write!(f, "whatsapp"),
        }
    }
}

/// Per-channel delivery status
///
/// Each channel advances independently: `Pending -> Sent -> Delivered`, or
/// `Pending -> Failed`. `Delivered` requires a provider callback; without
/// one a channel stays at `Sent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Delivered,
    Failed,
}

/// Delivery record for one notification channel of one entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelDelivery {
    pub channel: Channel,
    pub status: DeliveryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
    /// Last dispatch error, retained verbatim for operator diagnosis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChannelDelivery {
    pub fn pending(channel: Channel) -> Self {
        Self {
            channel,
            status: DeliveryStatus::Pending,
            provider_message_id: None,
            sent_at: None,
            delivered_at: None,
            error: None,
        }
    }
}

/// Waitlist entry entity
///
/// `token` is the opaque personal token granting the customer read/cancel
/// access to this entry without authentication. The entry's queue position is
/// never stored; it is derived on read from `ticket_number` rank among
/// currently-waiting entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitlistEntry {
    pub id: String,
    pub list_id: String,
    pub token: String,

    // Customer fields, optional per list configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub party_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seating_preference: Option<String>,

    // Queue fields
    /// Numbering generation; bumped on list clear so numbering restarts at 1
    /// without colliding with historical tickets
    pub epoch: u64,
    /// Monotonic per (list, epoch), assigned at creation, never reused
    pub ticket_number: u64,
    pub status: EntryStatus,

    pub created_at: DateTime<Utc>,
    /// Bumped on every mutation; used for same-day stats on terminal entries
    pub updated_at: DateTime<Utc>,
    /// Set exactly when the entry first passes through `Notified`; never cleared
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notified_at: Option<DateTime<Utc>>,

    /// Per-channel notification delivery state
    #[serde(default)]
    pub notifications: Vec<ChannelDelivery>,

    // Loyalty metadata, derived from phone + business history at creation
    #[serde(default)]
    pub visits_count: u64,
    #[serde(default)]
    pub is_returning: bool,
}

impl WaitlistEntry {
    /// Find the delivery record for a channel
    pub fn delivery(&self, channel: Channel) -> Option<&ChannelDelivery> {
        self.notifications.iter().find(|d| d.channel == channel)
    }

    pub fn delivery_mut(&mut self, channel: Channel) -> Option<&mut ChannelDelivery> {
        self.notifications.iter_mut().find(|d| d.channel == channel)
    }
}

/// Check-in payload (operator, kiosk and customer self-check-in)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckInInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub party_size: Option<u32>,
    #[serde(default)]
    pub seating_preference: Option<String>,
}

/// Edit payload, allowed only while the entry is active; ticket number,
/// creation time and status are not editable
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub party_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seating_preference: Option<String>,
}
