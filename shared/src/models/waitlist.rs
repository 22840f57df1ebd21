//! Waitlist (list) model

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Kind of queue a list manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListType {
    EatIn,
    TakeOut,
}

impl Default for ListType {
    fn default() -> Self {
        Self::EatIn
    }
}

impl fmt::Display for ListType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EatIn => write!(f, "eat_in"),
            Self::TakeOut => write!(f, "take_out"),
        }
    }
}

/// Public display rendering options
///
/// Controls how much customer detail the token-scoped display board shows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayOptions {
    /// Show customer names on the board (otherwise ticket numbers only)
    #[serde(default)]
    pub show_names: bool,
    /// Show party sizes on the board
    #[serde(default)]
    pub show_party_size: bool,
    /// Maximum number of "up next" entries on the board
    #[serde(default = "default_up_next_limit")]
    pub up_next_limit: usize,
}

fn default_up_next_limit() -> usize {
    10
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            show_names: false,
            show_party_size: false,
            up_next_limit: default_up_next_limit(),
        }
    }
}

/// Waitlist entity: one queue belonging to one business location
///
/// `display_token` is an opaque, unguessable identifier granting the public
/// display and kiosk read/write access without authentication. It is the only
/// list identifier ever exposed on public surfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Waitlist {
    pub id: String,
    pub business_id: String,
    pub location_id: String,
    pub name: String,
    pub list_type: ListType,

    // Check-in form configuration
    #[serde(default = "default_true")]
    pub accepts_name: bool,
    #[serde(default = "default_true")]
    pub accepts_phone: bool,
    #[serde(default)]
    pub accepts_email: bool,
    /// Ordered seating preference vocabulary (e.g. "booth", "bar", "patio")
    #[serde(default)]
    pub seating_options: Vec<String>,

    // Public surfaces
    #[serde(default)]
    pub kiosk_enabled: bool,
    #[serde(default)]
    pub display_enabled: bool,
    #[serde(default)]
    pub display_options: DisplayOptions,
    pub display_token: String,

    /// Manual average-wait override in minutes; used as the fallback
    /// estimate when no historical samples exist
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_wait_override: Option<u32>,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

fn default_true() -> bool {
    true
}

/// Create waitlist payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitlistCreate {
    pub location_id: String,
    pub name: String,
    #[serde(default)]
    pub list_type: ListType,
    #[serde(default = "default_true")]
    pub accepts_name: bool,
    #[serde(default = "default_true")]
    pub accepts_phone: bool,
    #[serde(default)]
    pub accepts_email: bool,
    #[serde(default)]
    pub seating_options: Vec<String>,
    #[serde(default)]
    pub kiosk_enabled: bool,
    #[serde(default)]
    pub display_enabled: bool,
    #[serde(default)]
    pub display_options: Option<DisplayOptions>,
    #[serde(default)]
    pub average_wait_override: Option<u32>,
}

/// Update waitlist payload, all fields optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WaitlistUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_type: Option<ListType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepts_name: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepts_phone: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepts_email: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seating_options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kiosk_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_options: Option<DisplayOptions>,
    /// `Some(None)` clears the override, `None` leaves it unchanged.
    /// An absent field stays `None`; an explicit JSON `null` becomes
    /// `Some(None)` via [`double_option`].
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub average_wait_override: Option<Option<u32>>,
}

/// Wraps the deserialized value in an extra `Some`, so a present-but-null
/// field is distinguishable from an absent one (which takes the `default`)
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_override_absent_means_unchanged() {
        let update: WaitlistUpdate = serde_json::from_str(r#"{"name": "Terrace"}"#).unwrap();
        assert_eq!(update.average_wait_override, None);
    }

    #[test]
    fn update_override_null_means_clear() {
        let update: WaitlistUpdate =
            serde_json::from_str(r#"{"average_wait_override": null}"#).unwrap();
        assert_eq!(update.average_wait_override, Some(None));
    }

    #[test]
    fn update_override_value_means_set() {
        let update: WaitlistUpdate =
            serde_json::from_str(r#"{"average_wait_override": 25}"#).unwrap();
        assert_eq!(update.average_wait_override, Some(Some(25)));
    }
}
