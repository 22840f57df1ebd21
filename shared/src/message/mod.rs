//! Fan-out bus message types
//!
//! The bus is advisory: a published message means "this list changed, reload
//! your view". It never carries entry data, so a consumer can never render a
//! partial or stale push payload; every subscriber re-fetches its own
//! permission-scoped view through the read API.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pub/sub topic key
///
/// Two independent topic spaces per list: internal consumers subscribe by
/// list id, public consumers (display board, kiosk) by display token. The
/// public topic never exposes an internal id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", content = "key", rename_all = "snake_case")]
pub enum Topic {
    /// Operator-facing consumers, keyed by list id
    List(String),
    /// Public display / kiosk consumers, keyed by display token
    Display(String),
    /// One customer's personal status page, keyed by entry token
    Entry(String),
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List(id) => write!(f, "list:{id}"),
            Self::Display(token) => write!(f, "display:{token}"),
            Self::Entry(token) => write!(f, "entry:{token}"),
        }
    }
}

/// Typed change feed record emitted by the queue manager after each commit
///
/// This is the second, redundant trigger source for the fan-out bus: either
/// the manager's direct topic publish or this feed is sufficient to wake
/// consumers, so losing one path is tolerated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryChange {
    pub list_id: String,
    /// Display token of the list, for routing to the public topic
    pub display_token: String,
    /// Absent for list-level changes (configuration update, clear)
    pub entry_id: Option<String>,
    /// Personal token of the changed entry, for the status-page topic
    pub entry_token: Option<String>,
}
