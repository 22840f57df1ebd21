use crate::storage::StorageError;
use shared::models::{Channel, DeliveryStatus, EntryStatus};
use thiserror::Error;

/// Manager errors
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    NotFound(String),

    /// Rejected transition. The entry was not modified; the caller must
    /// reload current state before retrying.
    #[error("Illegal transition: entry is {from}, cannot {attempted}")]
    InvalidTransition {
        from: EntryStatus,
        attempted: &'static str,
    },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Channel delivery state rejects the operation, e.g. retrying a channel
    /// that already went out
    #[error("Channel {channel} is {status:?}, only failed channels can be retried")]
    ChannelState {
        channel: Channel,
        status: DeliveryStatus,
    },
}

impl ManagerError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

pub type ManagerResult<T> = Result<T, ManagerError>;
