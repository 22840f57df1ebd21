//! Waitlist queue engine
//!
//! The core of the server: entry lifecycle, ticket sequencing, derived
//! views and wait estimation.
//!
//! - **manager**: `WaitlistManager`, which validates transitions and commits them
//! - **estimator**: expected-wait computation from completed samples
//! - **views**: read-side projections (positions, stats, display board)
//!
//! # Write path
//!
//! ```text
//! Request → WaitlistManager → transition check → Storage (redb, one txn)
//!                 ↓ (post-commit)
//!         Fan-out Bus publish + EntryChange feed
//!                 ↓
//!          All live consumers re-read
//! ```

pub mod estimator;
pub mod manager;
pub mod views;

pub use manager::{ManagerError, ManagerResult, WaitlistManager};
pub use views::{DisplayView, EntryView, PersonalView, StatsView};
