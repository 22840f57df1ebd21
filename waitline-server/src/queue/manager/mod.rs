//! WaitlistManager - entry lifecycle and ticket assignment
//!
//! All entry mutations go through here. Each operation follows the same
//! shape:
//!
//! ```text
//! operation(business_id, ...)
//!     ├─ 1. Begin write transaction
//!     ├─ 2. Re-read current entry state (optimistic check)
//!     ├─ 3. Validate the transition against the status graph
//!     ├─ 4. Apply the mutation
//!     ├─ 5. Commit
//!     └─ 6. Publish refresh signals (bus topics + change feed)
//! ```
//!
//! redb serializes write transactions, so the re-read inside the
//! transaction linearizes concurrent conflicting transitions on one entry:
//! the loser observes the winner's committed status and fails the legality
//! check with a conflict instead of silently overwriting.
//!
//! Publishing happens strictly after commit. A slow consumer can never hold
//! open a transaction, and a lost signal is tolerated because consumers
//! re-read on their own schedule anyway.

mod error;
pub use error::*;

#[cfg(test)]
mod tests;

use chrono::Utc;
use shared::message::{EntryChange, Topic};
use shared::models::{
    Channel, ChannelDelivery, CheckInInput, DeliveryStatus, EntryStatus, EntryUpdate, Waitlist,
    WaitlistCreate, WaitlistEntry, WaitlistUpdate,
};
use tokio::sync::broadcast;

use crate::bus::FanoutBus;
use crate::queue::views::{self, DisplayView, EntryView, PersonalView, StatsView};
use crate::storage::WaitlistStorage;
use crate::utils::{opaque_token, validation};

/// Change feed capacity; the feed is advisory, lag only costs a redundant
/// reload
const CHANGE_CHANNEL_CAPACITY: usize = 1024;

/// Waitlist queue manager
pub struct WaitlistManager {
    storage: WaitlistStorage,
    bus: FanoutBus,
    /// Typed post-commit change feed, the second (redundant) trigger source
    /// for the fan-out bus
    change_tx: broadcast::Sender<EntryChange>,
    estimator_window: usize,
}

impl WaitlistManager {
    pub fn new(storage: WaitlistStorage, bus: FanoutBus, estimator_window: usize) -> Self {
        let (change_tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            storage,
            bus,
            change_tx,
            estimator_window,
        }
    }

    /// Create a manager over in-memory storage (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Self {
        let storage = WaitlistStorage::open_in_memory().expect("in-memory storage");
        Self::new(
            storage,
            FanoutBus::new(),
            crate::queue::estimator::DEFAULT_SAMPLE_WINDOW,
        )
    }

    pub fn storage(&self) -> &WaitlistStorage {
        &self.storage
    }

    pub fn bus(&self) -> &FanoutBus {
        &self.bus
    }

    /// Subscribe to the typed change feed
    pub fn subscribe_changes(&self) -> broadcast::Receiver<EntryChange> {
        self.change_tx.subscribe()
    }

    // ========== Lists ==========

    pub fn create_list(
        &self,
        business_id: &str,
        input: WaitlistCreate,
    ) -> ManagerResult<Waitlist> {
        if input.name.trim().is_empty() {
            return Err(ManagerError::validation("name must not be empty"));
        }

        let list = Waitlist {
            id: uuid::Uuid::new_v4().to_string(),
            business_id: business_id.to_string(),
            location_id: input.location_id,
            name: input.name,
            list_type: input.list_type,
            accepts_name: input.accepts_name,
            accepts_phone: input.accepts_phone,
            accepts_email: input.accepts_email,
            seating_options: input.seating_options,
            kiosk_enabled: input.kiosk_enabled,
            display_enabled: input.display_enabled,
            display_options: input.display_options.unwrap_or_default(),
            display_token: opaque_token(),
            average_wait_override: input.average_wait_override,
            created_at: Utc::now(),
        };
        self.storage.create_list(&list)?;
        tracing::info!(list_id = %list.id, business_id, "Waitlist created");
        Ok(list)
    }

    pub fn update_list(
        &self,
        business_id: &str,
        list_id: &str,
        update: WaitlistUpdate,
    ) -> ManagerResult<Waitlist> {
        let mut list = self.scoped_list(business_id, list_id)?;

        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(ManagerError::validation("name must not be empty"));
            }
            list.name = name;
        }
        if let Some(v) = update.list_type {
            list.list_type = v;
        }
        if let Some(v) = update.accepts_name {
            list.accepts_name = v;
        }
        if let Some(v) = update.accepts_phone {
            list.accepts_phone = v;
        }
        if let Some(v) = update.accepts_email {
            list.accepts_email = v;
        }
        if let Some(v) = update.seating_options {
            list.seating_options = v;
        }
        if let Some(v) = update.kiosk_enabled {
            list.kiosk_enabled = v;
        }
        if let Some(v) = update.display_enabled {
            list.display_enabled = v;
        }
        if let Some(v) = update.display_options {
            list.display_options = v;
        }
        if let Some(v) = update.average_wait_override {
            list.average_wait_override = v;
        }

        self.storage.update_list(&list)?;
        self.publish_list(&list);
        Ok(list)
    }

    pub fn get_list(&self, business_id: &str, list_id: &str) -> ManagerResult<Waitlist> {
        self.scoped_list(business_id, list_id)
    }

    pub fn lists(&self, business_id: &str) -> ManagerResult<Vec<Waitlist>> {
        Ok(self.storage.lists_for_business(business_id)?)
    }

    /// Archive every active entry and start a new numbering epoch.
    /// Returns the number of entries archived.
    pub fn clear_list(&self, business_id: &str, list_id: &str) -> ManagerResult<usize> {
        let list = self.scoped_list(business_id, list_id)?;
        let archived = self.storage.clear_list(list_id)?;

        // Every archived customer's status page gets its own refresh
        for entry in &archived {
            self.publish_entry(&list, entry);
        }
        if archived.is_empty() {
            self.publish_list(&list);
        }

        tracing::info!(list_id, count = archived.len(), "Waitlist cleared");
        Ok(archived.len())
    }

    // ========== Check-in ==========

    /// Create a new entry: validate against the list configuration, assign
    /// the next ticket atomically with persistence, and look up loyalty
    /// history. Used by operator add, kiosk and customer self-check-in alike.
    pub fn check_in(&self, list: &Waitlist, input: CheckInInput) -> ManagerResult<WaitlistEntry> {
        let draft = self.validate_check_in(list, input)?;
        let entry = self.storage.create_entry(&list.business_id, draft)?;

        tracing::info!(
            list_id = %list.id,
            entry_id = %entry.id,
            ticket = entry.ticket_number,
            epoch = entry.epoch,
            returning = entry.is_returning,
            "Check-in"
        );
        self.publish_entry(list, &entry);
        Ok(entry)
    }

    fn validate_check_in(
        &self,
        list: &Waitlist,
        input: CheckInInput,
    ) -> ManagerResult<WaitlistEntry> {
        // Fields the list is configured to collect are required; phone in
        // particular, since calling a customer without one is impossible
        let name = match (list.accepts_name, input.name) {
            (true, Some(name)) => {
                validation::validate_name(&name).map_err(ManagerError::Validation)?;
                Some(name)
            }
            (true, None) => return Err(ManagerError::validation("name is required")),
            (false, _) => None,
        };

        let phone = match (list.accepts_phone, input.phone) {
            (true, Some(raw)) => {
                Some(validation::normalize_phone(&raw).map_err(ManagerError::Validation)?)
            }
            (true, None) => return Err(ManagerError::validation("phone is required")),
            (false, _) => None,
        };

        let email = match (list.accepts_email, input.email) {
            (true, Some(email)) => {
                validation::validate_email(&email).map_err(ManagerError::Validation)?;
                Some(email)
            }
            _ => None,
        };

        if let Some(size) = input.party_size {
            validation::validate_party_size(size).map_err(ManagerError::Validation)?;
        }

        let seating_preference = match input.seating_preference {
            Some(pref) if !pref.is_empty() => {
                if !list.seating_options.is_empty() && !list.seating_options.contains(&pref) {
                    return Err(ManagerError::validation(format!(
                        "seating_preference '{pref}' is not offered by this list"
                    )));
                }
                Some(pref)
            }
            _ => None,
        };

        let now = Utc::now();
        Ok(WaitlistEntry {
            id: uuid::Uuid::new_v4().to_string(),
            list_id: list.id.clone(),
            token: opaque_token(),
            name,
            phone,
            email,
            party_size: input.party_size,
            seating_preference,
            // Assigned by storage inside the commit transaction
            epoch: 0,
            ticket_number: 0,
            status: EntryStatus::Waiting,
            created_at: now,
            updated_at: now,
            notified_at: None,
            notifications: vec![],
            visits_count: 0,
            is_returning: false,
        })
    }

    // ========== Transitions ==========

    /// Operator "Call": `waiting -> notified`. Sets `notified_at` (exactly
    /// once, never cleared) and seeds a pending delivery record per
    /// requested channel. Actual dispatch is decoupled and happens after
    /// this commits.
    pub fn call(
        &self,
        business_id: &str,
        entry_id: &str,
        channels: &[Channel],
    ) -> ManagerResult<WaitlistEntry> {
        self.transition(business_id, entry_id, EntryStatus::Notified, "call", |entry| {
            if entry.notified_at.is_none() {
                entry.notified_at = Some(Utc::now());
            }
            for channel in channels {
                if entry.delivery(*channel).is_none() {
                    entry.notifications.push(ChannelDelivery::pending(*channel));
                }
            }
        })
    }

    /// Operator "Check-in" of a called customer: `notified -> seated`
    pub fn seat(&self, business_id: &str, entry_id: &str) -> ManagerResult<WaitlistEntry> {
        self.transition(business_id, entry_id, EntryStatus::Seated, "seat", |_| {})
    }

    /// Operator "No show": `notified -> archived` only. The entry keeps its
    /// `notified_at`, which is what marks it as a no-show for stats (and
    /// what excludes it from estimator samples).
    pub fn no_show(&self, business_id: &str, entry_id: &str) -> ManagerResult<WaitlistEntry> {
        self.guarded_transition(
            business_id,
            entry_id,
            EntryStatus::Archived,
            "no-show",
            Some(EntryStatus::Notified),
            |_| {},
        )
    }

    /// Operator "Archive"/"Remove": `waiting | notified -> archived`
    pub fn archive(&self, business_id: &str, entry_id: &str) -> ManagerResult<WaitlistEntry> {
        self.transition(business_id, entry_id, EntryStatus::Archived, "archive", |_| {})
    }

    /// Customer self-cancel via personal token: any non-terminal
    /// `-> cancelled`
    pub fn cancel_by_token(&self, token: &str) -> ManagerResult<WaitlistEntry> {
        let entry = self
            .storage
            .get_entry_by_token(token)?
            .ok_or_else(|| ManagerError::not_found("Entry not found"))?;
        let list = self.list_of(&entry)?;
        self.transition(&list.business_id, &entry.id, EntryStatus::Cancelled, "cancel", |_| {})
    }

    /// Edit customer fields while the entry is still active. Ticket number,
    /// creation time and status are untouchable.
    pub fn update_entry(
        &self,
        business_id: &str,
        entry_id: &str,
        update: EntryUpdate,
    ) -> ManagerResult<WaitlistEntry> {
        let txn = self.storage.begin_write()?;
        let mut entry = self.storage.get_entry_txn(&txn, entry_id)?;
        let list = self.scoped_entry_list(business_id, &entry)?;

        if !entry.status.is_active() {
            return Err(ManagerError::InvalidTransition {
                from: entry.status,
                attempted: "edit",
            });
        }

        if let Some(name) = update.name {
            validation::validate_name(&name).map_err(ManagerError::Validation)?;
            entry.name = Some(name);
        }
        if let Some(raw) = update.phone {
            entry.phone = Some(validation::normalize_phone(&raw).map_err(ManagerError::Validation)?);
        }
        if let Some(size) = update.party_size {
            validation::validate_party_size(size).map_err(ManagerError::Validation)?;
            entry.party_size = Some(size);
        }
        if let Some(pref) = update.seating_preference {
            if !list.seating_options.is_empty() && !list.seating_options.contains(&pref) {
                return Err(ManagerError::validation(format!(
                    "seating_preference '{pref}' is not offered by this list"
                )));
            }
            entry.seating_preference = Some(pref);
        }
        entry.updated_at = Utc::now();

        self.storage.put_entry_txn(&txn, &entry)?;
        txn.commit().map_err(crate::storage::StorageError::from)?;
        self.publish_entry(&list, &entry);
        Ok(entry)
    }

    fn transition(
        &self,
        business_id: &str,
        entry_id: &str,
        next: EntryStatus,
        attempted: &'static str,
        mutate: impl FnOnce(&mut WaitlistEntry),
    ) -> ManagerResult<WaitlistEntry> {
        self.guarded_transition(business_id, entry_id, next, attempted, None, mutate)
    }

    /// Core transition: re-read inside the write transaction, check the
    /// status graph (and an optional exact-predecessor guard), mutate,
    /// commit, publish.
    fn guarded_transition(
        &self,
        business_id: &str,
        entry_id: &str,
        next: EntryStatus,
        attempted: &'static str,
        required_from: Option<EntryStatus>,
        mutate: impl FnOnce(&mut WaitlistEntry),
    ) -> ManagerResult<WaitlistEntry> {
        let txn = self.storage.begin_write()?;
        let mut entry = self.storage.get_entry_txn(&txn, entry_id)?;
        let list = self.scoped_entry_list(business_id, &entry)?;

        let legal = entry.status.can_transition_to(next)
            && required_from.is_none_or(|required| entry.status == required);
        if !legal {
            return Err(ManagerError::InvalidTransition {
                from: entry.status,
                attempted,
            });
        }

        entry.status = next;
        entry.updated_at = Utc::now();
        mutate(&mut entry);

        self.storage.put_entry_txn(&txn, &entry)?;
        txn.commit().map_err(crate::storage::StorageError::from)?;

        tracing::info!(entry_id, status = %entry.status, "Entry transition: {attempted}");
        self.publish_entry(&list, &entry);
        Ok(entry)
    }

    // ========== Notification delivery state ==========

    /// Record a successful provider hand-off: channel `-> sent`, remember
    /// the provider message id for webhook correlation.
    pub fn mark_channel_sent(
        &self,
        entry_id: &str,
        channel: Channel,
        provider_message_id: &str,
    ) -> ManagerResult<WaitlistEntry> {
        let entry = self.mutate_channel(None, entry_id, channel, |delivery| {
            delivery.status = DeliveryStatus::Sent;
            delivery.provider_message_id = Some(provider_message_id.to_string());
            delivery.sent_at = Some(Utc::now());
            delivery.error = None;
            Ok(())
        })?;

        // Index outside the entry txn is fine: the webhook tolerates an
        // unknown message id
        let txn = self.storage.begin_write()?;
        self.storage
            .put_message_index_txn(&txn, provider_message_id, entry_id)?;
        txn.commit().map_err(crate::storage::StorageError::from)?;
        Ok(entry)
    }

    /// Record a dispatch failure: channel `-> failed`, raw error retained
    /// for operator diagnosis.
    pub fn mark_channel_failed(
        &self,
        entry_id: &str,
        channel: Channel,
        error: &str,
    ) -> ManagerResult<WaitlistEntry> {
        self.mutate_channel(None, entry_id, channel, |delivery| {
            delivery.status = DeliveryStatus::Failed;
            delivery.error = Some(error.to_string());
            Ok(())
        })
    }

    /// Reset a failed channel to pending ahead of a manual retry. Retrying a
    /// channel that is not `failed` is a conflict; `sent`/`delivered` must
    /// never be double-messaged.
    pub fn reset_channel_for_retry(
        &self,
        business_id: &str,
        entry_id: &str,
        channel: Channel,
    ) -> ManagerResult<WaitlistEntry> {
        self.mutate_channel(Some(business_id), entry_id, channel, |delivery| {
            if delivery.status != DeliveryStatus::Failed {
                return Err(ManagerError::ChannelState {
                    channel,
                    status: delivery.status,
                });
            }
            delivery.status = DeliveryStatus::Pending;
            Ok(())
        })
    }

    /// Provider delivery callback: advance `sent -> delivered`. Idempotent;
    /// unknown ids and already-delivered channels are no-ops.
    pub fn mark_delivered(&self, provider_message_id: &str) -> ManagerResult<()> {
        let Some(entry) = self.storage.find_entry_by_message_id(provider_message_id)? else {
            tracing::debug!(provider_message_id, "Delivery callback for unknown message");
            return Ok(());
        };

        let Some(channel) = entry
            .notifications
            .iter()
            .find(|d| d.provider_message_id.as_deref() == Some(provider_message_id))
            .map(|d| d.channel)
        else {
            return Ok(());
        };

        self.mutate_channel(None, &entry.id, channel, |delivery| {
            if delivery.status == DeliveryStatus::Sent {
                delivery.status = DeliveryStatus::Delivered;
                delivery.delivered_at = Some(Utc::now());
            }
            Ok(())
        })?;
        Ok(())
    }

    fn mutate_channel(
        &self,
        business_id: Option<&str>,
        entry_id: &str,
        channel: Channel,
        mutate: impl FnOnce(&mut ChannelDelivery) -> ManagerResult<()>,
    ) -> ManagerResult<WaitlistEntry> {
        let txn = self.storage.begin_write()?;
        let mut entry = self.storage.get_entry_txn(&txn, entry_id)?;
        let list = match business_id {
            Some(business_id) => self.scoped_entry_list(business_id, &entry)?,
            None => self.list_of(&entry)?,
        };

        let delivery = entry
            .delivery_mut(channel)
            .ok_or_else(|| ManagerError::not_found(format!("No {channel} delivery on entry")))?;
        mutate(delivery)?;
        entry.updated_at = Utc::now();

        self.storage.put_entry_txn(&txn, &entry)?;
        txn.commit().map_err(crate::storage::StorageError::from)?;
        self.publish_entry(&list, &entry);
        Ok(entry)
    }

    // ========== Read APIs ==========

    /// Operator table: active entries with derived positions
    pub fn active_entries(
        &self,
        business_id: &str,
        list_id: &str,
    ) -> ManagerResult<Vec<EntryView>> {
        self.scoped_list(business_id, list_id)?;
        let entries = self.storage.entries_for_list(list_id)?;
        Ok(views::active_entries(&entries))
    }

    /// Operator stats, all derived by query
    pub fn stats(&self, business_id: &str, list_id: &str) -> ManagerResult<StatsView> {
        let list = self.scoped_list(business_id, list_id)?;
        let entries = self.storage.entries_for_list(list_id)?;
        Ok(views::stats(&list, &entries, self.estimator_window))
    }

    /// Public display board, by display token. `None` if the token is
    /// unknown or the list has its display disabled.
    pub fn display_view(&self, display_token: &str) -> ManagerResult<Option<DisplayView>> {
        let Some(list) = self.storage.get_list_by_display_token(display_token)? else {
            return Ok(None);
        };
        if !list.display_enabled {
            return Ok(None);
        }
        let entries = self.storage.entries_for_list(&list.id)?;
        Ok(Some(views::display(&list, &entries, self.estimator_window)))
    }

    /// List behind a display token, for the kiosk write path
    pub fn kiosk_list(&self, display_token: &str) -> ManagerResult<Option<Waitlist>> {
        let Some(list) = self.storage.get_list_by_display_token(display_token)? else {
            return Ok(None);
        };
        Ok(list.kiosk_enabled.then_some(list))
    }

    /// One customer's own view, by personal token
    pub fn personal_view(&self, entry_token: &str) -> ManagerResult<Option<PersonalView>> {
        let Some(entry) = self.storage.get_entry_by_token(entry_token)? else {
            return Ok(None);
        };
        let list = self.list_of(&entry)?;
        let entries = self.storage.entries_for_list(&entry.list_id)?;
        Ok(Some(views::personal(
            &list,
            &entries,
            &entry,
            self.estimator_window,
        )))
    }

    // ========== Internals ==========

    fn scoped_list(&self, business_id: &str, list_id: &str) -> ManagerResult<Waitlist> {
        let list = self
            .storage
            .get_list(list_id)?
            .ok_or_else(|| ManagerError::not_found(format!("List {list_id} not found")))?;
        if list.business_id != business_id {
            // Hide other tenants' lists entirely
            return Err(ManagerError::not_found(format!("List {list_id} not found")));
        }
        Ok(list)
    }

    fn list_of(&self, entry: &WaitlistEntry) -> ManagerResult<Waitlist> {
        self.storage
            .get_list(&entry.list_id)?
            .ok_or_else(|| ManagerError::not_found(format!("List {} not found", entry.list_id)))
    }

    fn scoped_entry_list(
        &self,
        business_id: &str,
        entry: &WaitlistEntry,
    ) -> ManagerResult<Waitlist> {
        let list = self.list_of(entry)?;
        if list.business_id != business_id {
            return Err(ManagerError::not_found(format!("Entry {} not found", entry.id)));
        }
        Ok(list)
    }

    /// Post-commit fan-out for an entry mutation: list topic, display topic,
    /// the customer's personal topic, and the typed change feed.
    fn publish_entry(&self, list: &Waitlist, entry: &WaitlistEntry) {
        self.bus.publish(&Topic::List(list.id.clone()));
        self.bus.publish(&Topic::Display(list.display_token.clone()));
        self.bus.publish(&Topic::Entry(entry.token.clone()));
        let _ = self.change_tx.send(EntryChange {
            list_id: list.id.clone(),
            display_token: list.display_token.clone(),
            entry_id: Some(entry.id.clone()),
            entry_token: Some(entry.token.clone()),
        });
    }

    /// Post-commit fan-out for a list-level change
    fn publish_list(&self, list: &Waitlist) {
        self.bus.publish(&Topic::List(list.id.clone()));
        self.bus.publish(&Topic::Display(list.display_token.clone()));
        let _ = self.change_tx.send(EntryChange {
            list_id: list.id.clone(),
            display_token: list.display_token.clone(),
            entry_id: None,
            entry_token: None,
        });
    }
}
