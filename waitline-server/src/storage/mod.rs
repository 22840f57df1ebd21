//! redb-based storage layer for waitlists and entries
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `lists` | `list_id` | `Waitlist` | List configuration |
//! | `entries` | `(list_id, entry_id)` | `WaitlistEntry` | Entry store (retained forever) |
//! | `entry_index` | `entry_id` | `list_id` | Entry lookup by id |
//! | `ticket_counters` | `list_id` | `(epoch, last_ticket)` | Per-list ticket sequencer |
//! | `display_tokens` | `display_token` | `list_id` | Public token resolution |
//! | `entry_tokens` | `entry_token` | `entry_id` | Personal token resolution |
//! | `phone_visits` | `(business_id, phone)` | `u64` | Loyalty visit counts |
//! | `message_index` | `provider_message_id` | `entry_id` | Delivery webhook routing |
//!
//! # Sequencing
//!
//! The ticket counter is read and incremented inside the same write
//! transaction that persists the new entry, so assignment and persistence
//! commit atomically. redb serializes write transactions, which makes the
//! counter safe under arbitrary concurrent check-ins: two simultaneous
//! callers commit in some order and observe N and N+1. An aborted
//! transaction hands out nothing, so duplicates are impossible.
//!
//! # Durability
//!
//! redb commits with `Durability::Immediate` by default: copy-on-write with
//! an atomic pointer swap, so the file stays consistent across power loss.

use redb::{
    Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};
use shared::models::{Waitlist, WaitlistEntry};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// List configuration: key = list_id, value = JSON-serialized Waitlist
const LISTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("lists");

/// Entry store: key = (list_id, entry_id), value = JSON-serialized WaitlistEntry
const ENTRIES_TABLE: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("entries");

/// Entry lookup index: key = entry_id, value = list_id
const ENTRY_INDEX_TABLE: TableDefinition<&str, &str> = TableDefinition::new("entry_index");

/// Ticket sequencer: key = list_id, value = (epoch, last_ticket)
const COUNTERS_TABLE: TableDefinition<&str, (u64, u64)> = TableDefinition::new("ticket_counters");

/// Public display token resolution: key = token, value = list_id
const DISPLAY_TOKENS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("display_tokens");

/// Personal entry token resolution: key = token, value = entry_id
const ENTRY_TOKENS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("entry_tokens");

/// Loyalty visit counts: key = (business_id, phone), value = completed check-ins
const PHONE_VISITS_TABLE: TableDefinition<(&str, &str), u64> =
    TableDefinition::new("phone_visits");

/// Provider message routing: key = provider_message_id, value = entry_id
const MESSAGE_INDEX_TABLE: TableDefinition<&str, &str> = TableDefinition::new("message_index");

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("List not found: {0}")]
    ListNotFound(String),

    #[error("Entry not found: {0}")]
    EntryNotFound(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Waitlist storage backed by redb
#[derive(Clone)]
pub struct WaitlistStorage {
    db: Arc<Database>,
}

impl WaitlistStorage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init_tables(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init_tables(db)
    }

    fn init_tables(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(LISTS_TABLE)?;
            let _ = write_txn.open_table(ENTRIES_TABLE)?;
            let _ = write_txn.open_table(ENTRY_INDEX_TABLE)?;
            let _ = write_txn.open_table(COUNTERS_TABLE)?;
            let _ = write_txn.open_table(DISPLAY_TOKENS_TABLE)?;
            let _ = write_txn.open_table(ENTRY_TOKENS_TABLE)?;
            let _ = write_txn.open_table(PHONE_VISITS_TABLE)?;
            let _ = write_txn.open_table(MESSAGE_INDEX_TABLE)?;
        }
        write_txn.commit()?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Sequencer ==========

    /// Assign the next ticket number for a list within the caller's write
    /// transaction. Returns `(epoch, ticket_number)`.
    ///
    /// The increment only becomes visible when the caller commits, so ticket
    /// assignment and entry persistence are atomic: a failed check-in hands
    /// out nothing.
    pub fn next_ticket(
        &self,
        txn: &WriteTransaction,
        list_id: &str,
    ) -> StorageResult<(u64, u64)> {
        let mut table = txn.open_table(COUNTERS_TABLE)?;
        let (epoch, last) = table
            .get(list_id)?
            .map(|g| g.value())
            .unwrap_or((1, 0));
        let next = last + 1;
        table.insert(list_id, (epoch, next))?;
        Ok((epoch, next))
    }

    /// Current `(epoch, last_ticket)` for a list (read-only)
    pub fn counter_state(&self, list_id: &str) -> StorageResult<(u64, u64)> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(COUNTERS_TABLE)?;
        Ok(table.get(list_id)?.map(|g| g.value()).unwrap_or((1, 0)))
    }

    // ========== Lists ==========

    /// Persist a new list and its display token index
    pub fn create_list(&self, list: &Waitlist) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let payload = serde_json::to_vec(list)?;
            let mut lists = txn.open_table(LISTS_TABLE)?;
            lists.insert(list.id.as_str(), payload.as_slice())?;

            let mut tokens = txn.open_table(DISPLAY_TOKENS_TABLE)?;
            tokens.insert(list.display_token.as_str(), list.id.as_str())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Overwrite an existing list's configuration
    pub fn update_list(&self, list: &Waitlist) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut lists = txn.open_table(LISTS_TABLE)?;
            if lists.get(list.id.as_str())?.is_none() {
                return Err(StorageError::ListNotFound(list.id.clone()));
            }
            let payload = serde_json::to_vec(list)?;
            lists.insert(list.id.as_str(), payload.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn get_list(&self, list_id: &str) -> StorageResult<Option<Waitlist>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(LISTS_TABLE)?;
        match table.get(list_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_list_by_display_token(&self, token: &str) -> StorageResult<Option<Waitlist>> {
        let read_txn = self.db.begin_read()?;
        let tokens = read_txn.open_table(DISPLAY_TOKENS_TABLE)?;
        let Some(list_id) = tokens.get(token)?.map(|g| g.value().to_string()) else {
            return Ok(None);
        };
        let lists = read_txn.open_table(LISTS_TABLE)?;
        match lists.get(list_id.as_str())? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// All lists belonging to a business
    pub fn lists_for_business(&self, business_id: &str) -> StorageResult<Vec<Waitlist>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(LISTS_TABLE)?;
        let mut lists = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let list: Waitlist = serde_json::from_slice(value.value())?;
            if list.business_id == business_id {
                lists.push(list);
            }
        }
        lists.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(lists)
    }

    // ========== Entries ==========

    /// Persist a new entry: ticket assignment, loyalty lookup, entry write
    /// and token indexes all commit in one transaction.
    ///
    /// The caller provides the entry with `epoch`, `ticket_number`,
    /// `visits_count` and `is_returning` unset; the committed values are
    /// filled in and the completed entry returned.
    pub fn create_entry(
        &self,
        business_id: &str,
        mut entry: WaitlistEntry,
    ) -> StorageResult<WaitlistEntry> {
        let txn = self.db.begin_write()?;
        {
            let (epoch, ticket) = self.next_ticket(&txn, &entry.list_id)?;
            entry.epoch = epoch;
            entry.ticket_number = ticket;

            // Loyalty: visit count for this phone at this business, counted
            // before this check-in
            if let Some(phone) = &entry.phone {
                let mut visits = txn.open_table(PHONE_VISITS_TABLE)?;
                let prior = visits
                    .get((business_id, phone.as_str()))?
                    .map(|g| g.value())
                    .unwrap_or(0);
                visits.insert((business_id, phone.as_str()), prior + 1)?;
                entry.visits_count = prior + 1;
                entry.is_returning = prior > 0;
            }

            let payload = serde_json::to_vec(&entry)?;
            let mut entries = txn.open_table(ENTRIES_TABLE)?;
            entries.insert((entry.list_id.as_str(), entry.id.as_str()), payload.as_slice())?;

            let mut index = txn.open_table(ENTRY_INDEX_TABLE)?;
            index.insert(entry.id.as_str(), entry.list_id.as_str())?;

            let mut tokens = txn.open_table(ENTRY_TOKENS_TABLE)?;
            tokens.insert(entry.token.as_str(), entry.id.as_str())?;
        }
        txn.commit()?;
        Ok(entry)
    }

    /// Load an entry inside a write transaction (for read-check-write
    /// transitions)
    pub fn get_entry_txn(
        &self,
        txn: &WriteTransaction,
        entry_id: &str,
    ) -> StorageResult<WaitlistEntry> {
        let index = txn.open_table(ENTRY_INDEX_TABLE)?;
        let Some(list_id) = index.get(entry_id)?.map(|g| g.value().to_string()) else {
            return Err(StorageError::EntryNotFound(entry_id.to_string()));
        };
        let entries = txn.open_table(ENTRIES_TABLE)?;
        match entries.get((list_id.as_str(), entry_id))? {
            Some(guard) => Ok(serde_json::from_slice(guard.value())?),
            None => Err(StorageError::EntryNotFound(entry_id.to_string())),
        }
    }

    /// Overwrite an entry inside a write transaction
    pub fn put_entry_txn(
        &self,
        txn: &WriteTransaction,
        entry: &WaitlistEntry,
    ) -> StorageResult<()> {
        let payload = serde_json::to_vec(entry)?;
        let mut entries = txn.open_table(ENTRIES_TABLE)?;
        entries.insert((entry.list_id.as_str(), entry.id.as_str()), payload.as_slice())?;
        Ok(())
    }

    /// Record a provider message id for webhook routing, inside the caller's
    /// transaction
    pub fn put_message_index_txn(
        &self,
        txn: &WriteTransaction,
        provider_message_id: &str,
        entry_id: &str,
    ) -> StorageResult<()> {
        let mut index = txn.open_table(MESSAGE_INDEX_TABLE)?;
        index.insert(provider_message_id, entry_id)?;
        Ok(())
    }

    pub fn get_entry(&self, entry_id: &str) -> StorageResult<Option<WaitlistEntry>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(ENTRY_INDEX_TABLE)?;
        let Some(list_id) = index.get(entry_id)?.map(|g| g.value().to_string()) else {
            return Ok(None);
        };
        let entries = read_txn.open_table(ENTRIES_TABLE)?;
        match entries.get((list_id.as_str(), entry_id))? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_entry_by_token(&self, token: &str) -> StorageResult<Option<WaitlistEntry>> {
        let read_txn = self.db.begin_read()?;
        let tokens = read_txn.open_table(ENTRY_TOKENS_TABLE)?;
        let Some(entry_id) = tokens.get(token)?.map(|g| g.value().to_string()) else {
            return Ok(None);
        };
        drop(tokens);
        drop(read_txn);
        self.get_entry(&entry_id)
    }

    pub fn find_entry_by_message_id(
        &self,
        provider_message_id: &str,
    ) -> StorageResult<Option<WaitlistEntry>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(MESSAGE_INDEX_TABLE)?;
        let Some(entry_id) = index.get(provider_message_id)?.map(|g| g.value().to_string())
        else {
            return Ok(None);
        };
        drop(index);
        drop(read_txn);
        self.get_entry(&entry_id)
    }

    /// All entries of a list (every epoch, every status), ordered by
    /// `(epoch, ticket_number)`; one consistent snapshot
    pub fn entries_for_list(&self, list_id: &str) -> StorageResult<Vec<WaitlistEntry>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ENTRIES_TABLE)?;

        let mut entries = Vec::new();
        let range_start = (list_id, "");
        let range_end = (list_id, "\u{10ffff}");
        for result in table.range(range_start..=range_end)? {
            let (_key, value) = result?;
            let entry: WaitlistEntry = serde_json::from_slice(value.value())?;
            entries.push(entry);
        }

        entries.sort_by_key(|e| (e.epoch, e.ticket_number));
        Ok(entries)
    }

    /// Archive all active entries and start a new numbering epoch, in one
    /// transaction. Returns the archived entries.
    ///
    /// Historical entries keep their `(epoch, ticket_number)` pair, so
    /// analytics over past epochs are unaffected; the next check-in gets
    /// ticket 1 of the new epoch.
    pub fn clear_list(&self, list_id: &str) -> StorageResult<Vec<WaitlistEntry>> {
        let now = chrono::Utc::now();
        let mut archived = Vec::new();

        let txn = self.db.begin_write()?;
        {
            let mut entries = txn.open_table(ENTRIES_TABLE)?;

            let range_start = (list_id, "");
            let range_end = (list_id, "\u{10ffff}");
            let mut to_archive = Vec::new();
            for result in entries.range(range_start..=range_end)? {
                let (_key, value) = result?;
                let entry: WaitlistEntry = serde_json::from_slice(value.value())?;
                if entry.status.is_active() {
                    to_archive.push(entry);
                }
            }

            for mut entry in to_archive {
                entry.status = shared::models::EntryStatus::Archived;
                entry.updated_at = now;
                let payload = serde_json::to_vec(&entry)?;
                entries.insert((list_id, entry.id.as_str()), payload.as_slice())?;
                archived.push(entry);
            }

            let mut counters = txn.open_table(COUNTERS_TABLE)?;
            let (epoch, _last) = counters.get(list_id)?.map(|g| g.value()).unwrap_or((1, 0));
            counters.insert(list_id, (epoch + 1, 0))?;
        }
        txn.commit()?;
        Ok(archived)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared::models::EntryStatus;

    fn test_list(id: &str) -> Waitlist {
        Waitlist {
            id: id.to_string(),
            business_id: "biz-1".to_string(),
            location_id: "loc-1".to_string(),
            name: "Front patio".to_string(),
            list_type: Default::default(),
            accepts_name: true,
            accepts_phone: true,
            accepts_email: false,
            seating_options: vec!["booth".into(), "bar".into()],
            kiosk_enabled: true,
            display_enabled: true,
            display_options: Default::default(),
            display_token: crate::utils::opaque_token(),
            average_wait_override: None,
            created_at: Utc::now(),
        }
    }

    fn test_entry(list_id: &str, id: &str, phone: Option<&str>) -> WaitlistEntry {
        let now = Utc::now();
        WaitlistEntry {
            id: id.to_string(),
            list_id: list_id.to_string(),
            token: crate::utils::opaque_token(),
            name: Some("Alice".to_string()),
            phone: phone.map(str::to_string),
            email: None,
            party_size: Some(2),
            seating_preference: None,
            epoch: 0,
            ticket_number: 0,
            status: EntryStatus::Waiting,
            created_at: now,
            updated_at: now,
            notified_at: None,
            notifications: vec![],
            visits_count: 0,
            is_returning: false,
        }
    }

    #[test]
    fn tickets_are_sequential_within_epoch() {
        let storage = WaitlistStorage::open_in_memory().unwrap();
        let list = test_list("l1");
        storage.create_list(&list).unwrap();

        for expect in 1..=5u64 {
            let e = storage
                .create_entry("biz-1", test_entry("l1", &format!("e{expect}"), None))
                .unwrap();
            assert_eq!(e.epoch, 1);
            assert_eq!(e.ticket_number, expect);
        }
    }

    #[test]
    fn clear_archives_and_bumps_epoch() {
        let storage = WaitlistStorage::open_in_memory().unwrap();
        let list = test_list("l1");
        storage.create_list(&list).unwrap();

        for i in 0..5 {
            storage
                .create_entry("biz-1", test_entry("l1", &format!("e{i}"), None))
                .unwrap();
        }

        let archived = storage.clear_list("l1").unwrap();
        assert_eq!(archived.len(), 5);
        assert!(archived.iter().all(|e| e.status == EntryStatus::Archived));

        // Next check-in starts the new epoch at ticket 1
        let e = storage.create_entry("biz-1", test_entry("l1", "e-new", None)).unwrap();
        assert_eq!(e.epoch, 2);
        assert_eq!(e.ticket_number, 1);

        // Historical entries keep their original numbering
        let all = storage.entries_for_list("l1").unwrap();
        let old: Vec<_> = all.iter().filter(|e| e.epoch == 1).collect();
        assert_eq!(old.len(), 5);
        assert_eq!(old.last().unwrap().ticket_number, 5);
    }

    #[test]
    fn on_disk_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("waitline.redb");

        let list = test_list("l1");
        {
            let storage = WaitlistStorage::open(&path).unwrap();
            storage.create_list(&list).unwrap();
            for i in 0..3 {
                storage
                    .create_entry("biz-1", test_entry("l1", &format!("e{i}"), None))
                    .unwrap();
            }
            assert_eq!(storage.counter_state("l1").unwrap(), (1, 3));
        }

        let storage = WaitlistStorage::open(&path).unwrap();
        assert_eq!(storage.counter_state("l1").unwrap(), (1, 3));
        let entries = storage.entries_for_list("l1").unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries.last().unwrap().ticket_number, 3);

        // Numbering continues where the previous process left off
        let e = storage.create_entry("biz-1", test_entry("l1", "e-next", None)).unwrap();
        assert_eq!((e.epoch, e.ticket_number), (1, 4));
    }

    #[test]
    fn loyalty_counts_by_phone_and_business() {
        let storage = WaitlistStorage::open_in_memory().unwrap();
        storage.create_list(&test_list("l1")).unwrap();

        let first = storage
            .create_entry("biz-1", test_entry("l1", "e1", Some("+34612345678")))
            .unwrap();
        assert_eq!(first.visits_count, 1);
        assert!(!first.is_returning);

        let second = storage
            .create_entry("biz-1", test_entry("l1", "e2", Some("+34612345678")))
            .unwrap();
        assert_eq!(second.visits_count, 2);
        assert!(second.is_returning);

        let other = storage
            .create_entry("biz-1", test_entry("l1", "e3", Some("+34699999999")))
            .unwrap();
        assert!(!other.is_returning);
    }

    #[test]
    fn token_lookups_resolve() {
        let storage = WaitlistStorage::open_in_memory().unwrap();
        let list = test_list("l1");
        storage.create_list(&list).unwrap();
        let entry = storage.create_entry("biz-1", test_entry("l1", "e1", None)).unwrap();

        let by_display = storage
            .get_list_by_display_token(&list.display_token)
            .unwrap()
            .unwrap();
        assert_eq!(by_display.id, "l1");

        let by_token = storage.get_entry_by_token(&entry.token).unwrap().unwrap();
        assert_eq!(by_token.id, "e1");

        assert!(storage.get_entry_by_token("bogus").unwrap().is_none());
    }
}
