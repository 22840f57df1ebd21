//! Read-side projections over one entries snapshot
//!
//! Everything here is derived by query from a single storage snapshot and
//! never written back: queue positions, stats counters and the public
//! display board are all recomputed on every read, so they cannot drift from
//! the authoritative `ticket_number` order.

use chrono::Utc;
use serde::Serialize;
use shared::models::{EntryStatus, ListType, Waitlist, WaitlistEntry};

use super::estimator::{self, WaitSample};

/// Operator-facing entry projection: the full entry plus its derived rank
#[derive(Debug, Clone, Serialize)]
pub struct EntryView {
    #[serde(flatten)]
    pub entry: WaitlistEntry,
    /// 1-based rank by ticket number among currently-waiting entries;
    /// `None` once the entry has been called
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_position: Option<usize>,
}

/// Derived per-list stats for the operator dashboard
#[derive(Debug, Clone, Serialize)]
pub struct StatsView {
    /// Tickets currently in `notified`, most recently called first
    pub last_called: Vec<u64>,
    pub estimated_wait_minutes: u32,
    pub waiting_count: usize,
    pub served_today: usize,
    pub no_show_today: usize,
}

/// One row on the public display board, stripped per display settings
#[derive(Debug, Clone, Serialize)]
pub struct BoardEntry {
    pub ticket_number: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub party_size: Option<u32>,
}

/// Public display board (token-scoped, unauthenticated)
#[derive(Debug, Clone, Serialize)]
pub struct DisplayView {
    pub name: String,
    pub list_type: ListType,
    pub kiosk_enabled: bool,
    pub seating_options: Vec<String>,
    pub estimated_wait_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub now_serving: Option<BoardEntry>,
    pub up_next: Vec<BoardEntry>,
}

/// One customer's own status page (entry-token-scoped)
#[derive(Debug, Clone, Serialize)]
pub struct PersonalView {
    pub list_name: String,
    pub ticket_number: u64,
    pub status: EntryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_position: Option<usize>,
    pub estimated_wait_minutes: u32,
}

/// Derived queue position of one entry within a snapshot: 1-based rank by
/// ticket number among `waiting` entries of the same epoch. `None` unless
/// the entry itself is waiting.
pub fn queue_position(entries: &[WaitlistEntry], entry: &WaitlistEntry) -> Option<usize> {
    if entry.status != EntryStatus::Waiting {
        return None;
    }
    let rank = entries
        .iter()
        .filter(|e| {
            e.status == EntryStatus::Waiting
                && e.epoch == entry.epoch
                && e.ticket_number < entry.ticket_number
        })
        .count();
    Some(rank + 1)
}

/// Active entries (`waiting`, `notified`) with derived positions, in ticket
/// order
pub fn active_entries(entries: &[WaitlistEntry]) -> Vec<EntryView> {
    entries
        .iter()
        .filter(|e| e.status.is_active())
        .map(|e| EntryView {
            queue_position: queue_position(entries, e),
            entry: e.clone(),
        })
        .collect()
}

/// Wait samples for the estimator: `(created_at, notified_at)` of the most
/// recently seated entries, bounded to `window`. No-shows (archived after
/// notify) are deliberately excluded.
pub fn wait_samples(entries: &[WaitlistEntry], window: usize) -> Vec<WaitSample> {
    let mut seated: Vec<&WaitlistEntry> = entries
        .iter()
        .filter(|e| e.status == EntryStatus::Seated && e.notified_at.is_some())
        .collect();
    seated.sort_by_key(|e| std::cmp::Reverse(e.notified_at));
    seated
        .into_iter()
        .take(window)
        .filter_map(|e| e.notified_at.map(|n| (e.created_at, n)))
        .collect()
}

fn waiting_count(entries: &[WaitlistEntry]) -> usize {
    entries
        .iter()
        .filter(|e| e.status == EntryStatus::Waiting)
        .count()
}

/// Estimated wait for a snapshot, honoring the list's manual override
pub fn estimated_wait(list: &Waitlist, entries: &[WaitlistEntry], window: usize) -> u32 {
    estimator::estimate_wait(
        &wait_samples(entries, window),
        waiting_count(entries),
        list.average_wait_override,
    )
}

/// Derived stats; `served_today` and `no_show_today` count terminal entries
/// last touched during the current UTC day. An archived entry that passed
/// through `notified` is a no-show; one archived straight from `waiting` is
/// a plain removal and counts in neither bucket.
pub fn stats(list: &Waitlist, entries: &[WaitlistEntry], window: usize) -> StatsView {
    let today = Utc::now().date_naive();

    let mut last_called: Vec<(Option<chrono::DateTime<Utc>>, u64)> = entries
        .iter()
        .filter(|e| e.status == EntryStatus::Notified)
        .map(|e| (e.notified_at, e.ticket_number))
        .collect();
    last_called.sort_by_key(|(at, _)| std::cmp::Reverse(*at));

    StatsView {
        last_called: last_called.into_iter().map(|(_, t)| t).collect(),
        estimated_wait_minutes: estimated_wait(list, entries, window),
        waiting_count: waiting_count(entries),
        served_today: entries
            .iter()
            .filter(|e| {
                e.status == EntryStatus::Seated && e.updated_at.date_naive() == today
            })
            .count(),
        no_show_today: entries
            .iter()
            .filter(|e| {
                e.status == EntryStatus::Archived
                    && e.notified_at.is_some()
                    && e.updated_at.date_naive() == today
            })
            .count(),
    }
}

/// Shorten a customer name for the public board: first name plus last
/// initial ("Alice Garcia" -> "Alice G.")
fn board_name(full: &str) -> String {
    let mut words = full.split_whitespace();
    match (words.next(), words.next()) {
        (Some(first), Some(second)) => {
            let initial: String = second.chars().take(1).collect();
            format!("{first} {initial}.")
        }
        (Some(first), None) => first.to_string(),
        _ => String::new(),
    }
}

fn board_entry(list: &Waitlist, entry: &WaitlistEntry) -> BoardEntry {
    let opts = &list.display_options;
    BoardEntry {
        ticket_number: entry.ticket_number,
        name: if opts.show_names {
            entry.name.as_deref().map(board_name)
        } else {
            None
        },
        party_size: if opts.show_party_size {
            entry.party_size
        } else {
            None
        },
    }
}

/// Public display projection: now-serving is the most recently called entry
/// still in `notified`; up-next is the first N waiting entries in ticket
/// order.
pub fn display(list: &Waitlist, entries: &[WaitlistEntry], window: usize) -> DisplayView {
    let now_serving = entries
        .iter()
        .filter(|e| e.status == EntryStatus::Notified)
        .max_by_key(|e| e.notified_at)
        .map(|e| board_entry(list, e));

    let up_next: Vec<BoardEntry> = entries
        .iter()
        .filter(|e| e.status == EntryStatus::Waiting)
        .take(list.display_options.up_next_limit)
        .map(|e| board_entry(list, e))
        .collect();

    DisplayView {
        name: list.name.clone(),
        list_type: list.list_type,
        kiosk_enabled: list.kiosk_enabled,
        seating_options: list.seating_options.clone(),
        estimated_wait_minutes: estimated_wait(list, entries, window),
        now_serving,
        up_next,
    }
}

/// Personal status projection for one entry
pub fn personal(
    list: &Waitlist,
    entries: &[WaitlistEntry],
    entry: &WaitlistEntry,
    window: usize,
) -> PersonalView {
    PersonalView {
        list_name: list.name.clone(),
        ticket_number: entry.ticket_number,
        status: entry.status,
        queue_position: queue_position(entries, entry),
        estimated_wait_minutes: estimated_wait(list, entries, window),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(ticket: u64, status: EntryStatus) -> WaitlistEntry {
        let now = Utc::now();
        WaitlistEntry {
            id: format!("e{ticket}"),
            list_id: "l1".to_string(),
            token: format!("t{ticket}"),
            name: Some("Alice Garcia".to_string()),
            phone: None,
            email: None,
            party_size: Some(4),
            seating_preference: None,
            epoch: 1,
            ticket_number: ticket,
            status,
            created_at: now - Duration::minutes(30),
            updated_at: now,
            notified_at: if status == EntryStatus::Waiting {
                None
            } else {
                Some(now - Duration::minutes(10))
            },
            notifications: vec![],
            visits_count: 0,
            is_returning: false,
        }
    }

    fn list() -> Waitlist {
        Waitlist {
            id: "l1".to_string(),
            business_id: "b1".to_string(),
            location_id: "loc1".to_string(),
            name: "Main".to_string(),
            list_type: Default::default(),
            accepts_name: true,
            accepts_phone: true,
            accepts_email: false,
            seating_options: vec![],
            kiosk_enabled: false,
            display_enabled: true,
            display_options: Default::default(),
            display_token: "dtok".to_string(),
            average_wait_override: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn position_is_rank_among_waiting_only() {
        let entries = vec![
            entry(1, EntryStatus::Seated),
            entry(2, EntryStatus::Waiting),
            entry(3, EntryStatus::Notified),
            entry(4, EntryStatus::Waiting),
            entry(5, EntryStatus::Waiting),
        ];

        assert_eq!(queue_position(&entries, &entries[1]), Some(1));
        assert_eq!(queue_position(&entries, &entries[3]), Some(2));
        assert_eq!(queue_position(&entries, &entries[4]), Some(3));
        // Called and seated entries hold no position
        assert_eq!(queue_position(&entries, &entries[0]), None);
        assert_eq!(queue_position(&entries, &entries[2]), None);
    }

    #[test]
    fn position_is_stable_over_a_fixed_snapshot() {
        let entries = vec![entry(7, EntryStatus::Waiting), entry(9, EntryStatus::Waiting)];
        let first = queue_position(&entries, &entries[1]);
        let second = queue_position(&entries, &entries[1]);
        assert_eq!(first, second);
        assert_eq!(first, Some(2));
    }

    #[test]
    fn no_show_counts_archived_after_notify_only() {
        let mut removed = entry(1, EntryStatus::Archived);
        removed.notified_at = None; // archived straight from waiting
        let no_show = entry(2, EntryStatus::Archived); // notified_at set
        let seated = entry(3, EntryStatus::Seated);

        let s = stats(&list(), &[removed, no_show, seated], 20);
        assert_eq!(s.no_show_today, 1);
        assert_eq!(s.served_today, 1);
        assert_eq!(s.waiting_count, 0);
    }

    #[test]
    fn display_strips_names_unless_enabled() {
        let entries = vec![entry(1, EntryStatus::Notified), entry(2, EntryStatus::Waiting)];

        let mut l = list();
        let view = display(&l, &entries, 20);
        assert_eq!(view.now_serving.as_ref().unwrap().ticket_number, 1);
        assert!(view.now_serving.unwrap().name.is_none());
        assert!(view.up_next[0].name.is_none());

        l.display_options.show_names = true;
        let view = display(&l, &entries, 20);
        assert_eq!(view.up_next[0].name.as_deref(), Some("Alice G."));
    }

    #[test]
    fn up_next_is_bounded() {
        let mut l = list();
        l.display_options.up_next_limit = 3;
        let entries: Vec<_> = (1..=10).map(|t| entry(t, EntryStatus::Waiting)).collect();
        let view = display(&l, &entries, 20);
        assert_eq!(view.up_next.len(), 3);
        assert_eq!(view.up_next[0].ticket_number, 1);
    }

    #[test]
    fn samples_exclude_no_shows() {
        let seated = entry(1, EntryStatus::Seated);
        let no_show = entry(2, EntryStatus::Archived);
        let samples = wait_samples(&[seated, no_show], 20);
        assert_eq!(samples.len(), 1);
    }
}
