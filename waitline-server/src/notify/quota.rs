//! Per-business message quotas
//!
//! Checked at dispatch time, before the provider is contacted. A rejected
//! reservation surfaces on the channel as a failed delivery with a quota
//! message, so operators see it in the same place as any other send failure.

use chrono::{NaiveDate, Utc};
use dashmap::DashMap;

pub trait MessageQuota: Send + Sync {
    /// Reserve one outbound message for a business. `false` means the quota
    /// is exhausted and nothing must be sent.
    fn try_reserve(&self, business_id: &str) -> bool;
}

/// No quota enforcement
pub struct Unmetered;

impl MessageQuota for Unmetered {
    fn try_reserve(&self, _business_id: &str) -> bool {
        true
    }
}

/// Fixed per-business daily message cap, counted in UTC days. Counters for
/// past days are left behind and cleaned up lazily on access.
pub struct DailyQuota {
    limit: u64,
    counters: DashMap<String, (NaiveDate, u64)>,
}

impl DailyQuota {
    pub fn new(limit: u64) -> Self {
        Self {
            limit,
            counters: DashMap::new(),
        }
    }
}

impl MessageQuota for DailyQuota {
    fn try_reserve(&self, business_id: &str) -> bool {
        let today = Utc::now().date_naive();
        let mut slot = self
            .counters
            .entry(business_id.to_string())
            .or_insert((today, 0));
        if slot.0 != today {
            *slot = (today, 0);
        }
        if slot.1 >= self.limit {
            return false;
        }
        slot.1 += 1;
        true
    }
}
