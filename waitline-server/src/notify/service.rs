//! Notifier service - drives pending channel deliveries to an outcome

use std::sync::Arc;
use std::time::Duration;

use shared::models::{Channel, DeliveryStatus, Waitlist, WaitlistEntry};

use super::provider::NotificationProvider;
use super::quota::MessageQuota;
use crate::queue::{ManagerResult, WaitlistManager};

pub struct NotifierService {
    manager: Arc<WaitlistManager>,
    provider: Arc<dyn NotificationProvider>,
    quota: Arc<dyn MessageQuota>,
    /// Hard cap on one provider round-trip; a hung gateway becomes a failed
    /// channel instead of a stuck dispatch task
    send_timeout: Duration,
}

impl NotifierService {
    pub fn new(
        manager: Arc<WaitlistManager>,
        provider: Arc<dyn NotificationProvider>,
        quota: Arc<dyn MessageQuota>,
        send_timeout: Duration,
    ) -> Self {
        Self {
            manager,
            provider,
            quota,
            send_timeout,
        }
    }

    /// Dispatch every pending channel of an entry. Called after a `call`
    /// transition commits; each channel resolves to `sent` or `failed`
    /// independently.
    pub async fn dispatch_pending(&self, list: &Waitlist, entry_id: &str) -> ManagerResult<()> {
        let Some(entry) = self.manager.storage().get_entry(entry_id)? else {
            return Ok(());
        };
        let pending: Vec<Channel> = entry
            .notifications
            .iter()
            .filter(|d| d.status == DeliveryStatus::Pending)
            .map(|d| d.channel)
            .collect();

        for channel in pending {
            self.dispatch_channel(list, &entry, channel).await?;
        }
        Ok(())
    }

    /// Operator-initiated retry of one failed channel
    pub async fn retry(
        &self,
        business_id: &str,
        entry_id: &str,
        channel: Channel,
    ) -> ManagerResult<WaitlistEntry> {
        let entry = self
            .manager
            .reset_channel_for_retry(business_id, entry_id, channel)?;
        let list = self.manager.get_list(business_id, &entry.list_id)?;
        self.dispatch_channel(&list, &entry, channel).await
    }

    async fn dispatch_channel(
        &self,
        list: &Waitlist,
        entry: &WaitlistEntry,
        channel: Channel,
    ) -> ManagerResult<WaitlistEntry> {
        let Some(phone) = entry.phone.as_deref() else {
            return self
                .manager
                .mark_channel_failed(&entry.id, channel, "entry has no phone number");
        };

        if !self.quota.try_reserve(&list.business_id) {
            tracing::warn!(
                business_id = %list.business_id,
                entry_id = %entry.id,
                "Message quota exhausted"
            );
            return self
                .manager
                .mark_channel_failed(&entry.id, channel, "daily message quota exceeded");
        }

        let body = compose_ready_message(list, entry);
        match tokio::time::timeout(self.send_timeout, self.provider.send(channel, phone, &body))
            .await
        {
            Ok(Ok(receipt)) => {
                tracing::info!(entry_id = %entry.id, %channel, message_id = %receipt.message_id, "Notification sent");
                self.manager
                    .mark_channel_sent(&entry.id, channel, &receipt.message_id)
            }
            Ok(Err(e)) => {
                tracing::warn!(entry_id = %entry.id, %channel, error = %e, "Notification failed");
                self.manager
                    .mark_channel_failed(&entry.id, channel, &e.to_string())
            }
            Err(_) => {
                let msg = format!("provider timed out after {}ms", self.send_timeout.as_millis());
                tracing::warn!(entry_id = %entry.id, %channel, "{msg}");
                self.manager.mark_channel_failed(&entry.id, channel, &msg)
            }
        }
    }
}

fn compose_ready_message(list: &Waitlist, entry: &WaitlistEntry) -> String {
    match entry.name.as_deref() {
        Some(name) => format!(
            "{name}, your ticket #{} at {} is up. Please come to the host stand.",
            entry.ticket_number, list.name
        ),
        None => format!(
            "Your ticket #{} at {} is up. Please come to the host stand.",
            entry.ticket_number, list.name
        ),
    }
}
