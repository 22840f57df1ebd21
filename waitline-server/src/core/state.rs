use std::sync::Arc;
use std::time::Duration;

use crate::auth::JwtService;
use crate::bus::FanoutBus;
use crate::core::{Config, Result, ServerError};
use crate::notify::{
    DailyQuota, DisabledProvider, HttpGatewayProvider, MessageQuota, NotificationProvider,
    NotifierService, Unmetered,
};
use crate::queue::WaitlistManager;
use crate::storage::WaitlistStorage;

/// Server state - shared references to every service
///
/// Cheap to clone; every field is an `Arc` (or a small immutable config).
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub manager: Arc<WaitlistManager>,
    pub notifier: Arc<NotifierService>,
    jwt_service: Arc<JwtService>,
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ServerState {
    /// Initialize all services:
    /// 1. working directory structure
    /// 2. redb database at `work_dir/database/waitline.redb`
    /// 3. manager, notifier, JWT service
    pub fn initialize(config: &Config) -> Result<Self> {
        let db_dir = std::path::Path::new(&config.work_dir).join("database");
        std::fs::create_dir_all(&db_dir)?;

        let storage = WaitlistStorage::open(db_dir.join("waitline.redb"))?;
        let bus = FanoutBus::new();
        let manager = Arc::new(WaitlistManager::new(
            storage,
            bus,
            config.estimator_window,
        ));

        let provider: Arc<dyn NotificationProvider> = match &config.sms_gateway_url {
            Some(url) => {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(ServerError::Internal(anyhow::anyhow!(
                        "SMS_GATEWAY_URL must be an http(s) URL, got '{url}'"
                    )));
                }
                Arc::new(HttpGatewayProvider::new(url.clone()))
            }
            None => {
                tracing::warn!("SMS_GATEWAY_URL not set, notification sending disabled");
                Arc::new(DisabledProvider)
            }
        };
        let quota: Arc<dyn MessageQuota> = match config.daily_message_quota {
            Some(limit) => Arc::new(DailyQuota::new(limit)),
            None => Arc::new(Unmetered),
        };
        let notifier = Arc::new(NotifierService::new(
            manager.clone(),
            provider,
            quota,
            Duration::from_millis(config.notify_timeout_ms),
        ));

        Ok(Self {
            config: config.clone(),
            manager,
            notifier,
            jwt_service: Arc::new(JwtService::new(config.jwt.clone())),
        })
    }

    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    /// Spawn background tasks. Currently one: the change-feed forwarder,
    /// which re-publishes typed change events onto the refresh topics.
    /// The manager also publishes directly after each commit; consumers
    /// debounce, so the duplication costs nothing and either path alone is
    /// enough to keep screens fresh.
    pub fn start_background_tasks(&self) {
        let manager = self.manager.clone();
        let bus = manager.bus().clone();
        let mut changes = manager.subscribe_changes();
        tokio::spawn(async move {
            use shared::message::Topic;
            loop {
                match changes.recv().await {
                    Ok(change) => {
                        bus.publish(&Topic::List(change.list_id.clone()));
                        bus.publish(&Topic::Display(change.display_token.clone()));
                        if let Some(token) = &change.entry_token {
                            bus.publish(&Topic::Entry(token.clone()));
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        tracing::debug!(skipped = n, "Change feed lagged");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(work_dir: &std::path::Path) -> Config {
        Config::with_overrides(work_dir.to_str().unwrap(), 0).unwrap()
    }

    #[test]
    fn initialize_rejects_malformed_gateway_url() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.sms_gateway_url = Some("gateway.example.com".to_string());

        let err = ServerState::initialize(&config).unwrap_err();
        assert!(matches!(err, ServerError::Internal(_)));
    }

    #[test]
    fn initialize_builds_services_over_work_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.sms_gateway_url = Some("https://gateway.example.com".to_string());

        let state = ServerState::initialize(&config).unwrap();
        assert!(dir.path().join("database").join("waitline.redb").exists());
        assert_eq!(state.manager.lists("any-biz").unwrap().len(), 0);
    }
}
