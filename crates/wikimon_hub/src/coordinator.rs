use crate::error::UpdateFailed;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::{Duration, Instant};
use tokio::sync::{OnceCell, watch};
use tokio::task::JoinHandle;
use wikimon_domain::{FALLBACK_UPDATE_INTERVAL, Instance, Snapshot};
use wikimon_mw_api::{ClientConnector, MediaWikiClient, MwApiError, SiteInfoProp};
use wikimon_telemetry::TelemetryEvent;

/// What listeners observe after every refresh attempt.
#[derive(Debug, Clone)]
pub struct CoordinatorState {
    pub instance: Instance,
    /// Last successful snapshot; kept as-is when a refresh fails.
    pub data: Option<Arc<Snapshot>>,
    pub last_update_success: bool,
    pub last_error: Option<String>,
    pub last_update: Option<DateTime<Utc>>,
}

impl CoordinatorState {
    fn new(instance: Instance) -> Self {
        Self {
            instance,
            data: None,
            last_update_success: true,
            last_error: None,
            last_update: None,
        }
    }
}

/// Owns the periodic refresh of one instance and caches its last snapshot.
pub struct DataUpdateCoordinator<K: ClientConnector> {
    connector: Arc<K>,
    client: OnceCell<K::Client>,
    state: watch::Sender<CoordinatorState>,
    refresh_lock: tokio::sync::Mutex<()>,
    update_interval: Option<Duration>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<K: ClientConnector + 'static> DataUpdateCoordinator<K> {
    pub fn new(connector: Arc<K>, url: impl Into<String>) -> Self {
        let (state, _) = watch::channel(CoordinatorState::new(Instance::new(url)));
        Self {
            connector,
            client: OnceCell::new(),
            state,
            refresh_lock: tokio::sync::Mutex::new(()),
            update_interval: Some(FALLBACK_UPDATE_INTERVAL),
            task: Mutex::new(None),
        }
    }

    /// `None` disables scheduling entirely, leaving manual refreshes only.
    #[must_use]
    pub fn with_update_interval(mut self, interval: Option<Duration>) -> Self {
        self.update_interval = interval;
        self
    }

    pub fn url(&self) -> String {
        self.state.borrow().instance.url.clone()
    }

    pub fn instance(&self) -> Instance {
        self.state.borrow().instance.clone()
    }

    pub fn name(&self) -> String {
        self.state.borrow().instance.name.clone()
    }

    pub fn data(&self) -> Option<Arc<Snapshot>> {
        self.state.borrow().data.clone()
    }

    pub fn state(&self) -> CoordinatorState {
        self.state.borrow().clone()
    }

    pub fn last_update_success(&self) -> bool {
        self.state.borrow().last_update_success
    }

    pub fn update_interval(&self) -> Option<Duration> {
        self.update_interval
    }

    /// Receiver that is marked changed after every refresh attempt.
    pub fn watch(&self) -> watch::Receiver<CoordinatorState> {
        self.state.subscribe()
    }

    /// Fetch a fresh snapshot. Concurrent calls are serialized.
    pub async fn refresh(&self) -> Result<Arc<Snapshot>, UpdateFailed> {
        let _guard = self.refresh_lock.lock().await;
        let url = self.url();
        let started = Instant::now();

        match self.fetch(&url).await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                let recovered = !self.last_update_success();
                self.state.send_modify(|state| {
                    state.instance.update_name(&snapshot);
                    state.data = Some(Arc::clone(&snapshot));
                    state.last_update_success = true;
                    state.last_error = None;
                    state.last_update = Some(snapshot.fetched_at);
                });

                if recovered {
                    tracing::info!(url = %url, "Fetching MediaWiki data recovered");
                }
                let name = self.name();
                tracing::debug!(url = %url, name = %name, "Refreshed MediaWiki siteinfo");
                TelemetryEvent::refresh_succeeded(&url, name, elapsed_ms(started)).emit();
                Ok(snapshot)
            }
            Err(err) => {
                tracing::error!(url = %url, error = %err, "Error fetching MediaWiki data");
                let message = err.to_string();
                TelemetryEvent::refresh_failed(&url, &message, elapsed_ms(started)).emit();
                self.state.send_modify(|state| {
                    state.last_update_success = false;
                    state.last_error = Some(message);
                });
                Err(UpdateFailed::new(url, err))
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<Snapshot, MwApiError> {
        let client = self
            .client
            .get_or_try_init(|| async { self.connector.connect(url) })
            .await?;
        let info = client
            .site_info(&[SiteInfoProp::Statistics, SiteInfoProp::General])
            .await?;
        Ok(info.into_snapshot())
    }

    /// Start the scheduled refresh task. The first refresh fires one interval
    /// from now since setup has already performed one, and each later one
    /// waits a full interval after the previous refresh completes.
    pub fn subscribe(self: &Arc<Self>) {
        let Some(interval) = self.update_interval else {
            tracing::debug!(url = %self.url(), "Polling disabled, not scheduling refreshes");
            return;
        };

        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let weak: Weak<Self> = Arc::downgrade(self);
        *task = Some(tokio::spawn(async move {
            loop {
                // Measured from the end of the previous refresh.
                tokio::time::sleep(interval).await;
                let Some(coordinator) = weak.upgrade() else {
                    break;
                };
                if let Err(err) = coordinator.refresh().await {
                    tracing::debug!(error = %err, "Scheduled refresh failed");
                }
            }
        }));
        tracing::debug!(url = %self.url(), ?interval, "Scheduled refreshes started");
    }

    /// Stop the scheduled refresh task. Safe to call repeatedly.
    pub fn unsubscribe(&self) {
        let handle = self.task.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(handle) = handle {
            handle.abort();
            tracing::debug!(url = %self.url(), "Scheduled refreshes stopped");
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl<K: ClientConnector> Drop for DataUpdateCoordinator<K> {
    fn drop(&mut self) {
        let task = self.task.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = task.take() {
            handle.abort();
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockConnector, TEST_URL, test_wiki_response};
    use serde_json::json;

    fn coordinator(connector: &MockConnector) -> Arc<DataUpdateCoordinator<MockConnector>> {
        Arc::new(DataUpdateCoordinator::new(Arc::new(connector.clone()), TEST_URL))
    }

    #[tokio::test]
    async fn test_refresh_stores_snapshot_verbatim() {
        let connector = MockConnector::new();
        connector.push_json(TEST_URL, test_wiki_response());
        let coordinator = coordinator(&connector);

        assert_eq!(coordinator.name(), TEST_URL);
        assert!(coordinator.data().is_none());

        let snapshot = coordinator.refresh().await.unwrap();
        assert_eq!(snapshot.statistic("pages"), Some(&json!(100)));
        assert_eq!(snapshot.statistic("images"), Some(&json!(20)));
        assert_eq!(coordinator.name(), "TestWiki");
        assert!(coordinator.last_update_success());
        assert_eq!(coordinator.data().unwrap().generator(), Some("MediaWiki 1.40"));
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_snapshot() {
        let connector = MockConnector::new();
        connector.push_json(TEST_URL, test_wiki_response());
        connector.push_err(
            TEST_URL,
            MwApiError::Deserialize(serde_json::from_str::<serde_json::Value>("{oops").unwrap_err()),
        );
        let coordinator = coordinator(&connector);

        let first = coordinator.refresh().await.unwrap();
        let err = coordinator.refresh().await.unwrap_err();

        assert_eq!(err.url, TEST_URL);
        assert!(matches!(err.source, MwApiError::Deserialize(_)));
        assert!(!coordinator.last_update_success());
        assert!(coordinator.state().last_error.is_some());
        assert_eq!(coordinator.data().unwrap(), first);
        assert_eq!(coordinator.name(), "TestWiki");
    }

    #[tokio::test]
    async fn test_failure_before_first_success_leaves_no_data() {
        let connector = MockConnector::new();
        connector.push_err(
            TEST_URL,
            MwApiError::ApiError { code: "internal_api_error".into(), info: "boom".into() },
        );
        let coordinator = coordinator(&connector);

        assert!(coordinator.refresh().await.is_err());
        assert!(coordinator.data().is_none());
        assert_eq!(coordinator.name(), TEST_URL);
    }

    #[tokio::test]
    async fn test_recovery_after_failure() {
        let connector = MockConnector::new();
        connector.push_err(TEST_URL, MwApiError::MalformedResponse("bad".into()));
        connector.push_json(TEST_URL, test_wiki_response());
        let coordinator = coordinator(&connector);

        assert!(coordinator.refresh().await.is_err());
        assert!(coordinator.refresh().await.is_ok());
        assert!(coordinator.last_update_success());
        assert!(coordinator.state().last_error.is_none());
    }

    #[tokio::test]
    async fn test_client_is_created_lazily_once() {
        let connector = MockConnector::new();
        connector.push_json(TEST_URL, test_wiki_response());
        connector.push_json(TEST_URL, test_wiki_response());
        let coordinator = coordinator(&connector);

        assert_eq!(connector.connects(), 0);
        coordinator.refresh().await.unwrap();
        coordinator.refresh().await.unwrap();
        assert_eq!(connector.connects(), 1);
        assert_eq!(connector.calls(TEST_URL), 2);
    }

    #[tokio::test]
    async fn test_invalid_url_fails_update() {
        let connector = MockConnector::new();
        let coordinator = Arc::new(DataUpdateCoordinator::new(Arc::new(connector.clone()), "not a url"));

        let err = coordinator.refresh().await.unwrap_err();
        assert!(matches!(err.source, MwApiError::InvalidUrl { .. }));
        assert_eq!(connector.connects(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_refreshes_are_serialized() {
        let connector = MockConnector::new();
        connector.set_delay(Duration::from_secs(5));
        connector.push_json(TEST_URL, test_wiki_response());
        connector.push_json(TEST_URL, test_wiki_response());
        let coordinator = coordinator(&connector);

        let (a, b) = tokio::join!(coordinator.refresh(), coordinator.refresh());
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(connector.calls(TEST_URL), 2);
        assert_eq!(connector.max_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_watch_receives_updates() {
        let connector = MockConnector::new();
        connector.push_json(TEST_URL, test_wiki_response());
        let coordinator = coordinator(&connector);
        let mut rx = coordinator.watch();

        coordinator.refresh().await.unwrap();
        assert!(rx.has_changed().unwrap());
        let state = rx.borrow_and_update().clone();
        assert_eq!(state.instance.name, "TestWiki");
        assert!(state.data.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduled_refresh_ticks_every_interval() {
        let connector = MockConnector::new();
        for _ in 0..3 {
            connector.push_json(TEST_URL, test_wiki_response());
        }
        let coordinator = coordinator(&connector);
        coordinator.subscribe();
        assert!(coordinator.is_subscribed());

        // Nothing fires immediately
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(connector.calls(TEST_URL), 0);

        tokio::time::sleep(FALLBACK_UPDATE_INTERVAL).await;
        assert_eq!(connector.calls(TEST_URL), 1);

        tokio::time::sleep(FALLBACK_UPDATE_INTERVAL).await;
        assert_eq!(connector.calls(TEST_URL), 2);
        assert_eq!(coordinator.name(), "TestWiki");
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_refresh_is_followed_by_full_interval() {
        let connector = MockConnector::new();
        for _ in 0..3 {
            connector.push_json(TEST_URL, test_wiki_response());
        }
        connector.set_delay(Duration::from_secs(90));
        let coordinator = Arc::new(
            DataUpdateCoordinator::new(Arc::new(connector.clone()), TEST_URL)
                .with_update_interval(Some(Duration::from_secs(60))),
        );
        coordinator.subscribe();

        // First refresh starts at 60s and completes at 150s
        tokio::time::sleep(Duration::from_secs(151)).await;
        assert_eq!(connector.calls(TEST_URL), 1);
        assert!(coordinator.data().is_some());

        // Next one waits until 210s
        tokio::time::sleep(Duration::from_secs(54)).await;
        assert_eq!(connector.calls(TEST_URL), 1);

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(connector.calls(TEST_URL), 2);
        assert_eq!(connector.max_in_flight(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduled_refresh_continues_after_failure() {
        let connector = MockConnector::new();
        connector.push_err(TEST_URL, MwApiError::MalformedResponse("bad".into()));
        connector.push_json(TEST_URL, test_wiki_response());
        let coordinator = coordinator(&connector);
        coordinator.subscribe();

        tokio::time::sleep(FALLBACK_UPDATE_INTERVAL + Duration::from_secs(1)).await;
        assert!(!coordinator.last_update_success());

        tokio::time::sleep(FALLBACK_UPDATE_INTERVAL).await;
        assert!(coordinator.last_update_success());
        assert_eq!(connector.calls(TEST_URL), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsubscribe_stops_refreshes() {
        let connector = MockConnector::new();
        connector.push_json(TEST_URL, test_wiki_response());
        let coordinator = coordinator(&connector);
        coordinator.subscribe();

        tokio::time::sleep(FALLBACK_UPDATE_INTERVAL + Duration::from_secs(1)).await;
        assert_eq!(connector.calls(TEST_URL), 1);

        coordinator.unsubscribe();
        coordinator.unsubscribe();
        assert!(!coordinator.is_subscribed());

        tokio::time::sleep(FALLBACK_UPDATE_INTERVAL * 3).await;
        assert_eq!(connector.calls(TEST_URL), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_disabled_never_schedules() {
        let connector = MockConnector::new();
        let coordinator = Arc::new(
            DataUpdateCoordinator::new(Arc::new(connector.clone()), TEST_URL).with_update_interval(None),
        );
        coordinator.subscribe();
        assert!(!coordinator.is_subscribed());

        tokio::time::sleep(FALLBACK_UPDATE_INTERVAL * 2).await;
        assert_eq!(connector.calls(TEST_URL), 0);
    }
}
