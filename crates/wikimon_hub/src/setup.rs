use crate::config_flow::ConfigFlow;
use crate::coordinator::DataUpdateCoordinator;
use crate::device_registry::DeviceRegistry;
use crate::error::SetupError;
use crate::sensor::{MediaWikiSensor, sensors_for};
use futures::future::try_join_all;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use wikimon_domain::{ConfigEntry, DOMAIN, FALLBACK_UPDATE_INTERVAL};
use wikimon_mw_api::ClientConnector;
use wikimon_telemetry::TelemetryEvent;

/// Runtime state of a set-up config entry.
pub struct LoadedEntry<K: ClientConnector> {
    pub entry: ConfigEntry,
    /// Coordinators keyed by instance url.
    pub coordinators: BTreeMap<String, Arc<DataUpdateCoordinator<K>>>,
    pub sensors: Vec<MediaWikiSensor<K>>,
}

impl<K: ClientConnector + 'static> LoadedEntry<K> {
    pub fn coordinator(&self, url: &str) -> Option<&Arc<DataUpdateCoordinator<K>>> {
        self.coordinators.get(url)
    }

    pub fn sensors_for_instance<'a>(
        &'a self,
        url: &str,
    ) -> impl Iterator<Item = &'a MediaWikiSensor<K>> + use<'a, K> {
        let url = url.to_owned();
        self.sensors.iter().filter(move |s| s.coordinator().url() == url)
    }
}

/// Owns the connector and device registry shared by every loaded entry.
pub struct Hub<K: ClientConnector> {
    connector: Arc<K>,
    device_registry: Mutex<DeviceRegistry>,
    update_interval: Duration,
}

impl<K: ClientConnector + 'static> Hub<K> {
    pub fn new(connector: K) -> Self {
        Self {
            connector: Arc::new(connector),
            device_registry: Mutex::new(DeviceRegistry::new()),
            update_interval: FALLBACK_UPDATE_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval;
        self
    }

    #[must_use]
    pub fn with_device_registry(mut self, registry: DeviceRegistry) -> Self {
        self.device_registry = Mutex::new(registry);
        self
    }

    pub fn device_registry(&self) -> MutexGuard<'_, DeviceRegistry> {
        self.device_registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config_flow(&self) -> ConfigFlow<K> {
        ConfigFlow::new(Arc::clone(&self.connector))
    }

    /// Create a coordinator per instance, refresh each once, start polling
    /// (unless disabled for the entry), reconcile devices and build sensors.
    pub async fn setup_entry(&self, entry: &ConfigEntry) -> Result<LoadedEntry<K>, SetupError> {
        let interval = (!entry.pref_disable_polling).then_some(self.update_interval);

        let mut coordinators = BTreeMap::new();
        for url in entry.instance_urls() {
            coordinators.entry(url.to_string()).or_insert_with(|| {
                Arc::new(
                    DataUpdateCoordinator::new(Arc::clone(&self.connector), url)
                        .with_update_interval(interval),
                )
            });
        }

        try_join_all(coordinators.values().map(|coordinator| async move {
            coordinator
                .refresh()
                .await
                .map_err(|source| SetupError::NotReady { url: coordinator.url(), source })
        }))
        .await?;

        if !entry.pref_disable_polling {
            for coordinator in coordinators.values() {
                coordinator.subscribe();
            }
        }

        cleanup_device_registry(&mut self.device_registry(), entry);

        let ordered: Vec<_> = coordinators.values().cloned().collect();
        let sensors = sensors_for(&ordered);
        {
            let mut registry = self.device_registry();
            for sensor in &sensors {
                registry.get_or_create(entry.entry_id, sensor.device_info());
            }
        }

        tracing::info!(
            entry_id = %entry.entry_id,
            instances = coordinators.len(),
            sensors = sensors.len(),
            polling = !entry.pref_disable_polling,
            "Config entry set up"
        );
        TelemetryEvent::entry_loaded(entry.entry_id, coordinators.len(), !entry.pref_disable_polling).emit();

        Ok(LoadedEntry {
            entry: entry.clone(),
            coordinators,
            sensors,
        })
    }

    /// Stop every scheduled refresh of the entry.
    pub fn unload_entry(&self, loaded: LoadedEntry<K>) -> bool {
        for coordinator in loaded.coordinators.values() {
            coordinator.unsubscribe();
        }
        tracing::info!(entry_id = %loaded.entry.entry_id, "Config entry unloaded");
        TelemetryEvent::entry_unloaded(loaded.entry.entry_id).emit();
        true
    }
}

/// Unlink the entry from devices whose instance is no longer configured.
pub fn cleanup_device_registry(registry: &mut DeviceRegistry, entry: &ConfigEntry) {
    for device in registry.entries_for_config_entry(entry.entry_id) {
        let stale = device
            .identifiers
            .iter()
            .find(|(domain, url)| domain == DOMAIN && !entry.tracks(url));

        if let Some((_, url)) = stale {
            tracing::debug!(
                device_id = %device.id,
                url = %url,
                entry_id = %entry.entry_id,
                "Unlinking device for untracked instance from config entry"
            );
            registry.remove_config_entry(&device.id, entry.entry_id);
            TelemetryEvent::device_unlinked(&device.id, url, entry.entry_id).emit();
        }
    }
}
