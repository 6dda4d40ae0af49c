use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub enum TelemetryEvent {
    EntryLoaded { entry_id: Uuid, instances: usize, polling: bool, timestamp: DateTime<Utc> },
    EntryUnloaded { entry_id: Uuid, timestamp: DateTime<Utc> },
    RefreshSucceeded { url: String, sitename: String, duration_ms: u64, timestamp: DateTime<Utc> },
    RefreshFailed { url: String, error: String, duration_ms: u64, timestamp: DateTime<Utc> },
    DeviceUnlinked { device_id: String, url: String, entry_id: Uuid, timestamp: DateTime<Utc> },
}

impl TelemetryEvent {
    pub fn entry_loaded(entry_id: Uuid, instances: usize, polling: bool) -> Self {
        Self::EntryLoaded { entry_id, instances, polling, timestamp: Utc::now() }
    }
    pub fn entry_unloaded(entry_id: Uuid) -> Self {
        Self::EntryUnloaded { entry_id, timestamp: Utc::now() }
    }
    pub fn refresh_succeeded(url: impl Into<String>, sitename: impl Into<String>, duration_ms: u64) -> Self {
        Self::RefreshSucceeded { url: url.into(), sitename: sitename.into(), duration_ms, timestamp: Utc::now() }
    }
    pub fn refresh_failed(url: impl Into<String>, error: impl Into<String>, duration_ms: u64) -> Self {
        Self::RefreshFailed { url: url.into(), error: error.into(), duration_ms, timestamp: Utc::now() }
    }
    pub fn device_unlinked(device_id: impl Into<String>, url: impl Into<String>, entry_id: Uuid) -> Self {
        Self::DeviceUnlinked { device_id: device_id.into(), url: url.into(), entry_id, timestamp: Utc::now() }
    }

    /// Record the event on the current tracing subscriber as a JSON payload.
    pub fn emit(&self) {
        match serde_json::to_string(self) {
            Ok(payload) => tracing::trace!(target: "wikimon::telemetry", %payload, "telemetry event"),
            Err(e) => tracing::warn!(error = %e, "Failed to serialize telemetry event"),
        }
    }
}
