use crate::coordinator::DataUpdateCoordinator;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use wikimon_domain::sensor::normalize_name;
use wikimon_domain::{DeviceInfo, SENSOR_DESCRIPTIONS, SensorDescription, SensorValue};
use wikimon_mw_api::ClientConnector;

pub const ATTRIBUTION: &str = "Data provided by the MediaWiki instance's API";

/// Published state of one sensor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorState {
    pub unique_id: String,
    pub key: &'static str,
    pub available: bool,
    pub value: Option<SensorValue>,
}

/// Read-through view of one snapshot field of one instance.
pub struct MediaWikiSensor<K: ClientConnector> {
    coordinator: Arc<DataUpdateCoordinator<K>>,
    description: &'static SensorDescription,
    unique_id: String,
    device_info: DeviceInfo,
}

impl<K: ClientConnector + 'static> MediaWikiSensor<K> {
    /// Identity is fixed at construction from whatever the coordinator knows then.
    pub fn new(coordinator: Arc<DataUpdateCoordinator<K>>, description: &'static SensorDescription) -> Self {
        let url = coordinator.url();
        let wiki_name = coordinator
            .data()
            .and_then(|data| data.sitename().map(str::to_string))
            .unwrap_or_else(|| url.clone());

        let unique_id = format!("{}_{}", normalize_name(&wiki_name), description.key);
        tracing::debug!(
            wiki_name = %wiki_name,
            key = description.key,
            unique_id = %unique_id,
            "Initializing MediaWiki sensor"
        );

        Self {
            device_info: DeviceInfo::for_instance(&url, wiki_name),
            coordinator,
            description,
            unique_id,
        }
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn key(&self) -> &'static str {
        self.description.key
    }

    pub fn translation_key(&self) -> &'static str {
        self.description.translation_key
    }

    pub fn description(&self) -> &'static SensorDescription {
        self.description
    }

    pub fn device_info(&self) -> &DeviceInfo {
        &self.device_info
    }

    pub fn attribution(&self) -> &'static str {
        ATTRIBUTION
    }

    pub fn coordinator(&self) -> &Arc<DataUpdateCoordinator<K>> {
        &self.coordinator
    }

    pub fn available(&self) -> bool {
        self.coordinator.last_update_success()
            && self
                .coordinator
                .data()
                .is_some_and(|data| (self.description.available_fn)(&data))
    }

    /// `None` when there is no snapshot yet or the field is missing.
    pub fn native_value(&self) -> Option<SensorValue> {
        self.coordinator
            .data()
            .and_then(|data| (self.description.value_fn)(&data))
    }

    pub fn extra_state_attributes(&self) -> Option<Map<String, Value>> {
        self.coordinator
            .data()
            .and_then(|data| (self.description.attr_fn)(&data))
    }

    pub fn state(&self) -> SensorState {
        SensorState {
            unique_id: self.unique_id.clone(),
            key: self.description.key,
            available: self.available(),
            value: self.native_value(),
        }
    }
}

/// One sensor per description per coordinator.
pub fn sensors_for<K: ClientConnector + 'static>(
    coordinators: &[Arc<DataUpdateCoordinator<K>>],
) -> Vec<MediaWikiSensor<K>> {
    SENSOR_DESCRIPTIONS
        .iter()
        .flat_map(|description| {
            coordinators
                .iter()
                .map(move |coordinator| MediaWikiSensor::new(Arc::clone(coordinator), description))
        })
        .collect()
}
