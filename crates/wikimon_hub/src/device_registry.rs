use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;
use wikimon_domain::{DeviceEntryType, DeviceInfo};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEntry {
    pub id: String,
    pub identifiers: BTreeSet<(String, String)>,
    pub name: String,
    pub manufacturer: String,
    pub configuration_url: String,
    pub entry_type: Option<DeviceEntryType>,
    pub config_entries: BTreeSet<Uuid>,
}

/// In-memory registry of devices, keyed by device id.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: BTreeMap<String, DeviceEntry>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the device sharing any identifier with `info`, or create it, and
    /// link it to `entry_id`. Metadata is refreshed from `info` either way.
    pub fn get_or_create(&mut self, entry_id: Uuid, info: &DeviceInfo) -> &DeviceEntry {
        let existing = self
            .devices
            .values()
            .find(|d| !d.identifiers.is_disjoint(&info.identifiers))
            .map(|d| d.id.clone());

        let id = existing.unwrap_or_else(|| Uuid::new_v4().simple().to_string());
        let device = self.devices.entry(id.clone()).or_insert_with(|| DeviceEntry {
            id,
            identifiers: BTreeSet::new(),
            name: String::new(),
            manufacturer: String::new(),
            configuration_url: String::new(),
            entry_type: None,
            config_entries: BTreeSet::new(),
        });

        device.identifiers.extend(info.identifiers.iter().cloned());
        device.name = info.name.clone();
        device.manufacturer = info.manufacturer.clone();
        device.configuration_url = info.configuration_url.clone();
        device.entry_type = info.entry_type;
        device.config_entries.insert(entry_id);
        device
    }

    pub fn get(&self, device_id: &str) -> Option<&DeviceEntry> {
        self.devices.get(device_id)
    }

    pub fn entries_for_config_entry(&self, entry_id: Uuid) -> Vec<DeviceEntry> {
        self.devices
            .values()
            .filter(|d| d.config_entries.contains(&entry_id))
            .cloned()
            .collect()
    }

    /// Unlink a config entry from a device. A device left without any
    /// config entry is removed from the registry.
    pub fn remove_config_entry(&mut self, device_id: &str, entry_id: Uuid) -> bool {
        let Some(device) = self.devices.get_mut(device_id) else {
            return false;
        };
        let removed = device.config_entries.remove(&entry_id);
        if device.config_entries.is_empty() {
            self.devices.remove(device_id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn devices(&self) -> impl Iterator<Item = &DeviceEntry> {
        self.devices.values()
    }
}
