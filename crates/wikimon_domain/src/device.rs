use crate::types::DOMAIN;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceEntryType {
    Service,
}

/// Device metadata attached to every sensor of one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// `(domain, instance url)` pairs.
    pub identifiers: BTreeSet<(String, String)>,
    pub name: String,
    pub manufacturer: String,
    pub configuration_url: String,
    pub entry_type: Option<DeviceEntryType>,
}

impl DeviceInfo {
    pub fn for_instance(url: &str, name: impl Into<String>) -> Self {
        Self {
            identifiers: BTreeSet::from([(DOMAIN.to_string(), url.to_string())]),
            name: name.into(),
            manufacturer: "MediaWiki".to_string(),
            configuration_url: url.to_string(),
            entry_type: Some(DeviceEntryType::Service),
        }
    }
}
