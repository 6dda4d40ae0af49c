use crate::types::DOMAIN;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceConfig {
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryData {
    pub instances: Vec<InstanceConfig>,
}

impl EntryData {
    pub fn single(url: impl Into<String>) -> Self {
        Self {
            instances: vec![InstanceConfig { url: url.into() }],
        }
    }
}

/// An accepted configuration covering one or more instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub entry_id: Uuid,
    pub domain: String,
    pub title: String,
    /// Manual-refresh-only mode: no scheduled refreshes are started.
    #[serde(default)]
    pub pref_disable_polling: bool,
    pub created_at: DateTime<Utc>,
    pub data: EntryData,
}

impl ConfigEntry {
    pub fn new(title: impl Into<String>, data: EntryData) -> Self {
        Self {
            entry_id: Uuid::new_v4(),
            domain: DOMAIN.to_string(),
            title: title.into(),
            pref_disable_polling: false,
            created_at: Utc::now(),
            data,
        }
    }

    #[must_use]
    pub fn with_polling_disabled(mut self, disabled: bool) -> Self {
        self.pref_disable_polling = disabled;
        self
    }

    pub fn instance_urls(&self) -> impl Iterator<Item = &str> {
        self.data.instances.iter().map(|i| i.url.as_str())
    }

    pub fn tracks(&self, url: &str) -> bool {
        self.instance_urls().any(|u| u == url)
    }
}
