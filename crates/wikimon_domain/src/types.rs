use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// Integration domain, used as the namespace of device identifiers.
pub const DOMAIN: &str = "mediawiki";

/// Form field holding an instance API url.
pub const CONF_URL: &str = "url";

/// Interval between scheduled refreshes of one instance.
pub const FALLBACK_UPDATE_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// One configured MediaWiki site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub url: String,
    pub name: String,
}

impl Instance {
    /// The display name starts out as the url until the site reports its own.
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            name: url.clone(),
            url,
        }
    }

    /// Take the display name from a freshly fetched snapshot, falling back to the url.
    pub fn update_name(&mut self, snapshot: &Snapshot) {
        self.name = snapshot.sitename().unwrap_or(&self.url).to_string();
    }
}

impl std::fmt::Display for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.url)
    }
}

/// Last successfully fetched siteinfo for an instance.
///
/// Both maps hold the response objects verbatim; individual fields are
/// resolved lazily by the sensors so that a missing key only affects the
/// sensor that needs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub statistics: Map<String, Value>,
    pub general: Map<String, Value>,
    pub fetched_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(statistics: Map<String, Value>, general: Map<String, Value>) -> Self {
        Self {
            statistics,
            general,
            fetched_at: Utc::now(),
        }
    }

    pub fn statistic(&self, key: &str) -> Option<&Value> {
        self.statistics.get(key)
    }

    pub fn general_field(&self, key: &str) -> Option<&Value> {
        self.general.get(key)
    }

    pub fn sitename(&self) -> Option<&str> {
        self.general_field("sitename").and_then(Value::as_str)
    }

    pub fn generator(&self) -> Option<&str> {
        self.general_field("generator").and_then(Value::as_str)
    }
}
