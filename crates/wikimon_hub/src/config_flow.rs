use std::collections::BTreeMap;
use std::sync::Arc;
use wikimon_domain::types::CONF_URL;
use wikimon_domain::{ConfigEntry, EntryData};
use wikimon_mw_api::{ClientConnector, MediaWikiClient};

pub const STEP_INSTANCES: &str = "instances";
pub const ABORT_ALREADY_CONFIGURED: &str = "already_configured";
pub const ERROR_CANNOT_CONNECT: &str = "cannot_connect";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInput {
    pub url: String,
}

impl UserInput {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into().trim().to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowResult {
    ShowForm {
        step_id: &'static str,
        schema: Vec<FormField>,
        errors: BTreeMap<String, String>,
    },
    Abort {
        reason: &'static str,
    },
    CreateEntry {
        title: String,
        data: EntryData,
    },
}

impl FlowResult {
    /// The entry to store, when the flow finished successfully.
    pub fn into_entry(self) -> Option<ConfigEntry> {
        match self {
            Self::CreateEntry { title, data } => Some(ConfigEntry::new(title, data)),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::ShowForm { errors, .. } => errors.get("base").map(String::as_str),
            _ => None,
        }
    }
}

fn instances_form(errors: BTreeMap<String, String>) -> FlowResult {
    FlowResult::ShowForm {
        step_id: STEP_INSTANCES,
        schema: vec![FormField {
            name: CONF_URL,
            kind: FieldKind::String,
            required: true,
        }],
        errors,
    }
}

/// Validates a user supplied API url before it becomes a config entry.
pub struct ConfigFlow<K: ClientConnector> {
    connector: Arc<K>,
    client: Option<K::Client>,
}

impl<K: ClientConnector> ConfigFlow<K> {
    pub fn new(connector: Arc<K>) -> Self {
        Self { connector, client: None }
    }

    /// Entry point. Only one config entry may exist at a time.
    pub async fn step_user(&mut self, existing: &[ConfigEntry], input: Option<UserInput>) -> FlowResult {
        if !existing.is_empty() {
            return FlowResult::Abort { reason: ABORT_ALREADY_CONFIGURED };
        }
        self.step_instances(input).await
    }

    pub async fn step_instances(&mut self, input: Option<UserInput>) -> FlowResult {
        let Some(input) = input else {
            return instances_form(BTreeMap::new());
        };

        let probe = match self.connector.connect(&input.url) {
            Ok(client) => client.api_version().await.map(|version| (client, version)),
            Err(err) => Err(err),
        };

        match probe {
            Ok((client, version)) => {
                tracing::info!(url = %input.url, version = %version, "MediaWiki instance validated");
                self.client = Some(client);
                FlowResult::CreateEntry {
                    title: String::new(),
                    data: EntryData::single(input.url),
                }
            }
            Err(err) => {
                tracing::error!(url = %input.url, error = %err, "Cannot connect to MediaWiki instance");
                instances_form(BTreeMap::from([(
                    "base".to_string(),
                    ERROR_CANNOT_CONNECT.to_string(),
                )]))
            }
        }
    }

    /// Client kept from the last successful probe.
    pub fn client(&self) -> Option<&K::Client> {
        self.client.as_ref()
    }
}
