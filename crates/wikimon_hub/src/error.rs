use thiserror::Error;
use wikimon_mw_api::MwApiError;

/// The single failure kind of a refresh: the upstream request did not
/// produce a usable siteinfo payload.
#[derive(Debug, Error)]
#[error("Error fetching data from {url}: {source}")]
pub struct UpdateFailed {
    pub url: String,
    #[source]
    pub source: MwApiError,
}

impl UpdateFailed {
    pub fn new(url: impl Into<String>, source: MwApiError) -> Self {
        Self { url: url.into(), source }
    }
}

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Instance {url} is not ready: {source}")]
    NotReady {
        url: String,
        #[source]
        source: UpdateFailed,
    },
}
