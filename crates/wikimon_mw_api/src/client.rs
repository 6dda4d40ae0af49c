use crate::error::MwApiError;
use crate::siteinfo::{SiteInfo, SiteInfoProp, parse_version, siteinfo_params};
use async_trait::async_trait;
use serde_json::Value;
use std::time::{Duration, Instant};
use url::Url;

const USER_AGENT: &str = "wikimon/0.1.0 (https://github.com/thomasvincent/wikimon)";

#[async_trait]
pub trait MediaWikiClient: Send + Sync {
    fn api_url(&self) -> &Url;

    /// Issue one GET against the API endpoint and return the decoded JSON body.
    async fn wiki_request(&self, params: &[(&str, &str)]) -> Result<Value, MwApiError>;

    async fn site_info(&self, props: &[SiteInfoProp]) -> Result<SiteInfo, MwApiError> {
        let params = siteinfo_params(props);
        let borrowed: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let response = self.wiki_request(&borrowed).await?;
        SiteInfo::from_response(&response)
    }

    /// Lightweight probe used to validate an endpoint: the MediaWiki version.
    async fn api_version(&self) -> Result<String, MwApiError> {
        let info = self.site_info(&[SiteInfoProp::General]).await?;
        info.generator()
            .map(parse_version)
            .ok_or_else(|| MwApiError::MalformedResponse("siteinfo has no generator".into()))
    }
}

/// Builds clients for instance urls. Coordinators and the config flow go
/// through this so tests can substitute their own client type.
pub trait ClientConnector: Send + Sync {
    type Client: MediaWikiClient + 'static;

    fn connect(&self, api_url: &str) -> Result<Self::Client, MwApiError>;
}

pub struct ReqwestMwClient {
    http: reqwest::Client,
    api_url: Url,
}

impl ReqwestMwClient {
    pub fn new(api_url: Url) -> Result<Self, MwApiError> {
        Self::with_timeout(api_url, Duration::from_secs(30))
    }

    pub fn with_timeout(api_url: Url, timeout: Duration) -> Result<Self, MwApiError> {
        match api_url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(MwApiError::InvalidUrl {
                    url: api_url.to_string(),
                    reason: format!("unsupported scheme '{}'", other),
                });
            }
        }

        let http = reqwest::ClientBuilder::new()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self { http, api_url })
    }
}

#[async_trait]
impl MediaWikiClient for ReqwestMwClient {
    fn api_url(&self) -> &Url {
        &self.api_url
    }

    async fn wiki_request(&self, params: &[(&str, &str)]) -> Result<Value, MwApiError> {
        let started = Instant::now();
        let response = self
            .http
            .get(self.api_url.as_str())
            .query(params)
            .send()
            .await?;

        let status = response.status();
        let url = response.url().to_string();
        let body = response.text().await?;

        tracing::debug!(
            url = %url,
            status = status.as_u16(),
            duration_ms = started.elapsed().as_millis() as u64,
            "MediaWiki API request"
        );

        if !status.is_success() {
            return Err(MwApiError::Http {
                status: status.as_u16(),
                url,
                body,
            });
        }

        let resp: Value = serde_json::from_str(&body)?;

        if let Some(error) = resp.get("error") {
            let code = error["code"].as_str().unwrap_or("unknown").to_string();
            let info = error["info"].as_str().unwrap_or("").to_string();
            return Err(MwApiError::ApiError { code, info });
        }

        Ok(resp)
    }
}

pub struct ReqwestConnector {
    timeout: Duration,
}

impl ReqwestConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for ReqwestConnector {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl ClientConnector for ReqwestConnector {
    type Client = ReqwestMwClient;

    fn connect(&self, api_url: &str) -> Result<ReqwestMwClient, MwApiError> {
        let url = Url::parse(api_url).map_err(|e| MwApiError::InvalidUrl {
            url: api_url.to_string(),
            reason: e.to_string(),
        })?;
        ReqwestMwClient::with_timeout(url, self.timeout)
    }
}
