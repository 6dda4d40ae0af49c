//! Scripted client used by the unit tests of this crate.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;
use wikimon_mw_api::{ClientConnector, MediaWikiClient, MwApiError};

pub(crate) const TEST_URL: &str = "https://test.example.org/w/api.php";

pub(crate) fn test_wiki_response() -> Value {
    json!({
        "query": {
            "statistics": {"pages": 100, "images": 20},
            "general": {"generator": "MediaWiki 1.40", "sitename": "TestWiki"}
        }
    })
}

#[derive(Default)]
struct Inner {
    responses: Mutex<HashMap<String, VecDeque<Result<Value, MwApiError>>>>,
    calls: Mutex<HashMap<String, usize>>,
    connects: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay: Mutex<Option<Duration>>,
}

/// Connector whose clients answer from a per-url queue of scripted responses.
#[derive(Clone, Default)]
pub(crate) struct MockConnector {
    inner: Arc<Inner>,
}

impl MockConnector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_json(&self, url: &str, value: Value) {
        self.push(url, Ok(value));
    }

    pub(crate) fn push_err(&self, url: &str, err: MwApiError) {
        self.push(url, Err(err));
    }

    fn push(&self, url: &str, response: Result<Value, MwApiError>) {
        self.inner
            .responses
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(response);
    }

    pub(crate) fn set_delay(&self, delay: Duration) {
        *self.inner.delay.lock().unwrap() = Some(delay);
    }

    pub(crate) fn calls(&self, url: &str) -> usize {
        self.inner.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub(crate) fn connects(&self) -> usize {
        self.inner.connects.load(Ordering::SeqCst)
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.inner.max_in_flight.load(Ordering::SeqCst)
    }
}

pub(crate) struct MockClient {
    url: Url,
    inner: Arc<Inner>,
}

impl ClientConnector for MockConnector {
    type Client = MockClient;

    fn connect(&self, api_url: &str) -> Result<MockClient, MwApiError> {
        let url = Url::parse(api_url).map_err(|e| MwApiError::InvalidUrl {
            url: api_url.to_string(),
            reason: e.to_string(),
        })?;
        self.inner.connects.fetch_add(1, Ordering::SeqCst);
        Ok(MockClient {
            url,
            inner: Arc::clone(&self.inner),
        })
    }
}

#[async_trait]
impl MediaWikiClient for MockClient {
    fn api_url(&self) -> &Url {
        &self.url
    }

    async fn wiki_request(&self, _params: &[(&str, &str)]) -> Result<Value, MwApiError> {
        let key = self.url.to_string();
        *self.inner.calls.lock().unwrap().entry(key.clone()).or_default() += 1;

        let current = self.inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = *self.inner.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let response = self
            .inner
            .responses
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(MwApiError::MalformedResponse("no scripted response".into())));

        self.inner.in_flight.fetch_sub(1, Ordering::SeqCst);
        response
    }
}
