use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tokio::time::{Duration, sleep};
use tracing::debug;

use crate::config::SearchConfig;
use crate::error::{CrewError, FetchError};
use crate::events::EventsResult;
use crate::secrets::{SecretValue, require_env};

/// Boundary to the external event-search capability.
///
/// Implementations own their own networking concerns (timeouts, provider
/// retries). The re-fetch controller treats a returned error as fatal.
#[async_trait]
pub trait EventFetcher: Send + Sync {
    async fn fetch(&self) -> Result<EventsResult, FetchError>;
}

/// Deterministic fetcher used for demo runs and tests.
///
/// Each call yields `step` more events than the previous one, simulating a
/// collector that digs deeper on every pass.
pub struct StubEventFetcher {
    topic: String,
    initial: usize,
    step: usize,
    calls: AtomicUsize,
}

impl StubEventFetcher {
    pub fn new(topic: impl Into<String>, initial: usize, step: usize) -> Self {
        Self {
            topic: topic.into(),
            initial,
            step,
            calls: AtomicUsize::new(0),
        }
    }

    /// Default shape: 5, 7, 9, ... events across successive calls, so a
    /// threshold of 8 is met on the third pass.
    pub fn for_topic(topic: impl Into<String>) -> Self {
        Self::new(topic, 5, 2)
    }
}

#[async_trait]
impl EventFetcher for StubEventFetcher {
    async fn fetch(&self) -> Result<EventsResult, FetchError> {
        // Simulate retrieval latency
        sleep(Duration::from_millis(120)).await;

        let call = self.calls.fetch_add(1, Ordering::Relaxed);
        let count = self.initial + self.step * call;
        let events = (1..=count)
            .map(|idx| format!("{} spotlight #{idx}: featured happening this week", self.topic))
            .collect();

        debug!(call = call + 1, count, "stub fetcher produced events");
        Ok(EventsResult::new(events))
    }
}

/// Fetcher backed by the Serper search API.
///
/// Thin boundary client only; result ranking and crawling stay on the
/// provider side.
#[derive(Debug)]
pub struct SerperEventFetcher {
    client: reqwest::Client,
    endpoint: String,
    api_key: SecretValue,
    query: String,
}

impl SerperEventFetcher {
    /// Resolve the API key from the environment variable named in the
    /// search configuration.
    pub fn new(search: &SearchConfig, query: impl Into<String>) -> Result<Self, CrewError> {
        let api_key = require_env(&search.api_key_env)?;
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: search.endpoint.clone(),
            api_key,
            query: query.into(),
        })
    }
}

#[derive(Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperHit>,
}

#[derive(Deserialize)]
struct SerperHit {
    title: String,
    #[serde(default)]
    snippet: Option<String>,
}

#[async_trait]
impl EventFetcher for SerperEventFetcher {
    async fn fetch(&self) -> Result<EventsResult, FetchError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", self.api_key.expose())
            .json(&serde_json::json!({ "q": self.query }))
            .send()
            .await
            .map_err(|err| FetchError::Network(err.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FetchError::Auth(format!("status {status}")));
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited(format!("status {status}")));
        }
        if !status.is_success() {
            return Err(FetchError::Network(format!("status {status}")));
        }

        let parsed: SerperResponse = response
            .json()
            .await
            .map_err(|err| FetchError::Malformed(err.to_string()))?;

        let events = parsed
            .organic
            .into_iter()
            .map(|hit| match hit.snippet {
                Some(snippet) => format!("{}: {snippet}", hit.title),
                None => hit.title,
            })
            .collect();

        Ok(EventsResult::new(events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stub_fetcher_grows_per_call() {
        let fetcher = StubEventFetcher::new("NYC", 3, 4);
        let first = fetcher.fetch().await.expect("first fetch");
        let second = fetcher.fetch().await.expect("second fetch");
        assert_eq!(first.len(), 3);
        assert_eq!(second.len(), 7);
        assert!(first.events()[0].contains("NYC"));
    }

    #[test]
    fn serper_fetcher_requires_api_key() {
        let search = SearchConfig {
            api_key_env: "CREWFLOW_TEST_UNSET_SERPER_KEY".to_string(),
            ..SearchConfig::default()
        };
        unsafe { std::env::remove_var(&search.api_key_env) };
        let err = SerperEventFetcher::new(&search, "events").unwrap_err();
        assert!(matches!(err, CrewError::MissingSecret(_)));
    }
}
