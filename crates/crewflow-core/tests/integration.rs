use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use crewflow_core::{
    EventFetcher, EventsResult, FetchError, RefetchPolicy, SessionOptions, StubEventFetcher,
    SufficiencyThreshold, run_event_session, run_event_session_with_options,
};

/// Fetcher that replays a fixed script of result lengths or failures and
/// counts how many times it was called.
struct ScriptedFetcher {
    script: Mutex<VecDeque<Result<usize, FetchError>>>,
    calls: Mutex<usize>,
}

impl ScriptedFetcher {
    fn new(script: Vec<Result<usize, FetchError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: Mutex::new(0),
        }
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl EventFetcher for ScriptedFetcher {
    async fn fetch(&self) -> Result<EventsResult, FetchError> {
        *self.calls.lock().unwrap() += 1;
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(FetchError::Network("script exhausted".into())));
        step.map(|len| EventsResult::new((0..len).map(|i| format!("scripted event {i}")).collect()))
    }
}

fn policy(threshold: usize, max_attempts: usize) -> RefetchPolicy {
    RefetchPolicy::new(SufficiencyThreshold::new(threshold), max_attempts)
}

#[tokio::test]
async fn default_session_produces_summary() {
    let summary = run_event_session("exciting events in New York City this week")
        .await
        .expect("workflow should succeed");

    assert!(
        summary.contains("Sufficient event data collected"),
        "expected analyzer verdict: {summary}"
    );
    assert!(
        summary.contains("Prepared by Summary Creator"),
        "summary should carry the crew footer: {summary}"
    );
}

#[tokio::test]
async fn workflow_loops_until_threshold_met() {
    // 5, 7, 9 events across passes; the analyzer accepts on the third.
    let fetcher = Arc::new(StubEventFetcher::new("NYC", 5, 2));
    let options = SessionOptions::new("events in NYC")
        .with_policy(policy(8, 3))
        .with_fetcher(fetcher);

    let outcome = run_event_session_with_options(options)
        .await
        .expect("workflow should succeed");

    assert_eq!(outcome.attempts, 3);
    assert_eq!(outcome.events.len(), 9);
    assert!(!outcome.exhausted);
    assert_eq!(
        outcome.verdict.as_deref(),
        Some("Sufficient event data collected")
    );
}

#[tokio::test]
async fn workflow_degrades_softly_on_exhaustion() {
    let fetcher = Arc::new(ScriptedFetcher::new(vec![Ok(2), Ok(2), Ok(2), Ok(2)]));
    let options = SessionOptions::new("events in NYC")
        .with_policy(policy(8, 3))
        .with_fetcher(fetcher.clone());

    let outcome = run_event_session_with_options(options)
        .await
        .expect("exhaustion is not an error");

    assert_eq!(fetcher.calls(), 3);
    assert_eq!(outcome.attempts, 3);
    assert_eq!(outcome.events.len(), 2);
    assert!(outcome.exhausted);
    assert!(
        outcome.summary.contains("Collection budget exhausted"),
        "expected degraded verdict in summary: {}",
        outcome.summary
    );
    // Summarization still ran on the partial data.
    assert!(outcome.summary.contains("2 events collected in total"));
}

#[tokio::test]
async fn fetch_failure_aborts_the_session() {
    let fetcher = Arc::new(ScriptedFetcher::new(vec![
        Ok(3),
        Err(FetchError::Auth("key rejected".into())),
        Ok(9),
    ]));
    let options = SessionOptions::new("events in NYC")
        .with_policy(policy(8, 5))
        .with_fetcher(fetcher.clone());

    let err = run_event_session_with_options(options)
        .await
        .expect_err("fetch failure should surface");

    assert!(err.to_string().contains("event fetch failed"));
    assert!(err.to_string().contains("key rejected"));
    // The failed second call was the last one.
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test]
async fn custom_session_id_is_preserved() {
    let options = SessionOptions::new("events in NYC")
        .with_session_id("crew-test-42")
        .with_policy(policy(1, 1));

    let outcome = run_event_session_with_options(options)
        .await
        .expect("workflow should succeed");

    assert_eq!(outcome.session_id, "crew-test-42");
}
