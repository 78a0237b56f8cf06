use async_trait::async_trait;
use tokio::time::{Duration, sleep};
use tracing::debug;

use crate::error::SummarizeError;
use crate::events::EventsResult;

/// Boundary to the external language-generation capability.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Produce a textual summary of the collected events for the original
    /// request. Called with whatever was last collected, accepted or not.
    async fn summarize(&self, query: &str, events: &EventsResult)
    -> Result<String, SummarizeError>;
}

/// Deterministic summarizer standing in for a hosted model.
#[derive(Default)]
pub struct StubSummarizer;

#[async_trait]
impl Summarizer for StubSummarizer {
    async fn summarize(
        &self,
        query: &str,
        events: &EventsResult,
    ) -> Result<String, SummarizeError> {
        // Simulate generation latency
        sleep(Duration::from_millis(100)).await;

        debug!(events = events.len(), %query, "summarizer invoked");

        if events.is_empty() {
            return Ok(format!("No events were collected for \"{query}\"."));
        }

        let highlights = events
            .events()
            .iter()
            .take(3)
            .cloned()
            .collect::<Vec<_>>()
            .join("; ");

        Ok(format!(
            "Top picks for \"{query}\": {highlights}. {} events collected in total.",
            events.len()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn summary_mentions_query_and_count() {
        let events = EventsResult::new(vec![
            "Jazz night in the park".to_string(),
            "Harbor food festival".to_string(),
        ]);
        let summary = StubSummarizer
            .summarize("NYC this week", &events)
            .await
            .expect("summarization");

        assert!(summary.contains("NYC this week"));
        assert!(summary.contains("2 events"));
        assert!(summary.contains("Jazz night"));
    }

    #[tokio::test]
    async fn empty_result_yields_fallback_text() {
        let summary = StubSummarizer
            .summarize("NYC", &EventsResult::default())
            .await
            .expect("summarization");
        assert!(summary.contains("No events"));
    }
}
