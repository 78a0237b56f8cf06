use std::sync::Arc;

use async_trait::async_trait;
use graph_flow::{Context, NextAction, Task, TaskResult};
use tracing::{debug, info, instrument, warn};

use crate::agents;
use crate::events::EventsResult;
use crate::fetcher::EventFetcher;
use crate::policy::{Decision, RefetchPolicy};
use crate::summarizer::Summarizer;

/// Context keys shared between tasks and the workflow driver.
pub(crate) const KEY_QUERY: &str = "query";
pub(crate) const KEY_EVENTS: &str = "events.latest";
pub(crate) const KEY_ATTEMPTS: &str = "fetch.attempts";
pub(crate) const KEY_FETCH_ERROR: &str = "fetch.error";
pub(crate) const KEY_NEEDS_REFETCH: &str = "verify.needs_refetch";
pub(crate) const KEY_VERDICT: &str = "verify.verdict";
pub(crate) const KEY_EXHAUSTED: &str = "verify.exhausted";
pub(crate) const KEY_SUMMARIZE_ERROR: &str = "summarize.error";
pub(crate) const KEY_SUMMARY: &str = "final.summary";

/// Collector agent task: one fetch per execution.
///
/// The re-run loop lives in the graph wiring; when the verifier routes
/// back here, the fresh result replaces the previous one in the context.
pub struct CollectTask {
    fetcher: Arc<dyn EventFetcher>,
}

impl CollectTask {
    pub fn new(fetcher: Arc<dyn EventFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl Task for CollectTask {
    fn id(&self) -> &str {
        "data_collector"
    }

    #[instrument(name = "task.collect", skip(self, context))]
    async fn run(&self, context: Context) -> graph_flow::Result<TaskResult> {
        let query: String = context
            .get(KEY_QUERY)
            .await
            .unwrap_or_else(|| "events happening this week".to_string());
        let attempts: usize = context.get(KEY_ATTEMPTS).await.unwrap_or(0);

        info!(
            agent = agents::DATA_COLLECTOR.role,
            %query,
            attempt = attempts + 1,
            "collecting event data"
        );

        match self.fetcher.fetch().await {
            Ok(events) => {
                context.set(KEY_ATTEMPTS, attempts + 1).await;
                context.set(KEY_EVENTS, &events).await;

                debug!(events = events.len(), "collector stored fetch result");

                Ok(TaskResult::new(
                    Some(format!("Collected {} events", events.len())),
                    NextAction::ContinueAndExecute,
                ))
            }
            Err(err) => {
                // Fatal: a failed fetch is never retried by the workflow.
                warn!(%err, "event fetch failed; aborting session");
                context.set(KEY_FETCH_ERROR, err.to_string()).await;

                Ok(TaskResult::new(
                    Some(format!("Event fetch failed: {err}")),
                    NextAction::End,
                ))
            }
        }
    }
}

/// Analyzer agent task: applies the refetch policy to the latest result.
pub struct VerifyTask {
    policy: RefetchPolicy,
}

impl VerifyTask {
    pub fn new(policy: RefetchPolicy) -> Self {
        Self { policy }
    }
}

#[async_trait]
impl Task for VerifyTask {
    fn id(&self) -> &str {
        "data_analyzer"
    }

    #[instrument(name = "task.verify", skip(self, context))]
    async fn run(&self, context: Context) -> graph_flow::Result<TaskResult> {
        let attempts: usize = context.get(KEY_ATTEMPTS).await.unwrap_or(0);
        let latest: Option<EventsResult> = context.get(KEY_EVENTS).await;

        let decision = self.policy.decide(attempts, latest.as_ref());
        let events_count = latest.as_ref().map(EventsResult::len).unwrap_or(0);

        let verdict = match decision {
            Decision::Accept => {
                context.set_sync(KEY_NEEDS_REFETCH, false);
                context.set_sync(KEY_EXHAUSTED, false);
                info!(
                    agent = agents::DATA_ANALYZER.role,
                    events_count, attempts, "sufficient event data collected"
                );
                "Sufficient event data collected"
            }
            Decision::Refetch => {
                context.set_sync(KEY_NEEDS_REFETCH, true);
                context.set_sync(KEY_EXHAUSTED, false);
                info!(
                    agent = agents::DATA_ANALYZER.role,
                    events_count,
                    attempts,
                    threshold = self.policy.threshold.get(),
                    "insufficient event data; requesting another collection pass"
                );
                "Insufficient event data; requesting another collection pass"
            }
            Decision::Exhaust => {
                context.set_sync(KEY_NEEDS_REFETCH, false);
                context.set_sync(KEY_EXHAUSTED, true);
                warn!(
                    agent = agents::DATA_ANALYZER.role,
                    events_count, attempts, "collection budget exhausted; summarizing partial data"
                );
                "Collection budget exhausted; proceeding with partial data"
            }
        };
        context.set_sync(KEY_VERDICT, verdict.to_string());

        Ok(TaskResult::new(
            Some(verdict.to_string()),
            NextAction::ContinueAndExecute,
        ))
    }
}

/// Summary agent task: hands the final result to the summarizer.
pub struct SummaryTask {
    summarizer: Arc<dyn Summarizer>,
}

impl SummaryTask {
    pub fn new(summarizer: Arc<dyn Summarizer>) -> Self {
        Self { summarizer }
    }
}

#[async_trait]
impl Task for SummaryTask {
    fn id(&self) -> &str {
        "summary_creator"
    }

    #[instrument(name = "task.summary", skip(self, context))]
    async fn run(&self, context: Context) -> graph_flow::Result<TaskResult> {
        let query: String = context
            .get(KEY_QUERY)
            .await
            .unwrap_or_else(|| "events happening this week".to_string());
        let events: EventsResult = context.get(KEY_EVENTS).await.unwrap_or_default();
        let verdict: String = context
            .get(KEY_VERDICT)
            .await
            .unwrap_or_else(|| "No verdict recorded".to_string());

        info!(
            agent = agents::SUMMARY_CREATOR.role,
            events = events.len(),
            "summarizing collected events"
        );

        match self.summarizer.summarize(&query, &events).await {
            Ok(text) => {
                let summary = format!(
                    "{verdict}\n\n{text}\n\nPrepared by {}",
                    agents::SUMMARY_CREATOR.role
                );
                context.set(KEY_SUMMARY, summary.clone()).await;

                Ok(TaskResult::new(Some(summary), NextAction::End))
            }
            Err(err) => {
                warn!(%err, "summarization failed; aborting session");
                context.set(KEY_SUMMARIZE_ERROR, err.to_string()).await;

                Ok(TaskResult::new(
                    Some(format!("Summarization failed: {err}")),
                    NextAction::End,
                ))
            }
        }
    }
}
