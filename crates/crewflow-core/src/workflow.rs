use std::sync::Arc;

use anyhow::{Result, anyhow};
use graph_flow::{
    ExecutionStatus, FlowRunner, GraphBuilder, InMemorySessionStorage, Session, SessionStorage,
    Task,
};
use serde_json::Value;
use uuid::Uuid;

use crate::events::EventsResult;
use crate::fetcher::{EventFetcher, StubEventFetcher};
use crate::policy::RefetchPolicy;
use crate::summarizer::{StubSummarizer, Summarizer};
use crate::tasks::{
    CollectTask, KEY_ATTEMPTS, KEY_EVENTS, KEY_EXHAUSTED, KEY_FETCH_ERROR, KEY_NEEDS_REFETCH,
    KEY_QUERY, KEY_SUMMARIZE_ERROR, KEY_SUMMARY, KEY_VERDICT, SummaryTask, VerifyTask,
};

/// The three crew tasks wired into the default graph.
#[derive(Clone)]
pub struct CrewTasks {
    pub collect: Arc<CollectTask>,
    pub verify: Arc<VerifyTask>,
    pub summarize: Arc<SummaryTask>,
}

fn build_graph(
    fetcher: Arc<dyn EventFetcher>,
    summarizer: Arc<dyn Summarizer>,
    policy: RefetchPolicy,
) -> (Arc<graph_flow::Graph>, CrewTasks) {
    let tasks = CrewTasks {
        collect: Arc::new(CollectTask::new(fetcher)),
        verify: Arc::new(VerifyTask::new(policy)),
        summarize: Arc::new(SummaryTask::new(summarizer)),
    };

    // collect -> verify, then either loop back to collect for another pass
    // or continue to the summary. The verifier's policy bounds the loop.
    let builder = GraphBuilder::new("event_crew_workflow")
        .add_task(tasks.collect.clone())
        .add_task(tasks.verify.clone())
        .add_task(tasks.summarize.clone())
        .add_edge(tasks.collect.id(), tasks.verify.id())
        .add_conditional_edge(
            tasks.verify.id(),
            |ctx| ctx.get_sync::<bool>(KEY_NEEDS_REFETCH).unwrap_or(false),
            tasks.collect.id(),
            tasks.summarize.id(),
        )
        .set_start_task(tasks.collect.id());

    (Arc::new(builder.build()), tasks)
}

fn new_session_id() -> String {
    format!("session-{}", Uuid::new_v4())
}

/// Options for running an event-planning session.
pub struct SessionOptions<'a> {
    pub query: &'a str,
    pub session_id: Option<String>,
    pub policy: RefetchPolicy,
    pub fetcher: Option<Arc<dyn EventFetcher>>,
    pub summarizer: Option<Arc<dyn Summarizer>>,
    pub initial_context: Vec<(String, Value)>,
}

impl<'a> SessionOptions<'a> {
    pub fn new(query: &'a str) -> Self {
        Self {
            query,
            session_id: None,
            policy: RefetchPolicy::default(),
            fetcher: None,
            summarizer: None,
            initial_context: Vec::new(),
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_policy(mut self, policy: RefetchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn EventFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn with_initial_context(mut self, key: impl Into<String>, value: Value) -> Self {
        self.initial_context.push((key.into(), value));
        self
    }
}

/// Everything a caller might want to know about a finished session.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub session_id: String,
    pub summary: String,
    pub events: EventsResult,
    pub attempts: usize,
    pub exhausted: bool,
    pub verdict: Option<String>,
}

/// Run the event crew end-to-end for the provided query using default
/// settings (stub collaborators, default policy).
pub async fn run_event_session(query: &str) -> Result<String> {
    let outcome = run_event_session_with_options(SessionOptions::new(query)).await?;
    Ok(outcome.summary)
}

/// Run the event crew with custom options (session ID, policy, injected
/// fetcher/summarizer, seeded context).
pub async fn run_event_session_with_options(options: SessionOptions<'_>) -> Result<SessionOutcome> {
    let fetcher = options
        .fetcher
        .unwrap_or_else(|| Arc::new(StubEventFetcher::for_topic(options.query)));
    let summarizer = options
        .summarizer
        .unwrap_or_else(|| Arc::new(StubSummarizer));

    let (graph, tasks) = build_graph(fetcher, summarizer, options.policy);

    let storage = Arc::new(InMemorySessionStorage::new());
    let runner = FlowRunner::new(graph, storage.clone());

    let session_id = options.session_id.clone().unwrap_or_else(new_session_id);
    let session = Session::new_from_task(session_id.clone(), tasks.collect.id());

    session.context.set(KEY_QUERY, options.query.to_string()).await;
    for (key, value) in options.initial_context.iter() {
        session.context.set(key, value.clone()).await;
    }

    storage
        .save(session)
        .await
        .map_err(|err| anyhow!("failed to persist session: {err}"))?;

    loop {
        let result = runner
            .run(&session_id)
            .await
            .map_err(|err| anyhow!("graph execution failure: {err}"))?;

        match result.status {
            ExecutionStatus::Completed => break,
            ExecutionStatus::WaitingForInput => continue,
            ExecutionStatus::Error(message) => return Err(anyhow!(message)),
        }
    }

    let session = storage
        .get(&session_id)
        .await
        .map_err(|err| anyhow!("failed to reload session: {err}"))?
        .ok_or_else(|| anyhow!("session missing after execution"))?;

    if let Some(message) = session.context.get::<String>(KEY_FETCH_ERROR).await {
        return Err(anyhow!("event fetch failed: {message}"));
    }
    if let Some(message) = session.context.get::<String>(KEY_SUMMARIZE_ERROR).await {
        return Err(anyhow!("summarization failed: {message}"));
    }

    let summary: String = session
        .context
        .get(KEY_SUMMARY)
        .await
        .unwrap_or_else(|| "No final summary recorded".to_string());
    let events: EventsResult = session.context.get(KEY_EVENTS).await.unwrap_or_default();
    let attempts: usize = session.context.get(KEY_ATTEMPTS).await.unwrap_or(0);
    let exhausted: bool = session.context.get(KEY_EXHAUSTED).await.unwrap_or(false);
    let verdict: Option<String> = session.context.get(KEY_VERDICT).await;

    Ok(SessionOutcome {
        session_id,
        summary,
        events,
        attempts,
        exhausted,
        verdict,
    })
}
