//! Crewflow core abstractions built directly on top of `graph_flow`.
//!
//! This crate orchestrates an event-planning crew of three agents: a Data
//! Collector fetching event data from a search boundary, a Data Analyzer
//! deciding whether the collection is sufficient (and bouncing the flow
//! back to the collector when it is not, up to a finite attempt budget),
//! and a Summary Creator producing the final write-up. The bounded
//! fetch/check/refetch loop is also available standalone via
//! [`ReFetchController`].

mod agents;
mod config;
mod controller;
mod error;
mod eval;
mod events;
mod fetcher;
mod logging;
mod policy;
mod secrets;
mod summarizer;
mod tasks;
mod workflow;

pub use agents::{AgentSpec, DATA_ANALYZER, DATA_COLLECTOR, SUMMARY_CREATOR};
pub use config::{Config, ConfigLoader, LoggingConfig, SearchConfig, WorkflowConfig};
pub use controller::{ControllerState, FetchOutcome, ReFetchController};
pub use error::{CrewError, FetchError, SummarizeError};
pub use eval::{EvaluationHarness, EvaluationMetrics, SessionLogEntry};
pub use events::EventsResult;
pub use fetcher::{EventFetcher, SerperEventFetcher, StubEventFetcher};
pub use logging::{SessionLogInput, log_session_completion};
pub use policy::{Decision, RefetchPolicy, SufficiencyThreshold, is_sufficient};
pub use secrets::{SecretValue, require_env};
pub use summarizer::{StubSummarizer, Summarizer};
pub use tasks::{CollectTask, SummaryTask, VerifyTask};
pub use workflow::{
    CrewTasks, SessionOptions, SessionOutcome, run_event_session, run_event_session_with_options,
};
