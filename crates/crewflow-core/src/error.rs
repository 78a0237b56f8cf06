use std::path::PathBuf;

use thiserror::Error;

/// Core error type for Crewflow.
#[derive(Debug, Error)]
pub enum CrewError {
    #[error("configuration error: {0}")]
    InvalidConfiguration(String),
    #[error("missing environment variable: {0}")]
    MissingSecret(String),
    #[error("I/O error while reading {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Summarize(#[from] SummarizeError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CrewError {
    pub fn config_io(path: PathBuf, source: std::io::Error) -> Self {
        Self::ConfigIo { path, source }
    }
}

/// Failure surfaced by an [`EventFetcher`](crate::EventFetcher).
///
/// Fatal to the re-fetch controller: a failed fetch aborts the run
/// immediately and is never retried at this layer.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("search request failed: {0}")]
    Network(String),
    #[error("search authentication rejected: {0}")]
    Auth(String),
    #[error("search rate limit hit: {0}")]
    RateLimited(String),
    #[error("search response malformed: {0}")]
    Malformed(String),
}

/// Failure surfaced by a [`Summarizer`](crate::Summarizer).
#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("summarization failed: {0}")]
    Failed(String),
}
