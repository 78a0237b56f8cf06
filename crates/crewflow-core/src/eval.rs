use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// One session record as written by [`crate::logging::log_session_completion`].
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SessionLogEntry {
    pub session_id: Option<String>,
    #[serde(default)]
    pub events_count: usize,
    #[serde(default)]
    pub attempts: usize,
    #[serde(default)]
    pub exhausted: bool,
}

/// Aggregate quality metrics over a session log.
#[derive(Debug, Default, Clone)]
pub struct EvaluationMetrics {
    pub total_sessions: usize,
    pub exhausted_sessions: usize,
    pub average_events: f32,
    pub average_attempts: f32,
    pub exhausted_ids: Vec<String>,
}

impl EvaluationMetrics {
    pub fn record(&mut self, entry: &SessionLogEntry) {
        self.total_sessions += 1;
        let n = self.total_sessions as f32;
        self.average_events =
            (self.average_events * (n - 1.0) + entry.events_count as f32) / n;
        self.average_attempts =
            (self.average_attempts * (n - 1.0) + entry.attempts as f32) / n;
        if entry.exhausted {
            self.exhausted_sessions += 1;
            if let Some(id) = &entry.session_id {
                self.exhausted_ids.push(id.clone());
            }
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "evaluated {} session(s) • avg events {:.1} • avg attempts {:.1} • {} exhausted",
            self.total_sessions, self.average_events, self.average_attempts,
            self.exhausted_sessions
        )
    }
}

pub struct EvaluationHarness;

impl EvaluationHarness {
    /// Fold a `session.jsonl` file into aggregate metrics, skipping lines
    /// that do not parse.
    pub fn analyze_log(path: impl AsRef<Path>) -> Result<EvaluationMetrics> {
        let file = File::open(path.as_ref())
            .with_context(|| format!("failed to open log file {}", path.as_ref().display()))?;
        let mut metrics = EvaluationMetrics::default();

        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<SessionLogEntry>(&line) {
                Ok(entry) => metrics.record(&entry),
                Err(err) => {
                    tracing::debug!(%err, "skipping malformed evaluation log entry");
                }
            }
        }

        Ok(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn analyzes_session_log() -> Result<()> {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            r#"{{"session_id":"a","events_count":9,"attempts":3,"exhausted":false}}"#
        )?;
        writeln!(
            file,
            r#"{{"session_id":"b","events_count":2,"attempts":3,"exhausted":true}}"#
        )?;
        writeln!(file, "not json")?;

        let metrics = EvaluationHarness::analyze_log(file.path())?;
        assert_eq!(metrics.total_sessions, 2);
        assert_eq!(metrics.exhausted_sessions, 1);
        assert_eq!(metrics.exhausted_ids, vec!["b".to_string()]);
        assert!((metrics.average_events - 5.5).abs() < f32::EPSILON);
        assert!((metrics.average_attempts - 3.0).abs() < f32::EPSILON);
        assert!(metrics.summary().contains("2 session(s)"));
        Ok(())
    }
}
