use std::collections::HashSet;
use std::fs::{OpenOptions, create_dir_all};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context as _, Result};
use chrono::{Datelike, Utc};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;
use tracing::warn;

static REDACTION_PATTERNS: Lazy<Vec<(String, Regex)>> = Lazy::new(|| {
    vec![
        (
            "api_key".to_string(),
            Regex::new(r"(?i)(api[_-]?key\s*[:=]\s*)([A-Za-z0-9\-_.+/]+)")
                .expect("invalid api_key regex"),
        ),
        (
            "secret".to_string(),
            Regex::new(r"(?i)(secret\s*[:=]\s*)([A-Za-z0-9\-_.+/]+)")
                .expect("invalid secret regex"),
        ),
        (
            "bearer".to_string(),
            Regex::new(r"(?i)(bearer\s+)([A-Za-z0-9\-_.+=/]+)").expect("invalid bearer regex"),
        ),
    ]
});

/// Completed-session fields worth persisting for later evaluation.
#[derive(Debug, Clone)]
pub struct SessionLogInput {
    pub session_id: String,
    pub query: Option<String>,
    pub summary: String,
    pub verdict: Option<String>,
    pub exhausted: bool,
    pub events_count: usize,
    pub attempts: usize,
}

#[derive(Serialize)]
struct SessionLogRecord {
    timestamp: String,
    session_id: String,
    query: Option<String>,
    summary: String,
    verdict: Option<String>,
    exhausted: bool,
    events_count: usize,
    attempts: usize,
    redactions: Vec<String>,
}

#[derive(Serialize)]
struct AuditLogRecord {
    timestamp: String,
    session_id: String,
    redactions: Vec<String>,
}

fn append_json_line<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)
            .with_context(|| format!("failed to create log directory {}", parent.display()))?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    let line = serde_json::to_string(value)?;
    writeln!(writer, "{}", line)
        .with_context(|| format!("failed to append log entry to {}", path.display()))?;
    writer.flush()?;
    Ok(())
}

fn sanitize_text(input: &str, redactions: &mut HashSet<String>) -> String {
    let mut output = input.to_string();
    for (name, regex) in REDACTION_PATTERNS.iter() {
        let mut matched = false;
        output = regex
            .replace_all(&output, |caps: &Captures| {
                matched = true;
                if caps.len() > 1 {
                    format!("{}[REDACTED]", &caps[1])
                } else {
                    "[REDACTED]".to_string()
                }
            })
            .to_string();
        if matched {
            redactions.insert(name.clone());
        }
    }
    output
}

/// Append one sanitized session record under `base_dir/YYYY/MM/session.jsonl`.
///
/// Any field that matched a redaction pattern is additionally noted in
/// `audit.jsonl` next to the session log.
pub fn log_session_completion(base_dir: &Path, input: SessionLogInput) -> Result<()> {
    let timestamp = Utc::now();
    let mut redactions = HashSet::new();

    let query = input
        .query
        .as_deref()
        .map(|value| sanitize_text(value, &mut redactions));
    let summary = sanitize_text(&input.summary, &mut redactions);
    let verdict = input
        .verdict
        .as_deref()
        .map(|value| sanitize_text(value, &mut redactions));

    let record = SessionLogRecord {
        timestamp: timestamp.to_rfc3339(),
        session_id: input.session_id.clone(),
        query,
        summary,
        verdict,
        exhausted: input.exhausted,
        events_count: input.events_count,
        attempts: input.attempts,
        redactions: redactions.iter().cloned().collect(),
    };

    let month_dir = base_dir
        .join(format!("{:04}", timestamp.year()))
        .join(format!("{:02}", timestamp.month()));
    let session_log_path = month_dir.join("session.jsonl");
    append_json_line(&session_log_path, &record)?;

    if !record.redactions.is_empty() {
        let audit = AuditLogRecord {
            timestamp: record.timestamp.clone(),
            session_id: input.session_id.clone(),
            redactions: record.redactions.clone(),
        };
        let audit_path = month_dir.join("audit.jsonl");
        append_json_line(&audit_path, &audit)?;
        warn!(
            session_id = %input.session_id,
            fields = ?record.redactions,
            "redacted potential secrets from session log"
        );
    }

    Ok(())
}
