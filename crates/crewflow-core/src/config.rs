use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::CrewError;
use crate::policy::{RefetchPolicy, SufficiencyThreshold};

const DEFAULT_CONFIG_PATH: &str = "config.toml";
const CONFIG_PATH_ENV: &str = "CREWFLOW_CONFIG";

/// Top-level configuration, constructed once at startup and passed into
/// the components that need it. Core logic never reads ambient globals.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub search: SearchConfig,
    pub workflow: WorkflowConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Refetch policy derived from the workflow section.
    pub fn refetch_policy(&self) -> RefetchPolicy {
        RefetchPolicy::new(
            SufficiencyThreshold::new(self.workflow.sufficiency_threshold),
            self.workflow.max_fetch_attempts,
        )
    }
}

/// Helper to load configuration with guard rails.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a provided path or discoverable defaults.
    ///
    /// Resolution order:
    /// 1. Explicit `path` argument.
    /// 2. `CREWFLOW_CONFIG` environment variable.
    /// 3. `config.toml` in the current working directory.
    ///
    /// An explicitly named file must exist; the working-directory fallback
    /// may be absent, in which case built-in defaults apply.
    pub fn load(path: Option<PathBuf>) -> Result<Config, CrewError> {
        let (candidate, explicit) = resolve_path(path);
        if !explicit && !candidate.exists() {
            return Ok(Config::default());
        }

        let raw = fs::read_to_string(&candidate)
            .map_err(|err| CrewError::config_io(candidate.clone(), err))?;
        let config: Config = toml::from_str(&raw)
            .map_err(|err| CrewError::InvalidConfiguration(err.to_string()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn validate(config: &Config) -> Result<(), CrewError> {
        if config.workflow.sufficiency_threshold == 0 {
            return Err(CrewError::InvalidConfiguration(
                "workflow.sufficiency_threshold must be at least 1".into(),
            ));
        }
        if config.workflow.max_fetch_attempts == 0 {
            return Err(CrewError::InvalidConfiguration(
                "workflow.max_fetch_attempts must be at least 1".into(),
            ));
        }
        if config.search.api_key_env.trim().is_empty() {
            return Err(CrewError::InvalidConfiguration(
                "search.api_key_env must reference an environment variable".into(),
            ));
        }
        Ok(())
    }
}

fn resolve_path(path: Option<PathBuf>) -> (PathBuf, bool) {
    if let Some(path) = path {
        return (path, true);
    }

    if let Ok(from_env) = env::var(CONFIG_PATH_ENV) {
        if !from_env.trim().is_empty() {
            return (PathBuf::from(from_env), true);
        }
    }

    (Path::new(DEFAULT_CONFIG_PATH).to_path_buf(), false)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Name of the environment variable holding the search API key.
    /// The key itself is resolved lazily, only when a live fetcher is built.
    pub api_key_env: String,
    pub endpoint: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key_env: "SERPER_API_KEY".to_string(),
            endpoint: "https://google.serper.dev/search".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub sufficiency_threshold: usize,
    pub max_fetch_attempts: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            sufficiency_threshold: 8,
            max_fetch_attempts: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: PathBuf::from("data/logs"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn loads_explicit_toml() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "[workflow]\nsufficiency_threshold = 5\nmax_fetch_attempts = 2\n\n[logging]\nlevel = \"debug\""
        )
        .expect("write config");

        let config = ConfigLoader::load(Some(file.path().to_path_buf())).expect("config loads");
        assert_eq!(config.workflow.sufficiency_threshold, 5);
        assert_eq!(config.workflow.max_fetch_attempts, 2);
        assert_eq!(config.logging.level, "debug");
        // Untouched sections keep their defaults.
        assert_eq!(config.search.api_key_env, "SERPER_API_KEY");

        let policy = config.refetch_policy();
        assert_eq!(policy.threshold.get(), 5);
        assert_eq!(policy.max_attempts, 2);
    }

    #[test]
    fn rejects_zero_bounds() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "[workflow]\nmax_fetch_attempts = 0").expect("write config");

        let err = ConfigLoader::load(Some(file.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, CrewError::InvalidConfiguration(_)));
    }

    #[test]
    fn missing_explicit_path_errors() {
        let err =
            ConfigLoader::load(Some(PathBuf::from("/nonexistent/crewflow.toml"))).unwrap_err();
        assert!(matches!(err, CrewError::ConfigIo { .. }));
    }
}
