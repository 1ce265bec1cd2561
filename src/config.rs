use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

pub const ENV_INPUT: &str = "BYLINES_INPUT";
pub const ENV_DATABASE: &str = "BYLINES_DATABASE";
pub const ENV_EXPORT: &str = "BYLINES_EXPORT";
pub const ENV_WORKERS: &str = "BYLINES_WORKERS";

/// Settings for one pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Archive directory or single archive file
    #[serde(default)]
    pub input: Option<PathBuf>,
    /// SQLite database receiving the three tables
    #[serde(default)]
    pub database: Option<PathBuf>,
    /// JSON file receiving the three tables
    #[serde(default)]
    pub export: Option<PathBuf>,
    /// Threads used to normalize bylines
    #[serde(default = "default_workers")]
    pub workers: usize,
}

const fn default_workers() -> usize {
    1
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: None,
            database: None,
            export: None,
            workers: default_workers(),
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key/value lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let workers = match get(ENV_WORKERS) {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_WORKERS} must be a whole number, got {raw:?}"))?,
            None => default_workers(),
        };

        Ok(Self {
            input: get(ENV_INPUT).map(PathBuf::from),
            database: get(ENV_DATABASE).map(PathBuf::from),
            export: get(ENV_EXPORT).map(PathBuf::from),
            workers,
        })
    }

    /// Command-line values win over whatever was loaded before.
    #[must_use]
    pub fn merge_cli(
        mut self,
        input: Option<PathBuf>,
        database: Option<PathBuf>,
        export: Option<PathBuf>,
        workers: Option<usize>,
    ) -> Self {
        if input.is_some() {
            self.input = input;
        }
        if database.is_some() {
            self.database = database;
        }
        if export.is_some() {
            self.export = export;
        }
        if let Some(workers) = workers {
            self.workers = workers;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.input.is_none() {
            bail!("no input given: pass --input or set {ENV_INPUT}");
        }
        if self.workers == 0 {
            bail!("workers must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.workers, 1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_lookup() {
        let config = PipelineConfig::from_lookup(lookup(&[
            (ENV_INPUT, "/data/archive"),
            (ENV_DATABASE, "/data/nyt.db"),
            (ENV_EXPORT, ""),
            (ENV_WORKERS, " 4 "),
        ]))
        .unwrap();

        assert_eq!(config.input, Some(PathBuf::from("/data/archive")));
        assert_eq!(config.database, Some(PathBuf::from("/data/nyt.db")));
        assert_eq!(config.export, None);
        assert_eq!(config.workers, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_workers() {
        assert!(PipelineConfig::from_lookup(lookup(&[(ENV_WORKERS, "many")])).is_err());

        let config = PipelineConfig::default().merge_cli(Some("in".into()), None, None, Some(0));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cli_overrides_env() {
        let config = PipelineConfig::from_lookup(lookup(&[
            (ENV_INPUT, "/env/input"),
            (ENV_DATABASE, "/env/db"),
        ]))
        .unwrap()
        .merge_cli(Some("/cli/input".into()), None, Some("/cli/out.json".into()), None);

        assert_eq!(config.input, Some(PathBuf::from("/cli/input")));
        assert_eq!(config.database, Some(PathBuf::from("/env/db")));
        assert_eq!(config.export, Some(PathBuf::from("/cli/out.json")));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: PipelineConfig = serde_json::from_str(r#"{"input": "archive"}"#).unwrap();
        assert_eq!(config.workers, 1);
        assert_eq!(config.input, Some(PathBuf::from("archive")));
    }
}
