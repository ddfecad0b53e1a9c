//! Enhancer configuration
//!
//! Loaded from YAML, with every field optional:
//!
//! ```yaml
//! fetch_timeout_secs: 20
//! batch_concurrency: 2
//! categories: [person, place]
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::category::Category;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Runtime settings for the enhancer and batch runner
#[derive(Debug, Clone, Deserialize)]
pub struct EnhancerConfig {
    /// Upper bound for one category's authority lookup
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// Documents processed at once by the batch runner
    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,
    /// Categories to process; always run in the fixed category order
    #[serde(default = "default_categories")]
    pub categories: Vec<Category>,
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_batch_concurrency() -> usize {
    4
}

fn default_categories() -> Vec<Category> {
    Category::ALL.to_vec()
}

impl Default for EnhancerConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: default_fetch_timeout_secs(),
            batch_concurrency: default_batch_concurrency(),
            categories: default_categories(),
        }
    }
}

impl EnhancerConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Batch concurrency, never below one
    pub fn concurrency(&self) -> usize {
        self.batch_concurrency.max(1)
    }

    /// Enabled categories in processing order
    pub fn enabled_categories(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| self.categories.contains(c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EnhancerConfig::default();
        assert_eq!(config.fetch_timeout(), Duration::from_secs(30));
        assert_eq!(config.concurrency(), 4);
        assert_eq!(config.enabled_categories(), Category::ALL.to_vec());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = EnhancerConfig::from_yaml("fetch_timeout_secs: 5\n").unwrap();
        assert_eq!(config.fetch_timeout(), Duration::from_secs(5));
        assert_eq!(config.batch_concurrency, 4);
    }

    #[test]
    fn test_categories_keep_fixed_order() {
        let config =
            EnhancerConfig::from_yaml("categories: [place, term]\nbatch_concurrency: 0\n").unwrap();
        assert_eq!(
            config.enabled_categories(),
            vec![Category::Term, Category::Place]
        );
        assert_eq!(config.concurrency(), 1);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "batch_concurrency: 8").unwrap();
        let config = EnhancerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.concurrency(), 8);

        assert!(matches!(
            EnhancerConfig::from_file("/nonexistent/enhancer.yaml"),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        assert!(matches!(
            EnhancerConfig::from_yaml("categories: [ghetto]"),
            Err(ConfigError::Parse(_))
        ));
    }
}
