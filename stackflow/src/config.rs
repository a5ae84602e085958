//! Project configuration consumed by workflows.
//!
//! Only the fields the workflows read are modelled. Loading credentials or
//! merging configuration sources is left to the caller.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::{Result, StackflowError};

fn default_namespace() -> String {
    "stackflow".to_string()
}

/// Top-level project configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Prefix applied to every stack name.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Source repository settings.
    #[serde(default)]
    pub repo: RepoConfig,
    /// Service settings.
    #[serde(default)]
    pub service: ServiceConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            repo: RepoConfig::default(),
            service: ServiceConfig::default(),
        }
    }
}

impl ProjectConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the document is malformed.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| StackflowError::Config(e.to_string()))
    }

    /// Reads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be read, or a configuration error
    /// if it is malformed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Sets the namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Sets the repository name.
    #[must_use]
    pub fn with_repo_name(mut self, name: impl Into<String>) -> Self {
        self.repo.name = name.into();
        self
    }

    /// Sets the service name.
    #[must_use]
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service.name = name.into();
        self
    }

    /// Sets the artifact bucket.
    #[must_use]
    pub fn with_build_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.service.pipeline.build.bucket = bucket.into();
        self
    }

    /// Sets the database name.
    #[must_use]
    pub fn with_database_name(mut self, name: impl Into<String>) -> Self {
        self.service.database.name = name.into();
        self
    }
}

/// Source repository settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoConfig {
    /// Repository name.
    #[serde(default)]
    pub name: String,
    /// Current revision.
    #[serde(default)]
    pub revision: String,
}

/// Service settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name.
    #[serde(default)]
    pub name: String,
    /// Delivery pipeline settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Role assumed by the stack provider.
    #[serde(default)]
    pub cloudformation_role_arn: String,
    /// Key used to encrypt database credentials.
    #[serde(default)]
    pub database_key_arn: String,
}

/// Delivery pipeline settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Build settings.
    #[serde(default)]
    pub build: BuildConfig,
}

/// Build settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Artifact bucket.
    #[serde(default)]
    pub bucket: String,
}

/// Database settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database name; empty means the service has no database.
    #[serde(default)]
    pub name: String,
}

/// Logging configuration for [`crate::observability::init_tracing`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,
    /// Emit JSON lines instead of human readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

impl LoggingConfig {
    /// Sets the level.
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Enables JSON output.
    #[must_use]
    pub fn json(mut self) -> Self {
        self.json = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ProjectConfig::default();
        assert_eq!(config.namespace, "stackflow");
        assert!(config.service.name.is_empty());
        assert!(config.service.database.name.is_empty());
    }

    #[test]
    fn test_from_json_partial() {
        let config = ProjectConfig::from_json_str(
            r#"{"service": {"name": "checkout", "database": {"name": "orders"}}}"#,
        )
        .unwrap();

        assert_eq!(
            config,
            ProjectConfig::new()
                .with_service_name("checkout")
                .with_database_name("orders")
        );
    }

    #[test]
    fn test_from_json_invalid() {
        let err = ProjectConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, StackflowError::Config(_)));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"namespace": "acme", "repo": {{"name": "shop", "revision": "abc123"}}}}"#
        )
        .unwrap();

        let config = ProjectConfig::from_path(file.path()).unwrap();
        assert_eq!(config.namespace, "acme");
        assert_eq!(config.repo.name, "shop");
        assert_eq!(config.repo.revision, "abc123");
    }

    #[test]
    fn test_from_missing_path() {
        let err = ProjectConfig::from_path("/nonexistent/stackflow.json").unwrap_err();
        assert!(matches!(err, StackflowError::Io(_)));
    }

    #[test]
    fn test_logging_config() {
        let config = LoggingConfig::default().with_level("debug").json();
        assert_eq!(config.level, "debug");
        assert!(config.json);
    }
}
