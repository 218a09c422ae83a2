/**
 * config.rs
 * Parser for the agent plane configuration (YAML format)
 *
 * Format:
 * ```yaml
 * store:
 *   defaultGraph: urn:x-arq:DefaultGraph
 *   seedDocuments: [ ./dataspace.ttl ]
 * synchronization:
 *   intervalMs: 60000
 *   participants: [ https://provider.example/api/v1/dsp ]
 *   managementUrl: http://localhost:8181/management
 *   apiKey: secret
 * logging:
 *   level: info
 *   format: text
 * ```
 */

use oxigraph::model::NamedNode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{AgentError, Result};

/// Graph used when the configuration does not name one
pub const DEFAULT_GRAPH: &str = "urn:x-arq:DefaultGraph";

/// Top-level agent plane configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentConfig {
    pub store: StoreConfig,
    pub synchronization: SynchronizationConfig,
    pub logging: LoggingConfig,
}

/// Quad store configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreConfig {
    /// IRI of the graph that receives seeded and mirrored quads
    pub default_graph: String,
    /// Turtle-family documents loaded into the default graph at startup
    pub seed_documents: Vec<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_graph: DEFAULT_GRAPH.to_string(),
            seed_documents: Vec::new(),
        }
    }
}

/// Catalog synchronization configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SynchronizationConfig {
    /// Milliseconds between runs; zero or negative disables synchronization
    pub interval_ms: i64,
    /// Remote participant (connector protocol) addresses, synchronized in order
    pub participants: Vec<String>,
    /// Base url of the local control plane management API
    #[serde(skip_serializing_if = "Option::is_none")]
    pub management_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub timeout_ms: u64,
}

impl Default for SynchronizationConfig {
    fn default() -> Self {
        Self {
            interval_ms: -1,
            participants: Vec::new(),
            management_url: None,
            api_key: None,
            timeout_ms: 30_000,
        }
    }
}

impl SynchronizationConfig {
    /// Whether a schedule should be started at all
    pub fn is_enabled(&self) -> bool {
        self.interval_ms > 0 && !self.participants.is_empty()
    }

    /// Interval as a duration (zero when disabled)
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(0) as u64)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    pub level: String,
    /// Output format: text or json
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl AgentConfig {
    /// Load configuration from a YAML file
    ///
    /// Relative seed document paths are resolved against the directory of
    /// the configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(AgentError::Config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path)?;
        let mut config = Self::from_yaml_str(&content)?;

        if let Some(base) = path.parent() {
            config.store.seed_documents = config
                .store
                .seed_documents
                .into_iter()
                .map(|doc| if doc.is_relative() { base.join(doc) } else { doc })
                .collect();
        }

        Ok(config)
    }

    /// Parse and validate configuration from a YAML string
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: AgentConfig = serde_yaml::from_str(content)
            .map_err(|e| AgentError::Config(format!("Invalid configuration YAML: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    ///
    /// Ensures:
    /// - the default graph is an absolute IRI
    /// - every participant is an absolute http(s) address
    /// - an enabled synchronization names a management url
    pub fn validate(&self) -> Result<()> {
        NamedNode::new(self.store.default_graph.as_str()).map_err(|e| {
            AgentError::Config(format!(
                "Invalid defaultGraph '{}': {}",
                self.store.default_graph, e
            ))
        })?;

        for participant in &self.synchronization.participants {
            if !(participant.starts_with("http://") || participant.starts_with("https://")) {
                return Err(AgentError::Config(format!(
                    "Participant address must use http or https: {}",
                    participant
                )));
            }
            NamedNode::new(participant.as_str()).map_err(|e| {
                AgentError::Config(format!("Invalid participant address '{}': {}", participant, e))
            })?;
        }

        if self.synchronization.is_enabled() && self.synchronization.management_url.is_none() {
            return Err(AgentError::Config(
                "synchronization.managementUrl is required when synchronization is enabled".to_string(),
            ));
        }

        match self.logging.format.as_str() {
            "text" | "json" => Ok(()),
            other => Err(AgentError::Config(format!(
                "Invalid logging format: expected 'text' or 'json', got '{}'",
                other
            ))),
        }
    }
}
