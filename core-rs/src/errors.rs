//! Error types for the agent plane

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Seed document error: {0}")]
    Seed(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Invalid IRI: {0}")]
    InvalidIri(String),

    #[error("Catalog error for participant {participant}: {reason}")]
    Catalog { participant: String, reason: String },

    #[error("Malformed request {request_id}: {reason}")]
    MalformedRequest { request_id: String, reason: String },

    #[error("Transfer error: {0}")]
    Transfer(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AgentError {
    pub fn catalog(participant: impl Into<String>, reason: impl Into<String>) -> Self {
        AgentError::Catalog {
            participant: participant.into(),
            reason: reason.into(),
        }
    }

    pub fn malformed(request_id: impl Into<String>, reason: impl Into<String>) -> Self {
        AgentError::MalformedRequest {
            request_id: request_id.into(),
            reason: reason.into(),
        }
    }
}

impl From<oxigraph::store::StorageError> for AgentError {
    fn from(err: oxigraph::store::StorageError) -> Self {
        AgentError::Store(err.to_string())
    }
}

impl From<oxigraph::model::IriParseError> for AgentError {
    fn from(err: oxigraph::model::IriParseError) -> Self {
        AgentError::InvalidIri(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;
