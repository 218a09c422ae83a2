//! Agent source
//!
//! Decorates an inbound envelope, hands the call to the query processor
//! (matchmaking) or the HTTP transport (transfer) and packages the answer
//! as response parts.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use super::call::CallSpec;
use super::decorator::DecoratorChain;
use super::address::TransferEnvelope;
use crate::errors::{AgentError, Result};

pub const RESULT_PART: &str = "result";
pub const WARNINGS_PART: &str = "warnings";
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Problem reported by a backend alongside its result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Warning {
    pub source: String,
    pub target: String,
    pub problem: String,
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
    pub warnings: Vec<Warning>,
}

impl CallResponse {
    pub fn ok(content_type: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            content_type: Some(content_type.into()),
            body: body.into(),
            warnings: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes a decorated call
#[async_trait]
pub trait CallExecutor: Send + Sync {
    async fn execute(&self, call: &CallSpec) -> Result<CallResponse>;
}

/// One named part of a response stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub content_type: String,
    pub body: Vec<u8>,
}

pub struct AgentSource {
    chain: DecoratorChain,
    transport: Arc<dyn CallExecutor>,
    processor: Arc<dyn CallExecutor>,
}

impl AgentSource {
    pub fn new(chain: DecoratorChain, transport: Arc<dyn CallExecutor>, processor: Arc<dyn CallExecutor>) -> Self {
        Self {
            chain,
            transport,
            processor,
        }
    }

    /// Run the request and return its result part, plus a warnings part when there are warnings
    pub async fn open_part_stream(&self, envelope: &TransferEnvelope) -> Result<Vec<Part>> {
        let call = self.chain.decorate(envelope)?;

        let executor = if envelope.is_transfer() {
            &self.transport
        } else {
            &self.processor
        };
        let response = executor.execute(&call).await?;

        if !response.is_success() {
            warn!(request_id = %envelope.id, status = response.status, "Backend call failed");
            return Err(AgentError::Transfer(format!(
                "request {} answered with status {}",
                envelope.id, response.status
            )));
        }

        let mut parts = vec![Part {
            name: RESULT_PART.to_string(),
            content_type: response
                .content_type
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            body: response.body,
        }];

        if !response.warnings.is_empty() {
            debug!(request_id = %envelope.id, warnings = response.warnings.len(), "Attaching warnings part");
            parts.push(Part {
                name: WARNINGS_PART.to_string(),
                content_type: JSON_MEDIA_TYPE.to_string(),
                body: serde_json::to_vec(&response.warnings)?,
            });
        }

        Ok(parts)
    }
}
