//! reqwest-backed call executor

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use std::time::Duration;
use tracing::{debug, warn};

use super::call::CallSpec;
use super::source::{CallExecutor, CallResponse, Warning};
use crate::errors::{AgentError, Result};

/// Response header carrying backend warnings as a JSON array
pub const WARNINGS_HEADER: &str = "cx_warnings";

pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }
}

#[async_trait]
impl CallExecutor for HttpTransport {
    async fn execute(&self, call: &CallSpec) -> Result<CallResponse> {
        let method = Method::from_bytes(call.method.as_bytes())
            .map_err(|e| AgentError::Transfer(format!("invalid method '{}': {}", call.method, e)))?;
        let url = call.url();
        debug!(method = %method, url = %url, "Sending call");

        let mut request = self.http.request(method, &url);
        for (name, value) in &call.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(content_type) = &call.content_type {
            request = request.header(CONTENT_TYPE, content_type.as_str());
        }
        if let Some(body) = &call.body {
            request = request.body(body.clone());
        }

        let response = request
            .send()
            .await
            .map_err(|e| AgentError::Transfer(format!("call to {} failed: {}", url, e)))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let warnings = response
            .headers()
            .get(WARNINGS_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(parse_warnings)
            .unwrap_or_default();
        let body = response.bytes().await?.to_vec();

        Ok(CallResponse {
            status,
            content_type,
            body,
            warnings,
        })
    }
}

/// Decode a warnings header; an unreadable header yields no warnings
pub fn parse_warnings(raw: &str) -> Vec<Warning> {
    match serde_json::from_str(raw) {
        Ok(warnings) => warnings,
        Err(e) => {
            warn!(error = %e, "Ignoring unreadable warnings header");
            Vec::new()
        }
    }
}
