/**
 * decorator.rs
 * Turns a transfer envelope into the outbound call it stands for
 *
 * Transfer mode passes the call straight through to the configured
 * endpoint. Matchmaking mode (the source address names an asset) routes the
 * call through the local query processor: the real endpoint travels in a
 * header, a form-encoded body is unwrapped into a plain query payload and
 * the Accept header is recovered from a query parameter.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::{debug, warn};
use url::form_urlencoded;

use super::address::{AddressDescriptor, Field, FieldSource, TransferEnvelope, METHOD_PROPERTY, QUERY_PARAMS_PROPERTY};
use super::call::CallSpec;
use super::params::QueryParams;
use crate::errors::{AgentError, Result};

pub const QUERY_PARAM: &str = "query";
pub const ACCEPT_PARAM: &str = "cx_accept";
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
pub const SPARQL_QUERY_MEDIA_TYPE: &str = "application/sparql-query";
pub const REMOTE_URL_HEADER: &str = "cx_remote_url";
pub const MATCHMAKING_BASE_URL: &str = "http://matchmaking.agent.internal/";
pub const ACCEPT_HEADER: &str = "Accept";
pub const DEFAULT_ACCEPT: &str = "*/*";
pub const DEFAULT_METHOD: &str = "GET";

/// Priority of the agent decorator; runs ahead of everything at the default priority
pub const AGENT_PRIORITY: i32 = 0;
pub const DEFAULT_PRIORITY: i32 = 100;

// leading `q=<weight>,` disposition smuggled in front of the media type
static QUALITY_PREFIX: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^\s*q=[0-9.]*\s*,\s*").ok());
static ESCAPED_SLASH: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\\/|%2[fF]").ok());

/// One step of request decoration
pub trait ParamsDecorator: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, envelope: &TransferEnvelope, call: CallSpec) -> Result<CallSpec>;
}

/// Reconstructs method, path, query, body, content type and Accept
#[derive(Debug, Clone, Copy, Default)]
pub struct AgentParamsDecorator;

impl AgentParamsDecorator {
    pub fn new() -> Self {
        Self
    }

    /// Build the outbound call for `envelope` against `address`
    ///
    /// Fails only when a proxied method is missing or a form-encoded
    /// matchmaking request does not carry exactly one query.
    pub fn decorate(&self, envelope: &TransferEnvelope, address: &AddressDescriptor) -> Result<CallSpec> {
        let result = self.build(envelope, address);
        if let Err(e) = &result {
            warn!(request_id = %envelope.id, reason = %e, "Request decoration failed");
        }
        result
    }

    fn build(&self, envelope: &TransferEnvelope, address: &AddressDescriptor) -> Result<CallSpec> {
        let method = extract_method(envelope, address)?;
        let path = envelope.resolve(address, Field::Path).map(str::to_string);
        let mut params = extract_params(envelope, address);
        let mut body = envelope.resolve(address, Field::Body).map(str::to_string);
        let mut content_type = envelope.resolve(address, Field::ContentType).map(str::to_string);
        let mut headers = BTreeMap::new();

        let base_url = if envelope.is_transfer() {
            with_trailing_slash(&address.base_url)
        } else {
            headers.insert(REMOTE_URL_HEADER.to_string(), address.base_url.clone());

            if content_type.as_deref().is_some_and(is_form_urlencoded) {
                let mut form = QueryParams::parse(body.as_deref().unwrap_or(""));
                body = Some(take_single_query(&envelope.id, &mut params, &mut form)?);
                params.merge(form);
                content_type = Some(SPARQL_QUERY_MEDIA_TYPE.to_string());
            }

            let accept = params
                .remove(ACCEPT_PARAM)
                .and_then(|values| values.into_iter().next())
                .map(|value| normalize_accept(&value))
                .unwrap_or_else(|| DEFAULT_ACCEPT.to_string());
            headers.insert(ACCEPT_HEADER.to_string(), accept);

            MATCHMAKING_BASE_URL.to_string()
        };

        debug!(
            request_id = %envelope.id,
            transfer = envelope.is_transfer(),
            base_url = %base_url,
            method = %method,
            "Request decorated"
        );

        Ok(CallSpec {
            base_url,
            method,
            path,
            query: params.to_query_string(),
            headers,
            body,
            content_type,
        })
    }
}

impl ParamsDecorator for AgentParamsDecorator {
    fn name(&self) -> &'static str {
        "agent"
    }

    fn apply(&self, envelope: &TransferEnvelope, call: CallSpec) -> Result<CallSpec> {
        let mut decorated = self.decorate(envelope, &envelope.source)?;
        for (name, value) in call.headers {
            decorated.headers.entry(name).or_insert(value);
        }
        Ok(decorated)
    }
}

/// Adds the source address's extra headers without overriding existing ones
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderDecorator;

impl ParamsDecorator for HeaderDecorator {
    fn name(&self) -> &'static str {
        "headers"
    }

    fn apply(&self, envelope: &TransferEnvelope, mut call: CallSpec) -> Result<CallSpec> {
        for (name, value) in &envelope.source.extra_headers {
            call.headers.entry(name.clone()).or_insert_with(|| value.clone());
        }
        Ok(call)
    }
}

/// Ordered decorators; lower priorities run first, ties keep registration order
#[derive(Default)]
pub struct DecoratorChain {
    entries: Vec<(i32, Box<dyn ParamsDecorator>)>,
}

impl DecoratorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// The agent decorator at the front, followed by the header decorator
    pub fn standard() -> Self {
        let mut chain = Self::new();
        chain.register(DEFAULT_PRIORITY, Box::new(HeaderDecorator));
        chain.register(AGENT_PRIORITY, Box::new(AgentParamsDecorator));
        chain
    }

    pub fn register(&mut self, priority: i32, decorator: Box<dyn ParamsDecorator>) {
        let position = self
            .entries
            .iter()
            .position(|(existing, _)| *existing > priority)
            .unwrap_or(self.entries.len());
        self.entries.insert(position, (priority, decorator));
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(_, d)| d.name()).collect()
    }

    pub fn decorate(&self, envelope: &TransferEnvelope) -> Result<CallSpec> {
        self.entries
            .iter()
            .try_fold(CallSpec::new(envelope.source.base_url.clone()), |call, (_, decorator)| {
                decorator.apply(envelope, call)
            })
    }
}

fn extract_method(envelope: &TransferEnvelope, address: &AddressDescriptor) -> Result<String> {
    match address.proxy.source(Field::Method) {
        FieldSource::Request => envelope
            .property(METHOD_PROPERTY)
            .map(str::to_string)
            .ok_or_else(|| AgentError::malformed(&envelope.id, "missing required 'method' property")),
        FieldSource::Address => Ok(address.method.clone().unwrap_or_else(|| DEFAULT_METHOD.to_string())),
    }
}

/// Request parameters first (when proxied), then the address's own
fn extract_params(envelope: &TransferEnvelope, address: &AddressDescriptor) -> QueryParams {
    let mut params = QueryParams::new();
    if address.proxy.source(Field::QueryParams) == FieldSource::Request {
        if let Some(raw) = envelope.property(QUERY_PARAMS_PROPERTY) {
            params.merge(QueryParams::parse(raw));
        }
    }
    if let Some(raw) = address.query_params.as_deref() {
        params.merge(QueryParams::parse(raw));
    }
    params
}

fn with_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}

fn is_form_urlencoded(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|media| media.trim().eq_ignore_ascii_case(FORM_URLENCODED))
}

/// Remove the single query value from both maps and decode it
fn take_single_query(request_id: &str, params: &mut QueryParams, form: &mut QueryParams) -> Result<String> {
    let found = params.count(QUERY_PARAM) + form.count(QUERY_PARAM);
    if found != 1 {
        return Err(AgentError::malformed(
            request_id,
            format!(
                "form-encoded request must carry exactly one '{}' parameter, found {}",
                QUERY_PARAM, found
            ),
        ));
    }

    let raw = params
        .remove(QUERY_PARAM)
        .into_iter()
        .chain(form.remove(QUERY_PARAM))
        .flatten()
        .next()
        .unwrap_or_default();

    // re-read as one form pair so `+` and percent escapes decode; `=` inside the value survives
    let pair = format!("{}={}", QUERY_PARAM, raw);
    Ok(form_urlencoded::parse(pair.as_bytes())
        .next()
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default())
}

/// Percent-decode, strip a leading quality disposition and unescape slashes
pub fn normalize_accept(raw: &str) -> String {
    // `+` stays literal, as in `application/sparql-results+json`
    let pair = format!("{}={}", ACCEPT_PARAM, raw.replace('+', "%2B"));
    let mut accept = form_urlencoded::parse(pair.as_bytes())
        .next()
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default();
    if let Some(prefix) = QUALITY_PREFIX.as_ref() {
        accept = prefix.replace(&accept, "").into_owned();
    }
    if let Some(slashes) = ESCAPED_SLASH.as_ref() {
        accept = slashes.replace_all(&accept, "/").into_owned();
    }
    accept
}
