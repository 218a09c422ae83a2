//! Catalog clients
//!
//! - `ManagementCatalogClient`: asks the local control plane management API
//!   to request a remote participant's catalog and flattens the returned
//!   DCAT datasets into offers
//! - `StaticCatalogClient`: fixed in-memory catalogs

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::debug;

use super::offer::{CatalogClient, FederatedAssetFilter, Offer};
use super::predicates::{DCAT_NS, DSPACE_NS, ODRL_NS};
use crate::config::SynchronizationConfig;
use crate::errors::{AgentError, Result};

pub const DATASPACE_PROTOCOL: &str = "dataspace-protocol-http";
pub const API_KEY_HEADER: &str = "X-Api-Key";

pub struct ManagementCatalogClient {
    http: reqwest::Client,
    management_url: String,
    api_key: Option<String>,
}

impl ManagementCatalogClient {
    pub fn new(management_url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            management_url: management_url.into(),
            api_key,
        })
    }

    pub fn from_config(config: &SynchronizationConfig) -> Result<Self> {
        let management_url = config.management_url.clone().ok_or_else(|| {
            AgentError::Config("synchronization.managementUrl is not configured".to_string())
        })?;
        Self::new(management_url, config.api_key.clone(), config.timeout())
    }

    fn catalog_url(&self) -> String {
        format!("{}/v2/catalog/request", self.management_url.trim_end_matches('/'))
    }

    /// Body of a management API catalog request
    pub fn catalog_request(remote: &str, filter: &FederatedAssetFilter) -> Value {
        json!({
            "@context": { "@vocab": "https://w3id.org/edc/v0.0.1/ns/" },
            "@type": "CatalogRequest",
            "counterPartyAddress": remote,
            "protocol": DATASPACE_PROTOCOL,
            "querySpec": filter.to_query_spec(),
        })
    }
}

#[async_trait]
impl CatalogClient for ManagementCatalogClient {
    async fn fetch(&self, remote: &str, filter: &FederatedAssetFilter) -> Result<Vec<Offer>> {
        let mut request = self
            .http
            .post(self.catalog_url())
            .json(&Self::catalog_request(remote, filter));
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AgentError::catalog(remote, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::catalog(
                remote,
                format!("management API answered {}", status),
            ));
        }

        let catalog: Value = response
            .json()
            .await
            .map_err(|e| AgentError::catalog(remote, format!("invalid catalog body: {}", e)))?;

        parse_catalog(&catalog).map_err(|reason| AgentError::catalog(remote, reason))
    }
}

/// Prefix map and vocabulary of a compacted JSON-LD document
#[derive(Debug, Default)]
struct JsonLdContext {
    prefixes: HashMap<String, String>,
    vocab: Option<String>,
}

impl JsonLdContext {
    fn from_document(document: &Value) -> Self {
        let mut context = Self::default();
        match document.get("@context") {
            Some(Value::Object(map)) => context.absorb(map),
            Some(Value::Array(items)) => {
                for item in items {
                    if let Value::Object(map) = item {
                        context.absorb(map);
                    }
                }
            }
            _ => {}
        }
        context
    }

    fn absorb(&mut self, map: &Map<String, Value>) {
        for (key, value) in map {
            let Value::String(iri) = value else { continue };
            if key == "@vocab" {
                self.vocab = Some(iri.clone());
            } else if !key.starts_with('@') {
                self.prefixes.insert(key.clone(), iri.clone());
            }
        }
    }

    /// Expand a compact IRI or vocabulary term
    fn expand(&self, term: &str) -> String {
        if term.starts_with('@') || term.contains("://") {
            return term.to_string();
        }
        if let Some((prefix, local)) = term.split_once(':') {
            return match self.prefixes.get(prefix) {
                Some(namespace) => format!("{}{}", namespace, local),
                None => term.to_string(),
            };
        }
        match (&self.vocab, self.prefixes.get(term)) {
            (_, Some(iri)) => iri.clone(),
            (Some(vocab), None) => format!("{}{}", vocab, term),
            (None, None) => term.to_string(),
        }
    }

    /// Flatten a JSON-LD value to the string form offers carry
    fn flatten(&self, value: &Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) => Some(s.clone()),
            Value::Object(map) => {
                if let Some(Value::String(id)) = map.get("@id") {
                    Some(format!("<{}>", self.expand(id)))
                } else {
                    map.get("@value").and_then(|inner| self.flatten(inner))
                }
            }
            Value::Array(items) => {
                let parts: Vec<String> = items.iter().filter_map(|item| self.flatten(item)).collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.join(","))
                }
            }
        }
    }

    fn find<'a>(&self, object: &'a Map<String, Value>, iri: &str) -> Option<&'a Value> {
        object
            .iter()
            .find(|(key, _)| self.expand(key) == iri)
            .map(|(_, value)| value)
    }
}

fn as_list(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

/// Flatten a DCAT catalog into offers
///
/// Datasets without an `@id` or without any policy are skipped.
pub fn parse_catalog(catalog: &Value) -> std::result::Result<Vec<Offer>, String> {
    let Value::Object(root) = catalog else {
        return Err("catalog is not a JSON object".to_string());
    };

    let context = JsonLdContext::from_document(catalog);
    let dataset_key = format!("{DCAT_NS}dataset");
    let policy_key = format!("{ODRL_NS}hasPolicy");
    let distribution_key = format!("{DCAT_NS}distribution");
    let participant_key = format!("{DSPACE_NS}participantId");

    let provider = context
        .find(root, &participant_key)
        .and_then(|value| context.flatten(value));

    let Some(datasets) = context.find(root, &dataset_key) else {
        return Ok(Vec::new());
    };

    let mut offers = Vec::new();
    for dataset in as_list(datasets) {
        let Value::Object(fields) = dataset else { continue };

        let Some(asset_id) = fields.get("@id").and_then(Value::as_str) else {
            debug!("Skipping dataset without @id");
            continue;
        };

        let offer_id = context
            .find(fields, &policy_key)
            .and_then(|policies| as_list(policies).into_iter().next())
            .and_then(|policy| policy.get("@id"))
            .and_then(Value::as_str);
        let Some(offer_id) = offer_id else {
            debug!(asset = asset_id, "Skipping dataset without policy");
            continue;
        };

        let mut properties = BTreeMap::new();
        for (key, value) in fields {
            if key.starts_with('@') {
                continue;
            }
            let expanded = context.expand(key);
            if expanded == policy_key || expanded == distribution_key {
                continue;
            }
            properties.insert(expanded, context.flatten(value));
        }
        properties.insert(policy_key.clone(), Some(offer_id.to_string()));
        if let Some(provider) = &provider {
            properties
                .entry(participant_key.clone())
                .or_insert_with(|| Some(provider.clone()));
        }

        offers.push(Offer {
            id: offer_id.to_string(),
            asset_id: asset_id.to_string(),
            properties,
        });
    }

    Ok(offers)
}

/// In-memory catalog client serving fixed offers per participant
#[derive(Default)]
pub struct StaticCatalogClient {
    catalogs: Mutex<HashMap<String, std::result::Result<Vec<Offer>, String>>>,
    fetches: AtomicUsize,
}

impl StaticCatalogClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `offers` for `participant` from now on
    pub fn set_offers(&self, participant: impl Into<String>, offers: Vec<Offer>) {
        self.catalogs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(participant.into(), Ok(offers));
    }

    /// Fail every fetch for `participant` from now on
    pub fn set_failure(&self, participant: impl Into<String>, reason: impl Into<String>) {
        self.catalogs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(participant.into(), Err(reason.into()));
    }

    /// Number of fetches served so far
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogClient for StaticCatalogClient {
    async fn fetch(&self, remote: &str, _filter: &FederatedAssetFilter) -> Result<Vec<Offer>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let catalogs = self.catalogs.lock().unwrap_or_else(PoisonError::into_inner);
        match catalogs.get(remote) {
            Some(Ok(offers)) => Ok(offers.clone()),
            Some(Err(reason)) => Err(AgentError::catalog(remote, reason.clone())),
            None => Ok(Vec::new()),
        }
    }
}
