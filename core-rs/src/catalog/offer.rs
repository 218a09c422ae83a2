//! Catalog offers and the catalog client seam

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use super::predicates::IS_FEDERATED;
use crate::errors::Result;

/// An asset advertised by a remote participant, with its flat property bag
///
/// A `None` property value is an explicit null in the remote catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: String,
    pub asset_id: String,
    pub properties: BTreeMap<String, Option<String>>,
}

impl Offer {
    pub fn new(id: impl Into<String>, asset_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            asset_id: asset_id.into(),
            properties: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), Some(value.into()));
        self
    }

    #[must_use]
    pub fn with_null_property(mut self, key: impl Into<String>) -> Self {
        self.properties.insert(key.into(), None);
        self
    }

    /// Non-null value of a property
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(|value| value.as_deref())
    }
}

/// One filter expression of a catalog query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    pub operand_left: String,
    pub operator: String,
    pub operand_right: String,
}

/// Catalog filter sent along with every fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederatedAssetFilter {
    pub criteria: Vec<Criterion>,
}

impl FederatedAssetFilter {
    /// The fixed `isFederated = true` filter
    pub fn federated() -> Self {
        Self {
            criteria: vec![Criterion {
                operand_left: IS_FEDERATED.to_string(),
                operator: "=".to_string(),
                operand_right: "true".to_string(),
            }],
        }
    }

    /// Render as a management API `querySpec`
    pub fn to_query_spec(&self) -> Value {
        json!({
            "@type": "QuerySpec",
            "filterExpression": self.criteria,
        })
    }
}

/// Fetches the offers a remote participant exposes
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn fetch(&self, remote: &str, filter: &FederatedAssetFilter) -> Result<Vec<Offer>>;
}
