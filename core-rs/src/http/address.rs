/**
 * address.rs
 * Static address descriptors and the transfer envelopes that carry them
 *
 * An address names a backend endpoint plus defaults for each call field.
 * Proxy flags decide, per field, whether the value comes from the address
 * or from the dynamic properties of the inbound request.
 */

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::{AgentError, Result};

/// Request property keys
pub const METHOD_PROPERTY: &str = "method";
pub const PATH_PROPERTY: &str = "path";
pub const QUERY_PARAMS_PROPERTY: &str = "queryParams";
pub const BODY_PROPERTY: &str = "body";
pub const MEDIA_TYPE_PROPERTY: &str = "mediaType";

/// Call fields that can be proxied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Method,
    Path,
    QueryParams,
    Body,
    /// Follows the body flag
    ContentType,
}

impl Field {
    /// Request property the field is read from when proxied
    pub fn property(self) -> &'static str {
        match self {
            Field::Method => METHOD_PROPERTY,
            Field::Path => PATH_PROPERTY,
            Field::QueryParams => QUERY_PARAMS_PROPERTY,
            Field::Body => BODY_PROPERTY,
            Field::ContentType => MEDIA_TYPE_PROPERTY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    Address,
    Request,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProxyFlags {
    pub method: bool,
    pub path: bool,
    pub query_params: bool,
    pub body: bool,
}

impl ProxyFlags {
    pub fn all() -> Self {
        Self {
            method: true,
            path: true,
            query_params: true,
            body: true,
        }
    }

    pub fn source(&self, field: Field) -> FieldSource {
        let proxied = match field {
            Field::Method => self.method,
            Field::Path => self.path,
            Field::QueryParams => self.query_params,
            Field::Body | Field::ContentType => self.body,
        };
        if proxied {
            FieldSource::Request
        } else {
            FieldSource::Address
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressDescriptor {
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_params: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Asset the address points at; its absence marks a plain transfer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
    #[serde(default)]
    pub proxy: ProxyFlags,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_headers: BTreeMap<String, String>,
}

impl AddressDescriptor {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            method: None,
            path: None,
            query_params: None,
            body: None,
            content_type: None,
            asset_id: None,
            proxy: ProxyFlags::default(),
            extra_headers: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_query_params(mut self, query: impl Into<String>) -> Self {
        self.query_params = Some(query.into());
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>, content_type: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self.content_type = Some(content_type.into());
        self
    }

    #[must_use]
    pub fn with_asset_id(mut self, asset_id: impl Into<String>) -> Self {
        self.asset_id = Some(asset_id.into());
        self
    }

    #[must_use]
    pub fn with_proxy(mut self, proxy: ProxyFlags) -> Self {
        self.proxy = proxy;
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(name.into(), value.into());
        self
    }

    /// Check the descriptor once construction is finished
    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(AgentError::Config(format!(
                "Address baseUrl must be an http(s) url: '{}'",
                self.base_url
            )));
        }
        Ok(())
    }

    /// The address's own value of a field
    pub fn field(&self, field: Field) -> Option<&str> {
        match field {
            Field::Method => self.method.as_deref(),
            Field::Path => self.path.as_deref(),
            Field::QueryParams => self.query_params.as_deref(),
            Field::Body => self.body.as_deref(),
            Field::ContentType => self.content_type.as_deref(),
        }
    }
}

/// One inbound dataspace request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferEnvelope {
    pub id: String,
    pub source: AddressDescriptor,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl TransferEnvelope {
    pub fn new(id: impl Into<String>, source: AddressDescriptor) -> Self {
        Self {
            id: id.into(),
            source,
            properties: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// True unless the source address names an asset
    pub fn is_transfer(&self) -> bool {
        self.source.asset_id.is_none()
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Value of `field`, taken from wherever the address's proxy flags say
    pub fn resolve<'a>(&'a self, address: &'a AddressDescriptor, field: Field) -> Option<&'a str> {
        match address.proxy.source(field) {
            FieldSource::Request => self.property(field.property()),
            FieldSource::Address => address.field(field),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_follows_body_flag() {
        let flags = ProxyFlags {
            body: true,
            ..Default::default()
        };
        assert_eq!(flags.source(Field::ContentType), FieldSource::Request);
        assert_eq!(flags.source(Field::Body), FieldSource::Request);
        assert_eq!(flags.source(Field::Method), FieldSource::Address);
    }

    #[test]
    fn test_resolve_reads_selected_source() {
        let address = AddressDescriptor::new("http://backend")
            .with_path("/static")
            .with_method("POST")
            .with_proxy(ProxyFlags {
                path: true,
                ..Default::default()
            });
        let envelope = TransferEnvelope::new("req-1", address.clone()).with_property(PATH_PROPERTY, "/dynamic");

        assert_eq!(envelope.resolve(&address, Field::Path), Some("/dynamic"));
        assert_eq!(envelope.resolve(&address, Field::Method), Some("POST"));
        assert_eq!(envelope.resolve(&address, Field::Body), None);
    }

    #[test]
    fn test_mode_selection_by_asset_id() {
        let plain = TransferEnvelope::new("req-1", AddressDescriptor::new("http://backend"));
        let asset = TransferEnvelope::new("req-2", AddressDescriptor::new("http://backend").with_asset_id("GraphAsset"));
        assert!(plain.is_transfer());
        assert!(!asset.is_transfer());
    }

    #[test]
    fn test_descriptor_from_json() {
        let json = r#"{
            "baseUrl": "https://backend.example/sparql",
            "assetId": "GraphAsset?oem=Diagnosis",
            "proxy": { "method": true, "queryParams": true },
            "extraHeaders": { "Authorization": "Basic abc" }
        }"#;
        let address: AddressDescriptor = serde_json::from_str(json).unwrap();
        assert!(address.proxy.method);
        assert!(!address.proxy.body);
        assert_eq!(address.asset_id.as_deref(), Some("GraphAsset?oem=Diagnosis"));
        assert_eq!(address.extra_headers["Authorization"], "Basic abc");
        address.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_non_http_base_url() {
        assert!(AddressDescriptor::new("ftp://backend").validate().is_err());
    }
}
