/**
 * predicates.rs
 * Static property-name -> predicate table consulted by the quad converter
 *
 * Built once at startup and shared read-only. Keys that are not in the
 * table are ignored by the converter.
 */

use oxigraph::model::NamedNode;
use std::collections::HashMap;

use crate::errors::Result;

pub const CX_COMMON: &str = "https://w3id.org/catenax/ontology/common#";
pub const EDC_NS: &str = "https://w3id.org/edc/v0.0.1/ns/";
pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS_NS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const SHACL_NS: &str = "http://www.w3.org/ns/shacl#";
pub const ODRL_NS: &str = "http://www.w3.org/ns/odrl/2/";
pub const DCAT_NS: &str = "http://www.w3.org/ns/dcat#";
pub const DSPACE_NS: &str = "https://w3id.org/dspace/v0.8/";

/// Links a participant node to each asset node it offers
pub const OFFERS_ASSET: &str = "https://w3id.org/catenax/ontology/common#offers";
pub const IS_FEDERATED: &str = "https://w3id.org/catenax/ontology/common#isFederated";
pub const OFFER_ID: &str = "https://w3id.org/catenax/ontology/common#offerId";

/// Target of one table key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredicateEntry {
    pub predicate: NamedNode,
    /// Value is a comma separated list of `<iri>`, `"literal"` or plain tokens
    pub uri_list: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PredicateTable {
    entries: HashMap<String, PredicateEntry>,
    // predicate -> first key registered for it
    canonical_keys: HashMap<String, String>,
}

impl PredicateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a key; the first key registered for a predicate becomes its reverse key
    pub fn insert(&mut self, key: impl Into<String>, predicate: &str, uri_list: bool) -> Result<()> {
        let predicate = NamedNode::new(predicate)?;
        self.insert_node(key.into(), predicate, uri_list);
        Ok(())
    }

    fn insert_node(&mut self, key: String, predicate: NamedNode, uri_list: bool) {
        self.canonical_keys
            .entry(predicate.as_str().to_string())
            .or_insert_with(|| key.clone());
        self.entries.insert(key, PredicateEntry { predicate, uri_list });
    }

    fn known(&mut self, key: String, predicate: String, uri_list: bool) {
        self.insert_node(key, NamedNode::new_unchecked(predicate), uri_list);
    }

    /// The table used for catalog federation
    pub fn standard() -> Self {
        let mut table = Self::new();

        table.known(format!("{EDC_NS}id"), format!("{CX_COMMON}id"), false);
        table.known(format!("{EDC_NS}name"), format!("{CX_COMMON}name"), false);
        table.known(format!("{EDC_NS}description"), format!("{CX_COMMON}description"), false);
        table.known(format!("{EDC_NS}version"), format!("{CX_COMMON}version"), false);
        table.known(format!("{EDC_NS}contenttype"), format!("{CX_COMMON}contentType"), false);
        table.known(IS_FEDERATED.to_string(), IS_FEDERATED.to_string(), false);
        table.known(format!("{RDF_NS}type"), format!("{RDF_NS}type"), true);
        table.known(format!("{RDFS_NS}isDefinedBy"), format!("{RDFS_NS}isDefinedBy"), true);
        table.known(format!("{CX_COMMON}implementsProtocol"), format!("{CX_COMMON}implementsProtocol"), true);
        table.known(format!("{SHACL_NS}shapesGraph"), format!("{SHACL_NS}shapesGraph"), false);
        table.known(format!("{CX_COMMON}publishedUnderContract"), format!("{CX_COMMON}publishedUnderContract"), true);
        table.known(format!("{CX_COMMON}satisfiesRole"), format!("{CX_COMMON}satisfiesRole"), false);
        table.known(format!("{DSPACE_NS}participantId"), format!("{CX_COMMON}provider"), false);
        table.known(format!("{ODRL_NS}hasPolicy"), OFFER_ID.to_string(), false);

        // Legacy short keys, reached from dotted names such as `asset.prop.name`
        table.known("id".to_string(), format!("{CX_COMMON}id"), false);
        table.known("name".to_string(), format!("{CX_COMMON}name"), false);
        table.known("description".to_string(), format!("{CX_COMMON}description"), false);
        table.known("version".to_string(), format!("{CX_COMMON}version"), false);
        table.known("contenttype".to_string(), format!("{CX_COMMON}contentType"), false);

        table
    }

    /// Exact lookup
    pub fn get(&self, key: &str) -> Option<&PredicateEntry> {
        self.entries.get(key)
    }

    /// Exact lookup, then retry with leading dotted segments stripped one at a time
    ///
    /// `a.b.c` tries `a.b.c`, `b.c`, then `c`.
    pub fn resolve(&self, key: &str) -> Option<&PredicateEntry> {
        let mut candidate = key;
        loop {
            if let Some(entry) = self.entries.get(candidate) {
                return Some(entry);
            }
            match candidate.find('.') {
                Some(dot) => candidate = &candidate[dot + 1..],
                None => return None,
            }
        }
    }

    /// Key under which the given predicate is looked up in offer properties
    pub fn key_for(&self, predicate: &str) -> Option<&str> {
        self.canonical_keys.get(predicate).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
