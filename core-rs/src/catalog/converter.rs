//! Offer -> quad conversion
//!
//! Pure mapping from one catalog offer to the quads mirrored for it. Bad
//! input yields fewer quads, never an error.

use oxigraph::model::{GraphName, Literal, NamedNode, Quad, Term};
use std::sync::Arc;
use tracing::debug;
use url::form_urlencoded::byte_serialize;

use super::offer::Offer;
use super::predicates::{PredicateTable, IS_FEDERATED, OFFERS_ASSET, OFFER_ID};
use crate::errors::Result;

/// Node identifying a remote participant: the address with a protocol-tagged scheme
///
/// `https://` becomes `edcs://`, `http://` becomes `edc://`.
pub fn participant_node(address: &str) -> Result<NamedNode> {
    let node = if let Some(rest) = address.strip_prefix("https://") {
        format!("edcs://{}", rest)
    } else if let Some(rest) = address.strip_prefix("http://") {
        format!("edc://{}", rest)
    } else {
        address.to_string()
    };
    Ok(NamedNode::new(node)?)
}

/// Node of an asset offered by `participant`
///
/// The asset id becomes the fragment; everything but alphanumerics and
/// `*-._` is percent-encoded.
pub fn asset_node(participant: &NamedNode, asset_id: &str) -> Option<NamedNode> {
    let fragment: String = byte_serialize(asset_id.as_bytes()).collect();
    // form encoding writes spaces as `+`; a literal `+` is already `%2B`
    let iri = format!("{}#{}", participant.as_str(), fragment.replace('+', "%20"));
    NamedNode::new(iri).ok()
}

/// Parse a comma separated value of a URI-list predicate
///
/// `<iri>` tokens become named nodes, `"text"` tokens literals without
/// the quotes, anything else a literal as written. Every token counts,
/// so `a,,b` yields an empty literal between `a` and `b`.
pub fn parse_uri_list(raw: &str) -> Vec<Term> {
    raw.split(',')
        .map(str::trim)
        .filter_map(|token| {
            if token.len() >= 2 && token.starts_with('<') && token.ends_with('>') {
                let iri = &token[1..token.len() - 1];
                match NamedNode::new(iri) {
                    Ok(node) => Some(Term::NamedNode(node)),
                    Err(e) => {
                        debug!(token, error = %e, "Dropping invalid IRI token");
                        None
                    }
                }
            } else if token.len() >= 2 && token.starts_with('"') && token.ends_with('"') {
                Some(Literal::new_simple_literal(&token[1..token.len() - 1]).into())
            } else {
                Some(Literal::new_simple_literal(token).into())
            }
        })
        .collect()
}

pub struct QuadConverter {
    predicates: Arc<PredicateTable>,
    offers_asset: NamedNode,
    offer_id: NamedNode,
    federation_key: String,
}

impl QuadConverter {
    pub fn new(predicates: Arc<PredicateTable>) -> Self {
        let federation_key = predicates
            .key_for(IS_FEDERATED)
            .unwrap_or(IS_FEDERATED)
            .to_string();
        Self {
            predicates,
            offers_asset: NamedNode::new_unchecked(OFFERS_ASSET),
            offer_id: NamedNode::new_unchecked(OFFER_ID),
            federation_key,
        }
    }

    pub fn offers_asset_predicate(&self) -> &NamedNode {
        &self.offers_asset
    }

    pub fn is_federated(&self, offer: &Offer) -> bool {
        offer.property(&self.federation_key).unwrap_or("false") == "true"
    }

    /// Quads describing `offer` as offered by `participant`, placed in `graph`
    pub fn convert(&self, graph: &GraphName, participant: &NamedNode, offer: &Offer) -> Vec<Quad> {
        if !self.is_federated(offer) {
            return Vec::new();
        }

        let Some(asset) = asset_node(participant, &offer.asset_id) else {
            debug!(asset = %offer.asset_id, "Asset id does not form a node, skipping offer");
            return Vec::new();
        };

        let mut quads = vec![Quad::new(
            participant.clone(),
            self.offers_asset.clone(),
            asset.clone(),
            graph.clone(),
        )];

        for (key, value) in &offer.properties {
            let Some(value) = value else { continue };
            let Some(entry) = self.predicates.resolve(key) else { continue };

            if entry.uri_list {
                for object in parse_uri_list(value) {
                    quads.push(Quad::new(asset.clone(), entry.predicate.clone(), object, graph.clone()));
                }
            } else {
                quads.push(Quad::new(
                    asset.clone(),
                    entry.predicate.clone(),
                    Literal::new_simple_literal(value),
                    graph.clone(),
                ));
            }
        }

        // offers whose properties carry no policy id still record their own id
        if !offer.id.is_empty() && !quads.iter().any(|q| q.predicate == self.offer_id) {
            quads.push(Quad::new(
                asset,
                self.offer_id.clone(),
                Literal::new_simple_literal(&offer.id),
                graph.clone(),
            ));
        }

        quads
    }
}
