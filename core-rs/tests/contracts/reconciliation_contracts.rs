//! Catalog Reconciliation Contract Tests
//!
//! Invariants of the catalog mirror that must hold whatever the
//! implementation looks like. Each test names what breaks downstream when
//! the invariant is given up.
//!
//! **Problem**: a "faster" diff-based sync or a shared transaction quietly leaves stale or partial state
//! **Solution**: contracts over the observable store contents after each run

use agent_plane::catalog::converter::{asset_node, participant_node};
use agent_plane::catalog::predicates::{RDF_NS, IS_FEDERATED};
use agent_plane::{
    CatalogSynchronizer, Offer, PredicateTable, QuadConverter, QuadPattern, QuadStore,
    StaticCatalogClient, SynchronizationConfig,
};
use oxigraph::model::{Literal, NamedNode, Quad, Term};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

const P1: &str = "https://one.example/api/v1/dsp";
const P2: &str = "https://two.example/api/v1/dsp";

fn federated(asset: &str) -> Offer {
    Offer::new(format!("offer-{}", asset), asset)
        .with_property(IS_FEDERATED, "true")
        .with_property("https://w3id.org/edc/v0.0.1/ns/name", asset.to_uppercase())
}

fn harness(interval_ms: i64, participants: &[&str]) -> (Arc<QuadStore>, Arc<StaticCatalogClient>, CatalogSynchronizer) {
    let store = Arc::new(QuadStore::new("urn:x-arq:DefaultGraph").unwrap());
    let client = Arc::new(StaticCatalogClient::new());
    let config = SynchronizationConfig {
        interval_ms,
        participants: participants.iter().map(|p| p.to_string()).collect(),
        management_url: Some("http://localhost:8181/management".to_string()),
        ..Default::default()
    };
    let synchronizer = CatalogSynchronizer::new(
        store.clone(),
        client.clone(),
        Arc::new(PredicateTable::standard()),
        &config,
    );
    (store, client, synchronizer)
}

fn contents(store: &QuadStore) -> HashSet<Quad> {
    store.find(QuadPattern::any()).to_vec().unwrap().into_iter().collect()
}

fn quads_about(store: &QuadStore, node: &NamedNode) -> usize {
    let term = Term::NamedNode(node.clone());
    contents(store)
        .iter()
        .filter(|q| q.object == term || q.subject.to_string() == node.to_string())
        .count()
}

/// WHY: Every run tears down and re-inserts a participant's whole contribution
/// REASON: The remote catalog is the only source of truth; the mirror keeps no change log
/// BREAKS: Repeated runs accumulating duplicates or losing quads
/// SACRIFICES: If this fails, matchmaking sees a different graph on every run
#[tokio::test]
async fn reconciliation_is_idempotent() {
    let (store, client, synchronizer) = harness(-1, &[P1]);
    client.set_offers(P1, vec![federated("a1"), federated("a2")]);

    synchronizer.run_now().await;
    let first = contents(&store);
    synchronizer.run_now().await;

    assert_eq!(contents(&store), first);
    assert!(!first.is_empty());
}

/// WHY: Dropped assets disappear from the mirror on the next run
/// REASON: Replacement semantics, not accumulation
/// BREAKS: Matchmaking routes queries to assets the provider withdrew
/// SACRIFICES: If this fails, the mirror leaks stale offers forever
#[tokio::test]
async fn dropped_asset_leaves_no_quads() {
    let (store, client, synchronizer) = harness(-1, &[P1]);
    let provider = participant_node(P1).unwrap();

    client.set_offers(P1, vec![federated("a1"), federated("a2")]);
    synchronizer.run_now().await;

    client.set_offers(P1, vec![federated("a1")]);
    synchronizer.run_now().await;

    assert_eq!(quads_about(&store, &asset_node(&provider, "a2").unwrap()), 0);
    assert!(quads_about(&store, &asset_node(&provider, "a1").unwrap()) > 0);
}

/// WHY: Only offers flagged isFederated = "true" are mirrored
/// REASON: Federation is opt-in per asset
/// BREAKS: Private assets become discoverable by every participant
/// SACRIFICES: If this fails, the filter leaks unpublished metadata
#[test]
fn non_federated_offers_contribute_nothing() {
    let converter = QuadConverter::new(Arc::new(PredicateTable::standard()));
    let graph = oxigraph::model::GraphName::NamedNode(NamedNode::new_unchecked("urn:x-arq:DefaultGraph"));
    let provider = participant_node(P1).unwrap();

    for offer in [
        Offer::new("o1", "a1"),
        Offer::new("o2", "a2").with_property(IS_FEDERATED, "false"),
        Offer::new("o3", "a3").with_property(IS_FEDERATED, "yes"),
    ] {
        assert!(converter.convert(&graph, &provider, &offer).is_empty());
    }
}

/// WHY: URI-list values split into one quad per token, in order
/// REASON: Type annotations and contract references are multi-valued
/// BREAKS: SPARQL patterns on rdf:type no longer match mirrored assets
/// SACRIFICES: If this fails, `<urn:a>, "lit", plain` stops meaning three objects
#[test]
fn uri_list_value_yields_three_typed_objects() {
    let converter = QuadConverter::new(Arc::new(PredicateTable::standard()));
    let graph = oxigraph::model::GraphName::NamedNode(NamedNode::new_unchecked("urn:x-arq:DefaultGraph"));
    let provider = participant_node(P1).unwrap();
    let offer = Offer::new("o1", "a1")
        .with_property(IS_FEDERATED, "true")
        .with_property(format!("{RDF_NS}type"), "<urn:a>, \"lit\", plain");

    let objects: Vec<Term> = converter
        .convert(&graph, &provider, &offer)
        .into_iter()
        .filter(|q| q.predicate.as_str() == format!("{RDF_NS}type"))
        .map(|q| q.object)
        .collect();

    assert_eq!(
        objects,
        vec![
            Term::NamedNode(NamedNode::new_unchecked("urn:a")),
            Term::Literal(Literal::new_simple_literal("lit")),
            Term::Literal(Literal::new_simple_literal("plain")),
        ]
    );
}

/// WHY: One participant's failure never blocks the participants after it
/// REASON: Remote catalogs are unreliable; each gets its own transaction
/// BREAKS: One unreachable provider freezes the whole federation
/// SACRIFICES: If this fails, availability of the mirror is the minimum over all providers
#[tokio::test]
async fn failing_participant_is_isolated() {
    let (store, client, synchronizer) = harness(-1, &[P1, P2]);
    client.set_failure(P1, "connection refused");
    client.set_offers(P2, vec![federated("b1")]);

    let report = synchronizer.run_now().await;

    assert_eq!(report.failures(), 1);
    let p2 = participant_node(P2).unwrap();
    assert!(quads_about(&store, &asset_node(&p2, "b1").unwrap()) > 0);
    assert!(!store.is_in_write());
}

/// WHY: start() while running does not schedule a second run
/// REASON: Two loops would interleave tear-down and insert on the same store
/// BREAKS: Single-writer assumption of the quad store
/// SACRIFICES: If this fails, runs race and the mirror can end up half replaced
#[tokio::test(start_paused = true)]
async fn double_start_schedules_one_run() {
    let (_, client, synchronizer) = harness(1000, &[P1]);

    synchronizer.start().unwrap();
    synchronizer.start().unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;

    assert_eq!(client.fetch_count(), 1);
    synchronizer.shutdown_and_wait().await;
}
