//! Synchronizer integration tests
//!
//! Drives a configured agent plane end to end: YAML config, seeded store,
//! scheduled synchronization against an in-memory catalog, shutdown.

use agent_plane::catalog::converter::{asset_node, participant_node};
use agent_plane::catalog::predicates::{CX_COMMON, IS_FEDERATED, OFFERS_ASSET};
use agent_plane::{
    AgentConfig, CatalogSynchronizer, LoggingSeedErrorHandler, Offer, PredicateTable, QuadPattern,
    QuadStore, StaticCatalogClient,
};
use oxigraph::model::NamedNode;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const PROVIDER: &str = "https://provider.example/api/v1/dsp";

fn write_fixture(dir: &TempDir) -> std::path::PathBuf {
    fs::write(
        dir.path().join("dataspace.ttl"),
        "@prefix cx-common: <https://w3id.org/catenax/ontology/common#> .\n\
         <edcs://provider.example/api/v1/dsp> cx-common:id \"BPNL000000000001\" .\n",
    )
    .unwrap();

    let config_path = dir.path().join("agent-plane.yaml");
    fs::write(
        &config_path,
        format!(
            "store:\n  seedDocuments: [ dataspace.ttl ]\n\
             synchronization:\n  intervalMs: 1000\n  participants: [ {PROVIDER} ]\n  managementUrl: http://localhost:8181/management\n"
        ),
    )
    .unwrap();
    config_path
}

fn offer(asset: &str) -> Offer {
    Offer::new(format!("offer-{}", asset), asset)
        .with_property(IS_FEDERATED, "true")
        .with_property("https://w3id.org/edc/v0.0.1/ns/name", format!("Asset {}", asset))
        .with_property(
            "http://www.w3.org/1999/02/22-rdf-syntax-ns#type",
            "<https://w3id.org/catenax/ontology/common#GraphAsset>",
        )
}

fn offered_assets(store: &QuadStore) -> Vec<String> {
    let mut assets: Vec<String> = store
        .find(
            QuadPattern::any()
                .with_graph(store.default_graph_name().clone())
                .with_subject(participant_node(PROVIDER).unwrap())
                .with_predicate(NamedNode::new_unchecked(OFFERS_ASSET)),
        )
        .to_vec()
        .unwrap()
        .into_iter()
        .map(|q| q.object.to_string())
        .collect();
    assets.sort();
    assets
}

#[tokio::test(start_paused = true)]
async fn test_scheduled_sync_tracks_remote_catalog() {
    let temp_dir = TempDir::new().unwrap();
    let config = AgentConfig::load(write_fixture(&temp_dir)).unwrap();

    let (store, report) = QuadStore::open_with_report(&config.store, &LoggingSeedErrorHandler).unwrap();
    assert_eq!(report.triples, 1);
    let store = Arc::new(store);

    let client = Arc::new(StaticCatalogClient::new());
    client.set_offers(PROVIDER, vec![offer("a1"), offer("a2")]);

    let synchronizer = CatalogSynchronizer::new(
        store.clone(),
        client.clone(),
        Arc::new(PredicateTable::standard()),
        &config.synchronization,
    );
    synchronizer.start().unwrap();

    // nothing before the first interval elapses
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(offered_assets(&store).is_empty());

    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(offered_assets(&store).len(), 2);

    client.set_offers(PROVIDER, vec![offer("a2")]);
    tokio::time::sleep(Duration::from_millis(1000)).await;

    let provider = participant_node(PROVIDER).unwrap();
    assert_eq!(
        offered_assets(&store),
        vec![format!("<{}>", asset_node(&provider, "a2").unwrap().as_str())]
    );

    // seeded quads about the participant survive the tear-down
    let seeded = store
        .find(
            QuadPattern::any()
                .with_subject(provider.clone())
                .with_predicate(NamedNode::new_unchecked(format!("{CX_COMMON}id"))),
        )
        .to_vec()
        .unwrap();
    assert_eq!(seeded.len(), 1);

    synchronizer.shutdown_and_wait().await;
    assert!(!synchronizer.is_running());
    let fetches = client.fetch_count();
    tokio::time::sleep(Duration::from_millis(5000)).await;
    assert_eq!(client.fetch_count(), fetches);
}

#[tokio::test]
async fn test_failed_participant_keeps_previous_mirror() {
    let temp_dir = TempDir::new().unwrap();
    let config = AgentConfig::load(write_fixture(&temp_dir)).unwrap();
    let store = Arc::new(QuadStore::open(&config.store, &LoggingSeedErrorHandler).unwrap());
    let client = Arc::new(StaticCatalogClient::new());
    let synchronizer = CatalogSynchronizer::new(
        store.clone(),
        client.clone(),
        Arc::new(PredicateTable::standard()),
        &config.synchronization,
    );

    client.set_offers(PROVIDER, vec![offer("a1")]);
    synchronizer.run_now().await;
    let before = store.len().unwrap();

    client.set_failure(PROVIDER, "503 Service Unavailable");
    let report = synchronizer.run_now().await;

    assert_eq!(report.failures(), 1);
    assert_eq!(store.len().unwrap(), before);
    assert_eq!(offered_assets(&store).len(), 1);
}
