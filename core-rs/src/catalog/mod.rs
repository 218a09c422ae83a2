/**
 * catalog module
 *
 * - offer: offers, the federated asset filter and the catalog client seam
 * - predicates: static property-name -> predicate table
 * - converter: offer -> quad mapping
 * - client: management API and in-memory catalog clients
 * - synchronizer: scheduled tear-down-then-insert reconciliation
 */

pub mod client;
pub mod converter;
pub mod offer;
pub mod predicates;
pub mod synchronizer;

pub use client::{parse_catalog, ManagementCatalogClient, StaticCatalogClient};
pub use converter::{asset_node, participant_node, parse_uri_list, QuadConverter};
pub use offer::{CatalogClient, Criterion, FederatedAssetFilter, Offer};
pub use predicates::{PredicateEntry, PredicateTable, IS_FEDERATED, OFFERS_ASSET};
pub use synchronizer::{CatalogSynchronizer, ParticipantOutcome, SyncReport};
