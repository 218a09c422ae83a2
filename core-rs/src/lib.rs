//! # Agent Plane Core
//!
//! Dataspace agent plane: mirrors the federated offers of remote catalog
//! participants into a local quad store for matchmaking, and translates
//! dataspace transfer envelopes into the HTTP calls they stand for.
//!
//! ## Architecture
//!
//! ```text
//!  Catalog Client ──► Quad Converter ──► Quad Store
//!         ▲                                  ▲
//!         └──────── Catalog Synchronizer ────┘
//!
//!  Transfer Envelope ──► Decorator Chain ──► Call Spec ──► Transport / Processor
//!                                                              │
//!                                              Agent Source ◄──┘ (result + warnings parts)
//! ```
//!
//! ## Modules
//!
//! - `store`: transactional quad store over Oxigraph, seeded from Turtle-family documents
//! - `catalog`: offers, predicate table, quad converter, catalog clients, synchronizer
//! - `http`: address descriptors, request decoration, agent source, HTTP transport
//! - `config`, `logging`, `errors`: the ambient stack

pub mod catalog;
pub mod config;
pub mod errors;
pub mod http;
pub mod logging;
pub mod store;

pub use catalog::{
    CatalogClient, CatalogSynchronizer, FederatedAssetFilter, ManagementCatalogClient, Offer,
    PredicateTable, QuadConverter, StaticCatalogClient, SyncReport,
};
pub use config::{AgentConfig, LoggingConfig, StoreConfig, SynchronizationConfig};
pub use errors::{AgentError, Result};
pub use http::{
    AddressDescriptor, AgentParamsDecorator, AgentSource, CallExecutor, CallSpec, DecoratorChain,
    HttpTransport, TransferEnvelope,
};
pub use store::{LoggingSeedErrorHandler, QuadPattern, QuadStore, SeedErrorHandler};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
