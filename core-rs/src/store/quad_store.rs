/**
 * quad_store.rs
 * Transactional quad store over an in-memory Oxigraph store
 *
 * Writes are buffered between `begin_write` and `commit`/`abort` and applied
 * in one Oxigraph transaction, so readers only ever see committed states.
 */

use oxigraph::model::{GraphName, NamedNode, Quad};
use oxigraph::store::{StorageError, Store};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

use super::pattern::QuadPattern;
use super::seed::{self, SeedErrorHandler, SeedReport};
use crate::config::StoreConfig;
use crate::errors::{AgentError, Result};

#[derive(Debug, Clone)]
enum Change {
    Insert(Quad),
    Remove(Quad),
}

pub struct QuadStore {
    store: Store,
    default_graph: NamedNode,
    pending: Mutex<Option<Vec<Change>>>,
}

impl QuadStore {
    /// Create an empty store whose primary graph is `default_graph`
    pub fn new(default_graph: &str) -> Result<Self> {
        Ok(Self {
            store: Store::new()?,
            default_graph: NamedNode::new(default_graph)?,
            pending: Mutex::new(None),
        })
    }

    /// Create a store from configuration and seed it
    pub fn open(config: &StoreConfig, errors: &dyn SeedErrorHandler) -> Result<Self> {
        Self::open_with_report(config, errors).map(|(store, _)| store)
    }

    /// Create and seed a store, returning what the seeding did
    ///
    /// A document that fails to parse is reported to `errors` and skipped;
    /// the remaining documents are still loaded.
    pub fn open_with_report(
        config: &StoreConfig,
        errors: &dyn SeedErrorHandler,
    ) -> Result<(Self, SeedReport)> {
        let store = Self::new(&config.default_graph)?;
        let mut report = SeedReport::default();

        if config.seed_documents.is_empty() {
            return Ok((store, report));
        }

        store.begin_write()?;
        for document in &config.seed_documents {
            match seed::parse_document(document, &store.default_graph) {
                Ok(quads) => {
                    info!(document = %document.display(), triples = quads.len(), "Seed document parsed");
                    report.documents += 1;
                    report.triples += quads.len();
                    for quad in quads {
                        store.add(quad)?;
                    }
                }
                Err(e) => {
                    errors.on_error(document, &e);
                    report.failures.push(document.clone());
                }
            }
        }
        store.commit()?;

        info!(
            documents = report.documents,
            triples = report.triples,
            failures = report.failures.len(),
            graph = %store.default_graph,
            "Quad store seeded"
        );

        Ok((store, report))
    }

    /// IRI of the store's primary graph
    pub fn default_graph_name(&self) -> &NamedNode {
        &self.default_graph
    }

    /// The primary graph as a quad graph name
    pub fn default_graph(&self) -> GraphName {
        GraphName::NamedNode(self.default_graph.clone())
    }

    fn pending(&self) -> MutexGuard<'_, Option<Vec<Change>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a write transaction on this handle
    pub fn begin_write(&self) -> Result<()> {
        let mut pending = self.pending();
        if pending.is_some() {
            return Err(AgentError::Transaction(
                "a write transaction is already open".to_string(),
            ));
        }
        *pending = Some(Vec::new());
        Ok(())
    }

    pub fn is_in_write(&self) -> bool {
        self.pending().is_some()
    }

    fn buffer(&self, change: Change) -> Result<()> {
        match self.pending().as_mut() {
            Some(changes) => {
                changes.push(change);
                Ok(())
            }
            None => Err(AgentError::Transaction(
                "no write transaction is open".to_string(),
            )),
        }
    }

    /// Add a quad within the current write transaction
    pub fn add(&self, quad: Quad) -> Result<()> {
        self.buffer(Change::Insert(quad))
    }

    /// Delete a quad within the current write transaction
    pub fn delete(&self, quad: Quad) -> Result<()> {
        self.buffer(Change::Remove(quad))
    }

    /// Apply all buffered changes atomically
    ///
    /// The transaction is closed whether or not the apply succeeds.
    pub fn commit(&self) -> Result<()> {
        let changes = self.pending().take().ok_or_else(|| {
            AgentError::Transaction("commit without an open write transaction".to_string())
        })?;

        self.store.transaction(|mut transaction| {
            for change in &changes {
                match change {
                    Change::Insert(quad) => transaction.insert(quad)?,
                    Change::Remove(quad) => transaction.remove(quad)?,
                };
            }
            Ok::<_, StorageError>(())
        })?;

        debug!(changes = changes.len(), "Write transaction committed");
        Ok(())
    }

    /// Discard buffered changes; a no-op when nothing is open
    pub fn abort(&self) {
        if let Some(changes) = self.pending().take() {
            debug!(changes = changes.len(), "Write transaction aborted");
        }
    }

    /// Committed quads matching `pattern`
    ///
    /// The returned value is lazy: nothing is read until it is iterated, and
    /// it can be iterated again to re-run the lookup.
    pub fn find(&self, pattern: QuadPattern) -> Matches<'_> {
        Matches { store: self, pattern }
    }

    /// Number of committed quads
    pub fn len(&self) -> Result<usize> {
        Ok(self.store.len()?)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.store.is_empty()?)
    }
}

/// Restartable lookup returned by [`QuadStore::find`]
pub struct Matches<'a> {
    store: &'a QuadStore,
    pattern: QuadPattern,
}

impl<'a> Matches<'a> {
    pub fn iter(&self) -> impl Iterator<Item = Result<Quad>> + '_ {
        self.store
            .store
            .quads_for_pattern(
                self.pattern.subject_ref(),
                self.pattern.predicate_ref(),
                self.pattern.object_ref(),
                self.pattern.graph_ref(),
            )
            .map(|quad| quad.map_err(AgentError::from))
    }

    /// Collect every match, failing on the first storage error
    pub fn to_vec(&self) -> Result<Vec<Quad>> {
        self.iter().collect()
    }

    pub fn pattern(&self) -> &QuadPattern {
        &self.pattern
    }
}
