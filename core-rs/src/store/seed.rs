/**
 * seed.rs
 * Seed document parsing for store initialisation
 */

use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::model::{GraphName, NamedNode, Quad};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::errors::{AgentError, Result};

/// Receives seed documents that could not be loaded
pub trait SeedErrorHandler: Send + Sync {
    fn on_error(&self, document: &Path, error: &AgentError);
}

/// Default handler: one warning per failed document
pub struct LoggingSeedErrorHandler;

impl SeedErrorHandler for LoggingSeedErrorHandler {
    fn on_error(&self, document: &Path, error: &AgentError) {
        warn!(document = %document.display(), error = %error, "Skipping seed document");
    }
}

/// Outcome of seeding a store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub documents: usize,
    pub triples: usize,
    pub failures: Vec<PathBuf>,
}

/// Pick the serialization from the file extension, Turtle otherwise
pub fn format_for(document: &Path) -> RdfFormat {
    document
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(RdfFormat::from_extension)
        .unwrap_or(RdfFormat::Turtle)
}

/// Parse one document; every statement is placed into `graph`
///
/// All-or-nothing: a syntax error anywhere discards the whole document.
pub fn parse_document(document: &Path, graph: &NamedNode) -> Result<Vec<Quad>> {
    let file = File::open(document)
        .map_err(|e| AgentError::Seed(format!("{}: {}", document.display(), e)))?;

    let graph_name = GraphName::NamedNode(graph.clone());
    RdfParser::from_format(format_for(document))
        .for_reader(BufReader::new(file))
        .map(|parsed| {
            parsed
                .map(|q| Quad::new(q.subject, q.predicate, q.object, graph_name.clone()))
                .map_err(|e| AgentError::Seed(format!("{}: {}", document.display(), e)))
        })
        .collect()
}
