/**
 * store module
 *
 * - quad_store: transactional quad store over Oxigraph
 * - pattern: wildcard quad patterns for lookups
 * - seed: seed document parsing and error reporting
 */

pub mod pattern;
pub mod quad_store;
pub mod seed;

pub use pattern::{term_as_subject, QuadPattern};
pub use quad_store::{Matches, QuadStore};
pub use seed::{LoggingSeedErrorHandler, SeedErrorHandler, SeedReport};
