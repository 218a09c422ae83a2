/**
 * pattern.rs
 * Quad patterns for store lookups (any component may be a wildcard)
 */

use oxigraph::model::{GraphName, GraphNameRef, NamedNode, NamedNodeRef, Subject, SubjectRef, Term, TermRef};

/// A (graph, subject, predicate, object) pattern; `None` matches anything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuadPattern {
    pub graph: Option<GraphName>,
    pub subject: Option<Subject>,
    pub predicate: Option<NamedNode>,
    pub object: Option<Term>,
}

impl QuadPattern {
    /// Pattern matching every quad in the store
    pub fn any() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_graph(mut self, graph: impl Into<GraphName>) -> Self {
        self.graph = Some(graph.into());
        self
    }

    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<Subject>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    #[must_use]
    pub fn with_predicate(mut self, predicate: impl Into<NamedNode>) -> Self {
        self.predicate = Some(predicate.into());
        self
    }

    #[must_use]
    pub fn with_object(mut self, object: impl Into<Term>) -> Self {
        self.object = Some(object.into());
        self
    }

    pub(crate) fn graph_ref(&self) -> Option<GraphNameRef<'_>> {
        self.graph.as_ref().map(GraphName::as_ref)
    }

    pub(crate) fn subject_ref(&self) -> Option<SubjectRef<'_>> {
        self.subject.as_ref().map(Subject::as_ref)
    }

    pub(crate) fn predicate_ref(&self) -> Option<NamedNodeRef<'_>> {
        self.predicate.as_ref().map(NamedNode::as_ref)
    }

    pub(crate) fn object_ref(&self) -> Option<TermRef<'_>> {
        self.object.as_ref().map(Term::as_ref)
    }
}

/// Re-use an object term as a subject (named and blank nodes only)
pub fn term_as_subject(term: &Term) -> Option<Subject> {
    match term {
        Term::NamedNode(node) => Some(node.clone().into()),
        Term::BlankNode(node) => Some(node.clone().into()),
        _ => None,
    }
}
