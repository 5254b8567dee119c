//! Parent-chain walking

use crate::graph::InheritanceGraph;
use std::collections::HashSet;
use tracing::debug;

/// Iterator over a struct and its ancestors, nearest first.
///
/// Yields the starting name even when it is not declared in the graph, and
/// yields a referenced parent even when that parent is never declared; the
/// walk ends after a name with no known parent, or just before a name that
/// was already yielded.
pub struct Ancestors<'a> {
    graph: &'a InheritanceGraph,
    next: Option<&'a str>,
    visited: HashSet<&'a str>,
}

impl<'a> Ancestors<'a> {
    pub fn new(graph: &'a InheritanceGraph, start: &'a str) -> Self {
        Self {
            graph,
            next: Some(start),
            visited: HashSet::new(),
        }
    }
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let current = self.next.take()?;
        if !self.visited.insert(current) {
            debug!("Inheritance cycle reached {} again, ending chain", current);
            return None;
        }
        self.next = self.graph.parent(current);
        Some(current)
    }
}
