//! Graph builder - per-run construction context for a LineageGraph

use indexmap::{IndexMap, IndexSet};

use crate::entity::{EntityKind, EntityName};
use crate::graph::{LineageGraph, Node};

/// Accumulates entities and edges, then freezes them into a [`LineageGraph`].
///
/// Node and edge sets are unions, so the final graph does not depend on the
/// order definitions arrive in; only the per-entity lists keep first-seen
/// order.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    entities: IndexMap<String, (EntityName, EntityKind)>,
    /// (upstream key, downstream key)
    edges: IndexSet<(String, String)>,
    defined: IndexSet<String>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity as a source node if absent
    pub fn add_entity(&mut self, name: &EntityName) {
        if !self.entities.contains_key(name.key()) {
            self.entities
                .insert(name.key().to_string(), (name.clone(), EntityKind::Source));
        }
    }

    /// Add an edge `upstream -> downstream`, adding missing endpoints
    pub fn add_edge(&mut self, upstream: &EntityName, downstream: &EntityName) {
        self.add_entity(upstream);
        self.add_entity(downstream);
        self.edges
            .insert((upstream.key().to_string(), downstream.key().to_string()));
    }

    /// Record that `name` is defined as `kind` and reads from `upstream`.
    ///
    /// Returns `false` if `name` was already defined; the upstream sets of
    /// both definitions are merged.
    pub fn define<'n>(
        &mut self,
        name: &EntityName,
        kind: EntityKind,
        upstream: impl IntoIterator<Item = &'n EntityName>,
    ) -> bool {
        self.add_entity(name);
        if let Some((_, existing)) = self.entities.get_mut(name.key()) {
            *existing = kind;
        }
        let first = self.defined.insert(name.key().to_string());

        for source in upstream {
            self.add_edge(source, name);
        }
        first
    }

    /// Freeze into an immutable graph with upstream and downstream lists
    pub fn build(self) -> LineageGraph {
        let mut nodes: IndexMap<String, Node> = self
            .entities
            .into_iter()
            .map(|(key, (name, kind))| {
                let node = Node {
                    name,
                    kind,
                    upstream: IndexSet::new(),
                    downstream: IndexSet::new(),
                };
                (key, node)
            })
            .collect();

        for (upstream, downstream) in self.edges {
            if let Some(node) = nodes.get_mut(&upstream) {
                node.downstream.insert(downstream.clone());
            }
            if let Some(node) = nodes.get_mut(&downstream) {
                node.upstream.insert(upstream);
            }
        }

        LineageGraph { nodes }
    }
}
