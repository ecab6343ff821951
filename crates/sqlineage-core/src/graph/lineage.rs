//! Lineage graph - entities and their read dependencies

use std::collections::{HashSet, VecDeque};

use indexmap::{IndexMap, IndexSet};

use crate::entity::{normalize, EntityKind, EntityName};

/// A table or view in the graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub name: EntityName,
    pub kind: EntityKind,
    pub(crate) upstream: IndexSet<String>,
    pub(crate) downstream: IndexSet<String>,
}

impl Node {
    /// Normalized key of this node
    pub fn key(&self) -> &str {
        self.name.key()
    }

    /// Direct upstream keys, first-seen order
    pub fn upstream(&self) -> impl Iterator<Item = &str> {
        self.upstream.iter().map(String::as_str)
    }

    /// Direct downstream keys, first-seen order
    pub fn downstream(&self) -> impl Iterator<Item = &str> {
        self.downstream.iter().map(String::as_str)
    }
}

/// Directed graph of entities; an edge `a -> b` means `b` reads from `a`.
///
/// Built once by [`GraphBuilder`](super::GraphBuilder) and read-only
/// afterwards, so the cached downstream lists never go stale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineageGraph {
    pub(crate) nodes: IndexMap<String, Node>,
}

impl LineageGraph {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(&normalize(name))
    }

    /// Look up a node by (case-insensitive) name
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(&normalize(name))
    }

    /// All nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|n| n.upstream.len()).sum()
    }

    /// All edges as (upstream, downstream) key pairs
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.nodes.values().flat_map(|node| {
            node.upstream
                .iter()
                .map(move |up| (up.as_str(), node.key()))
        })
    }

    pub fn has_edge(&self, upstream: &str, downstream: &str) -> bool {
        self.node(downstream)
            .is_some_and(|n| n.upstream.contains(&normalize(upstream)))
    }

    /// Entities the given entity reads from directly
    pub fn upstream(&self, name: &str) -> Vec<&str> {
        self.node(name)
            .map(|n| n.upstream().collect())
            .unwrap_or_default()
    }

    /// Entities reading directly from the given entity
    pub fn downstream(&self, name: &str) -> Vec<&str> {
        self.node(name)
            .map(|n| n.downstream().collect())
            .unwrap_or_default()
    }

    /// All entities the given entity depends on, directly or not
    pub fn transitive_upstream(&self, name: &str) -> Vec<&str> {
        self.walk(name, |node| &node.upstream)
    }

    /// All entities affected if the given entity changes
    pub fn transitive_downstream(&self, name: &str) -> Vec<&str> {
        self.walk(name, |node| &node.downstream)
    }

    /// Direct neighbours in both directions
    pub fn impacted(&self, name: &str) -> Vec<&str> {
        let mut impacted: IndexSet<&str> = self.upstream(name).into_iter().collect();
        impacted.extend(self.downstream(name));
        impacted.into_iter().collect()
    }

    /// Plain-text summary of an entity
    pub fn describe(&self, name: &str) -> Option<String> {
        let node = self.node(name)?;
        let mut lines = vec![format!("Entity: {} ({})", node.name, node.kind)];
        if !node.upstream.is_empty() {
            lines.push(format!("Upstream: {}", self.display_names(node.upstream())));
        }
        if !node.downstream.is_empty() {
            lines.push(format!(
                "Downstream: {}",
                self.display_names(node.downstream())
            ));
        }
        Some(lines.join("\n"))
    }

    fn display_names<'a>(&'a self, keys: impl Iterator<Item = &'a str>) -> String {
        keys.map(|key| {
            self.nodes
                .get(key)
                .map(|n| n.name.display())
                .unwrap_or(key)
        })
        .collect::<Vec<_>>()
        .join(", ")
    }

    /// Breadth-first walk excluding the start node, first-seen order
    fn walk<'a>(&'a self, name: &str, next: impl Fn(&'a Node) -> &'a IndexSet<String>) -> Vec<&'a str> {
        let Some(start) = self.node(name) else {
            return Vec::new();
        };

        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(start.key());
        let mut queue: VecDeque<&Node> = VecDeque::new();
        queue.push_back(start);
        let mut result = Vec::new();

        while let Some(current) = queue.pop_front() {
            for key in next(current) {
                if let Some((key, node)) = self.nodes.get_key_value(key) {
                    if visited.insert(key.as_str()) {
                        result.push(key.as_str());
                        queue.push_back(node);
                    }
                }
            }
        }

        result
    }

    /// Find dependency cycles.
    ///
    /// Depth-first traversal along downstream edges, keeping the current
    /// path as the recursion stack; every back edge yields the path segment
    /// from the revisited node to the current one.
    pub fn cycles(&self) -> Vec<Vec<&str>> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            Unvisited,
            OnStack,
            Done,
        }

        let successors: Vec<Vec<usize>> = self
            .nodes
            .values()
            .map(|node| {
                node.downstream
                    .iter()
                    .filter_map(|key| self.nodes.get_index_of(key))
                    .collect()
            })
            .collect();

        let mut marks = vec![Mark::Unvisited; self.nodes.len()];
        let mut cycles = Vec::new();

        for root in 0..self.nodes.len() {
            if marks[root] != Mark::Unvisited {
                continue;
            }
            marks[root] = Mark::OnStack;
            let mut stack: Vec<(usize, usize)> = vec![(root, 0)];

            while let Some(frame) = stack.last_mut() {
                let node = frame.0;
                let next_child = successors[node].get(frame.1).copied();
                frame.1 += 1;

                if let Some(child) = next_child {
                    match marks[child] {
                        Mark::Unvisited => {
                            marks[child] = Mark::OnStack;
                            stack.push((child, 0));
                        }
                        Mark::OnStack => {
                            let start = stack
                                .iter()
                                .position(|&(n, _)| n == child)
                                .unwrap_or(0);
                            cycles.push(
                                stack[start..]
                                    .iter()
                                    .filter_map(|&(n, _)| self.nodes.get_index(n))
                                    .map(|(key, _)| key.as_str())
                                    .collect(),
                            );
                        }
                        Mark::Done => {}
                    }
                } else {
                    marks[node] = Mark::Done;
                    stack.pop();
                }
            }
        }

        cycles
    }
}
