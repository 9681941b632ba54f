//! The dependency graph: builds an immutable DAG from a [`Catalog`], detects
//! structural errors, and drives ready-set selection with transitive skip on
//! failure.

mod build;


use std::collections::{BTreeSet, HashMap};

use crate::catalog::{Catalog, Resource};
use crate::errors::ConstructionError;

/// An opaque handle to a node in a [`DependencyGraph`]. Cheap to copy, valid
/// only for the graph that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeHandle(u64);

impl NodeHandle {
    /// The resource id this handle identifies.
    pub fn id(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeStatus {
    Pending,
    Done,
    Failed,
    Skipped,
}

struct Node {
    resource: Resource,
    status: NodeStatus,
    /// Count of direct dependencies not yet `Done`. Reaches zero exactly
    /// when the node becomes ready.
    unmet: usize,
}

/// A built, validated dependency graph over a catalog's resources.
///
/// Construction resolves and rejects duplicate/zero ids, missing
/// dependencies, and cycles. Once built, the graph is driven through
/// `ready()` / `mark()` / `mark_failure()` until `done()`.
pub struct DependencyGraph {
    nodes: HashMap<u64, Node>,
    /// Reverse edges: id -> ids that directly depend on it. Computed once at
    /// build time and read-only thereafter.
    dependents: HashMap<u64, Vec<u64>>,
    ready: BTreeSet<u64>,
    remaining: usize,
}

impl DependencyGraph {
    /// Build a graph from a catalog, or fail with the first structural error
    /// found, in the order: zero id, duplicate id, missing dependency,
    /// cycle.
    pub fn build(catalog: &Catalog) -> Result<Self, ConstructionError> {
        let forward = build::validate(catalog)?;

        let mut dependents: HashMap<u64, Vec<u64>> =
            forward.keys().map(|id| (*id, Vec::new())).collect();
        for (&id, deps) in &forward {
            for &dep in deps {
                dependents.get_mut(&dep).unwrap().push(id);
            }
        }

        let mut nodes = HashMap::with_capacity(catalog.len());
        let mut ready = BTreeSet::new();
        for resource in &catalog.resources {
            let unmet = forward[&resource.id].len();
            if unmet == 0 {
                ready.insert(resource.id);
            }
            nodes.insert(
                resource.id,
                Node {
                    resource: resource.clone(),
                    status: NodeStatus::Pending,
                    unmet,
                },
            );
        }

        let remaining = nodes.len();
        Ok(Self {
            nodes,
            dependents,
            ready,
            remaining,
        })
    }

    /// True iff every node has a terminal status.
    pub fn done(&self) -> bool {
        self.remaining == 0
    }

    /// All currently ready nodes, ascending by id — deterministic so that
    /// identical catalogs always execute in the same order.
    pub fn ready(&self) -> Vec<NodeHandle> {
        self.ready.iter().copied().map(NodeHandle).collect()
    }

    /// Borrow the resource a handle identifies.
    pub fn resource(&self, handle: NodeHandle) -> &Resource {
        &self.nodes[&handle.id()].resource
    }

    /// Comment-or-id identity, cheap to clone for error reporting.
    pub fn identity(&self, handle: NodeHandle) -> crate::errors::ResourceIdentity {
        let resource = self.resource(handle);
        crate::errors::ResourceIdentity {
            id: resource.id,
            comment: resource.comment.clone(),
        }
    }

    /// Mark `handle` done. Precondition: `handle` was returned by a prior
    /// `ready()` call and has not yet been marked.
    pub fn mark(&mut self, handle: NodeHandle) {
        let id = handle.id();
        let was_ready = self.ready.remove(&id);
        debug_assert!(was_ready, "mark() on a non-ready node");
        let node = self.nodes.get_mut(&id).expect("unknown node handle");
        node.status = NodeStatus::Done;
        self.remaining -= 1;

        let dependents = self.dependents.get(&id).cloned().unwrap_or_default();
        for dependent in dependents {
            let dep_node = self.nodes.get_mut(&dependent).expect("dangling edge");
            dep_node.unmet -= 1;
            if dep_node.unmet == 0 && dep_node.status == NodeStatus::Pending {
                self.ready.insert(dependent);
            }
        }
    }

    /// Mark `handle` failed and transitively skip every descendant reachable
    /// through dependency edges, returning the freshly-skipped handles in
    /// ascending-id order.
    pub fn mark_failure(&mut self, handle: NodeHandle) -> Vec<NodeHandle> {
        let id = handle.id();
        self.ready.remove(&id);
        let node = self.nodes.get_mut(&id).expect("unknown node handle");
        node.status = NodeStatus::Failed;
        self.remaining -= 1;

        let mut skipped = BTreeSet::new();
        let mut queue = self.dependents.get(&id).cloned().unwrap_or_default();
        while let Some(candidate) = queue.pop() {
            let candidate_node = self.nodes.get_mut(&candidate).expect("dangling edge");
            if candidate_node.status != NodeStatus::Pending {
                continue;
            }
            candidate_node.status = NodeStatus::Skipped;
            self.remaining -= 1;
            self.ready.remove(&candidate);
            skipped.insert(candidate);
            queue.extend(self.dependents.get(&candidate).cloned().unwrap_or_default());
        }

        skipped.into_iter().map(NodeHandle).collect()
    }
}
