use thiserror::Error;

/// Failures that can occur while building a [`crate::graph::DependencyGraph`]
/// from a decoded [`crate::catalog::Catalog`].
///
/// These are distinct from per-resource execution errors: a construction
/// failure means the catalog itself is malformed and no resource was ever
/// dispatched to the `System`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstructionError {
    /// Two resources in the catalog share the same non-zero ID.
    #[error("duplicate resource id: {0}")]
    DuplicateId(u64),

    /// A resource's `dependencies` list names an ID absent from the catalog.
    #[error("resource {from} depends on {to}, which does not exist")]
    MissingDependency { from: u64, to: u64 },

    /// The dependency graph contains a cycle; `ids` names at least one
    /// participating resource, in the order the cycle was discovered.
    #[error("dependency cycle detected: {}", format_cycle(.0))]
    Cycle(Vec<u64>),

    /// A resource declared an ID of zero, which is reserved.
    #[error("resource id 0 is reserved and may not be used")]
    ZeroId,
}

fn format_cycle(ids: &[u64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
