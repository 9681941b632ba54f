use std::collections::HashMap;

use crate::catalog::Catalog;
use crate::errors::ConstructionError;

/// Three-color DFS cycle check: white nodes are unvisited, gray nodes are on
/// the current recursion stack, black nodes are fully explored. A back-edge
/// into a gray node is a cycle; the path from that node to the current one,
/// inclusive, is the witness.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

pub(super) fn detect_cycle(forward: &HashMap<u64, Vec<u64>>) -> Option<Vec<u64>> {
    let mut color: HashMap<u64, Color> = forward.keys().map(|id| (*id, Color::White)).collect();
    let mut stack: Vec<u64> = Vec::new();

    let mut ids: Vec<u64> = forward.keys().copied().collect();
    ids.sort_unstable();

    for start in ids {
        if color[&start] == Color::White {
            if let Some(cycle) = visit(start, forward, &mut color, &mut stack) {
                return Some(cycle);
            }
        }
    }
    None
}

fn visit(
    node: u64,
    forward: &HashMap<u64, Vec<u64>>,
    color: &mut HashMap<u64, Color>,
    stack: &mut Vec<u64>,
) -> Option<Vec<u64>> {
    color.insert(node, Color::Gray);
    stack.push(node);

    if let Some(deps) = forward.get(&node) {
        for &dep in deps {
            match color.get(&dep).copied() {
                Some(Color::White) => {
                    if let Some(cycle) = visit(dep, forward, color, stack) {
                        return Some(cycle);
                    }
                }
                Some(Color::Gray) => {
                    let start = stack.iter().position(|&n| n == dep).unwrap();
                    let mut cycle = stack[start..].to_vec();
                    cycle.push(dep);
                    return Some(cycle);
                }
                _ => {}
            }
        }
    }

    stack.pop();
    color.insert(node, Color::Black);
    None
}

/// Validate a catalog's structural invariants and return the forward
/// adjacency map (resource id -> dependency ids) on success.
///
/// Checks run in order: index and reject duplicate/zero ids first, then
/// resolve dependencies, then check for cycles.
pub(super) fn validate(catalog: &Catalog) -> Result<HashMap<u64, Vec<u64>>, ConstructionError> {
    let mut forward: HashMap<u64, Vec<u64>> = HashMap::with_capacity(catalog.len());

    for resource in &catalog.resources {
        if resource.id == 0 {
            return Err(ConstructionError::ZeroId);
        }
        if forward.contains_key(&resource.id) {
            return Err(ConstructionError::DuplicateId(resource.id));
        }
        forward.insert(resource.id, resource.unique_dependencies());
    }

    for resource in &catalog.resources {
        for &dep in &forward[&resource.id] {
            if !forward.contains_key(&dep) {
                return Err(ConstructionError::MissingDependency {
                    from: resource.id,
                    to: dep,
                });
            }
        }
    }

    if let Some(cycle) = detect_cycle(&forward) {
        return Err(ConstructionError::Cycle(cycle));
    }

    Ok(forward)
}
