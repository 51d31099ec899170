//! Reachability sweep: which nodes lie between the start and end frontiers.

use std::collections::HashSet;

use partial_run_types::Direction;

use crate::index::NodeIndex;
use crate::selector::NodePredicate;

/// Every node reachable from `start_ids` following `direction`, the start
/// nodes included.
///
/// Depth-first with an explicit stack. Neighbors are pushed unconditionally
/// and deduplicated when popped, so a node enters the result at most once.
/// Ids unknown to the index are recorded but not expanded.
pub fn traverse<'a>(
    index: &NodeIndex<'a>,
    direction: Direction,
    start_ids: impl IntoIterator<Item = &'a str>,
) -> HashSet<&'a str> {
    let mut result = HashSet::new();
    let mut stack: Vec<&'a str> = Vec::new();
    for start in start_ids {
        stack.push(start);
        while let Some(current) = stack.pop() {
            if !result.insert(current) {
                continue;
            }
            let Some(node) = index.get(current) else {
                continue;
            };
            let neighbors = match direction {
                Direction::Upstream => &node.upstream_nodes,
                Direction::Downstream => &node.downstream_nodes,
            };
            stack.extend(neighbors.iter().map(String::as_str));
        }
    }
    result
}

/// Nodes downstream of a `from_nodes` match AND upstream of a `to_nodes`
/// match, in sequence order.
pub fn sweep<'a>(
    index: &NodeIndex<'a>,
    from_nodes: &(impl NodePredicate + ?Sized),
    to_nodes: &(impl NodePredicate + ?Sized),
) -> NodeIndex<'a> {
    let from_ids: Vec<&'a str> = index.ids().filter(|id| from_nodes.matches(id)).collect();
    let to_ids: Vec<&'a str> = index.ids().filter(|id| to_nodes.matches(id)).collect();

    let descendants = traverse(index, Direction::Downstream, from_ids.iter().copied());
    let ancestors = traverse(index, Direction::Upstream, to_ids.iter().copied());
    tracing::debug!(
        from = from_ids.len(),
        to = to_ids.len(),
        descendants = descendants.len(),
        ancestors = ancestors.len(),
        "reachability sweep"
    );

    index.retain(|id| descendants.contains(id) && ancestors.contains(id))
}
