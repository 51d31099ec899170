//! Node repair: cut references to filtered-out nodes.
//!
//! A kept node may still name removed nodes in its `downstream_nodes` (simply
//! dropped) or its `upstream_nodes` (dropped, and the input channels fed by
//! them are reported so a caller can reconnect those inputs).

use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};

use partial_run_ir::{Channel, PipelineNode};

use crate::index::NodeIndex;

/// Removed producer id to the channels of kept nodes that named it.
///
/// Each list is in node-then-channel order.
pub type OrphanedChannels = BTreeMap<String, Vec<Channel>>;

/// Drop `downstream_nodes` entries that were filtered out.
///
/// Returns the input unchanged (borrowed) when nothing was removed.
pub fn remove_dangling_downstream_nodes<'a>(
    mut node: Cow<'a, PipelineNode>,
    kept: &NodeIndex<'_>,
) -> Cow<'a, PipelineNode> {
    if node.downstream_nodes.iter().all(|id| kept.contains(id)) {
        return node;
    }
    node.to_mut().downstream_nodes.retain(|id| kept.contains(id));
    node
}

/// Drop `upstream_nodes` entries that were filtered out and collect the
/// channels that depended on them.
pub fn handle_missing_inputs<'a>(
    mut node: Cow<'a, PipelineNode>,
    kept: &NodeIndex<'_>,
) -> (Cow<'a, PipelineNode>, OrphanedChannels) {
    if node.upstream_nodes.iter().all(|id| kept.contains(id)) {
        return (node, OrphanedChannels::new());
    }

    let mut orphans = OrphanedChannels::new();
    {
        let removed: HashSet<&str> = node
            .upstream_nodes
            .iter()
            .map(String::as_str)
            .filter(|id| !kept.contains(id))
            .collect();
        for channel in node.channels().filter(|c| removed.contains(c.producer_id())) {
            orphans
                .entry(channel.producer_id().to_string())
                .or_default()
                .push(channel.clone());
        }
    }

    node.to_mut().upstream_nodes.retain(|id| kept.contains(id));
    (node, orphans)
}

/// Repair every kept node, in order, and merge the orphaned channels.
pub fn fix_nodes<'a>(kept: &NodeIndex<'a>) -> (Vec<Cow<'a, PipelineNode>>, OrphanedChannels) {
    let mut fixed = Vec::with_capacity(kept.len());
    let mut merged = OrphanedChannels::new();
    for node in kept.nodes() {
        let node = remove_dangling_downstream_nodes(Cow::Borrowed(node), kept);
        let (node, orphans) = handle_missing_inputs(node, kept);
        for (producer, channels) in orphans {
            merged.entry(producer).or_default().extend(channels);
        }
        if let Cow::Owned(ref n) = node {
            tracing::debug!(node = %n.id(), "rewrote node references");
        }
        fixed.push(node);
    }
    (fixed, merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use partial_run_ir::{ExecutionMode, InputSpec, Pipeline};

    fn pipeline() -> Pipeline {
        Pipeline::new(
            "p",
            ExecutionMode::Sync,
            vec![
                PipelineNode::new("a", &[], &["b", "c"]),
                PipelineNode::new("b", &["a"], &["c"]).with_input(
                    "examples",
                    InputSpec::new(vec![Channel::from_producer("a", "examples")]),
                ),
                PipelineNode::new("c", &["a", "b"], &[])
                    .with_input(
                        "examples",
                        InputSpec::new(vec![Channel::from_producer("a", "examples")]),
                    )
                    .with_input(
                        "model",
                        InputSpec::new(vec![
                            Channel::from_producer("b", "model"),
                            Channel::from_producer("a", "schema"),
                        ]),
                    ),
            ],
        )
    }

    #[test]
    fn untouched_node_is_borrowed() {
        let p = pipeline();
        let index = NodeIndex::build(&p);
        let node = remove_dangling_downstream_nodes(Cow::Borrowed(index.get("a").unwrap()), &index);
        assert!(matches!(node, Cow::Borrowed(_)));
        let (node, orphans) = handle_missing_inputs(node, &index);
        assert!(matches!(node, Cow::Borrowed(_)));
        assert!(orphans.is_empty());
    }

    #[test]
    fn dangling_downstream_removed_in_order() {
        let p = pipeline();
        let index = NodeIndex::build(&p);
        let kept = index.retain(|id| id != "b");
        let node = remove_dangling_downstream_nodes(Cow::Borrowed(index.get("a").unwrap()), &kept);
        assert!(matches!(node, Cow::Owned(_)));
        assert_eq!(node.downstream_nodes, vec!["c"]);
        // the input is left as it was
        assert_eq!(p.node("a").unwrap().downstream_nodes, vec!["b", "c"]);
    }

    #[test]
    fn missing_inputs_reported_by_producer() {
        let p = pipeline();
        let index = NodeIndex::build(&p);
        let kept = index.retain(|id| id != "a");
        let (node, orphans) = handle_missing_inputs(Cow::Borrowed(index.get("c").unwrap()), &kept);
        assert_eq!(node.upstream_nodes, vec!["b"]);
        assert_eq!(orphans.len(), 1);
        let keys: Vec<_> = orphans["a"].iter().map(|c| c.output_key.as_deref().unwrap()).collect();
        // input-name order, then channel order
        assert_eq!(keys, vec!["examples", "schema"]);
    }

    #[test]
    fn channels_from_kept_producers_not_reported() {
        let p = pipeline();
        let index = NodeIndex::build(&p);
        let kept = index.retain(|id| id != "a");
        let (_, orphans) = handle_missing_inputs(Cow::Borrowed(index.get("c").unwrap()), &kept);
        assert!(!orphans.contains_key("b"));
    }

    #[test]
    fn fix_nodes_merges_across_consumers() {
        let p = pipeline();
        let index = NodeIndex::build(&p);
        let kept = index.retain(|id| id != "a");
        let (fixed, orphans) = fix_nodes(&kept);

        let ids: Vec<_> = fixed.iter().map(|n| n.id()).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert!(fixed[0].upstream_nodes.is_empty());

        let from_a: Vec<_> = orphans["a"].iter().map(|c| c.output_key.as_deref().unwrap()).collect();
        // b's channel first, then c's channels
        assert_eq!(from_a, vec!["examples", "examples", "schema"]);
    }

    #[test]
    fn fix_nodes_identity_borrows_everything() {
        let p = pipeline();
        let index = NodeIndex::build(&p);
        let (fixed, orphans) = fix_nodes(&index);
        assert!(fixed.iter().all(|n| matches!(n, Cow::Borrowed(_))));
        assert!(orphans.is_empty());
    }

    #[test]
    fn removed_upstream_without_channels_still_cut() {
        let p = Pipeline::new(
            "p",
            ExecutionMode::Sync,
            vec![
                PipelineNode::new("a", &[], &["b"]),
                PipelineNode::new("b", &["a"], &[]),
            ],
        );
        let index = NodeIndex::build(&p);
        let kept = index.retain(|id| id == "b");
        let (fixed, orphans) = fix_nodes(&kept);
        assert!(fixed[0].upstream_nodes.is_empty());
        assert!(orphans.is_empty());
    }
}
