use std::collections::HashMap;

use partial_run_ir::{Pipeline, PipelineNode};

/// Order-preserving lookup from node id to node.
///
/// Borrows from the pipeline it was built from. `order` keeps the sequence
/// order so later stages can rebuild output in that same order.
#[derive(Debug, Clone, Default)]
pub struct NodeIndex<'a> {
    order: Vec<&'a str>,
    nodes: HashMap<&'a str, &'a PipelineNode>,
}

impl<'a> NodeIndex<'a> {
    /// Index the plain nodes of an already validated pipeline.
    pub fn build(pipeline: &'a Pipeline) -> Self {
        pipeline.pipeline_nodes().collect()
    }

    pub fn get(&self, id: &str) -> Option<&'a PipelineNode> {
        self.nodes.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Node ids in sequence order.
    pub fn ids(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.order.iter().copied()
    }

    /// Nodes in sequence order.
    pub fn nodes(&self) -> impl Iterator<Item = &'a PipelineNode> + '_ {
        self.order.iter().map(move |id| self.nodes[id])
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Keep only the nodes for which `keep` returns true, preserving order.
    pub fn retain(&self, mut keep: impl FnMut(&str) -> bool) -> NodeIndex<'a> {
        self.nodes().filter(|n| keep(n.id())).collect()
    }
}

impl<'a> FromIterator<&'a PipelineNode> for NodeIndex<'a> {
    fn from_iter<I: IntoIterator<Item = &'a PipelineNode>>(iter: I) -> Self {
        let mut index = NodeIndex::default();
        for node in iter {
            let id = node.id();
            if index.nodes.insert(id, node).is_none() {
                index.order.push(id);
            }
        }
        index
    }
}
