//! Node selection predicates for the start and end frontiers.

use std::collections::HashSet;

use partial_run_types::{PartialRunError, Result};
use regex::Regex;

/// Decides whether a node id belongs to a frontier.
pub trait NodePredicate {
    fn matches(&self, node_id: &str) -> bool;
}

impl<F> NodePredicate for F
where
    F: Fn(&str) -> bool,
{
    fn matches(&self, node_id: &str) -> bool {
        self(node_id)
    }
}

/// A reusable, inspectable node predicate.
#[derive(Debug, Clone, Default)]
pub enum NodeSelector {
    /// Every node. The default for both frontiers.
    #[default]
    All,
    /// Exactly these ids.
    Ids(HashSet<String>),
    /// Ids fully matching a regular expression.
    Pattern(Regex),
    /// Ids matched by any of the inner selectors.
    AnyOf(Vec<NodeSelector>),
}

impl NodeSelector {
    pub fn ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        NodeSelector::Ids(ids.into_iter().map(Into::into).collect())
    }

    /// Compile `pattern` anchored at both ends, so `trainer` does not select
    /// `trainer_2`.
    pub fn pattern(pattern: &str) -> Result<Self> {
        let anchored = format!("^(?:{pattern})$");
        Regex::new(&anchored)
            .map(NodeSelector::Pattern)
            .map_err(|e| PartialRunError::InvalidSelector {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })
    }

    /// Combine selectors with OR. An empty list yields [`NodeSelector::All`].
    pub fn any_of(mut selectors: Vec<NodeSelector>) -> Self {
        match selectors.len() {
            0 => NodeSelector::All,
            1 => selectors.remove(0),
            _ => NodeSelector::AnyOf(selectors),
        }
    }
}

impl NodePredicate for NodeSelector {
    fn matches(&self, node_id: &str) -> bool {
        match self {
            NodeSelector::All => true,
            NodeSelector::Ids(ids) => ids.contains(node_id),
            NodeSelector::Pattern(re) => re.is_match(node_id),
            NodeSelector::AnyOf(inner) => inner.iter().any(|s| s.matches(node_id)),
        }
    }
}
