//! Precondition checks on an input pipeline.
//!
//! Filtering only makes sense on a flat, SYNC, topologically sorted pipeline
//! with unique node ids. Each condition is a [`PreconditionRule`]. Call
//! [`validate`] to fail on the first violation, or [`diagnose`] to collect
//! every violation for reporting.

use std::collections::HashSet;

use partial_run_ir::{ExecutionMode, Pipeline, PipelineOrNode};
use partial_run_types::{Direction, PartialRunError, Result};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Diagnostic types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub rule: String,
    pub message: String,
    pub node_id: Option<String>,
}

// ---------------------------------------------------------------------------
// PreconditionRule trait
// ---------------------------------------------------------------------------

pub trait PreconditionRule: Send + Sync {
    fn name(&self) -> &str;
    /// Every violation of this rule, in sequence order.
    fn check(&self, pipeline: &Pipeline) -> Vec<PartialRunError>;
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

struct SyncModeRule;
impl PreconditionRule for SyncModeRule {
    fn name(&self) -> &str { "sync_mode" }
    fn check(&self, pipeline: &Pipeline) -> Vec<PartialRunError> {
        if pipeline.execution_mode == ExecutionMode::Sync {
            vec![]
        } else {
            vec![PartialRunError::UnsupportedExecutionMode {
                mode: pipeline.execution_mode.as_str().to_string(),
            }]
        }
    }
}

struct NoSubPipelineRule;
impl PreconditionRule for NoSubPipelineRule {
    fn name(&self) -> &str { "no_sub_pipeline" }
    fn check(&self, pipeline: &Pipeline) -> Vec<PartialRunError> {
        pipeline
            .nodes
            .iter()
            .filter_map(|slot| match slot {
                PipelineOrNode::SubPipeline(inner) => Some(PartialRunError::SubPipelineNotSupported {
                    pipeline_id: inner.pipeline_info.id.clone(),
                }),
                PipelineOrNode::PipelineNode(_) => None,
            })
            .collect()
    }
}

struct UniqueNodeIdRule;
impl PreconditionRule for UniqueNodeIdRule {
    fn name(&self) -> &str { "unique_node_ids" }
    fn check(&self, pipeline: &Pipeline) -> Vec<PartialRunError> {
        let mut seen = HashSet::new();
        pipeline
            .pipeline_nodes()
            .filter(|n| !seen.insert(n.id()))
            .map(|n| PartialRunError::DuplicateNodeId {
                node: n.id().to_string(),
            })
            .collect()
    }
}

/// Walking forward, every upstream id must already have been seen.
struct UpstreamOrderRule;
impl PreconditionRule for UpstreamOrderRule {
    fn name(&self) -> &str { "upstream_order" }
    fn check(&self, pipeline: &Pipeline) -> Vec<PartialRunError> {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut errors = Vec::new();
        for node in pipeline.pipeline_nodes() {
            for upstream in &node.upstream_nodes {
                if !visited.contains(upstream.as_str()) {
                    errors.push(PartialRunError::NotTopologicallySorted {
                        node: node.id().to_string(),
                        neighbor: upstream.clone(),
                        direction: Direction::Upstream,
                    });
                }
            }
            visited.insert(node.id());
        }
        errors
    }
}

/// Walking backward, every downstream id must already have been seen.
struct DownstreamOrderRule;
impl PreconditionRule for DownstreamOrderRule {
    fn name(&self) -> &str { "downstream_order" }
    fn check(&self, pipeline: &Pipeline) -> Vec<PartialRunError> {
        let nodes: Vec<_> = pipeline.pipeline_nodes().collect();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut errors = Vec::new();
        for node in nodes.iter().rev() {
            for downstream in &node.downstream_nodes {
                if !visited.contains(downstream.as_str()) {
                    errors.push(PartialRunError::NotTopologicallySorted {
                        node: node.id().to_string(),
                        neighbor: downstream.clone(),
                        direction: Direction::Downstream,
                    });
                }
            }
            visited.insert(node.id());
        }
        errors
    }
}

fn default_rules() -> Vec<Box<dyn PreconditionRule>> {
    vec![
        Box::new(SyncModeRule),
        Box::new(NoSubPipelineRule),
        Box::new(UniqueNodeIdRule),
        Box::new(UpstreamOrderRule),
        Box::new(DownstreamOrderRule),
    ]
}

fn node_of(error: &PartialRunError) -> Option<String> {
    match error {
        PartialRunError::NotTopologicallySorted { node, .. }
        | PartialRunError::DuplicateNodeId { node } => Some(node.clone()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Check every precondition; return the first violation found.
///
/// Rules run in a fixed order: execution mode, sub-pipelines, id uniqueness,
/// upstream order, downstream order.
pub fn validate(pipeline: &Pipeline) -> Result<()> {
    for rule in default_rules() {
        if let Some(err) = rule.check(pipeline).into_iter().next() {
            tracing::debug!(rule = rule.name(), error = %err, "pipeline precondition failed");
            return Err(err);
        }
    }
    Ok(())
}

/// Run every rule and collect all violations as diagnostics.
pub fn diagnose(pipeline: &Pipeline) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for rule in default_rules() {
        diagnostics.extend(rule.check(pipeline).into_iter().map(|err| Diagnostic {
            rule: rule.name().into(),
            node_id: node_of(&err),
            message: err.to_string(),
        }));
    }
    diagnostics
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
