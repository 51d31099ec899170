//! Pipeline IR filtering for partial runs.
//!
//! Given a compiled pipeline and two node selectors, [`filter_pipeline`]
//! extracts the nodes lying between the `from` and `to` frontiers: those
//! reachable downstream of a `from` match AND upstream of a `to` match. The
//! result keeps the input's node order, drops references to removed nodes,
//! filters per-node deployment tables, and reports the input channels whose
//! producer was removed.
//!
//! Stages run strictly in order: [`validation`] -> [`index`] -> [`sweep`] ->
//! [`repair`] -> [`deployment`] -> [`assemble`].

pub mod assemble;
pub mod deployment;
pub mod index;
pub mod repair;
pub mod selector;
pub mod sweep;
pub mod validation;

pub use index::NodeIndex;
pub use repair::OrphanedChannels;
pub use selector::{NodePredicate, NodeSelector};
pub use validation::{diagnose, validate, Diagnostic, PreconditionRule};

use partial_run_ir::Pipeline;
use partial_run_types::Result;

/// Filter `input` down to the nodes between `from_nodes` and `to_nodes`.
///
/// Returns the filtered pipeline and, per removed producer id, the channels of
/// kept nodes that named it. `input` is left untouched.
///
/// # Errors
/// Fails without producing output if `input` is not SYNC, contains a
/// sub-pipeline, repeats a node id, or is not topologically sorted.
pub fn filter_pipeline(
    input: &Pipeline,
    from_nodes: &(impl NodePredicate + ?Sized),
    to_nodes: &(impl NodePredicate + ?Sized),
) -> Result<(Pipeline, OrphanedChannels)> {
    validation::validate(input)?;

    let index = NodeIndex::build(input);
    let kept = sweep::sweep(&index, from_nodes, to_nodes);
    let (nodes, orphans) = repair::fix_nodes(&kept);
    let deployment_config = deployment::fix_deployment_config(input, &kept);
    let filtered = assemble::make_filtered_pipeline(input, nodes, deployment_config);

    tracing::debug!(
        pipeline = %input.pipeline_info.id,
        total = index.len(),
        kept = kept.len(),
        "filtered pipeline"
    );
    if !orphans.is_empty() {
        tracing::warn!(
            pipeline = %input.pipeline_info.id,
            producers = ?orphans.keys().collect::<Vec<_>>(),
            channels = orphans.values().map(Vec::len).sum::<usize>(),
            "filtering left input channels without their producer"
        );
    }

    Ok((filtered, orphans))
}

/// [`filter_pipeline`] with [`NodeSelector`]s on both sides.
pub fn filter_pipeline_between(
    input: &Pipeline,
    from: &NodeSelector,
    to: &NodeSelector,
) -> Result<(Pipeline, OrphanedChannels)> {
    filter_pipeline(input, from, to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use partial_run_ir::{Channel, ExecutionMode, InputSpec, PipelineNode};
    use partial_run_types::PartialRunError;

    fn abc() -> Pipeline {
        Pipeline::new(
            "p",
            ExecutionMode::Sync,
            vec![
                PipelineNode::new("a", &[], &["b"]),
                PipelineNode::new("b", &["a"], &["c"]).with_input(
                    "in",
                    InputSpec::new(vec![Channel::from_producer("a", "out")]),
                ),
                PipelineNode::new("c", &["b"], &[]),
            ],
        )
    }

    #[test]
    fn defaults_return_identical_pipeline() {
        let input = abc();
        let all = NodeSelector::default();
        let (out, orphans) = filter_pipeline_between(&input, &all, &all).unwrap();
        assert_eq!(out, input);
        assert!(orphans.is_empty());
    }

    #[test]
    fn invalid_input_yields_no_output() {
        let mut input = abc();
        input.execution_mode = ExecutionMode::Async;
        let err = filter_pipeline(&input, &|_: &str| true, &|_: &str| true).unwrap_err();
        assert!(err.is_validation_error());
    }

    #[test]
    fn closures_and_selectors_mix() {
        let input = abc();
        let (out, orphans) =
            filter_pipeline(&input, &NodeSelector::ids(["b"]), &|_: &str| true).unwrap();
        assert_eq!(out.node_ids(), vec!["b", "c"]);
        assert_eq!(orphans["a"].len(), 1);
    }

    #[test]
    fn bad_selector_surfaces_before_filtering() {
        let err = NodeSelector::pattern("[").unwrap_err();
        assert!(matches!(err, PartialRunError::InvalidSelector { .. }));
    }
}
