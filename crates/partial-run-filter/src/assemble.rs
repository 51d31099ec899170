use std::borrow::Cow;

use partial_run_ir::{DeploymentConfig, Pipeline, PipelineNode, PipelineOrNode};

/// Build the output pipeline from the repaired nodes.
///
/// Every graph-level field is copied from `input` except the node sequence
/// and the deployment config, which are replaced. `input` is never modified.
pub fn make_filtered_pipeline(
    input: &Pipeline,
    nodes: Vec<Cow<'_, PipelineNode>>,
    deployment_config: Option<DeploymentConfig>,
) -> Pipeline {
    Pipeline {
        pipeline_info: input.pipeline_info.clone(),
        execution_mode: input.execution_mode,
        nodes: nodes
            .into_iter()
            .map(|node| PipelineOrNode::PipelineNode(node.into_owned()))
            .collect(),
        runtime_spec: input.runtime_spec.clone(),
        deployment_config,
        extra: input.extra.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partial_run_ir::ExecutionMode;
    use serde_json::json;

    #[test]
    fn graph_level_fields_copied() {
        let mut input = Pipeline::new(
            "p",
            ExecutionMode::Sync,
            vec![PipelineNode::new("a", &[], &[]), PipelineNode::new("b", &[], &[])],
        );
        input.runtime_spec = Some(json!({"pipeline_run_id": "run-1"}));
        input.extra.insert("sdk_version".into(), json!("1.0"));
        input.deployment_config = Some(DeploymentConfig::default());

        let b = input.node("b").unwrap();
        let out = make_filtered_pipeline(&input, vec![Cow::Borrowed(b)], None);

        assert_eq!(out.pipeline_info.id, "p");
        assert_eq!(out.execution_mode, ExecutionMode::Sync);
        assert_eq!(out.runtime_spec, input.runtime_spec);
        assert_eq!(out.extra["sdk_version"], json!("1.0"));
        assert_eq!(out.node_ids(), vec!["b"]);
        assert!(out.deployment_config.is_none());
        assert_eq!(input.nodes.len(), 2);
    }

    #[test]
    fn owned_nodes_installed_as_given() {
        let input = Pipeline::new("p", ExecutionMode::Sync, vec![PipelineNode::new("a", &[], &["x"])]);
        let mut changed = input.node("a").unwrap().clone();
        changed.downstream_nodes.clear();
        let out = make_filtered_pipeline(&input, vec![Cow::Owned(changed)], Some(DeploymentConfig::default()));
        assert!(out.node("a").unwrap().downstream_nodes.is_empty());
        assert!(out.deployment_config.is_some());
        assert_eq!(input.node("a").unwrap().downstream_nodes, vec!["x"]);
    }
}
