use partial_run_ir::{DeploymentConfig, Pipeline};
use serde_json::{Map, Value};

use crate::index::NodeIndex;

/// Restrict the per-node deployment tables to the kept nodes.
///
/// Returns `None` when the pipeline carries no deployment config. Pipeline-wide
/// settings in the config are copied as-is.
pub fn fix_deployment_config(pipeline: &Pipeline, kept: &NodeIndex<'_>) -> Option<DeploymentConfig> {
    let config = pipeline.deployment_config.as_ref()?;
    let fixed = DeploymentConfig {
        executor_specs: fix_per_node_config(&config.executor_specs, kept),
        custom_driver_specs: fix_per_node_config(&config.custom_driver_specs, kept),
        node_level_platform_configs: fix_per_node_config(&config.node_level_platform_configs, kept),
        extra: config.extra.clone(),
    };
    tracing::debug!(
        executor_specs = fixed.executor_specs.len(),
        custom_driver_specs = fixed.custom_driver_specs.len(),
        node_level_platform_configs = fixed.node_level_platform_configs.len(),
        "filtered deployment config"
    );
    Some(fixed)
}

fn fix_per_node_config(config_map: &Map<String, Value>, kept: &NodeIndex<'_>) -> Map<String, Value> {
    config_map
        .iter()
        .filter(|(node_id, _)| kept.contains(node_id))
        .map(|(node_id, spec)| (node_id.clone(), spec.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use partial_run_ir::{ExecutionMode, PipelineNode};
    use serde_json::json;

    fn pipeline_with_config() -> Pipeline {
        let mut p = Pipeline::new(
            "p",
            ExecutionMode::Sync,
            vec![
                PipelineNode::new("c", &[], &["a"]),
                PipelineNode::new("a", &["c"], &["b"]),
                PipelineNode::new("b", &["a"], &[]),
            ],
        );
        let config = json!({
            "executor_specs": {"c": {"image": "c"}, "a": {"image": "a"}, "b": {"image": "b"}},
            "custom_driver_specs": {"b": {"driver": "b"}},
            "node_level_platform_configs": {"a": {"cpu": 2}, "c": {"cpu": 1}},
            "metadata_connection_config": {"sqlite": {"filename_uri": "mlmd.db"}}
        });
        p.deployment_config = Some(serde_json::from_value(config).unwrap());
        p
    }

    #[test]
    fn absent_config_stays_absent() {
        let p = Pipeline::new("p", ExecutionMode::Sync, vec![PipelineNode::new("a", &[], &[])]);
        let index = NodeIndex::build(&p);
        assert!(fix_deployment_config(&p, &index).is_none());
    }

    #[test]
    fn tables_filtered_independently() {
        let p = pipeline_with_config();
        let index = NodeIndex::build(&p);
        let kept = index.retain(|id| id != "b");
        let fixed = fix_deployment_config(&p, &kept).unwrap();

        let keys = |m: &Map<String, Value>| m.keys().cloned().collect::<Vec<_>>();
        assert_eq!(keys(&fixed.executor_specs), vec!["c", "a"]);
        assert!(fixed.custom_driver_specs.is_empty());
        assert_eq!(keys(&fixed.node_level_platform_configs), vec!["a", "c"]);
        assert_eq!(fixed.executor_specs["a"], json!({"image": "a"}));
    }

    #[test]
    fn pipeline_wide_settings_preserved() {
        let p = pipeline_with_config();
        let index = NodeIndex::build(&p);
        let kept = index.retain(|_| false);
        let fixed = fix_deployment_config(&p, &kept).unwrap();
        assert!(fixed.executor_specs.is_empty());
        assert!(fixed.node_level_platform_configs.is_empty());
        assert!(fixed.extra.contains_key("metadata_connection_config"));
    }

    #[test]
    fn input_config_untouched() {
        let p = pipeline_with_config();
        let index = NodeIndex::build(&p);
        let kept = index.retain(|id| id == "a");
        let _ = fix_deployment_config(&p, &kept);
        assert_eq!(p.deployment_config.as_ref().unwrap().executor_specs.len(), 3);
    }
}
