use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A compiled pipeline: an ordered node sequence plus graph-level settings.
///
/// The order of `nodes` is the authoritative topological order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    #[serde(default)]
    pub pipeline_info: PipelineInfo,
    #[serde(default)]
    pub execution_mode: ExecutionMode,
    #[serde(default)]
    pub nodes: Vec<PipelineOrNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_spec: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_config: Option<DeploymentConfig>,
    /// Graph-level fields not interpreted here; carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineInfo {
    #[serde(default)]
    pub id: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionMode {
    #[default]
    #[serde(rename = "EXECUTION_MODE_UNSPECIFIED")]
    Unspecified,
    Sync,
    Async,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Unspecified => "EXECUTION_MODE_UNSPECIFIED",
            ExecutionMode::Sync => "SYNC",
            ExecutionMode::Async => "ASYNC",
        }
    }
}

/// One slot of the node sequence: either a plain node or a nested pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineOrNode {
    PipelineNode(PipelineNode),
    SubPipeline(Box<Pipeline>),
}

impl PipelineOrNode {
    pub fn as_node(&self) -> Option<&PipelineNode> {
        match self {
            PipelineOrNode::PipelineNode(node) => Some(node),
            PipelineOrNode::SubPipeline(_) => None,
        }
    }
}

impl From<PipelineNode> for PipelineOrNode {
    fn from(node: PipelineNode) -> Self {
        PipelineOrNode::PipelineNode(node)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineNode {
    pub node_info: NodeInfo,
    #[serde(default, skip_serializing_if = "NodeInputs::is_empty")]
    pub inputs: NodeInputs,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub upstream_nodes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub downstream_nodes: Vec<String>,
    /// Outputs, executor bindings and other node fields carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub id: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<Value>,
}

/// Input name to input spec. Keyed by name so iteration order is stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeInputs {
    #[serde(default)]
    pub inputs: BTreeMap<String, InputSpec>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NodeInputs {
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty() && self.extra.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSpec {
    #[serde(default)]
    pub channels: Vec<Channel>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A data dependency on an output of another node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub producer_node_query: ProducerNodeQuery,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_key: Option<String>,
    /// Context and artifact queries, opaque to this crate.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Channel {
    /// Id of the node that produces the data this channel carries.
    pub fn producer_id(&self) -> &str {
        &self.producer_node_query.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerNodeQuery {
    pub id: String,
}

/// Per-node deployment metadata, each table keyed by node id.
///
/// None of the tables reference other nodes, so they can be filtered by key
/// alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub executor_specs: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub custom_driver_specs: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub node_level_platform_configs: Map<String, Value>,
    /// Pipeline-wide settings such as the metadata connection.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// --- Constructors and accessors ---

impl Pipeline {
    /// Create a pipeline with the given id, mode and plain nodes.
    pub fn new(id: impl Into<String>, execution_mode: ExecutionMode, nodes: Vec<PipelineNode>) -> Self {
        Self {
            pipeline_info: PipelineInfo { id: id.into() },
            execution_mode,
            nodes: nodes.into_iter().map(PipelineOrNode::from).collect(),
            runtime_spec: None,
            deployment_config: None,
            extra: Map::new(),
        }
    }

    /// Iterate over the plain nodes of the sequence, skipping sub-pipelines.
    pub fn pipeline_nodes(&self) -> impl Iterator<Item = &PipelineNode> {
        self.nodes.iter().filter_map(PipelineOrNode::as_node)
    }

    pub fn node(&self, id: &str) -> Option<&PipelineNode> {
        self.pipeline_nodes().find(|n| n.id() == id)
    }

    pub fn node_ids(&self) -> Vec<&str> {
        self.pipeline_nodes().map(PipelineNode::id).collect()
    }
}

impl PipelineNode {
    pub fn new(id: impl Into<String>, upstream: &[&str], downstream: &[&str]) -> Self {
        Self {
            node_info: NodeInfo {
                id: id.into(),
                node_type: None,
            },
            inputs: NodeInputs::default(),
            upstream_nodes: upstream.iter().map(|s| s.to_string()).collect(),
            downstream_nodes: downstream.iter().map(|s| s.to_string()).collect(),
            extra: Map::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.node_info.id
    }

    /// Add (or replace) a named input.
    pub fn with_input(mut self, name: impl Into<String>, spec: InputSpec) -> Self {
        self.inputs.inputs.insert(name.into(), spec);
        self
    }

    /// All channels across all inputs, in input-name order.
    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.inputs.inputs.values().flat_map(|spec| spec.channels.iter())
    }
}

impl InputSpec {
    pub fn new(channels: Vec<Channel>) -> Self {
        Self {
            channels,
            extra: Map::new(),
        }
    }
}

impl Channel {
    pub fn from_producer(producer_id: impl Into<String>, output_key: impl Into<String>) -> Self {
        Self {
            producer_node_query: ProducerNodeQuery {
                id: producer_id.into(),
            },
            output_key: Some(output_key.into()),
            extra: Map::new(),
        }
    }
}
