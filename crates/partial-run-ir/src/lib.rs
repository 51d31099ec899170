//! Serde data model and JSON loading for compiled pipeline IR.
//!
//! A [`Pipeline`] is an ordered sequence of [`PipelineOrNode`] slots plus
//! graph-level settings and an optional [`DeploymentConfig`]. Fields this crate
//! does not interpret are kept in each type's `extra` map so a load/save cycle
//! does not lose them.
//!
//! # Example
//! ```
//! let json = r#"{
//!     "pipeline_info": {"id": "demo"},
//!     "execution_mode": "SYNC",
//!     "nodes": [
//!         {"pipeline_node": {"node_info": {"id": "a"}, "downstream_nodes": ["b"]}},
//!         {"pipeline_node": {"node_info": {"id": "b"}, "upstream_nodes": ["a"]}}
//!     ]
//! }"#;
//! let pipeline = partial_run_ir::parse(json).unwrap();
//! assert_eq!(pipeline.node_ids(), vec!["a", "b"]);
//! ```

pub mod ast;

use std::path::Path;

pub use ast::*;
use partial_run_types::Result;

/// Parse a pipeline from its JSON form.
pub fn parse(source: &str) -> Result<Pipeline> {
    let pipeline: Pipeline = serde_json::from_str(source)?;
    tracing::debug!(
        pipeline = %pipeline.pipeline_info.id,
        nodes = pipeline.nodes.len(),
        "parsed pipeline IR"
    );
    Ok(pipeline)
}

/// Read and parse a pipeline JSON file.
pub fn load(path: &Path) -> Result<Pipeline> {
    let source = std::fs::read_to_string(path)?;
    parse(&source)
}

/// Serialize a pipeline as pretty-printed JSON.
pub fn to_json_pretty(pipeline: &Pipeline) -> Result<String> {
    Ok(serde_json::to_string_pretty(pipeline)?)
}
