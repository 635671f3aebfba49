use crate::core::io::lenient_json;
use crate::engine::error::CelloError;
use serde::Deserialize;
use std::path::Path;

/// A node of the technology-mapped netlist.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetlistNode {
    /// Verilog-derived label, e.g. `$48`, `a` or `y`.
    pub name: String,
    /// Cello's node type, e.g. `NOR`, `PRIMARY_INPUT`.
    #[serde(default)]
    pub node_type: Option<String>,
    /// Biological device assigned to the node, e.g. `PhlF` or `YFP_reporter`.
    #[serde(default)]
    pub device_name: Option<String>,
}

/// The `*_outputNetlist.json` document written after technology mapping.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OutputNetlist {
    #[serde(default)]
    pub name: Option<String>,
    pub nodes: Vec<NetlistNode>,
    #[serde(default)]
    pub edges: Vec<serde_json::Value>,
}

impl OutputNetlist {
    pub fn load(path: &Path) -> Result<Self, CelloError> {
        lenient_json::read_path(path)
    }

    pub fn node(&self, name: &str) -> Option<&NetlistNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn device_name(&self, name: &str) -> Option<&str> {
        self.node(name).and_then(|n| n.device_name.as_deref())
    }
}
