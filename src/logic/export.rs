use itertools::Itertools;

use crate::model::ContainerGraph;

const DEFAULT_DEPTH_LIMIT: usize = 2;

/// Accumulates Mermaid flowchart elements. Node declarations and edges are
/// kept in insertion order; duplicates are dropped at render time.
pub struct MermaidExporter {
    diagram_type: String,
    elements: Vec<String>,
}

impl MermaidExporter {
    pub fn new() -> Self {
        Self {
            diagram_type: "graph TD".to_string(),
            elements: Vec::new(),
        }
    }

    pub fn add_node(&mut self, node_id: &str, description: &str) {
        self.elements
            .push(format!("{}[\"{}\"]", node_id, description.replace('"', "'")));
    }

    pub fn add_edge(&mut self, from_node: &str, to_node: &str, label: Option<&str>) {
        match label {
            Some(label) => self
                .elements
                .push(format!("{} --> |{}| {}", from_node, label, to_node)),
            None => self.elements.push(format!("{} --> {}", from_node, to_node)),
        }
    }

    pub fn to_mermaid(&self) -> String {
        let mut mermaid = format!("{}\n", self.diagram_type);
        for element in self.elements.iter().unique() {
            mermaid.push_str(&format!("  {}\n", element));
        }
        mermaid
    }
}

impl Default for MermaidExporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Render the subgraph under one container as Mermaid flowchart text,
/// following child links down to `depth_limit` levels.
pub fn export_mermaid(graph: &ContainerGraph, root_id: &str, depth_limit: Option<usize>) -> String {
    let depth_limit = depth_limit.unwrap_or(DEFAULT_DEPTH_LIMIT);
    let mut exporter = MermaidExporter::new();

    if let Some(root) = graph.get(root_id) {
        exporter.add_node(&root.id, &root.name);
        add_subtree(graph, root_id, &mut exporter, 0, depth_limit);
    }

    exporter.to_mermaid()
}

fn add_subtree(
    graph: &ContainerGraph,
    container_id: &str,
    exporter: &mut MermaidExporter,
    current_depth: usize,
    depth_limit: usize,
) {
    if current_depth > depth_limit {
        return;
    }
    let Some(container) = graph.get(container_id) else {
        return;
    };

    for link in &container.children {
        let Some(child) = graph.get(&link.child_id) else {
            continue;
        };
        exporter.add_node(&child.id, &child.name);
        exporter.add_edge(container_id, &child.id, edge_label(link.label.as_ref()).as_deref());
        add_subtree(graph, &child.id, exporter, current_depth + 1, depth_limit);
    }
}

/// A label may be a bare string or an object carrying `description`/`label`.
fn edge_label(label: Option<&serde_json::Value>) -> Option<String> {
    match label? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Object(map) => map
            .get("description")
            .or_else(|| map.get("label"))
            .and_then(|value| value.as_str())
            .map(|s| s.to_string()),
        _ => None,
    }
}
