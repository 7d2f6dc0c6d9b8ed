use crate::model::Id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A concept container: the domain entity being created and mutated by
/// batches. Fields are free-form (Description, Tags, Horizon, dates, ...),
/// children are ordered parent-owned edges, relations are labelled edges to
/// arbitrary other containers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub fields: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub children: Vec<ChildLink>,
    #[serde(default)]
    pub relations: Vec<RelationEdge>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parent-owned edge to a child container, optionally carrying a
/// relationship label (a bare string or a structured object).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildLink {
    pub child_id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<serde_json::Value>,
}

/// Labelled relationship edge to another container. The position payload is
/// an open object ({"label": ...} plus whatever the client attaches).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationEdge {
    pub target_id: Id,
    #[serde(default)]
    pub position: serde_json::Map<String, serde_json::Value>,
}

impl Container {
    pub fn new(id: Id, name: String, fields: HashMap<String, serde_json::Value>) -> Self {
        let now = Utc::now();
        Self {
            id,
            name,
            fields,
            children: Vec::new(),
            relations: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_child(&self, child_id: &str) -> bool {
        self.children.iter().any(|link| link.child_id == child_id)
    }

    /// Merge named fields into the container, replacing per key and
    /// preserving everything not mentioned in the update.
    pub fn merge_fields(
        &mut self,
        name: Option<String>,
        fields: HashMap<String, serde_json::Value>,
    ) {
        if let Some(name) = name {
            self.name = name;
        }
        for (key, value) in fields {
            self.fields.insert(key, value);
        }
        self.updated_at = Utc::now();
    }

    /// Merge a relation position payload over an existing edge to `target_id`,
    /// or append a new edge. Existing keys not present in the update survive.
    pub fn merge_relation(
        &mut self,
        target_id: Id,
        position: serde_json::Map<String, serde_json::Value>,
    ) {
        if let Some(edge) = self
            .relations
            .iter_mut()
            .find(|edge| edge.target_id == target_id)
        {
            for (key, value) in position {
                edge.position.insert(key, value);
            }
        } else {
            self.relations.push(RelationEdge {
                target_id,
                position,
            });
        }
        self.updated_at = Utc::now();
    }
}
