use crate::model::Id;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One mutation instruction. The `target` is either a real identifier or a
/// placeholder token in the reserved `tmp-` namespace; payload values may
/// themselves contain placeholder tokens at arbitrary nesting depth until
/// the rewriter has run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Instruction {
    /// Insert a new container. A placeholder target is replaced by a
    /// generated id; a real-id target is honored as a client-chosen id.
    Create {
        target: Id,
        name: String,
        #[serde(default)]
        fields: HashMap<String, serde_json::Value>,
    },
    /// Attach `child` under `target`, optionally labelled. Re-attaching an
    /// existing child or self-linking is a no-op.
    AddChild {
        target: Id,
        child: Id,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<serde_json::Value>,
    },
    /// Merge named fields (and optionally the name) into the target.
    Modify {
        target: Id,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default)]
        fields: HashMap<String, serde_json::Value>,
    },
    /// Merge a relationship position payload onto the edge target -> other.
    Relate {
        target: Id,
        other: Id,
        #[serde(default)]
        position: serde_json::Map<String, serde_json::Value>,
    },
    /// Remove the target and its owned child edges.
    Delete { target: Id },
}

impl Instruction {
    pub fn action(&self) -> &'static str {
        match self {
            Instruction::Create { .. } => "create",
            Instruction::AddChild { .. } => "add-child",
            Instruction::Modify { .. } => "modify",
            Instruction::Relate { .. } => "relate",
            Instruction::Delete { .. } => "delete",
        }
    }

    pub fn target(&self) -> &Id {
        match self {
            Instruction::Create { target, .. }
            | Instruction::AddChild { target, .. }
            | Instruction::Modify { target, .. }
            | Instruction::Relate { target, .. }
            | Instruction::Delete { target } => target,
        }
    }
}

/// An ordered, request-scoped list of instructions. Never persisted, never
/// shared across requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub instructions: Vec<Instruction>,
}

/// What one applied instruction did, echoed back in the response summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructionOutcome {
    pub index: usize,
    pub action: String,
    /// The affected container id, with placeholders already resolved.
    pub target: Id,
}

/// Success payload for a processed batch: the per-instruction summary plus
/// the placeholder -> real id mapping established by this batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub result: Vec<InstructionOutcome>,
    #[serde(rename = "placeholderMapping")]
    pub placeholder_mapping: BTreeMap<String, Id>,
}
