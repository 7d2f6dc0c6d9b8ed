use serde::{Deserialize, Serialize};

use crate::logic::batch::BatchErrorKind;
use crate::model::{ChildLink, Container, ContainerGraph, Instruction};

/// What to do with relationship edges that point at a container being
/// deleted: silently prune them, or reject the deletion while anything
/// still refers to the target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DanglingEdgePolicy {
    #[default]
    Prune,
    Reject,
}

/// Applies rewritten instructions to the working model, one at a time, in
/// batch order. By the time an instruction reaches the executor every
/// reference is a real identifier; all placeholder handling lives in the
/// registry and rewriter.
pub struct Executor {
    policy: DanglingEdgePolicy,
}

impl Executor {
    pub fn new(policy: DanglingEdgePolicy) -> Self {
        Self { policy }
    }

    pub fn apply(
        &self,
        instruction: &Instruction,
        graph: &mut ContainerGraph,
    ) -> Result<(), BatchErrorKind> {
        match instruction {
            Instruction::Create {
                target,
                name,
                fields,
            } => {
                if graph.contains(target) {
                    return Err(BatchErrorKind::DuplicateEntity(target.clone()));
                }
                graph.insert(Container::new(target.clone(), name.clone(), fields.clone()));
                Ok(())
            }

            Instruction::AddChild {
                target,
                child,
                label,
            } => {
                if !graph.contains(child) {
                    return Err(BatchErrorKind::UnknownEntity(child.clone()));
                }
                let Some(parent) = graph.get_mut(target) else {
                    return Err(BatchErrorKind::UnknownEntity(target.clone()));
                };
                // Self-links and re-attachment are no-ops, matching the
                // behavior the UI relies on when children are re-sent.
                if child != target && !parent.has_child(child) {
                    parent.children.push(ChildLink {
                        child_id: child.clone(),
                        label: label.clone(),
                    });
                    parent.updated_at = chrono::Utc::now();
                }
                Ok(())
            }

            Instruction::Modify {
                target,
                name,
                fields,
            } => {
                let Some(container) = graph.get_mut(target) else {
                    return Err(BatchErrorKind::UnknownEntity(target.clone()));
                };
                container.merge_fields(name.clone(), fields.clone());
                Ok(())
            }

            Instruction::Relate {
                target,
                other,
                position,
            } => {
                if !graph.contains(other) {
                    return Err(BatchErrorKind::UnknownEntity(other.clone()));
                }
                let Some(source) = graph.get_mut(target) else {
                    return Err(BatchErrorKind::UnknownEntity(target.clone()));
                };
                source.merge_relation(other.clone(), position.clone());
                Ok(())
            }

            Instruction::Delete { target } => {
                if !graph.contains(target) {
                    return Err(BatchErrorKind::UnknownEntity(target.clone()));
                }
                if self.policy == DanglingEdgePolicy::Reject {
                    let referrers = graph.referrers_of(target);
                    if !referrers.is_empty() {
                        return Err(BatchErrorKind::DanglingReference {
                            id: target.clone(),
                            referrers,
                        });
                    }
                }
                graph.remove(target);
                Ok(())
            }
        }
    }
}
