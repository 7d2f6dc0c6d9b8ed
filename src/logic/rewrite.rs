use std::collections::HashMap;

use crate::logic::batch::{BatchError, BatchErrorKind};
use crate::logic::registry::PlaceholderRegistry;
use crate::model::{is_placeholder, Batch, Id, Instruction};

/// Substitute every placeholder occurrence in the batch with its registered
/// real identifier. Pure with respect to the registry and free of I/O; the
/// first token that is unregistered, or registered only by a later create
/// instruction, aborts the whole batch. Values outside the placeholder
/// namespace pass through unchanged, so rewriting an already-rewritten
/// batch is a no-op.
pub fn rewrite_batch(batch: &Batch, registry: &PlaceholderRegistry) -> Result<Batch, BatchError> {
    let instructions = batch
        .instructions
        .iter()
        .enumerate()
        .map(|(index, instruction)| {
            rewrite_instruction(instruction, registry, index)
                .map_err(|kind| BatchError::at(index, kind))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Batch { instructions })
}

fn rewrite_instruction(
    instruction: &Instruction,
    registry: &PlaceholderRegistry,
    index: usize,
) -> Result<Instruction, BatchErrorKind> {
    let rewritten = match instruction {
        Instruction::Create {
            target,
            name,
            fields,
        } => Instruction::Create {
            target: rewrite_ref(target, registry, index)?,
            name: name.clone(),
            fields: rewrite_fields(fields, registry, index)?,
        },
        Instruction::AddChild {
            target,
            child,
            label,
        } => Instruction::AddChild {
            target: rewrite_ref(target, registry, index)?,
            child: rewrite_ref(child, registry, index)?,
            label: label
                .as_ref()
                .map(|value| rewrite_value(value, registry, index))
                .transpose()?,
        },
        Instruction::Modify {
            target,
            name,
            fields,
        } => Instruction::Modify {
            target: rewrite_ref(target, registry, index)?,
            name: name.clone(),
            fields: rewrite_fields(fields, registry, index)?,
        },
        Instruction::Relate {
            target,
            other,
            position,
        } => Instruction::Relate {
            target: rewrite_ref(target, registry, index)?,
            other: rewrite_ref(other, registry, index)?,
            position: rewrite_map(position, registry, index)?,
        },
        Instruction::Delete { target } => Instruction::Delete {
            target: rewrite_ref(target, registry, index)?,
        },
    };

    Ok(rewritten)
}

fn rewrite_ref(
    reference: &Id,
    registry: &PlaceholderRegistry,
    index: usize,
) -> Result<Id, BatchErrorKind> {
    if is_placeholder(reference) {
        registry.resolve_visible(reference, index)
    } else {
        Ok(reference.clone())
    }
}

fn rewrite_fields(
    fields: &HashMap<String, serde_json::Value>,
    registry: &PlaceholderRegistry,
    index: usize,
) -> Result<HashMap<String, serde_json::Value>, BatchErrorKind> {
    fields
        .iter()
        .map(|(key, value)| Ok((key.clone(), rewrite_value(value, registry, index)?)))
        .collect()
}

fn rewrite_map(
    map: &serde_json::Map<String, serde_json::Value>,
    registry: &PlaceholderRegistry,
    index: usize,
) -> Result<serde_json::Map<String, serde_json::Value>, BatchErrorKind> {
    map.iter()
        .map(|(key, value)| Ok((key.clone(), rewrite_value(value, registry, index)?)))
        .collect()
}

/// Recursive descent over a payload value: placeholder-shaped strings are
/// substituted wherever they appear, objects and arrays are walked to
/// arbitrary depth, everything else is cloned as-is.
fn rewrite_value(
    value: &serde_json::Value,
    registry: &PlaceholderRegistry,
    index: usize,
) -> Result<serde_json::Value, BatchErrorKind> {
    match value {
        serde_json::Value::String(s) if is_placeholder(s) => {
            Ok(serde_json::Value::String(registry.resolve_visible(s, index)?))
        }
        serde_json::Value::Array(items) => Ok(serde_json::Value::Array(
            items
                .iter()
                .map(|item| rewrite_value(item, registry, index))
                .collect::<Result<Vec<_>, _>>()?,
        )),
        serde_json::Value::Object(map) => {
            Ok(serde_json::Value::Object(rewrite_map(map, registry, index)?))
        }
        other => Ok(other.clone()),
    }
}
