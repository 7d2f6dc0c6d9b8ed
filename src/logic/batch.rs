use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::logic::execute::{DanglingEdgePolicy, Executor};
use crate::logic::registry::PlaceholderRegistry;
use crate::logic::rewrite::rewrite_batch;
use crate::model::{is_placeholder, Batch, BatchResponse, Instruction, InstructionOutcome};
use crate::store::traits::ContainerStore;

/// Everything that can go wrong while processing a batch. Each kind carries
/// the offending token or identifier so the caller can correct and resubmit.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BatchErrorKind {
    #[error("placeholder '{0}' is registered by more than one create instruction")]
    DuplicatePlaceholder(String),
    #[error("placeholder '{0}' is not registered by an earlier create instruction")]
    UnresolvedPlaceholder(String),
    #[error("container '{0}' does not exist in the working model")]
    UnknownEntity(String),
    #[error("container '{0}' already exists in the working model")]
    DuplicateEntity(String),
    #[error("container '{id}' is still referenced by {referrers:?}")]
    DanglingReference { id: String, referrers: Vec<String> },
    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl BatchErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            BatchErrorKind::DuplicatePlaceholder(_) => "DuplicatePlaceholder",
            BatchErrorKind::UnresolvedPlaceholder(_) => "UnresolvedPlaceholder",
            BatchErrorKind::UnknownEntity(_) => "UnknownEntity",
            BatchErrorKind::DuplicateEntity(_) => "DuplicateEntity",
            BatchErrorKind::DanglingReference { .. } => "DanglingReference",
            BatchErrorKind::Persistence(_) => "PersistenceError",
        }
    }

    /// The token or identifier the error is about, where there is one.
    pub fn subject(&self) -> Option<&str> {
        match self {
            BatchErrorKind::DuplicatePlaceholder(token)
            | BatchErrorKind::UnresolvedPlaceholder(token) => Some(token),
            BatchErrorKind::UnknownEntity(id)
            | BatchErrorKind::DuplicateEntity(id)
            | BatchErrorKind::DanglingReference { id, .. } => Some(id),
            BatchErrorKind::Persistence(_) => None,
        }
    }

    /// Persistence failures are the only kind not attributable to caller
    /// input; they surface as server-side conditions eligible for retry.
    pub fn is_server_side(&self) -> bool {
        matches!(self, BatchErrorKind::Persistence(_))
    }
}

/// A batch failure, tagged with the index of the failing instruction where
/// one is responsible (persistence failures happen outside any instruction).
#[derive(Debug, Clone, PartialEq)]
pub struct BatchError {
    pub index: Option<usize>,
    pub kind: BatchErrorKind,
}

impl BatchError {
    pub fn at(index: usize, kind: BatchErrorKind) -> Self {
        Self {
            index: Some(index),
            kind,
        }
    }

    pub fn persistence(err: anyhow::Error) -> Self {
        Self {
            index: None,
            kind: BatchErrorKind::Persistence(format!("{:#}", err)),
        }
    }
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "instruction {}: {}", index, self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for BatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

/// Orchestrates one batch end to end: registry pre-scan, rewrite, sequential
/// execution against a working model seeded from the persisted project, and
/// a single persistence call on success. The store handle is injected at
/// construction; there is no shared repository state.
pub struct BatchCoordinator<S> {
    store: Arc<S>,
    executor: Executor,
}

impl<S: ContainerStore> BatchCoordinator<S> {
    pub fn new(store: Arc<S>, policy: DanglingEdgePolicy) -> Self {
        Self {
            store,
            executor: Executor::new(policy),
        }
    }

    pub async fn run(&self, project: &str, batch: &Batch) -> Result<BatchResponse, BatchError> {
        // Phase 1: pre-scan create instructions in submission order. Only
        // placeholder targets are registered; real-id creates keep their
        // client-chosen identifier.
        let mut registry = PlaceholderRegistry::new();
        for (index, instruction) in batch.instructions.iter().enumerate() {
            if let Instruction::Create { target, .. } = instruction {
                if is_placeholder(target) {
                    registry
                        .register(target, index)
                        .map_err(|kind| BatchError::at(index, kind))?;
                }
            }
        }

        // Phase 2: substitute placeholders across the whole batch. The first
        // unresolved (or forward-referenced) token aborts everything, so a
        // partially rewritten batch never reaches execution.
        let rewritten = rewrite_batch(batch, &registry)?;

        // Phase 3: seed the working model from persisted state. An absent
        // project starts from an empty graph; its first batch creates it.
        let mut graph = self
            .store
            .load_project(project)
            .await
            .map_err(BatchError::persistence)?
            .unwrap_or_default();

        // Phase 4: strict sequential application. Nothing past the failing
        // instruction runs, and the discarded working model is never seen
        // by anyone else.
        let mut result = Vec::with_capacity(rewritten.instructions.len());
        for (index, instruction) in rewritten.instructions.iter().enumerate() {
            self.executor
                .apply(instruction, &mut graph)
                .map_err(|kind| BatchError::at(index, kind))?;
            result.push(InstructionOutcome {
                index,
                action: instruction.action().to_string(),
                target: instruction.target().clone(),
            });
        }

        // Phase 5: one save for the whole batch.
        self.store
            .save_project(project, &graph)
            .await
            .map_err(BatchError::persistence)?;

        log::info!(
            "Applied batch of {} instructions to project '{}' ({} placeholders resolved)",
            result.len(),
            project,
            registry.len()
        );

        Ok(BatchResponse {
            result,
            placeholder_mapping: registry.snapshot(),
        })
    }
}
