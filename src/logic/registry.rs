use std::collections::BTreeMap;

use crate::logic::batch::BatchErrorKind;
use crate::model::{generate_id, is_placeholder, Id};

#[derive(Debug, Clone)]
struct Registration {
    id: Id,
    /// Index of the create instruction that defined the token. Instructions
    /// earlier in the batch must not see tokens defined after them.
    defined_at: usize,
}

/// Request-scoped table mapping placeholder tokens to generated real
/// identifiers. Created empty at batch start, populated during the create
/// pre-scan, read-only during rewriting, and discarded with the request.
/// A token, once mapped, is stable for the remainder of the batch.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderRegistry {
    entries: BTreeMap<String, Registration>,
}

impl PlaceholderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a real identifier for an unseen token. Registering the same
    /// token twice is a client error, not a silent overwrite.
    pub fn register(&mut self, token: &str, defined_at: usize) -> Result<Id, BatchErrorKind> {
        if self.entries.contains_key(token) {
            return Err(BatchErrorKind::DuplicatePlaceholder(token.to_string()));
        }
        let id = generate_id();
        debug_assert!(!is_placeholder(&id));
        self.entries.insert(
            token.to_string(),
            Registration {
                id: id.clone(),
                defined_at,
            },
        );
        Ok(id)
    }

    /// Look up a previously registered token, regardless of position.
    pub fn resolve(&self, token: &str) -> Result<Id, BatchErrorKind> {
        self.entries
            .get(token)
            .map(|registration| registration.id.clone())
            .ok_or_else(|| BatchErrorKind::UnresolvedPlaceholder(token.to_string()))
    }

    /// Look up a token as seen from the instruction at `index`: tokens are
    /// visible from their defining create instruction onward, never before.
    pub fn resolve_visible(&self, token: &str, index: usize) -> Result<Id, BatchErrorKind> {
        match self.entries.get(token) {
            Some(registration) if registration.defined_at <= index => Ok(registration.id.clone()),
            _ => Err(BatchErrorKind::UnresolvedPlaceholder(token.to_string())),
        }
    }

    /// The full token -> identifier table, for the response payload.
    pub fn snapshot(&self) -> BTreeMap<String, Id> {
        self.entries
            .iter()
            .map(|(token, registration)| (token.clone(), registration.id.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
