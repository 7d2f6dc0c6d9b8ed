use anyhow::{Context, Result};
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::model::{ContainerGraph, ProjectSnapshot};
use crate::store::traits::ContainerStore;

/// In-memory store keeping full project snapshots, for tests and for
/// running the server without a database. Goes through the same snapshot
/// encode/decode path as the PostgreSQL store so compression and hash
/// verification are exercised everywhere.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshots: RwLock<HashMap<String, ProjectSnapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ContainerStore for MemoryStore {
    async fn load_project(&self, name: &str) -> Result<Option<ContainerGraph>> {
        let snapshot = self.snapshots.read().get(name).cloned();
        let Some(snapshot) = snapshot else {
            return Ok(None);
        };
        let graph = snapshot
            .get_graph()
            .with_context(|| format!("Snapshot for project '{}' is unreadable", name))?;
        Ok(Some(graph))
    }

    async fn save_project(&self, name: &str, graph: &ContainerGraph) -> Result<()> {
        let snapshot = ProjectSnapshot::new(name, graph)?;
        self.snapshots.write().insert(name.to_string(), snapshot);
        Ok(())
    }

    async fn delete_project(&self, name: &str) -> Result<bool> {
        Ok(self.snapshots.write().remove(name).is_some())
    }

    async fn list_projects(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.snapshots.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}
