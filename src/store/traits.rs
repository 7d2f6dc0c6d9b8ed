use crate::model::ContainerGraph;
use anyhow::Result;

/// Persistence boundary for project graphs. The core treats this as an
/// opaque key-document store: one durable save per successful batch, one
/// load to seed the working model. Adapter-level concurrency control (row
/// versioning, locking) is the implementation's concern.
#[async_trait::async_trait]
pub trait ContainerStore: Send + Sync {
    /// Load the full container graph persisted under a project name.
    async fn load_project(&self, name: &str) -> Result<Option<ContainerGraph>>;
    /// Durably replace the graph persisted under a project name.
    async fn save_project(&self, name: &str, graph: &ContainerGraph) -> Result<()>;
    /// Drop a project. Returns whether anything was deleted.
    async fn delete_project(&self, name: &str) -> Result<bool>;
    /// All known project names.
    async fn list_projects(&self) -> Result<Vec<String>>;
}
