use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool, Row};

use crate::model::{ContainerGraph, ProjectSnapshot};
use crate::store::traits::ContainerStore;

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str) -> Result<Self> {
        Self::with_max_connections(database_url, 20).await
    }

    pub async fn with_max_connections(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Create the snapshot table if it does not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS project_snapshots (
                name TEXT PRIMARY KEY,
                container_count INTEGER NOT NULL,
                content_hash TEXT NOT NULL,
                data BYTEA NOT NULL,
                saved_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create project_snapshots table")?;

        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_snapshot(&self, name: &str) -> Result<Option<ProjectSnapshot>> {
        let row = sqlx::query(
            "SELECT name, container_count, content_hash, data, saved_at FROM project_snapshots WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch project snapshot")?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(ProjectSnapshot {
            name: row.get("name"),
            container_count: row.get("container_count"),
            content_hash: row.get("content_hash"),
            data: row.get("data"),
            saved_at: row.get("saved_at"),
        }))
    }
}

#[async_trait::async_trait]
impl ContainerStore for PostgresStore {
    async fn load_project(&self, name: &str) -> Result<Option<ContainerGraph>> {
        let Some(snapshot) = self.fetch_snapshot(name).await? else {
            return Ok(None);
        };

        let graph = snapshot
            .get_graph()
            .with_context(|| format!("Snapshot for project '{}' is unreadable", name))?;
        Ok(Some(graph))
    }

    async fn save_project(&self, name: &str, graph: &ContainerGraph) -> Result<()> {
        let snapshot = ProjectSnapshot::new(name, graph)?;

        sqlx::query(
            r#"
            INSERT INTO project_snapshots (name, container_count, content_hash, data, saved_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (name) DO UPDATE SET
                container_count = EXCLUDED.container_count,
                content_hash = EXCLUDED.content_hash,
                data = EXCLUDED.data,
                saved_at = EXCLUDED.saved_at
            "#,
        )
        .bind(&snapshot.name)
        .bind(snapshot.container_count)
        .bind(&snapshot.content_hash)
        .bind(&snapshot.data)
        .bind(&snapshot.saved_at)
        .execute(&self.pool)
        .await
        .context("Failed to save project snapshot")?;

        log::debug!(
            "Saved project '{}' ({} containers, hash {})",
            name,
            snapshot.container_count,
            &snapshot.content_hash[..8.min(snapshot.content_hash.len())]
        );

        Ok(())
    }

    async fn delete_project(&self, name: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM project_snapshots WHERE name = $1")
            .bind(name)
            .execute(&self.pool)
            .await
            .context("Failed to delete project snapshot")?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_projects(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT name FROM project_snapshots ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list project snapshots")?;

        Ok(rows.into_iter().map(|row| row.get("name")).collect())
    }
}
