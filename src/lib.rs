pub mod api;
pub mod config;
pub mod logic;
pub mod model;
pub mod store;

// Export API types
pub use api::handlers;
pub use api::routes;

// Export logic types
pub use logic::{
    export_mermaid, rewrite_batch, BatchCoordinator, BatchError, BatchErrorKind,
    DanglingEdgePolicy, Executor, PlaceholderRegistry,
};

// Export all model types
pub use model::*;

// Export store types
pub use store::{ContainerStore, MemoryStore, PostgresStore};

// Function for integration testing
pub async fn run_server() -> anyhow::Result<()> {
    use axum::serve;
    use std::sync::Arc;
    use tokio::net::TcpListener;

    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    // Initialize logging with INFO level only (suppress DEBUG logs)
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();

    // Load configuration
    let config = crate::config::AppConfig::load()?;

    // Connect to PostgreSQL
    let database_url = config.database_url()?;
    let postgres_store = crate::store::PostgresStore::new(&database_url).await?;

    // Run migrations
    postgres_store.migrate().await?;

    let store = Arc::new(postgres_store);

    // Create router with state
    let app = crate::api::routes::create_router(config.auth.clone(), config.batch.clone())
        .with_state(store);

    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;

    serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::model::{Batch, Instruction};

    #[test]
    fn instruction_deserialization_covers_all_actions() {
        // The client wire format: internally tagged by "action", kebab-case
        let json = r#"{
            "instructions": [
                {"action": "create", "target": "tmp-1", "name": "Root",
                 "fields": {"Description": "top level", "Tags": ["plan"]}},
                {"action": "add-child", "target": "tmp-1", "child": "existing-42",
                 "label": {"label": "contains"}},
                {"action": "modify", "target": "existing-42",
                 "fields": {"Horizon": "short"}},
                {"action": "relate", "target": "tmp-1", "other": "existing-42",
                 "position": {"label": "supports"}},
                {"action": "delete", "target": "existing-7"}
            ]
        }"#;

        let batch: Batch = serde_json::from_str(json).expect("batch should deserialize");
        assert_eq!(batch.instructions.len(), 5);

        let actions: Vec<&str> = batch.instructions.iter().map(|i| i.action()).collect();
        assert_eq!(
            actions,
            vec!["create", "add-child", "modify", "relate", "delete"]
        );

        match &batch.instructions[0] {
            Instruction::Create { target, name, fields } => {
                assert_eq!(target, "tmp-1");
                assert_eq!(name, "Root");
                assert_eq!(fields["Tags"], serde_json::json!(["plan"]));
            }
            other => panic!("unexpected first instruction: {:?}", other),
        }
    }

    #[test]
    fn optional_payload_parts_can_be_omitted() {
        let json = r#"{"instructions": [
            {"action": "create", "target": "tmp-1", "name": "Bare"},
            {"action": "add-child", "target": "a", "child": "b"},
            {"action": "relate", "target": "a", "other": "b"}
        ]}"#;

        let batch: Batch = serde_json::from_str(json).expect("defaults should apply");
        match &batch.instructions[0] {
            Instruction::Create { fields, .. } => assert!(fields.is_empty()),
            other => panic!("unexpected instruction: {:?}", other),
        }
        match &batch.instructions[1] {
            Instruction::AddChild { label, .. } => assert!(label.is_none()),
            other => panic!("unexpected instruction: {:?}", other),
        }
        match &batch.instructions[2] {
            Instruction::Relate { position, .. } => assert!(position.is_empty()),
            other => panic!("unexpected instruction: {:?}", other),
        }
    }
}
