use axum::{
    middleware,
    routing::{delete, get, post},
    Extension, Router,
};
use std::sync::Arc;
use tower_http::services::ServeDir;

use crate::api::{auth, handlers};
use crate::config::{AuthConfig, BatchConfig};
use crate::store::traits::ContainerStore;

pub fn create_router<S: ContainerStore + 'static>(
    auth_config: AuthConfig,
    batch_config: BatchConfig,
) -> Router<Arc<S>> {
    let protected = Router::new()
        // Project management
        .route("/projects", get(handlers::list_projects::<S>))
        .route("/projects/:project", delete(handlers::delete_project::<S>))
        // Batch mutation endpoint (the only write path)
        .route("/projects/:project/batch", post(handlers::run_batch::<S>))
        // Container reads
        .route(
            "/projects/:project/containers",
            get(handlers::list_containers::<S>),
        )
        .route(
            "/projects/:project/containers/:id",
            get(handlers::get_container::<S>),
        )
        .route(
            "/projects/:project/containers/:id/children",
            get(handlers::get_children::<S>),
        )
        .route(
            "/projects/:project/containers/:id/parents",
            get(handlers::get_parents::<S>),
        )
        // Exports
        .route(
            "/projects/:project/containers/:id/mermaid",
            get(handlers::get_mermaid::<S>),
        )
        .route_layer(middleware::from_fn_with_state(
            Arc::new(auth_config),
            auth::require_passcode,
        ))
        .layer(Extension(batch_config));

    Router::new()
        // Health check stays open for load balancer probes
        .route("/health", get(handlers::health_check))
        .merge(protected)
        // Bundled web UI, when present
        .nest_service("/ui", ServeDir::new("web"))
}
