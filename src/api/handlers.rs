use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    Extension, Json as RequestJson,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::BatchConfig;
use crate::logic::{export_mermaid, BatchCoordinator, BatchError};
use crate::model::{Batch, BatchResponse, Container, ContainerGraph};
use crate::store::traits::ContainerStore;

pub type AppState<S> = Arc<S>;

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: usize,
}

impl<T> ListResponse<T> {
    fn new(items: Vec<T>) -> Self {
        let total = items.len();
        Self { items, total }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            error: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Failure payload for the batch endpoint: the failing instruction's index,
/// the error kind, and the offending token or identifier.
#[derive(Debug, Serialize)]
pub struct BatchErrorResponse {
    pub error: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// True for server-side conditions worth retrying; false for batches
    /// the client must correct before resubmitting.
    pub retryable: bool,
}

fn batch_error_response(err: BatchError) -> (StatusCode, Json<BatchErrorResponse>) {
    let status = if err.kind.is_server_side() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::BAD_REQUEST
    };
    let body = BatchErrorResponse {
        error: err.to_string(),
        kind: err.kind.name().to_string(),
        index: err.index,
        subject: err.kind.subject().map(|s| s.to_string()),
        retryable: err.kind.is_server_side(),
    };
    (status, Json(body))
}

fn store_error(err: anyhow::Error) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(&format!("{:#}", err))),
    )
}

fn project_not_found(project: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(&format!(
            "Project '{}' not found",
            project
        ))),
    )
}

async fn load_graph<S: ContainerStore>(
    store: &S,
    project: &str,
) -> Result<ContainerGraph, (StatusCode, Json<ErrorResponse>)> {
    match store.load_project(project).await {
        Ok(Some(graph)) => Ok(graph),
        Ok(None) => Err(project_not_found(project)),
        Err(e) => Err(store_error(e)),
    }
}

/// Apply one ordered batch of instructions to a project. The only mutation
/// endpoint: placeholder registration, rewriting, execution and the single
/// persistence call all happen inside the coordinator.
pub async fn run_batch<S: ContainerStore>(
    State(store): State<AppState<S>>,
    Extension(batch_config): Extension<BatchConfig>,
    Path(project): Path<String>,
    RequestJson(batch): RequestJson<Batch>,
) -> Result<Json<BatchResponse>, (StatusCode, Json<BatchErrorResponse>)> {
    let coordinator = BatchCoordinator::new(store, batch_config.dangling_edges);
    match coordinator.run(&project, &batch).await {
        Ok(response) => Ok(Json(response)),
        Err(err) => {
            log::warn!("Batch against project '{}' failed: {}", project, err);
            Err(batch_error_response(err))
        }
    }
}

pub async fn list_projects<S: ContainerStore>(
    State(store): State<AppState<S>>,
) -> Result<Json<ListResponse<String>>, (StatusCode, Json<ErrorResponse>)> {
    match store.list_projects().await {
        Ok(names) => Ok(Json(ListResponse::new(names))),
        Err(e) => Err(store_error(e)),
    }
}

pub async fn delete_project<S: ContainerStore>(
    State(store): State<AppState<S>>,
    Path(project): Path<String>,
) -> Result<Json<MessageResponse>, (StatusCode, Json<ErrorResponse>)> {
    match store.delete_project(&project).await {
        Ok(true) => Ok(Json(MessageResponse {
            message: format!("Project '{}' deleted", project),
        })),
        Ok(false) => Err(project_not_found(&project)),
        Err(e) => Err(store_error(e)),
    }
}

pub async fn list_containers<S: ContainerStore>(
    State(store): State<AppState<S>>,
    Path(project): Path<String>,
) -> Result<Json<ListResponse<Container>>, (StatusCode, Json<ErrorResponse>)> {
    let graph = load_graph(store.as_ref(), &project).await?;
    let mut containers: Vec<Container> = graph.containers.into_values().collect();
    containers.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    Ok(Json(ListResponse::new(containers)))
}

pub async fn get_container<S: ContainerStore>(
    State(store): State<AppState<S>>,
    Path((project, id)): Path<(String, String)>,
) -> Result<Json<Container>, (StatusCode, Json<ErrorResponse>)> {
    let graph = load_graph(store.as_ref(), &project).await?;
    match graph.get(&id) {
        Some(container) => Ok(Json(container.clone())),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(&format!("Container '{}' not found", id))),
        )),
    }
}

pub async fn get_children<S: ContainerStore>(
    State(store): State<AppState<S>>,
    Path((project, id)): Path<(String, String)>,
) -> Result<Json<ListResponse<Container>>, (StatusCode, Json<ErrorResponse>)> {
    let graph = load_graph(store.as_ref(), &project).await?;
    if !graph.contains(&id) {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(&format!("Container '{}' not found", id))),
        ));
    }
    let children = graph.children_of(&id).into_iter().cloned().collect();
    Ok(Json(ListResponse::new(children)))
}

pub async fn get_parents<S: ContainerStore>(
    State(store): State<AppState<S>>,
    Path((project, id)): Path<(String, String)>,
) -> Result<Json<ListResponse<Container>>, (StatusCode, Json<ErrorResponse>)> {
    let graph = load_graph(store.as_ref(), &project).await?;
    if !graph.contains(&id) {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(&format!("Container '{}' not found", id))),
        ));
    }
    let parents = graph.parents_of(&id).into_iter().cloned().collect();
    Ok(Json(ListResponse::new(parents)))
}

#[derive(Debug, Deserialize)]
pub struct MermaidQuery {
    pub depth: Option<usize>,
}

/// Mermaid flowchart text for the subgraph under one container.
pub async fn get_mermaid<S: ContainerStore>(
    State(store): State<AppState<S>>,
    Path((project, id)): Path<(String, String)>,
    Query(query): Query<MermaidQuery>,
) -> Result<String, (StatusCode, Json<ErrorResponse>)> {
    let graph = load_graph(store.as_ref(), &project).await?;
    if !graph.contains(&id) {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(&format!("Container '{}' not found", id))),
        ));
    }
    Ok(export_mermaid(&graph, &id, query.depth))
}
