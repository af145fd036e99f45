use crate::server::{AppState, ServiceContext};
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use docbridge_engine::{build_backend, QueryEngine};
use docbridge_workspace::{is_pdf_path, RestWorkspaceClient, StoreGateway, WorkspaceApi, WorkspaceConfig};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Connect request body. Host and token fall back to the
/// `DOCBRIDGE_HOST` / `DOCBRIDGE_TOKEN` environment variables when blank.
#[derive(Debug, Deserialize)]
pub struct ConnectRequest {
    /// Workspace base URL.
    #[serde(default)]
    pub host: String,
    /// Bearer token.
    #[serde(default)]
    pub token: String,
}

fn or_env(value: &str, var: &str) -> String {
    if value.trim().is_empty() {
        std::env::var(var).unwrap_or_default()
    } else {
        value.to_string()
    }
}

/// Chat query request body.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The question to answer.
    pub question: String,
    /// Workspace path of the document to query.
    pub document_path: String,
    /// Conversation to continue; a fresh one is minted when absent.
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// Chat query response body.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// Whether the query succeeded.
    pub success: bool,
    /// The answer, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    /// The conversation the turn was recorded under.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    /// Provider metadata for this turn.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
    /// Error message, on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn failure(error: impl Into<String>) -> serde_json::Value {
    json!({"success": false, "error": error.into()})
}

async fn require_context(state: &AppState) -> Result<Arc<ServiceContext>, Response> {
    match state.context.read().await.as_ref() {
        Some(context) => Ok(context.clone()),
        None => Err((
            StatusCode::BAD_REQUEST,
            Json(failure("workspace connection not established")),
        )
            .into_response()),
    }
}

pub(crate) async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let connected = state.context.read().await.is_some();
    Json(json!({"status": "ok", "service": "docbridge", "connected": connected}))
}

pub(crate) async fn connect(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ConnectRequest>,
) -> impl IntoResponse {
    let host = or_env(&request.host, "DOCBRIDGE_HOST");
    let token = or_env(&request.token, "DOCBRIDGE_TOKEN");
    if host.is_empty() || token.is_empty() {
        return Json(failure("workspace host and token must be provided"));
    }

    let client = RestWorkspaceClient::new(WorkspaceConfig::new(&host, &token));

    let user = match client.current_user().await {
        Ok(user) => user,
        Err(e) => {
            warn!(error = %e, "workspace connection failed");
            return Json(failure(e.to_string()));
        }
    };

    let backend = match build_backend(&state.config.provider, client.host(), client.token()) {
        Ok(backend) => backend,
        Err(e) => return Json(failure(e.to_string())),
    };

    let host = client.host().to_string();
    let gateway =
        Arc::new(StoreGateway::new(Arc::new(client)).with_direct_fallback(&host, &token));
    let engine = QueryEngine::new(gateway.clone(), state.store.clone(), backend);

    let context = Arc::new(ServiceContext {
        user: user.clone(),
        workspace_url: host.clone(),
        gateway,
        engine,
    });
    *state.context.write().await = Some(context);

    info!(user = %user, workspace_url = %host, "workspace connected");
    Json(json!({
        "success": true,
        "user": user,
        "workspace_url": host,
    }))
}

pub(crate) async fn upload_document(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Response {
    let context = match require_context(&state).await {
        Ok(context) => context,
        Err(response) => return response,
    };

    let mut filename: Option<String> = None;
    let mut data: Option<Vec<u8>> = None;
    let mut create_notebook = false;

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(ToString::to_string);
        match name.as_deref() {
            Some("file") => {
                filename = field.file_name().map(ToString::to_string);
                match field.bytes().await {
                    Ok(bytes) => data = Some(bytes.to_vec()),
                    Err(e) => {
                        return (StatusCode::BAD_REQUEST, Json(failure(e.to_string())))
                            .into_response();
                    }
                }
            }
            Some("create_notebook") => {
                create_notebook = field
                    .text()
                    .await
                    .map(|value| value == "true" || value == "1")
                    .unwrap_or(false);
            }
            _ => {}
        }
    }

    let Some(data) = data else {
        return (
            StatusCode::BAD_REQUEST,
            Json(failure("multipart field 'file' is required")),
        )
            .into_response();
    };
    let Some(filename) = filename else {
        return (
            StatusCode::BAD_REQUEST,
            Json(failure("uploaded file carries no filename")),
        )
            .into_response();
    };
    if !is_pdf_path(&filename) {
        return (
            StatusCode::BAD_REQUEST,
            Json(failure("only PDF files are allowed")),
        )
            .into_response();
    }

    let target = format!(
        "{}/{}",
        state.config.documents_dir.trim_end_matches('/'),
        filename
    );

    let receipt = match context.gateway.upload(&data, &target, true).await {
        Ok(receipt) => receipt,
        Err(e) => {
            warn!(path = %target, error = %e, "document upload failed");
            return Json(failure(e.to_string())).into_response();
        }
    };

    let notebook_path = if create_notebook {
        let path = processing_notebook_path(&receipt.path);
        match context
            .gateway
            .create_notebook(&path, &processing_notebook_source(&receipt.path))
            .await
        {
            Ok(_) => Some(path),
            Err(e) => {
                warn!(path = %path, error = %e, "companion notebook creation failed");
                None
            }
        }
    } else {
        None
    };

    Json(json!({
        "success": true,
        "path": receipt.path,
        "size": receipt.size,
        "message": format!("File uploaded successfully to {}", receipt.path),
        "notebook_path": notebook_path,
    }))
    .into_response()
}

pub(crate) async fn list_documents(State(state): State<Arc<AppState>>) -> Response {
    let context = match require_context(&state).await {
        Ok(context) => context,
        Err(response) => return response,
    };

    let documents: Vec<_> = context
        .gateway
        .list(&state.config.documents_dir)
        .await
        .into_iter()
        .filter(|entry| is_pdf_path(&entry.path))
        .collect();

    Json(json!({
        "success": true,
        "count": documents.len(),
        "documents": documents,
    }))
    .into_response()
}

pub(crate) async fn query(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Response {
    let context = match require_context(&state).await {
        Ok(context) => context,
        Err(response) => return response,
    };

    match context
        .engine
        .query(
            &request.document_path,
            &request.question,
            request.conversation_id,
        )
        .await
    {
        Ok(reply) => Json(ChatResponse {
            success: true,
            answer: Some(reply.answer),
            conversation_id: Some(reply.conversation_id),
            metadata: Some(reply.metadata),
            error: None,
        })
        .into_response(),
        Err(e) => {
            warn!(path = %request.document_path, error = %e, "query failed");
            Json(ChatResponse {
                success: false,
                answer: None,
                conversation_id: None,
                metadata: None,
                error: Some(e.to_string()),
            })
            .into_response()
        }
    }
}

pub(crate) async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<String>,
) -> impl IntoResponse {
    let history = state.store.history(&conversation_id).await;
    Json(json!({
        "success": true,
        "conversation_id": conversation_id,
        "history": history,
    }))
}

pub(crate) async fn clear_history(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<String>,
) -> impl IntoResponse {
    state.store.clear(&conversation_id).await;
    Json(json!({
        "success": true,
        "message": format!("Conversation {conversation_id} cleared"),
    }))
}

fn processing_notebook_path(pdf_path: &str) -> String {
    let stem = pdf_path
        .strip_suffix(".pdf")
        .or_else(|| pdf_path.strip_suffix(".PDF"))
        .unwrap_or(pdf_path);
    format!("{stem}_processing")
}

fn processing_notebook_source(pdf_path: &str) -> String {
    format!(
        "# Docbridge processing notebook\n\
         # Source document: {pdf_path}\n\n\
         pdf_path = \"{pdf_path}\"\n\n\
         print(f\"Processing {{pdf_path}}\")\n"
    )
}
