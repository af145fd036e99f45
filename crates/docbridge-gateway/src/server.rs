use crate::routes;
use docbridge_engine::{ProviderConfig, QueryEngine};
use docbridge_session::ConversationStore;
use docbridge_workspace::StoreGateway;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Static configuration for the HTTP front end.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Workspace directory documents are uploaded under.
    #[serde(default = "default_documents_dir")]
    pub documents_dir: String,
    /// Completion provider settings.
    pub provider: ProviderConfig,
}

fn default_documents_dir() -> String {
    "/Shared/docbridge".to_string()
}

/// Everything a connected workspace session needs, built by the connect
/// endpoint and replaced on reconnect. Owned through [`AppState`], not
/// process-wide globals.
pub struct ServiceContext {
    /// Authenticated user reported by the workspace.
    pub user: String,
    /// Workspace base URL.
    pub workspace_url: String,
    /// Store gateway over the connected workspace.
    pub gateway: Arc<StoreGateway>,
    /// Query engine wired to the configured completion provider.
    pub engine: QueryEngine,
}

/// Shared application state.
pub struct AppState {
    /// Static configuration.
    pub config: GatewayConfig,
    /// The current connection context, if any.
    pub context: RwLock<Option<Arc<ServiceContext>>>,
    /// Conversation store. Lives here so histories survive reconnects.
    pub store: Arc<ConversationStore>,
}

/// The main gateway server.
pub struct GatewayServer;

impl GatewayServer {
    /// Builds the router with a fresh, unconnected state.
    pub fn build(config: GatewayConfig) -> Router {
        let state = Arc::new(AppState {
            config,
            context: RwLock::new(None),
            store: Arc::new(ConversationStore::new()),
        });

        Router::new()
            .route("/health", get(routes::health))
            .route("/api/workspace/connect", post(routes::connect))
            .route("/api/documents/upload", post(routes::upload_document))
            .route("/api/documents", get(routes::list_documents))
            .route("/api/chat/query", post(routes::query))
            .route(
                "/api/chat/history/{conversation_id}",
                get(routes::get_history).delete(routes::clear_history),
            )
            .with_state(state)
    }
}
