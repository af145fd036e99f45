//! HTTP front end: thin axum plumbing over the store gateway, session
//! store, and query engine. Validates requests, holds the connection
//! context built at connect time, and converts every internal error into a
//! structured `{success: false, error}` body.

pub mod routes;
pub mod server;

pub use routes::{ChatRequest, ChatResponse, ConnectRequest};
pub use server::{AppState, GatewayConfig, GatewayServer, ServiceContext};
