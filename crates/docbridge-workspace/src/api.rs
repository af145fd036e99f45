use async_trait::async_trait;
use docbridge_codec::TransportPayload;
use docbridge_core::{DocbridgeError, DocbridgeResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Export formats the workspace API understands, in the order they appear
/// on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExportFormat {
    /// Raw file content.
    Source,
    /// Rendered HTML.
    Html,
    /// Jupyter notebook JSON.
    Jupyter,
    /// Let the server pick.
    Auto,
}

impl ExportFormat {
    /// The wire value for this format.
    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Source => "SOURCE",
            ExportFormat::Html => "HTML",
            ExportFormat::Jupyter => "JUPYTER",
            ExportFormat::Auto => "AUTO",
        }
    }
}

/// Import formats accepted by the workspace import API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImportFormat {
    /// Server-side automatic detection.
    Auto,
}

impl ImportFormat {
    /// The wire value for this format.
    pub fn as_str(self) -> &'static str {
        match self {
            ImportFormat::Auto => "AUTO",
        }
    }
}

/// A single entry returned by a workspace directory listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectEntry {
    /// Full workspace path of the object.
    pub path: String,
    /// Object kind as reported by the server (FILE, NOTEBOOK, DIRECTORY).
    pub object_type: String,
    /// Notebook language, when the object is a notebook.
    #[serde(default)]
    pub language: Option<String>,
}

/// A SQL compute warehouse available in the workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warehouse {
    /// Warehouse identifier used to submit statements.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
}

/// Terminal/partial status of a submitted statement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatementStatus {
    /// Execution state (PENDING, RUNNING, SUCCEEDED, FAILED, CANCELED).
    #[serde(default)]
    pub state: String,
    /// Error detail, present when the state is a failure.
    #[serde(default)]
    pub error: Option<StatementError>,
}

/// Error detail reported by the statement execution API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatementError {
    /// Human-readable message from the remote engine.
    #[serde(default)]
    pub message: Option<String>,
}

/// A column description within a result schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,
}

/// Result schema: an ordered list of columns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultSchema {
    /// Columns in result order.
    #[serde(default)]
    pub columns: Vec<ColumnInfo>,
}

/// Inline result block of a statement response.
///
/// Depending on the API version the schema lives either here or under the
/// manifest; both shapes are preserved.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatementResult {
    /// Row data as arrays of values.
    #[serde(default)]
    pub data_array: Option<Vec<Vec<serde_json::Value>>>,
    /// Schema location used by older responses.
    #[serde(default)]
    pub schema: Option<ResultSchema>,
}

/// Manifest block of a statement response (newer schema location).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatementManifest {
    /// Schema location used by newer responses.
    #[serde(default)]
    pub schema: Option<ResultSchema>,
}

/// Full response to a statement execution request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatementResponse {
    /// Server-assigned statement identifier.
    #[serde(default)]
    pub statement_id: Option<String>,
    /// Execution status.
    #[serde(default)]
    pub status: Option<StatementStatus>,
    /// Inline result data.
    #[serde(default)]
    pub result: Option<StatementResult>,
    /// Result manifest.
    #[serde(default)]
    pub manifest: Option<StatementManifest>,
}

/// The remote workspace client capability set.
///
/// The store gateway talks to the workspace exclusively through this trait;
/// [`RestWorkspaceClient`] is the production implementation, tests swap in
/// scripted ones.
#[async_trait]
pub trait WorkspaceApi: Send + Sync {
    /// Name of the authenticated user, used to verify connectivity.
    async fn current_user(&self) -> DocbridgeResult<String>;

    /// Import base64-encoded content at `path`.
    async fn import(
        &self,
        path: &str,
        content: &str,
        format: ImportFormat,
        overwrite: bool,
    ) -> DocbridgeResult<()>;

    /// Export the object at `path` in the given format.
    ///
    /// `Ok(None)` means the object exists but yielded no content (or does
    /// not exist at all); transport-level faults are `Err`.
    async fn export(
        &self,
        path: &str,
        format: ExportFormat,
    ) -> DocbridgeResult<Option<TransportPayload>>;

    /// Dedicated raw-bytes download, when the server supports it.
    async fn download(&self, path: &str) -> DocbridgeResult<Option<Vec<u8>>>;

    /// List the directory at `path`.
    async fn list(&self, path: &str) -> DocbridgeResult<Vec<ObjectEntry>>;

    /// List the SQL warehouses visible to this client.
    async fn list_warehouses(&self) -> DocbridgeResult<Vec<Warehouse>>;

    /// Submit a statement and wait (bounded) for completion.
    async fn execute_statement(
        &self,
        warehouse_id: &str,
        sql: &str,
        wait_timeout: &str,
    ) -> DocbridgeResult<StatementResponse>;
}

// ── REST implementation ─────────────────────────────────────────────────────

/// Connection parameters for a workspace.
#[derive(Debug, Clone)]
pub struct WorkspaceConfig {
    /// Base URL of the workspace, without a trailing slash.
    pub host: String,
    /// Bearer token.
    pub token: String,
}

impl WorkspaceConfig {
    /// Creates a config, trimming any trailing slash off the host.
    pub fn new(host: impl Into<String>, token: impl Into<String>) -> Self {
        let host = host.into();
        Self {
            host: host.trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }
}

/// Workspace client speaking the REST API 2.0 surface.
pub struct RestWorkspaceClient {
    config: WorkspaceConfig,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ScimMe {
    #[serde(rename = "userName")]
    user_name: String,
}

#[derive(Debug, Serialize)]
struct ImportRequest<'a> {
    path: &'a str,
    content: &'a str,
    format: &'a str,
    overwrite: bool,
}

#[derive(Debug, Deserialize)]
struct ExportResponse {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    objects: Vec<ObjectEntry>,
}

#[derive(Debug, Deserialize)]
struct WarehousesResponse {
    #[serde(default)]
    warehouses: Vec<Warehouse>,
}

#[derive(Debug, Serialize)]
struct StatementRequest<'a> {
    warehouse_id: &'a str,
    statement: &'a str,
    wait_timeout: &'a str,
}

impl RestWorkspaceClient {
    /// Creates a client for the given workspace.
    pub fn new(config: WorkspaceConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// The workspace base URL this client talks to.
    pub fn host(&self) -> &str {
        &self.config.host
    }

    /// The bearer token this client authenticates with.
    pub fn token(&self) -> &str {
        &self.config.token
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.host, endpoint)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.header("Authorization", format!("Bearer {}", self.config.token))
    }

    async fn check(resp: reqwest::Response, context: &str) -> DocbridgeResult<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(DocbridgeError::Workspace(format!(
            "{context} failed with status {status}: {body}"
        )))
    }
}

#[async_trait]
impl WorkspaceApi for RestWorkspaceClient {
    async fn current_user(&self) -> DocbridgeResult<String> {
        let resp = self
            .authorized(self.http.get(self.url("/api/2.0/preview/scim/v2/Me")))
            .send()
            .await
            .map_err(|e| DocbridgeError::Http(e.to_string()))?;

        let me: ScimMe = Self::check(resp, "current user lookup")
            .await?
            .json()
            .await
            .map_err(|e| DocbridgeError::Http(e.to_string()))?;
        Ok(me.user_name)
    }

    async fn import(
        &self,
        path: &str,
        content: &str,
        format: ImportFormat,
        overwrite: bool,
    ) -> DocbridgeResult<()> {
        let body = ImportRequest {
            path,
            content,
            format: format.as_str(),
            overwrite,
        };
        let resp = self
            .authorized(self.http.post(self.url("/api/2.0/workspace/import")))
            .json(&body)
            .send()
            .await
            .map_err(|e| DocbridgeError::Http(e.to_string()))?;

        Self::check(resp, "workspace import").await?;
        Ok(())
    }

    async fn export(
        &self,
        path: &str,
        format: ExportFormat,
    ) -> DocbridgeResult<Option<TransportPayload>> {
        let resp = self
            .authorized(self.http.get(self.url("/api/2.0/workspace/export")))
            .query(&[("path", path), ("format", format.as_str())])
            .send()
            .await
            .map_err(|e| DocbridgeError::Http(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            debug!(path = %path, format = format.as_str(), "export: object not found");
            return Ok(None);
        }
        let resp = Self::check(resp, "workspace export").await?;

        let is_json = resp
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));

        if is_json {
            let body: ExportResponse = resp
                .json()
                .await
                .map_err(|e| DocbridgeError::Http(e.to_string()))?;
            Ok(body.content.map(TransportPayload::Text))
        } else {
            // Some servers answer with the raw body instead of the JSON
            // envelope.
            let bytes = resp
                .bytes()
                .await
                .map_err(|e| DocbridgeError::Http(e.to_string()))?;
            if bytes.is_empty() {
                Ok(None)
            } else {
                Ok(Some(TransportPayload::Binary(bytes.to_vec())))
            }
        }
    }

    async fn download(&self, path: &str) -> DocbridgeResult<Option<Vec<u8>>> {
        let resp = self
            .authorized(self.http.get(self.url("/api/2.0/workspace/export")))
            .query(&[
                ("path", path),
                ("format", ExportFormat::Source.as_str()),
                ("direct_download", "true"),
            ])
            .send()
            .await
            .map_err(|e| DocbridgeError::Http(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = Self::check(resp, "workspace download").await?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| DocbridgeError::Http(e.to_string()))?;
        if bytes.is_empty() {
            Ok(None)
        } else {
            Ok(Some(bytes.to_vec()))
        }
    }

    async fn list(&self, path: &str) -> DocbridgeResult<Vec<ObjectEntry>> {
        let resp = self
            .authorized(self.http.get(self.url("/api/2.0/workspace/list")))
            .query(&[("path", path)])
            .send()
            .await
            .map_err(|e| DocbridgeError::Http(e.to_string()))?;

        let body: ListResponse = Self::check(resp, "workspace list")
            .await?
            .json()
            .await
            .map_err(|e| DocbridgeError::Http(e.to_string()))?;
        Ok(body.objects)
    }

    async fn list_warehouses(&self) -> DocbridgeResult<Vec<Warehouse>> {
        let resp = self
            .authorized(self.http.get(self.url("/api/2.0/sql/warehouses")))
            .send()
            .await
            .map_err(|e| DocbridgeError::Http(e.to_string()))?;

        let body: WarehousesResponse = Self::check(resp, "warehouse list")
            .await?
            .json()
            .await
            .map_err(|e| DocbridgeError::Http(e.to_string()))?;
        Ok(body.warehouses)
    }

    async fn execute_statement(
        &self,
        warehouse_id: &str,
        sql: &str,
        wait_timeout: &str,
    ) -> DocbridgeResult<StatementResponse> {
        let body = StatementRequest {
            warehouse_id,
            statement: sql,
            wait_timeout,
        };
        let resp = self
            .authorized(self.http.post(self.url("/api/2.0/sql/statements")))
            .json(&body)
            .send()
            .await
            .map_err(|e| DocbridgeError::Http(e.to_string()))?;

        Self::check(resp, "statement execution")
            .await?
            .json()
            .await
            .map_err(|e| DocbridgeError::Http(e.to_string()))
    }
}
