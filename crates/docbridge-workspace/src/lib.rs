//! Remote store gateway: upload, export, list, and SQL statement execution
//! against a Databricks-style workspace.
//!
//! The [`WorkspaceApi`] trait is the seam between the gateway logic and the
//! wire; [`RestWorkspaceClient`] is the production implementation.
//! [`StoreGateway`] layers the fallback protocols on top: the export format
//! cascade, the direct-download path, and the silent-empty listing policy.

pub mod api;
pub mod gateway;
pub mod sql;

pub use api::{
    ColumnInfo, ExportFormat, ImportFormat, ObjectEntry, RestWorkspaceClient, ResultSchema,
    StatementError, StatementManifest, StatementResponse, StatementResult, StatementStatus,
    Warehouse, WorkspaceApi, WorkspaceConfig,
};
pub use gateway::{
    is_pdf_path, AttemptOutcome, DirectExport, ExportAttempt, ExportOutcome, StoreGateway,
    UploadReceipt,
};
pub use sql::QueryRows;
