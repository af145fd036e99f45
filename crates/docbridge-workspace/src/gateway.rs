use crate::api::{ExportFormat, ImportFormat, ObjectEntry, WorkspaceApi};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use docbridge_codec::{decode, encode, Encoding};
use docbridge_core::DocbridgeResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Export formats tried, in order, when the preferred one yields nothing.
const EXPORT_CASCADE: [ExportFormat; 3] = [
    ExportFormat::Source,
    ExportFormat::Html,
    ExportFormat::Jupyter,
];

/// Formats tried by the raw-HTTP fallback, in order.
const DIRECT_FORMATS: [ExportFormat; 2] = [ExportFormat::Source, ExportFormat::Auto];

/// Outcome of a single fetch strategy within [`StoreGateway::export`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// The strategy produced content.
    Ok {
        /// Normalized byte count.
        bytes: usize,
        /// Encoding the payload arrived in.
        encoding: Encoding,
    },
    /// The strategy answered but with no content.
    Empty,
    /// The strategy failed outright.
    Failed(String),
}

/// One (strategy, outcome) pair in the export attempt log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportAttempt {
    /// Strategy label, e.g. `export:SOURCE` or `direct:download`.
    pub strategy: String,
    /// What happened.
    pub outcome: AttemptOutcome,
}

/// Result of a full export cascade.
///
/// `bytes: None` is a normal terminal outcome meaning the document is
/// unavailable. A transport fault is not `None`; it shows up as a
/// `Failed` entry in the attempt log instead.
#[derive(Debug, Clone)]
pub struct ExportOutcome {
    /// Normalized document bytes, if any strategy produced content.
    pub bytes: Option<Vec<u8>>,
    /// Ordered log of every strategy tried. Diagnostics only.
    pub attempts: Vec<ExportAttempt>,
}

/// Receipt for a successful upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadReceipt {
    /// Workspace path the file landed at.
    pub path: String,
    /// Raw size in bytes.
    pub size: usize,
}

/// Raw authenticated HTTP fallback used when the client API yields nothing.
pub struct DirectExport {
    http: reqwest::Client,
    host: String,
    token: String,
}

impl DirectExport {
    /// Creates a fallback handle for the given workspace.
    pub fn new(host: impl Into<String>, token: impl Into<String>) -> Self {
        let host = host.into();
        Self {
            http: reqwest::Client::new(),
            host: host.trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// GET the export endpoint directly, trying `SOURCE` then `AUTO`, and
    /// base64-decode any `content` field in the JSON response.
    async fn fetch(&self, path: &str, attempts: &mut Vec<ExportAttempt>) -> Option<Vec<u8>> {
        #[derive(Deserialize)]
        struct Body {
            #[serde(default)]
            content: Option<String>,
        }

        let url = format!("{}/api/2.0/workspace/export", self.host);
        for format in DIRECT_FORMATS {
            let strategy = format!("direct:{}", format.as_str());
            let resp = self
                .http
                .get(&url)
                .header("Authorization", format!("Bearer {}", self.token))
                .query(&[("path", path), ("format", format.as_str())])
                .send()
                .await;

            let resp = match resp {
                Ok(r) if r.status().is_success() => r,
                Ok(r) => {
                    attempts.push(ExportAttempt {
                        strategy,
                        outcome: AttemptOutcome::Failed(format!("status {}", r.status())),
                    });
                    continue;
                }
                Err(e) => {
                    attempts.push(ExportAttempt {
                        strategy,
                        outcome: AttemptOutcome::Failed(e.to_string()),
                    });
                    continue;
                }
            };

            let body: Body = match resp.json().await {
                Ok(b) => b,
                Err(e) => {
                    attempts.push(ExportAttempt {
                        strategy,
                        outcome: AttemptOutcome::Failed(e.to_string()),
                    });
                    continue;
                }
            };

            match body.content.as_deref().map(|c| STANDARD.decode(c)) {
                Some(Ok(bytes)) if !bytes.is_empty() => {
                    attempts.push(ExportAttempt {
                        strategy,
                        outcome: AttemptOutcome::Ok {
                            bytes: bytes.len(),
                            encoding: Encoding::Base64,
                        },
                    });
                    return Some(bytes);
                }
                Some(Err(e)) => {
                    attempts.push(ExportAttempt {
                        strategy,
                        outcome: AttemptOutcome::Failed(e.to_string()),
                    });
                }
                _ => {
                    attempts.push(ExportAttempt {
                        strategy,
                        outcome: AttemptOutcome::Empty,
                    });
                }
            }
        }
        None
    }
}

/// Gateway over the remote object store.
///
/// Stateless apart from its client handle: upload encodes through the
/// codec, export runs the format cascade and the direct-download fallback,
/// list applies the silent-empty policy.
pub struct StoreGateway {
    api: Arc<dyn WorkspaceApi>,
    direct: Option<DirectExport>,
}

impl StoreGateway {
    /// Creates a gateway over the given workspace client.
    pub fn new(api: Arc<dyn WorkspaceApi>) -> Self {
        Self { api, direct: None }
    }

    /// Adds the raw authenticated HTTP fallback for exports.
    pub fn with_direct_fallback(
        mut self,
        host: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        self.direct = Some(DirectExport::new(host, token));
        self
    }

    pub(crate) fn api(&self) -> &Arc<dyn WorkspaceApi> {
        &self.api
    }

    /// Uploads raw bytes to `target_path`, letting the server auto-detect
    /// the format.
    pub async fn upload(
        &self,
        bytes: &[u8],
        target_path: &str,
        overwrite: bool,
    ) -> DocbridgeResult<UploadReceipt> {
        let content = encode(bytes);
        self.api
            .import(target_path, &content, ImportFormat::Auto, overwrite)
            .await?;
        info!(path = %target_path, size = bytes.len(), "file uploaded");
        Ok(UploadReceipt {
            path: target_path.to_string(),
            size: bytes.len(),
        })
    }

    /// Creates a notebook at `path` from the given source text.
    pub async fn create_notebook(
        &self,
        path: &str,
        source: &str,
    ) -> DocbridgeResult<UploadReceipt> {
        self.upload(source.as_bytes(), path, true).await
    }

    /// Fetches the document at `path`, normalized to raw bytes.
    ///
    /// Runs the ordered fallback protocol: a `SOURCE` attempt for
    /// recognized PDF paths, then the full format cascade, then the
    /// direct-download path. Exhausting every strategy yields
    /// `bytes: None`; this method never returns an error.
    pub async fn export(&self, path: &str) -> ExportOutcome {
        let mut attempts = Vec::new();

        if is_pdf_path(path) {
            if let Some(bytes) = self
                .try_format(path, ExportFormat::Source, &mut attempts)
                .await
            {
                return ExportOutcome {
                    bytes: Some(bytes),
                    attempts,
                };
            }
        }

        for format in EXPORT_CASCADE {
            if let Some(bytes) = self.try_format(path, format, &mut attempts).await {
                return ExportOutcome {
                    bytes: Some(bytes),
                    attempts,
                };
            }
        }

        if let Some(bytes) = self.try_download(path, &mut attempts).await {
            return ExportOutcome {
                bytes: Some(bytes),
                attempts,
            };
        }

        if let Some(direct) = &self.direct {
            if let Some(bytes) = direct.fetch(path, &mut attempts).await {
                return ExportOutcome {
                    bytes: Some(bytes),
                    attempts,
                };
            }
        }

        warn!(path = %path, attempts = attempts.len(), "export exhausted every strategy");
        ExportOutcome {
            bytes: None,
            attempts,
        }
    }

    async fn try_format(
        &self,
        path: &str,
        format: ExportFormat,
        attempts: &mut Vec<ExportAttempt>,
    ) -> Option<Vec<u8>> {
        let strategy = format!("export:{}", format.as_str());
        match self.api.export(path, format).await {
            Ok(Some(payload)) if !payload.is_empty() => {
                let decoded = decode(payload);
                if decoded.bytes.is_empty() {
                    attempts.push(ExportAttempt {
                        strategy,
                        outcome: AttemptOutcome::Empty,
                    });
                    None
                } else {
                    debug!(
                        path = %path,
                        format = format.as_str(),
                        size = decoded.bytes.len(),
                        "export succeeded"
                    );
                    attempts.push(ExportAttempt {
                        strategy,
                        outcome: AttemptOutcome::Ok {
                            bytes: decoded.bytes.len(),
                            encoding: decoded.encoding,
                        },
                    });
                    Some(decoded.bytes)
                }
            }
            Ok(_) => {
                attempts.push(ExportAttempt {
                    strategy,
                    outcome: AttemptOutcome::Empty,
                });
                None
            }
            Err(e) => {
                attempts.push(ExportAttempt {
                    strategy,
                    outcome: AttemptOutcome::Failed(e.to_string()),
                });
                None
            }
        }
    }

    async fn try_download(
        &self,
        path: &str,
        attempts: &mut Vec<ExportAttempt>,
    ) -> Option<Vec<u8>> {
        let strategy = "direct:download".to_string();
        match self.api.download(path).await {
            Ok(Some(bytes)) if !bytes.is_empty() => {
                attempts.push(ExportAttempt {
                    strategy,
                    outcome: AttemptOutcome::Ok {
                        bytes: bytes.len(),
                        encoding: Encoding::Binary,
                    },
                });
                Some(bytes)
            }
            Ok(_) => {
                attempts.push(ExportAttempt {
                    strategy,
                    outcome: AttemptOutcome::Empty,
                });
                None
            }
            Err(e) => {
                attempts.push(ExportAttempt {
                    strategy,
                    outcome: AttemptOutcome::Failed(e.to_string()),
                });
                None
            }
        }
    }

    /// Lists the directory at `path`.
    ///
    /// On any failure this returns an empty vec; callers cannot distinguish
    /// an empty directory from a failed listing. Accepted ambiguity.
    pub async fn list(&self, path: &str) -> Vec<ObjectEntry> {
        match self.api.list(path).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %path, error = %e, "workspace listing failed");
                Vec::new()
            }
        }
    }
}

/// True when the path carries a recognized PDF extension.
pub fn is_pdf_path(path: &str) -> bool {
    path.to_ascii_lowercase().ends_with(".pdf")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_path_recognition() {
        assert!(is_pdf_path("/Shared/docs/report.pdf"));
        assert!(is_pdf_path("/Shared/docs/REPORT.PDF"));
        assert!(!is_pdf_path("/Shared/docs/report.html"));
        assert!(!is_pdf_path("/Shared/docs/pdf"));
    }
}
