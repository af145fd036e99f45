#![allow(clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use docbridge_codec::TransportPayload;
use docbridge_core::{DocbridgeError, DocbridgeResult, Turn};
use docbridge_engine::{Completion, CompletionBackend, QueryEngine};
use docbridge_session::ConversationStore;
use docbridge_workspace::{
    ExportFormat, ImportFormat, ObjectEntry, StatementResponse, StoreGateway, Warehouse,
    WorkspaceApi,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Workspace API backed by an in-memory path → base64-content map.
#[derive(Default)]
struct MemoryApi {
    files: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl WorkspaceApi for MemoryApi {
    async fn current_user(&self) -> DocbridgeResult<String> {
        Ok("tester@example.com".to_string())
    }

    async fn import(
        &self,
        path: &str,
        content: &str,
        _format: ImportFormat,
        _overwrite: bool,
    ) -> DocbridgeResult<()> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), content.to_string());
        Ok(())
    }

    async fn export(
        &self,
        path: &str,
        _format: ExportFormat,
    ) -> DocbridgeResult<Option<TransportPayload>> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .map(TransportPayload::Text))
    }

    async fn download(&self, _path: &str) -> DocbridgeResult<Option<Vec<u8>>> {
        Ok(None)
    }

    async fn list(&self, _path: &str) -> DocbridgeResult<Vec<ObjectEntry>> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .keys()
            .map(|path| ObjectEntry {
                path: path.clone(),
                object_type: "FILE".to_string(),
                language: None,
            })
            .collect())
    }

    async fn list_warehouses(&self) -> DocbridgeResult<Vec<Warehouse>> {
        Ok(Vec::new())
    }

    async fn execute_statement(
        &self,
        _warehouse_id: &str,
        _sql: &str,
        _wait_timeout: &str,
    ) -> DocbridgeResult<StatementResponse> {
        Err(DocbridgeError::Workspace("not supported".to_string()))
    }
}

/// Backend that records what it was handed and answers deterministically.
#[derive(Default)]
struct RecordingBackend {
    /// (document length, history length) per call.
    calls: Mutex<Vec<(usize, usize)>>,
}

#[async_trait]
impl CompletionBackend for RecordingBackend {
    async fn complete(
        &self,
        document: &[u8],
        _question: &str,
        history: &[Turn],
    ) -> DocbridgeResult<Completion> {
        let mut calls = self.calls.lock().unwrap();
        calls.push((document.len(), history.len()));
        Ok(Completion {
            answer: format!("answer {}", calls.len()),
            metadata: HashMap::from([("model".to_string(), serde_json::json!("recording"))]),
        })
    }
}

struct FailingBackend;

#[async_trait]
impl CompletionBackend for FailingBackend {
    async fn complete(
        &self,
        _document: &[u8],
        _question: &str,
        _history: &[Turn],
    ) -> DocbridgeResult<Completion> {
        Err(DocbridgeError::Completion("backend down".to_string()))
    }
}

fn pdf_bytes(len: usize) -> Vec<u8> {
    let mut bytes = b"%PDF-1.7\n".to_vec();
    while bytes.len() < len {
        bytes.push((bytes.len() % 251) as u8);
    }
    bytes.truncate(len);
    bytes
}

struct Fixture {
    gateway: Arc<StoreGateway>,
    store: Arc<ConversationStore>,
    backend: Arc<RecordingBackend>,
    engine: QueryEngine,
}

fn fixture() -> Fixture {
    let api = Arc::new(MemoryApi::default());
    let gateway = Arc::new(StoreGateway::new(api));
    let store = Arc::new(ConversationStore::new());
    let backend = Arc::new(RecordingBackend::default());
    let engine = QueryEngine::new(gateway.clone(), store.clone(), backend.clone());
    Fixture {
        gateway,
        store,
        backend,
        engine,
    }
}

#[tokio::test]
async fn test_upload_then_export_round_trips() {
    let f = fixture();
    let original = pdf_bytes(1000);

    f.gateway
        .upload(&original, "/Shared/docbridge/doc.pdf", true)
        .await
        .unwrap();

    let outcome = f.gateway.export("/Shared/docbridge/doc.pdf").await;
    assert_eq!(outcome.bytes.unwrap(), original);
}

#[tokio::test]
async fn test_query_mints_a_fresh_conversation_id() {
    let f = fixture();
    f.gateway
        .upload(&pdf_bytes(100), "/Shared/docbridge/doc.pdf", true)
        .await
        .unwrap();

    let reply = f
        .engine
        .query("/Shared/docbridge/doc.pdf", "What is this?", None)
        .await
        .unwrap();

    Uuid::parse_str(&reply.conversation_id).unwrap();
    assert_eq!(reply.answer, "answer 1");
}

#[tokio::test]
async fn test_second_query_carries_prior_history() {
    let f = fixture();
    let original = pdf_bytes(1000);
    f.gateway
        .upload(&original, "/Shared/docbridge/doc.pdf", true)
        .await
        .unwrap();

    let first = f
        .engine
        .query("/Shared/docbridge/doc.pdf", "What is this?", None)
        .await
        .unwrap();
    let second = f
        .engine
        .query(
            "/Shared/docbridge/doc.pdf",
            "Summarize it.",
            Some(first.conversation_id.clone()),
        )
        .await
        .unwrap();

    assert_eq!(second.conversation_id, first.conversation_id);

    let history = f.engine.history(&first.conversation_id).await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].question, "What is this?");
    assert_eq!(history[1].question, "Summarize it.");

    // The backend saw the full document both times, and exactly one prior
    // turn on the second call.
    let calls = f.backend.calls.lock().unwrap().clone();
    assert_eq!(calls, vec![(1000, 0), (1000, 1)]);
}

#[tokio::test]
async fn test_missing_document_fails_without_touching_the_backend() {
    let f = fixture();

    let err = f
        .engine
        .query("/Shared/docbridge/missing.pdf", "What is this?", None)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("document content not found"));
    assert!(f.backend.calls.lock().unwrap().is_empty());
    assert!(f.store.is_empty().await);
}

#[tokio::test]
async fn test_backend_failure_records_no_turn() {
    let api = Arc::new(MemoryApi::default());
    let gateway = Arc::new(StoreGateway::new(api));
    let store = Arc::new(ConversationStore::new());
    let engine = QueryEngine::new(gateway.clone(), store.clone(), Arc::new(FailingBackend));

    gateway
        .upload(&pdf_bytes(100), "/Shared/docbridge/doc.pdf", true)
        .await
        .unwrap();

    let err = engine
        .query(
            "/Shared/docbridge/doc.pdf",
            "What is this?",
            Some("conv-1".to_string()),
        )
        .await
        .unwrap_err();

    assert!(err.to_string().contains("backend down"));
    assert!(engine.history("conv-1").await.is_empty());
}

#[tokio::test]
async fn test_clear_through_the_engine() {
    let f = fixture();
    f.gateway
        .upload(&pdf_bytes(100), "/Shared/docbridge/doc.pdf", true)
        .await
        .unwrap();

    let reply = f
        .engine
        .query("/Shared/docbridge/doc.pdf", "q", None)
        .await
        .unwrap();

    assert!(f.engine.clear(&reply.conversation_id).await);
    assert!(f.engine.history(&reply.conversation_id).await.is_empty());
    // Clearing again is a harmless no-op.
    assert!(!f.engine.clear(&reply.conversation_id).await);
}
