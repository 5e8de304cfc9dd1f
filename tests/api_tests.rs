//! End-to-end API tests over the in-process backends: `MemoryStore` for
//! documents and `LocalBlobStore` (degraded mode) for blobs.

use axum::http::StatusCode;
use axum::Router;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use serde_json::{json, Value};
use std::sync::Arc;
use stash_server::{api_routes, common_routes, AppState, LocalBlobStore, MemoryStore};
use tempfile::TempDir;

const ALL_TOKENS: [&str; 9] = [
    "files",
    "notes",
    "projects",
    "contacts",
    "python",
    "javascript",
    "html",
    "css",
    "other",
];

fn server() -> (TestServer, TempDir) {
    let scratch = TempDir::new().expect("scratch dir");
    let state = AppState::new(
        Arc::new(MemoryStore::new()),
        Arc::new(LocalBlobStore::new(scratch.path().to_path_buf())),
    );
    let app = Router::new()
        .merge(common_routes(state.clone()))
        .nest("/api", api_routes(state));
    (TestServer::new(app).expect("test server"), scratch)
}

fn upload_form(file_name: &str, bytes: &[u8]) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(bytes.to_vec())
            .file_name(file_name.to_string())
            .mime_type("text/plain"),
    )
}

#[tokio::test]
async fn health_and_ready() {
    let (server, _scratch) = server();
    assert_eq!(server.get("/health").await.status_code(), StatusCode::OK);
    assert_eq!(server.get("/ready").await.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn create_then_list_for_every_token() {
    let (server, _scratch) = server();
    for token in ALL_TOKENS {
        let res = server
            .post(&format!("/api/{}", token))
            .json(&json!({"name": "x"}))
            .await;
        assert_eq!(res.status_code(), StatusCode::CREATED, "token {}", token);
        let created: Value = res.json();
        let id = created["id"].as_str().unwrap();
        assert!(!id.is_empty());

        let listed: Vec<Value> = server.get(&format!("/api/{}", token)).await.json();
        assert!(
            listed.iter().any(|d| d["id"] == created["id"]),
            "token {}",
            token
        );
    }
}

#[tokio::test]
async fn list_is_newest_first() {
    let (server, _scratch) = server();
    for i in 0..4 {
        let res = server
            .post("/api/notes")
            .json(&json!({"title": format!("n{}", i)}))
            .await;
        assert_eq!(res.status_code(), StatusCode::CREATED);
    }
    let listed: Vec<Value> = server.get("/api/notes").await.json();
    let titles: Vec<&str> = listed.iter().map(|d| d["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["n3", "n2", "n1", "n0"]);
}

#[tokio::test]
async fn unknown_token_is_404_naming_it() {
    let (server, _scratch) = server();
    let res = server.get("/api/widgets").await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    let body: Value = res.json();
    assert!(body["error"].as_str().unwrap().contains("widgets"));

    let res = server.post("/api/widgets").json(&json!({})).await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    let res = server.put("/api/widgets/1").json(&json!({})).await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    let res = server.delete("/api/widgets/1").await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);

    let res = server.get("/api/codes/ruby").await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    let body: Value = res.json();
    assert!(body["error"].as_str().unwrap().contains("ruby"));
}

#[tokio::test]
async fn malformed_json_body_gets_error_envelope() {
    let (server, _scratch) = server();
    let res = server
        .post("/api/notes")
        .add_header(
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderValue::from_static("application/json"),
        )
        .bytes("{not json".into())
        .await;
    assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json();
    assert!(body["error"].as_str().unwrap().contains("JSON"));

    // Valid JSON that is not an object goes through the same envelope.
    let res = server.post("/api/notes").json(&json!([1, 2, 3])).await;
    assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json();
    assert!(body["error"].as_str().unwrap().contains("object"));

    let listed: Vec<Value> = server.get("/api/notes").await.json();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn oversized_upload_is_rejected_without_record() {
    let (server, _scratch) = server();
    // One byte past the 50 MiB cap.
    let oversized = vec![0u8; stash_server::MAX_UPLOAD_BYTES + 1];
    let res = server
        .post("/api/files/upload")
        .multipart(upload_form("big.bin", &oversized))
        .await;
    assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json();
    assert!(!body["error"].as_str().unwrap().is_empty());

    let listed: Vec<Value> = server.get("/api/files").await.json();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn note_round_trip() {
    let (server, _scratch) = server();
    let res = server
        .post("/api/notes")
        .json(&json!({"title": "t", "content": "c"}))
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);

    let listed: Vec<Value> = server.get("/api/notes").await.json();
    assert_eq!(listed.len(), 1);
    let note = &listed[0];
    assert_eq!(note["title"], "t");
    assert_eq!(note["content"], "c");
    assert_eq!(note["id"].as_str().unwrap().len(), 36);
    assert!(chrono::DateTime::parse_from_rfc3339(note["date"].as_str().unwrap()).is_ok());
}

#[tokio::test]
async fn update_is_idempotent_and_preserves_fields() {
    let (server, _scratch) = server();
    let created: Value = server
        .post("/api/notes")
        .json(&json!({"title": "t", "content": "c"}))
        .await
        .json();
    let id = created["id"].as_str().unwrap();

    let first: Value = server
        .put(&format!("/api/notes/{}", id))
        .json(&json!({"content": "c2"}))
        .await
        .json();
    let res = server
        .put(&format!("/api/notes/{}", id))
        .json(&json!({"content": "c2"}))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let second: Value = res.json();
    assert_eq!(first, second);
    assert_eq!(second["title"], "t");
    assert_eq!(second["content"], "c2");
    assert_eq!(second["date"], created["date"]);
}

#[tokio::test]
async fn delete_then_further_writes_are_404() {
    let (server, _scratch) = server();
    let created: Value = server
        .post("/api/projects")
        .json(&json!({"name": "p"}))
        .await
        .json();
    let id = created["id"].as_str().unwrap();

    let res = server.delete(&format!("/api/projects/{}", id)).await;
    assert_eq!(res.status_code(), StatusCode::NO_CONTENT);

    let res = server.delete(&format!("/api/projects/{}", id)).await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    let res = server
        .put(&format!("/api/projects/{}", id))
        .json(&json!({"name": "q"}))
        .await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn activity_log_caps_at_twenty_newest_first() {
    let (server, _scratch) = server();
    for i in 0..25 {
        let res = server
            .post("/api/activity")
            .json(&json!({"action": "create", "itemType": "note", "itemName": format!("n{}", i)}))
            .await;
        assert_eq!(res.status_code(), StatusCode::CREATED);
    }
    let entries: Vec<Value> = server.get("/api/activity").await.json();
    assert_eq!(entries.len(), 20);
    assert_eq!(entries[0]["itemName"], "n24");
    assert_eq!(entries[19]["itemName"], "n5");

    let res = server.delete("/api/activity").await;
    assert_eq!(res.status_code(), StatusCode::NO_CONTENT);
    let entries: Vec<Value> = server.get("/api/activity").await.json();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn upload_without_file_part_creates_nothing() {
    let (server, _scratch) = server();
    let form = MultipartForm::new().add_text("title", "no file here");
    let res = server.post("/api/files/upload").multipart(form).await;
    assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json();
    assert!(body["error"].as_str().unwrap().contains("file"));

    let listed: Vec<Value> = server.get("/api/files").await.json();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn upload_persists_metadata_only() {
    let (server, scratch) = server();
    let res = server
        .post("/api/files/upload")
        .multipart(upload_form("readme.txt", b"hello world"))
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);
    let doc: Value = res.json();
    assert_eq!(doc["originalname"], "readme.txt");
    assert_eq!(doc["title"], "readme.txt");
    assert_eq!(doc["mimetype"], "text/plain");
    assert_eq!(doc["size"], 11);
    let key = doc["filename"].as_str().unwrap();
    assert!(key.ends_with("readme.txt"));

    // Bytes live in the blob store, not the record.
    let on_disk = std::fs::read(scratch.path().join(key)).unwrap();
    assert_eq!(on_disk, b"hello world");
}

#[tokio::test]
async fn upload_honors_title_and_description() {
    let (server, _scratch) = server();
    let form = upload_form("data.bin", &[0u8; 16])
        .add_text("title", "my data")
        .add_text("description", "raw bytes");
    let doc: Value = server.post("/api/files/upload").multipart(form).await.json();
    assert_eq!(doc["title"], "my data");
    assert_eq!(doc["description"], "raw bytes");
}

#[tokio::test]
async fn download_missing_id_is_404_not_redirect() {
    let (server, _scratch) = server();
    let res = server.get("/api/files/download/no-such-id").await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn download_in_degraded_mode_is_config_error() {
    let (server, _scratch) = server();
    let doc: Value = server
        .post("/api/files/upload")
        .multipart(upload_form("a.txt", b"a"))
        .await
        .json();
    let id = doc["id"].as_str().unwrap();
    let res = server.get(&format!("/api/files/download/{}", id)).await;
    assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json();
    assert!(body["error"].as_str().unwrap().contains("not configured"));
}

#[tokio::test]
async fn file_delete_survives_blob_delete_failure() {
    // LocalBlobStore refuses delete_object; the record delete must proceed.
    let (server, _scratch) = server();
    let doc: Value = server
        .post("/api/files/upload")
        .multipart(upload_form("a.txt", b"a"))
        .await
        .json();
    let id = doc["id"].as_str().unwrap();

    let res = server.delete(&format!("/api/files/{}", id)).await;
    assert_eq!(res.status_code(), StatusCode::NO_CONTENT);
    let listed: Vec<Value> = server.get("/api/files").await.json();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn nested_and_flat_code_routes_agree() {
    let (server, _scratch) = server();
    let created: Value = server
        .post("/api/codes/python")
        .json(&json!({"title": "fib", "content": "def fib(n): ..."}))
        .await
        .json();
    let id = created["id"].as_str().unwrap();

    let flat: Vec<Value> = server.get("/api/python").await.json();
    let nested: Vec<Value> = server.get("/api/codes/python").await.json();
    assert_eq!(flat, nested);
    assert_eq!(flat.len(), 1);

    let updated: Value = server
        .put(&format!("/api/python/{}", id))
        .json(&json!({"title": "fibonacci"}))
        .await
        .json();
    assert_eq!(updated["title"], "fibonacci");
    assert_eq!(updated["content"], "def fib(n): ...");

    let res = server.delete(&format!("/api/codes/python/{}", id)).await;
    assert_eq!(res.status_code(), StatusCode::NO_CONTENT);
    let flat: Vec<Value> = server.get("/api/python").await.json();
    assert!(flat.is_empty());
}

#[tokio::test]
async fn unsupplied_id_is_generated_and_supplied_id_is_kept() {
    let (server, _scratch) = server();
    let generated: Value = server
        .post("/api/contacts")
        .json(&json!({"name": "Ada"}))
        .await
        .json();
    assert_eq!(generated["id"].as_str().unwrap().len(), 36);

    let supplied: Value = server
        .post("/api/contacts")
        .json(&json!({"id": "contact-1", "name": "Grace"}))
        .await
        .json();
    assert_eq!(supplied["id"], "contact-1");
}
