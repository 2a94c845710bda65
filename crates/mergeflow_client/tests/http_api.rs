//! `HttpApi` against an in-process axum stub of the documents API.

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::routing::{delete, get, put};
use axum::{Json, Router};
use mergeflow_client::{
    ApiError, ApiRequest, HttpApi, MutationOutcome, Orchestrator, OrchestratorSettings,
    RecordingNotifier, RestApi,
};
use mergeflow_core::CurrentUser;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

async fn list_documents(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    Json(json!([{
        "_id": "d1",
        "name": "plan.txt",
        "type": "txt",
        "teamId": params.get("teamId"),
        "sharedWith": [],
    }]))
}

async fn get_document(Path(id): Path<String>) -> Json<Value> {
    Json(json!({ "_id": id, "name": "echo", "type": "folder" }))
}

async fn favorite(Path(id): Path<String>, Json(body): Json<Value>) -> Json<Value> {
    Json(json!({ "id": id, "received": body }))
}

async fn delete_member(Path(id): Path<String>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "error": format!("cannot delete {}", id) })),
    )
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_millis(500)).await;
    "late"
}

async fn no_content() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn plain_text() -> &'static str {
    "pong"
}

/// Serve the stub on an ephemeral port; returns the API base URL.
async fn spawn_stub() -> String {
    let app = Router::new()
        .route("/api/documents", get(list_documents))
        .route("/api/documents/:id", get(get_document))
        .route("/api/documents/:id/favorite", put(favorite))
        .route("/api/members/:id", delete(delete_member))
        .route("/api/slow", get(slow))
        .route("/api/empty", get(no_content))
        .route("/api/ping", get(plain_text));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub");
    let addr = listener.local_addr().expect("stub addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve stub");
    });
    format!("http://{}/api/", addr)
}

fn client(base: &str, timeout: Duration) -> HttpApi {
    HttpApi::new(base, timeout).expect("http api")
}

#[tokio::test]
async fn get_sends_query_and_decodes_json() {
    let api = client(&spawn_stub().await, Duration::from_secs(5));

    let response = api
        .send(ApiRequest::get(["documents"]).with_query("teamId", "t 1"))
        .await
        .expect("send");

    assert_eq!(response.status, 200);
    assert_eq!(response.body[0]["teamId"], "t 1");
}

#[tokio::test]
async fn path_segments_are_encoded() {
    let api = client(&spawn_stub().await, Duration::from_secs(5));

    let response = api
        .send(ApiRequest::get(["documents", "a b"]))
        .await
        .expect("send");

    assert_eq!(response.body["_id"], "a b");
}

#[tokio::test]
async fn put_carries_json_body() {
    let api = client(&spawn_stub().await, Duration::from_secs(5));
    let request = ApiRequest::put(["documents", "d1", "favorite"])
        .with_json(&json!({ "isFavorited": true }))
        .expect("body");

    let response = api.send(request).await.expect("send");

    assert_eq!(response.status, 200);
    assert_eq!(response.body["id"], "d1");
    assert_eq!(response.body["received"]["isFavorited"], true);
}

#[tokio::test]
async fn error_status_is_data_until_checked() {
    let api = client(&spawn_stub().await, Duration::from_secs(5));

    let response = api
        .send(ApiRequest::delete(["members", "m1"]).with_query("teamId", "t1"))
        .await
        .expect("send");
    assert_eq!(response.status, 403);
    assert_eq!(response.error_message(), Some("cannot delete m1"));

    match response.expect_status(200) {
        Err(ApiError::UnexpectedStatus { status, message }) => {
            assert_eq!(status, 403);
            assert_eq!(message, "cannot delete m1");
        }
        other => panic!("expected unexpected status, got {:?}", other),
    }
}

#[tokio::test]
async fn empty_and_text_bodies_are_preserved() {
    let api = client(&spawn_stub().await, Duration::from_secs(5));

    let empty = api.send(ApiRequest::get(["empty"])).await.expect("send");
    assert_eq!(empty.status, 204);
    assert_eq!(empty.body, Value::Null);

    let text = api.send(ApiRequest::get(["ping"])).await.expect("send");
    assert_eq!(text.body, Value::String("pong".to_string()));
}

#[tokio::test]
async fn slow_response_times_out() {
    let api = client(&spawn_stub().await, Duration::from_millis(50));

    let err = api
        .send(ApiRequest::get(["slow"]))
        .await
        .expect_err("timeout");

    assert!(matches!(err, ApiError::Timeout(50)), "{:?}", err);
}

#[tokio::test]
async fn unreachable_server_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let api = client(&format!("http://{}/api", addr), Duration::from_secs(2));

    let err = api
        .send(ApiRequest::get(["documents"]))
        .await
        .expect_err("closed port");

    assert!(matches!(err, ApiError::Transport(_)), "{:?}", err);
}

#[tokio::test]
async fn orchestrator_round_trip_over_http() {
    let base = spawn_stub().await;
    let api = Arc::new(client(&base, Duration::from_secs(5)));
    let notifier = Arc::new(RecordingNotifier::new());
    let user = CurrentUser::new("lead@team.io", "admin").with_team("t1");
    let settings = OrchestratorSettings {
        request_timeout: Duration::from_secs(5),
        ..OrchestratorSettings::default()
    };
    let orchestrator = Orchestrator::new(api, user, settings).with_notifier(notifier.clone());

    let listing = orchestrator.load_documents().await;
    let docs = listing.data.expect("documents");
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].team_id.as_deref(), Some("t1"));

    let outcome = orchestrator.toggle_favorite("d1").await;

    assert_eq!(outcome, MutationOutcome::Succeeded);
    assert_eq!(notifier.texts(), ["Document favorited!"]);
}
