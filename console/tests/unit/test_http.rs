//! HTTP client against an in-process backend

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use url::Url;

use bcdeploy::errors::ConsoleError;
use bcdeploy::http::client::HttpClient;
use bcdeploy::http::deployments::{DeploymentsApi, UploadFile, UploadRequest, UPLOAD_FILE_FIELD};
use bcdeploy::http::projects::ProjectsApi;
use openapi_client::models::{DeploymentStatus, ManualStatus, ProjectInput, ProjectPatch};

#[derive(Debug, Clone, PartialEq)]
struct Seen {
    method: &'static str,
    path: String,
    body: Value,
}

#[derive(Clone, Default)]
struct Backend {
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl Backend {
    fn record(&self, method: &'static str, path: String, body: Value) {
        self.seen.lock().unwrap().push(Seen { method, path, body });
    }

    fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

async fn list_projects(State(backend): State<Backend>) -> Json<Value> {
    backend.record("GET", "/api/projects".to_string(), Value::Null);
    Json(json!([
        {
            "_id": "p1",
            "projectName": "Acme",
            "tenantId": "t1",
            "clientId": "c1",
            "clientSecret": "hunter2",
            "environment": "Prod",
            "notificationEmails": ["ops@acme.io"],
            "createdAt": "2025-01-01T00:00:00Z"
        },
        { "_id": "p2", "projectName": "Globex", "tenantId": "t2", "clientId": "c2", "environment": "Sandbox" }
    ]))
}

async fn create_project(State(backend): State<Backend>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    backend.record("POST", "/api/projects".to_string(), body.clone());
    let mut project = body;
    project["_id"] = json!("p3");
    (StatusCode::CREATED, Json(json!({ "project": project })))
}

async fn update_project(
    State(backend): State<Backend>,
    Path(tenant): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    backend.record("PUT", format!("/api/projects/{}", tenant), body.clone());
    Json(json!({
        "project": {
            "_id": "p1",
            "projectName": body["projectName"],
            "tenantId": tenant,
            "clientId": "c1",
            "environment": "Prod"
        }
    }))
}

async fn delete_project(State(backend): State<Backend>, Path(tenant): Path<String>) -> StatusCode {
    backend.record("DELETE", format!("/api/projects/{}", tenant), Value::Null);
    StatusCode::NO_CONTENT
}

async fn upload(State(backend): State<Backend>, mut multipart: Multipart) -> Json<Value> {
    let mut fields = BTreeMap::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.unwrap();
        fields.insert(
            name,
            json!({ "fileName": file_name, "text": String::from_utf8_lossy(&bytes) }),
        );
    }
    backend.record(
        "POST",
        "/api/deployments/upload-and-deploy".to_string(),
        json!(fields),
    );
    Json(json!({ "message": "Deployment started", "deploymentId": "dep-42", "status": "pending" }))
}

async fn get_deployment(State(backend): State<Backend>, Path(id): Path<String>) -> Response {
    backend.record("GET", format!("/api/deployments/{}", id), Value::Null);
    match id.as_str() {
        "missing" => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Deployment not found" })),
        )
            .into_response(),
        "boom" => (StatusCode::BAD_GATEWAY, "<html>bad gateway</html>").into_response(),
        _ => Json(json!({
            "status": "running",
            "logs": ["uploaded", "installing"],
            "uploadSystemId": "sys-1",
            "createdAt": "2025-06-01T08:30:00.000Z",
            "retryCount": 1,
            "extensionInfo": { "name": "Ext", "publisher": "Acme", "version": "1.0.0.0" }
        }))
        .into_response(),
    }
}

async fn update_status(
    State(backend): State<Backend>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    backend.record("PATCH", format!("/api/deployments/{}/status", id), body);
    Json(json!({ "message": "Status updated" }))
}

async fn spawn_backend() -> (HttpClient, Backend) {
    let backend = Backend::default();
    let app = Router::new()
        .route("/api/projects", get(list_projects).post(create_project))
        .route("/api/projects/{tenant}", put(update_project).delete(delete_project))
        .route("/api/deployments/upload-and-deploy", post(upload))
        .route("/api/deployments/{id}", get(get_deployment))
        .route("/api/deployments/{id}/status", patch(update_status))
        .with_state(backend.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let base_url = Url::parse(&format!("http://{}", addr)).unwrap();
    (HttpClient::new(&base_url).unwrap(), backend)
}

fn upload_request(schedule_time_iso: Option<&str>) -> UploadRequest {
    UploadRequest {
        project_id: "p1".to_string(),
        environment_name: "Prod".to_string(),
        file: UploadFile {
            file_name: "ext.app".to_string(),
            bytes: b"NAVX-package".to_vec(),
        },
        schedule_time_iso: schedule_time_iso.map(str::to_string),
    }
}

#[tokio::test]
async fn test_list_projects_drops_echoed_secret() {
    let (client, backend) = spawn_backend().await;

    let projects = client.list_projects().await.unwrap();
    assert_eq!(projects.len(), 2);
    assert_eq!(projects[0].id, "p1");
    assert_eq!(projects[0].notification_emails, Some(vec!["ops@acme.io".to_string()]));
    assert!(projects[1].created_at.is_none());
    assert!(!format!("{:?}", projects).contains("hunter2"));
    assert_eq!(backend.seen()[0].method, "GET");
}

#[tokio::test]
async fn test_create_project_sends_secret_and_unwraps_envelope() {
    let (client, backend) = spawn_backend().await;
    let input = ProjectInput {
        project_name: "Initech".to_string(),
        tenant_id: "t3".to_string(),
        client_id: "c3".to_string(),
        client_secret: SecretString::from("s3cret".to_string()),
        environment: "Prod".to_string(),
        company_id: None,
        company_name: None,
        notification_emails: Some(vec!["a@x.io".to_string(), "b@x.io".to_string()]),
        deployment_retry_wait_minutes: Some(10),
        max_deployment_retries: Some(3),
    };

    let created = client.create_project(&input).await.unwrap();
    assert_eq!(created.id, "p3");
    assert_eq!(created.tenant_id, "t3");

    let seen = backend.seen();
    assert_eq!(seen[0].method, "POST");
    assert_eq!(seen[0].body["clientSecret"], "s3cret");
    assert_eq!(seen[0].body["notificationEmails"], json!(["a@x.io", "b@x.io"]));
    assert!(seen[0].body.get("companyId").is_none());
}

#[tokio::test]
async fn test_update_project_encodes_tenant_and_omits_blank_secret() {
    let (client, backend) = spawn_backend().await;
    let patch = ProjectPatch {
        project_name: Some("Acme Corp".to_string()),
        ..Default::default()
    };

    let updated = client
        .update_project_by_tenant_id("tenant/with space", &patch)
        .await
        .unwrap();
    assert_eq!(updated.project_name, "Acme Corp");
    assert_eq!(updated.tenant_id, "tenant/with space");

    let seen = backend.seen();
    assert_eq!(seen[0].method, "PUT");
    assert_eq!(seen[0].path, "/api/projects/tenant/with space");
    assert_eq!(seen[0].body, json!({ "projectName": "Acme Corp" }));
}

#[tokio::test]
async fn test_delete_project_accepts_empty_response() {
    let (client, backend) = spawn_backend().await;
    tokio_test::assert_ok!(client.delete_project_by_tenant_id("t2").await);
    assert_eq!(backend.seen()[0].method, "DELETE");
    assert_eq!(backend.seen()[0].path, "/api/projects/t2");
}

#[tokio::test]
async fn test_upload_sends_multipart_fields() {
    let (client, backend) = spawn_backend().await;

    let response = client.upload_and_deploy(upload_request(None)).await.unwrap();
    assert_eq!(response.deployment_id, "dep-42");
    assert_eq!(response.status, DeploymentStatus::Pending);
    assert!(response.schedule_time.is_none());

    let fields = &backend.seen()[0].body;
    assert_eq!(fields["projectId"]["text"], "p1");
    assert_eq!(fields["environmentName"]["text"], "Prod");
    assert_eq!(fields[UPLOAD_FILE_FIELD]["fileName"], "ext.app");
    assert_eq!(fields[UPLOAD_FILE_FIELD]["text"], "NAVX-package");
    assert!(fields.get("scheduleTime").is_none());
}

#[tokio::test]
async fn test_upload_includes_schedule_time() {
    let (client, backend) = spawn_backend().await;

    client
        .upload_and_deploy(upload_request(Some("2025-06-01T08:30:00.000Z")))
        .await
        .unwrap();
    let fields = &backend.seen()[0].body;
    assert_eq!(fields["scheduleTime"]["text"], "2025-06-01T08:30:00.000Z");
}

#[tokio::test]
async fn test_get_deployment() {
    let (client, _backend) = spawn_backend().await;

    let deployment = client.get_deployment("dep-42").await.unwrap();
    assert_eq!(deployment.status, DeploymentStatus::Running);
    assert_eq!(deployment.logs, vec!["uploaded", "installing"]);
    assert_eq!(deployment.retry_count, 1);
    assert_eq!(
        deployment.extension_info.and_then(|e| e.name).as_deref(),
        Some("Ext")
    );
    assert!(deployment.verification_check_time.is_none());
}

#[tokio::test]
async fn test_error_message_comes_from_body() {
    let (client, _backend) = spawn_backend().await;

    let err = tokio_test::assert_err!(client.get_deployment("missing").await);
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.user_message("Failed to load deployment"), "Deployment not found");
}

#[tokio::test]
async fn test_error_without_json_body_uses_status_text() {
    let (client, _backend) = spawn_backend().await;

    let err = client.get_deployment("boom").await.unwrap_err();
    match &err {
        ConsoleError::ApiError { status, message, body } => {
            assert_eq!(*status, 502);
            assert!(message.is_none());
            assert!(body.contains("bad gateway"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(
        err.user_message("Failed to load deployment"),
        "Request failed with status code 502"
    );
}

#[tokio::test]
async fn test_update_deployment_status_body() {
    let (client, backend) = spawn_backend().await;

    client
        .update_deployment_status("dep-42", ManualStatus::Failed)
        .await
        .unwrap();
    let seen = backend.seen();
    assert_eq!(seen[0].method, "PATCH");
    assert_eq!(seen[0].path, "/api/deployments/dep-42/status");
    assert_eq!(seen[0].body, json!({ "status": "failed" }));
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    // nothing listens on the discard port
    let client = HttpClient::new(&Url::parse("http://127.0.0.1:9").unwrap()).unwrap();
    let err = client.list_projects().await.unwrap_err();
    assert!(matches!(err, ConsoleError::HttpError(_)));
    assert!(err.status().is_none());
}
