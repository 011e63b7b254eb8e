//! Integration tests for the staffdb-ingest HTTP surface
//!
//! Tests cover:
//! - Upload form page
//! - POST /import multipart handling and JSON summary shape
//! - skip flag as form field and query parameter
//! - Upload archiving
//! - Health and build info endpoints

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use staffdb_common::db::{
    init_memory_database, Department, DepartmentRepository, EmployeeRepository, Job,
    JobRepository, ReferenceEntity, Repository,
};
use staffdb_ingest::{build_router, AppState};
use tower::ServiceExt;

const BOUNDARY: &str = "staffdb-test-boundary";

/// Test helper: in-memory store with two departments and two jobs
async fn seeded_pool() -> SqlitePool {
    let pool = init_memory_database().await.unwrap();
    DepartmentRepository::new(pool.clone())
        .insert_missing(&[
            Department::new(1, "Product Management".to_string()),
            Department::new(2, "Sales".to_string()),
        ])
        .await
        .unwrap();
    JobRepository::new(pool.clone())
        .insert_missing(&[
            Job::new(1, "Recruiter".to_string()),
            Job::new(2, "Manager".to_string()),
        ])
        .await
        .unwrap();
    pool
}

fn setup_app(pool: SqlitePool) -> Router {
    build_router(AppState::new(pool))
}

/// Test helper: encode form fields as a multipart body
fn multipart_body(csv: &str, skip: Option<&str>) -> String {
    let mut body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"csvfile\"; filename=\"employees.csv\"\r\nContent-Type: text/csv\r\n\r\n{csv}\r\n",
        b = BOUNDARY,
        csv = csv
    );
    if let Some(skip) = skip {
        body.push_str(&format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"skip\"\r\n\r\n{skip}\r\n",
            b = BOUNDARY,
            skip = skip
        ));
    }
    body.push_str(&format!("--{}--\r\n", BOUNDARY));
    body
}

fn import_request(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = body.collect().await.expect("Should read body").to_bytes();
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

#[tokio::test]
async fn test_root_serves_upload_form() {
    let app = setup_app(seeded_pool().await);

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get(header::CONTENT_TYPE).unwrap();
    assert!(content_type.to_str().unwrap().contains("text/html"));

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("name=\"csvfile\""));
    assert!(html.contains("name=\"skip\""));
}

#[tokio::test]
async fn test_import_returns_summary() {
    let pool = seeded_pool().await;
    let app = setup_app(pool.clone());

    let csv = "1,Harold Vogt,2021-11-07T02:48:42Z,2,1\n\
               2,Ty_Hofer,2021-05-30T05:43:46Z,1,2\n\
               3,Lyman Hadye,2021-09-01T23:27:38Z,9,2\n";
    let response = app
        .oneshot(import_request("/import", multipart_body(csv, None)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(
        body,
        json!({
            "total": 1,
            "error": [
                {"row": 1, "error": "Invalid characters in employee name Ty_Hofer"},
                {"row": 2, "error": "Department ID 9 does not exists."}
            ],
            "logged": [
                ["2", "Ty_Hofer", "2021-05-30T05:43:46Z", "1", "2"],
                ["3", "Lyman Hadye", "2021-09-01T23:27:38Z", "9", "2"]
            ]
        })
    );

    assert_eq!(EmployeeRepository::new(pool).count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_skip_form_field_suppresses_duplicates() {
    let pool = seeded_pool().await;
    let csv = "5,Ann Lee,2021-01-01T00:00:00,1,1\n";

    let first = setup_app(pool.clone())
        .oneshot(import_request("/import", multipart_body(csv, None)))
        .await
        .unwrap();
    assert_eq!(extract_json(first.into_body()).await["total"], 1);

    let reported = setup_app(pool.clone())
        .oneshot(import_request("/import", multipart_body(csv, Some("false"))))
        .await
        .unwrap();
    let body = extract_json(reported.into_body()).await;
    assert_eq!(body["error"][0]["error"], "Employee 5 already exists");

    let skipped = setup_app(pool.clone())
        .oneshot(import_request("/import", multipart_body(csv, Some("on"))))
        .await
        .unwrap();
    let body = extract_json(skipped.into_body()).await;
    assert_eq!(body["total"], 0);
    assert_eq!(body["error"], json!([]));
    assert_eq!(body["logged"], json!([]));
}

#[tokio::test]
async fn test_skip_query_parameter() {
    let pool = seeded_pool().await;
    let csv = "6,Ann Lee,2021-01-01T00:00:00,1,1\n";

    setup_app(pool.clone())
        .oneshot(import_request("/import", multipart_body(csv, None)))
        .await
        .unwrap();

    let response = setup_app(pool)
        .oneshot(import_request("/import?skip=1", multipart_body(csv, None)))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], json!([]));
}

#[tokio::test]
async fn test_missing_csvfile_is_bad_request() {
    let app = setup_app(seeded_pool().await);

    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"skip\"\r\n\r\non\r\n--{b}--\r\n",
        b = BOUNDARY
    );
    let response = app.oneshot(import_request("/import", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_non_multipart_request_rejected() {
    let app = setup_app(seeded_pool().await);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/import")
                .header(header::CONTENT_TYPE, "text/csv")
                .body(Body::from("1,Ann,2021-01-01,1,1\n"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_upload_is_archived() {
    let dir = tempfile::tempdir().unwrap();
    let uploads = dir.path().join("uploads");
    let app = build_router(AppState::new(seeded_pool().await).with_uploads_dir(&uploads));

    let csv = "7,Ann Lee,2021-01-01T00:00:00,1,1\n";
    let response = app
        .oneshot(import_request("/import", multipart_body(csv, None)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let archived = std::fs::read_to_string(uploads.join("csvfile.csv")).unwrap();
    assert_eq!(archived, csv);
}

#[tokio::test]
async fn test_row_cap_over_http() {
    let pool = seeded_pool().await;
    let csv: String = (1..=1200)
        .map(|id| format!("{},Employee {},2021-01-01T00:00:00,1,1\n", id, id))
        .collect();

    let response = setup_app(pool.clone())
        .oneshot(import_request("/import", multipart_body(&csv, None)))
        .await
        .unwrap();

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total"], 1000);
    assert_eq!(EmployeeRepository::new(pool).count().await.unwrap(), 1000);
}

#[tokio::test]
async fn test_rejected_rows_do_not_use_up_cap_over_http() {
    let pool = seeded_pool().await;
    let mut csv: String = (0..1000)
        .map(|n| format!("{},Bad_Name,2021-01-01T00:00:00,1,1\n", 5000 + n))
        .collect();
    csv.push_str("1,Late Arrival,2021-01-01T00:00:00,1,1\n");

    let response = setup_app(pool.clone())
        .oneshot(import_request("/import", multipart_body(&csv, None)))
        .await
        .unwrap();

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["error"].as_array().unwrap().len(), 1000);
    assert!(EmployeeRepository::new(pool).exists(1).await.unwrap());
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_app(seeded_pool().await);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "staffdb-ingest");
    assert!(body["version"].is_string());
    assert_eq!(body["employees"], 0);
}

#[tokio::test]
async fn test_health_reports_unavailable_store() {
    let pool = seeded_pool().await;
    pool.close().await;
    let app = setup_app(pool);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "unavailable");
    assert!(body.get("employees").is_none());
}

#[tokio::test]
async fn test_build_info_endpoint() {
    let app = setup_app(seeded_pool().await);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/buildinfo")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["git_hash"].is_string());
    assert!(body["build_timestamp"].as_str().unwrap().ends_with('Z'));
    assert!(body["build_profile"].is_string());
}
