//! End-to-end tests for the REST router, driven through `tower::ServiceExt::oneshot`.

use api_rest::{create_router, parse_cors_origins, AppState, DEFAULT_CORS_ORIGINS};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use saathi_core::ocr::SampleTextExtractor;
use saathi_core::repositories::{FileReportRepository, MemoryReportRepository, ReportRepository};
use saathi_core::{CoreConfig, ReportService};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "saathi-test-boundary";

fn app_with(config: CoreConfig, repository: Arc<dyn ReportRepository>) -> Router {
    let service = ReportService::new(Arc::new(config), repository, Arc::new(SampleTextExtractor));
    let origins = parse_cors_origins(DEFAULT_CORS_ORIGINS).unwrap();
    create_router(AppState::new(Arc::new(service)), &origins)
}

fn app() -> Router {
    app_with(CoreConfig::default(), Arc::new(MemoryReportRepository::new()))
}

fn multipart(field: &str, filename: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(field: &str, filename: &str, bytes: &[u8], cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::post("/reports/upload").header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
    );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(multipart(field, filename, bytes))).unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Option<String>, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, set_cookie, body)
}

/// `session_id=...` pair taken from a `Set-Cookie` header.
fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap().to_string()
}

#[tokio::test]
async fn root_and_health_need_no_session() {
    let app = app();

    let (status, set_cookie, body) = send(&app, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(set_cookie.is_none());
    assert_eq!(body["status"], "healthy");

    let (status, _, body) = send(&app, get("/", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["docs"], "/docs");
}

#[tokio::test]
async fn new_session_gets_cookie_and_demo_report() {
    let app = app();
    let (status, set_cookie, body) = send(&app, get("/reports/latest", None)).await;

    assert_eq!(status, StatusCode::OK);
    let set_cookie = set_cookie.expect("session cookie");
    assert!(set_cookie.starts_with("session_id="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    assert_eq!(body["report_id"], "demo-latest");
    assert_eq!(body["extraction_source"], "demo");

    let cookie = cookie_pair(&set_cookie);
    let (_, set_cookie, _) = send(&app, get("/reports/history", Some(&cookie))).await;
    assert!(set_cookie.is_none(), "existing sessions keep their cookie");
}

#[tokio::test]
async fn upload_then_read_back() {
    let app = app();
    let cookie = "session_id=upload-session";

    let (status, _, uploaded) =
        send(&app, upload_request("file", "cbc.pdf", b"%PDF-1.4", Some(cookie))).await;
    assert_eq!(status, StatusCode::OK, "{uploaded}");
    assert_eq!(uploaded["success"], true);
    assert_eq!(uploaded["extraction_source"], "ocr");
    let report_id = uploaded["report_id"].as_str().unwrap().to_string();
    assert_eq!(uploaded["upload_id"], report_id.as_str());

    let (status, _, latest) = send(&app, get("/reports/latest", Some(cookie))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(latest["report_id"], report_id.as_str());
    assert_eq!(latest["filename"], "cbc.pdf");

    let (status, _, detail) =
        send(&app, get(&format!("/reports/{report_id}"), Some(cookie))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["parameters"], latest["parameters"]);

    let (_, _, history) = send(&app, get("/reports/history", Some(cookie))).await;
    assert_eq!(history["total_reports"], 1);
    assert_eq!(history["reports"][0]["report_id"], report_id.as_str());

    let (status, _, _) = send(
        &app,
        get(&format!("/reports/{report_id}"), Some("session_id=someone-else")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upload_errors_map_to_client_statuses() {
    let app = app();

    let (status, _, body) = send(&app, upload_request("file", "notes.txt", b"hi", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["detail"],
        "Invalid file type. Allowed types: .pdf, .png, .jpg, .jpeg"
    );

    let (status, _, body) = send(&app, upload_request("document", "cbc.pdf", b"%PDF", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Missing multipart field 'file'");

    let small = app_with(
        CoreConfig::default().with_max_file_size_mb(1).unwrap(),
        Arc::new(MemoryReportRepository::new()),
    );
    let (status, _, body) = send(
        &small,
        upload_request("file", "big.png", &vec![0u8; 1024 * 1024 + 10], None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "File too large. Maximum size: 1MB");
}

#[tokio::test]
async fn unknown_reports_are_not_found() {
    let app = app();
    for uri in ["/reports/0123456789abcdef0123456789abcdef", "/reports/not-an-id"] {
        let (status, _, body) = send(&app, get(uri, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["detail"], "Report not found");
    }

    let (status, _, body) = send(&app, get("/reports/demo-3", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["extraction_source"], "demo");
}

#[tokio::test]
async fn trends_fall_back_to_demo_series() {
    let app = app();
    let (status, _, body) = send(&app, get("/reports/trends/data?parameter=Hemoglobin", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["parameter_trends"]["hemoglobin"]["data_points"].is_array());
    assert!(body["health_score_trend"].as_array().unwrap().len() >= 2);
}

#[tokio::test]
async fn explain_validates_and_answers() {
    let app = app();
    let request = |payload: Value| {
        Request::post("/reports/explain")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap()
    };

    let (status, _, body) = send(
        &app,
        request(json!({"parameter_name": "Hemoglobin", "status": "low"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["parameter_name"], "Hemoglobin");
    assert!(!body["explanation"].as_str().unwrap().is_empty());
    assert!(!body["disclaimer"].as_str().unwrap().is_empty());

    let (status, _, _) = send(&app, request(json!({"parameter_name": " ", "status": "low"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn score_and_timeline_for_new_session() {
    let app = app();

    let (status, _, score) = send(&app, get("/reports/health/clarity-score", None)).await;
    assert_eq!(status, StatusCode::OK);
    let value = score["score"].as_u64().unwrap();
    assert!(value <= 100);

    for uri in ["/reports/action-timeline", "/reports/timeline"] {
        let (status, _, timeline) = send(&app, get(uri, None)).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert!(!timeline["phases"].as_array().unwrap().is_empty());
    }
}

#[tokio::test]
async fn file_backend_survives_restart() {
    let temp = TempDir::new().unwrap();
    let cookie = "session_id=durable-session";

    let first = app_with(
        CoreConfig::default(),
        Arc::new(FileReportRepository::open(temp.path()).await.unwrap()),
    );
    let (status, _, uploaded) =
        send(&first, upload_request("file", "cbc.png", b"png", Some(cookie))).await;
    assert_eq!(status, StatusCode::OK);

    let second = app_with(
        CoreConfig::default(),
        Arc::new(FileReportRepository::open(temp.path()).await.unwrap()),
    );
    let (_, _, latest) = send(&second, get("/reports/latest", Some(cookie))).await;
    assert_eq!(latest["report_id"], uploaded["report_id"]);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = app();
    let (status, _, body) = send(&app, get("/api-docs/openapi.json", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/reports/upload"].is_object());
}
