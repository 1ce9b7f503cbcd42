use axum::{
    body::Bytes,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use sheet_dashboard::{
    Backend, ChartType, Config, Dashboard, DashboardError, HttpBackend, KpiKey, OperationKind,
    Panel, UploadFile,
};
use std::net::SocketAddr;

async fn upload(body: Bytes) -> Json<Value> {
    let body = String::from_utf8_lossy(&body);
    if !body.contains("name=\"file\"") {
        return Json(json!({"error": "No file part"}));
    }
    Json(json!({
        "columns": ["A", "B", "C"],
        "numeric_columns": ["B", "C"],
        "preview": "<table class=\"table\"><tr><td>1</td></tr></table>"
    }))
}

async fn analyze(Json(request): Json<Value>) -> Json<Value> {
    if request["column"] != "B" {
        return Json(json!({"error": "bad column"}));
    }
    assert_eq!(request["operation"], "sum");
    assert_eq!(request["chart_type"], "bar");
    assert!(request.get("n").is_none());
    Json(json!({
        "result": "<p>42</p>",
        "kpis": {"rows": 3, "sum": 42, "avg": 14, "max": 20, "min": 10},
        "chart": {"labels": ["x"], "title": "Sum of B", "values": [42]}
    }))
}

async fn download_excel() -> impl IntoResponse {
    (StatusCode::OK, vec![0x50_u8, 0x4b, 0x03, 0x04])
}

async fn not_json() -> &'static str {
    "<html>Internal Server Error</html>"
}

async fn spawn_backend() -> String {
    let app = Router::new()
        .route("/upload", post(upload))
        .route("/analyze", post(analyze))
        .route("/download-excel", get(download_excel));

    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn spawn_broken_backend() -> String {
    let app = Router::new()
        .route("/upload", post(not_json))
        .route("/analyze", post(not_json))
        .route("/download-excel", get(|| async { (StatusCode::BAD_REQUEST, "No analysis result to download") }));

    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn dashboard(url: String) -> Dashboard<HttpBackend> {
    let config = Config::default().with_backend_url(url);
    let backend = HttpBackend::new(&config).unwrap();
    Dashboard::new(backend, config)
}

#[tokio::test]
async fn upload_then_sum_over_http() {
    let dash = dashboard(spawn_backend().await);
    dash.select_file(UploadFile::new("sales.csv", "A,B,C\nx,1,2\n"));

    let metadata = dash.upload().await.unwrap();
    assert_eq!(metadata.columns, vec!["A", "B", "C"]);
    assert_eq!(dash.view().preview.text(), "1");

    assert!(dash.on_operation_changed(OperationKind::Sum));
    assert_eq!(dash.view().form.column_options, vec!["B", "C"]);
    dash.select_column("B").unwrap();
    dash.set_chart_type(ChartType::Bar);

    dash.run().await.unwrap();
    dash.settle().await;

    let view = dash.view();
    assert_eq!(view.result.text(), "42");
    assert_eq!(view.kpis.text(KpiKey::Sum), "42");
    assert_eq!(view.kpis.text(KpiKey::Rows), "3");
    assert_eq!(view.kpis.text(KpiKey::Min), "10");
    let chart = view.chart.unwrap();
    assert_eq!(chart.title, "Sum of B");
    assert_eq!(chart.chart_type, ChartType::Bar);
    assert_eq!(dash.live_charts(), 1);
}

#[tokio::test]
async fn server_reported_analyze_error_clears_chart() {
    let dash = dashboard(spawn_backend().await);
    dash.select_file(UploadFile::new("sales.csv", "A,B,C\n"));
    dash.upload().await.unwrap();

    dash.on_operation_changed(OperationKind::Sum);
    dash.run().await.unwrap();
    assert_eq!(dash.live_charts(), 1);

    dash.select_column("C").unwrap();
    let err = dash.run().await.unwrap_err();
    assert!(matches!(err, DashboardError::Server(_)));
    assert_eq!(dash.view().result, Panel::error("bad column"));
    assert_eq!(dash.live_charts(), 0);
}

#[tokio::test]
async fn spreadsheet_download_writes_the_file() {
    let url = spawn_backend().await;
    let backend = HttpBackend::new(&Config::default().with_backend_url(url)).unwrap();
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("analysis_result.xlsx");

    let size = backend.download_excel(&path).await.unwrap();
    assert_eq!(size, 4);
    assert_eq!(std::fs::read(&path).unwrap(), vec![0x50, 0x4b, 0x03, 0x04]);
}

#[tokio::test]
async fn malformed_responses_are_transport_failures() {
    let dash = dashboard(spawn_broken_backend().await);
    dash.select_file(UploadFile::new("sales.csv", "A\n"));

    let err = dash.upload().await.unwrap_err();
    assert!(matches!(err, DashboardError::Transport(_)));
    assert_eq!(dash.view().preview, Panel::error("Server error"));
    assert!(!dash.session().is_loaded());

    let err = dash.backend().download_excel(&std::env::temp_dir().join("unused.xlsx")).await;
    assert!(matches!(err, Err(DashboardError::Server(ref m)) if m == "No analysis result to download"));
}

#[tokio::test]
async fn unreachable_server_is_a_transport_failure() {
    let config = Config::default().with_backend_url("http://127.0.0.1:9");
    let backend = HttpBackend::new(&config).unwrap();
    let err = backend
        .upload(&UploadFile::new("sales.csv", "A\n"))
        .await
        .unwrap_err();
    assert!(matches!(err, DashboardError::Transport(_)));
}
