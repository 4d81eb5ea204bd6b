//! バックエンドRESTクライアントの統合テスト
//!
//! axumでモックバックエンドを立て、実際のHTTP往復で検証する。

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use tracer::api::ApiClient;
use tracer::error::TracerError;
use tracer::scanner::{AutoConfirm, BackendWriter, LineSource, ScanSession};
use tracer::session::Session;
use tracer_common::{
    decode_student, encode_student, CheckIn, LinkRequest, RentalRemoveRequest, RentalsAddRequest,
    WriteRequest,
};

const PAIRING_KEY: &str = "PAIR-1234";
const TOKEN: &str = "test-token";

#[derive(Clone, Default)]
struct Backend {
    rentals: Arc<Mutex<Vec<String>>>,
    writes: Arc<Mutex<Vec<WriteRequest>>>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", TOKEN))
        .unwrap_or(false)
}

fn unauthorized() -> axum::response::Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Invalid token" }))).into_response()
}

async fn link(Json(req): Json<LinkRequest>) -> axum::response::Response {
    if req.key == PAIRING_KEY {
        Json(json!({ "token": TOKEN })).into_response()
    } else {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": "Invalid key" }))).into_response()
    }
}

async fn write(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(req): Json<WriteRequest>,
) -> axum::response::Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if !backend.rentals.lock().unwrap().contains(&req.rental) {
        return (StatusCode::NOT_FOUND, Json(json!({ "error": "rental does not exist" }))).into_response();
    }
    backend.writes.lock().unwrap().push(req);
    Json(json!({ "message": "Log entry created successfully" })).into_response()
}

async fn add_rentals(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(req): Json<RentalsAddRequest>,
) -> axum::response::Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    backend.rentals.lock().unwrap().extend(req.rentals);
    Json(json!({ "message": "Rentals added" })).into_response()
}

async fn remove_rental(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(req): Json<RentalRemoveRequest>,
) -> axum::response::Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut rentals = backend.rentals.lock().unwrap();
    let before = rentals.len();
    rentals.retain(|r| r != &req.rental);
    if rentals.len() == before {
        return (StatusCode::NOT_FOUND, Json(json!({ "error": "rental does not exist" }))).into_response();
    }
    Json(json!({ "message": "Rental removed" })).into_response()
}

/// バックエンドは学生名をデコードして保存する
async fn logs(State(backend): State<Backend>, headers: HeaderMap) -> axum::response::Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let writes = backend.writes.lock().unwrap();
    let logs: Vec<_> = writes
        .iter()
        .enumerate()
        .map(|(i, w)| {
            json!({
                "id": i + 1,
                "device": w.rental,
                "action": if i % 2 == 0 { "out" } else { "in" },
                "student": decode_student(&w.student).unwrap_or_default(),
                "date": w.date,
                "time": w.time,
            })
        })
        .collect();
    Json(json!({ "logs": logs })).into_response()
}

async fn status(State(backend): State<Backend>, headers: HeaderMap) -> axum::response::Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let rentals = backend.rentals.lock().unwrap();
    let writes = backend.writes.lock().unwrap();
    let status: Vec<_> = rentals
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let last = writes.iter().rev().find(|w| &w.rental == r);
            json!({
                "id": i + 1,
                "rental": r,
                "status": if last.is_some() { "out" } else { "in" },
                "renter": last.map(|w| decode_student(&w.student).unwrap_or_default()).unwrap_or_default(),
            })
        })
        .collect();
    Json(json!({ "status": status })).into_response()
}

async fn export(State(backend): State<Backend>, headers: HeaderMap) -> axum::response::Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut csv = String::from("id,rental,student,date,time\n");
    for (i, w) in backend.writes.lock().unwrap().iter().enumerate() {
        let student = decode_student(&w.student).unwrap_or_default();
        csv.push_str(&format!("{},{},{},{},{}\n", i + 1, w.rental, student, w.date, w.time));
    }
    ([("content-type", "text/csv")], csv).into_response()
}

async fn clear(State(backend): State<Backend>, headers: HeaderMap) -> axum::response::Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    backend.writes.lock().unwrap().clear();
    Json(json!({ "message": "Logs cleared" })).into_response()
}

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/api", addr)
}

async fn start_backend(rentals: &[&str]) -> (Backend, ApiClient) {
    let backend = Backend::default();
    backend
        .rentals
        .lock()
        .unwrap()
        .extend(rentals.iter().map(|r| r.to_string()));

    let api = Router::new()
        .route("/link", post(link))
        .route("/write", post(write))
        .route("/rentals/add", post(add_rentals))
        .route("/rentals/remove", post(remove_rental))
        .route("/logs", get(logs))
        .route("/status", get(status))
        .route("/export", get(export))
        .route("/clear", get(clear))
        .with_state(backend.clone());

    let base_url = spawn(Router::new().nest("/api", api)).await;
    let client = ApiClient::new(&base_url, 5).unwrap();
    (backend, client)
}

fn entry(rental: &str, student: &str) -> WriteRequest {
    WriteRequest {
        rental: rental.into(),
        student: encode_student(student),
        date: "10/16/2026".into(),
        time: "09:05:07".into(),
    }
}

#[tokio::test]
async fn test_link_returns_session() {
    let (_, client) = start_backend(&[]).await;

    let session = client.link(&format!("  {}  ", PAIRING_KEY)).await.expect("リンク失敗");
    assert_eq!(session.token(), TOKEN);

    let err = client.link("WRONG").await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid key (HTTP 400)");

    let err = client.link("   ").await.unwrap_err();
    assert!(matches!(err, TracerError::Config(_)));
}

#[tokio::test]
async fn test_write_then_logs_and_status() {
    let (backend, client) = start_backend(&["SF12-3", "AB12-1"]).await;
    let session = Session::new(TOKEN);

    let message = client.write(&session, &entry("SF12-3", "Jane Doe")).await.unwrap();
    assert_eq!(message, "Log entry created successfully");
    assert_eq!(backend.writes.lock().unwrap()[0].student, "SmFuZSBEb2U=");

    let logs = client.logs(&session).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].rental, "SF12-3");
    assert_eq!(logs[0].student, "Jane Doe");
    assert_eq!(logs[0].date, "10/16/2026");

    let status = client.status(&session).await.unwrap();
    assert_eq!(status.len(), 2);
    assert_eq!(status[0].status, "out");
    assert_eq!(status[0].renter, "Jane Doe");
    assert_eq!(status[1].status, "in");
}

#[tokio::test]
async fn test_write_unknown_rental_surfaces_backend_error() {
    let (backend, client) = start_backend(&["SF12-3"]).await;
    let session = Session::new(TOKEN);

    let err = client.write(&session, &entry("ZZ99-9", "Jane Doe")).await.unwrap_err();
    match err {
        TracerError::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "rental does not exist");
        }
        other => panic!("unexpected: {:?}", other),
    }
    assert!(backend.writes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_rentals_add_and_remove() {
    let (backend, client) = start_backend(&[]).await;
    let session = Session::new(TOKEN);

    let rentals = vec!["CAM-1".to_string(), "CAM-2".to_string()];
    client.add_rentals(&session, &rentals).await.unwrap();
    assert_eq!(*backend.rentals.lock().unwrap(), rentals);

    client.remove_rental(&session, "CAM-1").await.unwrap();
    assert_eq!(*backend.rentals.lock().unwrap(), vec!["CAM-2".to_string()]);

    let err = client.remove_rental(&session, "CAM-1").await.unwrap_err();
    assert!(matches!(err, TracerError::Api { status: 404, .. }));
}

#[tokio::test]
async fn test_export_and_clear() {
    let (backend, client) = start_backend(&["SF12-3"]).await;
    let session = Session::new(TOKEN);
    client.write(&session, &entry("SF12-3", "Jane Doe")).await.unwrap();

    let csv = client.export_csv(&session).await.unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "id,rental,student,date,time");
    assert_eq!(lines[1], "1,SF12-3,Jane Doe,10/16/2026,09:05:07");

    assert_eq!(client.clear_logs(&session).await.unwrap(), "Logs cleared");
    assert!(backend.writes.lock().unwrap().is_empty());
    assert!(client.logs(&session).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_token_is_unauthorized() {
    let (_, client) = start_backend(&["SF12-3"]).await;
    let session = Session::new("stale-token");

    let err = client.logs(&session).await.unwrap_err();
    assert!(matches!(err, TracerError::Unauthorized));
    assert!(err.needs_relink());
}

#[tokio::test]
async fn test_non_json_error_uses_generic_message() {
    let router = Router::new().route(
        "/api/logs",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>") }),
    );
    let base_url = spawn(router).await;
    let client = ApiClient::new(&base_url, 5).unwrap();

    let err = client.logs(&Session::new(TOKEN)).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Something went wrong, check logs for details. (HTTP 500)"
    );
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    // 一度バインドして閉じたポートは接続拒否になる
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ApiClient::new(&format!("http://{}/api", addr), 2).unwrap();
    let err = client.logs(&Session::new(TOKEN)).await.unwrap_err();
    assert!(matches!(err, TracerError::Network(_)));
}

#[tokio::test]
async fn test_scan_session_against_backend() {
    let (backend, client) = start_backend(&["SF12-3"]).await;
    let session = Session::new(TOKEN);
    let writer = BackendWriter { client: &client, session: &session };

    let student = encode_student("Jane Doe");
    // 1組目は未登録のレンタル品で失敗、2組目は成功
    let input = ["ZZ99-9", student.as_str(), "", "SF12-3", student.as_str()].join("\n");
    let mut scan = ScanSession::new(LineSource::new(Cursor::new(input)));

    let summary = scan.run(&mut AutoConfirm, &writer).await.expect("スキャン失敗");
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.submitted, 1);
    assert_eq!(*scan.state(), CheckIn::Idle);

    let writes = backend.writes.lock().unwrap();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].rental, "SF12-3");
    assert_eq!(writes[0].student, student);
}

#[tokio::test]
async fn test_scan_session_stops_on_unauthorized() {
    let (backend, client) = start_backend(&["SF12-3"]).await;
    let session = Session::new("stale-token");
    let writer = BackendWriter { client: &client, session: &session };

    let student = encode_student("Jane Doe");
    let input = ["SF12-3", student.as_str(), "SF12-3", student.as_str()].join("\n");
    let mut scan = ScanSession::new(LineSource::new(Cursor::new(input)));

    let err = scan.run(&mut AutoConfirm, &writer).await.unwrap_err();
    assert!(matches!(err, TracerError::Unauthorized));
    assert!(!scan.is_active());
    assert_eq!(scan.summary().failed, 1);
    assert!(backend.writes.lock().unwrap().is_empty());
}
