use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use lopdf::{dictionary, Object};
use serde_json::{json, Value};
use tower::ServiceExt;

use podium_timer::{
    api::create_router,
    document::PdfOutlineBackend,
    state::{AppState, ContainerSize, TimerConfig},
    tasks::Presenter,
    ui::KeyBindings,
};

fn app() -> Router {
    let (presenter, handle) = Presenter::new(
        TimerConfig::default(),
        KeyBindings::default(),
        Arc::new(PdfOutlineBackend),
        ContainerSize::default(),
    );
    tokio::spawn(presenter.run());
    let state = Arc::new(AppState::new(handle, "127.0.0.1".to_string(), 20560));
    create_router(state, 1024 * 1024)
}

fn pdf(pages: usize) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let kids: Vec<Object> = (0..pages)
        .map(|_| doc.add_object(dictionary! { "Type" => "Page", "Parent" => pages_id }).into())
        .collect();
    let media_box: Vec<Object> = vec![0i64.into(), 0i64.into(), 960i64.into(), 540i64.into()];
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
            "MediaBox" => media_box
        }),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("in-memory write");
    bytes
}

async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

fn upload(media_type: &str, bytes: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/document")
        .header(header::CONTENT_TYPE, media_type)
        .body(Body::from(bytes))
        .expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).expect("request")
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app();
    let (status, body) = call(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn initial_projection_is_a_fresh_stopped_timer() {
    let app = app();
    let (status, body) = call(&app, get("/projection")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], "stopped");
    assert_eq!(body["time_text"], "60");
    assert_eq!(body["color"]["solid"], "var(--color-gray)");
    assert_eq!(body["document_loaded"], false);
}

#[tokio::test]
async fn non_pdf_upload_is_rejected_with_bilingual_message() {
    let app = app();
    let (status, body) = call(&app, upload("image/png", vec![0x89, 0x50, 0x4e, 0x47])).await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["code"], "invalid_input");
    assert_eq!(body["message"]["en"], "Please drop PDF files only.");
    assert_eq!(body["message"]["ja"], "PDFファイルのみドロップしてください。");
}

#[tokio::test]
async fn truncated_pdf_fails_to_decode() {
    let app = app();
    let truncated = b"%PDF-1.4\n1 0 obj".to_vec();
    let (status, body) = call(&app, upload("application/pdf", truncated)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "decode_failed");
    assert_eq!(body["message"]["en"], "Failed to load PDF.");
}

#[tokio::test]
async fn keys_are_suppressed_until_a_document_is_loaded() {
    let app = app();

    let (_, body) = call(&app, post_json("/key", json!({ "key": "ArrowRight" }))).await;
    assert_eq!(body["outcome"]["outcome"], "suppressed");
    assert_eq!(body["prevent_default"], false);

    let (status, body) = call(&app, upload("application/pdf", pdf(3))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["document"]["page_count"], 3);

    let (_, body) = call(&app, post_json("/key", json!({ "key": "ArrowRight" }))).await;
    assert_eq!(body["outcome"]["outcome"], "handled");
    assert_eq!(body["prevent_default"], true);
    assert_eq!(body["projection"]["pages"]["current_page"], 2);
}

#[tokio::test]
async fn open_file_shortcut_passes_through() {
    let app = app();
    call(&app, upload("application/pdf", pdf(2))).await;

    let (_, body) = call(&app, post_json("/key", json!({ "key": "o", "ctrl": true }))).await;
    assert_eq!(body["outcome"]["outcome"], "pass_through");
    assert_eq!(body["prevent_default"], false);
}

#[tokio::test]
async fn fullscreen_key_asks_the_client_to_toggle() {
    let app = app();
    call(&app, upload("application/pdf", pdf(2))).await;

    let (_, body) = call(&app, post_json("/key", json!({ "key": "f" }))).await;
    assert_eq!(body["effect"], "toggle_fullscreen");
}

#[tokio::test]
async fn timer_actions_drive_the_phase() {
    let app = app();
    call(&app, upload("application/pdf", pdf(2))).await;

    let (status, body) = call(&app, post_empty("/timer/start")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "applied");
    assert_eq!(body["projection"]["phase"], "counting");
    assert_eq!(body["projection"]["countdown"]["value"], 3);

    let (_, body) = call(&app, post_empty("/timer/start")).await;
    assert_eq!(body["status"], "ignored");

    let (_, body) = call(&app, post_empty("/timer/pause")).await;
    assert_eq!(body["projection"]["phase"], "paused");

    let (_, body) = call(&app, post_empty("/timer/reset")).await;
    assert_eq!(body["projection"]["phase"], "stopped");
    assert_eq!(body["projection"]["time_text"], "60");

    let (status, _) = call(&app, post_empty("/timer/launch")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn page_jump_outside_the_document_is_ignored() {
    let app = app();
    call(&app, upload("application/pdf", pdf(2))).await;

    let (_, body) = call(&app, post_empty("/page/2")).await;
    assert_eq!(body["status"], "applied");
    assert_eq!(body["projection"]["pages"]["current_page"], 2);

    let (_, body) = call(&app, post_empty("/page/9")).await;
    assert_eq!(body["status"], "ignored");
    assert_eq!(body["projection"]["pages"]["current_page"], 2);
}

#[tokio::test]
async fn invalid_config_keeps_previous_values() {
    let app = app();

    let request = Request::builder()
        .method(Method::PUT)
        .uri("/config")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "total_duration_seconds": 120, "countdown_seconds": 0 }).to_string(),
        ))
        .expect("request");
    let (status, body) = call(&app, request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "invalid_config");

    let (_, body) = call(&app, get("/config")).await;
    assert_eq!(body["config"]["total_duration_seconds"], 60);
    assert_eq!(body["config"]["countdown_seconds"], 3);
}

#[tokio::test]
async fn total_change_resets_the_display() {
    let app = app();

    let request = Request::builder()
        .method(Method::PUT)
        .uri("/config")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "total_duration_seconds": 300 }).to_string()))
        .expect("request");
    let (status, body) = call(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["config"]["total_duration_seconds"], 300);

    let (_, body) = call(&app, get("/projection")).await;
    assert_eq!(body["time_text"], "300");
}

#[tokio::test]
async fn drag_toggles_the_overlay() {
    let app = app();

    let (_, body) = call(&app, post_json("/drag", json!({ "event": "over" }))).await;
    assert_eq!(body["status"], "applied");
    assert_eq!(body["projection"]["drag_overlay"], true);

    let (_, body) = call(&app, post_json("/drag", json!({ "event": "leave" }))).await;
    assert_eq!(body["projection"]["drag_overlay"], false);
}

#[tokio::test]
async fn status_tracks_last_action() {
    let app = app();
    call(&app, post_empty("/timer/reset")).await;

    let (status, body) = call(&app, get("/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["last_action"], "timer");
    assert_eq!(body["port"], 20560);
}
