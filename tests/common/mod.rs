//! Shared test utilities and fixtures
//!
//! Mock analysis services, app builders and key helpers for integration tests.

#![allow(dead_code)]

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{Terminal, backend::TestBackend};
use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use devlens_engine::{App, EditTrigger, FormField, ServiceVariant, Settings};

/// Start a mock server standing in for the analysis service
pub async fn start_service_mock() -> MockServer {
    MockServer::start().await
}

/// Device variant reply: `{ "analysis": text }`
pub async fn mount_analysis(server: &MockServer, text: &str) {
    mount_json(server, "/analyze_device", serde_json::json!({ "analysis": text })).await;
}

/// Meeting variant reply in chat-completion shape
pub async fn mount_summary_completion(server: &MockServer, content: &str) {
    let body = serde_json::json!({
        "id": "chatcmpl_test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    });
    mount_json(server, "/summarize", body).await;
}

pub async fn mount_json(server: &MockServer, route: &str, body: Value) {
    Mock::given(method("POST"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Non-2xx reply with a raw body
pub async fn mount_status(server: &MockServer, status: u16, body: &str) {
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

pub fn app_for(base_url: &str, variant: ServiceVariant, edit_trigger: EditTrigger) -> App {
    App::new(Settings {
        base_url: devlens_engine::normalize_base_url(base_url),
        variant,
        edit_trigger,
        ..Settings::default()
    })
    .expect("app builds")
}

pub fn device_app(server: &MockServer) -> App {
    app_for(&server.uri(), ServiceVariant::DeviceAnalysis, EditTrigger::Button)
}

pub fn fill(app: &mut App, field: FormField, text: &str) {
    app.form_field_mut(field).enter_text(text);
}

/// Submit and wait for the reply.
pub async fn submit_and_settle(app: &mut App) {
    app.submit();
    app.settle().await;
}

/// Device app already showing `analysis` as its result.
pub async fn app_with_result(
    server: &MockServer,
    analysis: &str,
    edit_trigger: EditTrigger,
) -> App {
    mount_analysis(server, analysis).await;
    let mut app = app_for(&server.uri(), ServiceVariant::DeviceAnalysis, edit_trigger);
    fill(&mut app, FormField::Primary, "datasheet");
    submit_and_settle(&mut app).await;
    assert_eq!(app.analysis(), Some(analysis));
    app
}

pub fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

pub fn shift(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::SHIFT)
}

pub fn ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
}

pub fn press(app: &mut App, event: KeyEvent) {
    devlens_tui::handle_key(app, event, false);
}

pub fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
        press(app, key(KeyCode::Char(c)));
    }
}

/// Render one frame and return the screen as text, one line per row.
pub fn render(app: &mut App, width: u16, height: u16) -> String {
    let mut terminal = Terminal::new(TestBackend::new(width, height)).expect("test terminal");
    terminal
        .draw(|frame| devlens_tui::draw(frame, app))
        .expect("draw");
    let buffer = terminal.backend().buffer();
    let mut out = String::new();
    for y in 0..buffer.area.height {
        for x in 0..buffer.area.width {
            out.push_str(buffer[(x, y)].symbol());
        }
        out.push('\n');
    }
    out
}
