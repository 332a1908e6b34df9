//! Submission lifecycle through the App

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use devlens_engine::{
    EditTrigger, FALLBACK_NOTICE, Focus, FormField, ResultView, ServiceVariant, SubmissionPhase,
};

use crate::common::{
    app_for, device_app, fill, mount_analysis, mount_status, start_service_mock, submit_and_settle,
};

#[tokio::test]
async fn device_request_body_and_result() {
    let server = start_service_mock().await;
    Mock::given(method("POST"))
        .and(path("/analyze_device"))
        .and(body_json(json!({
            "datasheet_text": "VDD 3.3V",
            "log_text": "ERR 42",
            "query": null
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "analysis": "Check VDD" })))
        .expect(1)
        .mount(&server)
        .await;

    let mut app = device_app(&server);
    fill(&mut app, FormField::Primary, "VDD 3.3V");
    fill(&mut app, FormField::Secondary, "ERR 42");
    fill(&mut app, FormField::Instruction, "   ");

    app.submit();
    assert_eq!(app.submission().phase(), SubmissionPhase::InFlight);
    assert_eq!(app.submit_label(), "Analyzing...");
    assert!(!app.submit_enabled());
    assert!(matches!(app.result_view(), ResultView::Progress));

    app.settle().await;
    assert_eq!(app.submission().phase(), SubmissionPhase::Succeeded);
    assert_eq!(app.analysis(), Some("Check VDD"));
    assert_eq!(app.submit_label(), "Analyze");
    match app.result_view() {
        ResultView::Result(editor) => assert_eq!(editor.committed(), "Check VDD"),
        other => panic!("expected result view, got {other:?}"),
    }
}

#[tokio::test]
async fn primary_text_is_sent_verbatim() {
    let server = start_service_mock().await;
    Mock::given(method("POST"))
        .and(body_json(json!({
            "datasheet_text": "  pinout\n",
            "log_text": null,
            "query": "set channel"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "analysis": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let mut app = device_app(&server);
    fill(&mut app, FormField::Primary, "  pinout\n");
    fill(&mut app, FormField::Instruction, "set channel");
    submit_and_settle(&mut app).await;
    assert_eq!(app.analysis(), Some("ok"));
}

#[tokio::test]
async fn blank_primary_text_sends_nothing() {
    let server = start_service_mock().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut app = device_app(&server);
    fill(&mut app, FormField::Primary, " \n\t");
    fill(&mut app, FormField::Secondary, "log only");
    app.submit();

    assert_eq!(app.submission().phase(), SubmissionPhase::Idle);
    assert_eq!(app.status_message(), Some("Datasheet is required"));
    assert!(matches!(app.result_view(), ResultView::Empty));
}

#[tokio::test]
async fn resubmit_while_in_flight_sends_once() {
    let server = start_service_mock().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "analysis": "single" }))
                .set_delay(Duration::from_millis(150)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut app = device_app(&server);
    fill(&mut app, FormField::Primary, "sheet");
    app.submit();
    app.submit();
    app.set_focus(Focus::Submit);
    app.activate_focused();
    assert_eq!(app.submission().phase(), SubmissionPhase::InFlight);

    app.settle().await;
    assert_eq!(app.analysis(), Some("single"));
}

#[tokio::test]
async fn missing_analysis_shows_fallback_with_notice() {
    let server = start_service_mock().await;
    crate::common::mount_json(&server, "/analyze_device", json!({ "analysis": "" })).await;

    let mut app = device_app(&server);
    fill(&mut app, FormField::Primary, "sheet");
    submit_and_settle(&mut app).await;

    assert_eq!(app.submission().phase(), SubmissionPhase::Succeeded);
    assert_eq!(app.analysis(), Some("No analysis found"));
    assert!(app.submission().used_fallback());
    assert_eq!(app.status_message(), Some(FALLBACK_NOTICE));
}

#[tokio::test]
async fn http_error_is_displayed_without_result() {
    let server = start_service_mock().await;
    mount_status(&server, 503, "").await;

    let mut app = device_app(&server);
    fill(&mut app, FormField::Primary, "sheet");
    submit_and_settle(&mut app).await;

    match app.result_view() {
        ResultView::Error(message) => {
            assert_eq!(message, "API error: 503 Service Unavailable");
        }
        other => panic!("expected error view, got {other:?}"),
    }
    assert_eq!(app.analysis(), None);
    assert!(app.submit_enabled());
}

#[tokio::test]
async fn malformed_body_fails() {
    let server = start_service_mock().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let mut app = device_app(&server);
    fill(&mut app, FormField::Primary, "sheet");
    submit_and_settle(&mut app).await;

    let message = app.submission().error_message().unwrap();
    assert!(message.starts_with("Malformed response"), "{message}");
}

#[tokio::test]
async fn failure_then_success_replaces_error() {
    let server = start_service_mock().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "detail": "model loading" })),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_analysis(&server, "Second time lucky").await;

    let mut app = device_app(&server);
    fill(&mut app, FormField::Primary, "sheet");
    submit_and_settle(&mut app).await;
    assert_eq!(
        app.submission().error_message(),
        Some("API error: 500 Internal Server Error: model loading")
    );

    app.submit();
    assert!(matches!(app.result_view(), ResultView::Progress));
    app.settle().await;
    assert_eq!(app.submission().error_message(), None);
    assert_eq!(app.analysis(), Some("Second time lucky"));
}

#[tokio::test]
async fn new_submission_clears_previous_result() {
    let server = start_service_mock().await;
    mount_analysis(&server, "first").await;

    let mut app = device_app(&server);
    fill(&mut app, FormField::Primary, "sheet");
    submit_and_settle(&mut app).await;
    assert_eq!(app.analysis(), Some("first"));

    app.submit();
    assert_eq!(app.analysis(), None);
    assert!(matches!(app.result_view(), ResultView::Progress));
    app.settle().await;
}

#[tokio::test]
async fn unreachable_service_fails() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let mut app = app_for(&base, ServiceVariant::DeviceAnalysis, EditTrigger::Button);
    fill(&mut app, FormField::Primary, "sheet");
    submit_and_settle(&mut app).await;

    let message = app.submission().error_message().unwrap();
    assert!(message.starts_with("Request failed"), "{message}");
}

#[tokio::test]
async fn empty_base_url_fails_gracefully() {
    let mut app = app_for("", ServiceVariant::DeviceAnalysis, EditTrigger::Button);
    fill(&mut app, FormField::Primary, "sheet");
    submit_and_settle(&mut app).await;
    assert_eq!(app.submission().phase(), SubmissionPhase::Failed);
}

#[tokio::test]
async fn trailing_slash_in_base_url_is_dropped() {
    let server = start_service_mock().await;
    mount_analysis(&server, "slash ok").await;

    let mut app = app_for(
        &format!("{}/", server.uri()),
        ServiceVariant::DeviceAnalysis,
        EditTrigger::Button,
    );
    fill(&mut app, FormField::Primary, "sheet");
    submit_and_settle(&mut app).await;
    assert_eq!(app.analysis(), Some("slash ok"));
}

#[tokio::test]
async fn meeting_variant_reads_completion_content() {
    let server = start_service_mock().await;
    Mock::given(method("POST"))
        .and(path("/summarize"))
        .and(body_json(json!({ "meeting_text": "Alice: ship it" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "Decision: ship" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut app = app_for(&server.uri(), ServiceVariant::MeetingSummary, EditTrigger::Button);
    fill(&mut app, FormField::Primary, "Alice: ship it");
    app.submit();
    assert_eq!(app.submit_label(), "Summarizing...");
    app.settle().await;
    assert_eq!(app.analysis(), Some("Decision: ship"));
}

#[tokio::test]
async fn meeting_variant_accepts_analysis_field() {
    let server = start_service_mock().await;
    crate::common::mount_json(&server, "/summarize", json!({ "analysis": "Short summary" })).await;

    let mut app = app_for(&server.uri(), ServiceVariant::MeetingSummary, EditTrigger::Button);
    fill(&mut app, FormField::Primary, "notes");
    submit_and_settle(&mut app).await;
    assert_eq!(app.analysis(), Some("Short summary"));
}

#[tokio::test]
async fn frame_ticks_apply_completion() {
    let server = start_service_mock().await;
    mount_analysis(&server, "ticked").await;

    let mut app = device_app(&server);
    fill(&mut app, FormField::Primary, "sheet");
    app.submit();

    for _ in 0..300 {
        app.tick();
        if app.submission().phase() != SubmissionPhase::InFlight {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(app.analysis(), Some("ticked"));
}
