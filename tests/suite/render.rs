//! Rendering of each result state

use devlens_engine::{EditTrigger, FALLBACK_NOTICE, Focus, FormField, ServiceVariant};

use crate::common::{
    app_for, app_with_result, fill, mount_json, mount_summary_completion, render,
    start_service_mock, submit_and_settle,
};

#[tokio::test]
async fn result_panel_with_edit_button() {
    let server = start_service_mock().await;
    let mut app = app_with_result(&server, "Raise VDD to 3.3V", EditTrigger::Button).await;

    let screen = render(&mut app, 100, 40);
    assert!(screen.contains("Analysis & Suggestions"));
    assert!(screen.contains("Raise VDD to 3.3V"));
    assert!(screen.contains("Edit ]"));
    assert!(!screen.contains("Error:"));
    assert!(!screen.contains("Analyzing..."));
}

#[tokio::test]
async fn editing_shows_key_hints_and_hides_edit_button() {
    let server = start_service_mock().await;
    let mut app = app_with_result(&server, "A", EditTrigger::Button).await;
    app.begin_result_edit();

    let screen = render(&mut app, 100, 40);
    assert!(screen.contains("Shift+Enter"));
    assert!(screen.contains("cancel"));
    assert!(!screen.contains("Edit ]"));
}

#[tokio::test]
async fn direct_trigger_has_no_edit_button() {
    let server = start_service_mock().await;
    let mut app = app_with_result(&server, "A", EditTrigger::Direct).await;
    app.set_focus(Focus::Result);

    let screen = render(&mut app, 100, 40);
    assert!(!screen.contains("Edit ]"));
    assert!(screen.contains("Enter edit"));
}

#[tokio::test]
async fn fallback_notice_in_status_bar() {
    let server = start_service_mock().await;
    mount_json(&server, "/analyze_device", serde_json::json!({})).await;
    let mut app = app_for(&server.uri(), ServiceVariant::DeviceAnalysis, EditTrigger::Button);
    fill(&mut app, FormField::Primary, "sheet");
    submit_and_settle(&mut app).await;

    let screen = render(&mut app, 100, 40);
    assert!(screen.contains("No analysis found"));
    assert!(screen.contains(FALLBACK_NOTICE));
}

#[tokio::test]
async fn meeting_summary_rendering() {
    let server = start_service_mock().await;
    mount_summary_completion(&server, "Decision: ship Friday").await;
    let mut app = app_for(&server.uri(), ServiceVariant::MeetingSummary, EditTrigger::Button);
    fill(&mut app, FormField::Primary, "transcript");
    submit_and_settle(&mut app).await;

    let screen = render(&mut app, 100, 40);
    assert!(screen.contains("Meeting Summarizer"));
    assert!(screen.contains("Summary"));
    assert!(screen.contains("Decision: ship Friday"));
    assert!(screen.contains("[ Summarize ]"));
}

#[tokio::test]
async fn escape_sequences_in_result_are_not_rendered() {
    let server = start_service_mock().await;
    let mut app = app_with_result(&server, "ok\u{1b}[2Jdone", EditTrigger::Button).await;

    let screen = render(&mut app, 100, 40);
    assert!(screen.contains("okdone"));
    assert!(!screen.contains('\u{1b}'));
}

#[tokio::test]
async fn long_result_scrolls_within_bounds() {
    let server = start_service_mock().await;
    let text: Vec<String> = (1..=60).map(|n| format!("line {n}")).collect();
    let mut app = app_with_result(&server, &text.join("\n"), EditTrigger::Button).await;

    app.scroll_result_down(1000);
    let screen = render(&mut app, 100, 40);
    assert!(screen.contains("line 60"));
    assert!(!screen.contains("line 1 "));
    assert!(app.result_scroll() > 0 && app.result_scroll() < 60);

    app.scroll_result_up(u16::MAX);
    let screen = render(&mut app, 100, 40);
    assert!(screen.contains("line 1 "));
}

#[tokio::test]
async fn word_wrapped_result_tail_is_reachable() {
    let server = start_service_mock().await;
    let sentence = "Check the abcdefgh ijklmnopq rstuvwxyz supply rails before lmnopqrst uvwxyzab cdefghijkl mnopq resets.";
    let mut text = vec![sentence; 12].join(" ");
    text.push_str("\nTAILMARKER");
    let mut app = app_with_result(&server, &text, EditTrigger::Button).await;

    app.scroll_result_down(u16::MAX);
    let screen = render(&mut app, 40, 30);
    assert!(screen.contains("TAILMARKER"), "{screen}");
    assert!(app.result_scroll() > 0);
    assert!(!screen.contains('↓'));
}
