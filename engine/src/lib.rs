//! Core engine for devlens - form, submission and result editing state.
//!
//! This crate contains the App state machine without TUI dependencies.
//!
//! # Architecture
//!
//! - [`SubmissionController`] owns the request lifecycle and the result/error it produced
//! - [`EditableResult`] is the controlled inline editor for the displayed result
//! - [`App`] owns the authoritative result text, the form, and keyboard focus, and
//!   routes commits from the editor back into that text

use anyhow::Context;

pub use devlens_service::{ServiceEndpoint, normalize_base_url};
pub use devlens_types::{
    EditTrigger, FALLBACK_ANALYSIS_TEXT, FieldSpec, FormField, NonEmptyString, ServiceVariant,
    ui::{DraftInput, UiOptions},
};

mod config;
mod editable;
mod form;
mod submission;

pub use config::{
    AppConfig, BASE_URL_ENV, ConfigError, DevlensConfig, EDIT_TRIGGER_ENV, ServiceConfig,
    Settings, VARIANT_ENV, config_path, expand_env_vars,
};
pub use editable::{EditMode, EditOutcome, EditableResult, EntryTarget};
pub use form::{Focus, Form};
pub use submission::{SubmissionController, SubmissionPhase, SubmissionState, SubmitRejected};

pub const FALLBACK_NOTICE: &str = "Service response had no analysis text";

/// What the area under the form shows. Exactly one variant applies at a time.
#[derive(Debug, Clone, Copy)]
pub enum ResultView<'a> {
    /// Nothing submitted yet.
    Empty,
    Progress,
    Error(&'a str),
    Result(&'a EditableResult),
}

#[derive(Debug)]
pub struct App {
    settings: Settings,
    form: Form,
    controller: SubmissionController,
    /// Authoritative text of the displayed result. `None` when no result is shown.
    analysis: Option<String>,
    editor: EditableResult,
    focus: Focus,
    result_scroll: u16,
    status_message: Option<String>,
    tick: usize,
    should_quit: bool,
}

impl App {
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let client =
            devlens_service::http_client(settings.timeout).context("failed to build HTTP client")?;
        let endpoint = ServiceEndpoint::new(&settings.base_url, settings.variant);
        if settings.base_url.is_empty() {
            tracing::warn!("No service base URL configured; submissions will fail");
        }
        tracing::info!(
            url = %endpoint.url(),
            variant = settings.variant.as_str(),
            "Service endpoint configured"
        );

        Ok(Self {
            form: Form::new(settings.variant),
            controller: SubmissionController::new(client, endpoint),
            analysis: None,
            editor: EditableResult::new(String::new(), settings.edit_trigger),
            focus: Focus::Field(FormField::Primary),
            result_scroll: 0,
            status_message: None,
            tick: 0,
            should_quit: false,
            settings,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn variant(&self) -> ServiceVariant {
        self.settings.variant
    }

    pub fn ui_options(&self) -> UiOptions {
        self.settings.ui
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn submission(&self) -> &SubmissionState {
        self.controller.state()
    }

    pub fn analysis(&self) -> Option<&str> {
        self.analysis.as_deref()
    }

    pub fn editor(&self) -> &EditableResult {
        &self.editor
    }

    pub fn result_scroll(&self) -> u16 {
        self.result_scroll
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn tick_count(&self) -> usize {
        self.tick
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn request_quit(&mut self) {
        self.should_quit = true;
    }

    pub fn submit_enabled(&self) -> bool {
        self.controller.can_submit(self.form.primary_text())
    }

    /// Label for the submit control; mirrors the in-flight state.
    pub fn submit_label(&self) -> &'static str {
        if self.controller.is_in_flight() {
            self.settings.variant.busy_label()
        } else {
            self.settings.variant.submit_label()
        }
    }

    pub fn result_view(&self) -> ResultView<'_> {
        match self.controller.state() {
            SubmissionState::InFlight => ResultView::Progress,
            SubmissionState::Failed { error } => ResultView::Error(error.as_str()),
            SubmissionState::Succeeded { .. } if self.analysis.is_some() => {
                ResultView::Result(&self.editor)
            }
            SubmissionState::Succeeded { .. } | SubmissionState::Idle => ResultView::Empty,
        }
    }

    fn result_visible(&self) -> bool {
        matches!(self.result_view(), ResultView::Result(_))
    }

    // ========================================================================
    // Frame loop
    // ========================================================================

    /// Advance one frame: spinner tick plus any finished submission.
    pub fn tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
        if let Some(phase) = self.controller.poll_completion() {
            self.on_submission_finished(phase);
        }
    }

    /// Wait for the outstanding submission, if any.
    pub async fn settle(&mut self) {
        if let Some(phase) = self.controller.settle().await {
            self.on_submission_finished(phase);
        }
    }

    fn on_submission_finished(&mut self, phase: SubmissionPhase) {
        match self.controller.state() {
            SubmissionState::Succeeded {
                result,
                used_fallback,
            } => {
                self.analysis = Some(result.as_str().to_string());
                self.editor.sync_upstream(result.as_str());
                self.result_scroll = 0;
                if *used_fallback {
                    self.status_message = Some(FALLBACK_NOTICE.to_string());
                }
            }
            SubmissionState::Failed { .. } => {
                self.analysis = None;
                self.editor.sync_upstream("");
            }
            SubmissionState::Idle | SubmissionState::InFlight => {}
        }
        tracing::debug!(?phase, "Submission finished");
    }

    // ========================================================================
    // Submission
    // ========================================================================

    /// Submit the form. A no-op while in flight; a status hint when the primary text is blank.
    pub fn submit(&mut self) {
        if self.editor.is_editing() {
            let outcome = self.editor.blur();
            self.apply_edit_outcome(outcome);
        }

        let (primary, secondary, instruction) = self.form.submission_fields();
        match self.controller.submit(primary, secondary, instruction) {
            Ok(()) => {
                self.analysis = None;
                self.editor.sync_upstream("");
                self.result_scroll = 0;
                self.status_message = None;
                if matches!(self.focus, Focus::EditButton | Focus::Result) {
                    self.focus = Focus::Submit;
                }
            }
            Err(SubmitRejected::InFlight) => {}
            Err(SubmitRejected::Invalid(_)) => {
                let label = self.form.spec(FormField::Primary).label;
                self.status_message = Some(format!("{label} is required"));
            }
        }
    }

    // ========================================================================
    // Focus
    // ========================================================================

    /// Tab order for the current screen.
    pub fn focus_order(&self) -> Vec<Focus> {
        let mut order: Vec<Focus> = self.form.fields().iter().copied().map(Focus::Field).collect();
        order.push(Focus::Submit);
        if self.result_visible() {
            order.push(self.edit_entry_focus());
        }
        order
    }

    /// Where focus rests on the result when not editing.
    fn edit_entry_focus(&self) -> Focus {
        match self.editor.trigger() {
            EditTrigger::Button => Focus::EditButton,
            EditTrigger::Direct => Focus::Result,
        }
    }

    pub fn focus_next(&mut self) {
        self.cycle_focus(true);
    }

    pub fn focus_prev(&mut self) {
        self.cycle_focus(false);
    }

    fn cycle_focus(&mut self, forward: bool) {
        let order = self.focus_order();
        let current = order
            .iter()
            .position(|focus| *focus == self.focus)
            .or_else(|| {
                let entry = self.edit_entry_focus();
                order.iter().position(|focus| *focus == entry)
            })
            .unwrap_or(0);
        let len = order.len();
        let next = if forward {
            (current + 1) % len
        } else {
            (current + len - 1) % len
        };
        self.set_focus(order[next]);
    }

    /// Move focus. Leaving an active editor commits it.
    pub fn set_focus(&mut self, focus: Focus) {
        if focus == self.focus {
            return;
        }
        if self.focus == Focus::Result && self.editor.is_editing() {
            let outcome = self.editor.blur();
            self.apply_edit_outcome(outcome);
        }
        self.focus = focus;
    }

    // ========================================================================
    // Result editing
    // ========================================================================

    /// Enter/Space on the focused control.
    pub fn activate_focused(&mut self) {
        match self.focus {
            Focus::Submit => self.submit(),
            Focus::EditButton => self.activate_editor(EntryTarget::Button),
            Focus::Result => self.activate_editor(EntryTarget::Text),
            Focus::Field(_) => {}
        }
    }

    fn activate_editor(&mut self, target: EntryTarget) {
        if !self.result_visible() {
            return;
        }
        let outcome = self.editor.activate(target);
        self.apply_edit_outcome(outcome);
    }

    /// Keyboard shortcut: edit regardless of the configured entry surface.
    pub fn begin_result_edit(&mut self) {
        if !self.result_visible() {
            return;
        }
        let outcome = self.editor.begin_edit();
        self.apply_edit_outcome(outcome);
    }

    pub fn commit_result_edit(&mut self) {
        let outcome = self.editor.commit();
        self.apply_edit_outcome(outcome);
    }

    pub fn cancel_result_edit(&mut self) {
        let outcome = self.editor.cancel();
        self.apply_edit_outcome(outcome);
    }

    fn apply_edit_outcome(&mut self, outcome: EditOutcome) {
        match outcome {
            EditOutcome::Began => {
                self.focus = Focus::Result;
                self.status_message = None;
            }
            EditOutcome::Committed(text) => {
                tracing::info!(chars = text.chars().count(), "Result text updated by reviewer");
                self.analysis = Some(text);
                self.focus = self.edit_entry_focus();
            }
            EditOutcome::Cancelled => {
                self.focus = self.edit_entry_focus();
            }
            EditOutcome::Ignored => {}
        }
    }

    pub fn scroll_result_up(&mut self, lines: u16) {
        self.result_scroll = self.result_scroll.saturating_sub(lines);
    }

    pub fn scroll_result_down(&mut self, lines: u16) {
        self.result_scroll = self.result_scroll.saturating_add(lines);
    }

    /// Keep the scroll offset within the rendered content.
    pub fn clamp_result_scroll(&mut self, max: u16) {
        self.result_scroll = self.result_scroll.min(max);
    }

    // ========================================================================
    // Text input
    // ========================================================================

    /// The text buffer keyboard input goes to, if any.
    pub fn focused_input(&self) -> Option<&DraftInput> {
        match self.focus {
            Focus::Field(field) => Some(self.form.field(field)),
            Focus::Result => self.editor.draft(),
            Focus::Submit | Focus::EditButton => None,
        }
    }

    pub fn focused_input_mut(&mut self) -> Option<&mut DraftInput> {
        match self.focus {
            Focus::Field(field) => Some(self.form.field_mut(field)),
            Focus::Result => self.editor.draft_mut(),
            Focus::Submit | Focus::EditButton => None,
        }
    }

    pub fn form_field_mut(&mut self, field: FormField) -> &mut DraftInput {
        self.form.field_mut(field)
    }

    /// Whether the focused buffer accepts newlines.
    pub fn focused_input_multiline(&self) -> bool {
        match self.focus {
            Focus::Field(field) => self.form.spec(field).multiline,
            Focus::Result => self.editor.is_editing(),
            Focus::Submit | Focus::EditButton => false,
        }
    }

    /// Insert pasted text into the focused buffer.
    ///
    /// Line endings are normalized; single-line fields get spaces instead of newlines.
    pub fn insert_paste(&mut self, text: &str) {
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        let text = if self.focused_input_multiline() {
            normalized
        } else {
            normalized.replace('\n', " ")
        };
        if let Some(input) = self.focused_input_mut() {
            input.enter_text(&text);
        }
    }
}
