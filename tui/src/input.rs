//! Input handling for the devlens TUI.
//!
//! Key policy:
//!
//! | Key | Form field | Result editor | Controls |
//! |-----|-----------|---------------|----------|
//! | `Enter` | newline (multi-line) / submit (single-line) | commit | activate |
//! | `Shift+Enter`, `Ctrl+Enter`, `Ctrl+J` | newline (multi-line) | newline | - |
//! | `Alt+Enter` | - | ignored | - |
//! | `Esc` | - | cancel | - |
//! | `Tab` / `Shift+Tab` | next / previous focus, committing an active edit | | |
//! | `F5` | submit from anywhere | | |
//! | `Ctrl+C`, `Ctrl+Q` | quit | | |

use anyhow::{Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};
use tokio::sync::mpsc;
use tracing::debug;

use devlens_engine::{App, DraftInput, Focus, FormField};

const INPUT_POLL_TIMEOUT: Duration = Duration::from_millis(25); // shutdown responsiveness
const INPUT_CHANNEL_CAPACITY: usize = 1024; // bounded: no OOM
const MAX_EVENTS_PER_FRAME: usize = 64; // never starve rendering
const RESULT_PAGE_LINES: u16 = 10;

/// Heuristics for detecting paste when the terminal doesn't emit `Event::Paste`.
///
/// Without bracketed paste a paste arrives as a burst of key events. During a
/// burst, bare `Enter` must insert a newline instead of committing or submitting.
const PASTE_INTER_KEY_THRESHOLD: Duration = Duration::from_millis(20);
const PASTE_IDLE_TIMEOUT: Duration = Duration::from_millis(75);
const PASTE_QUEUE_THRESHOLD: usize = 32;

enum InputMsg {
    Event(Event),
    Error(String),
}

/// Timing mechanism for detecting paste bursts.
#[derive(Debug)]
struct PasteDetector {
    last_key_time: Instant,
    active_until: Instant,
}

impl PasteDetector {
    fn new(now: Instant) -> Self {
        Self {
            last_key_time: now,
            active_until: now,
        }
    }

    fn reset(&mut self, now: Instant) {
        self.last_key_time = now;
        self.active_until = now;
    }

    fn update(&mut self, now: Instant, backlog: usize, event: &Event) -> bool {
        // Only key press + repeat events participate in detection.
        let is_key_event = matches!(
            event,
            Event::Key(KeyEvent {
                kind: KeyEventKind::Press | KeyEventKind::Repeat,
                ..
            })
        );

        let was_active = now < self.active_until;
        let backlog_high = backlog >= PASTE_QUEUE_THRESHOLD;
        let rapid =
            is_key_event && now.duration_since(self.last_key_time) < PASTE_INTER_KEY_THRESHOLD;

        let active = was_active || backlog_high || rapid;

        if is_key_event {
            if active {
                // Keep paste mode alive across frame pacing and scheduling hiccups.
                self.active_until = now + PASTE_IDLE_TIMEOUT;
            }
            self.last_key_time = now;
        }

        active
    }
}

pub struct InputPump {
    rx: mpsc::Receiver<InputMsg>,
    stop: Arc<AtomicBool>,
    join: Option<tokio::task::JoinHandle<()>>,
    paste: PasteDetector,
}

impl InputPump {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
        let stop = Arc::new(AtomicBool::new(false));
        let stop2 = stop.clone();

        let join = tokio::task::spawn_blocking(move || input_loop(stop2, tx));
        Self {
            rx,
            stop,
            join: Some(join),
            paste: PasteDetector::new(Instant::now()),
        }
    }

    pub async fn shutdown(&mut self) {
        // Close the receiver first so a backpressured input thread unblocks.
        self.rx.close();

        self.stop.store(true, Ordering::Release);
        if let Some(join) = self.join.take() {
            let _ = tokio::time::timeout(Duration::from_secs(2), join).await;
        }
    }
}

impl Default for InputPump {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InputPump {
    fn drop(&mut self) {
        // Best-effort stop if caller exits early; do not block in Drop.
        self.rx.close();
        self.stop.store(true, Ordering::Release);
    }
}

fn input_loop(stop: Arc<AtomicBool>, tx: mpsc::Sender<InputMsg>) {
    while !stop.load(Ordering::Acquire) {
        match event::poll(INPUT_POLL_TIMEOUT) {
            Ok(true) => match event::read() {
                Ok(ev) => {
                    // Bounded queue: apply backpressure instead of dropping events.
                    if tx.blocking_send(InputMsg::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.blocking_send(InputMsg::Error(e.to_string()));
                    break;
                }
            },
            Ok(false) => {}
            Err(e) => {
                let _ = tx.blocking_send(InputMsg::Error(e.to_string()));
                break;
            }
        }
    }
}

/// Drain queued input for this frame. Returns `true` when the app should quit.
pub fn handle_events(app: &mut App, input: &mut InputPump) -> Result<bool> {
    let mut processed = 0;
    while processed < MAX_EVENTS_PER_FRAME {
        let ev = match input.rx.try_recv() {
            Ok(InputMsg::Event(ev)) => ev,
            Ok(InputMsg::Error(msg)) => return Err(anyhow!("input error: {msg}")),
            Err(mpsc::error::TryRecvError::Empty) => break,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                return Err(anyhow!("input pump disconnected"));
            }
        };

        let now = Instant::now();
        let backlog = input.rx.len();

        let paste_active = if app.focused_input().is_some() {
            input.paste.update(now, backlog, &ev)
        } else {
            input.paste.reset(now);
            false
        };

        if paste_active {
            debug!(backlog, "Input paste detection active (fallback heuristics)");
        }

        if apply_event(app, ev, paste_active) {
            return Ok(true);
        }

        processed += 1;
    }
    Ok(app.should_quit())
}

/// Apply one terminal event. Returns `true` when the app should quit.
pub fn apply_event(app: &mut App, event: Event, paste_active: bool) -> bool {
    match event {
        Event::Key(key) => {
            // Handle press + repeat events (ignore releases)
            if !matches!(key.kind, KeyEventKind::Release) {
                handle_key(app, key, paste_active);
            }
        }
        Event::Paste(text) => app.insert_paste(&text),
        _ => {}
    }
    app.should_quit()
}

pub fn handle_key(app: &mut App, key: KeyEvent, paste_active: bool) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c' | 'q') if ctrl => {
            app.request_quit();
            return;
        }
        KeyCode::F(5) => {
            app.submit();
            return;
        }
        // A pasted tab is content, not navigation.
        KeyCode::Tab if paste_active => {
            if let Some(input) = app.focused_input_mut() {
                input.enter_char('\t');
            }
            return;
        }
        KeyCode::Tab => {
            app.focus_next();
            return;
        }
        KeyCode::BackTab => {
            app.focus_prev();
            return;
        }
        _ => {}
    }

    match app.focus() {
        Focus::Result if app.editor().is_editing() => handle_editor_key(app, key, paste_active),
        Focus::Field(field) => handle_field_key(app, field, key, paste_active),
        Focus::Submit => match key.code {
            KeyCode::Enter | KeyCode::Char(' ') => app.submit(),
            KeyCode::Char('e') => app.begin_result_edit(),
            _ => {}
        },
        Focus::EditButton | Focus::Result => match key.code {
            KeyCode::Enter | KeyCode::Char(' ') => app.activate_focused(),
            KeyCode::Char('e') => app.begin_result_edit(),
            KeyCode::Up | KeyCode::Char('k') => app.scroll_result_up(1),
            KeyCode::Down | KeyCode::Char('j') => app.scroll_result_down(1),
            KeyCode::PageUp => app.scroll_result_up(RESULT_PAGE_LINES),
            KeyCode::PageDown => app.scroll_result_down(RESULT_PAGE_LINES),
            KeyCode::Home | KeyCode::Char('g') => app.scroll_result_up(u16::MAX),
            _ => {}
        },
    }
}

/// Shift+Enter, Ctrl+Enter and Ctrl+J always mean "newline".
fn is_explicit_newline(key: KeyEvent) -> bool {
    matches!(
        (key.code, key.modifiers),
        (KeyCode::Enter, m) if m.contains(KeyModifiers::CONTROL) || m.contains(KeyModifiers::SHIFT)
    ) || matches!(key, KeyEvent { code: KeyCode::Char('j'), modifiers: m, .. } if m.contains(KeyModifiers::CONTROL))
}

fn is_bare_enter(key: KeyEvent) -> bool {
    key.code == KeyCode::Enter && key.modifiers.is_empty()
}

fn handle_editor_key(app: &mut App, key: KeyEvent, paste_active: bool) {
    if is_explicit_newline(key) || (paste_active && is_bare_enter(key)) {
        if let Some(draft) = app.focused_input_mut() {
            draft.enter_newline();
        }
        return;
    }

    match key.code {
        KeyCode::Enter if is_bare_enter(key) => app.commit_result_edit(),
        // Alt+Enter and other chords neither commit nor insert.
        KeyCode::Enter => {}
        KeyCode::Esc => app.cancel_result_edit(),
        _ => {
            if let Some(draft) = app.focused_input_mut() {
                edit_draft(draft, key);
            }
        }
    }
}

fn handle_field_key(app: &mut App, field: FormField, key: KeyEvent, paste_active: bool) {
    let multiline = app.form().spec(field).multiline;

    if is_explicit_newline(key) || is_bare_enter(key) {
        if multiline {
            app.form_field_mut(field).enter_newline();
        } else if paste_active {
            app.form_field_mut(field).enter_char(' ');
        } else if is_bare_enter(key) {
            app.submit();
        }
        return;
    }

    edit_draft(app.form_field_mut(field), key);
}

/// Cursor movement, deletion and character entry shared by every text buffer.
fn edit_draft(draft: &mut DraftInput, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Backspace => draft.delete_char(),
        KeyCode::Delete => draft.delete_char_forward(),
        KeyCode::Left => draft.move_cursor_left(),
        KeyCode::Right => draft.move_cursor_right(),
        KeyCode::Home => draft.move_line_start(),
        KeyCode::End => draft.move_line_end(),
        KeyCode::Char('a') if ctrl => draft.move_line_start(),
        KeyCode::Char('e') if ctrl => draft.move_line_end(),
        KeyCode::Char('u') if ctrl => draft.clear(),
        KeyCode::Char('w') if ctrl => draft.delete_word_backwards(),
        // Ignore \r - it's handled via Enter or normalized in paste
        KeyCode::Char(c) if c != '\r' && !ctrl => draft.enter_char(c),
        _ => {}
    }
}
