//! TUI rendering for devlens using ratatui.

mod input;
mod theme;

pub use input::{InputPump, apply_event, handle_events, handle_key};
pub use theme::{Glyphs, Palette, glyphs, palette, spinner_frame, styles};

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use devlens_engine::{
    App, DraftInput, EditTrigger, EditableResult, Focus, FormField, ResultView,
};
use devlens_types::sanitize_terminal_text;

const MULTILINE_FIELD_HEIGHT: u16 = 6;
const SOLE_FIELD_HEIGHT: u16 = 10;
const SINGLE_LINE_FIELD_HEIGHT: u16 = 3;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
    let options = app.ui_options();
    let palette = palette(options);
    let glyphs = glyphs(options);
    // Clear with background color
    let bg_block = Block::default().style(Style::default().bg(palette.bg_dark));
    frame.render_widget(bg_block, frame.area());

    let fields = app.form().fields();
    let mut constraints = vec![Constraint::Length(1)];
    for field in fields {
        let height = if !app.form().spec(*field).multiline {
            SINGLE_LINE_FIELD_HEIGHT
        } else if fields.len() == 1 {
            SOLE_FIELD_HEIGHT
        } else {
            MULTILINE_FIELD_HEIGHT
        };
        constraints.push(Constraint::Length(height));
    }
    constraints.extend([
        Constraint::Length(1), // Submit
        Constraint::Min(3),    // Result / progress / error
        Constraint::Length(1), // Status bar
    ]);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(constraints)
        .split(frame.area());

    let title = Paragraph::new(Line::from(Span::styled(
        app.variant().title(),
        styles::title(&palette),
    )))
    .alignment(Alignment::Center);
    frame.render_widget(title, chunks[0]);

    for (idx, field) in fields.iter().enumerate() {
        draw_field(frame, app, *field, chunks[idx + 1], &palette);
    }

    let rest = fields.len() + 1;
    draw_submit(frame, app, chunks[rest], &palette, &glyphs);
    draw_result_area(frame, app, chunks[rest + 1], &palette, &glyphs);
    draw_status_bar(frame, app, chunks[rest + 2], &palette, &glyphs);
}

fn draw_field(frame: &mut Frame, app: &App, field: FormField, area: Rect, palette: &Palette) {
    let spec = app.form().spec(field);
    let draft = app.form().field(field);
    let focused = app.focus() == Focus::Field(field);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(styles::border(palette, focused))
        .title(Line::from(Span::styled(
            format!(" {} ", spec.label),
            Style::default().fg(palette.text_secondary),
        )));
    let inner = block.inner(area);

    let (lines, cursor) = if draft.text().is_empty() {
        (
            vec![Line::from(Span::styled(
                spec.placeholder,
                styles::placeholder(palette),
            ))],
            (0, 0),
        )
    } else {
        let window = DraftWindow::new(draft, inner.width, inner.height);
        (window.styled_lines(palette), window.cursor)
    };

    frame.render_widget(Paragraph::new(lines).block(block), area);
    if focused {
        frame.set_cursor_position((inner.x + cursor.0, inner.y + cursor.1));
    }
}

fn draw_submit(frame: &mut Frame, app: &App, area: Rect, palette: &Palette, glyphs: &Glyphs) {
    let focused = app.focus() == Focus::Submit;
    let marker = if focused { glyphs.selected } else { " " };
    let line = Line::from(vec![
        Span::styled(format!("{marker} "), Style::default().fg(palette.accent)),
        Span::styled(
            format!("[ {} ]", app.submit_label()),
            styles::button(palette, focused, app.submit_enabled()),
        ),
        Span::styled("  F5", styles::key_highlight(palette)),
        Span::styled(" submit", styles::key_hint(palette)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_result_area(
    frame: &mut Frame,
    app: &mut App,
    area: Rect,
    palette: &Palette,
    glyphs: &Glyphs,
) {
    match app.result_view() {
        ResultView::Empty => {
            let primary = app.form().spec(FormField::Primary).label;
            let hint = format!(
                "Fill in {primary} and press {} to get started.",
                app.variant().submit_label()
            );
            let paragraph = Paragraph::new(Line::from(Span::styled(hint, styles::key_hint(palette))))
                .wrap(Wrap { trim: false });
            frame.render_widget(paragraph, area);
        }
        ResultView::Progress => {
            let spinner = spinner_frame(app.tick_count(), app.ui_options());
            let line = Line::from(Span::styled(
                format!("{spinner} {}", app.variant().busy_label()),
                Style::default().fg(palette.primary),
            ));
            frame.render_widget(Paragraph::new(line), area);
        }
        ResultView::Error(message) => {
            let message = sanitize_terminal_text(message);
            let line = Line::from(vec![
                Span::styled(format!("{} Error: ", glyphs.error), styles::error(palette)),
                Span::styled(message.into_owned(), Style::default().fg(palette.error)),
            ]);
            frame.render_widget(Paragraph::new(line).wrap(Wrap { trim: false }), area);
        }
        ResultView::Result(editor) => {
            let max_scroll = draw_result(frame, app, editor, area, palette, glyphs);
            app.clamp_result_scroll(max_scroll);
        }
    }
}

/// Render the result panel. Returns the largest useful scroll offset.
fn draw_result(
    frame: &mut Frame,
    app: &App,
    editor: &EditableResult,
    area: Rect,
    palette: &Palette,
    glyphs: &Glyphs,
) -> u16 {
    let editing = editor.is_editing();
    let focus = app.focus();
    let panel_focused = matches!(focus, Focus::Result | Focus::EditButton);

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(styles::border(palette, panel_focused))
        .title(Line::from(Span::styled(
            format!(" {} ", app.variant().result_title()),
            styles::title(palette),
        )));

    if editor.trigger() == EditTrigger::Button && !editing {
        block = block.title_top(
            Line::from(Span::styled(
                format!("[ {} Edit ]", glyphs.edit),
                styles::button(palette, focus == Focus::EditButton, true),
            ))
            .alignment(Alignment::Right),
        );
    }

    let footer = if editing {
        Some(editing_hints(palette))
    } else if editor.trigger() == EditTrigger::Direct && focus == Focus::Result {
        Some(vec![
            Span::styled(" Enter", styles::key_highlight(palette)),
            Span::styled(" edit ", styles::key_hint(palette)),
        ])
    } else {
        None
    };
    if let Some(footer) = footer {
        block = block.title_bottom(Line::from(footer).alignment(Alignment::Right));
    }

    let inner = block.inner(area);

    if let Some(draft) = editor.draft() {
        let window = DraftWindow::new(draft, inner.width, inner.height);
        frame.render_widget(
            Paragraph::new(window.styled_lines(palette)).block(block),
            area,
        );
        frame.set_cursor_position((inner.x + window.cursor.0, inner.y + window.cursor.1));
        return 0;
    }

    let committed = sanitize_terminal_text(editor.committed());
    let text: Vec<Line> = if committed.is_empty() {
        vec![Line::from(Span::styled("(empty)", styles::placeholder(palette)))]
    } else {
        committed
            .split('\n')
            .map(|line| {
                Line::from(Span::styled(
                    line.to_string(),
                    Style::default().fg(palette.text_primary),
                ))
            })
            .collect()
    };

    let rows = wrapped_line_count(&text, inner.width);
    let max_scroll = rows.saturating_sub(inner.height);
    let scroll = app.result_scroll().min(max_scroll);

    if scroll > 0 {
        block = block.title_bottom(Line::from(Span::styled(
            format!(" {} ", glyphs.arrow_up),
            styles::key_hint(palette),
        )));
    }
    if scroll < max_scroll {
        block = block.title_bottom(Line::from(Span::styled(
            format!(" {} ", glyphs.arrow_down),
            styles::key_hint(palette),
        )));
    }

    let paragraph = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
    max_scroll
}

fn editing_hints(palette: &Palette) -> Vec<Span<'static>> {
    vec![
        Span::styled(" Enter", styles::key_highlight(palette)),
        Span::styled(" save  ", styles::key_hint(palette)),
        Span::styled("Shift+Enter", styles::key_highlight(palette)),
        Span::styled(" newline  ", styles::key_hint(palette)),
        Span::styled("Esc", styles::key_highlight(palette)),
        Span::styled(" cancel ", styles::key_hint(palette)),
    ]
}

/// Rows `lines` occupy under the same word wrap the result paragraph renders with.
fn wrapped_line_count(lines: &[Line], width: u16) -> u16 {
    if lines.is_empty() {
        return 0;
    }
    let rows = Paragraph::new(lines.to_vec())
        .wrap(Wrap { trim: false })
        .line_count(width.max(1));
    u16::try_from(rows).unwrap_or(u16::MAX)
}

pub(crate) fn draw_status_bar(
    frame: &mut Frame,
    app: &App,
    area: Rect,
    palette: &Palette,
    glyphs: &Glyphs,
) {
    let left = if let Some(msg) = app.status_message() {
        Line::from(vec![
            Span::raw(" "),
            Span::styled(
                format!("{} {msg}", glyphs.warning),
                Style::default().fg(palette.warning),
            ),
        ])
    } else {
        let mut spans = vec![Span::raw(" ")];
        spans.extend(focus_hints(app, palette));
        Line::from(spans)
    };

    let base_url = app.settings().base_url.as_str();
    let (endpoint, endpoint_style) = if base_url.is_empty() {
        ("no service URL".to_string(), Style::default().fg(palette.error))
    } else {
        (base_url.to_string(), Style::default().fg(palette.text_muted))
    };
    let right = Line::from(Span::styled(format!("{endpoint} "), endpoint_style))
        .alignment(Alignment::Right);

    frame.render_widget(Paragraph::new(left), area);
    frame.render_widget(Paragraph::new(right), area);
}

fn focus_hints(app: &App, palette: &Palette) -> Vec<Span<'static>> {
    let key = |k: &'static str| Span::styled(k, styles::key_highlight(palette));
    let hint = |h: &'static str| Span::styled(h, styles::key_hint(palette));

    if app.editor().is_editing() {
        return editing_hints(palette);
    }
    let mut spans = vec![key("Tab"), hint(" next  ")];
    match app.focus() {
        Focus::Field(_) | Focus::Submit => {}
        Focus::EditButton | Focus::Result => {
            spans.extend([key("Enter/e"), hint(" edit  "), key("↑↓"), hint(" scroll  ")]);
        }
    }
    spans.extend([key("Ctrl+C"), hint(" quit")]);
    spans
}

/// Visible slice of a draft sized to a text area, scrolled to keep the cursor in view.
struct DraftWindow {
    lines: Vec<String>,
    /// Cursor column and row relative to the text area.
    cursor: (u16, u16),
}

impl DraftWindow {
    fn new(draft: &DraftInput, width: u16, height: u16) -> Self {
        let width = usize::from(width.max(1));
        let height = usize::from(height.max(1));
        let (cursor_line, before_cursor) = draft.cursor_line();
        let cursor_col = before_cursor.width();

        let raw_lines: Vec<&str> = draft.text().split('\n').collect();
        let start = (cursor_line + 1).saturating_sub(height);
        let end = (start + height).min(raw_lines.len());

        let mut horizontal_scroll = 0;
        let mut lines = Vec::with_capacity(end - start);
        for (offset, line) in raw_lines[start..end].iter().enumerate() {
            if start + offset == cursor_line && cursor_col >= width {
                let (visible, skipped) = skip_display_width(line, cursor_col - width + 1);
                horizontal_scroll = skipped;
                lines.push(visible.to_string());
            } else {
                lines.push((*line).to_string());
            }
        }

        let col = cursor_col.saturating_sub(horizontal_scroll);
        let row = cursor_line - start;
        Self {
            lines,
            cursor: (col as u16, row as u16),
        }
    }

    fn styled_lines(&self, palette: &Palette) -> Vec<Line<'static>> {
        self.lines
            .iter()
            .map(|line| {
                Line::from(Span::styled(
                    sanitize_terminal_text(line).into_owned(),
                    Style::default().fg(palette.text_primary),
                ))
            })
            .collect()
    }
}

/// Drop leading graphemes until at least `target` columns are skipped.
fn skip_display_width(line: &str, target: usize) -> (&str, usize) {
    let mut skipped = 0;
    for (idx, grapheme) in line.grapheme_indices(true) {
        if skipped >= target {
            return (&line[idx..], skipped);
        }
        skipped += grapheme.width();
    }
    ("", skipped)
}
