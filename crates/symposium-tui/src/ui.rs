use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};
use symposium_core::{AssistantState, TurnBody};
use crate::app::{App, FocusPane, InputMode};

/// Convert **bold** markdown in a line of answer text to styled spans.
/// Anything fancier is rendered as-is.
fn markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("**") {
        let after = &rest[start + 2..];
        match after.find("**") {
            Some(end) => {
                if start > 0 {
                    spans.push(Span::raw(rest[..start].to_string()));
                }
                spans.push(Span::styled(
                    after[..end].to_string(),
                    Style::default().add_modifier(Modifier::BOLD),
                ));
                rest = &after[end + 2..];
            }
            // Unmatched marker, treat the tail as literal
            None => break,
        }
    }

    if !rest.is_empty() {
        spans.push(Span::raw(rest.to_string()));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header_area);
    render_chat_screen(app, frame, body_area);
    render_footer(app, frame, footer_area);
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(
            " Electoral Awards Assistant ",
            Style::default().fg(Color::Cyan).bold(),
        ),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_label, mode_style) = match app.input_mode {
        InputMode::Normal => (" NORMAL ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" INSERT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    let hints = match app.input_mode {
        InputMode::Normal => " q quit | i type | Tab follow-ups | j/k scroll | Enter ask",
        InputMode::Editing => " Enter send | Esc normal mode | Tab follow-ups",
    };

    let footer = Line::from(vec![
        Span::styled(mode_label, mode_style),
        Span::styled(hints, Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(footer), area);
}

fn render_chat_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let suggestions = app.suggestions();

    // Suggested questions panel height (if we have any)
    let suggestions_height = if suggestions.is_empty() {
        0
    } else {
        (suggestions.len().min(4) + 2) as u16 // +2 for borders
    };

    let [chat_area, suggestions_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(suggestions_height),
        Constraint::Length(3),
    ])
    .areas(area);

    // Store chat dimensions for scroll calculations (inner size minus borders)
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    render_chat(app, frame, chat_area);
    if suggestions_height > 0 {
        render_suggestions(app, &suggestions, frame, suggestions_area);
    }
    render_input(app, frame, input_area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Conversation ");

    let turns = app.controller.turns();
    let chat_text = if turns.is_empty() {
        Text::from(vec![
            Line::default(),
            Line::from(Span::styled(
                " Ask me about the International Electoral Awards & Symposium.",
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(Span::styled(
                " Learn about award categories and the submission process.",
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(Span::styled(
                " Get details about schedules and logistics.",
                Style::default().fg(Color::DarkGray),
            )),
        ])
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for turn in turns {
            match &turn.body {
                TurnBody::User { text } => {
                    lines.push(Line::from(Span::styled(
                        "You:",
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    )));
                    for line in text.lines() {
                        lines.push(Line::from(line.to_string()));
                    }
                    lines.push(Line::default());
                }
                TurnBody::Assistant(state) => {
                    lines.push(Line::from(Span::styled(
                        "AI:",
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    )));
                    match state {
                        AssistantState::Pending { .. } => {
                            // Animated ellipsis: cycles through ".", "..", "..."
                            let dots = ".".repeat((app.animation_frame as usize) + 1);
                            lines.push(Line::from(Span::styled(
                                format!("Thinking{}", dots),
                                Style::default()
                                    .fg(Color::DarkGray)
                                    .add_modifier(Modifier::ITALIC),
                            )));
                        }
                        AssistantState::Answered { envelope } => {
                            for line in envelope.response.lines() {
                                lines.push(markdown_line(line));
                            }
                        }
                        AssistantState::Failed { message, .. } => {
                            lines.push(Line::from(Span::styled(
                                message.clone(),
                                Style::default().fg(Color::Red),
                            )));
                        }
                    }
                    lines.push(Line::default());
                }
            }
        }

        Text::from(lines)
    };

    let chat = Paragraph::new(chat_text)
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_suggestions(app: &mut App, suggestions: &[String], frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Suggestions;
    let border_color = if focused { Color::Cyan } else { Color::Magenta };
    let title = if app.is_loading() {
        " Suggested questions (waiting for reply) "
    } else {
        " Suggested questions (Tab to focus, Enter to ask) "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let item_style = if app.is_loading() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };
    let items: Vec<ListItem> = suggestions
        .iter()
        .enumerate()
        .map(|(i, question)| ListItem::new(format!(" {}. {} ", i + 1, question)).style(item_style))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Magenta)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.suggestions_state);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let input_focused = app.focus == FocusPane::Input;
    let border_color = if input_focused || app.input_mode == InputMode::Editing {
        Color::Yellow
    } else {
        Color::DarkGray
    };

    let title = if app.is_loading() {
        " Waiting for reply... "
    } else {
        " Ask (Enter to send) "
    };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scroll keeps the cursor visible in a single-line box.
    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.cursor;

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, area);

    // Show cursor when editing
    if app.input_mode == InputMode::Editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}
