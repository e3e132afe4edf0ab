use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crate::app::{App, FocusPane, InputMode};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        // Quit
        KeyCode::Char('q') => app.should_quit = true,

        // Enter editing mode
        KeyCode::Char('i') | KeyCode::Char('/') => {
            app.focus = FocusPane::Input;
            app.input_mode = InputMode::Editing;
            // Cursor at end of existing text
            app.cursor = app.input.chars().count();
        }

        // Tab cycles: Input -> Suggestions (when any) -> Input
        KeyCode::Tab => {
            app.focus = match app.focus {
                FocusPane::Input => {
                    if app.suggestions().is_empty() {
                        FocusPane::Input
                    } else {
                        FocusPane::Suggestions
                    }
                }
                FocusPane::Suggestions => FocusPane::Input,
            };
            if app.focus == FocusPane::Input {
                app.input_mode = InputMode::Editing;
                app.cursor = app.input.chars().count();
            }
        }

        // Ask the selected follow-up
        KeyCode::Enter => {
            if app.focus == FocusPane::Suggestions {
                app.submit_suggestion();
            }
        }

        // Scroll chat or navigate suggestions
        KeyCode::Char('j') | KeyCode::Down => {
            if app.focus == FocusPane::Suggestions {
                app.suggestions_nav_down();
            } else {
                app.chat_scroll = app.chat_scroll.saturating_add(1);
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            if app.focus == FocusPane::Suggestions {
                app.suggestions_nav_up();
            } else {
                app.chat_scroll = app.chat_scroll.saturating_sub(1);
            }
        }
        KeyCode::Char('g') => {
            app.chat_scroll = 0;
        }
        KeyCode::Char('G') => {
            app.scroll_chat_to_bottom();
        }

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Tab => {
            if !app.suggestions().is_empty() {
                app.input_mode = InputMode::Normal;
                app.focus = FocusPane::Suggestions;
            }
        }
        KeyCode::Enter => {
            // Blank input and in-flight turns are rejected inside submit.
            app.submit_input();
        }
        KeyCode::Backspace => {
            if app.cursor > 0 {
                app.cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.input.chars().count();
            if app.cursor < char_count {
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.cursor = app.cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.input.chars().count();
            app.cursor = (app.cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.cursor = 0;
        }
        KeyCode::End => {
            app.cursor = app.input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.input, app.cursor);
            app.input.insert(byte_pos, c);
            app.cursor += 1;
        }
        _ => {}
    }
}
