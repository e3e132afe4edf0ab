use ratatui::widgets::ListState;

use symposium_core::{
    AssistantState, ChatController, SubmitOutcome, TurnBody, TurnEvent,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Input,
    Suggestions,
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusPane,

    // Input state
    pub input: String,
    pub cursor: usize, // cursor position in input, in characters

    // Chat state
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations

    // Suggested follow-up state
    pub suggestions_state: ListState,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    pub controller: ChatController,
}

impl App {
    pub fn new(controller: ChatController) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            focus: FocusPane::Input,

            input: String::new(),
            cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,

            suggestions_state: ListState::default(),

            animation_frame: 0,

            controller,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.controller.is_pending()
    }

    /// Follow-ups offered by the most recent answered turn.
    pub fn suggestions(&self) -> Vec<String> {
        self.controller
            .turns()
            .iter()
            .rev()
            .find_map(|turn| match &turn.body {
                TurnBody::Assistant(AssistantState::Answered { envelope }) => {
                    Some(envelope.suggested_questions.clone())
                }
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Submit whatever is typed in the input box.
    pub fn submit_input(&mut self) {
        let text = self.input.clone();
        if let SubmitOutcome::Accepted { .. } = self.controller.submit(&text) {
            self.input.clear();
            self.cursor = 0;
            self.input_mode = InputMode::Normal;
            self.scroll_chat_to_bottom();
        }
    }

    /// Ask the selected suggested question, through the same submission path
    /// as typed input.
    pub fn submit_suggestion(&mut self) {
        if self.is_loading() {
            return;
        }
        let suggestions = self.suggestions();
        if let Some(question) = self
            .suggestions_state
            .selected()
            .and_then(|i| suggestions.get(i))
        {
            if let SubmitOutcome::Accepted { .. } = self.controller.submit(question) {
                self.focus = FocusPane::Input;
                self.scroll_chat_to_bottom();
            }
        }
    }

    /// Feed a turn resolution (or timeout) back into the conversation.
    pub fn on_turn_event(&mut self, event: TurnEvent) {
        self.controller.handle_event(event);
        self.refresh_suggestions();
        self.scroll_chat_to_bottom();
    }

    fn refresh_suggestions(&mut self) {
        if self.suggestions().is_empty() {
            self.suggestions_state.select(None);
        } else {
            self.suggestions_state.select(Some(0));
        }
    }

    pub fn suggestions_nav_down(&mut self) {
        let len = self.suggestions().len();
        if len > 0 {
            let i = self.suggestions_state.selected().unwrap_or(0);
            self.suggestions_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn suggestions_nav_up(&mut self) {
        let i = self.suggestions_state.selected().unwrap_or(0);
        self.suggestions_state.select(Some(i.saturating_sub(1)));
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Scroll chat so the newest turn (or the thinking indicator) is visible.
    pub fn scroll_chat_to_bottom(&mut self) {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for turn in self.controller.turns() {
            total_lines += 1; // Role line ("You:" or "AI:")
            let content = match &turn.body {
                TurnBody::User { text } => text.clone(),
                TurnBody::Assistant(AssistantState::Answered { envelope }) => {
                    envelope.response.clone()
                }
                TurnBody::Assistant(AssistantState::Failed { message, .. }) => message.clone(),
                TurnBody::Assistant(AssistantState::Pending { .. }) => "Thinking...".to_string(),
            };
            for line in content.lines() {
                // Use character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                if char_count == 0 {
                    total_lines += 1; // Empty line still takes one line
                } else {
                    total_lines += ((char_count / wrap_width) + 1) as u16;
                }
            }
            total_lines += 1; // Blank line after message
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        if total_lines > visible_height {
            self.chat_scroll = total_lines.saturating_sub(visible_height);
        } else {
            self.chat_scroll = 0;
        }
    }
}
