use crate::animation::{Animator, Phase};
use crate::calc_engine::{solve, CalculationStep, Solution};
use crate::i18n::Language;
use crate::number_line::{self, Window};
use crate::settings::DisplaySettings;
use log::info;
use std::time::{Duration, Instant};

pub const EXAMPLES: [&str; 4] = ["5 + 3", "10 - 4", "6 + 2", "15 - 7"];

/// Longest the event loop blocks on input when no animation deadline is closer.
pub const IDLE_POLL: Duration = Duration::from_millis(50);

pub struct App {
    pub input: String,
    pub cursor_position: usize,
    pub input_scroll: usize,
    pub history: Vec<String>,
    pub cursor_history: usize,
    pub should_quit: bool,
    pub show_help: bool,
    pub help_scroll: usize,
    pub terminal_too_small: bool,
    pub settings: DisplaySettings,
    pub solution: Option<Solution>,
    pub animator: Animator,
}

impl App {
    pub fn new(settings: DisplaySettings) -> Self {
        App {
            input: String::new(),
            cursor_position: 0,
            input_scroll: 0,
            history: Vec::new(),
            cursor_history: 0,
            should_quit: false,
            show_help: false,
            help_scroll: 0,
            terminal_too_small: false,
            settings,
            solution: None,
            animator: Animator::new(),
        }
    }

    pub fn language(&self) -> Language {
        self.settings.language
    }

    pub fn adjust_input_scroll(&mut self, visible_width: usize) {
        let total_chars = self.input.chars().count();
        let cursor_pos = self.cursor_position;

        if cursor_pos < self.input_scroll {
            self.input_scroll = cursor_pos;
        }
        else if cursor_pos >= self.input_scroll + visible_width {
            self.input_scroll = cursor_pos - visible_width + 1;
        }

        if self.input_scroll > total_chars.saturating_sub(visible_width) {
            self.input_scroll = total_chars.saturating_sub(visible_width);
        }
    }

    pub fn submit(&mut self, now: Instant) {
        let input = self.input.trim().to_string();
        if input.is_empty() {
            return;
        }

        match input.to_lowercase().as_str() {
            "quit" | "exit" | "q" => {
                self.should_quit = true;
                return;
            }
            "clear" | "reset" => {
                self.animator.cancel();
                self.solution = None;
                self.history.clear();
                self.cursor_history = 0;
                self.clear_input();
                return;
            }
            "help" => {
                self.show_help = true;
                self.clear_input();
                return;
            }
            _ => {}
        }

        self.calculate(&input, now);

        self.history.push(input);
        self.cursor_history = self.history.len();
        self.clear_input();
    }

    /// Solves `expression` and restarts the number line animation for it.
    pub fn calculate(&mut self, expression: &str, now: Instant) {
        let solution = solve(expression, self.language());
        info!(
            "calculated {:?}: result {:?}, {} steps",
            solution.expression,
            solution.result,
            solution.steps.len()
        );
        // старый таймер снимается внутри start()
        self.animator.start(solution.steps.clone(), now);
        self.solution = Some(solution);
    }

    pub fn load_example(&mut self, index: usize, now: Instant) {
        if let Some(example) = EXAMPLES.get(index) {
            self.input = example.to_string();
            self.cursor_position = self.input.chars().count();
            self.calculate(example, now);
        }
    }

    /// Switches language and re-renders the texts of the current solution
    /// without restarting its animation.
    pub fn toggle_language(&mut self) {
        self.settings.toggle_language();
        if let Some(expression) = self.solution.as_ref().map(|s| s.expression.clone()) {
            self.solution = Some(solve(&expression, self.language()));
        }
    }

    pub fn tick(&mut self, now: Instant) -> bool {
        self.animator.update(now)
    }

    pub fn poll_timeout(&self, now: Instant) -> Duration {
        self.animator
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(now))
            .unwrap_or(IDLE_POLL)
            .min(IDLE_POLL)
    }

    pub fn steps(&self) -> &[CalculationStep] {
        self.solution.as_ref().map(|s| s.steps.as_slice()).unwrap_or(&[])
    }

    /// Description shown above the number line: the last step the marker finished.
    pub fn caption(&self) -> Option<&str> {
        let index = self.animator.state().animation_step_index;
        if index == 0 {
            return None;
        }
        self.steps().get(index - 1).map(|s| s.description.as_str())
    }

    pub fn active_step(&self) -> Option<usize> {
        match self.animator.phase() {
            Phase::Stepping(i) => Some(i),
            Phase::Idle => None,
        }
    }

    pub fn number_line(&self) -> Option<Window> {
        let state = self.animator.state();
        number_line::window(
            self.solution.as_ref().and_then(|s| s.result),
            state.current_position,
            state.is_animating,
        )
    }

    pub fn move_cursor(&mut self, direction: i32) {
        match direction {
            -1 => self.cursor_position = self.cursor_position.saturating_sub(1),
            1 => self.cursor_position = (self.cursor_position + 1).min(self.input.chars().count()),
            _ => {}
        }
    }

    pub fn move_cursor_by_words(&mut self, direction: i32) {
        let input_chars: Vec<char> = self.input.chars().collect();
        let mut pos = self.cursor_position;

        if direction < 0 {
            while pos > 0 && input_chars[pos - 1].is_whitespace() {
                pos -= 1;
            }

            while pos > 0 && !input_chars[pos - 1].is_whitespace() {
                pos -= 1;
            }

            self.cursor_position = pos;
        } else {
            let len = input_chars.len();

            while pos < len && !input_chars[pos].is_whitespace() {
                pos += 1;
            }

            while pos < len && input_chars[pos].is_whitespace() {
                pos += 1;
            }

            self.cursor_position = pos.min(len);
        }
    }

    pub fn navigate_history(&mut self, direction: i32) {
        if self.history.is_empty() {
            return;
        }
        if direction < 0 && self.cursor_history > 0 {
            self.cursor_history -= 1;
        } else if direction > 0 && self.cursor_history < self.history.len() {
            self.cursor_history += 1;
        }

        if self.cursor_history < self.history.len() {
            self.input = self.history[self.cursor_history].clone();
        } else {
            self.input.clear();
        }
        self.cursor_position = self.input.chars().count();
        self.input_scroll = 0;
    }

    pub fn insert_char(&mut self, c: char) {
        let byte_idx = char_index_to_byte_index(&self.input, self.cursor_position);
        self.input.insert(byte_idx, c);
        self.cursor_position += 1;
    }

    pub fn delete_before_cursor(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
            self.delete_at_cursor();
        }
    }

    pub fn delete_at_cursor(&mut self) {
        let byte_idx = char_index_to_byte_index(&self.input, self.cursor_position);
        if let Some(c) = self.input[byte_idx..].chars().next() {
            let end = byte_idx + c.len_utf8();
            self.input.drain(byte_idx..end);
        }
    }

    pub fn clear_input(&mut self) {
        self.input.clear();
        self.cursor_position = 0;
        self.input_scroll = 0;
    }
}

pub fn char_index_to_byte_index(s: &str, char_index: usize) -> usize {
    s.char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or_else(|| s.len())
}
