use ratatui::style::Color;
use std::str::FromStr;

use crate::config::UiConfig;
use crate::services::PageSnapshot;

/// The TUI Model - everything the view needs to draw a frame
#[derive(Debug, Default)]
pub struct TuiModel {
    /// Latest copy of the page
    pub page: PageSnapshot,

    /// Cursor, help and colour state
    pub ui_state: UiState,

    /// Current view mode
    pub mode: ViewMode,

    /// Error messages to display
    pub errors: Vec<String>,

    /// Whether the application should quit
    pub should_quit: bool,
}

#[derive(Debug)]
pub struct UiState {
    /// Selected row in the visible page
    pub cursor_row: usize,

    /// Selected form column
    pub cursor_form: usize,

    pub terminal_width: u16,
    pub terminal_height: u16,

    /// Show the key hints line
    pub show_hints: bool,

    pub pending_colour: Color,
    pub confirmed_colour: Color,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            cursor_row: 0,
            cursor_form: 0,
            terminal_width: 0,
            terminal_height: 0,
            show_hints: true,
            pending_colour: Color::Yellow,
            confirmed_colour: Color::Green,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub enum ViewMode {
    #[default]
    /// Scoring table
    Scores,

    /// Help view
    Help,
}

impl TuiModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the model with colours and hints taken from the config.
    /// Unknown colour names keep the defaults.
    pub fn with_config(config: &UiConfig) -> Self {
        let mut model = Self::new();
        model.ui_state.show_hints = config.show_help;
        if let Ok(colour) = Color::from_str(&config.pending_colour) {
            model.ui_state.pending_colour = colour;
        }
        if let Ok(colour) = Color::from_str(&config.confirmed_colour) {
            model.ui_state.confirmed_colour = colour;
        }
        model
    }

    /// Replace the page copy and keep the cursor inside it
    pub fn sync(&mut self, page: PageSnapshot) {
        self.page = page;
        self.clamp_cursor();
    }

    pub fn row_count(&self) -> usize {
        self.page.rows.len()
    }

    pub fn form_count(&self) -> usize {
        self.page.forms.len()
    }

    pub fn move_row(&mut self, delta: isize) {
        self.ui_state.cursor_row = step_clamped(self.ui_state.cursor_row, delta, self.row_count());
    }

    pub fn move_form(&mut self, delta: isize) {
        self.ui_state.cursor_form = step_clamped(self.ui_state.cursor_form, delta, self.form_count());
    }

    pub fn pending_count(&self) -> usize {
        self.page
            .rows
            .iter()
            .filter(|row| row.status.is_pending())
            .count()
    }

    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    fn clamp_cursor(&mut self) {
        self.ui_state.cursor_row = self.ui_state.cursor_row.min(self.row_count().saturating_sub(1));
        self.ui_state.cursor_form = self.ui_state.cursor_form.min(self.form_count().saturating_sub(1));
    }
}

fn step_clamped(position: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    position.saturating_add_signed(delta).min(len - 1)
}
