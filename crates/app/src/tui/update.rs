use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use scoreday_core::domain::{ACTIVITY_KEY, GROUP_KEY, YEAR_KEY};

use super::model::{TuiModel, ViewMode};
use crate::services::PageCommand;

/// Messages that can be sent from the TUI to the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TuiMessage {
    /// Send a command to the page service
    Command(PageCommand),

    /// No action needed
    None,
}

/// The Update function - handles user input and updates the model
pub struct TuiUpdate;

impl TuiUpdate {
    /// Handle a key press and update the model accordingly
    /// Returns a TuiMessage that should be sent to the page service
    pub fn handle_key(model: &mut TuiModel, key: KeyCode, modifiers: KeyModifiers) -> Result<TuiMessage> {
        if let Some(msg) = Self::handle_global_keys(model, key, modifiers)? {
            return Ok(msg);
        }

        match &model.mode {
            ViewMode::Scores => Self::handle_score_keys(model, key),
            ViewMode::Help => {
                model.mode = ViewMode::Scores;
                Ok(TuiMessage::None)
            }
        }
    }

    pub fn handle_resize(model: &mut TuiModel, width: u16, height: u16) -> Result<TuiMessage> {
        model.ui_state.terminal_width = width;
        model.ui_state.terminal_height = height;
        Ok(TuiMessage::None)
    }

    fn handle_global_keys(model: &mut TuiModel, key: KeyCode, modifiers: KeyModifiers) -> Result<Option<TuiMessage>> {
        match key {
            KeyCode::Char('q') if modifiers.is_empty() => {
                Ok(Some(TuiMessage::Command(PageCommand::Quit)))
            }

            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                Ok(Some(TuiMessage::Command(PageCommand::Quit)))
            }

            KeyCode::Esc => {
                if !model.errors.is_empty() {
                    model.clear_errors();
                } else if matches!(model.mode, ViewMode::Help) {
                    model.mode = ViewMode::Scores;
                } else {
                    return Ok(Some(TuiMessage::Command(PageCommand::Quit)));
                }
                Ok(Some(TuiMessage::None))
            }

            KeyCode::Char('?') if modifiers.is_empty() => {
                model.mode = ViewMode::Help;
                Ok(Some(TuiMessage::None))
            }

            _ => Ok(None),
        }
    }

    fn handle_score_keys(model: &mut TuiModel, key: KeyCode) -> Result<TuiMessage> {
        let row = model.ui_state.cursor_row;
        let form = model.ui_state.cursor_form;
        let has_rows = model.row_count() > 0;

        match key {
            // Navigation
            KeyCode::Up | KeyCode::Char('k') => {
                model.move_row(-1);
                Ok(TuiMessage::None)
            }

            KeyCode::Down | KeyCode::Char('j') => {
                model.move_row(1);
                Ok(TuiMessage::None)
            }

            KeyCode::Left | KeyCode::Char('h') => {
                model.move_form(-1);
                Ok(TuiMessage::None)
            }

            KeyCode::Right | KeyCode::Char('l') => {
                model.move_form(1);
                Ok(TuiMessage::None)
            }

            // Scoring
            KeyCode::Char('+') | KeyCode::Char('=') if has_rows => {
                Ok(TuiMessage::Command(PageCommand::CycleScore { row, form, step: 1 }))
            }

            KeyCode::Char('-') if has_rows => {
                Ok(TuiMessage::Command(PageCommand::CycleScore { row, form, step: -1 }))
            }

            KeyCode::Enter if has_rows => Ok(TuiMessage::Command(PageCommand::Submit { row })),

            // Filters
            KeyCode::Char('y') => Ok(TuiMessage::Command(PageCommand::CycleFilter { key: YEAR_KEY })),
            KeyCode::Char('g') => Ok(TuiMessage::Command(PageCommand::CycleFilter { key: GROUP_KEY })),
            KeyCode::Char('a') => Ok(TuiMessage::Command(PageCommand::CycleFilter { key: ACTIVITY_KEY })),

            _ => Ok(TuiMessage::None),
        }
    }
}
