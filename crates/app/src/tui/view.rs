use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};
use scoreday_core::domain::StatusCue;
use std::str::FromStr;

use super::model::{TuiModel, ViewMode};
use crate::services::RowSnapshot;

/// The View component of MVU - responsible for rendering the model
pub struct TuiView;

impl TuiView {
    /// Render the entire TUI based on the current model state
    pub fn render(model: &TuiModel, frame: &mut Frame) {
        let size = frame.area();
        // One line per standings row plus the border
        let banner_height = model.page.banner.lines().count().max(1) as u16 + 2;

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Title bar
                Constraint::Min(0),    // Score table
                Constraint::Length(banner_height), // Status banner
                Constraint::Length(2), // Status/hints bar
            ])
            .split(size);

        Self::render_title_bar(model, frame, chunks[0]);

        match &model.mode {
            ViewMode::Scores => Self::render_score_table(model, frame, chunks[1]),
            ViewMode::Help => Self::render_help_view(model, frame, chunks[1]),
        }

        Self::render_banner(model, frame, chunks[2]);
        Self::render_status_bar(model, frame, chunks[3]);

        if !model.errors.is_empty() {
            Self::render_error_overlay(model, frame, size);
        }
    }

    fn render_title_bar(model: &TuiModel, frame: &mut Frame, area: Rect) {
        let pending = model.pending_count();
        let pending_indicator = if pending > 0 {
            format!(" [{} PENDING]", pending)
        } else {
            String::new()
        };

        let title_text = format!("Scoreday - {}{}", model.page.query, pending_indicator);
        let title_paragraph = Paragraph::new(title_text)
            .style(Style::default().fg(Color::White).bg(Color::Blue))
            .alignment(Alignment::Center);

        frame.render_widget(title_paragraph, area);
    }

    fn render_score_table(model: &TuiModel, frame: &mut Frame, area: Rect) {
        if model.page.rows.is_empty() {
            let paragraph = Paragraph::new("No events match these filters. Press y, g or a to change them.")
                .style(Style::default().fg(Color::Yellow))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
            return;
        }

        let mut header = vec![
            Cell::from("Event"),
            Cell::from("Year"),
            Cell::from("Group"),
        ];
        header.extend(
            model
                .page
                .forms
                .iter()
                .enumerate()
                .map(|(index, name)| Self::form_header(model, index, name)),
        );
        header.push(Cell::from("Status"));

        let rows: Vec<Row> = model
            .page
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| Self::score_row(model, index, row))
            .collect();

        let mut widths = vec![
            Constraint::Min(16),
            Constraint::Length(8),
            Constraint::Length(7),
        ];
        widths.extend(model.page.forms.iter().map(|_| Constraint::Length(6)));
        widths.push(Constraint::Length(10));

        let table = Table::new(rows, widths)
            .header(Row::new(header).style(Style::default().add_modifier(Modifier::BOLD)))
            .block(Block::default().borders(Borders::ALL).title("Scores"));

        frame.render_widget(table, area);
    }

    /// Form column header in the form's colour, plain if the colour is unknown
    fn form_header<'a>(model: &TuiModel, index: usize, name: &'a str) -> Cell<'a> {
        let colour = model
            .page
            .form_colours
            .get(index)
            .and_then(|colour| Color::from_str(colour).ok());
        match colour {
            Some(colour) => Cell::from(name).style(Style::default().fg(colour)),
            None => Cell::from(name),
        }
    }

    fn score_row<'a>(model: &TuiModel, index: usize, row: &'a RowSnapshot) -> Row<'a> {
        let selected = index == model.ui_state.cursor_row;

        let mut cells = vec![
            Cell::from(row.name.as_str()),
            Cell::from(row.year.as_str()),
            Cell::from(row.group.as_str()),
        ];

        for (form, value) in row.values.iter().enumerate() {
            let style = if selected && form == model.ui_state.cursor_form {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            cells.push(Cell::from(value.as_str()).style(style));
        }

        cells.push(Self::status_cell(model, row.cue));

        let style = if selected {
            Style::default().bg(Color::DarkGray)
        } else {
            Style::default()
        };
        Row::new(cells).style(style)
    }

    fn status_cell(model: &TuiModel, cue: Option<StatusCue>) -> Cell<'static> {
        match cue {
            Some(StatusCue::Pending) => {
                Cell::from(Span::styled("◌ sending", Style::default().fg(model.ui_state.pending_colour)))
            }
            Some(StatusCue::Confirmed) => {
                Cell::from(Span::styled("● saved", Style::default().fg(model.ui_state.confirmed_colour)))
            }
            None => Cell::from(""),
        }
    }

    fn render_banner(model: &TuiModel, frame: &mut Frame, area: Rect) {
        let banner = Paragraph::new(model.page.banner.as_str())
            .block(Block::default().borders(Borders::ALL).title("Status"))
            .wrap(Wrap { trim: true });
        frame.render_widget(banner, area);
    }

    fn render_help_view(_model: &TuiModel, frame: &mut Frame, area: Rect) {
        let help_text = vec![
            Line::from(Span::styled("Scoreday Help", Style::default().add_modifier(Modifier::BOLD))),
            Line::from(""),
            Line::from(Span::styled("Navigation:", Style::default().add_modifier(Modifier::UNDERLINED))),
            Line::from("  ↑/k ↓/j - Previous / next event"),
            Line::from("  ←/h →/l - Previous / next form"),
            Line::from(""),
            Line::from(Span::styled("Scoring:", Style::default().add_modifier(Modifier::UNDERLINED))),
            Line::from("  + / - - Change the selected score"),
            Line::from("  Enter - Submit the event's scores"),
            Line::from(""),
            Line::from(Span::styled("Filters:", Style::default().add_modifier(Modifier::UNDERLINED))),
            Line::from("  y - Cycle year"),
            Line::from("  g - Cycle group"),
            Line::from("  a - Cycle activity"),
            Line::from(""),
            Line::from(Span::styled("Global:", Style::default().add_modifier(Modifier::UNDERLINED))),
            Line::from("  ? - Show this help"),
            Line::from("  Ctrl+C / Esc / q - Quit"),
            Line::from(""),
            Line::from("Press any key to close help..."),
        ];

        let help = Paragraph::new(help_text)
            .block(Block::default().borders(Borders::ALL).title("Help"))
            .wrap(Wrap { trim: true });

        frame.render_widget(help, area);
    }

    fn render_status_bar(model: &TuiModel, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1)])
            .split(area);

        let status_paragraph = Paragraph::new(Self::build_status_text(model))
            .style(Style::default().fg(Color::White).bg(Color::DarkGray));
        frame.render_widget(status_paragraph, chunks[0]);

        if model.ui_state.show_hints {
            let hints = match &model.mode {
                ViewMode::Scores => "? Help | +/- Score | Enter Submit | y/g/a Filter | q Quit",
                ViewMode::Help => "Any key to close",
            };
            let hints_paragraph = Paragraph::new(hints).style(Style::default().fg(Color::Gray));
            frame.render_widget(hints_paragraph, chunks[1]);
        }
    }

    fn build_status_text(model: &TuiModel) -> String {
        let mut status_parts = vec![format!("{} events", model.row_count())];

        let pending = model.pending_count();
        if pending > 0 {
            status_parts.push(format!("{} waiting for the server", pending));
        }

        if let Some(row) = model.page.rows.get(model.ui_state.cursor_row) {
            status_parts.push(format!("Selected: {}", row.id));
        }

        status_parts.join(" | ")
    }

    fn render_error_overlay(model: &TuiModel, frame: &mut Frame, area: Rect) {
        let popup_area = Self::centered_rect(60, 20, area);

        frame.render_widget(Clear, popup_area);

        let error_text: Vec<Line> = model
            .errors
            .iter()
            .map(|error| Line::from(error.as_str()))
            .collect();

        let error_popup = Paragraph::new(error_text)
            .block(Block::default().borders(Borders::ALL).title("Errors (Esc to dismiss)"))
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true });

        frame.render_widget(error_popup, popup_area);
    }

    /// Helper to create centered rectangle
    fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
        let popup_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ])
            .split(r);

        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ])
            .split(popup_layout[1])[1]
    }
}
