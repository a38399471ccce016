pub mod markdown;
pub mod widgets;

use crate::app::App;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

pub fn render(frame: &mut Frame, app: &mut App) {
    // Input grows with its content, up to half the screen
    let available_width = frame.area().width.saturating_sub(2) as usize;

    let input_lines = if app.input_buffer.is_empty() {
        1
    } else {
        let chars_count = app.input_buffer.chars().count();
        chars_count.div_ceil(available_width.max(1))
    };

    let max_lines = (frame.area().height as usize / 2).saturating_sub(2);
    let actual_lines = input_lines.clamp(1, max_lines.max(1));

    #[allow(clippy::cast_possible_truncation)]
    let input_height = (actual_lines + 2) as u16;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),                // Result card (top, flexible)
            Constraint::Length(1),             // Empty gap
            Constraint::Length(1),             // Status line
            Constraint::Length(input_height),  // Input field (dynamic height)
            Constraint::Length(1),             // Bottom keymap bar
        ])
        .split(frame.area());

    widgets::render_result_card(frame, app, chunks[0]);
    // chunks[1] is the gap, left empty
    widgets::render_status_bar(frame, app, chunks[2]);
    widgets::render_input_field(frame, app, chunks[3]);
    widgets::render_bottom_bar(frame, app, chunks[4]);

    if app.show_help {
        widgets::render_help_window(frame, frame.area());
    }
}
