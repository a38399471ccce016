use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::embed;
use crate::models::{Status, SAMPLE_QUESTIONS};

/// Build the result card contents for the current app state.
///
/// Ordering mirrors the lifecycle: echoed query, streamed answer, error
/// descriptor, then sources. Citations appear only once the stream is done.
fn result_card_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    if app.status == Status::Initial && app.query.is_empty() {
        lines.push(Line::from(Span::raw(
            "Ask anything about the blog posts, a topic, or a project by",
        )));
        lines.push(Line::from(Span::raw(
            "typing your question or picking one of the examples below.",
        )));
        lines.push(Line::from(""));

        for (index, question) in SAMPLE_QUESTIONS.iter().enumerate() {
            let selected = app.sample_cursor == Some(index);
            let (marker, style) = if selected {
                (
                    "› ",
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                ("  ", Style::default().fg(Color::Blue))
            };
            lines.push(Line::from(vec![
                Span::styled(marker, Style::default().fg(Color::Cyan)),
                Span::styled((*question).to_string(), style),
            ]));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Ctrl+P cycles the examples, Enter asks.",
            Style::default().fg(Color::DarkGray),
        )));
        return lines;
    }

    if !app.query.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("\u{201c}{}\u{201d}", app.query),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
        lines.push(Line::from(""));
    }

    if app.is_loading() && app.rendered_lines().is_empty() {
        lines.push(Line::from(Span::styled(
            "...",
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        lines.extend(app.rendered_lines().iter().cloned());
    }

    if app.status == Status::Error {
        if let Some(error) = &app.error {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("{error}. Please give it another try later."),
                Style::default().fg(Color::Red),
            )));
        }
    }

    if app.status == Status::Done && !app.sources.is_empty() {
        lines.push(Line::from(""));
        let arrow = if app.show_sources { "▾" } else { "▸" };
        lines.push(Line::from(Span::styled(
            format!("{arrow} Sources ({})", app.sources.len()),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )));

        if app.show_sources {
            for (index, source) in app.sources.iter().enumerate() {
                lines.push(Line::from(vec![
                    Span::styled(
                        format!("  {}. ", index + 1),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::raw(source.title.clone()),
                    Span::styled(
                        format!(" — {}", source.url),
                        Style::default().fg(Color::Blue),
                    ),
                ]));

                // Cited videos get their canonical embed link
                if let Some(embed) = embed::embed_url(&source.url) {
                    lines.push(Line::from(Span::styled(
                        format!("     ▶ {embed}"),
                        Style::default().fg(Color::DarkGray),
                    )));
                }
            }
        }
    }

    lines
}

pub fn render_result_card(frame: &mut Frame, app: &mut App, area: Rect) {
    let lines = result_card_lines(app);

    // scroll_offset of usize::MAX means "pinned to bottom"; clamp it against
    // the wrapped visual height and write the clamped value back so manual
    // scrolling continues from the real position.
    let available_width = area.width.max(1) as usize;
    let mut total_visual_lines = 0;

    for line in &lines {
        let line_width = line.width();
        if line_width == 0 {
            total_visual_lines += 1;
        } else {
            total_visual_lines += line_width.div_ceil(available_width);
        }
    }

    let visible_height = area.height as usize;
    let max_scroll = total_visual_lines.saturating_sub(visible_height);
    let actual_scroll = app.scroll_offset.min(max_scroll);

    if app.scroll_offset != actual_scroll {
        app.scroll_offset = actual_scroll;
    }

    let card = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((u16::try_from(actual_scroll).unwrap_or(u16::MAX), 0));

    frame.render_widget(card, area);
}

pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (text, color) = match app.status {
        Status::Initial => ("Ready".to_string(), Color::DarkGray),
        Status::Loading => ("[Searching...]".to_string(), Color::Yellow),
        Status::Done => {
            let text = if app.sources.is_empty() {
                "Done".to_string()
            } else {
                format!("Done · {} sources", app.sources.len())
            };
            (text, Color::Green)
        }
        Status::Error => ("Error".to_string(), Color::Red),
    };

    let status = Paragraph::new(text)
        .alignment(ratatui::layout::Alignment::Right)
        .style(Style::default().fg(color).add_modifier(Modifier::BOLD));

    frame.render_widget(status, area);
}

pub fn render_input_field(frame: &mut Frame, app: &App, area: Rect) {
    let input_text = if app.input_buffer.is_empty() {
        "Ask a question..."
    } else {
        &app.input_buffer
    };

    let input_style = if app.input_buffer.is_empty() {
        Style::default().fg(Color::Gray)
    } else {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    };

    let input = Paragraph::new(input_text)
        .style(input_style)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(input, area);
}

pub fn render_bottom_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (text, style) = if app.exit_pending {
        (
            "Press Ctrl+C again to exit, Esc to cancel",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )
    } else {
        (
            "Ctrl+C: Quit | Ctrl+H: Help | Ctrl+P: Sample question | Ctrl+S: Sources",
            Style::default().fg(Color::DarkGray),
        )
    };

    let bar = Paragraph::new(text)
        .alignment(ratatui::layout::Alignment::Center)
        .style(style);

    frame.render_widget(bar, area);
}

pub fn render_help_window(frame: &mut Frame, area: Rect) {
    let help_text = vec![
        Line::from(Span::styled(
            "Askblog - Keyboard Shortcuts",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "General:",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from("  Ctrl+H        - Show/hide this help"),
        Line::from("  Ctrl+C        - Quit (press twice)"),
        Line::from(""),
        Line::from(Span::styled(
            "Search:",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from("  Enter         - Ask the typed question"),
        Line::from("  Ctrl+P        - Cycle sample questions"),
        Line::from("  Ctrl+S        - Expand/collapse sources"),
        Line::from(""),
        Line::from(Span::styled(
            "Navigation:",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from("  Up/Down       - Scroll the answer"),
        Line::from("  PgUp/PgDn     - Scroll the answer"),
        Line::from("  Home/End      - Jump to start/end"),
        Line::from(""),
        Line::from(Span::styled(
            "Press Ctrl+H or Esc to close",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let help_paragraph = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help ")
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false });

    let popup_width = 52;
    let popup_height = 21;
    let x = (area.width.saturating_sub(popup_width)) / 2;
    let y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect {
        x: area.x + x,
        y: area.y + y,
        width: popup_width.min(area.width),
        height: popup_height.min(area.height),
    };

    frame.render_widget(Clear, popup_area);
    frame.render_widget(help_paragraph, popup_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SearchError;
    use crate::models::Citation;

    fn text_of(lines: &[Line<'_>]) -> String {
        lines
            .iter()
            .map(|line| {
                line.spans
                    .iter()
                    .map(|span| span.content.as_ref())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_initial_card_lists_sample_questions() {
        let app = App::new();
        let text = text_of(&result_card_lines(&app));

        for question in SAMPLE_QUESTIONS {
            assert!(text.contains(question));
        }
    }

    #[test]
    fn test_loading_card_shows_placeholder_and_query() {
        let mut app = App::new();
        app.begin_search("What is a shader?".to_string());

        let text = text_of(&result_card_lines(&app));
        assert!(text.contains("\u{201c}What is a shader?\u{201d}"));
        assert!(text.contains("..."));
    }

    #[test]
    fn test_sources_rendered_only_when_done() {
        let mut app = App::new();
        let generation = app.begin_search("q".to_string());
        app.apply_fragment(generation, "answer");

        // Force an inconsistent state: citations present while loading must
        // still not be rendered.
        app.sources = vec![Citation::new("Docs", "https://x")];
        let text = text_of(&result_card_lines(&app));
        assert!(!text.contains("Sources"));

        app.complete_search(generation, vec![Citation::new("Docs", "https://x")]);
        let text = text_of(&result_card_lines(&app));
        assert!(text.contains("Sources (1)"));
    }

    #[test]
    fn test_sources_expand_with_toggle() {
        let mut app = App::new();
        let generation = app.begin_search("q".to_string());
        app.complete_search(generation, vec![Citation::new("Docs", "https://x")]);

        let collapsed = text_of(&result_card_lines(&app));
        assert!(!collapsed.contains("https://x"));

        app.toggle_sources();
        let expanded = text_of(&result_card_lines(&app));
        assert!(expanded.contains("Docs"));
        assert!(expanded.contains("https://x"));
    }

    #[test]
    fn test_video_citation_gets_embed_annotation() {
        let mut app = App::new();
        let generation = app.begin_search("q".to_string());
        app.complete_search(
            generation,
            vec![Citation::new("Demo", "https://youtu.be/abc12345678")],
        );
        app.toggle_sources();

        let text = text_of(&result_card_lines(&app));
        assert!(text.contains("https://www.youtube.com/embed/abc12345678"));
    }

    #[test]
    fn test_error_card_keeps_descriptor_and_retry_prompt() {
        let mut app = App::new();
        let generation = app.begin_search("q".to_string());
        app.apply_fragment(generation, "partial answer");
        app.fail_search(
            generation,
            SearchError::Http {
                status: 500,
                status_text: "Internal Server Error".to_string(),
            },
        );

        let text = text_of(&result_card_lines(&app));
        assert!(text.contains("partial answer"));
        assert!(text.contains("500 Internal Server Error. Please give it another try later."));
    }
}
