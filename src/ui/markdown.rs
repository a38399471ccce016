// Lightweight markdown rendering for terminal display

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use thiserror::Error;

/// Raised when the accumulated buffer cannot be rendered safely. The caller
/// keeps its last successful render instead of propagating this.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("control sequence at byte {0}")]
    ControlSequence(usize),
}

const fn is_forbidden_control(byte: u8) -> bool {
    matches!(byte, 0x00..=0x08 | 0x0b | 0x0c | 0x0e..=0x1f | 0x7f)
}

/// Parse an entire answer buffer into styled lines.
///
/// The whole document is re-parsed on every call: a later fragment may close
/// a construct an earlier one opened, so appending to a previous parse is
/// not sound. Input carrying raw terminal control sequences is rejected to
/// keep a hostile stream from writing escape codes into the terminal.
pub fn parse_document(markdown: &str) -> Result<Vec<Line<'static>>, ParseError> {
    if let Some(pos) = markdown.bytes().position(is_forbidden_control) {
        return Err(ParseError::ControlSequence(pos));
    }

    let mut lines = Vec::new();
    let mut in_code_block = false;

    for raw_line in markdown.lines() {
        if is_code_fence(raw_line) {
            if in_code_block {
                lines.push(Line::from(Span::styled(
                    "└──────────────────────────────────────────────",
                    Style::default().fg(Color::DarkGray),
                )));
                in_code_block = false;
            } else {
                in_code_block = true;
                let lang = extract_code_language(raw_line);
                let lang_display = lang.as_deref().unwrap_or("code");
                lines.push(Line::from(Span::styled(
                    format!("┌─ {lang_display} ───────────────────────────────────────────"),
                    Style::default().fg(Color::DarkGray),
                )));
            }
        } else if in_code_block {
            lines.push(Line::from(Span::styled(
                format!("  {raw_line}"),
                Style::default().fg(Color::Green),
            )));
        } else {
            lines.push(render_markdown_line(raw_line));
        }
    }

    Ok(lines)
}

/// Check if a line is a markdown table row
pub fn is_table_row(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with('|') && trimmed.ends_with('|') && trimmed.matches('|').count() >= 2
}

/// Check if a line is a table separator (|---|---|)
pub fn is_table_separator(line: &str) -> bool {
    let trimmed = line.trim();
    if !trimmed.starts_with('|') || !trimmed.ends_with('|') {
        return false;
    }

    trimmed
        .chars()
        .all(|c| c == '|' || c == '-' || c == ' ' || c == ':')
}

/// Render a table row as `Cell1 | Cell2 | Cell3`; column alignment is not
/// attempted without knowing the full table widths.
fn render_table_row(line: &str) -> Line<'static> {
    let trimmed = line.trim();
    let content = trimmed.trim_start_matches('|').trim_end_matches('|');

    let cells: Vec<&str> = content.split('|').map(str::trim).collect();
    let formatted = cells.join(" | ");

    Line::from(Span::styled(
        format!("  {formatted}"),
        Style::default().fg(Color::Cyan),
    ))
}

/// Render a single line of markdown with basic styling
#[allow(clippy::too_many_lines)]
fn render_markdown_line(line: &str) -> Line<'static> {
    if is_table_separator(line) {
        // Separator lines are visual noise in a terminal
        return Line::from("");
    }

    if is_table_row(line) {
        return render_table_row(line);
    }

    let mut spans = Vec::new();
    let mut current_text = String::new();
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            // Bold: **text**
            '*' if chars.peek() == Some(&'*') => {
                if !current_text.is_empty() {
                    spans.push(Span::raw(current_text.clone()));
                    current_text.clear();
                }
                chars.next(); // consume second *

                let mut bold_text = String::new();
                let mut found_close = false;
                while let Some(ch) = chars.next() {
                    if ch == '*' && chars.peek() == Some(&'*') {
                        chars.next();
                        found_close = true;
                        break;
                    }
                    bold_text.push(ch);
                }

                if found_close {
                    spans.push(Span::styled(
                        bold_text,
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    ));
                } else {
                    // No closing **, treat as literal
                    current_text.push_str("**");
                    current_text.push_str(&bold_text);
                }
            }
            // Inline code: `code`
            '`' => {
                if !current_text.is_empty() {
                    spans.push(Span::raw(current_text.clone()));
                    current_text.clear();
                }

                let mut code_text = String::new();
                let mut found_close = false;
                for ch in chars.by_ref() {
                    if ch == '`' {
                        found_close = true;
                        break;
                    }
                    code_text.push(ch);
                }

                if found_close {
                    spans.push(Span::styled(
                        code_text,
                        Style::default().fg(Color::Magenta),
                    ));
                } else {
                    // No closing `, treat as literal
                    current_text.push('`');
                    current_text.push_str(&code_text);
                }
            }
            // Headers: # ## ###
            '#' if current_text.is_empty() => {
                let mut level = 1;
                while chars.peek() == Some(&'#') {
                    level += 1;
                    chars.next();
                }

                if chars.peek() == Some(&' ') {
                    chars.next();
                }

                let header_text: String = chars.collect();
                let color = match level {
                    1 => Color::Yellow,
                    2 => Color::Cyan,
                    _ => Color::Blue,
                };

                return Line::from(Span::styled(
                    header_text.trim().to_string(),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ));
            }
            // List items: - item or * item
            '-' | '*' if current_text.is_empty() && chars.peek() == Some(&' ') => {
                chars.next(); // consume space
                let rest: String = chars.collect();
                spans.push(Span::styled("• ", Style::default().fg(Color::Cyan)));
                spans.push(Span::raw(rest.trim().to_string()));
                break;
            }
            _ => {
                current_text.push(ch);
            }
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    if spans.is_empty() {
        Line::from("")
    } else {
        Line::from(spans)
    }
}

/// Detect if a line is a code block fence
pub fn is_code_fence(line: &str) -> bool {
    line.trim().starts_with("```")
}

/// Extract language from code fence
pub fn extract_code_language(line: &str) -> Option<String> {
    line.trim()
        .strip_prefix("```")
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .map(ToString::to_string)
}
