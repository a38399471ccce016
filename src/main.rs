mod api;
mod app;
mod config;
mod embed;
mod events;
mod models;
mod ui;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::Backend, prelude::*};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use api::{SearchClient, SearchError};
use app::App;
use events::AppEvent;

#[tokio::main]
async fn main() -> Result<()> {
    let app_config = config::load_config()?;
    let client = SearchClient::from_config(&app_config)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new();

    // Channel for events coming back from the search task
    let (tx, mut rx) = mpsc::unbounded_channel::<AppEvent>();

    let res = run_app(&mut terminal, &mut app, &client, &tx, &mut rx);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn handle_app_event(app: &mut App, event: AppEvent) {
    // Generation checks live in the App mutators; stale events fall through
    // as no-ops.
    match event {
        AppEvent::SearchFragment { generation, text } => app.apply_fragment(generation, &text),
        AppEvent::SearchCompleted {
            generation,
            sources,
        } => app.complete_search(generation, sources),
        AppEvent::SearchFailed { generation, error } => app.fail_search(generation, error),
    }
}

/// Start the streaming request for whatever is in the input field.
///
/// Empty and whitespace-only input is rejected here without touching the
/// app state; otherwise the previous query is superseded and a task is
/// spawned to forward stream items tagged with the new generation.
fn dispatch_query(
    app: &mut App,
    client: &SearchClient,
    event_tx: &mpsc::UnboundedSender<AppEvent>,
) -> Option<JoinHandle<()>> {
    let query = app.input_buffer.trim().to_string();
    if query.is_empty() {
        return None;
    }

    app.input_buffer.clear();
    let generation = app.begin_search(query.clone());

    let client = client.clone();
    let tx = event_tx.clone();

    Some(tokio::spawn(async move {
        match client.search_stream(&query).await {
            Ok(mut stream) => {
                let mut finished = false;

                while let Some(item) = stream.next().await {
                    match item {
                        Ok(chunk) => {
                            if !chunk.fragment.is_empty() {
                                let _ = tx.send(AppEvent::SearchFragment {
                                    generation,
                                    text: chunk.fragment,
                                });
                            }
                            if chunk.done {
                                let _ = tx.send(AppEvent::SearchCompleted {
                                    generation,
                                    sources: chunk.sources,
                                });
                                finished = true;
                                break;
                            }
                        }
                        Err(error) => {
                            let _ = tx.send(AppEvent::SearchFailed { generation, error });
                            finished = true;
                            break;
                        }
                    }
                }

                // Stream ended without a terminal chunk: the connection
                // dropped mid-answer.
                if !finished {
                    let _ = tx.send(AppEvent::SearchFailed {
                        generation,
                        error: SearchError::Interrupted(
                            "stream ended before completion".to_string(),
                        ),
                    });
                }
            }
            Err(error) => {
                let _ = tx.send(AppEvent::SearchFailed { generation, error });
            }
        }
    }))
}

fn handle_keyboard_input(
    app: &mut App,
    key: KeyCode,
    modifiers: KeyModifiers,
    client: &SearchClient,
    event_tx: &mpsc::UnboundedSender<AppEvent>,
) -> Option<JoinHandle<()>> {
    // The help overlay swallows everything except its close keys
    if app.show_help {
        match key {
            KeyCode::Esc => app.show_help = false,
            KeyCode::Char('h') if modifiers.contains(KeyModifiers::CONTROL) => {
                app.toggle_help();
            }
            _ => {}
        }
        return None;
    }

    match key {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            if app.exit_pending {
                app.quit();
            } else {
                app.exit_pending = true;
            }
            return None;
        }
        KeyCode::Esc => {
            if app.exit_pending {
                app.exit_pending = false;
            }
            return None;
        }
        _ if app.exit_pending => {
            // Any other key cancels the pending exit
            app.exit_pending = false;
        }
        _ => {}
    }

    match key {
        KeyCode::Char('q') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.quit();
        }
        KeyCode::Char('h') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.toggle_help();
        }
        KeyCode::Char('s') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.toggle_sources();
        }
        KeyCode::Char('p') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.cycle_sample_question();
        }

        // Navigation keys scroll the answer
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::PageUp => app.scroll_up(10),
        KeyCode::PageDown => app.scroll_down(10),
        KeyCode::Home => app.scroll_to_top(),
        KeyCode::End => app.scroll_to_bottom(),

        KeyCode::Backspace => {
            app.input_buffer.pop();
        }
        // Submitting while a stream is live supersedes it
        KeyCode::Enter => {
            return dispatch_query(app, client, event_tx);
        }

        KeyCode::Char(c) => {
            app.input_buffer.push(c);
        }

        _ => {}
    }
    None
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    client: &SearchClient,
    event_tx: &mpsc::UnboundedSender<AppEvent>,
    event_rx: &mut mpsc::UnboundedReceiver<AppEvent>,
) -> Result<()> {
    let mut search_task: Option<JoinHandle<()>> = None;

    loop {
        terminal.draw(|f| ui::render(f, app))?;

        // Drain whatever the search task produced since the last frame
        while let Ok(app_event) = event_rx.try_recv() {
            handle_app_event(app, app_event);
        }

        // ~60fps poll for smooth streaming
        if event::poll(Duration::from_millis(16))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(task) =
                        handle_keyboard_input(app, key.code, key.modifiers, client, event_tx)
                    {
                        // A new query went out; the superseded request is
                        // aborted and its remaining events are dropped by
                        // the generation guard either way.
                        if let Some(previous) = search_task.replace(task) {
                            previous.abort();
                        }
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    if let Some(task) = search_task.take() {
        task.abort();
    }

    Ok(())
}
