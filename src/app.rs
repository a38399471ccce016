use ratatui::text::Line;

use crate::api::SearchError;
use crate::models::{Citation, Status, SAMPLE_QUESTIONS};
use crate::ui::markdown;

/// Single-query UI state. One query is active at a time; every async event
/// is tagged with the generation it belongs to, and events from a superseded
/// query are dropped in the mutators below.
#[derive(Debug)]
pub struct App {
    pub status: Status,
    pub should_quit: bool,
    pub exit_pending: bool,
    pub show_help: bool,
    /// Sources section expand/collapse; collapsed by default
    pub show_sources: bool,
    /// The query currently displayed above the answer
    pub query: String,
    pub input_buffer: String,
    /// Accumulated answer text, append-only while the stream is live
    pub response_buffer: String,
    pub sources: Vec<Citation>,
    pub error: Option<SearchError>,
    pub scroll_offset: usize,
    /// Cursor into the sample-question list for the cycling selector
    pub sample_cursor: Option<usize>,
    generation: u64,
    /// Last successful parse of the response buffer. Kept as-is when a new
    /// fragment makes the buffer unparsable, so the view never goes blank
    /// mid-stream.
    render_cache: Vec<Line<'static>>,
}

impl App {
    pub fn new() -> Self {
        Self {
            status: Status::Initial,
            should_quit: false,
            exit_pending: false,
            show_help: false,
            show_sources: false,
            query: String::new(),
            input_buffer: String::new(),
            response_buffer: String::new(),
            sources: Vec::new(),
            error: None,
            scroll_offset: 0,
            sample_cursor: None,
            generation: 0,
            render_cache: Vec::new(),
        }
    }

    pub const fn quit(&mut self) {
        self.should_quit = true;
    }

    pub const fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub const fn toggle_sources(&mut self) {
        self.show_sources = !self.show_sources;
    }

    pub const fn is_loading(&self) -> bool {
        matches!(self.status, Status::Loading)
    }

    pub const fn generation(&self) -> u64 {
        self.generation
    }

    pub const fn scroll_up(&mut self, amount: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(amount);
    }

    pub fn scroll_down(&mut self, amount: usize) {
        self.scroll_offset = self.scroll_offset.saturating_add(amount);
    }

    pub const fn scroll_to_top(&mut self) {
        self.scroll_offset = 0;
    }

    pub const fn scroll_to_bottom(&mut self) {
        // Clamped to the real maximum by the rendering code
        self.scroll_offset = usize::MAX;
    }

    /// Fill the input with the next sample question.
    pub fn cycle_sample_question(&mut self) {
        let next = self
            .sample_cursor
            .map_or(0, |i| (i + 1) % SAMPLE_QUESTIONS.len());
        self.sample_cursor = Some(next);
        self.input_buffer = SAMPLE_QUESTIONS[next].to_string();
    }

    /// Start a new query lifecycle and return its generation token.
    ///
    /// Supersedes whatever was in flight: the buffer, citations, and error
    /// are cleared, and any event still carrying the old generation will be
    /// ignored from here on.
    pub fn begin_search(&mut self, query: String) -> u64 {
        self.generation += 1;
        self.query = query;
        self.response_buffer.clear();
        self.render_cache.clear();
        self.sources.clear();
        self.error = None;
        self.status = Status::Loading;
        self.sample_cursor = None;
        self.show_sources = false;
        self.scroll_to_top();
        self.generation
    }

    /// Append one answer fragment, re-parse the whole buffer, and pin the
    /// viewport to the newest content. Fragments from a superseded query are
    /// dropped.
    pub fn apply_fragment(&mut self, generation: u64, text: &str) {
        if generation != self.generation || !self.is_loading() {
            return;
        }

        self.response_buffer.push_str(text);

        // The grammar is not append-safe, so the accumulated buffer is
        // parsed from scratch. A failed parse keeps the previous render.
        if let Ok(lines) = markdown::parse_document(&self.response_buffer) {
            self.render_cache = lines;
        }

        self.scroll_to_bottom();
    }

    pub fn complete_search(&mut self, generation: u64, sources: Vec<Citation>) {
        if generation != self.generation || !self.is_loading() {
            return;
        }

        self.status = Status::Done;
        self.sources = sources;
        self.scroll_to_bottom();
    }

    /// Record a failure; the partial buffer stays visible.
    pub fn fail_search(&mut self, generation: u64, error: SearchError) {
        if generation != self.generation || !self.is_loading() {
            return;
        }

        self.status = Status::Error;
        self.error = Some(error);
        self.scroll_to_bottom();
    }

    pub fn rendered_lines(&self) -> &[Line<'static>] {
        &self.render_cache
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
