use serde::{Deserialize, Serialize};

/// Lifecycle of a submitted query.
///
/// `Initial -> Loading` on submit, `Loading -> Done` on stream completion,
/// `Loading -> Error` on failure, `Done|Error -> Loading` on the next submit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Initial,
    Loading,
    Done,
    Error,
}

/// A source document backing the answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Citation {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
}

#[allow(dead_code)]
impl Citation {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// Example queries offered before the first search.
pub const SAMPLE_QUESTIONS: &[&str] = &[
    "What is the difference between a vertex shader and a fragment shader?",
    "What is the difference between varyings and uniforms?",
    "How to build an audio-reactive shader?",
    "How does the star visualizer sample its neighborhood?",
    "Show me how to use smoothstep in a distance function",
    "How did Valerie map waveform data to color?",
    "What's a great use case for render targets?",
    "Tell me about the sonic identity series",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub endpoint_url: String,
    /// Request timeout in seconds. 0 disables the bound entirely.
    #[serde(default = "default_timeout")]
    pub request_timeout: u64,
}

const fn default_timeout() -> u64 {
    600
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint_url: "https://blog.data-v.site/api/semantic-search".to_string(),
            request_timeout: default_timeout(),
        }
    }
}
