// Event types for async communication

use crate::api::SearchError;
use crate::models::Citation;

/// Messages from the search task to the UI loop. Every event carries the
/// generation of the query it belongs to; stale events are dropped on
/// receipt.
#[allow(clippy::enum_variant_names)]
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// A piece of answer text arrived from the endpoint
    SearchFragment { generation: u64, text: String },
    /// The stream finished; citations become visible
    SearchCompleted {
        generation: u64,
        sources: Vec<Citation>,
    },
    /// The request or stream failed
    SearchFailed {
        generation: u64,
        error: SearchError,
    },
}
