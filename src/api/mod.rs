// Streaming client for the semantic search endpoint

use futures::stream::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

use crate::models::{AppConfig, Citation};

/// Everything that can go wrong between submitting a query and the end of
/// the response stream. `Http` keeps the descriptor the UI shows on failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("query is empty")]
    EmptyQuery,
    #[error("{status} {status_text}")]
    Http { status: u16, status_text: String },
    #[error("failed to reach the search endpoint: {0}")]
    Transport(String),
    #[error("response stream interrupted: {0}")]
    Interrupted(String),
    #[error("malformed response chunk: {0}")]
    Decode(String),
}

#[derive(Debug, Serialize)]
pub struct SearchRequest {
    pub query: String,
}

/// One newline-delimited JSON chunk from the endpoint. Fragments carry
/// answer text; the terminal chunk has `done: true` and the citation list.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SearchChunk {
    #[serde(default)]
    pub fragment: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub sources: Vec<Citation>,
}

pub type SearchStream = Pin<Box<dyn Stream<Item = Result<SearchChunk, SearchError>> + Send>>;

#[derive(Debug, Clone)]
pub struct SearchClient {
    endpoint_url: String,
    client: Client,
}

impl SearchClient {
    /// `request_timeout` is in seconds; 0 leaves the request unbounded.
    pub fn new(endpoint_url: String, request_timeout: u64) -> Result<Self, SearchError> {
        let mut builder = Client::builder();
        if request_timeout > 0 {
            builder = builder.timeout(Duration::from_secs(request_timeout));
        }
        let client = builder
            .build()
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        Ok(Self {
            endpoint_url,
            client,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, SearchError> {
        Self::new(config.endpoint_url.clone(), config.request_timeout)
    }

    /// Send a query and stream back answer chunks in arrival order.
    ///
    /// Empty and whitespace-only queries are rejected before any network
    /// call. A non-2xx response fails the whole request up front; errors
    /// after that point surface through the stream items.
    pub async fn search_stream(&self, query: &str) -> Result<SearchStream, SearchError> {
        if query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let request = SearchRequest {
            query: query.to_string(),
        };

        let response = self
            .client
            .post(&self.endpoint_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Http {
                status: status.as_u16(),
                status_text: status
                    .canonical_reason()
                    .unwrap_or("Unknown Error")
                    .to_string(),
            });
        }

        // Stateful stream that buffers bytes until a full NDJSON line is
        // available; the final chunk may arrive without a trailing newline.
        let stream = futures::stream::unfold(
            (response.bytes_stream(), Vec::new()),
            |(mut byte_stream, mut buffer)| async move {
                loop {
                    if let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                        let mut line = buffer.split_off(pos + 1);
                        std::mem::swap(&mut buffer, &mut line);
                        // 'line' now holds the bytes up to the newline,
                        // 'buffer' the rest

                        let text = String::from_utf8_lossy(&line);
                        let trimmed = text.trim();
                        if !trimmed.is_empty() {
                            let result = serde_json::from_str::<SearchChunk>(trimmed)
                                .map_err(|e| SearchError::Decode(e.to_string()));
                            return Some((result, (byte_stream, buffer)));
                        }
                        continue;
                    }

                    // No newline yet; the buffer may still hold a complete
                    // final object such as {"done":true,"sources":[...]}
                    if !buffer.is_empty() {
                        let text = String::from_utf8_lossy(&buffer);
                        let trimmed = text.trim();
                        if !trimmed.is_empty() {
                            if let Ok(chunk) = serde_json::from_str::<SearchChunk>(trimmed) {
                                buffer.clear();
                                return Some((Ok(chunk), (byte_stream, buffer)));
                            }
                        }
                    }

                    match byte_stream.next().await {
                        Some(Ok(bytes)) => {
                            buffer.extend_from_slice(&bytes);
                        }
                        Some(Err(e)) => {
                            return Some((
                                Err(SearchError::Interrupted(e.to_string())),
                                (byte_stream, buffer),
                            ));
                        }
                        None => {
                            if !buffer.is_empty() {
                                let text = String::from_utf8_lossy(&buffer);
                                let trimmed = text.trim();
                                if !trimmed.is_empty() {
                                    let result = serde_json::from_str::<SearchChunk>(trimmed)
                                        .map_err(|e| SearchError::Decode(e.to_string()));
                                    buffer.clear();
                                    return Some((result, (byte_stream, buffer)));
                                }
                            }
                            return None;
                        }
                    }
                }
            },
        );

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json_string, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_client_creation() {
        let client = SearchClient::new("http://localhost:3000/api/search".to_string(), 300);
        assert!(client.is_ok());
    }

    #[test]
    fn test_client_creation_without_timeout() {
        let client = SearchClient::new("http://localhost:3000/api/search".to_string(), 0);
        assert!(client.is_ok());
    }

    #[test]
    fn test_client_from_config() {
        let config = AppConfig::default();
        assert!(SearchClient::from_config(&config).is_ok());
    }

    #[tokio::test]
    async fn test_empty_query_rejected_before_dispatch() {
        // Unroutable endpoint: a network call here would fail the test
        // with a different error variant.
        let client = SearchClient::new("http://127.0.0.1:1/api/search".to_string(), 1).unwrap();

        let result = client.search_stream("").await;
        assert_eq!(result.err(), Some(SearchError::EmptyQuery));

        let result = client.search_stream("   \t  ").await;
        assert_eq!(result.err(), Some(SearchError::EmptyQuery));
    }

    #[tokio::test]
    async fn test_http_error_keeps_status_descriptor() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/search"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client =
            SearchClient::new(format!("{}/api/search", server.uri()), 5).unwrap();
        let result = client.search_stream("what is a shader?").await;

        assert_eq!(
            result.err(),
            Some(SearchError::Http {
                status: 500,
                status_text: "Internal Server Error".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_stream_yields_fragments_then_sources() {
        let body = concat!(
            r#"{"fragment":"A ","done":false}"#,
            "\n",
            r#"{"fragment":"shader ","done":false}"#,
            "\n",
            r#"{"fragment":"is a GPU program.","done":false}"#,
            "\n",
            r#"{"done":true,"sources":[{"title":"Docs","url":"https://x"}]}"#,
        );

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/search"))
            .and(body_json_string(r#"{"query":"What is a shader?"}"#))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/x-ndjson"))
            .mount(&server)
            .await;

        let client =
            SearchClient::new(format!("{}/api/search", server.uri()), 5).unwrap();
        let mut stream = client.search_stream("What is a shader?").await.unwrap();

        let mut answer = String::new();
        let mut sources = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.unwrap();
            answer.push_str(&chunk.fragment);
            if chunk.done {
                sources = chunk.sources;
                break;
            }
        }

        assert_eq!(answer, "A shader is a GPU program.");
        assert_eq!(sources, vec![Citation::new("Docs", "https://x")]);
    }

    #[tokio::test]
    async fn test_stream_handles_final_chunk_without_newline() {
        // Single line, no trailing newline: parsed via the whole-buffer path.
        let body = r#"{"fragment":"hi","done":true,"sources":[]}"#;

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/search"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/x-ndjson"))
            .mount(&server)
            .await;

        let client =
            SearchClient::new(format!("{}/api/search", server.uri()), 5).unwrap();
        let mut stream = client.search_stream("hello").await.unwrap();

        let chunk = stream.next().await.unwrap().unwrap();
        assert_eq!(chunk.fragment, "hi");
        assert!(chunk.done);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_malformed_chunk_surfaces_decode_error() {
        let body = "{not json}\n";

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/search"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/x-ndjson"))
            .mount(&server)
            .await;

        let client =
            SearchClient::new(format!("{}/api/search", server.uri()), 5).unwrap();
        let mut stream = client.search_stream("hello").await.unwrap();

        let item = stream.next().await.unwrap();
        assert!(matches!(item, Err(SearchError::Decode(_))));
    }

    #[test]
    fn test_chunk_deserialization_defaults() {
        let chunk: SearchChunk = serde_json::from_str(r#"{"done":true}"#).unwrap();
        assert!(chunk.fragment.is_empty());
        assert!(chunk.done);
        assert!(chunk.sources.is_empty());
    }

    #[test]
    fn test_request_serialization() {
        let request = SearchRequest {
            query: "What is a shader?".to_string(),
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"query":"What is a shader?"}"#);
    }

    #[test]
    fn test_http_error_display_matches_descriptor() {
        let err = SearchError::Http {
            status: 500,
            status_text: "Internal Server Error".to_string(),
        };
        assert_eq!(err.to_string(), "500 Internal Server Error");
    }
}
