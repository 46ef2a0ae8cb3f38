use crate::error::{FetchError, Result};
use crate::http::HttpClient;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Clone, Debug)]
enum MockResponse {
    Body(Vec<u8>),
    Status(u16),
    Unreachable,
}

/// Mock HTTP client for testing.
///
/// Unknown URLs answer 404. Every request is counted per URL.
#[derive(Debug, Default)]
pub struct MockHttpClient {
    responses: HashMap<String, MockResponse>,
    requests: Mutex<HashMap<String, usize>>,
}

impl MockHttpClient {
    /// Create a new mock HTTP client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`.
    pub fn with_body(mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.responses.insert(url.into(), MockResponse::Body(body.into()));
        self
    }

    /// Answer `url` with a bare status code.
    pub fn with_status(mut self, url: impl Into<String>, status: u16) -> Self {
        self.responses.insert(url.into(), MockResponse::Status(status));
        self
    }

    /// Fail `url` as if the host could not be reached.
    pub fn with_unreachable(mut self, url: impl Into<String>) -> Self {
        self.responses.insert(url.into(), MockResponse::Unreachable);
        self
    }

    /// Number of requests made for `url` so far.
    pub fn request_count(&self, url: &str) -> usize {
        self.requests
            .lock()
            .map(|requests| requests.get(url).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Total number of requests made so far.
    pub fn total_requests(&self) -> usize {
        self.requests.lock().map(|requests| requests.values().sum()).unwrap_or(0)
    }
}

impl HttpClient for MockHttpClient {
    fn get(&self, url: &str) -> Result<Vec<u8>> {
        if let Ok(mut requests) = self.requests.lock() {
            *requests.entry(url.to_string()).or_default() += 1;
        }

        match self.responses.get(url) {
            Some(MockResponse::Body(body)) => Ok(body.clone()),
            Some(MockResponse::Status(404)) | None => Err(FetchError::NotFound {
                url: url.to_string(),
            }),
            Some(MockResponse::Status(status)) => Err(FetchError::Status {
                url: url.to_string(),
                status: *status,
            }),
            Some(MockResponse::Unreachable) => Err(FetchError::Transport {
                url: url.to_string(),
                message: "connection refused".to_string(),
            }),
        }
    }
}
