//! Mock backend for testing
//!
//! Replies are scripted up front and consumed one per call; once the script
//! runs out, every call gets the fallback reply. All prompts are recorded so
//! tests can assert on what was sent and how many calls were made.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::types::ServiceError;
use super::TextGenerator;

/// Canned reply used when nothing is scripted
pub const DEFAULT_MOCK_RESPONSE: &str = "• Track your daily spending to spot patterns early\n\
• Set a monthly budget for your largest category\n\
• Move a fixed amount into savings at the start of each month";

/// One scripted outcome for a `generate` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    /// Successful call returning this text
    Text(String),
    /// Successful call whose response carried no text
    Empty,
    /// Call that times out
    Timeout,
    /// Call that fails with this message
    Fail(String),
}

impl MockReply {
    pub fn text(text: impl Into<String>) -> Self {
        MockReply::Text(text.into())
    }

    pub fn fail(message: impl Into<String>) -> Self {
        MockReply::Fail(message.into())
    }

    fn into_result(self) -> std::result::Result<String, ServiceError> {
        match self {
            MockReply::Text(text) => Ok(text),
            MockReply::Empty => Err(ServiceError::EmptyResponse),
            MockReply::Timeout => Err(ServiceError::Timeout),
            MockReply::Fail(message) => Err(ServiceError::Mock(message)),
        }
    }
}

/// Mock text generator
#[derive(Clone)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    script: Arc<Mutex<VecDeque<MockReply>>>,
    fallback: MockReply,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Healthy mock that always answers with [`DEFAULT_MOCK_RESPONSE`]
    pub fn new() -> Self {
        Self {
            healthy: true,
            script: Arc::new(Mutex::new(VecDeque::new())),
            fallback: MockReply::text(DEFAULT_MOCK_RESPONSE),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Mock that plays `replies` in order, then falls back to the default reply
    pub fn with_replies(replies: impl IntoIterator<Item = MockReply>) -> Self {
        let mock = Self::new();
        if let Ok(mut script) = mock.script.lock() {
            script.extend(replies);
        }
        mock
    }

    /// Mock whose every call fails
    pub fn failing() -> Self {
        Self {
            healthy: false,
            fallback: MockReply::fail("backend unavailable"),
            ..Self::new()
        }
    }

    /// Prompts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Number of `generate` calls made
    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or_default()
    }

    fn next_reply(&self) -> MockReply {
        self.script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front())
            .unwrap_or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl TextGenerator for MockBackend {
    async fn generate(&self, prompt: &str) -> std::result::Result<String, ServiceError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.next_reply().into_result()
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
