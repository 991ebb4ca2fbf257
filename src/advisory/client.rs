use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::AdvisoryError;

/// External text-generation service (allows mocking).
///
/// Implementations must be shareable across request tasks.
#[async_trait]
pub trait AdvisoryClient: Send + Sync {
    /// Send one prompt, return the generated text.
    async fn generate(&self, prompt: &str) -> Result<String, AdvisoryError>;
}

/// Stand-in used when no API key is configured. Every call fails, so
/// callers fall back to the fixed apology text.
pub struct DisabledAdvisoryClient;

#[async_trait]
impl AdvisoryClient for DisabledAdvisoryClient {
    async fn generate(&self, _prompt: &str) -> Result<String, AdvisoryError> {
        Err(AdvisoryError::NotConfigured)
    }
}

enum MockReply {
    Fixed(String),
    EchoFirstLog,
    Fail(String),
}

/// Mock advisory client for tests. Returns a configurable response.
pub struct MockAdvisoryClient {
    reply: MockReply,
    calls: AtomicUsize,
}

impl MockAdvisoryClient {
    pub fn new(response: &str) -> Self {
        Self::with_reply(MockReply::Fixed(response.to_string()))
    }

    /// Replies with the first log line of the prompt, so callers can check
    /// which patient a reply was generated for.
    pub fn echo_first_log() -> Self {
        Self::with_reply(MockReply::EchoFirstLog)
    }

    /// A client whose every call fails with an upstream error carrying `body`.
    pub fn failing(body: &str) -> Self {
        Self::with_reply(MockReply::Fail(body.to_string()))
    }

    fn with_reply(reply: MockReply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AdvisoryClient for MockAdvisoryClient {
    async fn generate(&self, prompt: &str) -> Result<String, AdvisoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            MockReply::Fixed(text) => Ok(text.clone()),
            MockReply::EchoFirstLog => Ok(prompt
                .lines()
                .find(|l| l.starts_with("- "))
                .unwrap_or_default()
                .to_string()),
            MockReply::Fail(body) => Err(AdvisoryError::Upstream {
                status: 500,
                body: body.clone(),
            }),
        }
    }
}
