/*!
 * Mock translation backend for testing and dry runs.
 *
 * This module provides a deterministic backend that simulates different behaviors:
 * - `MockBackend::working()` - Always succeeds, prefixing text with the target language
 * - `MockBackend::failing()` - Always fails with an error
 * - `MockBackend::failing_for(lang)` - Fails only for one target language
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::errors::ProviderError;

use super::TranslationBackend;

/// A request received by the mock backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    /// The text to translate
    pub text: String,
    /// Target language
    pub target_language: String,
    /// Source language
    pub source_language: String,
}

/// Behavior mode for the mock backend
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with `[target] text`
    Working,
    /// Always fails with an error
    Failing,
    /// Fails only for the given target language
    FailingFor(String),
    /// Fails when the text contains the given needle
    FailingOn(String),
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
}

/// Mock backend for testing translation behavior
#[derive(Debug)]
pub struct MockBackend {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter
    request_count: AtomicUsize,
    /// Every request received
    calls: Mutex<Vec<MockCall>>,
    /// Simulated latency
    delay: Option<Duration>,
}

impl MockBackend {
    /// Create a new mock backend with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Create a working mock backend that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a failing mock backend that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock backend failing for one target language only
    pub fn failing_for(target_language: &str) -> Self {
        Self::new(MockBehavior::FailingFor(target_language.to_string()))
    }

    /// Create a mock backend failing for texts containing `needle`
    pub fn failing_on(needle: &str) -> Self {
        Self::new(MockBehavior::FailingOn(needle.to_string()))
    }

    /// Create an intermittently failing mock backend
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    /// Add simulated latency to every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of translate calls received
    pub fn call_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Every translate call received, in arrival order
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    /// The translation the working mode produces
    pub fn expected_translation(text: &str, target_language: &str) -> String {
        format!("[{}] {}", target_language, text)
    }
}

#[async_trait]
impl TranslationBackend for MockBackend {
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
        source_language: &str,
        _context: Option<&str>,
    ) -> Result<String, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst) + 1;
        self.calls.lock().push(MockCall {
            text: text.to_string(),
            target_language: target_language.to_string(),
            source_language: source_language.to_string(),
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let fail = match &self.behavior {
            MockBehavior::Working => false,
            MockBehavior::Failing => true,
            MockBehavior::FailingFor(lang) => lang == target_language,
            MockBehavior::FailingOn(needle) => text.contains(needle.as_str()),
            MockBehavior::Intermittent { fail_every } => *fail_every > 0 && count % fail_every == 0,
        };

        if fail {
            return Err(ProviderError::ConnectionError("Simulated backend failure".to_string()));
        }
        Ok(Self::expected_translation(text, target_language))
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ConnectionError("Simulated backend failure".to_string())),
            _ => Ok(()),
        }
    }
}
