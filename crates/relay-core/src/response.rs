//! Completion response types.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A successful generative completion returned by the relay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    /// Request identifier this completion answers
    pub request_id: String,

    /// Generated text
    pub text: String,

    /// The call variant (backend model) that served the request
    pub variant: String,

    /// Token usage statistics
    pub usage: TokenUsage,

    /// Creation timestamp (Unix epoch seconds)
    pub created: i64,
}

impl Completion {
    /// Create a new completion builder
    #[must_use]
    pub fn builder() -> CompletionBuilder {
        CompletionBuilder::default()
    }
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens consumed by the prompt
    pub prompt_tokens: u32,
    /// Tokens generated in the completion
    pub completion_tokens: u32,
    /// Total tokens
    pub total_tokens: u32,
}

impl TokenUsage {
    /// Create usage from prompt and completion counts
    #[must_use]
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Builder for `Completion`
#[derive(Debug, Default)]
pub struct CompletionBuilder {
    request_id: Option<String>,
    text: Option<String>,
    variant: Option<String>,
    usage: Option<TokenUsage>,
}

impl CompletionBuilder {
    /// Set the request id
    #[must_use]
    pub fn request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    /// Set the generated text
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set the serving variant
    #[must_use]
    pub fn variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }

    /// Set the token usage
    #[must_use]
    pub fn usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Build the completion, stamping the creation time
    #[must_use]
    pub fn build(self) -> Completion {
        Completion {
            request_id: self.request_id.unwrap_or_default(),
            text: self.text.unwrap_or_default(),
            variant: self.variant.unwrap_or_default(),
            usage: self.usage.unwrap_or_default(),
            created: Utc::now().timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_total() {
        let usage = TokenUsage::new(120, 30);
        assert_eq!(usage.total_tokens, 150);
    }

    #[test]
    fn test_builder() {
        let completion = Completion::builder()
            .request_id("req-1")
            .text("forty-two")
            .variant("swift-1-mini")
            .usage(TokenUsage::new(10, 2))
            .build();

        assert_eq!(completion.request_id, "req-1");
        assert_eq!(completion.text, "forty-two");
        assert_eq!(completion.variant, "swift-1-mini");
        assert!(completion.created > 0);
    }
}
