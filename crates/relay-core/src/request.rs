//! Request model for relayed calls.
//!
//! A `CompletionRequest` is the validated, provider-agnostic form of a
//! caller's payload. Caller and tenant scopes deliberately live outside the
//! request: they influence admission, never the answer.

use crate::types::{RequestKind, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum payload content size in bytes
pub const MAX_CONTENT_BYTES: usize = 100_000;

/// The semantically relevant payload of a relayed call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallPayload {
    /// Free-text content sent to the provider
    pub content: String,

    /// Whether the answer must be grounded in attached content
    #[serde(default)]
    pub grounded: bool,

    /// Stable digest of attached content, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_digest: Option<String>,
}

impl CallPayload {
    /// Create a new payload from free-text content
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            grounded: false,
            attachment_digest: None,
        }
    }

    /// Validate the payload
    ///
    /// # Errors
    /// Returns `ValidationError` if the content is empty or too large
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.content.trim().is_empty() {
            return Err(ValidationError::EmptyContent);
        }
        if self.content.len() > MAX_CONTENT_BYTES {
            return Err(ValidationError::ContentTooLarge {
                size: self.content.len(),
                limit: MAX_CONTENT_BYTES,
            });
        }
        Ok(())
    }
}

/// A validated request ready for the retry executor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Unique request identifier (for logs and tracing)
    pub id: String,

    /// The kind of call being made
    pub kind: RequestKind,

    /// The validated payload
    pub payload: CallPayload,
}

impl CompletionRequest {
    /// Create a new request with a generated id
    ///
    /// # Errors
    /// Returns `ValidationError` if the payload is invalid
    pub fn new(kind: RequestKind, payload: CallPayload) -> Result<Self, ValidationError> {
        payload.validate()?;
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            kind,
            payload,
        })
    }

    /// Create a new request builder
    #[must_use]
    pub fn builder() -> CompletionRequestBuilder {
        CompletionRequestBuilder::default()
    }

    /// Get the free-text content (convenience method)
    #[must_use]
    pub fn content(&self) -> &str {
        &self.payload.content
    }
}

/// Builder for `CompletionRequest`
#[derive(Debug, Default)]
pub struct CompletionRequestBuilder {
    kind: Option<RequestKind>,
    content: Option<String>,
    grounded: bool,
    attachment_digest: Option<String>,
}

impl CompletionRequestBuilder {
    /// Set the request kind
    #[must_use]
    pub fn kind(mut self, kind: RequestKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Set the free-text content
    #[must_use]
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Require the answer to be grounded in attached content
    #[must_use]
    pub fn grounded(mut self, grounded: bool) -> Self {
        self.grounded = grounded;
        self
    }

    /// Set the attachment digest
    #[must_use]
    pub fn attachment_digest(mut self, digest: impl Into<String>) -> Self {
        self.attachment_digest = Some(digest.into());
        self
    }

    /// Build the request
    ///
    /// # Errors
    /// Returns `ValidationError` if the payload is invalid
    pub fn build(self) -> Result<CompletionRequest, ValidationError> {
        let payload = CallPayload {
            content: self.content.unwrap_or_default(),
            grounded: self.grounded,
            attachment_digest: self.attachment_digest,
        };
        CompletionRequest::new(self.kind.unwrap_or(RequestKind::Completion), payload)
    }
}
