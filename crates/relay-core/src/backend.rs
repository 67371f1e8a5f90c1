//! The provider boundary.
//!
//! The relay orchestrates calls to one logical external capability; the
//! wire protocol behind it lives outside this workspace. Implementations
//! classify their failures into `AttemptError` tags so the retry executor
//! never has to inspect provider-specific error shapes.

use crate::error::AttemptError;
use crate::request::CompletionRequest;
use crate::response::Completion;
use crate::types::Credential;
use async_trait::async_trait;

/// Outbound boundary to the generative-completion provider
#[async_trait]
pub trait CompletionBackend: Send + Sync + 'static {
    /// Human-readable backend name (for logs)
    fn name(&self) -> &str;

    /// Execute one attempt against a single call variant
    ///
    /// # Errors
    /// Returns an `AttemptError` classifying the failure: transient,
    /// exhaustion (with optional retry hint), unsupported variant, or fatal
    async fn complete(
        &self,
        variant: &str,
        request: &CompletionRequest,
        credential: &Credential,
    ) -> Result<Completion, AttemptError>;

    /// Minimal canary call used by credential health rechecks.
    ///
    /// Returns `true` when the credential is usable again.
    async fn probe(&self, credential: &Credential) -> bool;
}
