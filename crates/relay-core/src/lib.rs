//! # Relay Core
//!
//! Core domain types for the outbound completion relay:
//! - Validated newtypes for request kinds, scopes, and credentials
//! - The request and completion models
//! - The relay error hierarchy with stable rejection codes
//! - The `CompletionBackend` trait at the provider boundary

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backend;
pub mod error;
pub mod request;
pub mod response;
pub mod types;

// Re-export main types
pub use backend::CompletionBackend;
pub use error::{AttemptError, RelayError, RelayResult};
pub use request::{CallPayload, CompletionRequest, CompletionRequestBuilder};
pub use response::{Completion, TokenUsage};
pub use types::{Credential, RequestKind, ScopeKey, ValidationError};
