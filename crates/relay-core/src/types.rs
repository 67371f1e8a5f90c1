//! Validated domain types (newtypes) for type-safe call contracts.
//!
//! Scope keys and credentials use newtype wrappers with runtime validation
//! so malformed caller input is rejected before it can touch shared
//! resilience state.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Validation error for domain types
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Request kind is not one of the recognized kinds
    #[error("Invalid request kind: {value:?} is not recognized")]
    InvalidRequestKind {
        /// The unrecognized kind string
        value: String,
    },

    /// Scope key validation failed
    #[error("Invalid scope: {reason}")]
    InvalidScope {
        /// Reason for validation failure
        reason: String,
    },

    /// Payload content is empty
    #[error("Invalid payload: content cannot be empty")]
    EmptyContent,

    /// Payload content exceeds the size limit
    #[error("Invalid payload: content of {size} bytes exceeds limit of {limit} bytes")]
    ContentTooLarge {
        /// Actual content size in bytes
        size: usize,
        /// Maximum allowed size in bytes
        limit: usize,
    },

    /// Credential validation failed
    #[error("Invalid credential: {reason}")]
    InvalidCredential {
        /// Reason for validation failure
        reason: String,
    },
}

/// The kind of generative call being relayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    /// Free-form text completion
    Completion,
    /// Structured field extraction from attached content
    Extraction,
    /// Document summarization
    Summarization,
    /// Label classification
    Classification,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completion => write!(f, "completion"),
            Self::Extraction => write!(f, "extraction"),
            Self::Summarization => write!(f, "summarization"),
            Self::Classification => write!(f, "classification"),
        }
    }
}

impl std::str::FromStr for RequestKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "completion" | "complete" => Ok(Self::Completion),
            "extraction" | "extract" => Ok(Self::Extraction),
            "summarization" | "summarize" | "summary" => Ok(Self::Summarization),
            "classification" | "classify" => Ok(Self::Classification),
            _ => Err(ValidationError::InvalidRequestKind {
                value: s.to_string(),
            }),
        }
    }
}

/// A rate-limit scope key (caller or tenant identifier)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScopeKey(String);

impl ScopeKey {
    /// Maximum length for a scope key
    pub const MAX_LENGTH: usize = 128;

    /// Create a new scope key with validation
    ///
    /// # Errors
    /// Returns `ValidationError::InvalidScope` if empty, too long, or
    /// contains non-printable characters
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ValidationError::InvalidScope {
                reason: "scope cannot be empty".to_string(),
            });
        }
        if value.len() > Self::MAX_LENGTH {
            return Err(ValidationError::InvalidScope {
                reason: format!("scope exceeds maximum length of {}", Self::MAX_LENGTH),
            });
        }
        if !value.chars().all(|c| c.is_ascii_graphic()) {
            return Err(ValidationError::InvalidScope {
                reason: "scope must contain only printable ASCII characters".to_string(),
            });
        }
        Ok(Self(value))
    }

    /// Get the inner value as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ScopeKey {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ScopeKey> for String {
    fn from(key: ScopeKey) -> Self {
        key.0
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ScopeKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Provider credential (sensitive, never logged)
#[derive(Clone)]
pub struct Credential(SecretString);

impl Credential {
    /// Create a new credential
    ///
    /// # Errors
    /// Returns `ValidationError::InvalidCredential` if the secret is empty
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ValidationError::InvalidCredential {
                reason: "credential cannot be empty".to_string(),
            });
        }
        Ok(Self(SecretString::new(value)))
    }

    /// Expose the secret value (use sparingly)
    #[must_use]
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential([REDACTED])")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl<'de> Deserialize<'de> for Credential {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

impl Serialize for Credential {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        // Never serialize the actual secret
        serializer.serialize_str("[REDACTED]")
    }
}
